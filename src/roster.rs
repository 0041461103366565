//! Players, the groups they sit in, and the items the engine consumes.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RosterError;
use crate::model::entity::{Group, GroupNumber, Id, Item, Participant};
use crate::model::pod::MIN_POD_SIZE;
use crate::power::Power;

/// Discrete tiers used instead of numeric power in bracket mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bracket {
    Exhibition,
    Core,
    Upgraded,
    Optimized,
    Cedh,
}

impl Bracket {
    pub fn power(self) -> Power {
        match self {
            Bracket::Exhibition => Power::whole(1),
            Bracket::Core => Power::whole(2),
            Bracket::Upgraded => Power::whole(3),
            Bracket::Optimized => Power::whole(4),
            Bracket::Cedh => Power::whole(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub number: GroupNumber,
    pub members: Vec<Id>,
}

#[derive(Debug, Deserialize)]
struct ParticipantEntry {
    id: Id,
    name: String,
    #[serde(default)]
    powers: Vec<Power>,
    #[serde(default)]
    brackets: Vec<Bracket>,
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    participants: Vec<ParticipantEntry>,
    #[serde(default)]
    groups: Vec<GroupEntry>,
}

impl From<RosterFile> for Roster {
    fn from(file: RosterFile) -> Self {
        let participants = file
            .participants
            .into_iter()
            .map(|entry| {
                let powers = entry.powers.into_iter().chain(entry.brackets.into_iter().map(Bracket::power));
                Participant::new(entry.id, entry.name, powers)
            })
            .collect();
        Roster { participants, groups: file.groups }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RosterFile")]
pub struct Roster {
    participants: Vec<Participant>,
    groups: Vec<GroupEntry>,
}

fn normalized(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Roster {
    pub fn new() -> Roster {
        Roster::default()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn groups(&self) -> &[GroupEntry] {
        &self.groups
    }

    pub fn head_count(&self) -> usize {
        self.participants.len()
    }

    pub fn participant(&self, id: Id) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn group_of(&self, id: Id) -> Option<GroupNumber> {
        self.groups.iter().find(|g| g.members.contains(&id)).map(|g| g.number)
    }

    pub fn add_participant(
        &mut self,
        name: &str,
        powers: impl IntoIterator<Item = Power>,
    ) -> Result<Id, RosterError> {
        let id = self.participants.iter().map(|p| p.id).max().map_or(1, |max| max + 1);
        if name.trim().is_empty() {
            return Err(RosterError::EmptyName(id));
        }
        let key = normalized(name);
        if self.participants.iter().any(|p| normalized(&p.name) == key) {
            return Err(RosterError::DuplicateName(name.trim().to_string()));
        }
        let participant = Participant::new(id, name.trim(), powers);
        if participant.powers.is_empty() {
            return Err(RosterError::NoPowers(participant.name));
        }
        self.participants.push(participant);
        Ok(id)
    }

    pub fn add_bracket_participant(&mut self, name: &str, brackets: &[Bracket]) -> Result<Id, RosterError> {
        self.add_participant(name, brackets.iter().map(|b| b.power()))
    }

    /// Removes a player; a group left with fewer than two members dissolves.
    pub fn remove_participant(&mut self, id: Id) -> Result<Participant, RosterError> {
        let index = self
            .participants
            .iter()
            .position(|p| p.id == id)
            .ok_or(RosterError::UnknownParticipant(id))?;
        for group in &mut self.groups {
            group.members.retain(|member| *member != id);
        }
        self.groups.retain(|group| {
            let keep = group.members.len() >= 2;
            if !keep {
                debug!(group = group.number, "dissolving group");
            }
            keep
        });
        Ok(self.participants.remove(index))
    }

    pub fn create_group(&mut self, members: &[Id]) -> Result<GroupNumber, RosterError> {
        let unique: Vec<Id> = members.iter().copied().fold(Vec::new(), |mut acc, id| {
            if !acc.contains(&id) {
                acc.push(id);
            }
            acc
        });
        if unique.len() < 2 {
            return Err(RosterError::GroupTooSmall(unique.len()));
        }
        for &id in &unique {
            if self.participant(id).is_none() {
                return Err(RosterError::UnknownParticipant(id));
            }
            if let Some(group) = self.group_of(id) {
                return Err(RosterError::AlreadyGrouped { id, group });
            }
        }
        let number = (1..)
            .find(|n| self.groups.iter().all(|g| g.number != *n))
            .unwrap_or_default();
        self.groups.push(GroupEntry { number, members: unique });
        Ok(number)
    }

    pub fn dissolve_group(&mut self, number: GroupNumber) -> Result<GroupEntry, RosterError> {
        let index = self
            .groups
            .iter()
            .position(|g| g.number == number)
            .ok_or(RosterError::UnknownGroup(number))?;
        Ok(self.groups.remove(index))
    }

    pub fn validate(&self) -> Result<(), RosterError> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for participant in &self.participants {
            if !ids.insert(participant.id) {
                return Err(RosterError::DuplicateId(participant.id));
            }
            if participant.name.trim().is_empty() {
                return Err(RosterError::EmptyName(participant.id));
            }
            if !names.insert(normalized(&participant.name)) {
                return Err(RosterError::DuplicateName(participant.name.trim().to_string()));
            }
            if participant.powers.is_empty() {
                return Err(RosterError::NoPowers(participant.name.clone()));
            }
        }

        let mut grouped: HashMap<Id, GroupNumber> = HashMap::new();
        let mut numbers = HashSet::new();
        for group in &self.groups {
            if !numbers.insert(group.number) {
                return Err(RosterError::DuplicateGroup(group.number));
            }
            if group.members.is_empty() {
                return Err(RosterError::GroupTooSmall(0));
            }
            for &id in &group.members {
                if !ids.contains(&id) {
                    return Err(RosterError::UnknownParticipant(id));
                }
                if let Some(other) = grouped.insert(id, group.number) {
                    return Err(RosterError::AlreadyGrouped { id, group: other });
                }
            }
        }

        if self.head_count() < MIN_POD_SIZE {
            return Err(RosterError::TooFewParticipants(self.head_count()));
        }
        Ok(())
    }

    /// Lone players and whole groups, in roster order of their first member.
    pub fn items(&self) -> Result<Vec<Item>, RosterError> {
        let mut items = Vec::new();
        let mut emitted = HashSet::new();
        for participant in &self.participants {
            match self.groups.iter().find(|g| g.members.contains(&participant.id)) {
                Some(entry) => {
                    if emitted.insert(entry.number) {
                        items.push(Item::Group(self.materialize(entry)?));
                    }
                }
                None => items.push(Item::Participant(participant.clone())),
            }
        }
        Ok(items)
    }

    fn materialize(&self, entry: &GroupEntry) -> Result<Group, RosterError> {
        let members = entry
            .members
            .iter()
            .map(|id| self.participant(*id).cloned().ok_or(RosterError::UnknownParticipant(*id)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Group { number: entry.number, members })
    }
}
