pub mod entity {
    use std::fmt;

    use itertools::Itertools;
    use serde::{Deserialize, Serialize};

    use crate::power::Power;

    pub type Id = u32;
    pub type GroupNumber = u32;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Participant {
        pub id: Id,
        pub name: String,
        pub powers: Vec<Power>,
    }

    impl Participant {
        pub fn new(id: Id, name: impl Into<String>, powers: impl IntoIterator<Item = Power>) -> Participant {
            Participant {
                id,
                name: name.into(),
                powers: powers.into_iter().unique().collect(),
            }
        }

        pub fn average_power(&self) -> Option<Power> {
            Power::mean(self.powers.iter().copied())
        }
    }

    /// Participants that must share a table. Never split across pods.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Group {
        pub number: GroupNumber,
        pub members: Vec<Participant>,
    }

    impl Group {
        pub fn id(&self) -> String {
            ItemKey::Group(self.number).to_string()
        }

        pub fn size(&self) -> usize {
            self.members.len()
        }

        pub fn member_powers(&self) -> impl Iterator<Item = Power> + '_ {
            self.members.iter().filter_map(Participant::average_power)
        }

        pub fn average_power(&self) -> Option<Power> {
            Power::mean(self.member_powers())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum ItemKey {
        Participant(Id),
        Group(GroupNumber),
    }

    impl fmt::Display for ItemKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                ItemKey::Participant(id) => write!(f, "{id}"),
                ItemKey::Group(number) => write!(f, "group-{number}"),
            }
        }
    }

    /// Unit of allocation: a lone participant or a whole group.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    pub enum Item {
        Participant(Participant),
        Group(Group),
    }

    impl Item {
        pub fn key(&self) -> ItemKey {
            match self {
                Item::Participant(p) => ItemKey::Participant(p.id),
                Item::Group(g) => ItemKey::Group(g.number),
            }
        }

        pub fn size(&self) -> usize {
            match self {
                Item::Participant(_) => 1,
                Item::Group(g) => g.size(),
            }
        }

        pub fn participants(&self) -> &[Participant] {
            match self {
                Item::Participant(p) => std::slice::from_ref(p),
                Item::Group(g) => &g.members,
            }
        }

        pub fn average_power(&self) -> Option<Power> {
            match self {
                Item::Participant(p) => p.average_power(),
                Item::Group(g) => g.average_power(),
            }
        }
    }

    impl From<Participant> for Item {
        fn from(participant: Participant) -> Self {
            Item::Participant(participant)
        }
    }

    impl From<Group> for Item {
        fn from(group: Group) -> Self {
            Item::Group(group)
        }
    }
}

pub mod pod {
    use serde::Serialize;

    use super::entity::{Item, ItemKey, Participant};
    use crate::power::Power;

    pub const MIN_POD_SIZE: usize = 3;
    pub const MAX_POD_SIZE: usize = 5;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Pod {
        pub items: Vec<Item>,
        pub power: Power,
    }

    impl Pod {
        pub fn size(&self) -> usize {
            self.items.iter().map(Item::size).sum()
        }

        pub fn has_valid_size(&self) -> bool {
            (MIN_POD_SIZE..=MAX_POD_SIZE).contains(&self.size())
        }

        pub fn keys(&self) -> impl Iterator<Item = ItemKey> + '_ {
            self.items.iter().map(Item::key)
        }

        pub fn participants(&self) -> impl Iterator<Item = &Participant> {
            self.items.iter().flat_map(Item::participants)
        }

        /// Re-derive the pod power from whoever is seated now.
        pub fn recompute_power(&mut self) {
            if let Some(power) = Power::mean(self.participants().filter_map(Participant::average_power)) {
                self.power = power;
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Default, Serialize)]
    pub struct GenerationResult {
        pub pods: Vec<Pod>,
        pub unassigned: Vec<Item>,
    }

    impl GenerationResult {
        pub fn assigned_count(&self) -> usize {
            self.pods.iter().map(Pod::size).sum()
        }

        pub fn unassigned_count(&self) -> usize {
            self.unassigned.iter().map(Item::size).sum()
        }
    }
}

pub mod condition {
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use crate::power::Power;

    #[derive(Debug, Clone, Error, PartialEq)]
    pub enum ConditionError {
        #[error("max tolerance must be 0, 0.5 or 1, got {0}")]
        InvalidTolerance(Power),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct LeniencySettings {
        pub allow_leniency: bool,
        pub allow_super_leniency: bool,
        pub max_tolerance: Power,
    }

    impl Default for LeniencySettings {
        fn default() -> Self {
            LeniencySettings::strict()
        }
    }

    impl LeniencySettings {
        pub fn strict() -> LeniencySettings {
            LeniencySettings {
                allow_leniency: false,
                allow_super_leniency: false,
                max_tolerance: Power::ZERO,
            }
        }

        /// Leniency without the super flag, so the spread stays capped at 0.5.
        pub fn lenient(max_tolerance: Power) -> LeniencySettings {
            LeniencySettings {
                allow_leniency: true,
                allow_super_leniency: false,
                max_tolerance,
            }
        }

        pub fn super_lenient() -> LeniencySettings {
            LeniencySettings {
                allow_leniency: true,
                allow_super_leniency: true,
                max_tolerance: Power::ONE,
            }
        }

        pub fn validate(&self) -> Result<(), ConditionError> {
            match self.max_tolerance {
                Power::ZERO | Power::HALF | Power::ONE => Ok(()),
                other => Err(ConditionError::InvalidTolerance(other)),
            }
        }

        /// Widest power spread a pod may have under these settings.
        pub fn tolerance(&self) -> Power {
            if !self.allow_leniency {
                Power::ZERO
            } else if self.allow_super_leniency {
                self.max_tolerance
            } else {
                self.max_tolerance.min(Power::HALF)
            }
        }
    }

}
