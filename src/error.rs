use std::path::PathBuf;

use thiserror::Error;

use crate::model::condition::ConditionError;
use crate::model::entity::{GroupNumber, Id};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RosterError {
    #[error("participant {0} has no name")]
    EmptyName(Id),
    #[error("name {0:?} is used more than once")]
    DuplicateName(String),
    #[error("participant id {0} is used more than once")]
    DuplicateId(Id),
    #[error("{0} has no power level selected")]
    NoPowers(String),
    #[error("at least 3 players are needed, got {0}")]
    TooFewParticipants(usize),
    #[error("unknown participant {0}")]
    UnknownParticipant(Id),
    #[error("unknown group {0}")]
    UnknownGroup(GroupNumber),
    #[error("participant {id} is already in group-{group}")]
    AlreadyGrouped { id: Id, group: GroupNumber },
    #[error("a group needs at least 2 members, got {0}")]
    GroupTooSmall(usize),
    #[error("group number {0} is used more than once")]
    DuplicateGroup(GroupNumber),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Leniency(#[from] ConditionError),
}
