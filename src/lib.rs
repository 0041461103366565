//! Seat a roster of players into pods of three to five with compatible
//! power levels.
//!
//! - **`partition`** turns a head count into target pod sizes
//! - **`engine`** searches for the assignment that fills the most pods
//! - **`roster`** builds and validates the items the engine consumes
//! - **`action`** applies manual edits to a finished assignment

pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod partition;
pub mod power;
pub mod roster;
mod search;
mod virtual_item;

pub use action::{Action, ActionError, Position};
pub use config::{Config, MatchMode, Overrides};
pub use engine::{assign_pods, generate};
pub use error::{ConfigError, RosterError};
pub use model::condition::LeniencySettings;
pub use model::entity::{Group, Item, ItemKey, Participant};
pub use model::pod::{GenerationResult, Pod};
pub use partition::{plan_partition, PlannerKind};
pub use power::{Power, PowerError};
pub use roster::{Bracket, Roster};
