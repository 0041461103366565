//! Manual edits to a finished assignment.

use thiserror::Error;
use tracing::debug;

use crate::model::pod::{GenerationResult, Pod};

pub type Index = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub pod_index: Index,
    pub item_index: Index,
}

/// A manual edit made after generation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Move { from: Position, to: Index },
    Swap(Position, Position),
    Unassign(Position),
    Assign { unassigned_index: Index, pod_index: Index },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionError {
    #[error("Invalid position")]
    InvalidPosition,
    #[error("Item is already in pod {0}")]
    SamePod(Index),
}

impl GenerationResult {
    fn check(&self, position: Position) -> Result<(), ActionError> {
        self.pods
            .get(position.pod_index)
            .and_then(|pod| pod.items.get(position.item_index))
            .map(|_| ())
            .ok_or(ActionError::InvalidPosition)
    }

    fn check_pod(&self, pod_index: Index) -> Result<(), ActionError> {
        self.pods.get(pod_index).map(|_| ()).ok_or(ActionError::InvalidPosition)
    }

    /// Apply an edit, re-pricing every pod it touches. Pods left empty are
    /// removed, which shifts the indices of later pods.
    pub fn apply(&mut self, action: Action) -> Result<(), ActionError> {
        debug!(?action, "applying edit");
        match action {
            Action::Move { from, to } => {
                self.check(from)?;
                self.check_pod(to)?;
                if from.pod_index == to {
                    return Err(ActionError::SamePod(to));
                }
                let item = self.pods[from.pod_index].items.remove(from.item_index);
                self.pods[to].items.push(item);
                self.refresh(&[from.pod_index, to]);
            }
            Action::Swap(first, second) => {
                self.check(first)?;
                self.check(second)?;
                if first.pod_index == second.pod_index {
                    return Err(ActionError::SamePod(first.pod_index));
                }
                let a = self.pods[first.pod_index].items[first.item_index].clone();
                let b = std::mem::replace(&mut self.pods[second.pod_index].items[second.item_index], a);
                self.pods[first.pod_index].items[first.item_index] = b;
                self.refresh(&[first.pod_index, second.pod_index]);
            }
            Action::Unassign(position) => {
                self.check(position)?;
                let item = self.pods[position.pod_index].items.remove(position.item_index);
                self.unassigned.push(item);
                self.refresh(&[position.pod_index]);
            }
            Action::Assign { unassigned_index, pod_index } => {
                self.check_pod(pod_index)?;
                if unassigned_index >= self.unassigned.len() {
                    return Err(ActionError::InvalidPosition);
                }
                let item = self.unassigned.remove(unassigned_index);
                self.pods[pod_index].items.push(item);
                self.refresh(&[pod_index]);
            }
        }
        Ok(())
    }

    fn refresh(&mut self, touched: &[Index]) {
        for &index in touched {
            self.pods[index].recompute_power();
        }
        self.pods.retain(|pod| !pod.items.is_empty());
    }

    pub fn invalid_pods(&self) -> impl Iterator<Item = (Index, &Pod)> {
        self.pods.iter().enumerate().filter(|(_, pod)| !pod.has_valid_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::{Group, Item, Participant};
    use crate::power::Power;

    fn lone(id: u32, power: u16) -> Item {
        Item::from(Participant::new(id, format!("p{id}"), [Power::whole(power)]))
    }

    fn result() -> GenerationResult {
        GenerationResult {
            pods: vec![
                Pod { items: vec![lone(1, 6), lone(2, 6), lone(3, 6)], power: Power::whole(6) },
                Pod { items: vec![lone(4, 8), lone(5, 8), lone(6, 8)], power: Power::whole(8) },
            ],
            unassigned: vec![lone(7, 9)],
        }
    }

    #[test]
    fn move_reprices_both_pods() {
        let mut result = result();
        result
            .apply(Action::Move { from: Position { pod_index: 1, item_index: 0 }, to: 0 })
            .unwrap();
        assert_eq!(result.pods[0].size(), 4);
        assert_eq!(result.pods[0].power, Power::from_half_steps(13));
        assert_eq!(result.pods[1].size(), 2);
        assert_eq!(result.pods[1].power, Power::whole(8));
        assert_eq!(result.invalid_pods().map(|(i, _)| i).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn swap_exchanges_items() {
        let mut result = result();
        let first = Position { pod_index: 0, item_index: 2 };
        let second = Position { pod_index: 1, item_index: 0 };
        result.apply(Action::Swap(first, second)).unwrap();
        assert_eq!(result.pods[0].items[2], lone(4, 8));
        assert_eq!(result.pods[1].items[0], lone(3, 6));
        assert_eq!(result.pods[0].power, Power::from_half_steps(13));
    }

    #[test]
    fn assign_and_unassign() {
        let mut result = result();
        result.apply(Action::Assign { unassigned_index: 0, pod_index: 1 }).unwrap();
        assert!(result.unassigned.is_empty());
        // (8 + 8 + 8 + 9) / 4 = 8.25
        assert_eq!(result.pods[1].power, Power::from_half_steps(17));

        result.apply(Action::Unassign(Position { pod_index: 0, item_index: 0 })).unwrap();
        assert_eq!(result.unassigned, vec![lone(1, 6)]);
        assert_eq!(result.pods[0].size(), 2);
    }

    #[test]
    fn empty_pods_disappear() {
        let mut result = GenerationResult {
            pods: vec![
                Pod { items: vec![lone(1, 6)], power: Power::whole(6) },
                Pod { items: vec![lone(2, 6)], power: Power::whole(6) },
            ],
            unassigned: Vec::new(),
        };
        result.apply(Action::Move { from: Position { pod_index: 0, item_index: 0 }, to: 1 }).unwrap();
        assert_eq!(result.pods.len(), 1);
        assert_eq!(result.pods[0].size(), 2);
    }

    #[test]
    fn group_members_count_individually() {
        let group = Group {
            number: 1,
            members: vec![
                Participant::new(8, "p8", [Power::whole(4)]),
                Participant::new(9, "p9", [Power::whole(4)]),
            ],
        };
        let mut result = result();
        result.unassigned = vec![Item::from(group)];
        result.apply(Action::Assign { unassigned_index: 0, pod_index: 0 }).unwrap();
        // (6 + 6 + 6 + 4 + 4) / 5 = 5.2
        assert_eq!(result.pods[0].power, Power::whole(5));
    }

    #[test]
    fn rejects_bad_positions() {
        let mut result = result();
        let bad = Position { pod_index: 0, item_index: 9 };
        assert_eq!(result.apply(Action::Unassign(bad)), Err(ActionError::InvalidPosition));
        assert_eq!(
            result.apply(Action::Move { from: Position { pod_index: 0, item_index: 0 }, to: 0 }),
            Err(ActionError::SamePod(0))
        );
        assert_eq!(
            result.apply(Action::Assign { unassigned_index: 3, pod_index: 0 }),
            Err(ActionError::InvalidPosition)
        );
        assert_eq!(result, self::result());
    }
}
