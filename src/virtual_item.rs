use itertools::{Itertools, MinMaxResult};

use crate::model::entity::Item;
use crate::power::Power;

pub type Index = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// One of a lone participant's own levels.
    Participant,
    /// A group at its aggregate average.
    GroupAverage,
    /// A group stretched to its weakest or strongest member.
    GroupExtreme,
}

/// An item paired with one level it could be seated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualItem {
    pub item: Index,
    pub size: usize,
    pub power: Power,
    pub origin: Origin,
}

impl VirtualItem {
    pub fn is_group(&self) -> bool {
        self.origin != Origin::Participant
    }
}

pub fn expand(items: &[Item]) -> Vec<VirtualItem> {
    items
        .iter()
        .enumerate()
        .flat_map(|(index, item)| expand_item(index, item))
        .collect()
}

fn expand_item(index: Index, item: &Item) -> Vec<VirtualItem> {
    let size = item.size();
    match item {
        Item::Participant(participant) => participant
            .powers
            .iter()
            .copied()
            .unique()
            .map(|power| VirtualItem { item: index, size, power, origin: Origin::Participant })
            .collect(),
        Item::Group(group) => {
            let Some(average) = group.average_power() else {
                return Vec::new();
            };
            let (low, high) = match group.member_powers().minmax() {
                MinMaxResult::NoElements => return Vec::new(),
                MinMaxResult::OneElement(only) => (only, only),
                MinMaxResult::MinMax(low, high) => (low, high),
            };
            let average = VirtualItem { item: index, size, power: average, origin: Origin::GroupAverage };
            let extremes = [low, high]
                .into_iter()
                .map(|power| VirtualItem { item: index, size, power, origin: Origin::GroupExtreme });
            std::iter::once(average)
                .chain(extremes)
                .unique_by(|v| v.power)
                .collect()
        }
    }
}
