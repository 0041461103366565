//! Pod assignment entry points.

use std::collections::HashSet;

use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::RosterError;
use crate::model::condition::LeniencySettings;
use crate::model::entity::{Item, ItemKey};
use crate::model::pod::{GenerationResult, Pod, MAX_POD_SIZE, MIN_POD_SIZE};
use crate::power::Power;
use crate::roster::Roster;
use crate::search::{Mode, Search};
use crate::virtual_item::expand;

/// Seat `items` into pods of the given target sizes.
///
/// Targets that cannot be filled are skipped; whatever is left over comes
/// back in `unassigned`. Identical inputs always produce identical output.
pub fn assign_pods(items: &[Item], target_sizes: &[usize], leniency: &LeniencySettings) -> GenerationResult {
    let head_count: usize = items.iter().map(Item::size).sum();

    if (MIN_POD_SIZE..=MAX_POD_SIZE).contains(&head_count) {
        if let Some(power) = shared_power(items) {
            debug!(head_count, %power, "single pod");
            return collect(items, vec![Pod { items: items.to_vec(), power }]);
        }
        if !leniency.allow_leniency {
            debug!(head_count, "no level shared by everyone");
            return collect(items, Vec::new());
        }
        debug!(head_count, "no level shared by everyone; searching leniently");
    }

    let targets = target_sizes
        .iter()
        .copied()
        .filter(|size| {
            let valid = (MIN_POD_SIZE..=MAX_POD_SIZE).contains(size);
            if !valid {
                warn!(size, "ignoring target pod size");
            }
            valid
        })
        .collect_vec();

    let virtuals = expand(items);
    let mode = if leniency.allow_leniency {
        Mode::Lenient { tolerance: leniency.tolerance() }
    } else {
        Mode::Exact
    };
    let (drafts, visited) = Search::new(&virtuals, &targets, items.len()).run(mode);
    debug!(?mode, virtual_items = virtuals.len(), targets = targets.len(), visited, "search finished");

    let pods = drafts
        .into_iter()
        .map(|draft| Pod {
            items: draft.items.into_iter().map(|index| items[index].clone()).collect(),
            power: draft.power,
        })
        .collect();
    collect(items, pods)
}

/// The level every participant can play, picking the most common one and
/// breaking ties by first appearance.
fn shared_power(items: &[Item]) -> Option<Power> {
    let participants = items.iter().flat_map(Item::participants).collect_vec();
    let mut counts: Vec<(Power, usize)> = Vec::new();
    for power in participants.iter().flat_map(|p| p.powers.iter().unique()) {
        match counts.iter_mut().find(|(level, _)| level == power) {
            Some((_, count)) => *count += 1,
            None => counts.push((*power, 1)),
        }
    }
    let (power, count) = counts
        .into_iter()
        .fold(None, |best: Option<(Power, usize)>, (level, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((level, count)),
        })?;
    (count == participants.len()).then_some(power)
}

fn collect(items: &[Item], pods: Vec<Pod>) -> GenerationResult {
    let seated: HashSet<ItemKey> = pods.iter().flat_map(Pod::keys).collect();
    let unassigned = items.iter().filter(|item| !seated.contains(&item.key())).cloned().collect();
    GenerationResult { pods, unassigned }
}

/// Validate the roster, plan the pod sizes and assign everyone.
pub fn generate(roster: &Roster, config: &Config) -> Result<GenerationResult, RosterError> {
    roster.validate()?;
    let items = roster.items()?;
    let head_count = roster.head_count();
    let targets = config.plan(head_count);
    let leniency = config.effective_leniency();

    let result = assign_pods(&items, &targets, &leniency);
    info!(
        head_count,
        pods = result.pods.len(),
        targets = targets.len(),
        unassigned = result.unassigned_count(),
        "generated pods"
    );
    if !result.unassigned.is_empty() {
        warn!(
            unassigned = %result.unassigned.iter().map(Item::key).join(", "),
            "some players could not be seated"
        );
    }
    Ok(result)
}
