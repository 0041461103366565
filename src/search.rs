//! Depth-first branch-and-bound over the target sizes.
//!
//! Each target is either filled from one power level (exact) or from a
//! window around a base level (lenient), or skipped. The first solution with
//! the most pods wins. The used set is undone on backtrack.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use itertools::Itertools;
use tracing::trace;

use crate::model::pod::MIN_POD_SIZE;
use crate::power::Power;
use crate::virtual_item::{Index, Origin, VirtualItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodDraft {
    pub items: Vec<Index>,
    /// Level each item was matched at, parallel to `items`.
    pub levels: Vec<Power>,
    pub power: Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Exact,
    Lenient { tolerance: Power },
}

pub struct Search<'a> {
    virtuals: &'a [VirtualItem],
    targets: &'a [usize],
    buckets: Vec<(Power, Vec<VirtualItem>)>,
    used: Vec<bool>,
    current: Vec<PodDraft>,
    best: Vec<PodDraft>,
    visited: usize,
}

impl<'a> Search<'a> {
    pub fn new(virtuals: &'a [VirtualItem], targets: &'a [usize], item_count: usize) -> Search<'a> {
        Search {
            virtuals,
            targets,
            buckets: Vec::new(),
            used: vec![false; item_count],
            current: Vec::new(),
            best: Vec::new(),
            visited: 0,
        }
    }

    pub fn run(mut self, mode: Mode) -> (Vec<PodDraft>, usize) {
        match mode {
            Mode::Exact => {
                self.buckets = bucket_by_power(self.virtuals);
                self.exact(0);
            }
            Mode::Lenient { tolerance } => self.lenient(0, tolerance),
        }
        (self.best, self.visited)
    }

    /// True when this branch is finished, either complete or unable to
    /// beat the incumbent.
    fn settle(&mut self, depth: usize) -> bool {
        self.visited += 1;
        if depth == self.targets.len() {
            if self.current.len() > self.best.len() {
                trace!(pods = self.current.len(), "new best");
                self.best = self.current.clone();
            }
            return true;
        }
        self.current.len() + (self.targets.len() - depth) <= self.best.len()
    }

    fn unused(&self) -> impl Iterator<Item = VirtualItem> + '_ {
        self.virtuals.iter().copied().filter(|v| !self.used[v.item])
    }

    fn descend(&mut self, depth: usize, draft: PodDraft, mode: Mode) {
        for &item in &draft.items {
            self.used[item] = true;
        }
        self.current.push(draft);
        match mode {
            Mode::Exact => self.exact(depth + 1),
            Mode::Lenient { tolerance } => self.lenient(depth + 1, tolerance),
        }
        if let Some(draft) = self.current.pop() {
            for item in draft.items {
                self.used[item] = false;
            }
        }
    }

    fn exact(&mut self, depth: usize) {
        if self.settle(depth) {
            return;
        }
        let target = self.targets[depth];
        for bucket in 0..self.buckets.len() {
            let (power, candidates) = {
                let (power, members) = &self.buckets[bucket];
                let candidates: Vec<VirtualItem> =
                    members.iter().copied().filter(|v| !self.used[v.item]).collect();
                (*power, candidates)
            };
            let available: usize = candidates.iter().map(|v| v.size).sum();
            if available < target.max(MIN_POD_SIZE) {
                continue;
            }
            let candidates = candidates.into_iter().sorted_by_key(|v| Reverse(v.size)).collect_vec();
            let (selected, size) = fill(&candidates, target);
            if size < MIN_POD_SIZE {
                continue;
            }
            let items = selected.iter().map(|v| v.item).collect();
            let levels = selected.iter().map(|v| v.power).collect();
            self.descend(depth, PodDraft { items, levels, power }, Mode::Exact);
        }
        self.exact(depth + 1);
    }

    fn lenient(&mut self, depth: usize, tolerance: Power) {
        if self.settle(depth) {
            return;
        }
        let target = self.targets[depth];
        let unused = self.unused().collect_vec();
        let bases = unused.iter().map(|v| v.power).sorted().dedup().collect_vec();
        for base in bases {
            let mut nearest: Vec<VirtualItem> = Vec::new();
            for v in unused.iter().filter(|v| v.power.distance(base) <= tolerance) {
                match nearest.iter_mut().find(|n| n.item == v.item) {
                    Some(existing) => {
                        if is_closer(v, existing, base) {
                            *existing = *v;
                        }
                    }
                    None => nearest.push(*v),
                }
            }
            // Size dominates; the rest only orders items of equal size, and
            // group extremes are never smaller than two.
            nearest.sort_by_key(|v| {
                (
                    Reverse(v.size),
                    v.origin == Origin::GroupExtreme,
                    v.power.distance(base),
                    v.is_group(),
                )
            });
            let (selected, size) = fill(&nearest, target);
            if size < MIN_POD_SIZE || spread(&selected) > tolerance {
                continue;
            }
            let Some(power) = Power::mean(selected.iter().map(|v| v.power)) else {
                continue;
            };
            let items = selected.iter().map(|v| v.item).collect();
            let levels = selected.iter().map(|v| v.power).collect();
            self.descend(depth, PodDraft { items, levels, power }, Mode::Lenient { tolerance });
        }
        self.lenient(depth + 1, tolerance);
    }
}

fn bucket_by_power(virtuals: &[VirtualItem]) -> Vec<(Power, Vec<VirtualItem>)> {
    let mut buckets: BTreeMap<Power, Vec<VirtualItem>> = BTreeMap::new();
    for v in virtuals {
        buckets.entry(v.power).or_default().push(*v);
    }
    buckets.into_iter().collect()
}

/// Greedy fill in candidate order, stopping on an exact hit.
fn fill(candidates: &[VirtualItem], target: usize) -> (Vec<VirtualItem>, usize) {
    let mut selected: Vec<VirtualItem> = Vec::new();
    let mut size = 0;
    for candidate in candidates {
        if selected.iter().any(|s| s.item == candidate.item) {
            continue;
        }
        if size + candidate.size <= target {
            selected.push(*candidate);
            size += candidate.size;
            if size == target {
                break;
            }
        }
    }
    (selected, size)
}

fn is_closer(candidate: &VirtualItem, existing: &VirtualItem, base: Power) -> bool {
    let (new, old) = (candidate.power.distance(base), existing.power.distance(base));
    new < old || (new == old && candidate.origin == Origin::GroupAverage && existing.origin != Origin::GroupAverage)
}

fn spread(selected: &[VirtualItem]) -> Power {
    match selected.iter().map(|v| v.power).minmax().into_option() {
        Some((low, high)) => high.distance(low),
        None => Power::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn lone(item: Index, power: u16) -> VirtualItem {
        VirtualItem { item, size: 1, power: Power::from_half_steps(power), origin: Origin::Participant }
    }

    fn run(virtuals: &[VirtualItem], targets: &[usize], items: usize, mode: Mode) -> Vec<PodDraft> {
        Search::new(virtuals, targets, items).run(mode).0
    }

    fn seats(pods: &[PodDraft]) -> Vec<(Vec<Index>, Power)> {
        pods.iter().map(|p| (p.items.clone(), p.power)).collect()
    }

    #[test]
    fn exact_fills_each_level() {
        let virtuals: Vec<VirtualItem> = (0..3).map(|i| lone(i, 12)).chain((3..6).map(|i| lone(i, 14))).collect();
        let pods = run(&virtuals, &[3, 3], 6, Mode::Exact);
        assert_eq!(seats(&pods), vec![(vec![0, 1, 2], Power::whole(6)), (vec![3, 4, 5], Power::whole(7))]);
        assert_eq!(pods[1].levels, vec![Power::whole(7); 3]);
    }

    #[test]
    fn exact_skips_unfillable_targets() {
        let virtuals: Vec<VirtualItem> = (0..4).map(|i| lone(i, 12)).chain((4..6).map(|i| lone(i, 14))).collect();
        let pods = run(&virtuals, &[3, 3], 6, Mode::Exact);
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].items.len(), 3);
    }

    #[test]
    fn exact_prefers_larger_items() {
        let group = VirtualItem { item: 0, size: 2, power: Power::whole(6), origin: Origin::GroupAverage };
        let virtuals = vec![lone(1, 12), lone(2, 12), group, lone(3, 12)];
        let pods = run(&virtuals, &[4], 4, Mode::Exact);
        assert_eq!(seats(&pods), vec![(vec![0, 1, 2], Power::whole(6))]);
    }

    #[test]
    fn item_is_never_seated_twice() {
        // item 0 can play both levels but must land in only one pod
        let virtuals = vec![lone(0, 12), lone(0, 14), lone(1, 12), lone(2, 12), lone(3, 14), lone(4, 14)];
        let pods = run(&virtuals, &[3, 3], 5, Mode::Exact);
        assert_eq!(pods.len(), 1);
        let seated: Vec<Index> = pods.iter().flat_map(|p| p.items.clone()).collect();
        assert_eq!(seated.iter().unique().count(), seated.len());
    }

    #[test]
    fn lenient_uses_rounded_mean() {
        let virtuals = vec![lone(0, 12), lone(1, 13), lone(2, 12)];
        assert!(run(&virtuals, &[3], 3, Mode::Exact).is_empty());
        let pods = run(&virtuals, &[3], 3, Mode::Lenient { tolerance: Power::HALF });
        assert_eq!(seats(&pods), vec![(vec![0, 2, 1], Power::whole(6))]);
        assert_eq!(pods[0].levels, vec![Power::whole(6), Power::whole(6), Power::from_half_steps(13)]);
    }

    #[test]
    fn lenient_caps_spread_at_tolerance() {
        // 5.5 and 6.5 are both within 0.5 of 6 but a full point apart
        let virtuals = vec![lone(0, 11), lone(1, 12), lone(2, 13)];
        let pods = run(&virtuals, &[3], 3, Mode::Lenient { tolerance: Power::HALF });
        assert!(pods.is_empty());
        let pods = run(&virtuals, &[3], 3, Mode::Lenient { tolerance: Power::ONE });
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].power, Power::whole(6));
    }

    #[test]
    fn lenient_picks_closest_level_per_item() {
        let virtuals = vec![lone(0, 12), lone(0, 13), lone(1, 12), lone(2, 12)];
        let pods = run(&virtuals, &[3], 3, Mode::Lenient { tolerance: Power::HALF });
        assert_eq!(seats(&pods), vec![(vec![0, 1, 2], Power::whole(6))]);
    }

    #[test]
    fn lenient_prefers_group_average() {
        let average = VirtualItem { item: 0, size: 2, power: Power::whole(7), origin: Origin::GroupAverage };
        let stretched = VirtualItem { item: 1, size: 2, power: Power::whole(7), origin: Origin::GroupExtreme };
        let virtuals = vec![stretched, average, lone(2, 14)];
        let pods = run(&virtuals, &[3], 3, Mode::Lenient { tolerance: Power::ZERO });
        assert_eq!(seats(&pods), vec![(vec![0, 2], Power::whole(7))]);
    }

    #[test]
    fn closer_tie_goes_to_group_average() {
        let base = Power::whole(7);
        let average = VirtualItem { item: 0, size: 2, power: Power::whole(6), origin: Origin::GroupAverage };
        let extreme = VirtualItem { item: 0, size: 2, power: Power::whole(8), origin: Origin::GroupExtreme };
        assert!(is_closer(&average, &extreme, base));
        assert!(!is_closer(&extreme, &average, base));

        let nearer = VirtualItem { power: Power::from_half_steps(15), ..extreme };
        assert!(is_closer(&nearer, &average, base));
        assert!(!is_closer(&lone(1, 12), &lone(1, 16), base));
    }

    fn arb_virtuals() -> impl Strategy<Value = (Vec<VirtualItem>, usize)> {
        let item = (1usize..=2, prop::collection::btree_set(10u16..=16, 1..=3));
        prop::collection::vec(item, 0..=12).prop_map(|specs| {
            let mut virtuals = Vec::new();
            for (index, (size, levels)) in specs.iter().enumerate() {
                for (n, level) in levels.iter().enumerate() {
                    let origin = match (*size, n) {
                        (1, _) => Origin::Participant,
                        (_, 0) => Origin::GroupAverage,
                        _ => Origin::GroupExtreme,
                    };
                    let power = Power::from_half_steps(*level);
                    virtuals.push(VirtualItem { item: index, size: *size, power, origin });
                }
            }
            (virtuals, specs.len())
        })
    }

    fn arb_tolerance() -> impl Strategy<Value = Power> {
        prop_oneof![Just(Power::ZERO), Just(Power::HALF), Just(Power::ONE)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn matched_levels_fit_the_tolerance(
            (virtuals, count) in arb_virtuals(),
            targets in prop::collection::vec(3usize..=5, 0..=3),
            tolerance in arb_tolerance(),
        ) {
            let pods = run(&virtuals, &targets, count, Mode::Lenient { tolerance });
            for pod in &pods {
                prop_assert_eq!(pod.levels.len(), pod.items.len());
                for (item, level) in pod.items.iter().zip(&pod.levels) {
                    prop_assert!(virtuals.iter().any(|v| v.item == *item && v.power == *level));
                }
                let (low, high) = pod.levels.iter().copied().minmax().into_option().unwrap();
                prop_assert!(high.distance(low) <= tolerance, "spread {} over {}", high.distance(low), tolerance);
                prop_assert!(pod.power >= low && pod.power <= high);
            }
        }

        #[test]
        fn exact_levels_all_match_the_pod(
            (virtuals, count) in arb_virtuals(),
            targets in prop::collection::vec(3usize..=5, 0..=3),
        ) {
            let pods = run(&virtuals, &targets, count, Mode::Exact);
            for pod in &pods {
                prop_assert!(pod.levels.iter().all(|level| *level == pod.power));
            }
        }
    }

    #[test]
    fn empty_targets_yield_nothing() {
        let virtuals = vec![lone(0, 12), lone(1, 12), lone(2, 12)];
        assert!(run(&virtuals, &[], 3, Mode::Exact).is_empty());
        assert!(run(&[], &[3], 0, Mode::Lenient { tolerance: Power::ONE }).is_empty());
    }
}
