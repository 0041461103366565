//! Target pod sizes for a head count.
//!
//! Both planners return sizes in {3, 4, 5} summing to the head count, and an
//! empty plan below three people. The engine does not care which one built
//! its targets.

use std::iter;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlannerKind {
    #[default]
    Balanced,
    AvoidLargePods,
}

impl PlannerKind {
    pub fn plan(self, head_count: usize) -> Vec<usize> {
        plan_partition(head_count, self == PlannerKind::AvoidLargePods)
    }
}

pub fn plan_partition(head_count: usize, avoid_large_pods: bool) -> Vec<usize> {
    if avoid_large_pods {
        avoid_large(head_count)
    } else {
        balanced(head_count)
    }
}

fn fours_then(count: usize, tail: &[usize]) -> Vec<usize> {
    iter::repeat(4).take(count).chain(tail.iter().copied()).collect()
}

/// Mostly fours; a leftover one turns two fours into a five and a four.
pub fn balanced(head_count: usize) -> Vec<usize> {
    match head_count {
        0..=2 => Vec::new(),
        3..=5 => vec![head_count],
        6 => vec![3, 3],
        7 => vec![4, 3],
        8 => vec![4, 4],
        9 => vec![3, 3, 3],
        10 => vec![5, 5],
        n => {
            let fours = n / 4;
            match n % 4 {
                0 => fours_then(fours, &[]),
                1 if fours >= 2 => fours_then(fours - 2, &[5, 4]),
                1 => vec![3, 3, 3, 2],
                2 if fours >= 1 => fours_then(fours - 1, &[3, 3]),
                2 => vec![3, 3, 3, 3],
                _ => fours_then(fours, &[3]),
            }
        }
    }
}

/// Prefers threes over fives once there are enough people to choose.
pub fn avoid_large(head_count: usize) -> Vec<usize> {
    match head_count {
        0..=8 => balanced(head_count),
        9 => vec![3, 3, 3],
        10 => vec![4, 3, 3],
        11 => vec![4, 4, 3],
        12 => vec![4, 4, 4],
        13 => vec![4, 3, 3, 3],
        14 => vec![4, 4, 3, 3],
        15 => vec![4, 4, 4, 3],
        n => {
            let mut fours = n / 4;
            let mut rest = n % 4;
            let mut threes = 0;
            if rest == 2 {
                fours -= 1;
                rest += 4;
            }
            if rest == 1 {
                // a bare five would remain; give back one more four
                fours -= 2;
                rest += 8;
            }
            while rest >= 3 {
                threes += 1;
                rest -= 3;
            }
            debug_assert_eq!(rest, 0);
            iter::repeat(4).take(fours).chain(iter::repeat(3).take(threes)).collect()
        }
    }
}
