//! Swap planning
//!
//! Swaps favour neighbouring cups so the motion reads as one continuous,
//! trackable shuffle. The planner never looks at where the ball is.

use serde::{Deserialize, Serialize};

use super::rng::GameRng;

/// Two slots to exchange, always `i < j`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwapPair {
    pub i: usize,
    pub j: usize,
}

impl SwapPair {
    /// Normalized pair (order of arguments doesn't matter)
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            i: a.min(b),
            j: a.max(b),
        }
    }
}

/// Plan `count` swaps on a board of `cup_count` cups.
///
/// Each draw takes a random slot and one of its neighbours. A draw that would
/// repeat the previous pair is shifted to the next pair over, so with three or
/// more cups no pair is swapped twice in a row. Boards with fewer than two
/// cups get no swaps.
pub fn plan_swaps(count: u32, cup_count: usize, rng: &mut GameRng) -> Vec<SwapPair> {
    let n = cup_count;
    if n < 2 {
        return Vec::new();
    }

    let mut pairs = Vec::with_capacity(count as usize);
    let mut last: Option<SwapPair> = None;

    for _ in 0..count {
        let a = rng.index(n);
        let b = if rng.coin() {
            // Step left, bounce right at the left edge
            if a == 0 { a + 1 } else { a - 1 }
        } else if a + 1 < n {
            a + 1
        } else {
            a - 1
        };

        let mut pair = SwapPair::new(a, b);
        if last == Some(pair) && n > 2 {
            // {a+1, a+2} never contains a, so it can't equal the last pair
            let a2 = (a + 1) % n;
            let b2 = (a2 + 1) % n;
            pair = SwapPair::new(a2, b2);
        }

        last = Some(pair);
        pairs.push(pair);
    }

    pairs
}
