//! Cup and ball position model
//!
//! Pure bookkeeping: which cup sits in which slot, and which cup holds the
//! ball. The ball is bound to a cup identity when the board is created and
//! follows that cup through every swap.

use serde::{Deserialize, Serialize};

use super::rng::GameRng;
use crate::error::GameError;

/// Stable handle for one cup (survives swaps)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CupId(pub u32);

/// Slot-ordered cups plus the ball binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CupBoard {
    /// `slots[i]` is the cup currently in slot `i` (left to right)
    slots: Vec<CupId>,
    /// Cup that holds the ball
    ball: CupId,
    /// Slot of `ball`, kept in step with `slots` by `swap`
    answer_slot: usize,
}

impl CupBoard {
    /// Lay out `cup_count` cups left to right and hide the ball under a
    /// uniformly chosen one.
    pub fn initialize(cup_count: usize, rng: &mut GameRng) -> Result<Self, GameError> {
        if cup_count < 2 {
            return Err(GameError::TooFewCups(cup_count));
        }
        let slots: Vec<CupId> = (0..cup_count as u32).map(CupId).collect();
        let answer_slot = rng.index(cup_count);
        Ok(Self {
            ball: slots[answer_slot],
            slots,
            answer_slot,
        })
    }

    /// Exchange the cups in slots `i` and `j`.
    ///
    /// The ball moves with its cup. Rejects out-of-range or identical slots
    /// without touching the board.
    pub fn swap(&mut self, i: usize, j: usize) -> Result<(), GameError> {
        let len = self.slots.len();
        if i == j || i >= len || j >= len {
            return Err(GameError::InvalidSwap { i, j, len });
        }

        self.slots.swap(i, j);
        if self.answer_slot == i {
            self.answer_slot = j;
        } else if self.answer_slot == j {
            self.answer_slot = i;
        }

        debug_assert_eq!(self.slots[self.answer_slot], self.ball);
        Ok(())
    }

    /// Slot currently holding the ball
    pub fn answer_slot_index(&self) -> usize {
        self.answer_slot
    }

    /// Cup the ball was bound to at creation
    pub fn ball_cup(&self) -> CupId {
        self.ball
    }

    pub fn cup_at(&self, slot: usize) -> Option<CupId> {
        self.slots.get(slot).copied()
    }

    pub fn slot_of(&self, cup: CupId) -> Option<usize> {
        self.slots.iter().position(|&c| c == cup)
    }

    /// Cups in slot order
    pub fn cups(&self) -> &[CupId] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
