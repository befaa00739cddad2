//! Numeric table layout
//!
//! Maps slot indices to table coordinates (pixels, origin top-left). The
//! presenter turns these into transforms; nothing here touches rendering.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::cups::CupId;
use super::shuffle::SwapPair;
use crate::consts::*;

/// Slot centres for one board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLayout {
    /// Centre of each slot, left to right
    slots: Vec<Vec2>,
    /// Horizontal distance between neighbouring slot centres
    pub gap: f32,
}

impl TableLayout {
    /// Centre `cup_count` slots in a row on a table of the given size.
    ///
    /// The gap never drops below `MIN_SLOT_GAP`, so neighbouring cups never
    /// overlap even on a narrow table.
    pub fn for_table(cup_count: usize, table: Vec2) -> Self {
        let gap = ((table.x - TABLE_MARGIN) / (cup_count as f32 + 1.0))
            .clamp(MIN_SLOT_GAP, MAX_SLOT_GAP);
        let row_y = (table.y * TABLE_BASELINE).floor();
        let span = gap * cup_count.saturating_sub(1) as f32;
        let start_x = ((table.x - span) / 2.0).floor();

        let slots = (0..cup_count)
            .map(|i| Vec2::new(start_x + i as f32 * gap, row_y))
            .collect();

        Self { slots, gap }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Centre of a cup standing in `slot`
    pub fn slot_center(&self, slot: usize) -> Option<Vec2> {
        self.slots.get(slot).copied()
    }

    /// Where the ball rests when it's under the cup in `slot`
    pub fn ball_position(&self, slot: usize) -> Option<Vec2> {
        self.slot_center(slot).map(|c| c + Vec2::new(0.0, BALL_DROP))
    }

    /// Build the two-leg motion for swapping the cups in `pair`.
    ///
    /// Both cups rise to a shared apex `lift` pixels above the higher of the
    /// two, then drop into each other's slot.
    pub fn swap_motion(
        &self,
        pair: SwapPair,
        first: CupId,
        second: CupId,
        lift: f32,
        duration_ms: u32,
    ) -> Option<SwapMotion> {
        let from_first = self.slot_center(pair.i)?;
        let from_second = self.slot_center(pair.j)?;
        let apex = Vec2::new(
            (from_first.x + from_second.x) / 2.0,
            from_first.y.min(from_second.y) - lift,
        );

        Some(SwapMotion {
            pair,
            first,
            second,
            from_first,
            from_second,
            apex,
            duration_ms,
        })
    }
}

/// Everything a presenter needs to animate one swap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwapMotion {
    pub pair: SwapPair,
    /// Cup leaving slot `pair.i`
    pub first: CupId,
    /// Cup leaving slot `pair.j`
    pub second: CupId,
    pub from_first: Vec2,
    pub from_second: Vec2,
    /// Shared midpoint both cups pass through
    pub apex: Vec2,
    pub duration_ms: u32,
}

impl SwapMotion {
    /// Duration of each leg (rise, then drop)
    pub fn leg_ms(&self) -> u32 {
        self.duration_ms / 2
    }

    /// Final resting place of `first`
    pub fn to_first(&self) -> Vec2 {
        self.from_second
    }

    /// Final resting place of `second`
    pub fn to_second(&self) -> Vec2 {
        self.from_first
    }
}
