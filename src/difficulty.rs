//! Difficulty tiers
//!
//! Static table: each level fixes the cup count, how many swaps a shuffle
//! makes, how fast each swap animates, whether the ball is shown before the
//! first shuffle, and how many points a correct pick is worth.

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Valid level identifiers, easiest first
pub const LEVELS: [u8; 4] = [1, 2, 3, 4];

/// Per-level game parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyConfig {
    pub level: u8,
    /// Cups on the table (always >= 2)
    pub cup_count: usize,
    /// Swaps per shuffle
    pub swap_count: u32,
    /// Duration of one animated swap
    pub animation_speed_ms: u32,
    /// Show the ball before the first shuffle
    pub reveal_at_start: bool,
    /// How long the opening reveal lasts (0 when skipped)
    pub reveal_ms: u32,
    /// Points for a correct pick
    pub points: u32,
}

impl DifficultyConfig {
    pub fn label(&self) -> &'static str {
        match self.level {
            1 => "Easy",
            2 => "Normal",
            3 => "Hard",
            _ => "Blind",
        }
    }
}

/// Look up the config for a level
pub fn config_for(level: u8) -> Result<DifficultyConfig, GameError> {
    let (cup_count, swap_count, animation_speed_ms, reveal_ms, points, reveal_at_start) =
        match level {
            1 => (3, 8, 800, 1500, 10, true),
            2 => (5, 12, 650, 1200, 20, true),
            3 => (5, 18, 420, 900, 30, true),
            // No opening reveal: the player has to guess from the start
            4 => (5, 14, 650, 0, 50, false),
            _ => return Err(GameError::InvalidLevel(level)),
        };

    Ok(DifficultyConfig {
        level,
        cup_count,
        swap_count,
        animation_speed_ms,
        reveal_at_start,
        reveal_ms,
        points,
    })
}
