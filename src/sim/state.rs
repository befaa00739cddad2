//! Round state and core game types
//!
//! Everything the round machine tracks between suspension points lives here.

use serde::{Deserialize, Serialize};

use super::cups::{CupBoard, CupId};
use super::layout::TableLayout;
use crate::difficulty::DifficultyConfig;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No board yet
    Idle,
    /// Board built, layout being drawn
    Setup,
    /// Ball shown before the first shuffle
    RevealIntro,
    /// Waiting for the player to start a shuffle
    AwaitShuffle,
    /// Swaps in progress
    Shuffling,
    /// Waiting for the player to pick a cup
    AwaitPick,
    /// Pick made, result on display
    Resolving,
    /// Pause before the next round
    Cooldown,
    /// All rounds played
    Ended,
}

impl RoundPhase {
    /// HUD text for this phase
    pub fn label(&self) -> &'static str {
        match self {
            RoundPhase::Idle => "Choose a level",
            RoundPhase::Setup => "Setting up…",
            RoundPhase::RevealIntro => "Watch the ball!",
            RoundPhase::AwaitShuffle => "Ready",
            RoundPhase::Shuffling => "Shuffling…",
            RoundPhase::AwaitPick => "Pick a cup",
            RoundPhase::Resolving => "Revealing…",
            RoundPhase::Cooldown => "Next round",
            RoundPhase::Ended => "Game over",
        }
    }
}

/// Identifies the round an async continuation belongs to.
///
/// Reset and restart bump the generation; finishing a round bumps the round.
/// A continuation holding an old ticket must not touch the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub generation: u64,
    pub round: u32,
}

/// Live state of one game session
#[derive(Debug, Clone)]
pub struct RoundState {
    pub config: DifficultyConfig,
    pub board: CupBoard,
    pub layout: TableLayout,
    pub phase: RoundPhase,
    /// 1-based round number
    pub round: u32,
    /// Correct picks
    pub score: u32,
    /// Wrong picks
    pub miss_count: u32,
    /// Sum of points from correct picks
    pub total_points: u32,
    /// Hint spent this round
    pub reveal_used: bool,
    /// Cup picked this round, if any
    pub picked: Option<CupId>,
}

impl RoundState {
    pub fn level(&self) -> u8 {
        self.config.level
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            level: self.config.level,
            rounds_played: self.round,
            score: self.score,
            miss_count: self.miss_count,
            total_points: self.total_points,
        }
    }
}

/// Result of one resolved pick, handed to the round-completion notifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundReport {
    pub round: u32,
    pub correct: bool,
    pub picked_slot: usize,
    pub answer_slot: usize,
    pub points_awarded: u32,
    pub score: u32,
    pub miss_count: u32,
    pub total_points: u32,
}

/// Totals for a finished (or abandoned) game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub level: u8,
    pub rounds_played: u32,
    pub score: u32,
    pub miss_count: u32,
    pub total_points: u32,
}
