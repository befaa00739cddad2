//! Error types for the game engine, storage, and presentation seams

use thiserror::Error;

/// Persistent storage was unavailable or rejected a write
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StorageError(pub String);

/// The presentation adapter failed to draw or animate something
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RenderError(pub String);

/// Everything the core can report back to its caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Unknown difficulty level; pick a valid one and start again
    #[error("unknown difficulty level {0}")]
    InvalidLevel(u8),
    /// A shell game needs at least two cups
    #[error("a board needs at least 2 cups, got {0}")]
    TooFewCups(usize),
    /// Action attempted before a board was set up
    #[error("no round is ready yet")]
    NotReady,
    /// Swap indices out of range or identical
    #[error("cannot swap slots {i} and {j} on a board of {len} cups")]
    InvalidSwap { i: usize, j: usize, len: usize },
    /// The once-per-round hint was already spent
    #[error("the answer was already revealed this round")]
    RevealUsed,
    #[error("leaderboard storage failed: {0}")]
    StorageFailure(#[from] StorageError),
    #[error("render failed: {0}")]
    RenderFailure(#[from] RenderError),
}
