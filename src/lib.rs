//! Shell Game - follow the ball while the cups are shuffled
//!
//! Core modules:
//! - `sim`: Board model, swap planning, round state machine and async driver
//! - `difficulty`: Level table
//! - `leaderboard`: Persisted, ranked score log
//! - `renderer`: Presenter contract plus headless and DOM adapters
//! - `persistence`: LocalStorage / in-memory key-value storage
//! - `platform`: Clock and seeding
//! - `settings`: Player preferences

pub mod difficulty;
pub mod error;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use difficulty::{DifficultyConfig, LEVELS, config_for};
pub use error::{GameError, RenderError, StorageError};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use settings::Settings;
pub use sim::{GameController, RoundPhase};

/// Game configuration constants
pub mod consts {
    /// Cup footprint (pixels)
    pub const CUP_WIDTH: f32 = 96.0;
    pub const CUP_HEIGHT: f32 = 110.0;

    /// Horizontal space kept free at the table edges
    pub const TABLE_MARGIN: f32 = 120.0;
    /// Slot spacing bounds; the minimum keeps neighbouring cups apart
    pub const MIN_SLOT_GAP: f32 = 104.0;
    pub const MAX_SLOT_GAP: f32 = 140.0;
    /// Cup row height as a fraction of table height
    pub const TABLE_BASELINE: f32 = 0.6;
    /// Ball centre below the cup centre
    pub const BALL_DROP: f32 = 36.0;

    /// How far cups rise when crossing during a swap
    pub const SWAP_LIFT_MIN: f32 = 20.0;
    pub const SWAP_LIFT_MAX: f32 = 60.0;

    /// Hint display time
    pub const HINT_MS: u32 = 900;
    /// Pause between a pick and the round result
    pub const RESOLVE_DELAY_MS: u32 = 520;
    /// Pause before the next round starts
    pub const COOLDOWN_MS: u32 = 1200;

    pub const DEFAULT_ROUNDS_PER_GAME: u32 = 5;
    pub const DEFAULT_LEADERBOARD_SIZE: usize = 5;
    pub const MAX_NAME_LEN: usize = 12;
}
