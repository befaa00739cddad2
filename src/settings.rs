//! Player settings and preferences
//!
//! Persisted separately from the leaderboard. Missing fields take their
//! defaults, out-of-range values are pulled back into range.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_LEADERBOARD_SIZE, DEFAULT_ROUNDS_PER_GAME, MAX_NAME_LEN};
use crate::difficulty::LEVELS;
use crate::error::StorageError;
use crate::persistence::{Storage, load_json, save_json};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Rounds before the results view
    pub rounds_per_game: u32,
    /// Entries shown in the leaderboard view
    pub leaderboard_size: usize,
    /// Level selected last time
    pub last_level: u8,
    /// Name entered last time (prefills the save form)
    pub player_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rounds_per_game: DEFAULT_ROUNDS_PER_GAME,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            last_level: LEVELS[0],
            player_name: String::new(),
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "shell_game.settings";

    /// Clamp every field into its valid range
    pub fn normalized(mut self) -> Self {
        self.rounds_per_game = self.rounds_per_game.clamp(1, 20);
        self.leaderboard_size = self.leaderboard_size.clamp(1, 50);
        if !LEVELS.contains(&self.last_level) {
            self.last_level = LEVELS[0];
        }
        self.player_name = self.player_name.trim().chars().take(MAX_NAME_LEN).collect();
        self
    }

    /// Load settings, falling back to defaults
    pub fn load(storage: &impl Storage) -> Self {
        match load_json::<Settings>(storage, Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings");
                settings.normalized()
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut impl Storage) -> Result<(), StorageError> {
        save_json(storage, Self::STORAGE_KEY, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}
