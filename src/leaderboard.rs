//! Leaderboard
//!
//! Append-only log of finished games, persisted as a JSON array. Entries are
//! never edited or removed; ranking and top-N trimming happen on every read.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consts::MAX_NAME_LEN;
use crate::error::{GameError, StorageError};
use crate::persistence::{Storage, save_json};

/// Storage key for the entry log
pub const STORAGE_KEY: &str = "shell_game.leaderboard";

/// Name used when the player leaves the field blank
pub const ANONYMOUS: &str = "anonymous";

fn default_level() -> u8 {
    1
}

/// One saved game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    /// Correct picks
    pub score: u32,
    #[serde(rename = "miss", default)]
    pub miss_count: u32,
    #[serde(rename = "totalPoints", default)]
    pub total_points: u32,
    #[serde(default = "default_level")]
    pub level: u8,
    /// Unix timestamp (ms) when saved. Older saves called this `time`.
    #[serde(alias = "time", default)]
    pub timestamp: i64,
}

/// Ranking order: score high to low, then fewer misses, then name
pub fn rank_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(a.miss_count.cmp(&b.miss_count))
        .then_with(|| a.name.cmp(&b.name))
}

/// Trim, cap at `MAX_NAME_LEN` characters, fall back to "anonymous"
pub fn sanitize_name(raw: &str) -> String {
    let name: String = raw.trim().chars().take(MAX_NAME_LEN).collect();
    let name = name.trim_end();
    if name.is_empty() {
        ANONYMOUS.to_string()
    } else {
        name.to_string()
    }
}

/// Persisted leaderboard over any `Storage`
#[derive(Debug)]
pub struct Leaderboard<S: Storage> {
    storage: S,
}

impl<S: Storage> Leaderboard<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Stored records, undecoded. A failed read is an error; a blob that
    /// isn't a JSON array reads as an empty log.
    fn load_records(&self) -> Result<Vec<Value>, StorageError> {
        let Some(raw) = self.storage.get(STORAGE_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                log::warn!("Ignoring corrupt leaderboard: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// All saved entries in storage order.
    ///
    /// Missing, unreadable, or corrupt storage reads as empty; individual
    /// records that don't decode are skipped.
    pub fn entries(&self) -> Vec<LeaderboardEntry> {
        match self.load_records() {
            Ok(records) => decode_records(&records),
            Err(e) => {
                log::warn!("Leaderboard read failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Number of decodable entries. Reads storage on every call.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Reads storage on every call.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Save one entry. Returns the rank it took (1-indexed).
    ///
    /// Load, push, and write happen under one `&mut self` borrow, so two
    /// saves can't interleave and lose each other. The new record is pushed
    /// onto the stored records as they are, so records this version can't
    /// decode are written back untouched. A failed read or write is a
    /// `StorageFailure` and nothing is written.
    pub fn append(&mut self, entry: LeaderboardEntry) -> Result<usize, GameError> {
        let mut records = self.load_records()?;
        let rank = potential_rank_in(&decode_records(&records), &entry);

        let record = serde_json::to_value(&entry)
            .map_err(|e| StorageError(format!("encode entry failed: {}", e)))?;
        records.push(record);

        save_json(&mut self.storage, STORAGE_KEY, &records)?;
        log::info!("Leaderboard saved ({} records)", records.len());
        Ok(rank)
    }

    /// Top `n` entries, best first. Recomputed from storage on each call.
    pub fn ranked_top(&self, n: usize) -> Vec<LeaderboardEntry> {
        let mut entries = self.entries();
        entries.sort_by(rank_order);
        entries.truncate(n);
        entries
    }

    /// Rank `entry` would take if saved now (1-indexed)
    pub fn potential_rank(&self, entry: &LeaderboardEntry) -> usize {
        potential_rank_in(&self.entries(), entry)
    }

    /// Best saved entry, if any
    pub fn best(&self) -> Option<LeaderboardEntry> {
        self.ranked_top(1).into_iter().next()
    }
}

fn decode_records(records: &[Value]) -> Vec<LeaderboardEntry> {
    let entries: Vec<LeaderboardEntry> = records
        .iter()
        .filter_map(|v| LeaderboardEntry::deserialize(v).ok())
        .collect();
    if entries.len() < records.len() {
        log::warn!(
            "Skipped {} unreadable leaderboard records",
            records.len() - entries.len()
        );
    }
    entries
}

/// A new entry goes after every existing entry that ranks the same or better
fn potential_rank_in(entries: &[LeaderboardEntry], entry: &LeaderboardEntry) -> usize {
    entries
        .iter()
        .filter(|e| rank_order(e, entry) != Ordering::Greater)
        .count()
        + 1
}

/// Format a timestamp relative to `now` (both Unix ms)
pub fn format_age(now_ms: i64, timestamp_ms: i64) -> String {
    let diff_mins = (now_ms - timestamp_ms).max(0) / 60_000;
    let diff_hours = diff_mins / 60;
    let diff_days = diff_hours / 24;

    if diff_days >= 1 {
        match diff_days {
            1 => "Yesterday".to_string(),
            2..=6 => format!("{} days ago", diff_days),
            7..=13 => "1 week ago".to_string(),
            _ => format!("{} weeks ago", diff_days / 7),
        }
    } else if diff_hours >= 1 {
        if diff_hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", diff_hours)
        }
    } else if diff_mins >= 1 {
        if diff_mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", diff_mins)
        }
    } else {
        "Just now".to_string()
    }
}
