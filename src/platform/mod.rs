//! Platform abstraction layer
//!
//! Wall clock and session seeding: `js_sys::Date` in the browser,
//! `SystemTime` natively.

/// Current Unix time in milliseconds
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> i64 {
    js_sys::Date::now() as i64
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Seed for a new session's RNG
pub fn session_seed() -> u64 {
    now_ms() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }
}
