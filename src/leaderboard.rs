//! Run leaderboard: records, ranking and submission bookkeeping
//!
//! The hosted collection orders runs ascending by elapsed time; ties keep
//! insertion order. [`LeaderboardStore`] models that contract locally so rank
//! math and fallbacks stay testable, and doubles as the cached-row mirror the
//! UI reads while the network is away.

use serde::{Deserialize, Serialize};

/// Maximum length of a display name in a submitted run
pub const MAX_USERNAME_LEN: usize = 24;

/// How many rows the top list shows
pub const TOP_LIMIT: usize = 10;

/// A single recorded run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub username: String,
    /// Elapsed run time, whole milliseconds
    #[serde(rename = "timeMs")]
    pub time_ms: u64,
    /// Unix timestamp (ms) when submitted
    #[serde(rename = "createdAt")]
    pub created_at: f64,
}

/// What a submission came back with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// 1-based rank, `None` when the rank lookup failed
    pub rank: Option<u32>,
    pub time_ms: u64,
}

/// Clamp a raw display name into submission shape
///
/// Trims, falls back to "Anonymous", and truncates to [`MAX_USERNAME_LEN`]
/// characters.
pub fn sanitize_username(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "Anonymous".to_string();
    }
    trimmed.chars().take(MAX_USERNAME_LEN).collect()
}

/// Format milliseconds as `m:ss.mmm`
pub fn format_ms(ms: u64) -> String {
    let m = ms / 60_000;
    let s = (ms % 60_000) / 1000;
    let frac = ms % 1000;
    format!("{m}:{s:02}.{frac:03}")
}

/// Ordered run collection mirroring the hosted store's contract
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardStore {
    /// Rows in insertion order; ranking sorts stably by time
    rows: Vec<RunRecord>,
}

impl LeaderboardStore {
    /// LocalStorage key for the cached mirror (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "disc_shooter_runs_cache";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// All rows ranked ascending by time, ties in insertion order
    pub fn ranked(&self) -> Vec<RunRecord> {
        let mut sorted = self.rows.clone();
        sorted.sort_by_key(|r| r.time_ms);
        sorted
    }

    /// The display list: fastest [`TOP_LIMIT`] runs
    pub fn top(&self) -> Vec<RunRecord> {
        let mut ranked = self.ranked();
        ranked.truncate(TOP_LIMIT);
        ranked
    }

    /// Replace the cached rows wholesale (live-subscription refresh)
    pub fn replace(&mut self, rows: Vec<RunRecord>) {
        self.rows = rows;
    }

    /// Record a run and compute its 1-based rank
    ///
    /// Rank is the count of strictly faster rows plus one, so equal times
    /// share a rank and the earlier insertion still lists first.
    pub fn submit_run(&mut self, username: &str, time_ms: u64, now_ms: f64) -> SubmitReceipt {
        let record = RunRecord {
            username: sanitize_username(username),
            time_ms,
            created_at: now_ms,
        };
        self.rows.push(record);
        SubmitReceipt {
            rank: Some(approximate_rank(&self.rows, time_ms)),
            time_ms,
        }
    }

    /// Load the cached mirror from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(store) = serde_json::from_str::<LeaderboardStore>(&json) {
                    log::info!("Loaded {} cached leaderboard rows", store.rows.len());
                    return store;
                }
            }
        }

        log::info!("No cached leaderboard rows");
        Self::new()
    }

    /// Save the cached mirror to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

/// Approximate a 1-based rank from a row set: strictly faster rows + 1
pub fn approximate_rank(rows: &[RunRecord], time_ms: u64) -> u32 {
    rows.iter().filter(|r| r.time_ms < time_ms).count() as u32 + 1
}

/// Resolve a run's rank through the fallback chain
///
/// Exact rank from the backend wins; otherwise count faster rows in the
/// cached mirror; as a last resort run the provided recount (a fresh network
/// fetch) and count there. `None` means every layer failed, and the UI shows
/// the run without a rank.
pub fn resolve_rank<F>(
    exact: Option<u32>,
    cached: &[RunRecord],
    time_ms: u64,
    recount: F,
) -> Option<u32>
where
    F: FnOnce() -> Option<Vec<RunRecord>>,
{
    if let Some(rank) = exact {
        return Some(rank);
    }
    if !cached.is_empty() {
        return Some(approximate_rank(cached, time_ms));
    }
    recount().map(|rows| approximate_rank(&rows, time_ms))
}

/// Generation counter for outstanding submissions
///
/// Each run gets a token at submit time; a reset advances the epoch, so a
/// stale response that resolves afterwards is discarded instead of being
/// applied to the wrong run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunEpoch {
    current: u64,
}

/// Opaque handle tying an async result to the run it was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochToken(u64);

impl RunEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for the run currently in progress
    pub fn token(&self) -> EpochToken {
        EpochToken(self.current)
    }

    /// Invalidate all outstanding tokens (game reset / new run)
    pub fn advance(&mut self) {
        self.current += 1;
    }

    /// Whether a resolved result may still be applied
    pub fn accepts(&self, token: EpochToken) -> bool {
        token.0 == self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(name: &str, time_ms: u64) -> RunRecord {
        RunRecord {
            username: name.to_string(),
            time_ms,
            created_at: 0.0,
        }
    }

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(0), "0:00.000");
        assert_eq!(format_ms(61_234), "1:01.234");
        assert_eq!(format_ms(600_000), "10:00.000");
        assert_eq!(format_ms(59_999), "0:59.999");
    }

    #[test]
    fn test_sanitize_username() {
        assert_eq!(sanitize_username("  kit  "), "kit");
        assert_eq!(sanitize_username(""), "Anonymous");
        assert_eq!(sanitize_username("   "), "Anonymous");
        let long = "x".repeat(40);
        assert_eq!(sanitize_username(&long).chars().count(), MAX_USERNAME_LEN);
    }

    #[test]
    fn test_rank_is_one_based_fastest_first() {
        let mut store = LeaderboardStore::new();
        assert_eq!(store.submit_run("a", 5000, 0.0).rank, Some(1));
        assert_eq!(store.submit_run("b", 3000, 1.0).rank, Some(1));
        assert_eq!(store.submit_run("c", 9000, 2.0).rank, Some(3));

        let top = store.top();
        assert_eq!(top[0].username, "b");
        assert_eq!(top[1].username, "a");
        assert_eq!(top[2].username, "c");
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut store = LeaderboardStore::new();
        store.submit_run("first", 4000, 0.0);
        store.submit_run("second", 4000, 1.0);
        let ranked = store.ranked();
        assert_eq!(ranked[0].username, "first");
        assert_eq!(ranked[1].username, "second");
        // Equal times share a rank: neither is strictly faster
        assert_eq!(approximate_rank(&ranked, 4000), 1);
    }

    #[test]
    fn test_top_truncates() {
        let mut store = LeaderboardStore::new();
        for i in 0..25u64 {
            store.submit_run("p", 1000 + i, i as f64);
        }
        assert_eq!(store.top().len(), TOP_LIMIT);
        assert_eq!(store.len(), 25);
    }

    #[test]
    fn test_resolve_rank_prefers_exact() {
        let cached = vec![run("a", 100), run("b", 200)];
        let rank = resolve_rank(Some(7), &cached, 150, || panic!("no recount needed"));
        assert_eq!(rank, Some(7));
    }

    #[test]
    fn test_resolve_rank_falls_back_to_cache() {
        let cached = vec![run("a", 100), run("b", 200), run("c", 300)];
        let rank = resolve_rank(None, &cached, 250, || panic!("cache should win"));
        assert_eq!(rank, Some(3));
    }

    #[test]
    fn test_resolve_rank_recounts_last() {
        let rank = resolve_rank(None, &[], 250, || Some(vec![run("a", 100)]));
        assert_eq!(rank, Some(2));
        // Every layer failed: no rank, never a crash
        let rank = resolve_rank(None, &[], 250, || None);
        assert_eq!(rank, None);
    }

    #[test]
    fn test_epoch_discards_stale_results() {
        let mut epoch = RunEpoch::new();
        let token = epoch.token();
        assert!(epoch.accepts(token));

        // Game reset while the submit was in flight
        epoch.advance();
        assert!(!epoch.accepts(token));
        assert!(epoch.accepts(epoch.token()));
    }

    #[test]
    fn test_submitted_name_is_sanitized() {
        let mut store = LeaderboardStore::new();
        store.submit_run("   ", 1000, 0.0);
        assert_eq!(store.ranked()[0].username, "Anonymous");
    }
}
