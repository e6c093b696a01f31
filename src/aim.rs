//! Aim trainer: five dots spawn at random, click them all as fast as you can
//!
//! The round clock starts at the instant of the first click (on a dot or on
//! the play area) and stops on the fifth hit. Each run records the cumulative
//! hit times, the per-click splits derived from them, and the rounded average
//! split.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Dots per round
pub const DOT_COUNT: usize = 5;
/// Dot diameter in layout pixels
pub const DOT_DIAMETER: f32 = 28.0;
/// Minimum center distance between spawned dots
pub const DOT_SPACING: f32 = DOT_DIAMETER * 1.2;
/// Give up de-overlapping after this many tries and accept the position
pub const MAX_PLACE_TRIES: u32 = 50;
/// Rows shown in the per-user best list
pub const BEST_LIST_LIMIT: usize = 20;

/// Place dots inside a `width` x `height` area, avoiding heavy overlap
///
/// Rejection sampling with a bounded retry count, so a cramped area still
/// terminates (with overlaps) rather than spinning.
pub fn spawn_dots<R: Rng>(rng: &mut R, width: f32, height: f32) -> Vec<Vec2> {
    let radius = DOT_DIAMETER / 2.0;
    let mut placed: Vec<Vec2> = Vec::with_capacity(DOT_COUNT);

    for _ in 0..DOT_COUNT {
        let mut tries = 0;
        let pos = loop {
            let x = rng.random_range(0.0..(width - DOT_DIAMETER).max(1.0)) + radius;
            let y = rng.random_range(0.0..(height - DOT_DIAMETER).max(1.0)) + radius;
            let candidate = Vec2::new(x, y);
            tries += 1;
            let overlaps = placed.iter().any(|p| p.distance(candidate) < DOT_SPACING);
            if !overlaps || tries >= MAX_PLACE_TRIES {
                break candidate;
            }
        };
        placed.push(pos);
    }
    placed
}

/// Round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AimPhase {
    /// Dots are up, clock not started
    Ready,
    /// Clock running
    Running,
    /// All dots hit
    Finished,
}

/// Result of a finished round
#[derive(Debug, Clone, PartialEq)]
pub struct AimSummary {
    pub time_ms: u64,
    /// Per-click splits; the first is measured from the clock start
    pub inter_ms: Vec<u64>,
    /// Rounded mean split, `None` for an empty run
    pub avg_inter_ms: Option<u64>,
}

/// One round of the trainer
#[derive(Debug, Clone)]
pub struct AimRun {
    phase: AimPhase,
    started_at_ms: f64,
    /// Cumulative hit times since the clock start
    hits: Vec<f64>,
}

impl Default for AimRun {
    fn default() -> Self {
        Self::new()
    }
}

impl AimRun {
    pub fn new() -> Self {
        Self {
            phase: AimPhase::Ready,
            started_at_ms: 0.0,
            hits: Vec::with_capacity(DOT_COUNT),
        }
    }

    pub fn phase(&self) -> AimPhase {
        self.phase
    }

    pub fn remaining(&self) -> usize {
        DOT_COUNT - self.hits.len()
    }

    /// Start the clock without consuming a dot (click on the play area)
    pub fn start(&mut self, now_ms: f64) {
        if self.phase == AimPhase::Ready {
            self.phase = AimPhase::Running;
            self.started_at_ms = now_ms;
        }
    }

    /// Elapsed time so far, for the live timer display
    pub fn elapsed_ms(&self, now_ms: f64) -> u64 {
        match self.phase {
            AimPhase::Ready => 0,
            _ => (now_ms - self.started_at_ms).max(0.0).floor() as u64,
        }
    }

    /// Register a dot hit; the first hit of a round starts the clock at that
    /// very instant (so its split is zero). Returns the summary when this hit
    /// was the last one.
    pub fn register_hit(&mut self, now_ms: f64) -> Option<AimSummary> {
        match self.phase {
            AimPhase::Finished => return None,
            AimPhase::Ready => self.start(now_ms),
            AimPhase::Running => {}
        }
        self.hits.push(now_ms - self.started_at_ms);

        if self.hits.len() < DOT_COUNT {
            return None;
        }
        self.phase = AimPhase::Finished;

        let inter_ms = splits(&self.hits);
        let avg_inter_ms = average_split(&inter_ms);
        Some(AimSummary {
            time_ms: (now_ms - self.started_at_ms).max(0.0).floor() as u64,
            inter_ms,
            avg_inter_ms,
        })
    }
}

/// Inter-click intervals from cumulative hit times
pub fn splits(cumulative_ms: &[f64]) -> Vec<u64> {
    cumulative_ms
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            let prev = if i == 0 { 0.0 } else { cumulative_ms[i - 1] };
            (t - prev).max(0.0).floor() as u64
        })
        .collect()
}

/// Rounded mean of the splits
pub fn average_split(inter_ms: &[u64]) -> Option<u64> {
    if inter_ms.is_empty() {
        return None;
    }
    let sum: u64 = inter_ms.iter().sum();
    Some((sum as f64 / inter_ms.len() as f64).round() as u64)
}

/// A submitted trainer run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AimRecord {
    pub username: String,
    #[serde(rename = "timeMs")]
    pub time_ms: u64,
    pub uid: Option<String>,
    #[serde(rename = "interMs")]
    pub inter_ms: Vec<u64>,
    #[serde(rename = "avgInterMs")]
    pub avg_inter_ms: Option<u64>,
}

/// Fastest run per user, ascending, capped at [`BEST_LIST_LIMIT`]
///
/// Users are keyed by uid when present, otherwise by display name, so an
/// anonymous rename doesn't orphan old runs with the same uid.
pub fn best_per_user(rows: &[AimRecord]) -> Vec<AimRecord> {
    use std::collections::HashMap;

    let mut best: HashMap<String, &AimRecord> = HashMap::new();
    for row in rows {
        let key = match &row.uid {
            Some(uid) => format!("uid:{uid}"),
            None => format!("name:{}", row.username),
        };
        match best.get(&key) {
            Some(existing) if existing.time_ms <= row.time_ms => {}
            _ => {
                best.insert(key, row);
            }
        }
    }

    let mut rows: Vec<AimRecord> = best.into_values().cloned().collect();
    rows.sort_by_key(|r| r.time_ms);
    rows.truncate(BEST_LIST_LIMIT);
    rows
}

/// This visitor's fastest time, matched by uid or display name
pub fn best_for_user(rows: &[AimRecord], uid: Option<&str>, name: &str) -> Option<u64> {
    rows.iter()
        .filter(|r| {
            let uid_match = matches!((uid, &r.uid), (Some(a), Some(b)) if a == b);
            uid_match || r.username == name
        })
        .map(|r| r.time_ms)
        .min()
}
