//! C16: a process-wide feedback loop that records per-query execution
//! samples and learns which [`Strategy`] actually performs best, overriding
//! the physical planner's static cost model once enough evidence exists
//! (spec.md §4.16). State is in-memory only, lost on restart.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use log::{debug, warn};
use parking_lot::Mutex;

use frozen_arrow_physical::Strategy;

/// Samples kept per `(query_hash, strategy)` ring buffer.
const WINDOW: usize = 32;
/// Minimum samples for a strategy before it's eligible to be "learned".
const MIN_SAMPLES: usize = 5;

#[derive(Debug, Clone, Copy)]
struct Sample {
    wall_ns: u64,
    #[allow(dead_code)]
    rows_processed: i64,
    #[allow(dead_code)]
    selectivity_actual: f64,
}

/// A caller-facing recommendation, for the host to log.
#[derive(Debug, Clone)]
pub enum Recommendation {
    /// A strategy is taking much longer than its peers for this query.
    Slow { query_hash: u64, strategy: Strategy, avg_wall_ns: u64 },
    /// A faster strategy has been learned and will be used going forward.
    Opportunity { query_hash: u64, strategy: Strategy, avg_wall_ns: u64 },
}

fn strategy_slot(strategy: Strategy) -> usize {
    match strategy {
        Strategy::Sequential => 0,
        Strategy::SIMD => 1,
        Strategy::Parallel => 2,
    }
}

const STRATEGIES: [Strategy; 3] = [Strategy::Sequential, Strategy::SIMD, Strategy::Parallel];

#[derive(Default)]
struct QueryStats {
    windows: [Mutex<VecDeque<Sample>>; 3],
}

/// Shared, lock-striped tracker keyed by `query_hash` (the optimized plan's
/// canonical description, hashed). Constructed once by [`crate::FrozenArrow`]
/// and never torn down, per spec.md §9's cache lifecycle rule.
#[derive(Default)]
pub struct AdaptiveStatsTracker {
    by_query: DashMap<u64, QueryStats>,
    total_samples: AtomicU64,
}

impl AdaptiveStatsTracker {
    pub fn new() -> Self {
        AdaptiveStatsTracker::default()
    }

    /// Records one execution's outcome, trimming each strategy's ring buffer
    /// to the most recent [`WINDOW`] samples.
    pub fn record(&self, query_hash: u64, strategy: Strategy, wall_ns: u64, rows_processed: i64, selectivity_actual: f64) {
        self.total_samples.fetch_add(1, Ordering::Relaxed);
        let entry = self.by_query.entry(query_hash).or_default();
        let mut window = entry.windows[strategy_slot(strategy)].lock();
        if window.len() == WINDOW {
            window.pop_front();
        }
        window.push_back(Sample { wall_ns, rows_processed, selectivity_actual });
    }

    fn average_ns(window: &VecDeque<Sample>) -> Option<u64> {
        if window.len() < MIN_SAMPLES {
            return None;
        }
        Some((window.iter().map(|s| s.wall_ns as u128).sum::<u128>() / window.len() as u128) as u64)
    }

    /// Returns the learned best strategy for `query_hash` once at least
    /// [`MIN_SAMPLES`] samples exist for more than one strategy; ties break
    /// toward the statically cheaper strategy (Sequential < SIMD < Parallel
    /// in CPU cost, per spec.md §4.14's multipliers).
    pub fn learned_strategy(&self, query_hash: u64) -> Option<Strategy> {
        let entry = self.by_query.get(&query_hash)?;
        let mut best: Option<(Strategy, u64)> = None;
        for strategy in STRATEGIES {
            let window = entry.windows[strategy_slot(strategy)].lock();
            let Some(avg) = Self::average_ns(&window) else { continue };
            best = match best {
                None => Some((strategy, avg)),
                Some((_, best_avg)) if avg < best_avg => Some((strategy, avg)),
                other => other,
            };
        }
        best.map(|(s, _)| s)
    }

    /// `suggest`: learned strategy if one exists, else `None` so the caller
    /// falls back to the physical planner's heuristic (spec.md §4.16).
    pub fn suggest(&self, query_hash: u64) -> Option<Strategy> {
        self.learned_strategy(query_hash)
    }

    /// Compares every strategy's average against the learned best and emits
    /// `Slow`/`Opportunity` recommendations for the caller to log.
    pub fn recommendations(&self, query_hash: u64) -> Vec<Recommendation> {
        let Some(entry) = self.by_query.get(&query_hash) else { return Vec::new() };
        let Some(best) = self.learned_strategy(query_hash) else { return Vec::new() };
        let best_avg = {
            let window = entry.windows[strategy_slot(best)].lock();
            Self::average_ns(&window).unwrap_or(0)
        };

        let mut out = Vec::new();
        for strategy in STRATEGIES {
            let window = entry.windows[strategy_slot(strategy)].lock();
            let Some(avg) = Self::average_ns(&window) else { continue };
            if strategy == best {
                continue;
            }
            if avg > best_avg.saturating_mul(2) {
                out.push(Recommendation::Slow { query_hash, strategy, avg_wall_ns: avg });
            }
        }
        out.push(Recommendation::Opportunity { query_hash, strategy: best, avg_wall_ns: best_avg });
        out
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples.load(Ordering::Relaxed)
    }
}

/// Logs `recommendations` at the levels spec.md §4.19 assigns them.
pub fn log_recommendations(recs: &[Recommendation]) {
    for rec in recs {
        match rec {
            Recommendation::Slow { query_hash, strategy, avg_wall_ns } => {
                warn!("query {query_hash:x}: strategy {strategy} is slow (avg {avg_wall_ns}ns)");
            }
            Recommendation::Opportunity { query_hash, strategy, avg_wall_ns } => {
                debug!("query {query_hash:x}: learned strategy {strategy} (avg {avg_wall_ns}ns)");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_samples_means_no_suggestion() {
        let tracker = AdaptiveStatsTracker::new();
        assert!(tracker.suggest(42).is_none());
    }

    #[test]
    fn learns_the_faster_strategy_after_minimum_samples() {
        let tracker = AdaptiveStatsTracker::new();
        for _ in 0..MIN_SAMPLES {
            tracker.record(1, Strategy::Sequential, 1_000, 100, 1.0);
            tracker.record(1, Strategy::SIMD, 100, 100, 1.0);
        }
        assert_eq!(tracker.suggest(1), Some(Strategy::SIMD));
    }

    #[test]
    fn ring_buffer_caps_at_window_size() {
        let tracker = AdaptiveStatsTracker::new();
        for i in 0..(WINDOW * 2) {
            tracker.record(7, Strategy::Sequential, i as u64, 10, 1.0);
        }
        let entry = tracker.by_query.get(&7).unwrap();
        assert_eq!(entry.windows[strategy_slot(Strategy::Sequential)].lock().len(), WINDOW);
    }
}
