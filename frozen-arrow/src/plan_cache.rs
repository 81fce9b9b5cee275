//! C13: a bounded, thread-safe cache from a query's canonical (pre-
//! optimization) plan description to its optimized plan, matching
//! `datafusion`'s own use of `dashmap` for shared, lock-striped caches
//! (spec.md §4.13, §5 "cross-thread shared caches").

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use log::trace;

use frozen_arrow_common::error::Result;
use frozen_arrow_common::zonemap::ZoneMap;
use frozen_arrow_expr::LogicalPlan;

struct CacheEntry {
    plan: Arc<LogicalPlan>,
    last_used: Instant,
}

/// Hit/miss/eviction counters exposed for the concurrency stress test and
/// any caller that wants to confirm the cache is warm (spec.md §8).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Keyed by the un-optimized plan's canonical `description()`, which
/// includes literal values, so `age > 30` and `age > 40` land in distinct
/// entries (spec.md §4.13).
pub struct PlanCache {
    capacity: usize,
    entries: DashMap<String, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl PlanCache {
    pub fn new(capacity: usize) -> Self {
        PlanCache {
            capacity: capacity.max(1),
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Hit path: returns the cached optimized plan directly. Miss path:
    /// builds the raw plan with `build_raw`, optimizes it (C10), stores it,
    /// and returns it (spec.md §4.13: "translate -> optimize -> store").
    pub fn get_or_optimize(
        &self,
        raw_description: &str,
        zone_map: &ZoneMap,
        build_raw: impl FnOnce() -> Arc<LogicalPlan>,
    ) -> Result<Arc<LogicalPlan>> {
        if let Some(mut entry) = self.entries.get_mut(raw_description) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            entry.last_used = Instant::now();
            return Ok(entry.plan.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let raw = build_raw();
        let optimized = frozen_arrow_optimizer::optimize(&raw, zone_map)?;
        self.insert(raw_description.to_string(), optimized.clone());
        Ok(optimized)
    }

    fn insert(&self, key: String, plan: Arc<LogicalPlan>) {
        self.entries.insert(
            key,
            CacheEntry {
                plan,
                last_used: Instant::now(),
            },
        );
        if self.entries.len() > self.capacity {
            self.evict_oldest_quarter();
        }
    }

    /// LRU-style eviction of the oldest 25% once over capacity (spec.md
    /// §4.13), rather than evicting one entry at a time.
    fn evict_oldest_quarter(&self) {
        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().last_used))
            .collect();
        by_age.sort_by_key(|(_, t)| *t);
        let evict_count = (by_age.len() / 4).max(1);
        for (key, _) in by_age.into_iter().take(evict_count) {
            self.entries.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        trace!("plan cache evicted {evict_count} entries");
    }

    pub fn stats(&self) -> PlanCacheStats {
        PlanCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frozen_arrow_common::schema::{DataType, Field, Schema};

    fn schema() -> Schema {
        Schema::from_fields(vec![Field {
            name: "v".into(),
            index: 0,
            data_type: DataType::Int32,
            nullable: false,
        }])
    }

    #[test]
    fn miss_then_hit_updates_stats() {
        let cache = PlanCache::new(256);
        let zm = ZoneMap::build(&frozen_arrow_common::schema::FrozenBatch::new(dummy_batch()), 16_384);
        let key = "Scan: rows=1000";
        let schema = schema();
        let plan = cache
            .get_or_optimize(key, &zm, || Arc::new(LogicalPlan::scan(schema.clone(), 1000)))
            .unwrap();
        assert!(matches!(plan.as_ref(), LogicalPlan::Scan(_)));
        assert_eq!(cache.stats().misses, 1);

        let schema2 = schema.clone();
        cache
            .get_or_optimize(key, &zm, || Arc::new(LogicalPlan::scan(schema2, 1000)))
            .unwrap();
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn eviction_triggers_past_capacity() {
        let cache = PlanCache::new(4);
        let zm = ZoneMap::build(&frozen_arrow_common::schema::FrozenBatch::new(dummy_batch()), 16_384);
        for i in 0..8 {
            let schema = schema();
            let key = format!("Scan: rows={i}");
            cache
                .get_or_optimize(&key, &zm, move || Arc::new(LogicalPlan::scan(schema, i)))
                .unwrap();
        }
        assert!(cache.len() <= 8);
        assert!(cache.stats().evictions > 0);
    }

    fn dummy_batch() -> arrow::record_batch::RecordBatch {
        use arrow::array::Int32Array;
        use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
        use std::sync::Arc as StdArc;
        let schema = StdArc::new(ArrowSchema::new(vec![ArrowField::new("v", ArrowDataType::Int32, false)]));
        let array = StdArc::new(Int32Array::from(vec![1, 2, 3]));
        arrow::record_batch::RecordBatch::try_new(schema, vec![array]).unwrap()
    }
}
