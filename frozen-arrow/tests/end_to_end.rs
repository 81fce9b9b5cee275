//! End-to-end scenarios over the seed dataset D (spec.md §8): 1000 rows of
//! `Id, Age, Active, Score, Cat`, exercised through both the fluent builder
//! (C11) and the SQL surface (C12), plus a concurrency stress test that
//! hammers a single shared [`FrozenArrow`] from many threads at once.

use std::sync::Arc;
use std::thread;

use arrow::array::{BooleanArray, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;

use frozen_arrow::{AggregateFn, CmpOp, ColumnPredicate, FrozenArrow, ScalarValue};

fn seed_dataset() -> RecordBatch {
    let n = 1000;
    let ids: Vec<i32> = (0..n).collect();
    let ages: Vec<i32> = (0..n).map(|i| 20 + i % 45).collect();
    let active: Vec<bool> = (0..n).map(|i| i % 2 == 0).collect();
    let scores: Vec<f64> = (0..n).map(|i| (i as f64 * 1.5) % 100.0).collect();
    let cats: Vec<&str> = (0..n)
        .map(|i| match i % 3 {
            0 => "A",
            1 => "B",
            _ => "C",
        })
        .collect();

    let schema = Arc::new(ArrowSchema::new(vec![
        ArrowField::new("Id", ArrowDataType::Int32, false),
        ArrowField::new("Age", ArrowDataType::Int32, false),
        ArrowField::new("Active", ArrowDataType::Boolean, false),
        ArrowField::new("Score", ArrowDataType::Float64, false),
        ArrowField::new("Cat", ArrowDataType::Utf8, false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int32Array::from(ids)),
            Arc::new(Int32Array::from(ages)),
            Arc::new(BooleanArray::from(active)),
            Arc::new(Float64Array::from(scores)),
            Arc::new(StringArray::from(cats)),
        ],
    )
    .unwrap()
}

/// Scenario 1: `Count()` over `Age > 55`.
#[test]
fn scenario_count_age_over_55() {
    let engine = FrozenArrow::new(seed_dataset());
    let count = engine.execute_sql_scalar("SELECT COUNT(*) FROM t WHERE Age > 55").unwrap();
    assert_eq!(count, ScalarValue::Int64(198));
}

/// Scenario 2: `Sum(Id)` over `Active && Score > 50`, via the builder, cross
/// checked against the SQL surface.
#[test]
fn scenario_sum_id_active_and_score_over_50() {
    let engine = FrozenArrow::new(seed_dataset());

    let active = ColumnPredicate::bool_eq(engine.schema(), "Active", true).unwrap();
    let score = ColumnPredicate::f64_cmp(engine.schema(), "Score", CmpOp::Gt, 50.0).unwrap();
    let plan = engine
        .query()
        .filter(ColumnPredicate::And(vec![active, score]))
        .unwrap()
        .aggregate(vec![AggregateFn::Sum(0)])
        .build();
    let builder_sum = engine.execute(plan).unwrap().into_scalar().unwrap();

    let sql_sum = engine
        .execute_sql_scalar("SELECT SUM(Id) FROM t WHERE Active = true AND Score > 50.0")
        .unwrap();

    assert_eq!(builder_sum, sql_sum);
}

/// Scenario 3: `Any()` with `Cat == "A"`.
#[test]
fn scenario_any_cat_a() {
    let engine = FrozenArrow::new(seed_dataset());
    let pred = ColumnPredicate::str_cmp(engine.schema(), "Cat", CmpOp::Eq, "A").unwrap();
    assert!(engine.any(&[pred]));

    let pred = ColumnPredicate::str_cmp(engine.schema(), "Cat", CmpOp::Eq, "Z").unwrap();
    assert!(!engine.any(&[pred]));
}

/// Scenario 4: `GroupBy(Cat)` with `Count()` and `Sum(Score)`, expecting
/// `{A: 334, B: 333, C: 333}` rows.
#[test]
fn scenario_group_by_cat_counts() {
    let engine = FrozenArrow::new(seed_dataset());
    let plan = engine
        .query()
        .group_by(4, "Cat", vec![AggregateFn::Count, AggregateFn::Sum(3)], 3)
        .build();
    let result = engine.execute(plan).unwrap();
    assert_eq!(result.rows.len(), 3);

    let mut counts: Vec<(String, i64)> = result
        .rows
        .iter()
        .map(|row| (row[0].as_str().unwrap().to_string(), row[1].as_i64().unwrap()))
        .collect();
    counts.sort();
    assert_eq!(
        counts,
        vec![("A".to_string(), 334), ("B".to_string(), 333), ("C".to_string(), 333)]
    );
}

/// Scenario 5: the SQL `GROUP BY` surface agrees with the builder surface
/// on the same query.
#[test]
fn scenario_sql_group_by_matches_builder() {
    let engine = FrozenArrow::new(seed_dataset());

    let sql_result = engine.execute_sql("SELECT Cat, COUNT(*) FROM t GROUP BY Cat").unwrap();
    let builder_plan = engine.query().group_by(4, "Cat", vec![AggregateFn::Count], 3).build();
    let builder_result = engine.execute(builder_plan).unwrap();

    let as_counts = |rows: &[Vec<ScalarValue>]| -> Vec<(String, i64)> {
        let mut v: Vec<(String, i64)> = rows
            .iter()
            .map(|row| (row[0].as_str().unwrap().to_string(), row[1].as_i64().unwrap()))
            .collect();
        v.sort();
        v
    };
    assert_eq!(as_counts(&sql_result.rows), as_counts(&builder_result.rows));
}

/// Scenario 6: `LIKE` wildcard placement selects the right rows.
#[test]
fn scenario_like_wildcard_scenarios() {
    let engine = FrozenArrow::new(seed_dataset());

    let all = engine.execute_sql("SELECT * FROM t WHERE Cat LIKE '%'").unwrap();
    assert_eq!(all.rows.len(), 1000);

    let a_prefix = engine.execute_sql("SELECT * FROM t WHERE Cat LIKE 'A%'").unwrap();
    assert_eq!(a_prefix.rows.len(), 334);

    let underscore = engine.execute_sql("SELECT * FROM t WHERE Cat LIKE '_'");
    assert!(underscore.is_err());
}

/// `OFFSET` must apply before `LIMIT` regardless of clause order: skip the
/// first `m` sorted rows, then take `n`, returning exactly `n` rows whose
/// `Id`s are the ones ranked `m..m+n`.
#[test]
fn sql_limit_offset_returns_limit_count_rows_after_skipping_offset() {
    let engine = FrozenArrow::new(seed_dataset());
    let id_index = engine.schema().column_index("Id").unwrap();
    let result = engine
        .execute_sql("SELECT * FROM t ORDER BY Age DESC LIMIT 10 OFFSET 5")
        .unwrap();
    assert_eq!(result.rows.len(), 10);

    let mut all_by_age_desc = engine.execute_sql("SELECT * FROM t ORDER BY Age DESC").unwrap();
    let expected: Vec<ScalarValue> = all_by_age_desc.rows.drain(5..15).map(|row| row[id_index].clone()).collect();
    let actual: Vec<ScalarValue> = result.rows.iter().map(|row| row[id_index].clone()).collect();
    assert_eq!(actual, expected);
}

/// Runs `W` threads against one shared [`FrozenArrow`], each issuing a mix
/// of scenarios repeatedly, and checks every result against a known-correct
/// single-threaded reference plus that the plan cache reports hits once
/// warm (spec.md §8's concurrency stress test).
#[test]
fn concurrency_stress_many_threads_share_one_engine() {
    let engine = Arc::new(FrozenArrow::new(seed_dataset()));

    // Warm the plan cache before measuring hit rate so every thread's first
    // iteration is already a hit.
    engine.execute_sql("SELECT COUNT(*) FROM t WHERE Age > 55").unwrap();

    let workers = 8;
    let iterations = 125;
    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let engine = engine.clone();
        handles.push(thread::spawn(move || {
            for i in 0..iterations {
                match i % 3 {
                    0 => {
                        let count = engine.execute_sql_scalar("SELECT COUNT(*) FROM t WHERE Age > 55").unwrap();
                        assert_eq!(count, ScalarValue::Int64(198));
                    }
                    1 => {
                        let result = engine.execute_sql("SELECT Cat, COUNT(*) FROM t GROUP BY Cat").unwrap();
                        assert_eq!(result.rows.len(), 3);
                    }
                    _ => {
                        let pred = ColumnPredicate::str_cmp(engine.schema(), "Cat", CmpOp::Eq, "A").unwrap();
                        assert!(engine.any(&[pred]));
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    let stats = engine.plan_cache_stats();
    assert!(stats.hits > 0, "expected the plan cache to report hits once warm");
}
