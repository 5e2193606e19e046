use super::*;
use crate::{
    error::{ErrorClass, ErrorOrigin},
    merge::{
        MergeStrategy,
        columns::ColumnIndexMap,
        compare::{ComparatorContext, RowComparator},
        cursor::MergedCursor,
        dialect::DialectKind,
        orderby::OrderByStreamMerge,
        shard::MemoryShardCursor,
        statement::{AggregationProjection, OrderItem},
    },
    obs::sink::MetricsEvent,
    test_support::{capture_events, drain, shard},
    value::TextMode,
};
use proptest::prelude::*;

const SALES: [&str; 5] = ["region", "total", "cnt", "lo", "hi"];

fn sales_aggregations() -> Vec<AggregationProjection> {
    vec![
        AggregationProjection::sum("total"),
        AggregationProjection::count("cnt"),
        AggregationProjection::min("lo"),
        AggregationProjection::max("hi"),
    ]
}

fn sales_row(region: &str, total: i64, cnt: i64, lo: i64, hi: i64) -> Vec<Cell> {
    vec![
        Cell::from(region),
        Cell::Int(total),
        Cell::Int(cnt),
        Cell::Int(lo),
        Cell::Int(hi),
    ]
}

struct Fixture {
    columns: ColumnIndexMap,
}

impl Fixture {
    fn new(labels: &[&str]) -> Self {
        Self {
            columns: ColumnIndexMap::from_shard(&shard(labels, Vec::new()))
                .expect("column map should build"),
        }
    }

    fn comparator(&self, items: &[OrderItem]) -> RowComparator {
        self.comparator_with(items, TextMode::Cs)
    }

    fn comparator_with(&self, items: &[OrderItem], text_mode: TextMode) -> RowComparator {
        let ctx = ComparatorContext {
            columns: &self.columns,
            dialect: DialectKind::MySql,
            schema: "logic_db",
            catalog: None,
            default_text_mode: text_mode,
        };

        RowComparator::build(items, &ctx).expect("comparator should build")
    }

    fn plan(&self, group: &[OrderItem], aggregations: &[AggregationProjection]) -> GroupPlan {
        self.plan_with(group, aggregations, TextMode::Cs)
    }

    fn plan_with(
        &self,
        group: &[OrderItem],
        aggregations: &[AggregationProjection],
        text_mode: TextMode,
    ) -> GroupPlan {
        GroupPlan::new(
            KeyExtractor::new(self.comparator_with(group, text_mode)),
            AggregationUnit::resolve_all(aggregations, &self.columns)
                .expect("aggregations should resolve"),
            self.columns.column_count(),
        )
    }

    fn memory(
        &self,
        shards: Vec<MemoryShardCursor>,
        group: &[OrderItem],
        aggregations: &[AggregationProjection],
        order: &[OrderItem],
        max_groups: u64,
    ) -> GroupByMemoryMerge<MemoryShardCursor> {
        let order = (!order.is_empty()).then(|| KeyExtractor::new(self.comparator(order)));

        GroupByMemoryMerge::new(shards, self.plan(group, aggregations), order, max_groups)
    }

    fn stream(
        &self,
        shards: Vec<MemoryShardCursor>,
        group: &[OrderItem],
        aggregations: &[AggregationProjection],
    ) -> GroupByStreamMerge<MemoryShardCursor> {
        let inner = OrderByStreamMerge::new(shards, self.comparator(group), true);

        GroupByStreamMerge::new(inner, self.plan(group, aggregations))
    }
}

fn sorted_by_first_column(mut rows: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
    rows.sort_by(|left, right| left[0].as_text().cmp(&right[0].as_text()));
    rows
}

#[test]
fn memory_merge_sums_regions_across_shards() {
    let fixture = Fixture::new(&["region", "amount"]);
    let shards = vec![
        shard(
            &["region", "amount"],
            vec![
                vec![Cell::from("east"), Cell::Int(10)],
                vec![Cell::from("west"), Cell::Int(5)],
            ],
        ),
        shard(
            &["region", "amount"],
            vec![
                vec![Cell::from("east"), Cell::Int(7)],
                vec![Cell::from("north"), Cell::Int(3)],
            ],
        ),
    ];
    let mut merge = fixture.memory(
        shards,
        &[OrderItem::asc("region")],
        &[AggregationProjection::sum("amount")],
        &[],
        100,
    );

    assert_eq!(
        drain(&mut merge, 2),
        vec![
            vec![Cell::from("east"), Cell::Int(17)],
            vec![Cell::from("west"), Cell::Int(5)],
            vec![Cell::from("north"), Cell::Int(3)],
        ],
        "groups come out in first-seen order without ORDER BY"
    );
}

#[test]
fn stream_merge_combines_every_aggregate_kind() {
    let fixture = Fixture::new(&SALES);
    let shards = vec![
        shard(
            &SALES,
            vec![sales_row("east", 10, 2, 1, 9), sales_row("west", 5, 1, 5, 5)],
        ),
        shard(
            &SALES,
            vec![sales_row("east", 7, 3, 0, 4), sales_row("north", 3, 1, 3, 3)],
        ),
    ];
    let mut merge = fixture.stream(shards, &[OrderItem::asc("region")], &sales_aggregations());

    assert_eq!(
        drain(&mut merge, 5),
        vec![
            sales_row("east", 17, 5, 0, 9),
            sales_row("north", 3, 1, 3, 3),
            sales_row("west", 5, 1, 5, 5),
        ]
    );
}

#[test]
fn avg_is_recomputed_from_derived_count_and_sum() {
    let labels = ["region", "avg_amount", "avg_count", "avg_sum"];
    let fixture = Fixture::new(&labels);
    let shards = vec![
        shard(
            &labels,
            vec![vec![
                Cell::from("east"),
                Cell::Float(5.0),
                Cell::Int(2),
                Cell::Int(10),
            ]],
        ),
        shard(
            &labels,
            vec![vec![
                Cell::from("east"),
                Cell::Float(7.0),
                Cell::Int(1),
                Cell::Int(7),
            ]],
        ),
    ];
    let avg = [AggregationProjection::avg("avg_amount", "avg_count", "avg_sum")];
    let mut merge = fixture.stream(shards, &[OrderItem::asc("region")], &avg);

    let rows = drain(&mut merge, 4);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][2], Cell::Int(3), "derived count is combined");
    assert_eq!(rows[0][3], Cell::Int(17), "derived sum is combined");
    let Cell::Float(average) = &rows[0][1] else {
        panic!("AVG should be a float, got {:?}", rows[0][1]);
    };
    assert!((*average - 17.0 / 3.0).abs() < 1e-9);
}

#[test]
fn ungrouped_aggregate_over_no_rows_yields_one_row() {
    let labels = ["cnt", "total"];
    let fixture = Fixture::new(&labels);
    let aggregations = [
        AggregationProjection::count("cnt"),
        AggregationProjection::sum("total"),
    ];
    let expected = vec![vec![Cell::Int(0), Cell::Null]];

    let mut stream = fixture.stream(
        vec![shard(&labels, Vec::new()), shard(&labels, Vec::new())],
        &[],
        &aggregations,
    );
    assert_eq!(drain(&mut stream, 2), expected);

    let mut memory = fixture.memory(
        vec![shard(&labels, Vec::new()), shard(&labels, Vec::new())],
        &[],
        &aggregations,
        &[],
        10,
    );
    assert_eq!(drain(&mut memory, 2), expected);
}

#[test]
fn grouped_aggregate_over_no_rows_yields_nothing() {
    let fixture = Fixture::new(&SALES);
    let mut merge = fixture.memory(
        vec![shard(&SALES, Vec::new())],
        &[OrderItem::asc("region")],
        &sales_aggregations(),
        &[],
        10,
    );

    assert!(drain(&mut merge, 5).is_empty());
}

#[test]
fn null_group_keys_form_one_group() {
    let labels = ["region", "amount"];
    let fixture = Fixture::new(&labels);
    let shards = vec![
        shard(&labels, vec![vec![Cell::Null, Cell::Int(1)]]),
        shard(&labels, vec![vec![Cell::Null, Cell::Int(2)]]),
    ];
    let mut merge = fixture.memory(
        shards,
        &[OrderItem::asc("region")],
        &[AggregationProjection::sum("amount")],
        &[],
        10,
    );

    assert_eq!(drain(&mut merge, 2), vec![vec![Cell::Null, Cell::Int(3)]]);
}

#[test]
fn memory_merge_sorts_by_independent_order_key() {
    let labels = ["region", "amount"];
    let fixture = Fixture::new(&labels);
    let shards = vec![
        shard(
            &labels,
            vec![
                vec![Cell::from("a"), Cell::Int(1)],
                vec![Cell::from("b"), Cell::Int(9)],
            ],
        ),
        shard(
            &labels,
            vec![
                vec![Cell::from("c"), Cell::Int(4)],
                vec![Cell::from("a"), Cell::Int(2)],
            ],
        ),
    ];
    let mut merge = fixture.memory(
        shards,
        &[OrderItem::asc("region")],
        &[AggregationProjection::sum("amount")],
        &[OrderItem::desc("amount")],
        10,
    );

    assert_eq!(
        drain(&mut merge, 2),
        vec![
            vec![Cell::from("b"), Cell::Int(9)],
            vec![Cell::from("c"), Cell::Int(4)],
            vec![Cell::from("a"), Cell::Int(3)],
        ]
    );
}

#[test]
fn memory_merge_enforces_group_budget() {
    let labels = ["region", "amount"];
    let fixture = Fixture::new(&labels);
    let shards = vec![shard(
        &labels,
        vec![
            vec![Cell::from("a"), Cell::Int(1)],
            vec![Cell::from("a"), Cell::Int(1)],
            vec![Cell::from("b"), Cell::Int(1)],
        ],
    )];
    let mut merge = fixture.memory(
        shards,
        &[OrderItem::asc("region")],
        &[AggregationProjection::sum("amount")],
        &[],
        1,
    );

    let err = merge.advance().expect_err("second group exceeds the budget");
    assert_eq!(err.class, ErrorClass::BudgetExceeded);
}

#[test]
fn non_numeric_sum_is_a_schema_mismatch() {
    let labels = ["region", "amount"];
    let fixture = Fixture::new(&labels);
    let shards = vec![shard(
        &labels,
        vec![vec![Cell::from("a"), Cell::from("ten")]],
    )];
    let mut merge = fixture.memory(
        shards,
        &[OrderItem::asc("region")],
        &[AggregationProjection::sum("amount")],
        &[],
        10,
    );

    let err = merge.advance().expect_err("text SUM must fail");
    assert_eq!(err.class, ErrorClass::SchemaMismatch);
    assert_eq!(err.origin, ErrorOrigin::Aggregate);
}

#[test]
fn group_merges_report_materialized_groups() {
    let fixture = Fixture::new(&SALES);
    let (rows, events) = capture_events(|| {
        let shards = vec![shard(
            &SALES,
            vec![sales_row("east", 1, 1, 1, 1), sales_row("west", 1, 1, 1, 1)],
        )];
        let mut merge = fixture.stream(shards, &[OrderItem::asc("region")], &sales_aggregations());
        drain(&mut merge, 5)
    });

    assert_eq!(rows.len(), 2);
    assert!(events.contains(&MetricsEvent::GroupsMaterialized {
        strategy: MergeStrategy::GroupByStream,
        groups: 2,
    }));
}

#[test]
fn integer_and_nearby_float_keys_group_the_same_on_both_paths() {
    // 2^53 + 1 is not representable in f64; it must not collapse onto 2^53
    let labels = ["k", "total"];
    let fixture = Fixture::new(&labels);
    let build = || {
        vec![
            shard(
                &labels,
                vec![vec![Cell::Int(9_007_199_254_740_993), Cell::Int(1)]],
            ),
            shard(
                &labels,
                vec![vec![Cell::Float(9_007_199_254_740_992.0), Cell::Int(2)]],
            ),
        ]
    };
    let group = [OrderItem::asc("k")];
    let sum = [AggregationProjection::sum("total")];
    let expected = vec![
        vec![Cell::Float(9_007_199_254_740_992.0), Cell::Int(2)],
        vec![Cell::Int(9_007_199_254_740_993), Cell::Int(1)],
    ];

    let mut stream = fixture.stream(build(), &group, &sum);
    assert_eq!(drain(&mut stream, 2), expected);

    let mut memory = fixture.memory(build(), &group, &sum, &group, 10);
    assert_eq!(drain(&mut memory, 2), expected);
}

#[test]
fn case_insensitive_group_keys_fold_on_both_paths() {
    let labels = ["name", "cnt"];
    let fixture = Fixture::new(&labels);
    let build = || {
        vec![
            shard(&labels, vec![vec![Cell::from("a"), Cell::Int(1)]]),
            shard(&labels, vec![vec![Cell::from("A"), Cell::Int(2)]]),
            shard(&labels, vec![vec![Cell::from("a"), Cell::Int(4)]]),
        ]
    };
    let group = [OrderItem::asc("name")];
    let count = [AggregationProjection::count("cnt")];
    let expected = vec![vec![Cell::from("a"), Cell::Int(7)]];

    let mut stream = GroupByStreamMerge::new(
        OrderByStreamMerge::new(build(), fixture.comparator_with(&group, TextMode::Ci), true),
        fixture.plan_with(&group, &count, TextMode::Ci),
    );
    assert_eq!(drain(&mut stream, 2), expected);

    let mut memory = GroupByMemoryMerge::new(
        build(),
        fixture.plan_with(&group, &count, TextMode::Ci),
        None,
        10,
    );
    assert_eq!(drain(&mut memory, 2), expected);
}

fn arb_partials() -> impl Strategy<Value = Vec<Vec<(u8, i64, i64, i64)>>> {
    // (region, total, cnt, extreme) per partial row, per shard
    prop::collection::vec(
        prop::collection::vec((0u8..4, -50i64..50, 0i64..5, -20i64..20), 0..6),
        1..4,
    )
}

fn partial_rows(partials: &[(u8, i64, i64, i64)]) -> Vec<Vec<Cell>> {
    let mut partials = partials.to_vec();
    partials.sort_by_key(|(region, ..)| *region);

    partials
        .into_iter()
        .map(|(region, total, cnt, extreme)| {
            sales_row(&format!("r{region}"), total, cnt, extreme, extreme)
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn stream_and_memory_group_merges_agree(partials in arb_partials()) {
        let fixture = Fixture::new(&SALES);
        let group = [OrderItem::asc("region")];
        let build = || {
            partials
                .iter()
                .map(|rows| shard(&SALES, partial_rows(rows)))
                .collect::<Vec<_>>()
        };

        let mut stream = fixture.stream(build(), &group, &sales_aggregations());
        let mut memory = fixture.memory(build(), &group, &sales_aggregations(), &[], 1_000);

        let stream_rows = drain(&mut stream, 5);
        let memory_rows = sorted_by_first_column(drain(&mut memory, 5));
        prop_assert_eq!(stream_rows, memory_rows);
    }
}
