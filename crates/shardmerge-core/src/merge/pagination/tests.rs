use super::*;
use crate::{
    merge::iterator::IteratorStreamMerge,
    test_support::{capture_events, drain, int_rows, shard},
};
use proptest::prelude::*;

fn values(values: &[i64]) -> Box<dyn MergedCursor> {
    let rows = values.iter().map(|value| vec![Cell::Int(*value)]).collect();

    Box::new(IteratorStreamMerge::new(vec![shard(&["v"], rows)]))
}

fn paged(kind: PaginationKind, spec: PaginationSpec, input: &[i64]) -> Vec<i64> {
    let mut merge = PaginationMerge::new(values(input), kind, &spec);

    drain(&mut merge, 1)
        .into_iter()
        .filter_map(|row| row[0].as_i64())
        .collect()
}

#[test]
fn limit_two_offset_one() {
    assert_eq!(
        paged(
            PaginationKind::Limit,
            PaginationSpec::limit(1, 2),
            &[10, 20, 30, 40]
        ),
        vec![20, 30]
    );
}

#[test]
fn offset_already_applied_per_shard_is_not_skipped_again() {
    let spec = PaginationSpec::limit(1, 2).applied_per_shard();

    assert_eq!(
        paged(PaginationKind::Limit, spec, &[10, 20, 30, 40]),
        vec![10, 20]
    );
}

#[test]
fn offset_without_row_count_keeps_the_tail() {
    assert_eq!(
        paged(
            PaginationKind::Limit,
            PaginationSpec::offset_only(2),
            &[1, 2, 3, 4]
        ),
        vec![3, 4]
    );
}

#[test]
fn zero_row_count_yields_nothing() {
    assert!(paged(PaginationKind::Limit, PaginationSpec::limit(0, 0), &[1, 2]).is_empty());
}

#[test]
fn row_number_exposes_rows_between_offset_and_end() {
    assert_eq!(
        paged(
            PaginationKind::RowNumber,
            PaginationSpec::limit(2, 2),
            &[1, 2, 3, 4, 5]
        ),
        vec![3, 4]
    );
}

#[test]
fn top_bounds_the_row_number() {
    // TOP 4 with offset 1 leaves three visible rows even though row_count is 10
    let spec = PaginationSpec::limit(1, 10).with_top(4);

    assert_eq!(
        paged(PaginationKind::TopAndRowNumber, spec, &[1, 2, 3, 4, 5, 6]),
        vec![2, 3, 4]
    );
}

#[test]
fn top_alone_limits_rows() {
    let spec = PaginationSpec::none().with_top(2);

    assert_eq!(
        paged(PaginationKind::TopAndRowNumber, spec, &[1, 2, 3]),
        vec![1, 2]
    );
}

#[test]
fn top_smaller_than_offset_yields_nothing() {
    let spec = PaginationSpec::limit(5, 10).with_top(3);

    assert!(paged(PaginationKind::TopAndRowNumber, spec, &[1, 2, 3, 4, 5, 6, 7]).is_empty());
}

#[test]
fn skipping_is_lazy_until_first_advance() {
    let ((), events) = capture_events(|| {
        let merge = PaginationMerge::new(
            values(&[1, 2, 3]),
            PaginationKind::Limit,
            &PaginationSpec::limit(1, 1),
        );
        assert!(merge.value(1).is_err(), "no row before the first advance");
    });

    assert!(
        events.is_empty(),
        "nothing may be pulled before the first advance"
    );
}

#[test]
fn pagination_reports_skipped_rows() {
    let (rows, events) = capture_events(|| {
        paged(
            PaginationKind::RowNumber,
            PaginationSpec::limit(2, 5),
            &[1, 2, 3],
        )
    });

    assert_eq!(rows, vec![3]);
    assert_eq!(
        events,
        vec![MetricsEvent::PaginationApplied {
            kind: PaginationKind::RowNumber,
            skipped: 2,
        }]
    );
}

#[test]
fn exhausted_window_stays_exhausted() {
    let mut merge = PaginationMerge::new(
        Box::new(IteratorStreamMerge::new(vec![shard(
            &["v"],
            int_rows(&[&[1], &[2], &[3]]),
        )])),
        PaginationKind::Limit,
        &PaginationSpec::limit(0, 1),
    );

    assert!(merge.advance().expect("first advance should succeed"));
    assert!(!merge.advance().expect("window closes after one row"));
    assert!(!merge.advance().expect("closed window stays closed"));
    assert!(merge.value(1).is_err());
}

proptest! {
    #[test]
    fn limit_over_everything_is_identity(input in prop::collection::vec(any::<i64>(), 0..20)) {
        let total = u64::try_from(input.len()).unwrap_or(u64::MAX);

        prop_assert_eq!(
            paged(PaginationKind::Limit, PaginationSpec::limit(0, total), &input),
            input.clone()
        );
    }

    #[test]
    fn offset_past_the_end_is_empty(
        input in prop::collection::vec(any::<i64>(), 0..20),
        extra in 0u64..5,
    ) {
        let offset = u64::try_from(input.len()).unwrap_or(u64::MAX) + extra;

        prop_assert!(
            paged(PaginationKind::Limit, PaginationSpec::limit(offset, 3), &input).is_empty()
        );
    }

    #[test]
    fn row_number_matches_limit(
        input in prop::collection::vec(any::<i64>(), 0..20),
        offset in 0u64..25,
        row_count in 0u64..25,
    ) {
        let spec = PaginationSpec::limit(offset, row_count);

        prop_assert_eq!(
            paged(PaginationKind::RowNumber, spec, &input),
            paged(PaginationKind::Limit, spec, &input)
        );
    }
}
