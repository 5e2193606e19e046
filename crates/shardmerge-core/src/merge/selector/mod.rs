//! Module: merge::selector
//! Responsibility: choose and compose the merge for one SELECT.
//! Does not own: the merge algorithms themselves.
//! Boundary: the single entrypoint from statement metadata + shard cursors
//! to a `MergedResult`.


use crate::{
    error::InternalError,
    merge::{
        MergeStrategy, PaginationKind,
        columns::ColumnIndexMap,
        compare::{ComparatorContext, KeyExtractor, RowComparator},
        cursor::{MergedCursor, MergedResult},
        dialect::DialectKind,
        groupby::{AggregationUnit, GroupByMemoryMerge, GroupByStreamMerge, GroupPlan},
        iterator::IteratorStreamMerge,
        orderby::OrderByStreamMerge,
        pagination::PaginationMerge,
        shard::ShardCursor,
        statement::{GroupItem, OrderItem, SchemaCatalog, SelectContext, StatementContext},
    },
    obs::sink::{self, MergeSpan, MetricsEvent},
    value::TextMode,
};
use shardmerge_config::{DEFAULT_DATABASE, DEFAULT_MAX_MEMORY_GROUPS, MergeConfig};

///
/// MergeOptions
/// Engine-level knobs that do not vary per statement.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MergeOptions {
    pub max_memory_groups: u64,
    pub text_case_sensitive: bool,
    pub verify_shard_order: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            max_memory_groups: DEFAULT_MAX_MEMORY_GROUPS,
            text_case_sensitive: true,
            verify_shard_order: false,
        }
    }
}

///
/// DqlMerger
///
/// Merge engine for one session: the protocol dialect decides pagination,
/// the database name feeds default-schema resolution.
///

#[derive(Clone, Debug)]
pub struct DqlMerger {
    protocol: DialectKind,
    database: String,
    options: MergeOptions,
}

impl Default for DqlMerger {
    fn default() -> Self {
        Self::new(DialectKind::default(), DEFAULT_DATABASE)
    }
}

impl DqlMerger {
    #[must_use]
    pub fn new(protocol: DialectKind, database: impl Into<String>) -> Self {
        Self {
            protocol,
            database: database.into(),
            options: MergeOptions::default(),
        }
    }

    /// Build a merger from validated configuration.
    pub fn from_config(config: &MergeConfig) -> Result<Self, InternalError> {
        config.validate()?;
        let protocol = DialectKind::parse_config(&config.dialect.protocol)?;

        Ok(Self::new(protocol, config.dialect.database.clone()).with_options(MergeOptions {
            max_memory_groups: config.merge.max_memory_groups,
            text_case_sensitive: config.merge.text_case_sensitive,
            verify_shard_order: config.merge.verify_shard_order,
        }))
    }

    #[must_use]
    pub const fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn protocol(&self) -> DialectKind {
        self.protocol
    }

    #[must_use]
    pub const fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merge per-shard cursors into one logical cursor.
    ///
    /// Decision order: single shard without aggregate rewrite passes through;
    /// then GROUP BY / aggregation, DISTINCT, ORDER BY, and plain
    /// concatenation. Pagination wraps the base merge when more than one
    /// shard participates.
    ///
    /// A failure here is recorded as `MergeFailed` without a strategy; once
    /// a result is returned its span owns failure accounting.
    pub fn merge<S>(
        &self,
        shards: Vec<S>,
        statement: &StatementContext,
        catalog: Option<&dyn SchemaCatalog>,
    ) -> Result<MergedResult, InternalError>
    where
        S: ShardCursor + 'static,
    {
        self.build_result(shards, statement, catalog)
            .inspect_err(|err| {
                sink::record(MetricsEvent::MergeFailed {
                    strategy: None,
                    class: err.class,
                });
            })
    }

    fn build_result<S>(
        &self,
        shards: Vec<S>,
        statement: &StatementContext,
        catalog: Option<&dyn SchemaCatalog>,
    ) -> Result<MergedResult, InternalError>
    where
        S: ShardCursor + 'static,
    {
        let Some(first) = shards.first() else {
            return Err(InternalError::selector_contract(
                "merge requires at least one shard result",
            ));
        };
        let columns = ColumnIndexMap::from_shard(first)?;
        let shard_count = shards.len();

        if shard_count == 1 && !statement.needs_aggregate_rewrite() {
            let span = MergeSpan::new(MergeStrategy::Passthrough, shard_count);
            return Ok(MergedResult::new(
                Box::new(IteratorStreamMerge::new(shards)),
                columns,
                None,
                span,
            ));
        }

        let StatementContext::Select(select) = statement else {
            return Err(InternalError::selector_contract(
                "merge requires a SELECT statement context",
            ));
        };

        let schema = select
            .schema_name
            .clone()
            .unwrap_or_else(|| select.dialect.default_schema(&self.database));
        let ctx = ComparatorContext {
            columns: &columns,
            dialect: select.dialect,
            schema: &schema,
            catalog,
            default_text_mode: if self.options.text_case_sensitive {
                TextMode::Cs
            } else {
                TextMode::Ci
            },
        };

        let (base, strategy) = self.build_base(shards, select, &ctx)?;
        let span = MergeSpan::new(strategy, shard_count);
        let (cursor, pagination) = self.decorate(base, select, shard_count);

        Ok(MergedResult::new(cursor, columns, pagination, span))
    }

    fn build_base<S>(
        &self,
        shards: Vec<S>,
        select: &SelectContext,
        ctx: &ComparatorContext<'_>,
    ) -> Result<(Box<dyn MergedCursor>, MergeStrategy), InternalError>
    where
        S: ShardCursor + 'static,
    {
        if !select.group_by.is_empty() || !select.aggregations.is_empty() {
            return self.build_group_by(shards, select, &select.group_by, ctx);
        }

        if select.distinct {
            let items = distinct_group_items(select.projection_count, select.dialect);
            return self.build_group_by(shards, select, &items, ctx);
        }

        if !select.order_by.is_empty() {
            let comparator = RowComparator::build(&select.order_by, ctx)?;
            let merge =
                OrderByStreamMerge::new(shards, comparator, self.options.verify_shard_order);
            return Ok((Box::new(merge), MergeStrategy::OrderByStream));
        }

        Ok((
            Box::new(IteratorStreamMerge::new(shards)),
            MergeStrategy::Passthrough,
        ))
    }

    fn build_group_by<S>(
        &self,
        shards: Vec<S>,
        select: &SelectContext,
        group_items: &[GroupItem],
        ctx: &ComparatorContext<'_>,
    ) -> Result<(Box<dyn MergedCursor>, MergeStrategy), InternalError>
    where
        S: ShardCursor + 'static,
    {
        let group_comparator = RowComparator::build(group_items, ctx)?;
        let order_comparator = RowComparator::build(&select.order_by, ctx)?;
        let units = AggregationUnit::resolve_all(&select.aggregations, ctx.columns)?;

        // group keys must lead the order keys with the same column, direction
        // and text mode, or equal groups are not guaranteed to arrive adjacent
        let streamable = group_comparator.keys().len() <= order_comparator.keys().len()
            && group_comparator
                .keys()
                .iter()
                .zip(order_comparator.keys())
                .all(|(group, order)| {
                    group.index == order.index
                        && group.direction == order.direction
                        && group.text_mode == order.text_mode
                });

        let plan = GroupPlan::new(
            KeyExtractor::new(group_comparator),
            units,
            ctx.columns.column_count(),
        );

        if streamable {
            let inner =
                OrderByStreamMerge::new(shards, order_comparator, self.options.verify_shard_order);
            return Ok((
                Box::new(GroupByStreamMerge::new(inner, plan)),
                MergeStrategy::GroupByStream,
            ));
        }

        let order = (!select.order_by.is_empty()).then(|| KeyExtractor::new(order_comparator));
        let merge = GroupByMemoryMerge::new(shards, plan, order, self.options.max_memory_groups);

        Ok((Box::new(merge), MergeStrategy::GroupByMemory))
    }

    fn decorate(
        &self,
        base: Box<dyn MergedCursor>,
        select: &SelectContext,
        shard_count: usize,
    ) -> (Box<dyn MergedCursor>, Option<PaginationKind>) {
        if !select.pagination.has_pagination() || shard_count <= 1 {
            return (base, None);
        }

        match self.protocol.pagination_kind() {
            Some(kind) => (
                Box::new(PaginationMerge::new(base, kind, &select.pagination)),
                Some(kind),
            ),
            None => (base, None),
        }
    }
}

// DISTINCT groups on every projected column, ascending, dialect null default.
fn distinct_group_items(projection_count: usize, dialect: DialectKind) -> Vec<GroupItem> {
    (1..=projection_count)
        .map(|index| OrderItem::asc(index).with_nulls(dialect.default_nulls()))
        .collect()
}
