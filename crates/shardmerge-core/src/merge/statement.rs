//! Module: merge::statement
//! Responsibility: statement metadata the merge selector consumes.
//! Does not own: SQL parsing or rewriting; callers build these values.
//! Boundary: read-only inputs to `DqlMerger::merge`.

use crate::merge::dialect::DialectKind;

///
/// ColumnSource
/// Column reference by 1-based index or by projection label.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ColumnSource {
    Index(usize),
    Label(String),
}

impl From<usize> for ColumnSource {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for ColumnSource {
    fn from(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

impl From<String> for ColumnSource {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}

///
/// Direction
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

///
/// NullsOrder
/// Where nulls sort relative to non-null values, independent of direction.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NullsOrder {
    First,
    Last,
}

///
/// TableColumn
/// Physical table/column behind an order or group item, used for catalog
/// collation lookups.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableColumn {
    pub table: String,
    pub column: String,
}

///
/// OrderItem
///
/// One ORDER BY (or GROUP BY) key. `nulls` is the explicit NULLS FIRST/LAST
/// clause; when absent the statement dialect supplies the default.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderItem {
    pub source: ColumnSource,
    pub direction: Direction,
    pub nulls: Option<NullsOrder>,
    pub column: Option<TableColumn>,
}

/// GROUP BY keys share the ORDER BY item shape.
pub type GroupItem = OrderItem;

impl OrderItem {
    #[must_use]
    pub fn new(source: impl Into<ColumnSource>, direction: Direction) -> Self {
        Self {
            source: source.into(),
            direction,
            nulls: None,
            column: None,
        }
    }

    #[must_use]
    pub fn asc(source: impl Into<ColumnSource>) -> Self {
        Self::new(source, Direction::Asc)
    }

    #[must_use]
    pub fn desc(source: impl Into<ColumnSource>) -> Self {
        Self::new(source, Direction::Desc)
    }

    #[must_use]
    pub const fn with_nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = Some(nulls);
        self
    }

    #[must_use]
    pub fn with_column(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.column = Some(TableColumn {
            table: table.into(),
            column: column.into(),
        });
        self
    }
}

///
/// AggregateKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregateKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

///
/// AvgDerivedColumns
/// Hidden COUNT and SUM projections the rewriter added for one AVG.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AvgDerivedColumns {
    pub count: ColumnSource,
    pub sum: ColumnSource,
}

///
/// AggregationProjection
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AggregationProjection {
    pub kind: AggregateKind,
    pub source: ColumnSource,
    pub derived: Option<AvgDerivedColumns>,
}

impl AggregationProjection {
    #[must_use]
    pub fn new(kind: AggregateKind, source: impl Into<ColumnSource>) -> Self {
        Self {
            kind,
            source: source.into(),
            derived: None,
        }
    }

    #[must_use]
    pub fn count(source: impl Into<ColumnSource>) -> Self {
        Self::new(AggregateKind::Count, source)
    }

    #[must_use]
    pub fn sum(source: impl Into<ColumnSource>) -> Self {
        Self::new(AggregateKind::Sum, source)
    }

    #[must_use]
    pub fn min(source: impl Into<ColumnSource>) -> Self {
        Self::new(AggregateKind::Min, source)
    }

    #[must_use]
    pub fn max(source: impl Into<ColumnSource>) -> Self {
        Self::new(AggregateKind::Max, source)
    }

    /// AVG over `source`, recombined from the derived per-shard COUNT and SUM.
    #[must_use]
    pub fn avg(
        source: impl Into<ColumnSource>,
        count: impl Into<ColumnSource>,
        sum: impl Into<ColumnSource>,
    ) -> Self {
        Self {
            kind: AggregateKind::Avg,
            source: source.into(),
            derived: Some(AvgDerivedColumns {
                count: count.into(),
                sum: sum.into(),
            }),
        }
    }
}

///
/// PaginationSpec
///
/// Logical OFFSET / row count / TOP bounds of the statement.
/// `offset_applied_per_shard` is set when the rewriter already pushed the
/// offset down so every shard skipped it itself.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PaginationSpec {
    pub offset: u64,
    pub row_count: Option<u64>,
    pub top: Option<u64>,
    pub offset_applied_per_shard: bool,
}

impl PaginationSpec {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            offset: 0,
            row_count: None,
            top: None,
            offset_applied_per_shard: false,
        }
    }

    #[must_use]
    pub const fn limit(offset: u64, row_count: u64) -> Self {
        Self {
            offset,
            row_count: Some(row_count),
            top: None,
            offset_applied_per_shard: false,
        }
    }

    #[must_use]
    pub const fn offset_only(offset: u64) -> Self {
        Self {
            offset,
            row_count: None,
            top: None,
            offset_applied_per_shard: false,
        }
    }

    #[must_use]
    pub const fn with_top(mut self, top: u64) -> Self {
        self.top = Some(top);
        self
    }

    #[must_use]
    pub const fn applied_per_shard(mut self) -> Self {
        self.offset_applied_per_shard = true;
        self
    }

    #[must_use]
    pub const fn has_pagination(&self) -> bool {
        self.offset > 0 || self.row_count.is_some() || self.top.is_some()
    }

    /// Rows the merge itself must skip.
    #[must_use]
    pub const fn effective_offset(&self) -> u64 {
        if self.offset_applied_per_shard {
            0
        } else {
            self.offset
        }
    }
}

///
/// SelectContext
///
/// Everything the selector needs to know about one SELECT.
///

#[derive(Clone, Debug, Default)]
pub struct SelectContext {
    pub order_by: Vec<OrderItem>,
    pub group_by: Vec<GroupItem>,
    pub aggregations: Vec<AggregationProjection>,
    pub distinct: bool,
    pub projection_count: usize,
    pub pagination: PaginationSpec,
    pub needs_aggregate_rewrite: bool,
    pub dialect: DialectKind,
    pub schema_name: Option<String>,
}

impl SelectContext {
    #[must_use]
    pub fn new(dialect: DialectKind, projection_count: usize) -> Self {
        Self {
            dialect,
            projection_count,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn order_by(mut self, items: impl IntoIterator<Item = OrderItem>) -> Self {
        self.order_by = items.into_iter().collect();
        self
    }

    #[must_use]
    pub fn group_by(mut self, items: impl IntoIterator<Item = GroupItem>) -> Self {
        self.group_by = items.into_iter().collect();
        self
    }

    /// Attach aggregations. Whether a single shard still needs the merge
    /// path is decided separately by `aggregate_rewrite`.
    #[must_use]
    pub fn aggregations(mut self, items: impl IntoIterator<Item = AggregationProjection>) -> Self {
        self.aggregations = items.into_iter().collect();
        self
    }

    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    #[must_use]
    pub const fn paginate(mut self, pagination: PaginationSpec) -> Self {
        self.pagination = pagination;
        self
    }

    #[must_use]
    pub const fn aggregate_rewrite(mut self, needed: bool) -> Self {
        self.needs_aggregate_rewrite = needed;
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }
}

///
/// StatementKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    Ddl,
    Dal,
}

///
/// StatementContext
///

#[derive(Clone, Debug)]
pub enum StatementContext {
    Select(SelectContext),
    Other(StatementKind),
}

impl StatementContext {
    /// Whether the rewriter changed projections for aggregation.
    #[must_use]
    pub const fn needs_aggregate_rewrite(&self) -> bool {
        match self {
            Self::Select(select) => select.needs_aggregate_rewrite,
            Self::Other(_) => false,
        }
    }
}

impl From<SelectContext> for StatementContext {
    fn from(select: SelectContext) -> Self {
        Self::Select(select)
    }
}

///
/// SchemaCatalog
///
/// Collation lookup for text columns. `None` means unknown; the merge then
/// falls back to its configured default.
///

pub trait SchemaCatalog {
    fn is_case_sensitive(&self, schema: &str, table: &str, column: &str) -> Option<bool>;
}
