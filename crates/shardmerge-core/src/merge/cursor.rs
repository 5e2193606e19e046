//! Module: merge::cursor
//! Responsibility: the merged cursor contract and the result wrapper handed
//! to callers.
//! Does not own: any merge strategy; those implement `MergedCursor`.
//! Boundary: callers only ever see `MergedResult`.

use crate::{
    error::InternalError,
    merge::{MergeStrategy, PaginationKind, columns::ColumnIndexMap},
    obs::sink::MergeSpan,
    value::Cell,
};

///
/// MergedCursor
///
/// Forward-only merged cursor. `value` reads the current row and is only
/// valid after `advance` returned `true`.
///

pub trait MergedCursor {
    fn advance(&mut self) -> Result<bool, InternalError>;

    fn value(&self, column: usize) -> Result<Cell, InternalError>;
}

impl<T> MergedCursor for Box<T>
where
    T: MergedCursor + ?Sized,
{
    fn advance(&mut self) -> Result<bool, InternalError> {
        self.as_mut().advance()
    }

    fn value(&self, column: usize) -> Result<Cell, InternalError> {
        self.as_ref().value(column)
    }
}

///
/// CursorState
/// Position of a merged cursor; `Failed` latches after the first error.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum CursorState {
    #[default]
    Unstarted,
    HasRow,
    Exhausted,
    Failed,
}

impl CursorState {
    pub(crate) fn require_row(self) -> Result<(), InternalError> {
        match self {
            Self::HasRow => Ok(()),
            Self::Unstarted => Err(InternalError::cursor_contract(
                "value read before the first advance",
            )),
            Self::Exhausted => Err(InternalError::cursor_contract(
                "value read after the cursor was exhausted",
            )),
            Self::Failed => Err(InternalError::cursor_contract(
                "value read after the merge failed",
            )),
        }
    }

    /// Translate an advance result into the next position.
    pub(crate) const fn after_advance(has_row: bool) -> Self {
        if has_row { Self::HasRow } else { Self::Exhausted }
    }
}

/// Read every column of the cursor's current row into an owned vector.
pub(crate) fn read_row(
    column_count: usize,
    read: impl Fn(usize) -> Result<Cell, InternalError>,
) -> Result<Vec<Cell>, InternalError> {
    (1..=column_count).map(read).collect()
}

///
/// MergedResult
///
/// The single cursor returned by `DqlMerger::merge`. Owns the merge tree,
/// the column label map and the metrics span for the merge.
///

pub struct MergedResult {
    inner: Box<dyn MergedCursor>,
    columns: ColumnIndexMap,
    pagination: Option<PaginationKind>,
    span: MergeSpan,
    state: CursorState,
}

impl MergedResult {
    pub(crate) fn new(
        inner: Box<dyn MergedCursor>,
        columns: ColumnIndexMap,
        pagination: Option<PaginationKind>,
        span: MergeSpan,
    ) -> Self {
        Self {
            inner,
            columns,
            pagination,
            span,
            state: CursorState::Unstarted,
        }
    }

    /// Strategy chosen for the base merge.
    #[must_use]
    pub const fn strategy(&self) -> MergeStrategy {
        self.span.strategy()
    }

    /// Pagination decorator wrapped around the base merge, if any.
    #[must_use]
    pub const fn pagination(&self) -> Option<PaginationKind> {
        self.pagination
    }

    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.columns.column_count()
    }

    #[must_use]
    pub const fn columns(&self) -> &ColumnIndexMap {
        &self.columns
    }

    /// Read a column of the current row by its (case-insensitive) label.
    pub fn value_by_label(&self, label: &str) -> Result<Cell, InternalError> {
        let index = self.columns.index_of(label).ok_or_else(|| {
            InternalError::cursor_contract(format!("unknown column label '{label}'"))
        })?;

        self.value(index)
    }

    /// Drain the remaining rows into owned vectors.
    pub fn collect_rows(&mut self) -> Result<Vec<Vec<Cell>>, InternalError> {
        let column_count = self.column_count();
        let mut rows = Vec::new();
        while self.advance()? {
            rows.push(read_row(column_count, |column| self.value(column))?);
        }

        Ok(rows)
    }
}

impl MergedCursor for MergedResult {
    fn advance(&mut self) -> Result<bool, InternalError> {
        match self.state {
            CursorState::Exhausted => return Ok(false),
            CursorState::Failed => {
                return Err(InternalError::cursor_contract(
                    "advance called after the merge failed",
                ));
            }
            CursorState::Unstarted | CursorState::HasRow => {}
        }

        match self.inner.advance() {
            Ok(has_row) => {
                if has_row {
                    self.span.add_row();
                }
                self.state = CursorState::after_advance(has_row);

                Ok(has_row)
            }
            Err(err) => {
                self.span.fail(err.class);
                self.state = CursorState::Failed;

                Err(err)
            }
        }
    }

    fn value(&self, column: usize) -> Result<Cell, InternalError> {
        self.state.require_row()?;
        if !(1..=self.columns.column_count()).contains(&column) {
            return Err(InternalError::cursor_contract(format!(
                "column index {column} out of range 1..={}",
                self.columns.column_count()
            )));
        }

        self.inner.value(column)
    }
}

impl std::fmt::Debug for MergedResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergedResult")
            .field("strategy", &self.strategy())
            .field("pagination", &self.pagination)
            .field("columns", &self.columns.column_count())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
