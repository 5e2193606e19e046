use crate::{
    Error,
    core::{
        merge::{MergeStrategy, MergedCursor, MergedResult, PaginationKind},
        value::Cell,
    },
};

///
/// MergedRows
/// One logical cursor over every shard's rows, reporting the public `Error`.
///

#[derive(Debug)]
pub struct MergedRows(MergedResult);

impl MergedRows {
    /// helper
    pub(crate) const fn from_inner(inner: MergedResult) -> Self {
        Self(inner)
    }

    // ======================================================================
    // Introspection
    // ======================================================================

    #[must_use]
    pub const fn strategy(&self) -> MergeStrategy {
        self.0.strategy()
    }

    #[must_use]
    pub const fn pagination(&self) -> Option<PaginationKind> {
        self.0.pagination()
    }

    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.0.column_count()
    }

    // ======================================================================
    // Cursor
    // ======================================================================

    /// Move to the next merged row; `false` once every shard is drained.
    pub fn advance(&mut self) -> Result<bool, Error> {
        self.0.advance().map_err(Error::from)
    }

    /// Read a column (1-based) of the current row.
    pub fn value(&self, column: usize) -> Result<Cell, Error> {
        self.0.value(column).map_err(Error::from)
    }

    pub fn value_by_label(&self, label: &str) -> Result<Cell, Error> {
        self.0.value_by_label(label).map_err(Error::from)
    }

    /// Drain the remaining rows into owned vectors.
    pub fn collect_rows(&mut self) -> Result<Vec<Vec<Cell>>, Error> {
        self.0.collect_rows().map_err(Error::from)
    }

    /// Hand back the core cursor, e.g. to feed another core merge stage.
    #[must_use]
    pub fn into_inner(self) -> MergedResult {
        self.0
    }
}
