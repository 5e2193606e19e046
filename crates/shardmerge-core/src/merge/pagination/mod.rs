//! Module: merge::pagination
//! Responsibility: OFFSET / row-count / TOP windows over a merged cursor.
//! Does not own: choosing the decorator (protocol dialect, see `selector`).
//! Boundary: skips lazily on the first `advance`, then stops at the bound.

#[cfg(test)]
mod tests;

use crate::{
    error::InternalError,
    merge::{
        PaginationKind,
        cursor::{CursorState, MergedCursor},
        statement::PaginationSpec,
    },
    obs::sink::{self, MetricsEvent},
    value::Cell,
};

///
/// PageWindow
///
/// Rows are exposed while `offset < row_number <= end`, where `row_number`
/// counts rows pulled from the inner cursor starting at 1.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct PageWindow {
    offset: u64,
    end: Option<u64>,
}

impl PageWindow {
    pub(crate) const fn for_kind(kind: PaginationKind, spec: &PaginationSpec) -> Self {
        let offset = spec.effective_offset();
        let row_count = match kind {
            PaginationKind::Limit | PaginationKind::RowNumber => spec.row_count,
            PaginationKind::TopAndRowNumber => top_row_count(spec),
        };
        let end = match row_count {
            Some(count) => Some(offset.saturating_add(count)),
            None => None,
        };

        Self { offset, end }
    }

    const fn admits(&self, row_number: u64) -> bool {
        match self.end {
            Some(end) => row_number < end,
            None => true,
        }
    }
}

// TOP bounds the row number itself, so only `top - offset` rows remain visible.
const fn top_row_count(spec: &PaginationSpec) -> Option<u64> {
    match (spec.row_count, spec.top) {
        (Some(count), Some(top)) => {
            let remaining = top.saturating_sub(spec.offset);
            Some(if count < remaining { count } else { remaining })
        }
        (None, Some(top)) => Some(top.saturating_sub(spec.offset)),
        (count, None) => count,
    }
}

///
/// PaginationMerge
///
/// Decorates a merged cursor with a page window. Nothing is pulled from the
/// inner cursor until the first `advance`.
///

pub(crate) struct PaginationMerge {
    inner: Box<dyn MergedCursor>,
    kind: PaginationKind,
    window: PageWindow,
    row_number: u64,
    state: CursorState,
}

impl PaginationMerge {
    pub(crate) fn new(
        inner: Box<dyn MergedCursor>,
        kind: PaginationKind,
        spec: &PaginationSpec,
    ) -> Self {
        Self {
            inner,
            kind,
            window: PageWindow::for_kind(kind, spec),
            row_number: 0,
            state: CursorState::Unstarted,
        }
    }

    // Returns false when the inner cursor ran out inside the offset.
    fn skip_offset(&mut self) -> Result<bool, InternalError> {
        let mut has_row = true;
        while self.row_number < self.window.offset {
            if !self.inner.advance()? {
                has_row = false;
                break;
            }
            self.row_number += 1;
        }

        sink::record(MetricsEvent::PaginationApplied {
            kind: self.kind,
            skipped: self.row_number,
        });

        Ok(has_row)
    }

    fn close(&mut self) -> bool {
        self.state = CursorState::Exhausted;

        false
    }
}

impl MergedCursor for PaginationMerge {
    fn advance(&mut self) -> Result<bool, InternalError> {
        match self.state {
            CursorState::Exhausted => return Ok(false),
            CursorState::Unstarted => {
                if !self.skip_offset()? {
                    return Ok(self.close());
                }
            }
            CursorState::HasRow | CursorState::Failed => {}
        }

        if !self.window.admits(self.row_number) || !self.inner.advance()? {
            return Ok(self.close());
        }
        self.row_number += 1;
        self.state = CursorState::HasRow;

        Ok(true)
    }

    fn value(&self, column: usize) -> Result<Cell, InternalError> {
        self.state.require_row()?;

        self.inner.value(column)
    }
}
