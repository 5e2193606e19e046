//! Module: merge::compare
//! Responsibility: multi-key row ordering (direction, null placement, text
//! collation) and lazy key-shape validation.
//! Does not own: per-cell comparison (see `value::compare_cells`).
//! Boundary: every sort key used by a merge is produced by `KeyExtractor`.

use crate::{
    error::InternalError,
    merge::{
        columns::ColumnIndexMap,
        dialect::DialectKind,
        statement::{Direction, NullsOrder, OrderItem, SchemaCatalog},
    },
    value::{
        Cell, CellFamily, StableHash, TextMode, cells_group_eq, compare_cells, stable_hash_cells,
    },
};
use std::{cmp::Ordering, sync::Arc};

///
/// ComparatorContext
/// Resolution inputs shared by every comparator built for one merge.
///

pub(crate) struct ComparatorContext<'a> {
    pub(crate) columns: &'a ColumnIndexMap,
    pub(crate) dialect: DialectKind,
    pub(crate) schema: &'a str,
    pub(crate) catalog: Option<&'a dyn SchemaCatalog>,
    pub(crate) default_text_mode: TextMode,
}

///
/// SortKeySpec
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct SortKeySpec {
    pub(crate) index: usize,
    pub(crate) direction: Direction,
    pub(crate) nulls: NullsOrder,
    pub(crate) text_mode: TextMode,
}

///
/// RowComparator
///
/// Lexicographic comparator over resolved sort keys. Keys handed to it must
/// already have passed `KeyExtractor` validation.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct RowComparator {
    keys: Vec<SortKeySpec>,
}

impl RowComparator {
    pub(crate) fn build(
        items: &[OrderItem],
        ctx: &ComparatorContext<'_>,
    ) -> Result<Self, InternalError> {
        let keys = items
            .iter()
            .map(|item| {
                Ok(SortKeySpec {
                    index: ctx.columns.resolve(&item.source)?,
                    direction: item.direction,
                    // explicit NULLS FIRST/LAST always beats the dialect default
                    nulls: item.nulls.unwrap_or_else(|| ctx.dialect.default_nulls()),
                    text_mode: resolve_text_mode(item, ctx),
                })
            })
            .collect::<Result<Vec<_>, InternalError>>()?;

        Ok(Self { keys })
    }

    pub(crate) fn keys(&self) -> &[SortKeySpec] {
        &self.keys
    }

    pub(crate) fn compare_keys(&self, left: &[Cell], right: &[Cell]) -> Ordering {
        self.keys
            .iter()
            .zip(left.iter().zip(right))
            .map(|(spec, (left, right))| compare_key_cell(spec, left, right))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

fn resolve_text_mode(item: &OrderItem, ctx: &ComparatorContext<'_>) -> TextMode {
    let case_sensitive = item
        .column
        .as_ref()
        .zip(ctx.catalog)
        .and_then(|(column, catalog)| {
            catalog.is_case_sensitive(ctx.schema, &column.table, &column.column)
        });

    match case_sensitive {
        Some(true) => TextMode::Cs,
        Some(false) => TextMode::Ci,
        None => ctx.default_text_mode,
    }
}

// Null placement is independent of direction; direction only flips non-null order.
fn compare_key_cell(spec: &SortKeySpec, left: &Cell, right: &Cell) -> Ordering {
    let nulls_first = matches!(spec.nulls, NullsOrder::First);
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => {
            if nulls_first {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (false, true) => {
            if nulls_first {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (false, false) => {
            // families were validated on extraction
            let ordering = compare_cells(left, right, spec.text_mode).unwrap_or(Ordering::Equal);
            match spec.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        }
    }
}

///
/// KeyExtractor
///
/// Reads sort keys out of rows and learns each key position's comparison
/// family from the first non-null value it sees. A later value from another
/// family is a schema mismatch.
///
/// Group equality and group hashing use each key's own text mode, so keys
/// the comparator ties are also one group.
///

#[derive(Clone, Debug)]
pub(crate) struct KeyExtractor {
    comparator: Arc<RowComparator>,
    text_modes: Vec<TextMode>,
    families: Vec<Option<CellFamily>>,
}

impl KeyExtractor {
    pub(crate) fn new(comparator: RowComparator) -> Self {
        let families = vec![None; comparator.keys.len()];
        let text_modes = comparator.keys.iter().map(|spec| spec.text_mode).collect();

        Self {
            comparator: Arc::new(comparator),
            text_modes,
            families,
        }
    }

    pub(crate) fn comparator(&self) -> &Arc<RowComparator> {
        &self.comparator
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.comparator.keys.is_empty()
    }

    pub(crate) fn extract(
        &mut self,
        read: impl Fn(usize) -> Result<Cell, InternalError>,
    ) -> Result<Vec<Cell>, InternalError> {
        let comparator = Arc::clone(&self.comparator);
        let mut key = Vec::with_capacity(comparator.keys.len());
        for (position, spec) in comparator.keys.iter().enumerate() {
            let cell = read(spec.index)?;
            self.check_family(position, spec.index, &cell)?;
            key.push(cell);
        }

        Ok(key)
    }

    pub(crate) fn same_group(&self, left: &[Cell], right: &[Cell]) -> bool {
        cells_group_eq(left, right, &self.text_modes)
    }

    pub(crate) fn group_hash(&self, key: &[Cell]) -> StableHash {
        stable_hash_cells(key, &self.text_modes)
    }

    /// Extract from an already materialized row (1-based column indexes).
    pub(crate) fn extract_from_row(&mut self, row: &[Cell]) -> Result<Vec<Cell>, InternalError> {
        self.extract(|column| {
            column
                .checked_sub(1)
                .and_then(|slot| row.get(slot))
                .cloned()
                .ok_or_else(|| {
                    InternalError::merge_invariant(format!(
                        "materialized row has no column {column}"
                    ))
                })
        })
    }

    fn check_family(
        &mut self,
        position: usize,
        column: usize,
        cell: &Cell,
    ) -> Result<(), InternalError> {
        let family = cell.family();
        if family == CellFamily::Null {
            return Ok(());
        }

        let Some(slot) = self.families.get_mut(position) else {
            return Err(InternalError::merge_invariant(
                "sort key position outside the comparator",
            ));
        };
        match slot {
            Some(known) if *known != family => Err(InternalError::comparator_schema_mismatch(
                format!(
                    "sort key column {column} mixes {} and {} values",
                    known.label(),
                    family.label()
                ),
            )),
            Some(_) => Ok(()),
            None => {
                *slot = Some(family);
                Ok(())
            }
        }
    }
}

///
/// TESTS
///
