//! Module: merge::groupby::aggregate
//! Responsibility: per-group aggregation accumulators and their finalization.
//! Does not own: group boundary detection or row materialization.
//! Boundary: consumes partial per-shard aggregates, writes combined values
//! back into the group's output row.

use crate::{
    error::InternalError,
    merge::{
        columns::ColumnIndexMap,
        statement::{AggregateKind, AggregationProjection},
    },
    value::{Cell, TextMode, compare_cells},
};
use std::cmp::Ordering;

///
/// AggregationUnit
/// One aggregation projection with its columns resolved to indexes.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct AggregationUnit {
    kind: AggregateKind,
    column: usize,
    avg_columns: Option<(usize, usize)>,
}

impl AggregationUnit {
    pub(crate) fn resolve_all(
        projections: &[AggregationProjection],
        columns: &ColumnIndexMap,
    ) -> Result<Vec<Self>, InternalError> {
        projections
            .iter()
            .map(|projection| Self::resolve(projection, columns))
            .collect()
    }

    fn resolve(
        projection: &AggregationProjection,
        columns: &ColumnIndexMap,
    ) -> Result<Self, InternalError> {
        let column = columns.resolve(&projection.source)?;
        let avg_columns = match (projection.kind, projection.derived.as_ref()) {
            (AggregateKind::Avg, Some(derived)) => Some((
                columns.resolve(&derived.count)?,
                columns.resolve(&derived.sum)?,
            )),
            (AggregateKind::Avg, None) => {
                return Err(InternalError::selector_contract(format!(
                    "AVG on column {column} has no derived COUNT/SUM columns"
                )));
            }
            _ => None,
        };

        Ok(Self {
            kind: projection.kind,
            column,
            avg_columns,
        })
    }
}

///
/// SumAccumulator
/// Exact integer sum until a float partial arrives, then float.
///

#[derive(Clone, Copy, Debug, PartialEq)]
enum SumAccumulator {
    Int(i128),
    Float(f64),
}

impl SumAccumulator {
    fn add(
        current: Option<Self>,
        cell: &Cell,
        column: usize,
    ) -> Result<Option<Self>, InternalError> {
        let addend = match cell {
            Cell::Null => return Ok(current),
            Cell::Int(value) => Self::Int(i128::from(*value)),
            Cell::Uint(value) => Self::Int(i128::from(*value)),
            Cell::Float(value) => Self::Float(*value),
            other => return Err(non_numeric(column, other)),
        };

        let combined = match (current, addend) {
            (None, addend) => addend,
            (Some(Self::Int(a)), Self::Int(b)) => Self::Int(a.saturating_add(b)),
            (Some(current), addend) => Self::Float(current.as_f64() + addend.as_f64()),
        };

        Ok(Some(combined))
    }

    #[allow(clippy::cast_precision_loss)]
    const fn as_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }

    fn into_cell(self) -> Cell {
        match self {
            Self::Int(value) => i64::try_from(value)
                .map(Cell::Int)
                .or_else(|_| u64::try_from(value).map(Cell::Uint))
                .unwrap_or_else(|_| Cell::Float(self.as_f64())),
            Self::Float(value) => Cell::Float(value),
        }
    }
}

///
/// AggregateState
///

#[derive(Clone, Debug, PartialEq)]
enum AggregateState {
    Count(i128),
    Sum(Option<SumAccumulator>),
    Avg {
        count: i128,
        sum: Option<SumAccumulator>,
    },
    Min(Option<Cell>),
    Max(Option<Cell>),
}

impl AggregateState {
    const fn new(kind: AggregateKind) -> Self {
        match kind {
            AggregateKind::Count => Self::Count(0),
            AggregateKind::Sum => Self::Sum(None),
            AggregateKind::Avg => Self::Avg { count: 0, sum: None },
            AggregateKind::Min => Self::Min(None),
            AggregateKind::Max => Self::Max(None),
        }
    }
}

///
/// GroupAggregates
///
/// Accumulators for every aggregation projection of one group.
///

#[derive(Clone, Debug)]
pub(crate) struct GroupAggregates {
    states: Vec<(AggregationUnit, AggregateState)>,
}

impl GroupAggregates {
    pub(crate) fn new(units: &[AggregationUnit]) -> Self {
        Self {
            states: units
                .iter()
                .map(|unit| (*unit, AggregateState::new(unit.kind)))
                .collect(),
        }
    }

    /// Fold one shard row's partial aggregates into the group.
    pub(crate) fn accumulate(
        &mut self,
        read: impl Fn(usize) -> Result<Cell, InternalError>,
    ) -> Result<(), InternalError> {
        for (unit, state) in &mut self.states {
            match state {
                AggregateState::Count(total) => {
                    *total = total.saturating_add(read_count(&read(unit.column)?, unit.column)?);
                }
                AggregateState::Sum(sum) => {
                    *sum = SumAccumulator::add(*sum, &read(unit.column)?, unit.column)?;
                }
                AggregateState::Avg { count, sum } => {
                    let (count_column, sum_column) = unit.avg_columns.ok_or_else(|| {
                        InternalError::merge_invariant("AVG unit lost its derived columns")
                    })?;
                    *count = count.saturating_add(read_count(&read(count_column)?, count_column)?);
                    *sum = SumAccumulator::add(*sum, &read(sum_column)?, sum_column)?;
                }
                AggregateState::Min(best) => {
                    fold_extreme(best, read(unit.column)?, unit.column, Ordering::Less)?;
                }
                AggregateState::Max(best) => {
                    fold_extreme(best, read(unit.column)?, unit.column, Ordering::Greater)?;
                }
            }
        }

        Ok(())
    }

    /// Overwrite the aggregate columns of `row` with the combined values.
    pub(crate) fn finalize_into(self, row: &mut [Cell]) -> Result<(), InternalError> {
        for (unit, state) in self.states {
            match state {
                AggregateState::Count(total) => {
                    write_cell(row, unit.column, count_cell(total))?;
                }
                AggregateState::Sum(sum) => {
                    let total = sum.map_or(Cell::Null, SumAccumulator::into_cell);
                    write_cell(row, unit.column, total)?;
                }
                AggregateState::Avg { count, sum } => {
                    let (count_column, sum_column) = unit.avg_columns.ok_or_else(|| {
                        InternalError::merge_invariant("AVG unit lost its derived columns")
                    })?;
                    write_cell(row, unit.column, average_cell(count, sum))?;
                    write_cell(row, count_column, count_cell(count))?;
                    write_cell(
                        row,
                        sum_column,
                        sum.map_or(Cell::Null, SumAccumulator::into_cell),
                    )?;
                }
                AggregateState::Min(best) | AggregateState::Max(best) => {
                    write_cell(row, unit.column, best.unwrap_or(Cell::Null))?;
                }
            }
        }

        Ok(())
    }
}

fn read_count(cell: &Cell, column: usize) -> Result<i128, InternalError> {
    match cell {
        Cell::Null => Ok(0),
        Cell::Int(value) => Ok(i128::from(*value)),
        Cell::Uint(value) => Ok(i128::from(*value)),
        other => Err(InternalError::aggregate_schema_mismatch(format!(
            "COUNT column {column} holds a {} value",
            other.family().label()
        ))),
    }
}

fn fold_extreme(
    best: &mut Option<Cell>,
    candidate: Cell,
    column: usize,
    wanted: Ordering,
) -> Result<(), InternalError> {
    if candidate.is_null() {
        return Ok(());
    }

    let replace = match best.as_ref() {
        None => true,
        Some(current) => {
            compare_cells(&candidate, current, TextMode::Cs).ok_or_else(|| {
                InternalError::aggregate_schema_mismatch(format!(
                    "column {column} mixes {} and {} values",
                    current.family().label(),
                    candidate.family().label()
                ))
            })? == wanted
        }
    };
    if replace {
        *best = Some(candidate);
    }

    Ok(())
}

fn count_cell(total: i128) -> Cell {
    i64::try_from(total).map_or(Cell::Int(i64::MAX), Cell::Int)
}

fn average_cell(count: i128, sum: Option<SumAccumulator>) -> Cell {
    match sum {
        Some(sum) if count != 0 => {
            #[allow(clippy::cast_precision_loss)]
            let count = count as f64;
            Cell::Float(sum.as_f64() / count)
        }
        _ => Cell::Null,
    }
}

fn write_cell(row: &mut [Cell], column: usize, cell: Cell) -> Result<(), InternalError> {
    let slot = column
        .checked_sub(1)
        .and_then(|slot| row.get_mut(slot))
        .ok_or_else(|| {
            InternalError::merge_invariant(format!("aggregate column {column} outside the row"))
        })?;
    *slot = cell;

    Ok(())
}

fn non_numeric(column: usize, cell: &Cell) -> InternalError {
    InternalError::aggregate_schema_mismatch(format!(
        "SUM column {column} holds a {} value",
        cell.family().label()
    ))
}
