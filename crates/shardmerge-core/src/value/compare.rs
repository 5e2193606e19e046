use crate::value::Cell;
use std::cmp::Ordering;

///
/// TextMode
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TextMode {
    #[default]
    Cs, // case-sensitive
    Ci, // case-insensitive
}

/// Compare two non-null cells of the same comparison family.
///
/// Returns `None` when either side is null or the families differ; callers
/// decide null placement and how to report a family mismatch.
#[must_use]
pub fn compare_cells(left: &Cell, right: &Cell, text_mode: TextMode) -> Option<Ordering> {
    match (left, right) {
        (Cell::Bool(a), Cell::Bool(b)) => Some(a.cmp(b)),
        (Cell::Text(a), Cell::Text(b)) => Some(compare_text(a, b, text_mode)),
        (Cell::Blob(a), Cell::Blob(b)) => Some(a.cmp(b)),
        (Cell::Date(a), Cell::Date(b)) => Some(a.cmp(b)),
        (Cell::Timestamp(a), Cell::Timestamp(b)) => Some(a.cmp(b)),
        _ => compare_numeric(left, right),
    }
}

/// Equality used for group keys: nulls group together, everything else
/// compares within one family using the key position's text mode. Positions
/// without a mode compare case-sensitively.
#[must_use]
pub(crate) fn cells_group_eq(left: &[Cell], right: &[Cell], text_modes: &[TextMode]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .enumerate()
            .all(|(position, (left, right))| match (left, right) {
                (Cell::Null, Cell::Null) => true,
                (Cell::Null, _) | (_, Cell::Null) => false,
                _ => {
                    let text_mode = text_modes.get(position).copied().unwrap_or_default();
                    compare_cells(left, right, text_mode) == Some(Ordering::Equal)
                }
            })
}

fn compare_text(left: &str, right: &str, text_mode: TextMode) -> Ordering {
    match text_mode {
        TextMode::Cs => left.cmp(right),
        TextMode::Ci => left
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(right.chars().flat_map(char::to_lowercase)),
    }
}

// Every numeric pair compares exactly; integers never widen to f64.
fn compare_numeric(left: &Cell, right: &Cell) -> Option<Ordering> {
    match (left, right) {
        (Cell::Float(left), Cell::Float(right)) => Some(
            left.partial_cmp(right)
                .unwrap_or_else(|| left.total_cmp(right)),
        ),
        (Cell::Float(left), _) => Some(compare_integer_float(integer_of(right)?, *left).reverse()),
        (_, Cell::Float(right)) => Some(compare_integer_float(integer_of(left)?, *right)),
        _ => Some(integer_of(left)?.cmp(&integer_of(right)?)),
    }
}

// 2^127 as f64; integral floats strictly inside (-2^127, 2^127) convert to i128 exactly.
pub(super) const I128_FLOAT_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

#[allow(clippy::cast_possible_truncation)]
fn compare_integer_float(integer: i128, float: f64) -> Ordering {
    if float.is_nan() {
        // matches f64::total_cmp placement of NaN
        return if float.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if float >= I128_FLOAT_BOUND {
        return Ordering::Less;
    }
    if float < -I128_FLOAT_BOUND {
        return Ordering::Greater;
    }

    let whole = float.trunc();
    integer
        .cmp(&(whole as i128))
        .then_with(|| 0.0_f64.partial_cmp(&(float - whole)).unwrap_or(Ordering::Equal))
}

const fn integer_of(cell: &Cell) -> Option<i128> {
    match cell {
        Cell::Int(value) => Some(*value as i128),
        Cell::Uint(value) => Some(*value as i128),
        _ => None,
    }
}
