//! Module: value::hash
//! Responsibility: stable hash derivation for group keys.
//! Does not own: group key equality (see `cells_group_eq`).
//! Boundary: hashes must agree with `cells_group_eq` for every key pair it
//! reports equal, under the same per-position text modes.

use crate::value::{Cell, TextMode, compare::I128_FLOAT_BOUND};
use xxhash_rust::xxh3::Xxh3;

///
/// StableHash
///
/// Fixed-width hash identifier used to bucket group keys.
///

pub(crate) type StableHash = u64;

const HASH_VERSION: u8 = 1;

// Tags are stable; the numeric family shares one tag so Int/Uint/Float
// values that compare equal also hash equal.
const TAG_NULL: u8 = 0x00;
const TAG_BOOL: u8 = 0x01;
const TAG_INTEGRAL: u8 = 0x02;
const TAG_FLOAT: u8 = 0x03;
const TAG_TEXT: u8 = 0x04;
const TAG_BLOB: u8 = 0x05;
const TAG_DATE: u8 = 0x06;
const TAG_TIMESTAMP: u8 = 0x07;

/// Hash one ordered group key. Text at a case-insensitive position hashes
/// its lowercase fold.
#[must_use]
pub(crate) fn stable_hash_cells(cells: &[Cell], text_modes: &[TextMode]) -> StableHash {
    let mut h = Xxh3::with_seed(0);
    h.update(&[HASH_VERSION]);
    for (position, cell) in cells.iter().enumerate() {
        let text_mode = text_modes.get(position).copied().unwrap_or_default();
        write_cell(&mut h, cell, text_mode);
    }

    h.digest()
}

#[allow(clippy::cast_possible_truncation)]
fn write_cell(h: &mut Xxh3, cell: &Cell, text_mode: TextMode) {
    match cell {
        Cell::Null => h.update(&[TAG_NULL]),
        Cell::Bool(value) => h.update(&[TAG_BOOL, u8::from(*value)]),
        Cell::Int(value) => write_integral(h, i128::from(*value)),
        Cell::Uint(value) => write_integral(h, i128::from(*value)),
        Cell::Float(value) => {
            if value.fract() == 0.0 && value.abs() < I128_FLOAT_BOUND {
                // integral floats hash like the integer they equal
                write_integral(h, *value as i128);
            } else {
                let normalized = if value.is_nan() { f64::NAN } else { *value };
                h.update(&[TAG_FLOAT]);
                h.update(&normalized.to_bits().to_be_bytes());
            }
        }
        Cell::Text(text) => match text_mode {
            TextMode::Cs => write_text(h, text),
            TextMode::Ci => {
                let folded: String = text.chars().flat_map(char::to_lowercase).collect();
                write_text(h, &folded);
            }
        },
        Cell::Blob(bytes) => {
            h.update(&[TAG_BLOB]);
            h.update(&(bytes.len() as u64).to_be_bytes());
            h.update(bytes);
        }
        Cell::Date(days) => {
            h.update(&[TAG_DATE]);
            h.update(&days.to_be_bytes());
        }
        Cell::Timestamp(micros) => {
            h.update(&[TAG_TIMESTAMP]);
            h.update(&micros.to_be_bytes());
        }
    }
}

fn write_integral(h: &mut Xxh3, value: i128) {
    h.update(&[TAG_INTEGRAL]);
    h.update(&value.to_be_bytes());
}

#[allow(clippy::cast_possible_truncation)]
fn write_text(h: &mut Xxh3, text: &str) {
    h.update(&[TAG_TEXT]);
    h.update(&(text.len() as u64).to_be_bytes());
    h.update(text.as_bytes());
}
