use crate::{
    error::InternalError,
    merge::{shard::ShardCursor, statement::ColumnSource},
};
use std::collections::HashMap;

///
/// ColumnIndexMap
///
/// Case-insensitive column label → 1-based index map, built once from the
/// first shard's metadata and passed by value to every merge builder.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ColumnIndexMap {
    labels: HashMap<String, usize>,
    column_count: usize,
}

impl ColumnIndexMap {
    /// Build the map from one shard's column metadata.
    ///
    /// Columns are visited last to first and later inserts overwrite, so a
    /// duplicated label resolves to its lowest index.
    pub fn from_shard<S>(shard: &S) -> Result<Self, InternalError>
    where
        S: ShardCursor + ?Sized,
    {
        let column_count = shard.column_count();
        let mut labels = HashMap::with_capacity(column_count);
        for index in (1..=column_count).rev() {
            let label = shard.column_label(index)?;
            labels.insert(normalize_label(&label), index);
        }

        Ok(Self {
            labels,
            column_count,
        })
    }

    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.column_count
    }

    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.get(&normalize_label(label)).copied()
    }

    /// Resolve one column reference to a validated 1-based index.
    pub fn resolve(&self, source: &ColumnSource) -> Result<usize, InternalError> {
        match source {
            ColumnSource::Index(index) => {
                if (1..=self.column_count).contains(index) {
                    Ok(*index)
                } else {
                    Err(InternalError::selector_contract(format!(
                        "column index {index} out of range 1..={}",
                        self.column_count
                    )))
                }
            }
            ColumnSource::Label(label) => self.index_of(label).ok_or_else(|| {
                InternalError::selector_contract(format!("unknown column label '{label}'"))
            }),
        }
    }
}

// Strip one layer of identifier quoting and fold case.
fn normalize_label(label: &str) -> String {
    let trimmed = label.trim();
    let unquoted = [('`', '`'), ('"', '"'), ('[', ']')]
        .iter()
        .find_map(|(open, close)| {
            trimmed
                .strip_prefix(*open)
                .and_then(|rest| rest.strip_suffix(*close))
        })
        .unwrap_or(trimmed);

    unquoted.to_lowercase()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::shard::MemoryShardCursor;

    fn shard_with_labels(labels: &[&str]) -> MemoryShardCursor {
        MemoryShardCursor::new(labels.iter().copied(), Vec::new())
    }

    #[test]
    fn labels_resolve_case_insensitively() {
        let columns = ColumnIndexMap::from_shard(&shard_with_labels(&["ID", "Region"]))
            .expect("column map should build");

        assert_eq!(columns.index_of("id"), Some(1));
        assert_eq!(columns.index_of("REGION"), Some(2));
        assert_eq!(columns.index_of("amount"), None);
        assert_eq!(columns.column_count(), 2);
    }

    #[test]
    fn duplicate_labels_keep_the_lowest_index() {
        let columns = ColumnIndexMap::from_shard(&shard_with_labels(&["id", "name", "ID"]))
            .expect("column map should build");

        assert_eq!(columns.index_of("id"), Some(1));
    }

    #[test]
    fn quoted_labels_are_unquoted() {
        let columns =
            ColumnIndexMap::from_shard(&shard_with_labels(&["`order_id`", "\"Total\"", "[qty]"]))
                .expect("column map should build");

        assert_eq!(columns.index_of("order_id"), Some(1));
        assert_eq!(columns.index_of("total"), Some(2));
        assert_eq!(columns.index_of("`QTY`"), Some(3));
    }

    #[test]
    fn resolve_rejects_out_of_range_index() {
        let columns = ColumnIndexMap::from_shard(&shard_with_labels(&["id"]))
            .expect("column map should build");

        assert_eq!(columns.resolve(&ColumnSource::Index(1)).ok(), Some(1));
        let err = columns
            .resolve(&ColumnSource::Index(2))
            .expect_err("index past the end must fail");
        assert!(err.is_contract_violation());
        let err = columns
            .resolve(&ColumnSource::Index(0))
            .expect_err("index zero must fail");
        assert!(err.is_contract_violation());
    }
}
