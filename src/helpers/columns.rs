//! Column resolution: mapping requested column names to positional indexes
//! and projecting rows down to (or away from) those positions.

use thiserror::Error;

/// Errors raised while resolving column names against a header.
#[derive(Error, Debug)]
pub enum ColumnError {
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
}

/// Resolves requested column names to positions in `header`.
///
/// An empty request selects every column in header order. Otherwise each name
/// resolves to its first match in `header`, and the result follows the
/// *requested* order, which is what lets `keep` reorder columns. A name absent
/// from the header fails the whole resolution; no partial result is returned.
pub fn resolve(header: &[String], names: &[&str]) -> Result<Vec<usize>, ColumnError> {
    if names.is_empty() {
        return Ok((0..header.len()).collect());
    }
    names
        .iter()
        .map(|name| {
            header
                .iter()
                .position(|column| column == name)
                .ok_or_else(|| ColumnError::UnknownColumn(name.to_string()))
        })
        .collect()
}

/// Projects `values` down to the positions in `indexes`, in index order.
pub fn keep_by_index<T: Clone>(values: &[T], indexes: &[usize]) -> Vec<T> {
    indexes
        .iter()
        .filter_map(|index| values.get(*index).cloned())
        .collect()
}

/// Inverse of [`keep_by_index`]: keeps every position *not* in `indexes`,
/// preserving the original order.
pub fn mask_by_index<T: Clone>(values: &[T], indexes: &[usize]) -> Vec<T> {
    values
        .iter()
        .enumerate()
        .filter(|(index, _)| !indexes.contains(index))
        .map(|(_, value)| value.clone())
        .collect()
}
