/// A single row of cells. Cells are string-typed at the storage layer;
/// a missing value is `None`, and numeric interpretation happens on demand.
pub type Row = Vec<Option<String>>;

/// Canonical in-memory tabular value shared by all adapters and operations:
/// an optional ordered header row plus an ordered sequence of rows.
///
/// Operations produce new instances rather than mutating; with a header
/// present, callers are expected to keep every row at `header.len()` cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommonTable {
    /// Column names, or `None` when the source carried no header
    pub header: Option<Vec<String>>,
    /// Data rows in source order
    pub rows: Vec<Row>,
}

impl CommonTable {
    /// Creates a table from a header and rows.
    pub fn new(header: Option<Vec<String>>, rows: Vec<Row>) -> Self {
        CommonTable { header, rows }
    }

    /// Number of columns, taken from the header or the first row.
    pub fn width(&self) -> usize {
        self.header
            .as_ref()
            .map(Vec::len)
            .or_else(|| self.rows.first().map(Vec::len))
            .unwrap_or(0)
    }

    /// Flat traversal yielding the header first (when present) then each row,
    /// for writers that treat header and data rows uniformly.
    pub fn iter(&self) -> impl Iterator<Item = Vec<Option<&str>>> + '_ {
        let header = self.header.as_ref().map(|header| {
            header
                .iter()
                .map(|name| Some(name.as_str()))
                .collect::<Vec<_>>()
        });
        header.into_iter().chain(
            self.rows
                .iter()
                .map(|row| row.iter().map(Option::as_deref).collect()),
        )
    }
}

/// Generates `col0, col1, ...` names for sources without a header row.
pub(crate) fn generic_header(columns: usize) -> Vec<String> {
    (0..columns).map(|index| format!("col{index}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|cell| Some(cell.to_string())).collect()
    }

    #[test]
    fn iter_yields_header_first() {
        let table = CommonTable::new(
            Some(vec!["a".to_owned(), "b".to_owned()]),
            vec![row(&["1", "2"])],
        );

        let flat: Vec<Vec<Option<&str>>> = table.iter().collect();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0], vec![Some("a"), Some("b")]);
        assert_eq!(flat[1], vec![Some("1"), Some("2")]);
    }

    #[test]
    fn iter_without_header() {
        let table = CommonTable::new(None, vec![row(&["1", "2"])]);

        let flat: Vec<Vec<Option<&str>>> = table.iter().collect();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0], vec![Some("1"), Some("2")]);
    }

    #[test]
    fn width_prefers_header() {
        let table = CommonTable::new(Some(generic_header(3)), Vec::new());
        assert_eq!(table.width(), 3);

        let table = CommonTable::new(None, vec![row(&["1", "2"])]);
        assert_eq!(table.width(), 2);

        assert_eq!(CommonTable::default().width(), 0);
    }

    #[test]
    fn generic_header_names() {
        assert_eq!(generic_header(2), vec!["col0", "col1"]);
        assert!(generic_header(0).is_empty());
    }
}
