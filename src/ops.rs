//! Table operations: column projection, numeric aggregation, fixed-width
//! layout and end-to-end stream conversion.

use crate::adapters::TableReader;
use crate::adapters::TableWriter;
use crate::error::PolytabError;
use crate::helpers::columns;
use crate::helpers::format::infer_alignment;
use crate::helpers::format::pad;
use crate::helpers::format::to_number;
use crate::helpers::format::truncate;
use crate::table::generic_header;
use crate::table::CommonTable;
use crate::table::Row;
use std::io::Read;
use std::io::Write;
use thiserror::Error;

/// Errors raised by table operations.
#[derive(Error, Debug)]
pub enum OpsError {
    #[error("Cannot aggregate an empty column")]
    EmptyColumn,
}

/// Aggregate function signature used by [`column_apply`] and [`summarize`].
pub type Aggregate = fn(&[f64]) -> Result<f64, OpsError>;

/// Sum of the values. Defined as `0` for an empty column.
pub fn sum(values: &[f64]) -> Result<f64, OpsError> {
    Ok(values.iter().sum())
}

/// Arithmetic mean of the values.
pub fn mean(values: &[f64]) -> Result<f64, OpsError> {
    if values.is_empty() {
        return Err(OpsError::EmptyColumn);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of the values; the mean of the middle pair for even counts.
pub fn median(values: &[f64]) -> Result<f64, OpsError> {
    if values.is_empty() {
        return Err(OpsError::EmptyColumn);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|left, right| left.partial_cmp(right).expect("coerced values are finite"));
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Ok(sorted[middle])
    } else {
        Ok((sorted[middle - 1] + sorted[middle]) / 2.0)
    }
}

/// Column names of a table, synthesizing `col0, col1, ...` when absent.
fn effective_header(table: &CommonTable) -> Vec<String> {
    table
        .header
        .clone()
        .unwrap_or_else(|| generic_header(table.width()))
}

/// Projects a table onto the named columns, in the requested order.
/// Empty `names` keeps every column.
pub fn keep_columns(table: &CommonTable, names: &[&str]) -> Result<CommonTable, PolytabError> {
    let header = effective_header(table);
    let indexes = columns::resolve(&header, names)?;
    Ok(CommonTable::new(
        Some(columns::keep_by_index(&header, &indexes)),
        table
            .rows
            .iter()
            .map(|row| columns::keep_by_index(row, &indexes))
            .collect(),
    ))
}

/// Removes the named columns, keeping the rest in table order.
pub fn drop_columns(table: &CommonTable, names: &[&str]) -> Result<CommonTable, PolytabError> {
    let header = effective_header(table);
    let indexes = columns::resolve(&header, names)?;
    Ok(CommonTable::new(
        Some(columns::mask_by_index(&header, &indexes)),
        table
            .rows
            .iter()
            .map(|row| columns::mask_by_index(row, &indexes))
            .collect(),
    ))
}

/// Applies an aggregate to each named column, coercing cells with the
/// silent-zero policy. Empty `names` covers every column. Returns one
/// `(column name, result)` pair per column in requested order.
pub fn column_apply<F>(
    table: &CommonTable,
    aggregate: F,
    names: &[&str],
) -> Result<Vec<(String, f64)>, PolytabError>
where
    F: Fn(&[f64]) -> Result<f64, OpsError>,
{
    let header = effective_header(table);
    let indexes = columns::resolve(&header, names)?;

    let mut results = Vec::with_capacity(indexes.len());
    for &index in &indexes {
        let values: Vec<f64> = table
            .rows
            .iter()
            .map(|row| to_number(row.get(index).and_then(Option::as_deref)))
            .collect();
        results.push((header[index].clone(), aggregate(&values)?));
    }
    Ok(results)
}

/// Lays a table out as fixed-width text cells: per-column width from the
/// longest value plus `padding` and capped by `max_width`, alignment
/// inferred from the data values, over-long cells truncated with an
/// ellipsis. Returns one `Vec<String>` per row, header row first.
pub fn tabulate(table: &CommonTable, max_width: Option<usize>, padding: usize) -> Vec<Vec<String>> {
    let flat: Vec<Vec<Option<&str>>> = table.iter().collect();
    if flat.is_empty() {
        return Vec::new();
    }
    let columns = flat.iter().map(Vec::len).max().unwrap_or(0);
    let data_start = usize::from(table.header.is_some());

    let mut formatted = vec![Vec::with_capacity(columns); flat.len()];
    for column in 0..columns {
        let values: Vec<Option<&str>> = flat
            .iter()
            .map(|row| row.get(column).copied().flatten())
            .collect();
        let alignment = infer_alignment(&values[data_start..]);
        // Padding applies only when the column has content at all; an
        // entirely null column stays at width zero.
        let mut width = values
            .iter()
            .filter_map(|value| value.map(|cell| cell.chars().count()))
            .max()
            .map(|longest| longest + padding)
            .unwrap_or(0);
        if let Some(max_width) = max_width {
            width = width.min(max_width);
        }
        for (row, value) in formatted.iter_mut().zip(&values) {
            let cell = truncate(*value, width);
            row.push(pad(&cell, width, alignment));
        }
    }
    formatted
}

/// Reads a table from `input` and writes it to `output`, returning the
/// table that passed through.
pub fn convert(
    input: &mut dyn Read,
    reader: &mut dyn TableReader,
    writer: &mut dyn TableWriter,
    output: &mut dyn Write,
) -> Result<CommonTable, PolytabError> {
    let table = reader.read(input)?;
    writer.write(&table, output)?;
    Ok(table)
}

/// Builds a summary table with one labeled row per statistic and the source
/// columns as attributes: header `attribute, <columns...>` and rows `mean`,
/// `median` and `sum`.
pub fn summarize(table: &CommonTable) -> Result<CommonTable, PolytabError> {
    let statistics: [(&str, Aggregate); 3] = [("mean", mean), ("median", median), ("sum", sum)];
    let header = effective_header(table);

    let mut rows = Vec::with_capacity(statistics.len());
    for (label, aggregate) in statistics {
        let mut row = Row::with_capacity(header.len() + 1);
        row.push(Some(label.to_owned()));
        for (_, value) in column_apply(table, aggregate, &[])? {
            row.push(Some(value.to_string()));
        }
        rows.push(row);
    }

    let mut summary_header = Vec::with_capacity(header.len() + 1);
    summary_header.push("attribute".to_owned());
    summary_header.extend(header);
    Ok(CommonTable::new(Some(summary_header), rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::csv::CsvAdapter;
    use crate::adapters::csv::CsvConfig;
    use std::io::Cursor;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|cell| Some(cell.to_string())).collect()
    }

    fn table() -> CommonTable {
        CommonTable::new(
            Some(vec!["id".to_owned(), "name".to_owned(), "score".to_owned()]),
            vec![row(&["1", "Alice", "10"]), row(&["2", "Bob", "20"])],
        )
    }

    #[test]
    fn sum_coerces_unparsable_cells_to_zero() {
        let table = CommonTable::new(
            Some(vec!["n".to_owned()]),
            vec![row(&["1"]), row(&["2"]), row(&["x"]), row(&["4"])],
        );
        let results = column_apply(&table, sum, &["n"]).unwrap();
        assert_eq!(results, vec![("n".to_owned(), 7.0)]);
    }

    #[test]
    fn mean_and_median() {
        assert_eq!(mean(&[2.0, 4.0]).unwrap(), 3.0);
        assert_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]).unwrap(), 2.5);
    }

    #[test]
    fn empty_column_aggregates_fail_except_sum() {
        assert_eq!(sum(&[]).unwrap(), 0.0);
        assert!(mean(&[]).is_err());
        assert!(median(&[]).is_err());
    }

    #[test]
    fn keep_respects_requested_order() {
        let kept = keep_columns(&table(), &["score", "id"]).unwrap();
        assert_eq!(kept.header, Some(vec!["score".to_owned(), "id".to_owned()]));
        assert_eq!(kept.rows[0], row(&["10", "1"]));
    }

    #[test]
    fn keep_and_drop_are_complementary() {
        let kept = keep_columns(&table(), &["name"]).unwrap();
        let dropped = drop_columns(&table(), &["id", "score"]).unwrap();
        assert_eq!(kept, dropped);
    }

    #[test]
    fn unknown_column_fails() {
        let error = keep_columns(&table(), &["missing"]).unwrap_err();
        assert!(error.to_string().contains("missing"));
    }

    #[test]
    fn column_apply_covers_all_columns_by_default() {
        let results = column_apply(&table(), sum, &[]).unwrap();
        assert_eq!(
            results,
            vec![
                ("id".to_owned(), 3.0),
                ("name".to_owned(), 0.0),
                ("score".to_owned(), 30.0),
            ]
        );
    }

    #[test]
    fn tabulate_aligns_and_pads() {
        let formatted = tabulate(&table(), None, 0);
        assert_eq!(formatted[0], vec!["id", "name ", "score"]);
        assert_eq!(formatted[1], vec![" 1", "Alice", "   10"]);
        assert_eq!(formatted[2], vec![" 2", "Bob  ", "   20"]);
    }

    #[test]
    fn tabulate_caps_width_and_truncates() {
        let formatted = tabulate(&table(), Some(4), 0);
        assert_eq!(formatted[1], vec![" 1", "A...", "  10"]);
    }

    #[test]
    fn tabulate_empty_table() {
        assert!(tabulate(&CommonTable::default(), None, 0).is_empty());
    }

    #[test]
    fn tabulate_all_null_column_stays_at_zero_width() {
        let table = CommonTable::new(
            None,
            vec![
                vec![Some("1".to_owned()), None],
                vec![Some("22".to_owned()), None],
            ],
        );
        let formatted = tabulate(&table, None, 1);
        assert_eq!(formatted[0], vec!["  1", ""]);
        assert_eq!(formatted[1], vec![" 22", ""]);
    }

    #[test]
    fn convert_returns_the_table_it_wrote() {
        let mut input = Cursor::new(b"a,b\n1,2\n".to_vec());
        let mut output = Vec::new();
        let mut reader = CsvAdapter::new(CsvConfig::default());
        let mut writer = CsvAdapter::new(CsvConfig::default());

        let table = convert(&mut input, &mut reader, &mut writer, &mut output).unwrap();
        assert_eq!(table.header, Some(vec!["a".to_owned(), "b".to_owned()]));
        assert_eq!(String::from_utf8(output).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn summarize_labels_statistics() {
        let table = CommonTable::new(
            Some(vec!["a".to_owned()]),
            vec![row(&["1"]), row(&["2"]), row(&["3"])],
        );
        let summary = summarize(&table).unwrap();
        assert_eq!(
            summary.header,
            Some(vec!["attribute".to_owned(), "a".to_owned()])
        );
        assert_eq!(summary.rows[0], row(&["mean", "2"]));
        assert_eq!(summary.rows[1], row(&["median", "2"]));
        assert_eq!(summary.rows[2], row(&["sum", "6"]));
    }
}
