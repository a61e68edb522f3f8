//! Fixed-width table adapter (write-only): the display format behind the
//! "tab" command. Columns share one width, numeric columns align right, and
//! over-long cells are truncated.

use crate::adapters::FormatOptions;
use crate::adapters::TableWriter;
use crate::error::PolytabError;
use crate::ops::tabulate;
use crate::table::CommonTable;
use std::io::Write;

/// Fixed-width adapter configuration with documented defaults.
#[derive(Clone, Debug)]
pub struct TableConfig {
    /// Cell delimiter, default a single space
    pub delimiter: String,
    /// Whether to emit the header row, default true
    pub has_header: bool,
    /// Line terminator, default newline
    pub terminator: String,
    /// Optional cap on column width; wider cells are truncated
    pub max_width: Option<usize>,
    /// Extra spaces added to every column width, default 0
    pub padding: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            delimiter: " ".to_owned(),
            has_header: true,
            terminator: "\n".to_owned(),
            max_width: None,
            padding: 0,
        }
    }
}

impl TableConfig {
    /// Builds the configuration from the flat option map.
    /// Recognized keys: `delimiter`, `has_header`, `terminator`, `max_width`, `padding`.
    pub fn from_options(options: &FormatOptions) -> Result<Self, PolytabError> {
        let defaults = Self::default();
        Ok(TableConfig {
            delimiter: options
                .get("delimiter")
                .map(str::to_owned)
                .unwrap_or(defaults.delimiter),
            has_header: options.get_bool("has_header")?.unwrap_or(defaults.has_header),
            terminator: options
                .get("terminator")
                .map(str::to_owned)
                .unwrap_or(defaults.terminator),
            max_width: options.get_usize("max_width")?,
            padding: options.get_usize("padding")?.unwrap_or(defaults.padding),
        })
    }
}

/// Writes a table as aligned fixed-width text.
pub struct TableAdapter {
    config: TableConfig,
}

impl TableAdapter {
    pub fn new(config: TableConfig) -> Self {
        TableAdapter { config }
    }
}

impl TableWriter for TableAdapter {
    fn write(&mut self, table: &CommonTable, output: &mut dyn Write) -> Result<(), PolytabError> {
        let formatted = tabulate(table, self.config.max_width, self.config.padding);
        let skip_header = table.header.is_some() && !self.config.has_header;
        for row in formatted.iter().skip(usize::from(skip_header)) {
            output.write_all(row.join(&self.config.delimiter).as_bytes())?;
            output.write_all(self.config.terminator.as_bytes())?;
        }
        Ok(())
    }
}

pub(super) fn writer_factory(
    options: &FormatOptions,
) -> Result<Box<dyn TableWriter>, PolytabError> {
    Ok(Box::new(TableAdapter::new(TableConfig::from_options(options)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CommonTable {
        CommonTable::new(
            Some(vec!["id".to_owned(), "name".to_owned()]),
            vec![
                vec![Some("1".to_owned()), Some("Alice".to_owned())],
                vec![Some("2".to_owned()), Some("Bob".to_owned())],
            ],
        )
    }

    fn write(table: &CommonTable, config: TableConfig) -> String {
        let mut output = Vec::new();
        TableAdapter::new(config).write(table, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn aligns_numeric_right_and_text_left() {
        assert_eq!(
            write(&table(), TableConfig::default()),
            "id name \n 1 Alice\n 2 Bob  \n"
        );
    }

    #[test]
    fn skips_header_when_disabled() {
        let config = TableConfig {
            has_header: false,
            ..TableConfig::default()
        };
        assert_eq!(write(&table(), config), " 1 Alice\n 2 Bob  \n");
    }

    #[test]
    fn truncates_at_max_width() {
        let config = TableConfig {
            max_width: Some(4),
            ..TableConfig::default()
        };
        assert_eq!(write(&table(), config), "id name\n 1 A...\n 2 Bob \n");
    }

    #[test]
    fn custom_delimiter_and_terminator() {
        let config = TableConfig {
            delimiter: " | ".to_owned(),
            terminator: "\r\n".to_owned(),
            ..TableConfig::default()
        };
        assert_eq!(
            write(&table(), config),
            "id | name \r\n 1 | Alice\r\n 2 | Bob  \r\n"
        );
    }
}
