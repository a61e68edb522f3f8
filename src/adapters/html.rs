//! HTML adapter (write-only): wraps the table in a `<table>` element with
//! `<th>` header cells and `<td>` data cells.

use crate::adapters::FormatOptions;
use crate::adapters::TableWriter;
use crate::error::PolytabError;
use crate::table::CommonTable;
use std::io::Write;

const TAB: &str = "    ";

/// HTML adapter configuration.
#[derive(Clone, Debug, Default)]
pub struct HtmlConfig {
    /// Human-readable output with newlines and indentation. Default false.
    pub pretty: bool,
}

impl HtmlConfig {
    /// Builds the configuration from the flat option map.
    /// Recognized keys: `pretty`.
    pub fn from_options(options: &FormatOptions) -> Result<Self, PolytabError> {
        Ok(HtmlConfig {
            pretty: options.get_bool("pretty")?.unwrap_or(false),
        })
    }
}

/// Serializes a table as an HTML `<table>` element.
pub struct HtmlAdapter {
    config: HtmlConfig,
}

impl HtmlAdapter {
    pub fn new(config: HtmlConfig) -> Self {
        HtmlAdapter { config }
    }

    /// Formats one `<tr>` element, header cells as `<th>`, data cells as `<td>`.
    fn format_row(&self, cells: &[Option<&str>], header: bool) -> String {
        let tab = if self.config.pretty { TAB } else { "" };
        let newline = if self.config.pretty { "\n" } else { "" };
        let joiner = format!("{newline}{tab}{tab}");
        let formatted: Vec<String> = cells
            .iter()
            .map(|cell| {
                let value = cell.unwrap_or("");
                if header {
                    format!("<th>{value}</th>")
                } else {
                    format!("<td>{value}</td>")
                }
            })
            .collect();
        format!(
            "{tab}<tr>{joiner}{cells}{newline}{tab}</tr>",
            cells = formatted.join(&joiner)
        )
    }
}

impl TableWriter for HtmlAdapter {
    fn write(&mut self, table: &CommonTable, output: &mut dyn Write) -> Result<(), PolytabError> {
        let header = table
            .header
            .as_ref()
            .map(|header| {
                let cells: Vec<Option<&str>> =
                    header.iter().map(|name| Some(name.as_str())).collect();
                format!("{}\n", self.format_row(&cells, true))
            })
            .unwrap_or_default();
        let rows: Vec<String> = table
            .rows
            .iter()
            .map(|row| {
                let cells: Vec<Option<&str>> = row.iter().map(Option::as_deref).collect();
                self.format_row(&cells, false)
            })
            .collect();

        write!(output, "<table>\n{}{}\n</table>\n", header, rows.join("\n"))?;
        Ok(())
    }
}

pub(super) fn writer_factory(
    options: &FormatOptions,
) -> Result<Box<dyn TableWriter>, PolytabError> {
    Ok(Box::new(HtmlAdapter::new(HtmlConfig::from_options(options)?)))
}
