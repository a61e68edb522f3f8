//! CSV adapter: delimiter, header presence, line terminator and quoting are
//! configurable independently for the input and output side.

use crate::adapters::FormatOptions;
use crate::adapters::OptionsError;
use crate::adapters::TableReader;
use crate::adapters::TableWriter;
use crate::error::PolytabError;
use crate::table::generic_header;
use crate::table::CommonTable;
use crate::table::Row;
use csv::QuoteStyle;
use csv::ReaderBuilder;
use csv::Terminator;
use csv::WriterBuilder;
use std::io::Read;
use std::io::Write;

/// Quoting level, mirroring the classic CSV writer levels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Quoting {
    All,
    #[default]
    Minimal,
    NonNumeric,
    None,
}

impl Quoting {
    fn parse(value: &str) -> Result<Self, OptionsError> {
        match value {
            "all" => Ok(Self::All),
            "minimal" => Ok(Self::Minimal),
            "nonnumeric" => Ok(Self::NonNumeric),
            "none" => Ok(Self::None),
            _ => Err(OptionsError::InvalidValue {
                key: "quoting".to_owned(),
                value: value.to_owned(),
            }),
        }
    }

    fn to_style(self) -> QuoteStyle {
        match self {
            Self::All => QuoteStyle::Always,
            Self::Minimal => QuoteStyle::Necessary,
            Self::NonNumeric => QuoteStyle::NonNumeric,
            Self::None => QuoteStyle::Never,
        }
    }
}

/// CSV adapter configuration with documented defaults.
#[derive(Clone, Debug)]
pub struct CsvConfig {
    /// Column delimiter, default comma
    pub delimiter: u8,
    /// Whether the first record is (input) or should be (output) the header, default true
    pub has_header: bool,
    /// Record terminator, default newline
    pub terminator: u8,
    /// Output quoting level, default minimal
    pub quoting: Quoting,
}

impl Default for CsvConfig {
    fn default() -> Self {
        CsvConfig {
            delimiter: b',',
            has_header: true,
            terminator: b'\n',
            quoting: Quoting::Minimal,
        }
    }
}

impl CsvConfig {
    /// Builds the configuration from the flat option map.
    /// Recognized keys: `delimiter`, `has_header`, `terminator`, `quoting`.
    pub fn from_options(options: &FormatOptions) -> Result<Self, PolytabError> {
        let defaults = Self::default();
        Ok(CsvConfig {
            delimiter: options.get_byte("delimiter")?.unwrap_or(defaults.delimiter),
            has_header: options.get_bool("has_header")?.unwrap_or(defaults.has_header),
            terminator: options.get_byte("terminator")?.unwrap_or(defaults.terminator),
            quoting: options
                .get("quoting")
                .map(Quoting::parse)
                .transpose()?
                .unwrap_or(defaults.quoting),
        })
    }
}

/// Reads and writes delimiter-separated records.
pub struct CsvAdapter {
    config: CsvConfig,
}

impl CsvAdapter {
    pub fn new(config: CsvConfig) -> Self {
        CsvAdapter { config }
    }
}

impl TableReader for CsvAdapter {
    fn read(&mut self, input: &mut dyn Read) -> Result<CommonTable, PolytabError> {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.config.delimiter)
            .has_headers(false)
            .flexible(true)
            .quoting(self.config.quoting != Quoting::None);
        if self.config.terminator != b'\n' {
            builder.terminator(Terminator::Any(self.config.terminator));
        }

        let mut records = Vec::<Vec<String>>::new();
        for result in builder.from_reader(input).records() {
            let record = result?;
            records.push(record.iter().map(str::to_owned).collect());
        }

        let header = if records.is_empty() {
            None
        } else if self.config.has_header {
            Some(records.remove(0))
        } else {
            Some(generic_header(records[0].len()))
        };
        let rows = records
            .into_iter()
            .map(|record| record.into_iter().map(Some).collect::<Row>())
            .collect();

        Ok(CommonTable::new(header, rows))
    }
}

impl TableWriter for CsvAdapter {
    fn write(&mut self, table: &CommonTable, output: &mut dyn Write) -> Result<(), PolytabError> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.config.delimiter)
            .quote_style(self.config.quoting.to_style())
            .terminator(Terminator::Any(self.config.terminator))
            .from_writer(output);

        if let Some(header) = table.header.as_ref().filter(|_| self.config.has_header) {
            writer.write_record(header)?;
        }
        for row in &table.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;

        Ok(())
    }
}

pub(super) fn reader_factory(
    options: &FormatOptions,
) -> Result<Box<dyn TableReader>, PolytabError> {
    Ok(Box::new(CsvAdapter::new(CsvConfig::from_options(options)?)))
}

pub(super) fn writer_factory(
    options: &FormatOptions,
) -> Result<Box<dyn TableWriter>, PolytabError> {
    Ok(Box::new(CsvAdapter::new(CsvConfig::from_options(options)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(input: &str, config: CsvConfig) -> CommonTable {
        CsvAdapter::new(config)
            .read(&mut Cursor::new(input.as_bytes()))
            .unwrap()
    }

    fn write(table: &CommonTable, config: CsvConfig) -> String {
        let mut output = Vec::new();
        CsvAdapter::new(config).write(table, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn read_with_header() {
        let table = read("a,b\n1,2\n3,4\n", CsvConfig::default());
        assert_eq!(table.header, Some(vec!["a".to_owned(), "b".to_owned()]));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec![Some("1".to_owned()), Some("2".to_owned())]);
    }

    #[test]
    fn read_without_header_synthesizes_names() {
        let config = CsvConfig {
            has_header: false,
            ..CsvConfig::default()
        };
        let table = read("1,2\n3,4\n", config);
        assert_eq!(table.header, Some(vec!["col0".to_owned(), "col1".to_owned()]));
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn read_custom_delimiter() {
        let config = CsvConfig {
            delimiter: b'|',
            ..CsvConfig::default()
        };
        let table = read("a|b\n1|2\n", config);
        assert_eq!(table.header, Some(vec!["a".to_owned(), "b".to_owned()]));
    }

    #[test]
    fn round_trip_preserves_bytes() {
        let input = "a,b\n1,2\n3,4\n";
        let table = read(input, CsvConfig::default());
        assert_eq!(write(&table, CsvConfig::default()), input);
    }

    #[test]
    fn write_quote_all() {
        let table = read("a,b\n1,2\n", CsvConfig::default());
        let config = CsvConfig {
            quoting: Quoting::All,
            ..CsvConfig::default()
        };
        assert_eq!(write(&table, config), "\"a\",\"b\"\n\"1\",\"2\"\n");
    }

    #[test]
    fn write_without_header() {
        let table = read("a,b\n1,2\n", CsvConfig::default());
        let config = CsvConfig {
            has_header: false,
            ..CsvConfig::default()
        };
        assert_eq!(write(&table, config), "1,2\n");
    }

    #[test]
    fn write_null_cells_as_empty() {
        let table = CommonTable::new(
            Some(vec!["a".to_owned(), "b".to_owned()]),
            vec![vec![Some("1".to_owned()), None]],
        );
        assert_eq!(write(&table, CsvConfig::default()), "a,b\n1,\n");
    }

    #[test]
    fn config_from_options() {
        let options = FormatOptions::new()
            .set("delimiter", "\t")
            .set("has_header", "false")
            .set("quoting", "none");
        let config = CsvConfig::from_options(&options).unwrap();
        assert_eq!(config.delimiter, b'\t');
        assert!(!config.has_header);
        assert_eq!(config.quoting, Quoting::None);
    }

    #[test]
    fn config_rejects_unknown_quoting() {
        let options = FormatOptions::new().set("quoting", "sometimes");
        assert!(CsvConfig::from_options(&options).is_err());
    }
}
