//! JSON adapter (write-only): one object per row, keys taken from the header
//! in column order; pretty mode switches to a 4-space indent with sorted keys.

use crate::adapters::FormatOptions;
use crate::adapters::TableWriter;
use crate::error::PolytabError;
use crate::table::generic_header;
use crate::table::CommonTable;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::ser::PrettyFormatter;
use serde_json::Map;
use serde_json::Serializer;
use serde_json::Value;
use std::io;
use std::io::Write;

const INDENT: &[u8] = b"    ";

/// Compact output with a space after each comma and colon, matching the
/// classic single-line rendition of row objects.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if !first {
            writer.write_all(b", ")?;
        }
        Ok(())
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if !first {
            writer.write_all(b", ")?;
        }
        Ok(())
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// JSON adapter configuration.
#[derive(Clone, Debug, Default)]
pub struct JsonConfig {
    /// Human-readable output: 4-space indent, keys sorted. Default false.
    pub pretty: bool,
}

impl JsonConfig {
    /// Builds the configuration from the flat option map.
    /// Recognized keys: `pretty`.
    pub fn from_options(options: &FormatOptions) -> Result<Self, PolytabError> {
        Ok(JsonConfig {
            pretty: options.get_bool("pretty")?.unwrap_or(false),
        })
    }
}

/// Serializes a table as an array of row objects.
pub struct JsonAdapter {
    config: JsonConfig,
}

impl JsonAdapter {
    pub fn new(config: JsonConfig) -> Self {
        JsonAdapter { config }
    }
}

impl TableWriter for JsonAdapter {
    fn write(&mut self, table: &CommonTable, output: &mut dyn Write) -> Result<(), PolytabError> {
        let header = table
            .header
            .clone()
            .unwrap_or_else(|| generic_header(table.width()));

        let objects: Vec<Map<String, Value>> = table
            .rows
            .iter()
            .map(|row| {
                let mut pairs: Vec<(String, Value)> = header
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|cell| {
                        cell.as_ref()
                            .map(|value| Value::String(value.clone()))
                            .unwrap_or(Value::Null)
                    }))
                    .collect();
                if self.config.pretty {
                    pairs.sort_by(|left, right| left.0.cmp(&right.0));
                }
                pairs.into_iter().collect()
            })
            .collect();

        if self.config.pretty {
            let formatter = PrettyFormatter::with_indent(INDENT);
            let mut serializer = Serializer::with_formatter(output, formatter);
            objects.serialize(&mut serializer)?;
        } else {
            let mut serializer = Serializer::with_formatter(output, SpacedFormatter);
            objects.serialize(&mut serializer)?;
        }

        Ok(())
    }
}

pub(super) fn writer_factory(
    options: &FormatOptions,
) -> Result<Box<dyn TableWriter>, PolytabError> {
    Ok(Box::new(JsonAdapter::new(JsonConfig::from_options(options)?)))
}
