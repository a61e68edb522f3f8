//! Format adapters and their capability contracts.
//!
//! Every adapter converts between a raw byte stream and the [`CommonTable`]
//! model through one of two traits: [`TableReader`] for parsing and
//! [`TableWriter`] for serialization. A concrete adapter implements whichever
//! sides it supports; requesting the missing side from the registry fails at
//! construction time with a typed error rather than at call time.

pub mod csv;
pub mod html;
pub mod json;
pub mod sqlite;
pub mod table;
pub mod xlsx;

use crate::error::PolytabError;
use crate::table::CommonTable;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::io::Write;
use thiserror::Error;

/// Parses one complete input stream into a table.
pub trait TableReader {
    fn read(&mut self, input: &mut dyn Read) -> Result<CommonTable, PolytabError>;
}

/// Serializes one complete table to an output stream.
///
/// Downstream I/O failures (e.g. a closed pipe) propagate as errors; callers
/// decide whether to surface or ignore them.
pub trait TableWriter {
    fn write(&mut self, table: &CommonTable, output: &mut dyn Write) -> Result<(), PolytabError>;
}

#[cfg(test)]
impl fmt::Debug for dyn TableReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn TableReader")
    }
}

#[cfg(test)]
impl fmt::Debug for dyn TableWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn TableWriter")
    }
}

/// Which side of an adapter a caller asked for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => write!(f, "read"),
            Direction::Write => write!(f, "write"),
        }
    }
}

/// Errors raised while interpreting adapter options.
#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Invalid value '{value}' for option '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("Missing required option '{0}'")]
    MissingOption(String),
}

/// Flat per-adapter option map supplied by the CLI collaborator.
///
/// Each adapter converts the subset of keys it recognizes into its own typed
/// configuration struct; unrecognized keys are ignored by that adapter.
#[derive(Clone, Debug, Default)]
pub struct FormatOptions(BTreeMap<String, String>);

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, OptionsError> {
        self.get(key)
            .map(|value| match value {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(self.invalid(key, value)),
            })
            .transpose()
    }

    pub fn get_usize(&self, key: &str) -> Result<Option<usize>, OptionsError> {
        self.get(key)
            .map(|value| value.parse().map_err(|_| self.invalid(key, value)))
            .transpose()
    }

    /// Gets a single-byte option such as a delimiter character.
    pub fn get_byte(&self, key: &str) -> Result<Option<u8>, OptionsError> {
        self.get(key)
            .map(|value| match value.as_bytes() {
                [byte] => Ok(*byte),
                _ => Err(self.invalid(key, value)),
            })
            .transpose()
    }

    fn invalid(&self, key: &str, value: &str) -> OptionsError {
        OptionsError::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        }
    }
}

/// Errors raised by adapter lookup.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown format '{0}'")]
    UnknownFormat(String),

    #[error("Format '{format}' does not support {direction}")]
    UnsupportedCapability { format: String, direction: Direction },
}

type ReaderFactory = fn(&FormatOptions) -> Result<Box<dyn TableReader>, PolytabError>;
type WriterFactory = fn(&FormatOptions) -> Result<Box<dyn TableWriter>, PolytabError>;

struct AdapterEntry {
    reader: Option<ReaderFactory>,
    writer: Option<WriterFactory>,
}

/// Name-to-adapter-factory lookup, built once at process start.
///
/// Dynamic plugin discovery is deliberately not reproduced; formats are
/// registered explicitly, either through [`AdapterRegistry::builtin`] or
/// [`AdapterRegistry::register`].
pub struct AdapterRegistry {
    entries: BTreeMap<String, AdapterEntry>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        AdapterRegistry {
            entries: BTreeMap::new(),
        }
    }

    /// Creates a registry with every built-in format registered.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("csv", Some(csv::reader_factory), Some(csv::writer_factory));
        registry.register("json", None, Some(json::writer_factory));
        registry.register("html", None, Some(html::writer_factory));
        registry.register("table", None, Some(table::writer_factory));
        registry.register("xlsx", Some(xlsx::reader_factory), None);
        registry.register(
            "sqlite",
            Some(sqlite::reader_factory),
            Some(sqlite::writer_factory),
        );
        registry
    }

    /// Registers a format under `name` with its supported capabilities.
    pub fn register(
        &mut self,
        name: &str,
        reader: Option<ReaderFactory>,
        writer: Option<WriterFactory>,
    ) {
        self.entries
            .insert(name.to_owned(), AdapterEntry { reader, writer });
    }

    /// Names of all registered formats, in sorted order.
    pub fn formats(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Constructs the read side of the named format.
    pub fn reader(
        &self,
        name: &str,
        options: &FormatOptions,
    ) -> Result<Box<dyn TableReader>, PolytabError> {
        let entry = self.entry(name)?;
        let factory = entry.reader.ok_or_else(|| RegistryError::UnsupportedCapability {
            format: name.to_owned(),
            direction: Direction::Read,
        })?;
        factory(options)
    }

    /// Constructs the write side of the named format.
    pub fn writer(
        &self,
        name: &str,
        options: &FormatOptions,
    ) -> Result<Box<dyn TableWriter>, PolytabError> {
        let entry = self.entry(name)?;
        let factory = entry.writer.ok_or_else(|| RegistryError::UnsupportedCapability {
            format: name.to_owned(),
            direction: Direction::Write,
        })?;
        factory(options)
    }

    fn entry(&self, name: &str) -> Result<&AdapterEntry, RegistryError> {
        self.entries
            .get(name)
            .ok_or_else(|| RegistryError::UnknownFormat(name.to_owned()))
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_formats_registered() {
        let registry = AdapterRegistry::builtin();
        assert_eq!(
            registry.formats(),
            vec!["csv", "html", "json", "sqlite", "table", "xlsx"]
        );
    }

    #[test]
    fn unknown_format_fails() {
        let registry = AdapterRegistry::builtin();
        let error = registry.reader("parquet", &FormatOptions::new()).unwrap_err();
        assert!(error.to_string().contains("Unknown format 'parquet'"));
    }

    #[test]
    fn unsupported_direction_fails_at_construction() {
        let registry = AdapterRegistry::builtin();

        let error = registry.writer("xlsx", &FormatOptions::new()).unwrap_err();
        assert!(error.to_string().contains("does not support write"));

        let error = registry.reader("html", &FormatOptions::new()).unwrap_err();
        assert!(error.to_string().contains("does not support read"));
    }

    #[test]
    fn options_typed_getters() {
        let options = FormatOptions::new()
            .set("has_header", "false")
            .set("padding", "2")
            .set("delimiter", "|");

        assert_eq!(options.get_bool("has_header").unwrap(), Some(false));
        assert_eq!(options.get_usize("padding").unwrap(), Some(2));
        assert_eq!(options.get_byte("delimiter").unwrap(), Some(b'|'));
        assert_eq!(options.get("missing"), None);
    }

    #[test]
    fn options_invalid_value_fails() {
        let options = FormatOptions::new().set("padding", "wide");
        assert!(options.get_usize("padding").is_err());

        let options = FormatOptions::new().set("delimiter", "||");
        assert!(options.get_byte("delimiter").is_err());
    }
}
