//! SQLite adapter: reads and writes one database table per operation. The
//! database lives at a configured path, so the stream argument of the
//! reader and writer traits is ignored.

use crate::adapters::FormatOptions;
use crate::adapters::OptionsError;
use crate::adapters::TableReader;
use crate::adapters::TableWriter;
use crate::error::PolytabError;
use crate::table::CommonTable;
use crate::table::Row;
use rusqlite::params_from_iter;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::io::Read;
use std::io::Write;
use std::path::Path;

/// SQLite adapter configuration.
#[derive(Clone, Debug)]
pub struct SqliteConfig {
    /// Database file path, required
    pub path: String,
    /// Table to read from or write to, default the path's file stem
    pub table_name: String,
}

impl SqliteConfig {
    /// Builds the configuration from the flat option map.
    /// Recognized keys: `path` (required), `table_name`.
    pub fn from_options(options: &FormatOptions) -> Result<Self, PolytabError> {
        let path = options
            .get("path")
            .ok_or_else(|| OptionsError::MissingOption("path".to_owned()))?
            .to_owned();
        let table_name = match options.get("table_name") {
            Some(name) => name.to_owned(),
            None => Path::new(&path)
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_else(|| "data".to_owned()),
        };
        Ok(SqliteConfig { path, table_name })
    }
}

/// Reads and writes a single SQLite table.
pub struct SqliteAdapter {
    config: SqliteConfig,
}

impl SqliteAdapter {
    pub fn new(config: SqliteConfig) -> Self {
        SqliteAdapter { config }
    }
}

/// Double-quote escaping for identifiers in generated SQL.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl TableReader for SqliteAdapter {
    fn read(&mut self, _input: &mut dyn Read) -> Result<CommonTable, PolytabError> {
        let connection = Connection::open(&self.config.path)?;
        let mut statement = connection.prepare(&format!(
            "SELECT * FROM {}",
            quote_identifier(&self.config.table_name)
        ))?;
        let header: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let width = header.len();

        let mut rows = Vec::<Row>::new();
        let mut results = statement.query([])?;
        while let Some(result) = results.next()? {
            let mut record = Row::with_capacity(width);
            for index in 0..width {
                let cell = match result.get_ref(index)? {
                    ValueRef::Null => None,
                    ValueRef::Integer(value) => Some(value.to_string()),
                    ValueRef::Real(value) => Some(value.to_string()),
                    ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).to_string()),
                    ValueRef::Blob(bytes) => Some(String::from_utf8_lossy(bytes).to_string()),
                };
                record.push(cell);
            }
            rows.push(record);
        }

        Ok(CommonTable::new(Some(header), rows))
    }
}

impl TableWriter for SqliteAdapter {
    fn write(&mut self, table: &CommonTable, _output: &mut dyn Write) -> Result<(), PolytabError> {
        let connection = Connection::open(&self.config.path)?;
        let header = table
            .header
            .clone()
            .unwrap_or_else(|| crate::table::generic_header(table.width()));

        let columns: Vec<String> = header
            .iter()
            .map(|name| quote_identifier(name))
            .collect();
        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} ({})",
                quote_identifier(&self.config.table_name),
                columns.join(", ")
            ),
            [],
        )?;

        let placeholders: Vec<&str> = header.iter().map(|_| "?").collect();
        let mut statement = connection.prepare(&format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(&self.config.table_name),
            columns.join(", "),
            placeholders.join(", ")
        ))?;
        for row in &table.rows {
            statement.execute(params_from_iter(row.iter()))?;
        }

        Ok(())
    }
}

pub(super) fn reader_factory(
    options: &FormatOptions,
) -> Result<Box<dyn TableReader>, PolytabError> {
    Ok(Box::new(SqliteAdapter::new(SqliteConfig::from_options(options)?)))
}

pub(super) fn writer_factory(
    options: &FormatOptions,
) -> Result<Box<dyn TableWriter>, PolytabError> {
    Ok(Box::new(SqliteAdapter::new(SqliteConfig::from_options(options)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn config(path: &Path, table_name: &str) -> SqliteConfig {
        SqliteConfig {
            path: path.to_string_lossy().to_string(),
            table_name: table_name.to_owned(),
        }
    }

    fn sample() -> CommonTable {
        CommonTable::new(
            Some(vec!["id".to_owned(), "name".to_owned()]),
            vec![
                vec![Some("1".to_owned()), Some("Alice".to_owned())],
                vec![Some("2".to_owned()), None],
            ],
        )
    }

    #[test]
    fn write_then_read_round_trip() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("people.db");
        let mut sink = Vec::new();

        SqliteAdapter::new(config(&path, "people"))
            .write(&sample(), &mut sink)
            .unwrap();
        let table = SqliteAdapter::new(config(&path, "people"))
            .read(&mut Cursor::new(Vec::new()))
            .unwrap();

        assert_eq!(table.header, Some(vec!["id".to_owned(), "name".to_owned()]));
        assert_eq!(
            table.rows,
            vec![
                vec![Some("1".to_owned()), Some("Alice".to_owned())],
                vec![Some("2".to_owned()), None],
            ]
        );
    }

    #[test]
    fn write_appends_to_existing_table() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("people.db");
        let mut sink = Vec::new();

        let mut adapter = SqliteAdapter::new(config(&path, "people"));
        adapter.write(&sample(), &mut sink).unwrap();
        adapter.write(&sample(), &mut sink).unwrap();

        let table = SqliteAdapter::new(config(&path, "people"))
            .read(&mut Cursor::new(Vec::new()))
            .unwrap();
        assert_eq!(table.rows.len(), 4);
    }

    #[test]
    fn quoted_identifiers_allow_awkward_names() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("odd.db");
        let table = CommonTable::new(
            Some(vec!["select".to_owned(), "a \"b\"".to_owned()]),
            vec![vec![Some("1".to_owned()), Some("2".to_owned())]],
        );
        let mut sink = Vec::new();

        SqliteAdapter::new(config(&path, "order"))
            .write(&table, &mut sink)
            .unwrap();
        let read = SqliteAdapter::new(config(&path, "order"))
            .read(&mut Cursor::new(Vec::new()))
            .unwrap();
        assert_eq!(
            read.header,
            Some(vec!["select".to_owned(), "a \"b\"".to_owned()])
        );
    }

    #[test]
    fn missing_table_fails() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("empty.db");
        // Creates an empty database file
        Connection::open(&path).unwrap();

        let result = SqliteAdapter::new(config(&path, "nothing"))
            .read(&mut Cursor::new(Vec::new()));
        assert!(result.is_err());
    }

    #[test]
    fn config_requires_path() {
        assert!(SqliteConfig::from_options(&FormatOptions::new()).is_err());
    }

    #[test]
    fn table_name_defaults_to_file_stem() {
        let options = FormatOptions::new().set("path", "/tmp/people.db");
        let config = SqliteConfig::from_options(&options).unwrap();
        assert_eq!(config.table_name, "people");
    }
}
