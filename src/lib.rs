//! # Polytab
//!
//! A library of tabular-data utilities: read tables from one format, operate
//! on them in a common in-memory model, and write them back out in another.
//!
//! ## Features
//!
//! - **Common table model**: All formats converge on [`CommonTable`], an
//!   optional header plus string-typed rows with explicit nulls
//! - **Format adapters**: CSV (read/write), JSON (write), HTML (write),
//!   fixed-width text (write), XLSX (read) and SQLite (read/write)
//! - **Adapter registry**: Look adapters up by format name with per-format
//!   configuration passed as a flat option map
//! - **Table operations**: Keep or drop columns, aggregate columns with
//!   sum/mean/median, build summary tables, and convert between formats
//! - **Forgiving coercion**: Cells that fail numeric parsing coerce to zero,
//!   so aggregates never abort on messy data
//!
//! ## Example
//!
//! ```no_run
//! use polytab::{AdapterRegistry, FormatOptions};
//!
//! # fn main() -> Result<(), polytab::PolytabError> {
//! let registry = AdapterRegistry::builtin();
//! let mut reader = registry.reader("csv", &FormatOptions::new())?;
//! let mut writer = registry.writer("json", &FormatOptions::new().set("pretty", "true"))?;
//!
//! let mut input = std::io::stdin();
//! let mut output = std::io::stdout();
//! polytab::ops::convert(&mut input, reader.as_mut(), writer.as_mut(), &mut output)?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod error;
pub mod helpers;
pub mod ops;
pub mod table;

pub use crate::adapters::AdapterRegistry;
pub use crate::adapters::FormatOptions;
pub use crate::adapters::TableReader;
pub use crate::adapters::TableWriter;
pub use crate::error::PolytabError;
pub use crate::table::CommonTable;
pub use crate::table::Row;
