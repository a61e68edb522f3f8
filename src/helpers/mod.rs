//! Shared utilities: column resolution, cell coercion and formatting, and
//! the XML/ZIP plumbing used by the XLSX adapter.

pub mod columns;
pub mod format;
pub(crate) mod xml;
pub(crate) mod zip;
