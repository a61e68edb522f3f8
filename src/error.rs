use thiserror::Error;

/// Main error type for the polytab crate.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum PolytabError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    // Third-party library errors
    #[error("{0}")]
    CsvError(#[from] csv::Error),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    ColumnError(#[from] crate::helpers::columns::ColumnError),

    // Adapter module errors
    #[error("{0}")]
    OptionsError(#[from] crate::adapters::OptionsError),

    #[error("{0}")]
    RegistryError(#[from] crate::adapters::RegistryError),

    #[error("{0}")]
    SheetError(#[from] crate::adapters::xlsx::SheetError),

    // Table operation errors
    #[error("{0}")]
    OpsError(#[from] crate::ops::OpsError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, PolytabError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| PolytabError::WithContextError(format!("{}: {}", message, e)))
    }
}
