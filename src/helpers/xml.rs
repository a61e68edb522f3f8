//! XML parsing utilities for the XLSX adapter: a reader wrapper tuned for
//! spreadsheet payloads plus helper traits for attribute and text handling.

use crate::error::PolytabError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// Errors specific to XML parsing operations.
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Parse entity '{0}' failed")]
    ParseEntityError(String),

    #[error("Parse attribute value '{0}' failed")]
    ParseAttributeValueError(String),
}

/// XML reader wrapper with a reusable buffer and configuration suited to
/// worksheet XML (empty elements expanded so every cell yields a start event).
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        let buffer = Vec::with_capacity(1024);
        XmlReader { reader, buffer }
    }

    /// Reads the next XML event, returning `None` at end of input.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, PolytabError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(PolytabError::XmlError(error)),
        }
    }
}

/// Attribute access helpers for XML start tags.
pub(crate) trait XmlNodeHelper<'a> {
    /// Gets an unescaped attribute value by name.
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, PolytabError>;

    /// Parses an attribute value to the specified type.
    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, PolytabError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, PolytabError> {
        self.try_get_attribute(name)?
            .map(|attribute| Ok(attribute.unescape_value()?))
            .transpose()
    }

    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, PolytabError> {
        self.try_get_attribute(name)?
            .map(|attribute| parse_attribute(&attribute))
            .transpose()
    }
}

fn parse_attribute<T: FromStr>(attribute: &Attribute<'_>) -> Result<T, PolytabError> {
    attribute
        .unescape_value()?
        .parse()
        .map_err(|_| match str::from_utf8(&attribute.value) {
            Ok(value) => {
                PolytabError::XmlHelperError(XmlError::ParseAttributeValueError(value.to_string()))
            }
            Err(error) => PolytabError::StringEncodingError(error),
        })
}

/// Text accumulation helper for entity and character references, which
/// arrive as separate events because text is not auto-unescaped.
pub(crate) trait XmlTextHelper {
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), PolytabError>;
}

impl XmlTextHelper for String {
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), PolytabError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = if let Some(hex) = number.strip_prefix('x') {
                u32::from_str_radix(hex, 16)?
            } else {
                u32::from_str_radix(number, 10)?
            };
            if let Some(character) = std::char::from_u32(code) {
                self.push_str(character.encode_utf8(&mut [0u8; 4]));
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::ParseEntityError(raw.to_string()))?;
        }

        Ok(())
    }
}

#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}
