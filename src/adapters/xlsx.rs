//! XLSX adapter (read-only): opens the file as a ZIP archive, resolves the
//! target worksheet through the workbook relationships, and decodes cells
//! against the shared-string and cell-style tables.
//!
//! Only basic cell types are decoded: shared strings, inline strings, the
//! built-in date number format (id 14, days since 1900-01-01) and raw text.

use crate::adapters::FormatOptions;
use crate::adapters::TableReader;
use crate::error::PolytabError;
use crate::error::ResultMessage;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::table::generic_header;
use crate::table::CommonTable;
use crate::table::Row;
use chrono::Duration;
use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::name::QName;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use thiserror::Error;
use zip::read::ZipFile;
use zip::ZipArchive;

// XML tag names for parsing the XLSX format
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition in workbook.xml
const TAG_DIMENSION: QName = QName(b"dimension");     // Worksheet bounding range
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_VALUE: QName = QName(b"v");                 // Cell value content
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_RELATIONSHIP: &[u8] = b"Relationship";      // Workbook relationship entry

/// numFmtId of the one built-in date format this adapter decodes
const DATE_FORMAT_ID: &str = "14";

type Archive = ZipArchive<Cursor<Vec<u8>>>;
type MemberReader<'a> = XmlReader<BufReader<ZipFile<'a, Cursor<Vec<u8>>>>>;

/// Errors raised while decoding an XLSX workbook.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Sheet {kind} '{selector}' is not in workbook. Please select one of the following: {options}")]
    InvalidSheet {
        kind: &'static str,
        selector: String,
        options: String,
    },

    #[error("Missing '{0}' in workbook archive")]
    MissingPart(String),

    #[error("Invalid worksheet dimension '{0}'")]
    InvalidDimension(String),

    #[error("Shared string index {0} out of range")]
    InvalidSharedString(usize),
}

/// XLSX adapter configuration with documented defaults.
#[derive(Clone, Debug)]
pub struct XlsxConfig {
    /// Target worksheet by name; takes precedence over `sheet_index`
    pub sheet_name: Option<String>,
    /// Target worksheet by 1-based index, default 1
    pub sheet_index: usize,
    /// Explicit bounding range (e.g. "A1:D10"); default from the worksheet
    pub dimension: Option<String>,
    /// Whether the first parsed row becomes the header, default true
    pub has_header: bool,
    /// First source row to include (0-based, inclusive)
    pub start_row: Option<usize>,
    /// Last source row to include (0-based, inclusive)
    pub end_row: Option<usize>,
}

impl Default for XlsxConfig {
    fn default() -> Self {
        XlsxConfig {
            sheet_name: None,
            sheet_index: 1,
            dimension: None,
            has_header: true,
            start_row: None,
            end_row: None,
        }
    }
}

impl XlsxConfig {
    /// Builds the configuration from the flat option map. Recognized keys:
    /// `sheet_name`, `sheet_index`, `dimension`, `has_header`, `start_row`, `end_row`.
    pub fn from_options(options: &FormatOptions) -> Result<Self, PolytabError> {
        let defaults = Self::default();
        Ok(XlsxConfig {
            sheet_name: options.get("sheet_name").map(str::to_owned),
            sheet_index: options.get_usize("sheet_index")?.unwrap_or(defaults.sheet_index),
            dimension: options.get("dimension").map(str::to_owned),
            has_header: options.get_bool("has_header")?.unwrap_or(defaults.has_header),
            start_row: options.get_usize("start_row")?,
            end_row: options.get_usize("end_row")?,
        })
    }
}

/// How a cell's stored value translates to its display value.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
enum CellKind {
    #[default]
    Raw,
    SharedString,
    InlineString,
    Date,
}

/// Reads one worksheet of an XLSX workbook into a table.
pub struct XlsxAdapter {
    config: XlsxConfig,
}

impl XlsxAdapter {
    pub fn new(config: XlsxConfig) -> Self {
        XlsxAdapter { config }
    }

    /// Checks a 0-based source row index against the configured row range.
    fn in_range(&self, index: usize) -> bool {
        let after_start = self.config.start_row.map(|start| start <= index).unwrap_or(true);
        let before_end = self.config.end_row.map(|end| index <= end).unwrap_or(true);
        after_start && before_end
    }

    /// Resolves the target worksheet to its path within the archive,
    /// preferring the configured name over the 1-based index.
    fn resolve_sheet(&self, zip: &mut Archive) -> Result<String, PolytabError> {
        let relationships = load_relationships(zip)?;
        let mut reader = zip
            .xml_reader("xl/workbook.xml")?
            .ok_or_else(|| SheetError::MissingPart("xl/workbook.xml".to_owned()))?;

        let mut sheets = Vec::<(String, Option<String>)>::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHEET => {
                let mut name = None::<Cow<str>>;
                let mut id = None::<Cow<str>>;
                for result in event.attributes() {
                    let attribute = result?;
                    let key = attribute.key.local_name();
                    if key.as_ref() == b"name" {
                        name = Some(attribute.unescape_value()?);
                    } else if key.as_ref() == b"id" {
                        id = Some(attribute.unescape_value()?);
                    }
                }
                if let Some(name) = name {
                    sheets.push((name.to_string(), id.map(|id| id.to_string())));
                }
            }
        });

        let position = match &self.config.sheet_name {
            Some(name) => sheets
                .iter()
                .position(|(sheet_name, _)| sheet_name == name)
                .ok_or_else(|| SheetError::InvalidSheet {
                    kind: "name",
                    selector: name.to_owned(),
                    options: sheets
                        .iter()
                        .map(|(sheet_name, _)| sheet_name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                })?,
            None => {
                let index = self.config.sheet_index;
                if index == 0 || sheets.len() < index {
                    return Err(SheetError::InvalidSheet {
                        kind: "index",
                        selector: index.to_string(),
                        options: (1..=sheets.len())
                            .map(|option| option.to_string())
                            .collect::<Vec<_>>()
                            .join(", "),
                    }
                    .into());
                }
                index - 1
            }
        };

        let path = sheets[position]
            .1
            .as_ref()
            .and_then(|id| relationships.get(id).cloned())
            .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", position + 1));
        Ok(path)
    }

    /// Walks the worksheet XML, inserting null placeholders for skipped
    /// columns and padding every row to the dimension width.
    fn read_worksheet(
        &self,
        zip: &mut Archive,
        path: &str,
        shared_strings: &[String],
        number_formats: &[String],
    ) -> Result<Vec<Row>, PolytabError> {
        let mut reader = zip
            .xml_reader(path)?
            .ok_or_else(|| SheetError::MissingPart(path.to_owned()))?;

        let mut width = self
            .config
            .dimension
            .as_deref()
            .map(dimension_width)
            .transpose()?;
        let mut rows = Vec::<Row>::new();
        let mut record = Row::new();
        let mut row_count = 0usize;
        let mut in_row = false;
        let mut in_value = false;
        let mut in_inline_text = false;
        let mut kind = CellKind::default();
        let mut value = None::<String>;

        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_DIMENSION => {
                if width.is_none() {
                    if let Some(reference) = event.get_attribute_value("ref")? {
                        width = Some(dimension_width(&reference)?);
                    }
                }
            }
            Event::Start(event) if event.name() == TAG_ROW => {
                let index = event.parse_attribute_value::<usize>("r")?
                    .map(|number| number.saturating_sub(1))
                    .unwrap_or(row_count);
                row_count = index + 1;
                in_row = self.in_range(index);
                record.clear();
            }
            Event::End(event) if in_row && event.name() == TAG_ROW => {
                if let Some(width) = width {
                    while record.len() < width {
                        record.push(None);
                    }
                }
                rows.push(std::mem::take(&mut record));
                in_row = false;
            }
            Event::Start(event) if in_row && event.name() == TAG_CELL => {
                let column = event.get_attribute_value("r")?
                    .and_then(|reference| reference_column(&reference))
                    .unwrap_or(record.len());
                while record.len() < column {
                    record.push(None);
                }
                kind = match event.get_attribute_value("t")?.as_deref() {
                    Some("s") => CellKind::SharedString,
                    Some("inlineStr") => CellKind::InlineString,
                    _ => match event.get_attribute_value("s")? {
                        Some(style) if !style.is_empty() => {
                            let index = style.parse::<usize>()?;
                            if number_formats.get(index).map(String::as_str) == Some(DATE_FORMAT_ID) {
                                CellKind::Date
                            } else {
                                CellKind::Raw
                            }
                        }
                        _ => CellKind::Raw,
                    },
                };
                value = None;
            }
            Event::End(event) if in_row && event.name() == TAG_CELL => {
                if let Some(raw) = value.take() {
                    record.push(Some(decode_cell(kind, &raw, shared_strings)?));
                }
                kind = CellKind::default();
            }
            Event::Start(event) if in_row && event.name() == TAG_VALUE => in_value = true,
            Event::End(event) if event.name() == TAG_VALUE => in_value = false,
            Event::Start(event) if kind == CellKind::InlineString && event.name() == TAG_TEXT => {
                in_inline_text = true;
            }
            Event::End(event) if in_inline_text && event.name() == TAG_TEXT => in_inline_text = false,
            Event::Text(event) if in_value || in_inline_text => {
                value.get_or_insert_with(String::new).push_str(&event.xml_content()?);
            }
            Event::CData(event) if in_value || in_inline_text => {
                value.get_or_insert_with(String::new).push_str(&event.xml_content()?);
            }
            Event::GeneralRef(event) if in_value || in_inline_text => {
                value.get_or_insert_with(String::new).push_bytes_ref(&event)?;
            }
        });

        Ok(rows)
    }
}

impl TableReader for XlsxAdapter {
    fn read(&mut self, input: &mut dyn Read) -> Result<CommonTable, PolytabError> {
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer)?;
        let mut zip = ZipArchive::new(Cursor::new(buffer))?;

        let shared_strings = load_shared_strings(&mut zip)?;
        let number_formats = load_number_formats(&mut zip)?;
        let path = self.resolve_sheet(&mut zip)?;
        let mut records = self
            .read_worksheet(&mut zip, &path, &shared_strings, &number_formats)
            .with_prefix(&path)?;

        let header = if records.is_empty() {
            None
        } else if self.config.has_header {
            let first = records.remove(0);
            Some(
                first
                    .into_iter()
                    .enumerate()
                    .map(|(index, cell)| cell.unwrap_or_else(|| format!("col{index}")))
                    .collect(),
            )
        } else {
            Some(generic_header(records[0].len()))
        };

        Ok(CommonTable::new(header, records))
    }
}

/// Loads the shared string table, stored once per workbook and referenced
/// by index from string-typed cells. Missing table means no shared strings.
fn load_shared_strings(zip: &mut Archive) -> Result<Vec<String>, PolytabError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM)?;
            shared_strings.push(string);
        }
    });
    Ok(shared_strings)
}

/// Loads the cell-style table from styles.xml: one numFmtId per `cellXfs`
/// entry, indexed by a cell's style attribute.
fn load_number_formats(zip: &mut Archive) -> Result<Vec<String>, PolytabError> {
    let mut format_indexes = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(format_indexes),
    };

    let mut context = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => break,
        Event::Start(event) if context && event.name() == TAG_FORMAT_INDEX => {
            if let Some(id) = event.get_attribute_value("numFmtId")? {
                format_indexes.push(id.to_string());
            }
        }
    });
    Ok(format_indexes)
}

/// Loads workbook relationships mapping relationship ids to worksheet paths.
fn load_relationships(zip: &mut Archive) -> Result<HashMap<String, String>, PolytabError> {
    let mut relationships = HashMap::<String, String>::new();
    let mut reader = match zip.xml_reader("xl/_rels/workbook.xml.rels")? {
        Some(reader) => reader,
        None => return Ok(relationships),
    };

    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            // Only worksheet relationships matter here
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Normalizes a relationship target to a path within the archive.
fn to_zip_path(path: Cow<'_, str>) -> String {
    if path.starts_with("/xl/") {
        path[1..].to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Reads string content up to `end_tag`, collecting text inside `t` elements
/// and skipping phonetic annotations.
fn read_string_value(reader: &mut MemberReader<'_>, end_tag: QName) -> Result<String, PolytabError> {
    let mut is_phonetic_text = false;
    let mut is_text = false;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

/// Decodes a cell's stored value into its display value.
fn decode_cell(kind: CellKind, raw: &str, shared_strings: &[String]) -> Result<String, PolytabError> {
    match kind {
        CellKind::SharedString => {
            let index = raw.trim().parse::<usize>()?;
            shared_strings
                .get(index)
                .cloned()
                .ok_or_else(|| SheetError::InvalidSharedString(index).into())
        }
        CellKind::Date => {
            let days = raw.trim().parse::<f64>()?.trunc() as i64;
            let epoch = NaiveDate::from_ymd_opt(1900, 1, 1).expect("NaiveDate literal");
            let date = epoch + Duration::days(days);
            Ok(date.format("%m/%d/%Y").to_string())
        }
        CellKind::InlineString | CellKind::Raw => Ok(raw.to_owned()),
    }
}

/// Converts a cell reference's column letters to a 0-based column index.
fn reference_column(reference: &str) -> Option<usize> {
    let letters = reference
        .chars()
        .take_while(|character| character.is_ascii_alphabetic());
    let mut number = 0usize;
    let mut empty = true;
    for character in letters {
        number = number * 26 + (character.to_ascii_uppercase() as usize - 'A' as usize + 1);
        empty = false;
    }
    if empty {
        None
    } else {
        Some(number - 1)
    }
}

/// Number of columns covered by a dimension string such as "A1:D10".
fn dimension_width(dimension: &str) -> Result<usize, PolytabError> {
    let pattern = Regex::new(r"^([A-Z]+\d+)(:([A-Z]+\d+))?$").expect("Hardcode regex pattern");
    let dimension = dimension.to_ascii_uppercase();
    let captures = pattern
        .captures(&dimension)
        .ok_or_else(|| SheetError::InvalidDimension(dimension.to_owned()))?;
    let end = captures
        .get(3)
        .or_else(|| captures.get(1))
        .map(|matcher| matcher.as_str())
        .expect("Group 1 always matches");
    reference_column(end)
        .map(|column| column + 1)
        .ok_or_else(|| SheetError::InvalidDimension(dimension.to_owned()).into())
}

pub(super) fn reader_factory(
    options: &FormatOptions,
) -> Result<Box<dyn TableReader>, PolytabError> {
    Ok(Box::new(XlsxAdapter::new(XlsxConfig::from_options(options)?)))
}
