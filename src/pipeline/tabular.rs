//! Tabular codec: txt / csv / json / yaml / xlsx ⇄ [`TabularDocument`].
//!
//! Every tabular source decodes into the same ordered-record form, and every
//! tabular target encodes from it. Column order is first-seen order across
//! all records; row order is source order. A record that lacks a column is
//! encoded with a null in that position.
//!
//! Cell typing is conservative: CSV and plain-text cells stay strings (an
//! empty CSV field becomes null), JSON/YAML scalars keep their own type, and
//! XLSX numbers that are whole become integers.

use crate::format::Format;
use calamine::{Data, Reader, Xlsx};
use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};
use std::io::{Cursor, Write};
use thiserror::Error;

/// Column name used for line-oriented sources.
pub const LINE_COLUMN: &str = "line";

/// JSON output indentation.
const JSON_INDENT: &[u8] = b"    ";

static NULL_CELL: Cell = Cell::Null;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`, as JSON/YAML allow.
    UInt(u64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// The cell as a CSV/txt field. Null is the empty field.
    pub fn to_field(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::UInt(u) => u.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }

    fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Cell::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Cell::UInt(u)
                } else {
                    n.as_f64()
                        .map_or_else(|| Cell::Text(n.to_string()), Cell::Float)
                }
            }
            Value::String(s) => Cell::Text(s),
            nested @ (Value::Array(_) | Value::Object(_)) => Cell::Text(nested.to_string()),
        }
    }

    fn from_yaml(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Cell::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Cell::UInt(u)
                } else {
                    n.as_f64()
                        .map_or_else(|| Cell::Text(n.to_string()), Cell::Float)
                }
            }
            Value::String(s) => Cell::Text(s),
            Value::Tagged(tagged) => Cell::from_yaml(tagged.value),
            nested @ (Value::Sequence(_) | Value::Mapping(_)) => {
                Cell::Text(yaml_inline_text(&nested))
            }
        }
    }

    fn from_xlsx(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Null,
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => whole_number(*f).map_or(Cell::Float(*f), Cell::Int),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Float(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_unit(),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Int(i) => serializer.serialize_i64(*i),
            Cell::UInt(u) => serializer.serialize_u64(*u),
            // NaN and infinities have no JSON spelling.
            Cell::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Cell::Float(_) => serializer.serialize_unit(),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Exact integer value of `f`, if it has one that survives the round-trip.
fn whole_number(f: f64) -> Option<i64> {
    const LIMIT: f64 = 9_007_199_254_740_992.0; // 2^53
    (f.fract() == 0.0 && f.abs() < LIMIT).then_some(f as i64)
}

fn yaml_inline_text(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_default()
}

/// One row: column name → cell, in the order the source listed them.
pub type Record = IndexMap<String, Cell>;

/// Ordered list of records plus the union of their columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularDocument {
    columns: IndexSet<String>,
    records: Vec<Record>,
}

impl TabularDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document whose columns are fixed up front (header-row sources).
    pub fn with_columns<I: IntoIterator<Item = String>>(columns: I) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            records: Vec::new(),
        }
    }

    /// Append a record, registering any columns not seen before.
    pub fn push(&mut self, record: Record) {
        for key in record.keys() {
            if !self.columns.contains(key) {
                self.columns.insert(key.clone());
            }
        }
        self.records.push(record);
    }

    pub fn columns(&self) -> impl ExactSizeIterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cell at (`row`, `column`); null when the record lacks the column.
    pub fn cell(&self, row: usize, column: &str) -> &Cell {
        self.records
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL_CELL)
    }

    /// Every record widened to the full column set, in column order.
    fn filled_rows(&self) -> Vec<IndexMap<&str, &Cell>> {
        self.records
            .iter()
            .map(|record| {
                self.columns
                    .iter()
                    .map(|c| (c.as_str(), record.get(c).unwrap_or(&NULL_CELL)))
                    .collect()
            })
            .collect()
    }
}

/// Failure inside the tabular codec. The dispatcher attaches path and
/// direction (decode vs. encode).
#[derive(Debug, Error)]
pub enum TabularError {
    #[error("not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The data parsed but does not have the record-list shape.
    #[error("{0}")]
    Shape(String),

    #[error("{0} is not a tabular format")]
    NotTabular(&'static str),
}

// ── Decode ───────────────────────────────────────────────────────────────

/// Decode raw file bytes of `format` into a [`TabularDocument`].
pub fn decode(bytes: &[u8], format: Format) -> Result<TabularDocument, TabularError> {
    match format {
        Format::Txt => decode_lines(bytes),
        Format::Csv => decode_csv(bytes),
        Format::Json => decode_json(bytes),
        Format::Yaml => decode_yaml(bytes),
        Format::Xlsx => decode_xlsx(bytes),
        other => Err(TabularError::NotTabular(other.name())),
    }
}

fn decode_lines(bytes: &[u8]) -> Result<TabularDocument, TabularError> {
    let text = std::str::from_utf8(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut doc = TabularDocument::with_columns([LINE_COLUMN.to_string()]);
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let mut record = Record::with_capacity(1);
        record.insert(LINE_COLUMN.to_string(), Cell::Text(line.to_string()));
        doc.push(record);
    }
    Ok(doc)
}

fn decode_csv(bytes: &[u8]) -> Result<TabularDocument, TabularError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let header = reader.headers()?.clone();
    if header.is_empty() {
        // Nothing but blank lines: what encoding an empty document writes.
        return Ok(TabularDocument::new());
    }
    let columns = unique_columns(header.iter().map(str::to_string));
    let mut doc = TabularDocument::with_columns(columns.iter().cloned());

    for (i, row) in reader.records().enumerate() {
        let row = row?;
        if row.len() > columns.len() {
            return Err(TabularError::Shape(format!(
                "line {}: expected {} fields, saw {}",
                i + 2,
                columns.len(),
                row.len()
            )));
        }
        let record = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let cell = match row.get(idx) {
                    None | Some("") => Cell::Null,
                    Some(v) => Cell::Text(v.to_string()),
                };
                (name.clone(), cell)
            })
            .collect();
        doc.push(record);
    }
    Ok(doc)
}

fn decode_json(bytes: &[u8]) -> Result<TabularDocument, TabularError> {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let serde_json::Value::Array(items) = value else {
        return Err(TabularError::Shape(
            "expected a list of records at the top level".into(),
        ));
    };

    let mut doc = TabularDocument::new();
    for (i, item) in items.into_iter().enumerate() {
        let serde_json::Value::Object(map) = item else {
            return Err(TabularError::Shape(format!("item {i} is not an object")));
        };
        doc.push(map.into_iter().map(|(k, v)| (k, Cell::from_json(v))).collect());
    }
    Ok(doc)
}

fn decode_yaml(bytes: &[u8]) -> Result<TabularDocument, TabularError> {
    let value: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
    let serde_yaml::Value::Sequence(items) = value else {
        return Err(TabularError::Shape(
            "expected a list of records at the top level".into(),
        ));
    };

    let mut doc = TabularDocument::new();
    for (i, item) in items.into_iter().enumerate() {
        let serde_yaml::Value::Mapping(map) = item else {
            return Err(TabularError::Shape(format!("item {i} is not a mapping")));
        };
        doc.push(
            map.into_iter()
                .map(|(k, v)| (yaml_key(k), Cell::from_yaml(v)))
                .collect(),
        );
    }
    Ok(doc)
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        other => Cell::from_yaml(other).to_field(),
    }
}

fn decode_xlsx(bytes: &[u8]) -> Result<TabularDocument, TabularError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TabularError::Shape("workbook has no sheets".into()))??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(TabularDocument::new());
    };
    let columns = unique_columns(header.iter().map(|c| Cell::from_xlsx(c).to_field()));
    let mut doc = TabularDocument::with_columns(columns.iter().cloned());

    for row in rows {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let record = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let cell = row.get(idx).map_or(Cell::Null, Cell::from_xlsx);
                (name.clone(), cell)
            })
            .collect();
        doc.push(record);
    }
    Ok(doc)
}

/// Make header names unique: blanks become `Unnamed: <i>`, repeats get a
/// `.1`, `.2`, … suffix.
fn unique_columns<I: IntoIterator<Item = String>>(names: I) -> Vec<String> {
    let mut seen: IndexSet<String> = IndexSet::new();
    for (i, name) in names.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{n}");
            n += 1;
        }
        seen.insert(candidate);
    }
    seen.into_iter().collect()
}

// ── Encode ───────────────────────────────────────────────────────────────

/// Encode `doc` as `format` into `out`.
pub fn encode<W: Write>(
    doc: &TabularDocument,
    format: Format,
    out: &mut W,
) -> Result<(), TabularError> {
    match format {
        // Headerless comma-joined rows: column names are dropped.
        Format::Txt => encode_delimited(doc, out, false),
        Format::Csv => encode_delimited(doc, out, true),
        Format::Json => encode_json(doc, out),
        Format::Yaml => encode_yaml(doc, out),
        other => Err(TabularError::NotTabular(other.name())),
    }
}

fn encode_delimited<W: Write>(
    doc: &TabularDocument,
    out: &mut W,
    header: bool,
) -> Result<(), TabularError> {
    if doc.columns.is_empty() {
        if doc.records.is_empty() {
            return Ok(());
        }
        return Err(TabularError::Shape(format!(
            "{} records have no fields to write as delimited text",
            doc.records.len()
        )));
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(&mut *out);

    if header {
        writer.write_record(doc.columns())?;
    }
    for record in &doc.records {
        writer.write_record(
            doc.columns
                .iter()
                .map(|c| record.get(c).unwrap_or(&NULL_CELL).to_field()),
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn encode_json<W: Write>(doc: &TabularDocument, out: &mut W) -> Result<(), TabularError> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut *out, formatter);
    doc.filled_rows().serialize(&mut serializer)?;
    out.write_all(b"\n")?;
    Ok(())
}

fn encode_yaml<W: Write>(doc: &TabularDocument, out: &mut W) -> Result<(), TabularError> {
    serde_yaml::to_writer(&mut *out, &doc.filled_rows())?;
    Ok(())
}
