use std::borrow::Cow;
use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord};
use encoding_rs::WINDOWS_1252;
use log::debug;

use crate::fields::{Row, normalize_header};

/// Decode raw source bytes: UTF-8 when valid (BOM stripped), Windows-1252
/// otherwise. Older extracts were exported from spreadsheet tools in that
/// code page.
pub fn decode_source(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => WINDOWS_1252.decode_without_bom_handling(bytes).0,
    }
}

/// Pick the field delimiter from the header line: the most frequent of
/// `,` `;` and tab outside quotes, `,` when none appears.
pub fn sniff_delimiter(text: &str) -> u8 {
    let mut counts = [(b',', 0usize), (b';', 0), (b'\t', 0)];
    let mut quoted = false;
    for b in text.bytes() {
        match b {
            b'"' => quoted = !quoted,
            b'\n' | b'\r' if !quoted => break,
            _ if !quoted => {
                if let Some(slot) = counts.iter_mut().find(|(d, _)| *d == b) {
                    slot.1 += 1;
                }
            }
            _ => {}
        }
    }
    // max_by_key keeps the last maximum; iterate reversed so ties favour ','.
    counts
        .iter()
        .rev()
        .max_by_key(|(_, n)| *n)
        .filter(|(_, n)| *n > 0)
        .map_or(b',', |(d, _)| *d)
}

/// Header name → column position, first occurrence wins.
#[derive(Clone, Debug, Default)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(headers: &StringRecord) -> Self {
        let mut positions = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            positions.entry(normalize_header(h)).or_insert(i);
        }
        HeaderIndex { positions }
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// One data row of a [`Table`].
#[derive(Clone, Copy, Debug)]
pub struct RecordRow<'a> {
    headers: &'a HeaderIndex,
    record: &'a StringRecord,
}

impl Row for RecordRow<'_> {
    fn field(&self, column: &str) -> Option<&str> {
        let i = self.headers.position(column)?;
        self.record
            .get(i)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// A parsed CSV source: header index plus the non-blank data records in
/// source order. Records the reader cannot parse are left out.
#[derive(Clone, Debug, Default)]
pub struct Table {
    headers: HeaderIndex,
    raw_headers: StringRecord,
    records: Vec<StringRecord>,
}

impl Table {
    /// Decode and parse `bytes`. Only an unreadable header row is an error.
    pub fn parse(bytes: &[u8]) -> Result<Table, csv::Error> {
        let text = decode_source(bytes);
        Table::parse_str(&text)
    }

    pub fn parse_str(text: &str) -> Result<Table, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .delimiter(sniff_delimiter(text))
            .flexible(true)
            .has_headers(true)
            .from_reader(text.as_bytes());
        let raw_headers = reader.headers()?.clone();
        let headers = HeaderIndex::new(&raw_headers);

        let mut records = Vec::new();
        let mut malformed = 0usize;
        for result in reader.records() {
            match result {
                Ok(record) if record.iter().any(|f| !f.trim().is_empty()) => records.push(record),
                Ok(_) => {}
                Err(e) => {
                    malformed += 1;
                    debug!("skipping malformed CSV record: {e}");
                }
            }
        }
        if malformed > 0 {
            debug!("{malformed} malformed records skipped");
        }
        Ok(Table {
            headers,
            raw_headers,
            records,
        })
    }

    /// Header names as written in the source.
    pub fn header_names(&self) -> impl Iterator<Item = &str> {
        self.raw_headers.iter()
    }

    pub fn records(&self) -> &[StringRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = RecordRow<'_>> {
        self.records.iter().map(|record| RecordRow {
            headers: &self.headers,
            record,
        })
    }
}
