//! Tabular Parser
//!
//! Turns raw CSV text into ordered rows keyed by canonical (lowercased,
//! trimmed) header names. Structural problems abort the whole import.

use std::collections::{HashMap, HashSet};

use crate::config::ImportConfig;
use crate::error::{FieldOpsError, FieldOpsResult};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One data line of the input, header excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    /// 1-based position among the data rows.
    pub number: usize,
    pub values: HashMap<String, String>,
}

impl ParsedRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<ParsedRow>,
}

impl ParsedTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// Canonical form of a header cell.
pub fn canonical_column(header: &str) -> String {
    header.trim().to_lowercase()
}

#[derive(Clone, Copy, PartialEq)]
enum Scan {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// 1-based number of the first empty line after the first record, outside
/// quoted fields. Mirrors the quoting rules of the csv reader: a quote only
/// opens a quoted field at the start of that field.
fn interior_blank_line(content: &str) -> Option<usize> {
    let mut state = Scan::FieldStart;
    let mut line = 1;
    let mut seen_record = false;
    let mut blank = true;

    for c in content.chars() {
        state = match (state, c) {
            (Scan::Quoted, '"') => Scan::QuoteInQuoted,
            (Scan::Quoted, _) => {
                if c == '\n' {
                    line += 1;
                }
                Scan::Quoted
            }
            (_, '\n') => {
                if blank && seen_record {
                    return Some(line);
                }
                seen_record |= !blank;
                blank = true;
                line += 1;
                Scan::FieldStart
            }
            (_, '\r') => state,
            (Scan::FieldStart, '"') => {
                blank = false;
                Scan::Quoted
            }
            (Scan::QuoteInQuoted, '"') => Scan::Quoted,
            (_, ',') => {
                blank = false;
                Scan::FieldStart
            }
            _ => {
                blank = false;
                Scan::Unquoted
            }
        };
    }

    None
}

#[derive(Debug, Clone)]
pub struct TabularParser {
    max_content_bytes: usize,
    max_rows: usize,
}

impl Default for TabularParser {
    fn default() -> Self {
        Self::new(&ImportConfig::default())
    }
}

impl TabularParser {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            max_content_bytes: config.max_content_bytes,
            max_rows: config.max_rows,
        }
    }

    pub fn parse(&self, content: &str) -> FieldOpsResult<ParsedTable> {
        if content.len() > self.max_content_bytes {
            return Err(FieldOpsError::parse(format!(
                "content is {} bytes, the limit is {} bytes",
                content.len(),
                self.max_content_bytes
            )));
        }

        let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);
        // Trailing blank lines are not rows.
        let content = content.trim_end();
        if content.is_empty() {
            return Err(FieldOpsError::parse("missing header line"));
        }
        // The csv reader drops empty lines, which would shift every later row.
        if let Some(line) = interior_blank_line(content) {
            return Err(FieldOpsError::parse(format!(
                "line {} is empty, only trailing blank lines are allowed",
                line
            )));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(canonical_column).collect();

        let mut seen = HashSet::new();
        for header in headers.iter().filter(|h| !h.is_empty()) {
            if !seen.insert(header.as_str()) {
                return Err(FieldOpsError::parse(format!("duplicate column '{}'", header)));
            }
        }

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;

            if rows.len() == self.max_rows {
                return Err(FieldOpsError::parse(format!(
                    "file has more than {} rows",
                    self.max_rows
                )));
            }

            let values = headers
                .iter()
                .zip(record.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, value)| (header.clone(), value.to_string()))
                .collect();

            rows.push(ParsedRow {
                number: idx + 1,
                values,
            });
        }

        Ok(ParsedTable { headers, rows })
    }
}
