//! Flat delimited tables: per-segment phoneme tables and per-file results.
//!
//! | Table    | Header                         | Row granularity |
//! |----------|--------------------------------|-----------------|
//! | segments | `file,start,end,dur,phoneme`   | one segment     |
//! | results  | `file,vtv,pv`                  | one utterance   |
//!
//! Columns are located by header name, so extra columns (e.g. an unnamed
//! pandas index) are ignored.  Reference tables may carry a `cv` column
//! (`V` / `C` / anything else) instead of `phoneme`, may omit `dur`, and may
//! write times as timedeltas (`0 days 00:00:01.500000`).

use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::phoneme::{Classifier, PhonemeClass, PhonemeSegment, Segment, Utterance};
use crate::rhythm::UtteranceMetrics;

pub const SEGMENT_COLUMNS: [&str; 5] = ["file", "start", "end", "dur", "phoneme"];
pub const RESULT_COLUMNS: [&str; 3] = ["file", "vtv", "pv"];

const DELIMITER: char = ',';

// ---------------------------------------------------------------------------
// TableError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table has no header row")]
    MissingHeader,

    #[error("required column `{0}` not found in header")]
    MissingColumn(&'static str),

    #[error("line {line}: invalid value {value:?} in column `{column}`")]
    BadValue {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// What a segment row says about its symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentLabel {
    /// Recognized phonetic symbol, classified on demand.
    Phoneme(String),
    /// Class given directly by an annotated reference table.
    Class(PhonemeClass),
}

/// One row of a segment table.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRecord {
    pub file: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub label: SegmentLabel,
}

impl SegmentRecord {
    pub fn from_segment(file: impl Into<String>, segment: &Segment) -> Self {
        Self {
            file: file.into(),
            start: segment.start,
            end: segment.end,
            duration: segment.duration,
            label: SegmentLabel::Phoneme(segment.symbol.clone()),
        }
    }

    pub fn symbol(&self) -> &str {
        match &self.label {
            SegmentLabel::Phoneme(s) => s,
            SegmentLabel::Class(c) => c.label(),
        }
    }

    pub fn to_segment(&self) -> Segment {
        Segment {
            symbol: self.symbol().to_string(),
            start: self.start,
            end: self.end,
            duration: self.duration,
        }
    }

    pub fn classify(&self, classifier: &Classifier) -> PhonemeSegment {
        match &self.label {
            SegmentLabel::Phoneme(_) => classifier.annotate(self.to_segment()),
            SegmentLabel::Class(class) => PhonemeSegment::from_segment(self.to_segment(), *class),
        }
    }
}

// ---------------------------------------------------------------------------
// SegmentTable
// ---------------------------------------------------------------------------

/// Ordered segment rows, possibly spanning many files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentTable {
    records: Vec<SegmentRecord>,
}

impl SegmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding one utterance's segments.
    pub fn from_segments(file: &str, segments: &[Segment]) -> Self {
        let mut table = Self::new();
        table.push_segments(file, segments);
        table
    }

    pub fn push_segments(&mut self, file: &str, segments: &[Segment]) {
        self.records
            .extend(segments.iter().map(|s| SegmentRecord::from_segment(file, s)));
    }

    /// Append all rows of `other`.
    pub fn extend(&mut self, other: SegmentTable) {
        self.records.extend(other.records);
    }

    /// Attribute every row to `file`.
    pub fn relabel(&mut self, file: &str) {
        for rec in &mut self.records {
            if rec.file != file {
                rec.file = file.to_string();
            }
        }
    }

    pub fn records(&self) -> &[SegmentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unclassified segments, in row order.
    pub fn segments(&self) -> Vec<Segment> {
        self.records.iter().map(SegmentRecord::to_segment).collect()
    }

    /// Distinct file names in order of first appearance.
    pub fn files(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.file.as_str()))
            .map(|r| r.file.clone())
            .collect()
    }

    /// Rows grouped per file, files in order of first appearance and rows
    /// in table order within each file.
    pub fn group_by_file(&self) -> Vec<(String, Vec<&SegmentRecord>)> {
        let mut groups: Vec<(String, Vec<&SegmentRecord>)> = Vec::new();
        let mut index = std::collections::HashMap::new();
        for rec in &self.records {
            let slot = *index.entry(rec.file.as_str()).or_insert_with(|| {
                groups.push((rec.file.clone(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(rec);
        }
        groups
    }

    /// One classified [`Utterance`] per file.
    pub fn utterances(&self, classifier: &Classifier) -> Vec<(String, Utterance)> {
        self.group_by_file()
            .into_iter()
            .map(|(file, recs)| {
                let segs: Vec<PhonemeSegment> =
                    recs.iter().map(|r| r.classify(classifier)).collect();
                (file, Utterance::new(segs))
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn read_from(path: &Path) -> Result<Self, TableError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, TableError> {
        let mut rows = Rows::new(text);
        let header = rows.header()?;

        let file_col = column(&header, "file")?;
        let start_col = column(&header, "start")?;
        let end_col = column(&header, "end")?;
        let dur_col = header.iter().position(|h| h == "dur");
        let phoneme_col = header.iter().position(|h| h == "phoneme");
        let cv_col = header.iter().position(|h| h == "cv");
        if phoneme_col.is_none() && cv_col.is_none() {
            return Err(TableError::MissingColumn("phoneme"));
        }

        let mut records = Vec::new();
        while let Some((line, fields)) = rows.next_row()? {
            let cell = |i: usize| fields.get(i).map(String::as_str).unwrap_or("");

            let start = seconds(cell(start_col), line, "start")?;
            let end = seconds(cell(end_col), line, "end")?;
            let duration = match dur_col.map(cell).filter(|v| !v.trim().is_empty()) {
                Some(v) => seconds(v, line, "dur")?,
                None => end - start,
            };
            let label = match phoneme_col {
                Some(i) => SegmentLabel::Phoneme(cell(i).to_string()),
                None => SegmentLabel::Class(PhonemeClass::from_label(cell(cv_col.unwrap_or(0)))),
            };

            records.push(SegmentRecord {
                file: cell(file_col).to_string(),
                start,
                end,
                duration,
                label,
            });
        }

        Ok(Self { records })
    }

    pub fn write_to(&self, path: &Path) -> Result<(), TableError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.write(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Always writes the `phoneme` layout; class-only rows carry their
    /// class label as the symbol.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), TableError> {
        writeln!(w, "{}", SEGMENT_COLUMNS.join(","))?;
        for r in &self.records {
            writeln!(
                w,
                "{},{},{},{},{}",
                quote(&r.file),
                r.start,
                r.end,
                r.duration,
                quote(r.symbol())
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Result tables
// ---------------------------------------------------------------------------

pub fn write_results(path: &Path, rows: &[UtteranceMetrics]) -> Result<(), TableError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_results_to(&mut out, rows)?;
    out.flush()?;
    Ok(())
}

pub fn write_results_to<W: Write>(w: &mut W, rows: &[UtteranceMetrics]) -> Result<(), TableError> {
    writeln!(w, "{}", RESULT_COLUMNS.join(","))?;
    for r in rows {
        writeln!(w, "{},{},{}", quote(&r.file), r.vtv, r.pv)?;
    }
    Ok(())
}

pub fn read_results(path: &Path) -> Result<Vec<UtteranceMetrics>, TableError> {
    let text = std::fs::read_to_string(path)?;
    parse_results(&text)
}

pub fn parse_results(text: &str) -> Result<Vec<UtteranceMetrics>, TableError> {
    let mut rows = Rows::new(text);
    let header = rows.header()?;
    let file_col = column(&header, "file")?;
    let vtv_col = column(&header, "vtv")?;
    let pv_col = column(&header, "pv")?;

    let mut out = Vec::new();
    while let Some((line, fields)) = rows.next_row()? {
        let cell = |i: usize| fields.get(i).map(String::as_str).unwrap_or("");
        out.push(UtteranceMetrics {
            file: cell(file_col).to_string(),
            vtv: number(cell(vtv_col), line, "vtv")?,
            pv: number(cell(pv_col), line, "pv")?,
        });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Field codec
// ---------------------------------------------------------------------------

struct Rows<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Rows<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
        }
    }

    fn header(&mut self) -> Result<Vec<String>, TableError> {
        let (_, fields) = self.next_row()?.ok_or(TableError::MissingHeader)?;
        Ok(fields
            .into_iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect())
    }

    /// Next non-blank row with its 1-based line number.
    fn next_row(&mut self) -> Result<Option<(usize, Vec<String>)>, TableError> {
        for (i, raw) in self.lines.by_ref() {
            let raw = raw.trim_end_matches('\r');
            if raw.trim().is_empty() {
                continue;
            }
            let line = i + 1;
            return split_fields(raw)
                .map(|f| Some((line, f)))
                .ok_or(TableError::UnterminatedQuote { line });
        }
        Ok(None)
    }
}

/// Split one delimited line, honouring `"`-quoted fields with `""` escapes.
fn split_fields(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => in_quotes = false,
            ('"', false) if field.is_empty() => in_quotes = true,
            (DELIMITER, false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(field);
    Some(fields)
}

fn quote(field: &str) -> Cow<'_, str> {
    if field.contains([DELIMITER, '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn column(header: &[String], name: &'static str) -> Result<usize, TableError> {
    header
        .iter()
        .position(|h| h == name)
        .ok_or(TableError::MissingColumn(name))
}

fn number(value: &str, line: usize, column: &'static str) -> Result<f64, TableError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TableError::BadValue {
            line,
            column,
            value: value.to_string(),
        })
}

fn seconds(value: &str, line: usize, column: &'static str) -> Result<f64, TableError> {
    parse_seconds(value).ok_or_else(|| TableError::BadValue {
        line,
        column,
        value: value.to_string(),
    })
}

/// Plain seconds (`1.5`) or a timedelta (`0 days 00:00:01.500000`,
/// `00:00:01.5`).
pub fn parse_seconds(value: &str) -> Option<f64> {
    let value = value.trim();
    if let Ok(v) = value.parse::<f64>() {
        return v.is_finite().then_some(v);
    }

    let (days, clock) = match value.split_once(" days ").or_else(|| value.split_once(" day ")) {
        Some((d, c)) => (d.trim().parse::<f64>().ok()?, c.trim()),
        None => (0.0, value),
    };

    let mut parts = clock.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let secs: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let total = days * 86_400.0 + hours * 3_600.0 + minutes * 60.0 + secs;
    total.is_finite().then_some(total)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
