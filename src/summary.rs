// Scan bookkeeping: what was read, what was changed, and the printable
// report callers audit after the fact.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only error a scan surfaces through its summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("reader is nil")]
    ReaderIsNil,
}

/// What the scanner did to a record that was in an unexpected format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlterationKind {
    /// A double quote appeared inside an unquoted field; the record's
    /// fields were nullified.
    BareQuote,
    /// An odd or stray quote made the record ambiguous; the record's
    /// fields were nullified.
    ExtraneousQuote,
    /// The record had more fields than expected and lost its tail.
    TruncatedRecord,
    /// The record had fewer fields than expected and gained empty ones.
    PaddedRecord,
}

impl AlterationKind {
    /// Stable description tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlterationKind::BareQuote => "bare quote",
            AlterationKind::ExtraneousQuote => "extraneous quote",
            AlterationKind::TruncatedRecord => "truncated record",
            AlterationKind::PaddedRecord => "padded record",
        }
    }
}

impl fmt::Display for AlterationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One change the scanner made, with enough context to audit or replay it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alteration {
    /// 1-based ordinal of the emission that was altered.
    pub record_ordinal: i64,
    /// The record's payload exactly as it appeared in the source.
    pub original_data: String,
    /// The normalized record that replaced it.
    pub resulting_record: Vec<String>,
    pub kind: AlterationKind,
}

/// Running account of a scan. A fresh summary reports zero counts; a scan
/// against a missing reader reports counts of -1 and `ReaderIsNil`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub record_count: i64,
    pub alteration_count: i64,
    /// Alterations in emission order.
    pub alterations: Vec<Alteration>,
    pub eof: bool,
    pub err: Option<ScanError>,
}

impl ScanSummary {
    pub(crate) fn push_alteration(&mut self, alteration: Alteration) {
        self.alteration_count += 1;
        self.alterations.push(alteration);
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scan Summary")?;
        writeln!(f, "---------------------------------------")?;
        writeln!(f, "  Records Scanned:    {}", self.record_count)?;
        writeln!(f, "  Alterations Made:   {}", self.alteration_count)?;
        writeln!(f, "  EOF:                {}", self.eof)?;
        match &self.err {
            Some(err) => writeln!(f, "  Err:                {err}")?,
            None => writeln!(f, "  Err:                none")?,
        }
        write!(f, "  Alterations:")?;
        if self.alterations.is_empty() {
            write!(f, "        none")?;
        }
        for alteration in &self.alterations {
            // The record renders as a JSON array of strings. Encoding a
            // Vec<String> cannot fail on any input data; a formatter error
            // is the non-panicking way out if it ever does.
            let record = serde_json::to_string(&alteration.resulting_record)
                .map_err(|_| fmt::Error)?;
            writeln!(f)?;
            writeln!(f, "    Record Number:    {}", alteration.record_ordinal)?;
            writeln!(f, "    Alteration:       {}", alteration.kind)?;
            writeln!(f, "    Original Data:    {}", alteration.original_data)?;
            writeln!(f, "    Resulting Record: {record}")?;
        }
        Ok(())
    }
}
