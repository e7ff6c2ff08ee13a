//! Permissive streaming reader for non-compliant CSV.
//!
//! Real-world comma-separated files mix line endings, drift in field
//! count, and mangle their quoting. Instead of rejecting such input, this
//! crate produces the most consistent record stream it can and records
//! every alteration it made, so data loss can be audited after the fact.
//!
//! # Terminator handling
//!
//! Record terminators can be any mix of unix (`\n`), DOS (`\r\n`),
//! inverted DOS (`\n\r`), or bare carriage return (`\r`) tokens. When more
//! than one candidate appears in the search window, the scanner picks the
//! first non-quoted, highest-priority token. Longer tokens outrank the
//! shorter tokens they are built from, which keeps a DOS terminator from
//! being misread as a carriage return followed by a newline; between
//! tokens of equal length the more common form wins, so DOS outranks
//! inverted DOS and unix outranks bare carriage return. Tokens inside a
//! pair of double quotes are data, not terminators, and a terminator
//! inside an unclosed quote region is never trusted: the unclosed
//! remainder becomes the final record.
//!
//! # Width reconciliation
//!
//! The first record scanned fixes the expected field count. A later record
//! with fewer fields is padded with empty strings; one with more is
//! truncated. Both outcomes are reported through the [`ScanSummary`] with
//! the record's ordinal and original text.
//!
//! # Quote ambiguity
//!
//! Two quoting problems are handled without guessing at the author's
//! intent. A *bare quote* is a double quote inside an unquoted field; an
//! *extraneous quote* is an odd or stray quote that leaves a quoted field
//! ambiguous. In either case the record's fields are replaced with empty
//! strings at the expected width, and the original bytes are preserved in
//! the summary so nothing is silently lost.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use laxcsv::{assume_no_header, Scanner};
//!
//! let data = Cursor::new("a,b,c\nd,ef\ng,h,i");
//! let mut scanner = Scanner::new(Some(data), assume_no_header);
//! let mut records = Vec::new();
//! while scanner.advance() {
//!     records.push(scanner.current().to_vec());
//! }
//! assert_eq!(records[1], vec!["d", "ef", ""]); // padded to width 3
//!
//! let summary = scanner.summary().unwrap();
//! assert_eq!(summary.record_count, 3);
//! assert_eq!(summary.alteration_count, 1);
//! ```
//!
//! For concurrent processing, [`Scanner::partition`] computes byte-exact
//! [`Segment`]s of n non-empty records each, and
//! [`scan_segments_parallel`] re-reads them through independent file
//! handles.

// No unwrap/expect in production code; fallible paths recover or log.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod core;
mod parallel;
mod partition;
mod scanner;
mod splitter;
mod summary;

pub use crate::core::fields::{parse_fields, FieldNormalizer, QuoteAnomaly};
pub use crate::core::quote::index_non_quoted;
pub use crate::core::terminator::Terminator;
pub use crate::parallel::scan_segments_parallel;
pub use crate::partition::Segment;
pub use crate::scanner::{Records, Scanner};
pub use crate::splitter::{LineSplitter, SplitResult};
pub use crate::summary::{Alteration, AlterationKind, ScanError, ScanSummary};

/// Header check reporting that the file has no header.
pub fn assume_no_header(_first_record: Option<&[String]>) -> bool {
    false
}

/// Header check reporting a header whenever a first record exists.
pub fn assume_header_exists(first_record: Option<&[String]>) -> bool {
    first_record.is_some()
}
