// Byte-exact partitioning.
//
// A partition plan divides the source into segments of n non-empty records
// each, so concurrent readers can seek straight to a segment and re-read
// it as an independent source. Segment lengths include each record's
// trailing terminator and any terminator-only records consumed before it,
// and a dangling terminator run at EOF extends the final segment, so a
// plan with any segments at all covers every byte past the excluded
// header.

use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scanner::Scanner;

/// A byte range of the source holding a fixed count (or fewer, for the
/// last segment) of non-empty records. Offsets are absolute from the start
/// of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// 1-based placement relative to the other segments.
    pub ordinal: u64,
    /// Byte position where the segment starts.
    pub lower_offset: u64,
    /// Segment length in bytes.
    pub length: u64,
}

impl Segment {
    /// Exclusive byte position where the segment ends.
    pub fn upper_offset(&self) -> u64 {
        self.lower_offset + self.length
    }
}

impl<R: Read + Seek> Scanner<R> {
    /// Divide the source into segments of `n` non-empty records each; the
    /// final segment may hold fewer. Returns an empty plan for an empty or
    /// terminator-only source, or when `n` is zero.
    ///
    /// With `exclude_header` set, a first record the header check accepts
    /// is left out of the plan entirely: the first segment starts just
    /// past it.
    ///
    /// Partitioning rewinds the source and consumes it fully, so it resets
    /// any scan in progress; interleaving it with [`advance`](Scanner::advance)
    /// on the same scanner produces undefined results.
    ///
    /// ```
    /// use std::io::Cursor;
    /// use laxcsv::{assume_header_exists, Scanner};
    ///
    /// let data = Cursor::new("a,b,c\nd,e,f\ng,h,i\nj,k,l\n");
    /// let mut scanner = Scanner::new(Some(data), assume_header_exists);
    /// let segments = scanner.partition(2, true);
    /// assert_eq!(segments.len(), 2);
    /// assert_eq!((segments[0].lower_offset, segments[0].length), (6, 12));
    /// assert_eq!((segments[1].lower_offset, segments[1].length), (18, 6));
    /// ```
    pub fn partition(&mut self, n: usize, exclude_header: bool) -> Vec<Segment> {
        let mut segments = Vec::new();
        if n == 0 {
            return segments;
        }

        self.reset();
        debug!(records_per_segment = n, exclude_header, "partitioning source");

        let mut ordinal: u64 = 0;
        let mut lower_offset: u64 = 0;
        let mut accumulated: u64 = 0;
        let mut records_in_segment = 0usize;
        let mut first_emission = true;

        while self.advance() {
            let raw_len = self.emission_raw_len();
            let unclaimed = self.emission_unclaimed();
            let non_empty = self.emission_payload_len() > 0;

            if first_emission {
                first_emission = false;
                if exclude_header && self.record_is_header() {
                    // The header and any terminator bytes leading up to it
                    // sit below the first segment.
                    lower_offset = raw_len + unclaimed;
                    continue;
                }
            }

            if !non_empty {
                // The implied record of a dangling terminator counts
                // toward no segment, but the trailing terminator bytes it
                // arrived with extend the segment in progress, or the last
                // closed one. They never open a new segment.
                let trailing = raw_len + unclaimed;
                if trailing > 0 {
                    if records_in_segment > 0 {
                        accumulated += trailing;
                    } else if let Some(last) = segments.last_mut() {
                        last.length += trailing;
                    }
                }
                continue;
            }

            accumulated += raw_len + unclaimed;
            records_in_segment += 1;

            if records_in_segment == n {
                ordinal += 1;
                segments.push(Segment {
                    ordinal,
                    lower_offset,
                    length: accumulated,
                });
                lower_offset += accumulated;
                accumulated = 0;
                records_in_segment = 0;
            }
        }

        if records_in_segment > 0 {
            ordinal += 1;
            segments.push(Segment {
                ordinal,
                lower_offset,
                length: accumulated,
            });
        }

        debug!(segments = segments.len(), "partition complete");
        segments
    }
}
