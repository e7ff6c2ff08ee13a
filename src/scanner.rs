// Pull-driven record scanner.
//
// Owns the byte window, feeds it to the splitter, and normalizes whatever
// comes out. Terminator-only records are consumed silently; their bytes
// are credited to the next emission so the partitioner's accounting stays
// byte-exact.

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use tracing::{debug, warn};

use crate::core::fields::FieldNormalizer;
use crate::splitter::{LineSplitter, SplitResult};
use crate::summary::{Alteration, ScanError, ScanSummary};

const READ_CHUNK: usize = 8 * 1024;

/// Permissive streaming reader over one byte source.
///
/// Successive calls to [`advance`](Scanner::advance) step through the
/// records of the source; [`current`](Scanner::current) exposes the most
/// recent one and [`summary`](Scanner::summary) the running account of
/// every alteration made along the way.
pub struct Scanner<R> {
    reader: Option<R>,
    header_check: Box<dyn Fn(Option<&[String]>) -> bool>,
    splitter: LineSplitter,
    normalizer: FieldNormalizer,

    // Byte window. `start` marks how much of `buf` is already consumed;
    // consumed bytes are dropped when they outgrow half the buffer.
    buf: Vec<u8>,
    start: usize,
    at_eof: bool,
    finished: bool,
    read_error: Option<std::io::Error>,

    current: Vec<String>,
    first_record: Option<Vec<String>>,
    summary: Option<ScanSummary>,
    records_scanned: i64,

    // Byte accounting for the partitioner: terminator bytes of skipped
    // empty records pool in `bytes_unclaimed` until the next emission
    // claims them.
    bytes_unclaimed: u64,
    emission_raw_len: u64,
    emission_payload_len: u64,
    emission_unclaimed: u64,
}

impl<R: Read> Scanner<R> {
    /// Create a scanner over `reader`. `header_check` decides whether the
    /// file's first record is a header; see [`assume_no_header`] and
    /// [`assume_header_exists`] for the built-ins.
    ///
    /// A `None` reader is accepted: the first advance then fails and the
    /// summary reports [`ScanError::ReaderIsNil`].
    ///
    /// [`assume_no_header`]: crate::assume_no_header
    /// [`assume_header_exists`]: crate::assume_header_exists
    pub fn new(
        reader: Option<R>,
        header_check: impl Fn(Option<&[String]>) -> bool + 'static,
    ) -> Self {
        Scanner {
            reader,
            header_check: Box::new(header_check),
            splitter: LineSplitter::new(),
            normalizer: FieldNormalizer::new(),
            buf: Vec::new(),
            start: 0,
            at_eof: false,
            finished: false,
            read_error: None,
            current: Vec::new(),
            first_record: None,
            summary: None,
            records_scanned: 0,
            bytes_unclaimed: 0,
            emission_raw_len: 0,
            emission_payload_len: 0,
            emission_unclaimed: 0,
        }
    }

    /// Advance to the next record, which is then available via
    /// [`current`](Scanner::current). Returns false at the end of the
    /// stream, and keeps returning false until [`reset`](Scanner::reset).
    pub fn advance(&mut self) -> bool {
        if self.summary.is_none() {
            self.summary = Some(ScanSummary::default());
        }

        if self.reader.is_none() {
            if let Some(summary) = self.summary.as_mut() {
                summary.record_count = -1;
                summary.alteration_count = -1;
                summary.eof = false;
                summary.err = Some(ScanError::ReaderIsNil);
            }
            return false;
        }

        loop {
            let (token_start, token_len, terminator_len) = match self.next_raw_token() {
                Some(token) => token,
                None => {
                    if let Some(summary) = self.summary.as_mut() {
                        summary.eof = true;
                    }
                    return false;
                }
            };

            let payload_len = token_len - terminator_len;
            if payload_len == 0 && terminator_len > 0 {
                // Terminator-only record: consumed silently, bytes pooled
                // for the next emission.
                self.bytes_unclaimed += token_len as u64;
                continue;
            }

            let payload = self.buf[token_start..token_start + payload_len].to_vec();
            let (record, kind) = self.normalizer.normalize(&payload);

            self.records_scanned += 1;
            self.emission_raw_len = token_len as u64;
            self.emission_payload_len = payload_len as u64;
            self.emission_unclaimed = std::mem::take(&mut self.bytes_unclaimed);

            // The first record is retained for header checks until the next
            // emission replaces it. The implied record of an empty source
            // does not count as a first record.
            if self.records_scanned == 1 {
                self.first_record = (payload_len > 0).then(|| record.clone());
            } else {
                self.first_record = None;
            }

            self.current = record;

            if let Some(summary) = self.summary.as_mut() {
                summary.record_count += 1;
                if let Some(kind) = kind {
                    debug!(ordinal = summary.record_count, kind = %kind, "record altered");
                    summary.push_alteration(Alteration {
                        record_ordinal: summary.record_count,
                        original_data: String::from_utf8_lossy(&payload).into_owned(),
                        resulting_record: self.current.clone(),
                        kind,
                    });
                }
            }
            return true;
        }
    }

    /// The most recent record produced by [`advance`](Scanner::advance).
    /// Empty before the first successful advance.
    pub fn current(&self) -> &[String] {
        &self.current
    }

    /// Iterate over the remaining records of the source.
    ///
    /// Each item is an owned copy of the record the underlying advance
    /// produced; the summary keeps accumulating as usual.
    pub fn records(&mut self) -> Records<'_, R> {
        Records { scanner: self }
    }

    /// Whether the file's first record is a header, per the header-check
    /// callback. False whenever the first record is not available: before
    /// the first advance, after advancing past it, or on an empty source.
    pub fn record_is_header(&self) -> bool {
        (self.header_check)(self.first_record.as_deref())
    }

    /// The running scan summary. `None` until the first advance (or after
    /// a reset).
    pub fn summary(&self) -> Option<&ScanSummary> {
        self.summary.as_ref()
    }

    /// The read error that ended the scan early, if any. The scanner never
    /// re-surfaces it through the summary.
    pub fn last_read_error(&self) -> Option<&std::io::Error> {
        self.read_error.as_ref()
    }

    /// The field count fixed by the first emitted record, to which every
    /// later record is reconciled. `None` until the first advance.
    pub fn expected_field_count(&self) -> Option<usize> {
        self.normalizer.expected_field_count()
    }

    /// Pull the next raw token out of the window, growing it as needed.
    /// Returns the token's range within `buf` and its terminator length,
    /// with the window already advanced past it. `None` means the stream
    /// is exhausted.
    fn next_raw_token(&mut self) -> Option<(usize, usize, usize)> {
        if self.finished {
            return None;
        }
        loop {
            match self.splitter.split(&self.buf[self.start..], self.at_eof) {
                SplitResult::Emit { advance, .. } => {
                    let token_start = self.start;
                    let terminator_len = self
                        .splitter
                        .current_terminator()
                        .map(|t| t.len())
                        .unwrap_or(0);
                    self.start += advance;
                    return Some((token_start, advance, terminator_len));
                }
                SplitResult::Final { token } => {
                    let token_start = self.start;
                    let token_len = token.len();
                    self.start += token_len;
                    self.finished = true;
                    return Some((token_start, token_len, 0));
                }
                SplitResult::NeedMore => {
                    if self.at_eof {
                        // The splitter always resolves at EOF; nothing left.
                        return None;
                    }
                    self.fill();
                    if self.finished {
                        // A read failure ends the scan without flushing the
                        // window; the bytes in it are not trusted.
                        return None;
                    }
                }
            }
        }
    }

    /// Read one chunk into the window, compacting consumed bytes first.
    /// Sets `at_eof` when the reader has no more bytes, and additionally
    /// `finished` when it fails.
    fn fill(&mut self) {
        if self.start > 0 && self.start >= self.buf.len() / 2 {
            self.buf.drain(..self.start);
            self.start = 0;
        }

        let reader = match self.reader.as_mut() {
            Some(reader) => reader,
            None => {
                self.at_eof = true;
                return;
            }
        };

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => {
                    self.at_eof = true;
                    return;
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "read failed mid-scan; ending scan early");
                    self.read_error = Some(e);
                    self.at_eof = true;
                    self.finished = true;
                    return;
                }
            }
        }
    }

    // Per-emission byte accounting read by the partitioner.

    pub(crate) fn emission_raw_len(&self) -> u64 {
        self.emission_raw_len
    }

    pub(crate) fn emission_payload_len(&self) -> u64 {
        self.emission_payload_len
    }

    pub(crate) fn emission_unclaimed(&self) -> u64 {
        self.emission_unclaimed
    }
}

/// Borrowing iterator over a scanner's remaining records.
pub struct Records<'a, R> {
    scanner: &'a mut Scanner<R>,
}

impl<R: Read> Iterator for Records<'_, R> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scanner
            .advance()
            .then(|| self.scanner.current().to_vec())
    }
}

impl<R: Read + Seek> Scanner<R> {
    /// Rewind to the top of the source and discard all scan state,
    /// including the summary.
    pub fn reset(&mut self) {
        if let Some(reader) = self.reader.as_mut() {
            if let Err(e) = reader.seek(SeekFrom::Start(0)) {
                warn!(error = %e, "seek to start failed during reset");
            }
        }
        self.splitter.reset();
        self.normalizer.reset();
        self.buf.clear();
        self.start = 0;
        self.at_eof = false;
        self.finished = false;
        self.read_error = None;
        self.current = Vec::new();
        self.first_record = None;
        self.summary = None;
        self.records_scanned = 0;
        self.bytes_unclaimed = 0;
        self.emission_raw_len = 0;
        self.emission_payload_len = 0;
        self.emission_unclaimed = 0;
    }
}
