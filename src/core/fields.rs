// Field-level parsing and width normalization.
//
// The splitter hands over one record payload at a time. CR and LF inside a
// payload are ordinary data bytes here: they were either quoted or part of
// an unclosed quote region, never a terminator. The grammar is strict
// (comma separator, double-quote quoting, doubled quotes as the escape),
// but a stray quote nullifies the record's fields and comes back as an
// anomaly instead of an error.

use memchr::{memchr, memchr2};

use crate::summary::AlterationKind;

/// Quote trouble found while parsing a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteAnomaly {
    /// A double quote inside an unquoted field.
    Bare,
    /// An unclosed quoted field, or a closing quote followed by more data.
    Extraneous,
}

/// Split one record payload into fields.
///
/// An empty payload is a single empty field. On a quote anomaly the field
/// list comes back empty; width reconciliation pads it back out.
///
/// ```
/// use laxcsv::{parse_fields, QuoteAnomaly};
///
/// let (fields, anomaly) = parse_fields(b"a,\"b,c\",d");
/// assert_eq!(fields, vec!["a", "b,c", "d"]);
/// assert_eq!(anomaly, None);
///
/// let (fields, anomaly) = parse_fields(b"a\"b");
/// assert!(fields.is_empty());
/// assert_eq!(anomaly, Some(QuoteAnomaly::Bare));
/// ```
pub fn parse_fields(payload: &[u8]) -> (Vec<String>, Option<QuoteAnomaly>) {
    if payload.is_empty() {
        return (vec![String::new()], None);
    }

    let mut fields = Vec::with_capacity(8);
    let mut pos = 0;
    loop {
        let result = if pos < payload.len() && payload[pos] == b'"' {
            parse_quoted_field(payload, pos)
        } else {
            parse_unquoted_field(payload, pos)
        };
        match result {
            Ok((field, next)) => {
                fields.push(field);
                match next {
                    Some(p) => pos = p,
                    None => return (fields, None),
                }
            }
            Err(anomaly) => return (Vec::new(), Some(anomaly)),
        }
    }
}

/// Parse one unquoted field starting at `start`. Returns the field and the
/// start of the next field, or `None` when the payload is exhausted.
fn parse_unquoted_field(
    payload: &[u8],
    start: usize,
) -> Result<(String, Option<usize>), QuoteAnomaly> {
    match memchr2(b'"', b',', &payload[start..]) {
        Some(off) if payload[start + off] == b'"' => Err(QuoteAnomaly::Bare),
        Some(off) => Ok((lossy(&payload[start..start + off]), Some(start + off + 1))),
        None => Ok((lossy(&payload[start..]), None)),
    }
}

/// Parse one quoted field whose opening quote sits at `start`.
fn parse_quoted_field(
    payload: &[u8],
    start: usize,
) -> Result<(String, Option<usize>), QuoteAnomaly> {
    let mut field = Vec::with_capacity(16);
    let mut pos = start + 1;
    while pos < payload.len() {
        let quote = match memchr(b'"', &payload[pos..]) {
            Some(off) => pos + off,
            None => return Err(QuoteAnomaly::Extraneous),
        };
        field.extend_from_slice(&payload[pos..quote]);
        if quote + 1 == payload.len() {
            return Ok((lossy(&field), None));
        }
        match payload[quote + 1] {
            b'"' => {
                field.push(b'"');
                pos = quote + 2;
            }
            b',' => return Ok((lossy(&field), Some(quote + 2))),
            _ => return Err(QuoteAnomaly::Extraneous),
        }
    }
    // Opening quote was the last byte of the payload.
    Err(QuoteAnomaly::Extraneous)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Reconciles parsed records to the file-wide expected field count and
/// settles on the single alteration kind reported per record: quote
/// anomalies outrank truncation, truncation outranks padding.
///
/// ```
/// use laxcsv::FieldNormalizer;
///
/// let mut normalizer = FieldNormalizer::new();
/// let (first, _) = normalizer.normalize(b"a,b,c");
/// assert_eq!(first.len(), 3);
///
/// let (short, kind) = normalizer.normalize(b"d");
/// assert_eq!(short, vec!["d", "", ""]);
/// assert!(kind.is_some());
/// ```
#[derive(Debug, Default)]
pub struct FieldNormalizer {
    expected: Option<usize>,
}

impl FieldNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the expected width; the next record fixes a new one.
    pub fn reset(&mut self) {
        self.expected = None;
    }

    /// Width fixed by the first normalized record, if any.
    pub fn expected_field_count(&self) -> Option<usize> {
        self.expected
    }

    /// Parse and width-reconcile one payload.
    ///
    /// The first record fixes the expected width at its own field count
    /// (minimum one, so a quote-nullified first record normalizes to a
    /// single empty field rather than a permanently zero-width file).
    pub fn normalize(&mut self, payload: &[u8]) -> (Vec<String>, Option<AlterationKind>) {
        let (mut fields, anomaly) = parse_fields(payload);

        let expected = *self.expected.get_or_insert(fields.len().max(1));

        let mut kind = match anomaly {
            Some(QuoteAnomaly::Extraneous) => Some(AlterationKind::ExtraneousQuote),
            Some(QuoteAnomaly::Bare) => Some(AlterationKind::BareQuote),
            None => None,
        };

        if fields.len() > expected {
            fields.truncate(expected);
            if kind.is_none() {
                kind = Some(AlterationKind::TruncatedRecord);
            }
        } else if fields.len() < expected {
            fields.resize(expected, String::new());
            if kind.is_none() {
                kind = Some(AlterationKind::PaddedRecord);
            }
        }

        (fields, kind)
    }
}
