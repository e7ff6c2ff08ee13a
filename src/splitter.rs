// Record splitting over a growable byte window.
//
// The splitter never reads; it decides. Given the current window and an
// EOF flag it either emits one raw record (payload plus terminator),
// asks for a larger window, or hands back the unterminated remainder as
// the final token.
//
// Terminator priority: two-byte forms (\r\n, \n\r) beat the one-byte
// forms they are built from, and between one-byte forms the earliest
// non-quoted occurrence wins. A candidate touching the window's edge is
// not trusted until EOF, since the missing byte could turn it into a
// longer composite.

use crate::core::quote::index_non_quoted;
use crate::core::terminator::Terminator;

/// Outcome of one split call.
#[derive(Debug, PartialEq, Eq)]
pub enum SplitResult<'a> {
    /// A record was found. `advance` bytes of the window are consumed and
    /// `token` is the record payload plus its trailing terminator.
    Emit { advance: usize, token: &'a [u8] },
    /// No decision possible yet; grow the window and call again.
    NeedMore,
    /// End of input: whatever remains, with no trailing terminator.
    Final { token: &'a [u8] },
}

/// Locates record terminators and remembers which one ended the last
/// emission. The scanner's byte accounting reads that memory back.
#[derive(Debug, Default)]
pub struct LineSplitter {
    current: Option<Terminator>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminator used by the most recent emission: unset until the first
    /// emission and after every NeedMore, `Terminator::None` after a final
    /// token.
    pub fn current_terminator(&self) -> Option<Terminator> {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Find the next record in `data`.
    //
    // Selection order within one call:
    //
    // 1. Index the first non-quoted occurrence of each terminator form.
    // 2. Validate the two-byte candidates. \n\r only counts when the first
    //    non-quoted \n starts it and the first non-quoted \r is the one
    //    inside the pair; \r\n is symmetric. This is what keeps \r | \r\n
    //    from being misread as \r\r | \n.
    // 3. A valid two-byte candidate wins over any single byte. Between the
    //    two, the lower index wins and \r\n takes ties.
    // 4. Single-byte candidates go to the earliest occurrence.
    // 5. Any candidate whose last byte touches the window edge defers to
    //    the next call unless EOF is flagged; one more byte could promote
    //    it into (or out of) a composite.
    pub fn split<'a>(&mut self, data: &'a [u8], at_eof: bool) -> SplitResult<'a> {
        let lf = index_non_quoted(data, b"\n");
        let cr = index_non_quoted(data, b"\r");
        let crlf = index_non_quoted(data, b"\r\n");
        let lfcr = index_non_quoted(data, b"\n\r");

        // A two-byte candidate only counts when it starts at the first
        // non-quoted occurrence of its leading byte and the trailing byte's
        // first occurrence is the one inside the pair.
        let lfcr = match (lfcr, lf, cr) {
            (Some(at), Some(l), Some(c)) if l == at && c > l => Some(at),
            _ => None,
        };
        let crlf = match (crlf, lf, cr) {
            (Some(at), Some(l), Some(c)) if c == at && l > c => Some(at),
            _ => None,
        };
        let two_byte = match (crlf, lfcr) {
            (Some(d), Some(i)) if d <= i => Some((d, Terminator::CrLf)),
            (Some(_), Some(i)) => Some((i, Terminator::LfCr)),
            (Some(d), None) => Some((d, Terminator::CrLf)),
            (None, Some(i)) => Some((i, Terminator::LfCr)),
            (None, None) => None,
        };

        if let Some((at, terminator)) = two_byte {
            if at + 2 == data.len() && !at_eof {
                self.current = None;
                return SplitResult::NeedMore;
            }
            self.current = Some(terminator);
            return SplitResult::Emit {
                advance: at + 2,
                token: &data[..at + 2],
            };
        }

        let single = match (lf, cr) {
            (Some(l), Some(c)) if l <= c => Some((l, Terminator::Lf)),
            (Some(_), Some(c)) => Some((c, Terminator::Cr)),
            (Some(l), None) => Some((l, Terminator::Lf)),
            (None, Some(c)) => Some((c, Terminator::Cr)),
            (None, None) => None,
        };

        if let Some((at, terminator)) = single {
            if at + 1 == data.len() && !at_eof {
                // Could be the first byte of a \r\n or \n\r pair.
                self.current = None;
                return SplitResult::NeedMore;
            }
            self.current = Some(terminator);
            return SplitResult::Emit {
                advance: at + 1,
                token: &data[..at + 1],
            };
        }

        if !at_eof {
            self.current = None;
            return SplitResult::NeedMore;
        }

        // EOF with no trusted terminator. An unclosed quote region lands
        // here too: nothing after the unmatched quote is ever indexed.
        self.current = Some(Terminator::None);
        SplitResult::Final { token: data }
    }
}
