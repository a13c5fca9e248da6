/*!
 * Streaming RESP request parser
 *
 * A byte-level, re-entrant state machine that recognizes RESP multi-bulk
 * requests and legacy inline commands from a byte stream delivered in
 * chunks of arbitrary size. See the crate-level documentation for the
 * protocol this implements; this module is the entire parsing core —
 * it performs no I/O and knows nothing about command semantics.
 */

use crate::command::Command;
use std::collections::VecDeque;

/// Ceiling on the raw length of an inline command line, in bytes.
pub const PROTO_INLINE_MAX_SIZE: usize = 65536;
/// Ceiling on the declared element count of a multi-bulk request.
pub const MULTIBULK_MAX_ARGS: i64 = 1024 * 1024;
/// Ceiling on the declared length of a single bulk argument, in bytes.
pub const BULK_MAX_LEN: i64 = 512 * 1024 * 1024;

/// The three classes of fatal, terminal parse error, rendered exactly as
/// specified (these strings are wire-observable and must not change).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Protocol error: invalid multibulk length")]
    InvalidMultibulkLength,
    #[error("Protocol error: invalid bulk length")]
    InvalidBulkLength,
    #[error("Protocol error: expected '$', got '{0}'")]
    ExpectedDollar(char),
    #[error("Protocol error: unbalanced quotes in request")]
    UnbalancedQuotes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    MBulkLen,
    MBulkLenLF,
    BulkHeader,
    BulkLen,
    BulkLenLF,
    BulkBody,
    BulkTrailerCR,
    BulkTrailerLF,
    Inline,
    Error,
}

/// Signed decimal accumulator fed one byte at a time, shared by the
/// multibulk-length and bulk-length fields.
#[derive(Debug, Default, Clone, Copy)]
struct IntAccum {
    value: i64,
    negative: bool,
    sign_closed: bool,
    seen_digit: bool,
    overflowed: bool,
}

impl IntAccum {
    fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed one byte. Returns `true` if it belonged to the integer
    /// (sign or digit); `false` if the caller should treat this byte as
    /// the line terminator instead.
    fn push(&mut self, b: u8) -> bool {
        match b {
            b'-' if !self.sign_closed => {
                self.negative = true;
                self.sign_closed = true;
                true
            }
            b'0'..=b'9' => {
                self.sign_closed = true;
                self.seen_digit = true;
                if !self.overflowed {
                    let d = (b - b'0') as i64;
                    match self.value.checked_mul(10).and_then(|v| v.checked_add(d)) {
                        Some(v) => self.value = v,
                        None => self.overflowed = true,
                    }
                }
                true
            }
            _ => false,
        }
    }

    /// Resolve the accumulated value, or `None` if no digits were seen
    /// or the value overflowed a signed 64-bit integer.
    fn finish(&self) -> Option<i64> {
        if self.overflowed || !self.seen_digit {
            return None;
        }
        Some(if self.negative { -self.value } else { self.value })
    }
}

/// Owned byte buffer for the argument currently being accumulated.
/// Reset after each argument is moved into the pending command.
#[derive(Debug, Default)]
struct ArgAccum {
    buf: Vec<u8>,
}

impl ArgAccum {
    fn reset(&mut self) {
        self.buf.clear();
    }

    fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// Incremental RESP request parser.
///
/// Feed it bytes with [`Parser::parse`] as they arrive, in any chunking;
/// drain recognized commands with [`Parser::take_cmd`]. Once
/// [`Parser::err`] returns a value the instance is terminal until
/// [`Parser::init`] is called again.
#[derive(Debug)]
pub struct Parser {
    state: State,
    int_accum: IntAccum,
    arg: ArgAccum,
    pending_argv: Vec<Vec<u8>>,
    mbulk_remaining: i64,
    bulk_len: i64,
    bulk_copied: usize,
    inline_line: Vec<u8>,
    flow: u64,
    output: VecDeque<Command>,
    error: Option<ProtocolError>,
    error_msg: Option<String>,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            state: State::Start,
            int_accum: IntAccum::default(),
            arg: ArgAccum::default(),
            pending_argv: Vec::new(),
            mbulk_remaining: 0,
            bulk_len: 0,
            bulk_copied: 0,
            inline_line: Vec::new(),
            flow: 0,
            output: VecDeque::new(),
            error: None,
            error_msg: None,
        }
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all state to a fresh `Start`. Idempotent.
    pub fn init(&mut self) {
        *self = Self::default();
    }

    /// Consume the full chunk. No-op once a fatal error has been set.
    /// On the first byte of a malformed construct, sets the error slot
    /// and stops; otherwise keeps going, recognizing every pipelined
    /// command the chunk contains. Each is queued in order and drained
    /// one at a time with [`Parser::take_cmd`].
    pub fn parse(&mut self, chunk: &[u8]) {
        if self.error.is_some() {
            return;
        }
        let n = chunk.len();
        let mut i = 0usize;
        while i < n {
            match self.state {
                State::Start => match chunk[i] {
                    b'\r' | b'\n' => {
                        i += 1;
                        self.flow += 1;
                    }
                    b'*' => {
                        i += 1;
                        self.flow += 1;
                        self.int_accum.reset();
                        self.state = State::MBulkLen;
                    }
                    _ => {
                        self.state = State::Inline;
                    }
                },

                State::MBulkLen => {
                    let b = chunk[i];
                    if self.int_accum.push(b) {
                        i += 1;
                        self.flow += 1;
                    } else if b == b'\r' {
                        i += 1;
                        self.flow += 1;
                        self.state = State::MBulkLenLF;
                    } else {
                        self.fail(ProtocolError::InvalidMultibulkLength);
                        break;
                    }
                }
                State::MBulkLenLF => {
                    if chunk[i] != b'\n' {
                        self.fail(ProtocolError::InvalidMultibulkLength);
                        break;
                    }
                    i += 1;
                    self.flow += 1;
                    match self.int_accum.finish() {
                        None => {
                            self.fail(ProtocolError::InvalidMultibulkLength);
                            break;
                        }
                        Some(v) if v <= 0 => {
                            self.commit(Vec::new());
                        }
                        Some(v) if v > MULTIBULK_MAX_ARGS => {
                            self.fail(ProtocolError::InvalidMultibulkLength);
                            break;
                        }
                        Some(v) => {
                            self.mbulk_remaining = v;
                            self.pending_argv = Vec::with_capacity(v as usize);
                            self.state = State::BulkHeader;
                        }
                    }
                }

                State::BulkHeader => match chunk[i] {
                    b'\r' | b'\n' => {
                        i += 1;
                        self.flow += 1;
                    }
                    b'$' => {
                        i += 1;
                        self.flow += 1;
                        self.int_accum.reset();
                        self.state = State::BulkLen;
                    }
                    other => {
                        self.fail(ProtocolError::ExpectedDollar(other as char));
                        break;
                    }
                },
                State::BulkLen => {
                    let b = chunk[i];
                    if self.int_accum.push(b) {
                        i += 1;
                        self.flow += 1;
                    } else if b == b'\r' {
                        i += 1;
                        self.flow += 1;
                        self.state = State::BulkLenLF;
                    } else {
                        self.fail(ProtocolError::InvalidBulkLength);
                        break;
                    }
                }
                State::BulkLenLF => {
                    if chunk[i] != b'\n' {
                        self.fail(ProtocolError::InvalidBulkLength);
                        break;
                    }
                    i += 1;
                    self.flow += 1;
                    match self.int_accum.finish() {
                        Some(v) if (0..=BULK_MAX_LEN).contains(&v) => {
                            self.bulk_len = v;
                            self.bulk_copied = 0;
                            self.arg.reset();
                            self.state = State::BulkBody;
                        }
                        _ => {
                            self.fail(ProtocolError::InvalidBulkLength);
                            break;
                        }
                    }
                }
                State::BulkBody => {
                    let remaining = self.bulk_len as usize - self.bulk_copied;
                    let avail = n - i;
                    let take = remaining.min(avail);
                    self.arg.extend(&chunk[i..i + take]);
                    i += take;
                    self.flow += take as u64;
                    self.bulk_copied += take;
                    if self.bulk_copied == self.bulk_len as usize {
                        self.state = State::BulkTrailerCR;
                    }
                }
                State::BulkTrailerCR => {
                    if chunk[i] != b'\r' {
                        self.fail(ProtocolError::InvalidBulkLength);
                        break;
                    }
                    i += 1;
                    self.flow += 1;
                    self.state = State::BulkTrailerLF;
                }
                State::BulkTrailerLF => {
                    if chunk[i] != b'\n' {
                        self.fail(ProtocolError::InvalidBulkLength);
                        break;
                    }
                    i += 1;
                    self.flow += 1;
                    let completed = self.arg.take();
                    self.pending_argv.push(completed);
                    self.mbulk_remaining -= 1;
                    if self.mbulk_remaining == 0 {
                        let argv = std::mem::take(&mut self.pending_argv);
                        self.commit(argv);
                    } else {
                        self.int_accum.reset();
                        self.state = State::BulkHeader;
                    }
                }

                State::Inline => {
                    let rest = &chunk[i..];
                    match rest.iter().position(|&b| b == b'\n') {
                        Some(k) => {
                            self.inline_line.extend_from_slice(&rest[..k]);
                            i += k + 1;
                            self.flow += (k + 1) as u64;
                            if self.inline_line.last() == Some(&b'\r') {
                                self.inline_line.pop();
                            }
                            if self.inline_line.len() > PROTO_INLINE_MAX_SIZE {
                                self.fail(ProtocolError::UnbalancedQuotes);
                                break;
                            }
                            match tokenize_inline(&self.inline_line) {
                                Ok(argv) => {
                                    self.inline_line.clear();
                                    if argv.is_empty() {
                                        self.state = State::Start;
                                    } else {
                                        self.commit(argv);
                                    }
                                }
                                Err(e) => {
                                    self.fail(e);
                                    break;
                                }
                            }
                        }
                        None => {
                            self.inline_line.extend_from_slice(rest);
                            self.flow += rest.len() as u64;
                            i = n;
                            if self.inline_line.len() > PROTO_INLINE_MAX_SIZE {
                                self.fail(ProtocolError::UnbalancedQuotes);
                                break;
                            }
                        }
                    }
                }

                State::Error => break,
            }
        }
    }

    /// Pop the oldest completed command still queued, if any. Call
    /// repeatedly to drain a pipeline fully.
    pub fn take_cmd(&mut self) -> Option<Command> {
        self.output.pop_front()
    }

    /// Borrow the terminal error, if the parser has failed. Stable until
    /// the next [`Parser::init`].
    pub fn err(&self) -> Option<&str> {
        self.error_msg.as_deref()
    }

    /// The typed error, for callers that want to match on its kind
    /// rather than the rendered string.
    pub fn err_kind(&self) -> Option<&ProtocolError> {
        self.error.as_ref()
    }

    fn commit(&mut self, argv: Vec<Vec<u8>>) {
        let flow = self.flow;
        self.flow = 0;
        self.output.push_back(Command::new(argv, flow));
        self.state = State::Start;
    }

    fn fail(&mut self, e: ProtocolError) {
        self.error_msg = Some(e.to_string());
        self.error = Some(e);
        self.state = State::Error;
    }
}

fn is_hex(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

fn hex_val(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => unreachable!("hex_val called on non-hex byte"),
    }
}

/// Tokenize one complete inline line (terminator already stripped) into
/// its argument vector, per the whitespace/quote/escape grammar.
fn tokenize_inline(line: &[u8]) -> Result<Vec<Vec<u8>>, ProtocolError> {
    let n = line.len();
    let mut p = 0usize;
    let mut argv = Vec::new();

    while p < n {
        while p < n && (line[p] == b' ' || line[p] == b'\t') {
            p += 1;
        }
        if p >= n {
            break;
        }

        let mut cur = Vec::new();
        loop {
            if p >= n {
                break;
            }
            match line[p] {
                b' ' | b'\t' => break,
                b'"' => {
                    p += 1;
                    loop {
                        if p >= n {
                            return Err(ProtocolError::UnbalancedQuotes);
                        }
                        match line[p] {
                            b'\\' if p + 1 < n && line[p + 1] == b'x' => {
                                if p + 3 < n && is_hex(line[p + 2]) && is_hex(line[p + 3]) {
                                    cur.push((hex_val(line[p + 2]) << 4) | hex_val(line[p + 3]));
                                    p += 4;
                                } else {
                                    return Err(ProtocolError::UnbalancedQuotes);
                                }
                            }
                            b'\\' if p + 1 < n => {
                                let c = match line[p + 1] {
                                    b'n' => b'\n',
                                    b'r' => b'\r',
                                    b't' => b'\t',
                                    b'b' => 0x08,
                                    b'a' => 0x07,
                                    other => other,
                                };
                                cur.push(c);
                                p += 2;
                            }
                            b'"' => {
                                p += 1;
                                if p < n && line[p] != b' ' && line[p] != b'\t' {
                                    return Err(ProtocolError::UnbalancedQuotes);
                                }
                                break;
                            }
                            other => {
                                cur.push(other);
                                p += 1;
                            }
                        }
                    }
                    break;
                }
                b'\'' => {
                    p += 1;
                    loop {
                        if p >= n {
                            return Err(ProtocolError::UnbalancedQuotes);
                        }
                        match line[p] {
                            b'\\' if p + 1 < n && line[p + 1] == b'\'' => {
                                cur.push(b'\'');
                                p += 2;
                            }
                            b'\'' => {
                                p += 1;
                                if p < n && line[p] != b' ' && line[p] != b'\t' {
                                    return Err(ProtocolError::UnbalancedQuotes);
                                }
                                break;
                            }
                            other => {
                                cur.push(other);
                                p += 1;
                            }
                        }
                    }
                    break;
                }
                other => {
                    cur.push(other);
                    p += 1;
                }
            }
        }
        argv.push(cur);
    }

    Ok(argv)
}
