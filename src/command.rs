/*!
 * Command value type
 *
 * A `Command` is the sole output of the parser: an ordered list of
 * argument byte-strings plus the number of input bytes ("flow") the
 * request occupied in the stream. Arguments are opaque; this module does
 * not interpret them.
 */

use std::fmt;

/// A fully recognized RESP request: an argument vector and its flow.
///
/// Immutable once built. Arguments may contain any byte value, including
/// embedded `\r`/`\n` (bulk payloads are copied verbatim).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    argv: Vec<Vec<u8>>,
    flow: u64,
}

impl Command {
    pub(crate) fn new(argv: Vec<Vec<u8>>, flow: u64) -> Self {
        Self { argv, flow }
    }

    /// Number of arguments (zero for a negative or zero-length multibulk).
    #[inline]
    pub fn len(&self) -> usize {
        self.argv.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    /// Argument `i` as a byte-string. Panics if out of range, matching
    /// the original `redis_cmd::argv(unsigned)` contract.
    #[inline]
    pub fn arg(&self, i: usize) -> &[u8] {
        &self.argv[i]
    }

    /// All arguments in order.
    #[inline]
    pub fn argv(&self) -> &[Vec<u8>] {
        &self.argv
    }

    /// Number of input bytes this command consumed.
    #[inline]
    pub fn flow(&self) -> u64 {
        self.flow
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, a) in self.argv.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", String::from_utf8_lossy(a))?;
        }
        write!(f, "}}, flow[{}]", self.flow)
    }
}
