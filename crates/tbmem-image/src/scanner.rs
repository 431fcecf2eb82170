// Line scanner for memory images.
//
// Strips whitespace, `--` and `//` line comments and `/* */` block comments
// (which may span lines), and decodes hex or binary runs into fixed-width
// words.

use std::fmt;

use tbmem_types::{Logic, LogicVector};

/// Position within one line of image text.
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    #[must_use]
    pub fn new(line: &'a str) -> Self {
        Self { src: line, pos: 0 }
    }

    #[inline]
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consume one character if it equals `expected`.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Unconsumed remainder of the line.
    #[inline]
    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    #[inline]
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Consume up to the next whitespace and return the skipped text.
    pub fn skip_item(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn starts_comment(&self) -> bool {
        matches!(
            (self.peek(), self.peek_at(1)),
            (Some('-'), Some('-')) | (Some('/'), Some('/' | '*'))
        )
    }
}

/// Comment state carried from one line to the next.
#[derive(Debug, Default, Clone)]
pub struct Tokenizer {
    in_block_comment: bool,
}

impl Tokenizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a `/*` comment is still open at the end of the last line.
    #[inline]
    #[must_use]
    pub fn in_block_comment(&self) -> bool {
        self.in_block_comment
    }

    /// Skip whitespace and comments. Returns `true` when nothing but
    /// whitespace and comments remains on the line.
    pub fn skip_blank(&mut self, line: &mut LineCursor<'_>) -> bool {
        loop {
            if self.in_block_comment {
                match line.rest().find("*/") {
                    Some(end) => {
                        line.pos += end + 2;
                        self.in_block_comment = false;
                    }
                    None => {
                        line.pos = line.src.len();
                        return true;
                    }
                }
            }

            while line.peek().is_some_and(char::is_whitespace) {
                line.advance();
            }
            if line.is_at_end() {
                return true;
            }

            match (line.peek(), line.peek_at(1)) {
                (Some('-'), Some('-')) | (Some('/'), Some('/')) => {
                    line.pos = line.src.len();
                    return true;
                }
                (Some('/'), Some('*')) => {
                    line.pos += 2;
                    self.in_block_comment = true;
                }
                _ => return false,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Token decoding
// ---------------------------------------------------------------------------

/// Bits of one hex-token character: a digit, or a nibble marker.
fn hex_nibble(c: char) -> Option<[Logic; 4]> {
    if let Some(value) = c.to_digit(16) {
        return Some([3, 2, 1, 0].map(|shift| Logic::from_bit((value >> shift) & 1 == 1)));
    }
    match c {
        'U' | 'u' | 'X' | 'x' | 'Z' | 'z' | 'W' | 'w' | '-' => Logic::from_char(c).map(|bit| [bit; 4]),
        _ => None,
    }
}

/// Whether `c` can start a hexadecimal data token.
#[must_use]
pub fn is_hex_start(c: char) -> bool {
    hex_nibble(c).is_some()
}

/// Whether `c` can start a binary data token.
#[must_use]
pub fn is_binary_start(c: char) -> bool {
    Logic::from_char(c).is_some()
}

/// Read a run of symbols decoded by `decode`, skipping `_` separators and
/// stopping at the first other character or a comment opener.
fn read_run<const N: usize>(
    line: &mut LineCursor<'_>,
    decode: impl Fn(char) -> Option<[Logic; N]>,
) -> (Vec<Logic>, usize) {
    let mut bits = Vec::new();
    let mut symbols = 0;
    while let Some(c) = line.peek() {
        if line.starts_comment() {
            break;
        }
        if c == '_' {
            line.advance();
            continue;
        }
        let Some(decoded) = decode(c) else { break };
        line.advance();
        bits.extend(decoded);
        symbols += 1;
    }
    (bits, symbols)
}

/// Why a run of symbols could not be decoded as a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFault {
    /// No symbols at all.
    Empty,
    /// Fewer symbols than the width needs.
    Short { symbols: usize, needed: usize },
    /// Known `1` bits, or a mix of symbols, above the width.
    Overwide { width: usize },
}

impl fmt::Display for TokenFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("no digits"),
            Self::Short { symbols, needed } => {
                write!(f, "{symbols} digits, expected at least {needed}")
            }
            Self::Overwide { width } => write!(f, "value does not fit in {width} bits"),
        }
    }
}

/// Decoded word and the number of symbols consumed.
pub type TokenResult = Result<(LogicVector, usize), TokenFault>;

/// Fit `bits` to `width`. The run must supply at least `min_symbols`
/// symbols. Each bit above `width` must be a known zero, or repeat the
/// indeterminate symbol of the top kept bit (a marker nibble straddling
/// the width).
fn fit(bits: Vec<Logic>, symbols: usize, min_symbols: usize, width: usize) -> TokenResult {
    if symbols == 0 {
        return Err(TokenFault::Empty);
    }
    if symbols < min_symbols || bits.len() < width {
        return Err(TokenFault::Short {
            symbols,
            needed: min_symbols,
        });
    }
    let excess = bits.len() - width;
    let top = bits.get(excess).copied().filter(|b| b.is_indeterminate());
    let fits = bits[..excess]
        .iter()
        .all(|b| b.to_bit() == Some(false) || Some(*b) == top);
    if !fits {
        return Err(TokenFault::Overwide { width });
    }
    Ok((LogicVector::new(bits[excess..].to_vec()), symbols))
}

/// Decode a hex run into a `width`-bit word, returning the word and the
/// number of digits consumed.
pub fn read_hex_token(line: &mut LineCursor<'_>, width: usize) -> TokenResult {
    let (bits, digits) = read_run(line, hex_nibble);
    fit(bits, digits, width.div_ceil(4).max(1), width)
}

/// Decode a run of bit symbols into a `width`-bit word.
pub fn read_binary_token(line: &mut LineCursor<'_>, width: usize) -> TokenResult {
    let (bits, symbols) = read_run(line, |c| Logic::from_char(c).map(|bit| [bit]));
    fit(bits, symbols, width.max(1), width)
}
