use std::io::Read;

use log::trace;

use crate::{CborError, ErrorCode};

/// A source of Unicode scalar values, one per call.
pub trait CharacterInput {
    /// The next character, or `None` at the end of input.
    ///
    /// # Errors
    ///
    /// A malformed-input error for undecodable input, or `IoFailure` if the underlying stream
    /// fails.
    fn read_char(&mut self) -> Result<Option<char>, CborError>;

    /// Number of characters returned so far.
    fn position(&self) -> usize;
}

/// Characters of an in-memory string.
#[derive(Debug, Clone)]
pub struct StrInput<'a> {
    chars: core::str::Chars<'a>,
    pos: usize,
}

impl<'a> StrInput<'a> {
    /// Read from `s`.
    #[must_use]
    pub fn new(s: &'a str) -> Self {
        Self {
            chars: s.chars(),
            pos: 0,
        }
    }
}

impl CharacterInput for StrInput<'_> {
    #[inline]
    fn read_char(&mut self) -> Result<Option<char>, CborError> {
        let c = self.chars.next();
        if c.is_some() {
            self.pos += 1;
        }
        Ok(c)
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos
    }
}

/// Unicode encoding forms recognized by [`CharacterReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8.
    Utf8,
    /// UTF-16, little-endian.
    Utf16Le,
    /// UTF-16, big-endian.
    Utf16Be,
    /// UTF-32, little-endian.
    Utf32Le,
    /// UTF-32, big-endian.
    Utf32Be,
}

const READ_CHUNK: usize = 4096;

/// Decodes characters from a byte stream.
///
/// Without a declared encoding, the first bytes select one: a byte order mark if present, else
/// the position of zero bytes among the first four (ASCII text in UTF-16/32 has zero bytes at
/// fixed offsets), else UTF-8.
pub struct CharacterReader<R> {
    inner: R,
    buf: Vec<u8>,
    start: usize,
    eof: bool,
    encoding: Option<TextEncoding>,
    replace: bool,
    consumed: usize,
    chars: usize,
}

impl<R: Read> CharacterReader<R> {
    /// Auto-detect the encoding. Malformed input fails unless `replace` is set, in which case it
    /// decodes as U+FFFD.
    pub fn new(inner: R, replace: bool) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            start: 0,
            eof: false,
            encoding: None,
            replace,
            consumed: 0,
            chars: 0,
        }
    }

    /// Read with a declared encoding; no byte order mark is skipped.
    pub fn with_encoding(inner: R, encoding: TextEncoding, replace: bool) -> Self {
        let mut reader = Self::new(inner, replace);
        reader.encoding = Some(encoding);
        reader
    }

    /// The encoding in use, once known.
    #[must_use]
    pub const fn encoding(&self) -> Option<TextEncoding> {
        self.encoding
    }

    /// Ensure at least `n` unread bytes are buffered, unless the stream ends first.
    fn fill(&mut self, n: usize) -> Result<(), CborError> {
        while self.buf.len() - self.start < n && !self.eof {
            if self.start > 0 {
                self.buf.drain(..self.start);
                self.start = 0;
            }
            let len = self.buf.len();
            self.buf.resize(len + READ_CHUNK, 0);
            let got = loop {
                match self.inner.read(&mut self.buf[len..]) {
                    Ok(got) => break got,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        self.buf.truncate(len);
                        return Err(e.into());
                    }
                }
            };
            self.buf.truncate(len + got);
            if got == 0 {
                self.eof = true;
            }
        }
        Ok(())
    }

    fn available(&self) -> &[u8] {
        &self.buf[self.start..]
    }

    fn consume(&mut self, n: usize) {
        self.start += n;
        self.consumed += n;
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, CborError> {
        self.fill(1)?;
        Ok(self.available().first().copied())
    }

    fn detect(&mut self) -> Result<TextEncoding, CborError> {
        self.fill(4)?;
        let b = self.available();
        let (encoding, bom) = match b {
            [0xef, 0xbb, 0xbf, ..] => (TextEncoding::Utf8, 3),
            [0xff, 0xfe, 0, 0, ..] => (TextEncoding::Utf32Le, 4),
            [0xff, 0xfe, ..] => (TextEncoding::Utf16Le, 2),
            [0xfe, 0xff, ..] => (TextEncoding::Utf16Be, 2),
            [0, 0, 0xfe, 0xff, ..] => (TextEncoding::Utf32Be, 4),
            [0, 0, 0, x, ..] if *x != 0 => (TextEncoding::Utf32Be, 0),
            [x, 0, 0, 0, ..] if *x != 0 => (TextEncoding::Utf32Le, 0),
            [0, x, ..] if *x != 0 => (TextEncoding::Utf16Be, 0),
            [x, 0, ..] if *x != 0 => (TextEncoding::Utf16Le, 0),
            _ => (TextEncoding::Utf8, 0),
        };
        trace!("character reader: detected {encoding:?}");
        self.consume(bom);
        self.encoding = Some(encoding);
        Ok(encoding)
    }

    fn malformed(&self, code: ErrorCode) -> Result<Option<char>, CborError> {
        if self.replace {
            Ok(Some(char::REPLACEMENT_CHARACTER))
        } else {
            Err(CborError::new(code, self.consumed))
        }
    }

    fn read_utf8(&mut self) -> Result<Option<char>, CborError> {
        let Some(lead) = self.peek_byte()? else {
            return Ok(None);
        };
        self.consume(1);
        if lead < 0x80 {
            return Ok(Some(char::from(lead)));
        }
        let (len, min, init) = match lead {
            0xc2..=0xdf => (2, 0x80, lead & 0x1f),
            0xe0..=0xef => (3, 0x800, lead & 0x0f),
            0xf0..=0xf4 => (4, 0x1_0000, lead & 0x07),
            _ => return self.malformed(ErrorCode::Utf8Invalid),
        };
        let mut cp = u32::from(init);
        for _ in 1..len {
            match self.peek_byte()? {
                Some(b) if b & 0xc0 == 0x80 => {
                    self.consume(1);
                    cp = (cp << 6) | u32::from(b & 0x3f);
                }
                _ => return self.malformed(ErrorCode::Utf8Invalid),
            }
        }
        match char::from_u32(cp) {
            Some(c) if cp >= min => Ok(Some(c)),
            _ => self.malformed(ErrorCode::Utf8Invalid),
        }
    }

    fn peek_unit16(&mut self, big_endian: bool) -> Result<Option<u16>, CborError> {
        self.fill(2)?;
        Ok(match self.available() {
            [a, b, ..] if big_endian => Some(u16::from_be_bytes([*a, *b])),
            [a, b, ..] => Some(u16::from_le_bytes([*a, *b])),
            _ => None,
        })
    }

    fn read_utf16(&mut self, big_endian: bool) -> Result<Option<char>, CborError> {
        let Some(unit) = self.peek_unit16(big_endian)? else {
            if self.available().is_empty() {
                return Ok(None);
            }
            self.consume(1);
            return self.malformed(ErrorCode::Utf16Invalid);
        };
        self.consume(2);
        match unit {
            0xd800..=0xdbff => match self.peek_unit16(big_endian)? {
                Some(low @ 0xdc00..=0xdfff) => {
                    self.consume(2);
                    let cp = 0x1_0000 + ((u32::from(unit) - 0xd800) << 10) + (u32::from(low) - 0xdc00);
                    match char::from_u32(cp) {
                        Some(c) => Ok(Some(c)),
                        None => self.malformed(ErrorCode::Utf16Invalid),
                    }
                }
                _ => self.malformed(ErrorCode::Utf16Invalid),
            },
            0xdc00..=0xdfff => self.malformed(ErrorCode::Utf16Invalid),
            _ => Ok(char::from_u32(u32::from(unit))),
        }
    }

    fn read_utf32(&mut self, big_endian: bool) -> Result<Option<char>, CborError> {
        self.fill(4)?;
        let unit = match self.available() {
            [] => return Ok(None),
            [a, b, c, d, ..] if big_endian => u32::from_be_bytes([*a, *b, *c, *d]),
            [a, b, c, d, ..] => u32::from_le_bytes([*a, *b, *c, *d]),
            partial => {
                let n = partial.len();
                self.consume(n);
                return self.malformed(ErrorCode::Utf32Invalid);
            }
        };
        self.consume(4);
        match char::from_u32(unit) {
            Some(c) => Ok(Some(c)),
            None => self.malformed(ErrorCode::Utf32Invalid),
        }
    }
}

impl<R: Read> CharacterInput for CharacterReader<R> {
    fn read_char(&mut self) -> Result<Option<char>, CborError> {
        let encoding = match self.encoding {
            Some(e) => e,
            None => self.detect()?,
        };
        let c = match encoding {
            TextEncoding::Utf8 => self.read_utf8()?,
            TextEncoding::Utf16Le => self.read_utf16(false)?,
            TextEncoding::Utf16Be => self.read_utf16(true)?,
            TextEncoding::Utf32Le => self.read_utf32(false)?,
            TextEncoding::Utf32Be => self.read_utf32(true)?,
        };
        if c.is_some() {
            self.chars += 1;
        }
        Ok(c)
    }

    fn position(&self) -> usize {
        self.chars
    }
}

impl<R> core::fmt::Debug for CharacterReader<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CharacterReader")
            .field("encoding", &self.encoding)
            .field("replace", &self.replace)
            .field("consumed", &self.consumed)
            .finish_non_exhaustive()
    }
}
