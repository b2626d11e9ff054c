use crate::bridge::LineParseError;

/// Cursor over one line of serial input. The JSON wire format is flat enough
/// (one object, string role, integer fields) that a hand-rolled scanner stays
/// bounded and allocation-free.
pub(crate) struct Scanner<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    /// Consumes one expected punctuation byte, ignoring leading whitespace.
    pub fn expect(&mut self, expected: u8) -> Result<(), LineParseError> {
        self.skip_whitespace();

        if self.advance() == Some(expected) {
            Ok(())
        } else {
            Err(LineParseError::Malformed)
        }
    }

    /// Consumes a double-quoted string and returns its contents. Escape
    /// sequences are not part of the wire format and are rejected.
    pub fn quoted(&mut self) -> Result<&'a [u8], LineParseError> {
        self.expect(b'"')?;
        let start = self.pos;

        loop {
            match self.advance() {
                Some(b'"') => return Ok(&self.buf[start..self.pos - 1]),
                Some(b'\\') | None => return Err(LineParseError::Malformed),
                Some(_) => {}
            }
        }
    }

    /// Consumes an unsigned decimal integer. Values too large for any field
    /// domain are reported as out of range rather than wrapped.
    pub fn number(&mut self) -> Result<u32, LineParseError> {
        self.skip_whitespace();

        let mut value = 0u32;
        let mut digits = 0usize;

        while let Some(byte @ b'0'..=b'9') = self.peek() {
            self.pos += 1;
            digits += 1;

            value = value * 10 + u32::from(byte - b'0');
            if value > u32::from(u16::MAX) {
                return Err(LineParseError::FieldRange);
            }
        }

        if digits == 0 {
            return Err(LineParseError::Malformed);
        }

        Ok(value)
    }

    /// True once only trailing whitespace remains.
    pub fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos == self.buf.len()
    }
}
