///
/// KeyReader
///
/// Forward-only cursor over encoded key bytes.
///

#[derive(Clone, Copy, Debug)]
pub struct KeyReader<'a> {
    buf: &'a [u8],
}

impl<'a> KeyReader<'a> {
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn peek_byte(&self) -> Option<u8> {
        self.buf.first().copied()
    }

    pub fn read_byte(&mut self) -> Option<u8> {
        let (&first, rest) = self.buf.split_first()?;
        self.buf = rest;

        Some(first)
    }

    /// Read exactly `n` bytes, leaving the reader untouched if fewer remain.
    pub fn read_exact(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.buf.len() < n {
            return None;
        }
        let (head, rest) = self.buf.split_at(n);
        self.buf = rest;

        Some(head)
    }

    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.read_exact(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);

        Some(out)
    }

    /// Read up to `delim`, consuming the delimiter but not returning it.
    pub fn read_until(&mut self, delim: u8) -> Option<&'a [u8]> {
        let pos = self.buf.iter().position(|&b| b == delim)?;
        let head = &self.buf[..pos];
        self.buf = &self.buf[pos + 1..];

        Some(head)
    }

    pub const fn read_rest(&mut self) -> &'a [u8] {
        let rest = self.buf;
        self.buf = &[];

        rest
    }

    /// Consume `prefix` if the remaining bytes start with it.
    pub fn skip_prefix(&mut self, prefix: &[u8]) -> bool {
        match self.buf.strip_prefix(prefix) {
            Some(rest) => {
                self.buf = rest;
                true
            }
            None => false,
        }
    }

    pub fn read_uvarint(&mut self) -> Result<u64, leb128::read::Error> {
        leb128::read::unsigned(&mut self.buf)
    }
}
