use std::str;

use crate::err::{DeserializationError, DeserializationResult};

/// A lightweight cursor over an immutable byte slice.
///
/// All reads are bounds checked and little endian; a failed read reports the
/// offset it started at, what it was reading, and how short the buffer fell.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        ByteCursor { buf, pos: 0 }
    }

    #[inline]
    pub(crate) fn position(&self) -> u64 {
        self.pos as u64
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    fn truncated(&self, what: &'static str, need: usize) -> DeserializationError {
        DeserializationError::Truncated {
            what,
            offset: self.position(),
            need,
            have: self.remaining(),
        }
    }

    #[inline]
    pub(crate) fn take_bytes(
        &mut self,
        len: usize,
        what: &'static str,
    ) -> DeserializationResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or_else(|| self.truncated(what, len))?;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or_else(|| self.truncated(what, len))?;
        self.pos = end;
        Ok(bytes)
    }

    #[inline]
    pub(crate) fn array<const N: usize>(
        &mut self,
        what: &'static str,
    ) -> DeserializationResult<[u8; N]> {
        let bytes = self.take_bytes(N, what)?;
        Ok(bytes.try_into().expect("take_bytes returned `N` bytes"))
    }

    #[inline]
    pub(crate) fn u8(&mut self, what: &'static str) -> DeserializationResult<u8> {
        Ok(self.array::<1>(what)?[0])
    }

    #[inline]
    pub(crate) fn u16(&mut self, what: &'static str) -> DeserializationResult<u16> {
        Ok(u16::from_le_bytes(self.array::<2>(what)?))
    }

    #[inline]
    pub(crate) fn u32(&mut self, what: &'static str) -> DeserializationResult<u32> {
        Ok(u32::from_le_bytes(self.array::<4>(what)?))
    }

    #[inline]
    pub(crate) fn i64(&mut self, what: &'static str) -> DeserializationResult<i64> {
        Ok(i64::from_le_bytes(self.array::<8>(what)?))
    }

    /// Reads `len` bytes and decodes them as UTF-8.
    pub(crate) fn utf8(&mut self, len: usize, what: &'static str) -> DeserializationResult<&'a str> {
        let offset = self.position();
        let bytes = self.take_bytes(len, what)?;
        str::from_utf8(bytes).map_err(|source| DeserializationError::InvalidUtf8String {
            what,
            offset,
            source,
        })
    }
}
