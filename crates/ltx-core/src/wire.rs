//! TL wire primitives.
//!
//! [`Cursor`] is a `Copy` view over the unread tail of a response buffer.
//! Every read consumes `self` and returns the value together with the
//! advanced cursor, so a failed read leaves the caller's cursor untouched.
//! [`WireWriter`] is the matching encoder used for request packing.

use tracing::trace;

use crate::error::WireError;

/// Length-prefix byte announcing a 3-byte little-endian length.
const LONG_LENGTH_MARKER: u8 = 254;

// ==============================================================================
// Cursor
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

/// Reason a field is read only to move past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discard {
    /// Proof blobs arrive alongside transactions but are not verified here.
    UnverifiedProof,
    /// Block ids listed in a transaction list; header validation is not part
    /// of transaction retrieval.
    BlockHeader,
    /// Block id echoed back with a single transaction.
    EchoedBlockId,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Unread bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn len(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes consumed since the cursor was created.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(self, field: &'static str, n: usize) -> Result<(&'a [u8], Self), WireError> {
        if self.len() < n {
            return Err(WireError::Truncated {
                field,
                needed: n,
                remaining: self.len(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        Ok((
            bytes,
            Self {
                buf: self.buf,
                pos: self.pos + n,
            },
        ))
    }

    fn take_array<const N: usize>(self, field: &'static str) -> Result<([u8; N], Self), WireError> {
        let (bytes, rest) = self.take(field, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok((out, rest))
    }

    pub fn read_u32(self, field: &'static str) -> Result<(u32, Self), WireError> {
        let (raw, rest) = self.take_array::<4>(field)?;
        Ok((u32::from_le_bytes(raw), rest))
    }

    pub fn read_i32(self, field: &'static str) -> Result<(i32, Self), WireError> {
        let (raw, rest) = self.take_array::<4>(field)?;
        Ok((i32::from_le_bytes(raw), rest))
    }

    pub fn read_i64(self, field: &'static str) -> Result<(i64, Self), WireError> {
        let (raw, rest) = self.take_array::<8>(field)?;
        Ok((i64::from_le_bytes(raw), rest))
    }

    pub fn read_u64(self, field: &'static str) -> Result<(u64, Self), WireError> {
        let (raw, rest) = self.take_array::<8>(field)?;
        Ok((u64::from_le_bytes(raw), rest))
    }

    pub fn read_int256(self, field: &'static str) -> Result<([u8; 32], Self), WireError> {
        self.take_array::<32>(field)
    }

    /// Read a TL `bytes` field: length prefix, payload, zero padding to a
    /// 4-byte boundary. The padding must be present.
    pub fn read_bytes(self, field: &'static str) -> Result<(&'a [u8], Self), WireError> {
        let Some(&first) = self.remaining().first() else {
            return Err(WireError::Truncated {
                field,
                needed: 1,
                remaining: 0,
            });
        };

        let (header, len) = match first {
            0..=253 => (1, first as usize),
            LONG_LENGTH_MARKER => {
                let (prefix, _) = self.take(field, 4)?;
                let len = u32::from_le_bytes([prefix[1], prefix[2], prefix[3], 0]) as usize;
                (4, len)
            }
            other => return Err(WireError::InvalidLengthPrefix(other)),
        };

        let total = padded_len(header + len);
        let (framed, rest) = self.take(field, total)?;
        Ok((&framed[header..header + len], rest))
    }

    /// Read a TL `string`. Invalid UTF-8 is replaced rather than rejected,
    /// since server messages are diagnostic text.
    pub fn read_string(self, field: &'static str) -> Result<(String, Self), WireError> {
        let (raw, rest) = self.read_bytes(field)?;
        Ok((String::from_utf8_lossy(raw).into_owned(), rest))
    }

    /// Advance past a TL `bytes` field whose content is intentionally dropped.
    pub fn skip_bytes(self, field: &'static str, why: Discard) -> Result<Self, WireError> {
        let (raw, rest) = self.read_bytes(field)?;
        trace!(field, len = raw.len(), reason = ?why, "skipped bytes field");
        Ok(rest)
    }
}

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

// ==============================================================================
// Writer
// ==============================================================================

#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_int256(&mut self, v: &[u8; 32]) -> &mut Self {
        self.buf.extend_from_slice(v);
        self
    }

    /// Append a TL `bytes` field.
    ///
    /// # Panics
    ///
    /// If `data` is 16 MiB or longer, which the 3-byte length cannot express.
    pub fn put_bytes(&mut self, data: &[u8]) -> &mut Self {
        let header = if data.len() < LONG_LENGTH_MARKER as usize {
            self.buf.push(data.len() as u8);
            1
        } else {
            assert!(data.len() < 1 << 24, "TL bytes field too long");
            let len = (data.len() as u32).to_le_bytes();
            self.buf.extend_from_slice(&[LONG_LENGTH_MARKER, len[0], len[1], len[2]]);
            4
        };
        self.buf.extend_from_slice(data);
        let pad = padded_len(header + data.len()) - (header + data.len());
        self.buf.extend(std::iter::repeat(0u8).take(pad));
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
