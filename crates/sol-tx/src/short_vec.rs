//! Compact-u16 ("shortvec") length prefixes and a strict byte reader.
//!
//! Lengths in the wire format are base-128 little-endian: seven data bits
//! per byte, bit 7 set when another byte follows.
//!
//! - Values 0..0x7f       -> 1 byte
//! - Values 0x80..0x3fff  -> 2 bytes
//! - Values 0x4000..      -> 3 bytes (u16 caps at 0xffff)
//!
//! Decoding only accepts the minimal encoding of each value, so every
//! length has exactly one byte representation.

use crate::error::TxError;

/// Longest valid encoding.
pub const MAX_ENCODING_LENGTH: usize = 3;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Append the compact encoding of `value` to `buf`.
pub fn write_compact_u16(buf: &mut Vec<u8>, value: usize) -> Result<(), TxError> {
    let mut rem = u16::try_from(value).map_err(|_| TxError::ValueTooLarge(value))?;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if rem == 0 {
            return Ok(());
        }
    }
}

/// Encode `value` in compact-u16 form.
pub fn encode_compact_u16(value: usize) -> Result<Vec<u8>, TxError> {
    let mut out = Vec::with_capacity(MAX_ENCODING_LENGTH);
    write_compact_u16(&mut out, value)?;
    Ok(out)
}

/// Write a length prefix followed by each item.
pub fn write_vec<T, F>(buf: &mut Vec<u8>, items: &[T], mut write_item: F) -> Result<(), TxError>
where
    F: FnMut(&mut Vec<u8>, &T) -> Result<(), TxError>,
{
    write_compact_u16(buf, items.len())?;
    for item in items {
        write_item(buf, item)?;
    }
    Ok(())
}

/// Write a length-prefixed byte string.
pub fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), TxError> {
    write_compact_u16(buf, bytes.len())?;
    buf.extend_from_slice(bytes);
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a compact-u16 from the front of `data`.
///
/// Returns `(value, bytes_consumed)`.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), TxError> {
    let mut value: u32 = 0;
    for i in 0..MAX_ENCODING_LENGTH {
        let byte = *data.get(i).ok_or(TxError::TruncatedInput)?;
        // A zero continuation byte means a shorter encoding existed.
        if i > 0 && byte == 0 {
            return Err(TxError::MalformedVarint);
        }
        value |= u32::from(byte & 0x7f) << (i * 7);
        if byte & 0x80 == 0 {
            return u16::try_from(value)
                .map(|v| (v, i + 1))
                .map_err(|_| TxError::MalformedVarint);
        }
    }
    // Third byte still had the continuation bit set.
    Err(TxError::MalformedVarint)
}

/// A forward-only cursor over untrusted wire bytes.
///
/// Every read is bounds-checked; running off the end yields
/// [`TxError::TruncatedInput`].
#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Peek at the next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn read_u8(&mut self) -> Result<u8, TxError> {
        let byte = self.peek_u8().ok_or(TxError::TruncatedInput)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], TxError> {
        if self.remaining() < len {
            return Err(TxError::TruncatedInput);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], TxError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_compact_u16(&mut self) -> Result<u16, TxError> {
        let (value, consumed) = decode_compact_u16(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    /// Read a length prefix, then that many items.
    pub fn read_vec<T, F>(&mut self, mut read_item: F) -> Result<Vec<T>, TxError>
    where
        F: FnMut(&mut Self) -> Result<T, TxError>,
    {
        let len = usize::from(self.read_compact_u16()?);
        // Cap the preallocation by what the input could possibly hold.
        let mut items = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            items.push(read_item(self)?);
        }
        Ok(items)
    }

    /// Read a length-prefixed byte string.
    pub fn read_byte_vec(&mut self) -> Result<Vec<u8>, TxError> {
        let len = usize::from(self.read_compact_u16()?);
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// Require that all input has been consumed.
    pub fn finish(self) -> Result<(), TxError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(TxError::TrailingBytes(n)),
        }
    }
}
