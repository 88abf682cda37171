//! Binary I/O helpers shared by every artifact
//!
//! Fixed-width integers are little-endian. Variable-length integers are
//! LEB128: seven data bits per byte, low group first, high bit set on every
//! byte but the last.

use std::io::{self, Read, Write};

/// Longest LEB128 encoding of a u64
pub const MAX_VARINT_LEN: usize = 10;

/// Variable-length encoding for unsigned integers
pub fn encode_varint(value: u64, output: &mut Vec<u8>) {
    let mut v = value;
    while v >= 0x80 {
        output.push((v as u8) | 0x80);
        v >>= 7;
    }
    output.push(v as u8);
}

/// Decode a variable-length integer from a byte slice
pub fn decode_varint(input: &[u8], pos: &mut usize) -> io::Result<u64> {
    let mut result: u64 = 0;
    let mut shift = 0;

    loop {
        if *pos >= input.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Unexpected end of varint",
            ));
        }

        let byte = input[*pos];
        *pos += 1;

        result = accumulate(result, byte, shift)?;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

/// Write a variable-length integer, returning the number of bytes written
pub fn write_varint<W: Write>(w: &mut W, value: u64) -> io::Result<usize> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let mut v = value;
    let mut n = 0;
    while v >= 0x80 {
        buf[n] = (v as u8) | 0x80;
        v >>= 7;
        n += 1;
    }
    buf[n] = v as u8;
    n += 1;
    w.write_all(&buf[..n])?;
    Ok(n)
}

/// Read a variable-length integer from a stream
pub fn read_varint<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut result: u64 = 0;
    let mut shift = 0;
    let mut byte = [0u8; 1];

    loop {
        r.read_exact(&mut byte)?;
        result = accumulate(result, byte[0], shift)?;
        if byte[0] & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

fn accumulate(result: u64, byte: u8, shift: u32) -> io::Result<u64> {
    let bits = (byte & 0x7F) as u64;
    // The tenth byte may only carry the top bit of a u64
    if shift > 63 || (shift == 63 && bits > 1) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "Varint value too large",
        ));
    }
    Ok(result | (bits << shift))
}

pub fn write_u32_le<W: Write>(w: &mut W, value: u32) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

pub fn write_u64_le<W: Write>(w: &mut W, value: u64) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

pub fn read_u32_le<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut bytes = [0u8; 4];
    r.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

pub fn read_u64_le<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut bytes = [0u8; 8];
    r.read_exact(&mut bytes)?;
    Ok(u64::from_le_bytes(bytes))
}

/// Read a u32 that starts a record, or `None` on a clean end of stream.
///
/// End of stream after a partial value is an `UnexpectedEof` error.
pub fn read_u32_le_or_eof<R: Read>(r: &mut R) -> io::Result<Option<u32>> {
    let mut bytes = [0u8; 4];
    let mut filled = 0;
    while filled < bytes.len() {
        match r.read(&mut bytes[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "Truncated record header",
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(Some(u32::from_le_bytes(bytes)))
}

/// Write a varint length prefix followed by the bytes
pub fn write_len_prefixed<W: Write>(w: &mut W, bytes: &[u8]) -> io::Result<usize> {
    let n = write_varint(w, bytes.len() as u64)?;
    w.write_all(bytes)?;
    Ok(n + bytes.len())
}

/// Read a varint length prefix followed by that many bytes
pub fn read_len_prefixed<R: Read>(r: &mut R) -> io::Result<Vec<u8>> {
    let len = read_varint(r)?;
    let len = usize::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "Length prefix too large"))?;
    let mut bytes = Vec::new();
    r.take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Truncated length-prefixed field",
        ));
    }
    Ok(bytes)
}

/// Writer adaptor that tracks the current byte position
pub struct CountingWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Bytes written so far
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
