//! Big-endian integer framing shared by the file and archive formats.

use crate::error::{CompressError, Result, Stage};

pub fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Length-prefixed byte string: `[u32 len][bytes]`.
pub fn put_bytes(out: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| CompressError::InputTooLarge {
        size: bytes.len() as u64,
        limit: u32::MAX as u64,
    })?;
    put_u32(out, len);
    out.extend_from_slice(bytes);
    Ok(())
}

/// Bounds-checked cursor over a byte buffer.
///
/// Every short read is reported as a malformed header for the stage the
/// reader was created for, never as a panic.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    stage: Stage,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8], pos: usize, stage: Stage) -> Self {
        Self { buf, pos, stage }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(CompressError::malformed(
                self.stage,
                format!(
                    "{what} needs {n} bytes at offset {} but only {} remain",
                    self.pos,
                    self.remaining()
                ),
            ));
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    pub fn u32(&mut self, what: &str) -> Result<u32> {
        let b = self.take(4, what)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a `[u32 len][bytes]` string.
    pub fn bytes(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.u32(what)? as usize;
        self.take(len, what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_layout() {
        let mut out = Vec::new();
        put_u32(&mut out, 0x0102_0304);
        put_bytes(&mut out, b"hi").unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 0, 0, 0, 2, b'h', b'i']);

        let mut r = Reader::new(&out, 0, Stage::HeaderRead);
        assert_eq!(r.u32("word").unwrap(), 0x0102_0304);
        assert_eq!(r.bytes("name").unwrap(), b"hi");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_short_read_is_malformed() {
        let data = [0u8, 0, 0, 9, b'a'];
        let mut r = Reader::new(&data, 0, Stage::Manifest);
        let err = r.bytes("root path").unwrap_err();
        assert!(matches!(
            err,
            CompressError::MalformedHeader { stage: Stage::Manifest, .. }
        ));
    }
}
