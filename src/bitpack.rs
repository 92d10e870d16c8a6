//! Bit-level packing of variable-length codes into bytes and back.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use crate::code::{Code, CodeTable, ReverseCodeTable};
use crate::error::{CompressError, Result, Stage};

/// Concatenate the code of every byte in `data`, MSB first, and zero-pad the
/// final partial byte.
pub fn pack(data: &[u8], codes: &CodeTable) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len() / 2 + 1);
    {
        let mut writer = BitWriter::endian(&mut output, BigEndian);
        for &b in data {
            let code = codes.get(b).ok_or_else(|| {
                CompressError::malformed(
                    Stage::TreeRebuild,
                    format!("byte {b:#04x} not in code table"),
                )
            })?;
            writer.write(code.len as u32, code.bits)?;
        }
        writer.byte_align()?;
    }
    Ok(output)
}

/// Decode exactly `count` symbols from `payload`.
///
/// Bits left over in the last byte are padding and are never looked at.
pub fn unpack(payload: &[u8], reverse: &ReverseCodeTable, count: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(count);
    let mut reader = BitReader::endian(payload, BigEndian);
    let mut candidate = Code::EMPTY;

    while output.len() < count {
        let bit = match reader.read_bit() {
            Ok(bit) => bit,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(CompressError::malformed(
                    Stage::Unpack,
                    format!(
                        "payload ran out after {} of {count} symbols",
                        output.len()
                    ),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        candidate = candidate.push(bit);

        if let Some(symbol) = reverse.get(&candidate) {
            output.push(symbol);
            candidate = Code::EMPTY;
        } else if candidate.len >= reverse.max_len() {
            return Err(CompressError::malformed(
                Stage::Unpack,
                format!("bit sequence {candidate} matches no code"),
            ));
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::FrequencyTable;
    use crate::tree::HuffmanTree;

    fn tables(data: &[u8]) -> (CodeTable, ReverseCodeTable) {
        let tree = HuffmanTree::build(&FrequencyTable::from_bytes(data)).unwrap();
        let codes = CodeTable::from_tree(&tree).unwrap();
        let reverse = codes.reverse();
        (codes, reverse)
    }

    #[test]
    fn test_pack_known_bits() {
        let data = b"AAAAABBBCC";
        let (codes, _) = tables(data);
        // 00000 111111 1010 + one padding bit
        assert_eq!(pack(data, &codes).unwrap(), vec![0x07, 0xF4]);
    }

    #[test]
    fn test_unpack_known_bits() {
        let (_, reverse) = tables(b"AAAAABBBCC");
        let decoded = unpack(&[0x07, 0xF4], &reverse, 10).unwrap();
        assert_eq!(decoded, b"AAAAABBBCC");
    }

    #[test]
    fn test_padding_not_decoded() {
        // the single padding bit is a valid code for 'A'
        let (_, reverse) = tables(b"AAAAABBBCC");
        let decoded = unpack(&[0x07, 0xF4], &reverse, 10).unwrap();
        assert_eq!(decoded.len(), 10);
    }

    #[test]
    fn test_byte_aligned_stream_has_no_padding_byte() {
        let data = b"aaaaaaaa";
        let (codes, reverse) = tables(data);
        let packed = pack(data, &codes).unwrap();
        assert_eq!(packed, vec![0x00]);
        assert_eq!(unpack(&packed, &reverse, 8).unwrap(), data);
    }

    #[test]
    fn test_unknown_byte_rejected() {
        let (codes, _) = tables(b"abc");
        assert!(matches!(
            pack(b"abd", &codes),
            Err(CompressError::MalformedHeader { stage: Stage::TreeRebuild, .. })
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let data = b"the quick brown fox";
        let (codes, reverse) = tables(data);
        let packed = pack(data, &codes).unwrap();
        let result = unpack(&packed[..packed.len() - 2], &reverse, data.len());
        assert!(matches!(
            result,
            Err(CompressError::MalformedHeader { stage: Stage::Unpack, .. })
        ));
    }

    #[test]
    fn test_single_symbol_rejects_one_bits() {
        let (_, reverse) = tables(b"xxx");
        let result = unpack(&[0x80], &reverse, 3);
        assert!(matches!(result, Err(CompressError::MalformedHeader { .. })));
    }
}
