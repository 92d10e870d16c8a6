//! Single-file container
//!
//! Layout, all integers big-endian:
//!
//! ```text
//! [u32 original_length][u32 leaf_count]{[u8 symbol][u32 freq]} x leaf_count [packed bits]
//! ```
//!
//! An empty input is stored as the four-byte zero length and nothing else.
//! Archive entries use the same header with an extra `[u32 packed_len]`
//! in front of the packed bits so that entries can be concatenated.

use tracing::debug;

use crate::bitpack;
use crate::code::{CodeTable, ReverseCodeTable};
use crate::error::{CompressError, Result, Stage};
use crate::frequency::FrequencyTable;
use crate::tree::HuffmanTree;
use crate::wire::{self, Reader};

/// Compress `data` into a self-describing container.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    encode(data, &mut output, false)?;
    Ok(output)
}

/// Reverse [`compress`].
pub fn decompress(container: &[u8]) -> Result<Vec<u8>> {
    let (data, end) = decode(container, 0, false)?;
    if end < container.len() {
        debug!(trailing = container.len() - end, "ignoring bytes after payload");
    }
    Ok(data)
}

/// Append an archive entry for `data` (header, payload length, payload).
pub fn encode_entry(data: &[u8], out: &mut Vec<u8>) -> Result<()> {
    encode(data, out, true)
}

/// Decode the archive entry starting at `offset`, returning the data and
/// the offset of the byte following the entry.
pub fn decode_entry(buf: &[u8], offset: usize) -> Result<(Vec<u8>, usize)> {
    decode(buf, offset, true)
}

fn encode(data: &[u8], out: &mut Vec<u8>, with_payload_len: bool) -> Result<()> {
    let original_length = u32::try_from(data.len()).map_err(|_| CompressError::InputTooLarge {
        size: data.len() as u64,
        limit: u32::MAX as u64,
    })?;
    wire::put_u32(out, original_length);
    if data.is_empty() {
        return Ok(());
    }

    let table = FrequencyTable::from_bytes(data);
    let (codes, _) = rebuild(&table)?;

    wire::put_u32(out, table.distinct() as u32);
    for (symbol, count) in table.iter() {
        out.push(symbol);
        wire::put_u32(out, count);
    }

    let packed = bitpack::pack(data, &codes)?;
    debug!(
        original = data.len(),
        leaves = table.distinct(),
        packed = packed.len(),
        "encoded payload"
    );
    if with_payload_len {
        wire::put_u32(out, packed.len() as u32);
    }
    out.extend_from_slice(&packed);
    Ok(())
}

fn decode(buf: &[u8], offset: usize, with_payload_len: bool) -> Result<(Vec<u8>, usize)> {
    let mut r = Reader::new(buf, offset, Stage::HeaderRead);
    let original_length = r.u32("original length")?;
    if original_length == 0 {
        return Ok((Vec::new(), r.position()));
    }

    let table = read_table(&mut r, original_length)?;

    r.set_stage(Stage::TreeRebuild);
    let (codes, reverse) = rebuild(&table)?;
    let expected = codes.encoded_bytes(&table);

    r.set_stage(Stage::Unpack);
    if with_payload_len {
        let declared = r.u32("payload length")?;
        if declared as u64 != expected {
            return Err(CompressError::malformed(
                Stage::Unpack,
                format!("payload length {declared}, codes need {expected} bytes"),
            ));
        }
    }
    let payload = r.take(expected as usize, "packed payload")?;
    debug!(
        offset,
        original = original_length,
        packed = payload.len(),
        "decoding payload"
    );

    let data = bitpack::unpack(payload, &reverse, original_length as usize)?;
    Ok((data, r.position()))
}

fn read_table(r: &mut Reader<'_>, original_length: u32) -> Result<FrequencyTable> {
    let leaf_count = r.u32("leaf count")?;
    if leaf_count == 0 || leaf_count > 256 {
        return Err(CompressError::malformed(
            Stage::HeaderRead,
            format!("leaf count {leaf_count} outside 1..=256"),
        ));
    }

    let raw = r.take(leaf_count as usize * 5, "frequency table")?;
    let pairs = raw.chunks_exact(5).map(|pair| {
        let count = u32::from_be_bytes([pair[1], pair[2], pair[3], pair[4]]);
        (pair[0], count)
    });
    let table = FrequencyTable::from_pairs(pairs)?;

    if table.total() != original_length as u64 {
        return Err(CompressError::malformed(
            Stage::HeaderRead,
            format!(
                "frequencies sum to {} but original length is {original_length}",
                table.total()
            ),
        ));
    }
    Ok(table)
}

fn rebuild(table: &FrequencyTable) -> Result<(CodeTable, ReverseCodeTable)> {
    let tree = HuffmanTree::build(table)
        .ok_or_else(|| CompressError::malformed(Stage::TreeRebuild, "empty frequency table"))?;
    let codes = CodeTable::from_tree(&tree)?;
    let reverse = codes.reverse();
    Ok((codes, reverse))
}
