//! Code tables derived from a Huffman tree

use std::collections::HashMap;
use std::fmt;

use crate::error::{CompressError, Result, Stage};
use crate::frequency::FrequencyTable;
use crate::tree::{HuffmanTree, Node};

/// Longest code the packer can carry in a single word.
pub const MAX_CODE_LEN: u8 = 64;

/// A variable-length bit code, most significant bit first.
///
/// `bits` holds the code right-aligned; only the low `len` bits count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Code {
    pub bits: u64,
    pub len: u8,
}

impl Code {
    pub const EMPTY: Code = Code { bits: 0, len: 0 };

    /// This code followed by one more bit.
    pub fn push(self, bit: bool) -> Code {
        Code {
            bits: (self.bits << 1) | bit as u64,
            len: self.len + 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.len).rev() {
            let bit = (self.bits >> i) & 1;
            f.write_str(if bit == 1 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Symbol -> code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: [Option<Code>; 256],
    max_len: u8,
}

impl CodeTable {
    /// Walk the tree depth-first, `0` for left and `1` for right.
    ///
    /// A tree made of a single leaf gets the one-bit code `0`.
    pub fn from_tree(tree: &HuffmanTree) -> Result<Self> {
        let mut codes = [None; 256];
        let mut max_len = 0;

        if let Node::Leaf { symbol, .. } = *tree.node(tree.root()) {
            codes[symbol as usize] = Some(Code::EMPTY.push(false));
            return Ok(Self { codes, max_len: 1 });
        }

        let mut stack = vec![(tree.root(), Code::EMPTY)];
        while let Some((id, code)) = stack.pop() {
            match *tree.node(id) {
                Node::Leaf { symbol, .. } => {
                    max_len = max_len.max(code.len);
                    codes[symbol as usize] = Some(code);
                }
                Node::Internal { left, right, .. } => {
                    if code.len >= MAX_CODE_LEN {
                        return Err(CompressError::malformed(
                            Stage::TreeRebuild,
                            format!("code length exceeds {MAX_CODE_LEN} bits"),
                        ));
                    }
                    stack.push((right, code.push(true)));
                    stack.push((left, code.push(false)));
                }
            }
        }

        Ok(Self { codes, max_len })
    }

    pub fn get(&self, symbol: u8) -> Option<Code> {
        self.codes[symbol as usize]
    }

    /// Length of the longest code in the table.
    pub fn max_len(&self) -> u8 {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.codes.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, Code)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(s, c)| c.map(|c| (s as u8, c)))
    }

    /// Exact number of payload bits needed to encode input with these counts.
    pub fn encoded_bits(&self, table: &FrequencyTable) -> u64 {
        table
            .iter()
            .map(|(symbol, count)| {
                let len = self.get(symbol).map_or(0, |c| c.len as u64);
                count as u64 * len
            })
            .sum()
    }

    /// Packed payload size in bytes, padding included.
    pub fn encoded_bytes(&self, table: &FrequencyTable) -> u64 {
        self.encoded_bits(table).div_ceil(8)
    }

    pub fn reverse(&self) -> ReverseCodeTable {
        ReverseCodeTable {
            symbols: self.iter().map(|(s, c)| (c, s)).collect(),
            max_len: self.max_len,
        }
    }
}

/// Code -> symbol
#[derive(Debug, Clone)]
pub struct ReverseCodeTable {
    symbols: HashMap<Code, u8>,
    max_len: u8,
}

impl ReverseCodeTable {
    pub fn get(&self, code: &Code) -> Option<u8> {
        self.symbols.get(code).copied()
    }

    pub fn max_len(&self) -> u8 {
        self.max_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes_for(data: &[u8]) -> CodeTable {
        let tree = HuffmanTree::build(&FrequencyTable::from_bytes(data)).unwrap();
        CodeTable::from_tree(&tree).unwrap()
    }

    #[test]
    fn test_known_assignment() {
        let codes = codes_for(b"AAAAABBBCC");
        assert_eq!(codes.get(b'A').unwrap().to_string(), "0");
        assert_eq!(codes.get(b'C').unwrap().to_string(), "10");
        assert_eq!(codes.get(b'B').unwrap().to_string(), "11");
        assert_eq!(codes.get(b'D'), None);
        assert_eq!(codes.max_len(), 2);
    }

    #[test]
    fn test_single_symbol_gets_one_bit() {
        let codes = codes_for(b"zzzz");
        assert_eq!(codes.get(b'z'), Some(Code { bits: 0, len: 1 }));
        assert_eq!(codes.len(), 1);
    }

    #[test]
    fn test_prefix_free() {
        let data: Vec<u8> = (0u32..2000).map(|i| ((i * i) % 251) as u8).collect();
        let codes = codes_for(&data);
        let all: Vec<String> = codes.iter().map(|(_, c)| c.to_string()).collect();
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a.as_str()), "{a} is a prefix of {b}");
                }
            }
        }
    }

    #[test]
    fn test_reverse_is_bijective() {
        let codes = codes_for(b"hello world hello world hello");
        let reverse = codes.reverse();
        for (symbol, code) in codes.iter() {
            assert_eq!(reverse.get(&code), Some(symbol));
        }
    }

    #[test]
    fn test_encoded_size() {
        let data = b"AAAAABBBCC";
        let table = FrequencyTable::from_bytes(data);
        let codes = codes_for(data);
        assert_eq!(codes.encoded_bits(&table), 5 + 3 * 2 + 2 * 2);
        assert_eq!(codes.encoded_bytes(&table), 2);
    }

    #[test]
    fn test_code_display() {
        let code = Code::EMPTY.push(true).push(false).push(true).push(true);
        assert_eq!(code.to_string(), "1011");
        assert_eq!(code.bits, 0b1011);
    }
}
