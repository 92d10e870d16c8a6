//! Byte frequency analysis

use crate::error::{CompressError, Result, Stage};

/// Occurrence count for every byte value, indexed by symbol.
///
/// Iteration always yields symbols in ascending order, which is the order
/// leaves are seeded into the tree on both the encode and decode side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u32; 256],
}

impl FrequencyTable {
    /// Count every byte in `data`.
    ///
    /// Callers must keep `data.len()` within `u32::MAX`; the container
    /// layer checks this before analysis.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut counts = [0u32; 256];
        for &b in data {
            counts[b as usize] += 1;
        }
        Self { counts }
    }

    /// Rebuild a table from `(symbol, count)` pairs read out of a header.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u8, u32)>,
    {
        let mut counts = [0u32; 256];
        for (symbol, count) in pairs {
            if count == 0 {
                return Err(CompressError::malformed(
                    Stage::HeaderRead,
                    format!("symbol {symbol:#04x} has a zero frequency"),
                ));
            }
            if counts[symbol as usize] != 0 {
                return Err(CompressError::malformed(
                    Stage::HeaderRead,
                    format!("symbol {symbol:#04x} listed twice"),
                ));
            }
            counts[symbol as usize] = count;
        }
        Ok(Self { counts })
    }

    pub fn get(&self, symbol: u8) -> u32 {
        self.counts[symbol as usize]
    }

    /// Number of distinct symbols, i.e. the leaf count of the tree.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Sum of all counts (the length of the analysed input).
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Present symbols with their counts, ascending by symbol.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(s, &c)| (s as u8, c))
    }

    /// Shannon entropy in bits per byte
    pub fn entropy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let len = total as f64;
        let mut entropy = 0.0;
        for (_, count) in self.iter() {
            let p = count as f64 / len;
            entropy -= p * p.log2();
        }
        entropy
    }
}
