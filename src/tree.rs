//! Huffman tree construction
//!
//! The tree lives in an arena; children are referenced by index. Both the
//! encoder and the decoder build it from a [`FrequencyTable`] alone, so the
//! construction must be fully deterministic: ties on frequency are broken by
//! insertion order, earliest first.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::frequency::FrequencyTable;

/// Index of a node inside [`HuffmanTree`].
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Leaf { symbol: u8, freq: u64 },
    Internal { freq: u64, left: NodeId, right: NodeId },
}

impl Node {
    pub fn freq(&self) -> u64 {
        match self {
            Node::Leaf { freq, .. } | Node::Internal { freq, .. } => *freq,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl HuffmanTree {
    /// Build the tree for `table`, or `None` when the table is empty.
    ///
    /// A single-symbol table yields a lone leaf root.
    pub fn build(table: &FrequencyTable) -> Option<Self> {
        let mut nodes: Vec<Node> = Vec::with_capacity(table.distinct() * 2);
        // (freq, insertion sequence, node); the sequence is also the node id
        let mut heap = BinaryHeap::new();

        for (symbol, count) in table.iter() {
            let id = nodes.len();
            let freq = count as u64;
            nodes.push(Node::Leaf { symbol, freq });
            heap.push(Reverse((freq, id)));
        }

        while heap.len() > 1 {
            let Reverse((lf, left)) = heap.pop()?;
            let Reverse((rf, right)) = heap.pop()?;
            let id = nodes.len();
            let freq = lf + rf;
            nodes.push(Node::Internal { freq, left, right });
            heap.push(Reverse((freq, id)));
        }

        let Reverse((_, root)) = heap.pop()?;
        Some(Self { nodes, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_for(data: &[u8]) -> HuffmanTree {
        HuffmanTree::build(&FrequencyTable::from_bytes(data)).unwrap()
    }

    #[test]
    fn test_empty_table_has_no_tree() {
        assert!(HuffmanTree::build(&FrequencyTable::from_bytes(b"")).is_none());
    }

    #[test]
    fn test_single_symbol_is_lone_leaf() {
        let tree = tree_for(b"aaaaaa");
        assert_eq!(tree.len(), 1);
        assert_eq!(
            *tree.node(tree.root()),
            Node::Leaf { symbol: b'a', freq: 6 }
        );
    }

    #[test]
    fn test_node_count() {
        let data: Vec<u8> = (0..=255).collect();
        let tree = tree_for(&data);
        let leaves = (0..tree.len())
            .filter(|&id| matches!(tree.node(id), Node::Leaf { .. }))
            .count();
        assert_eq!(leaves, 256);
        assert_eq!(tree.len(), 2 * 256 - 1);
        assert_eq!(tree.node(tree.root()).freq(), 256);
    }

    #[test]
    fn test_tie_break_prefers_earlier_nodes() {
        // A:5 B:3 C:2 -> C and B merge into 5 (seq 3); A (seq 0) beats it
        let tree = tree_for(b"AAAAABBBCC");
        let Node::Internal { left, right, freq } = *tree.node(tree.root()) else {
            panic!("root should be internal");
        };
        assert_eq!(freq, 10);
        assert_eq!(*tree.node(left), Node::Leaf { symbol: b'A', freq: 5 });
        let Node::Internal { left, right, .. } = *tree.node(right) else {
            panic!("right child should be internal");
        };
        assert_eq!(*tree.node(left), Node::Leaf { symbol: b'C', freq: 2 });
        assert_eq!(*tree.node(right), Node::Leaf { symbol: b'B', freq: 3 });
    }

    #[test]
    fn test_equal_frequencies_keep_symbol_order() {
        let tree = tree_for(b"dcba");
        let Node::Internal { left, right, .. } = *tree.node(tree.root()) else {
            panic!("root should be internal");
        };
        // a+b merged first, then c+d; the older merge goes left
        let Node::Internal { left: ll, .. } = *tree.node(left) else {
            panic!();
        };
        let Node::Internal { left: rl, .. } = *tree.node(right) else {
            panic!();
        };
        assert_eq!(*tree.node(ll), Node::Leaf { symbol: b'a', freq: 1 });
        assert_eq!(*tree.node(rl), Node::Leaf { symbol: b'c', freq: 1 });
    }

    #[test]
    fn test_rebuild_is_identical() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let table = FrequencyTable::from_bytes(data);
        let pairs: Vec<(u8, u32)> = table.iter().collect();
        let reloaded = FrequencyTable::from_pairs(pairs.into_iter().rev()).unwrap();
        assert_eq!(HuffmanTree::build(&table), HuffmanTree::build(&reloaded));
    }
}
