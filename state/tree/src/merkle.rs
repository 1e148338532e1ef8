//! Incremental Merkle tree
//!
//! An arena of per-level node vectors. Only occupied nodes are stored;
//! absent subtrees fall back to a precomputed chain of empty-subtree roots,
//! so inserts and updates touch `depth` nodes instead of rebuilding levels.

use ark_bn254::Fr;
use sotto_hash::FieldHash;

use crate::errors::{TreeError, TreeResult};

/// Fixed-depth binary Merkle tree with incremental updates
#[derive(Clone, Debug)]
pub struct IncrementalTree {
    /// Tree depth
    depth: usize,
    /// Empty-subtree root per level; `zeros[0]` is the empty leaf value
    zeros: Vec<Fr>,
    /// Occupied nodes per level; level 0 holds the leaves
    nodes: Vec<Vec<Fr>>,
    /// Next available leaf index
    next_index: usize,
}

/// Witness for proving leaf membership
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleWitness {
    /// Sibling nodes from leaf level to just below the root
    pub path: Vec<Fr>,
    /// Index of the leaf in the tree
    pub index: usize,
    /// Path directions (true = the current node is the right child)
    pub directions: Vec<bool>,
}

impl MerkleWitness {
    /// Recompute the root implied by this path for a given leaf value
    pub fn fold<H: FieldHash>(&self, leaf: Fr, hasher: &H) -> Fr {
        let mut current = leaf;
        for (sibling, is_right) in self.path.iter().zip(&self.directions) {
            current = if *is_right {
                hasher.hash_two(*sibling, current)
            } else {
                hasher.hash_two(current, *sibling)
            };
        }
        current
    }

    /// Check that a leaf value folds to the expected root
    pub fn verify<H: FieldHash>(&self, leaf: Fr, root: Fr, hasher: &H) -> bool {
        self.fold(leaf, hasher) == root
    }
}

impl IncrementalTree {
    /// Create an empty tree of the given depth.
    ///
    /// `empty_leaf` is the value absent leaves are treated as holding.
    pub fn new<H: FieldHash>(depth: usize, empty_leaf: Fr, hasher: &H) -> Self {
        let mut zeros = Vec::with_capacity(depth + 1);
        zeros.push(empty_leaf);
        for level in 0..depth {
            let z = zeros[level];
            zeros.push(hasher.hash_two(z, z));
        }

        Self {
            depth,
            zeros,
            nodes: vec![Vec::new(); depth + 1],
            next_index: 0,
        }
    }

    /// Tree depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Maximum number of leaves
    pub fn capacity(&self) -> usize {
        1 << self.depth
    }

    /// Number of inserted leaves
    pub fn len(&self) -> usize {
        self.next_index
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.next_index == 0
    }

    /// Current root
    pub fn root(&self) -> Fr {
        self.node(self.depth, 0)
    }

    /// Root of a completely empty tree of this depth
    pub fn empty_root(&self) -> Fr {
        self.zeros[self.depth]
    }

    /// Get a leaf value, if inserted
    pub fn leaf(&self, index: usize) -> Option<Fr> {
        self.nodes[0].get(index).copied()
    }

    /// Append a leaf, returning its index
    pub fn insert<H: FieldHash>(&mut self, leaf: Fr, hasher: &H) -> TreeResult<usize> {
        if self.next_index >= self.capacity() {
            return Err(TreeError::Full {
                capacity: self.capacity(),
            });
        }

        let index = self.next_index;
        self.nodes[0].push(leaf);
        self.next_index += 1;
        self.recompute_path(index, hasher);

        Ok(index)
    }

    /// Overwrite an existing leaf in place
    pub fn update<H: FieldHash>(&mut self, index: usize, leaf: Fr, hasher: &H) -> TreeResult<()> {
        if index >= self.next_index {
            return Err(TreeError::LeafOutOfRange {
                index,
                len: self.next_index,
            });
        }

        self.nodes[0][index] = leaf;
        self.recompute_path(index, hasher);
        Ok(())
    }

    /// Get a membership witness for an inserted leaf
    pub fn witness(&self, index: usize) -> TreeResult<MerkleWitness> {
        if index >= self.next_index {
            return Err(TreeError::LeafOutOfRange {
                index,
                len: self.next_index,
            });
        }

        let mut path = Vec::with_capacity(self.depth);
        let mut directions = Vec::with_capacity(self.depth);
        let mut current = index;

        for level in 0..self.depth {
            let sibling = current ^ 1;
            path.push(self.node(level, sibling));
            directions.push(current & 1 == 1);
            current >>= 1;
        }

        Ok(MerkleWitness {
            path,
            index,
            directions,
        })
    }

    fn node(&self, level: usize, index: usize) -> Fr {
        self.nodes[level]
            .get(index)
            .copied()
            .unwrap_or(self.zeros[level])
    }

    fn recompute_path<H: FieldHash>(&mut self, index: usize, hasher: &H) {
        let mut current = index;
        for level in 0..self.depth {
            let parent = current >> 1;
            let left = self.node(level, parent << 1);
            let right = self.node(level, (parent << 1) | 1);
            let digest = hasher.hash_two(left, right);

            if parent < self.nodes[level + 1].len() {
                self.nodes[level + 1][parent] = digest;
            } else {
                self.nodes[level + 1].push(digest);
            }
            current = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotto_hash::Poseidon;

    fn leaf(n: u64) -> Fr {
        Fr::from(n)
    }

    #[test]
    fn test_empty_tree_root_matches_zero_chain() {
        let hasher = Poseidon::new();
        let tree = IncrementalTree::new(4, leaf(0), &hasher);

        assert_eq!(tree.root(), tree.empty_root());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_insert_changes_root() {
        let hasher = Poseidon::new();
        let mut tree = IncrementalTree::new(4, leaf(0), &hasher);

        let before = tree.root();
        let index = tree.insert(leaf(7), &hasher).unwrap();

        assert_eq!(index, 0);
        assert_eq!(tree.len(), 1);
        assert_ne!(tree.root(), before);
    }

    #[test]
    fn test_incremental_matches_batch_rebuild() {
        let hasher = Poseidon::new();
        let mut tree = IncrementalTree::new(3, leaf(0), &hasher);
        for n in 1..=5 {
            tree.insert(leaf(n), &hasher).unwrap();
        }

        // Rebuild the same tree from scratch, level by level
        let mut level: Vec<Fr> = (1..=5).map(leaf).collect();
        level.resize(8, leaf(0));
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| hasher.hash_two(pair[0], pair[1]))
                .collect();
        }

        assert_eq!(tree.root(), level[0]);
    }

    #[test]
    fn test_witness_verifies_and_rejects() {
        let hasher = Poseidon::new();
        let mut tree = IncrementalTree::new(4, leaf(0), &hasher);

        for n in 0..6 {
            tree.insert(leaf(100 + n), &hasher).unwrap();
        }

        for n in 0..6usize {
            let witness = tree.witness(n).unwrap();
            assert!(witness.verify(leaf(100 + n as u64), tree.root(), &hasher));
            assert!(!witness.verify(leaf(999), tree.root(), &hasher));
        }
    }

    #[test]
    fn test_update_moves_root_and_witness() {
        let hasher = Poseidon::new();
        let mut tree = IncrementalTree::new(4, leaf(0), &hasher);

        for n in 0..4 {
            tree.insert(leaf(n), &hasher).unwrap();
        }

        let witness_before = tree.witness(2).unwrap();
        let root_before = tree.root();

        tree.update(2, leaf(42), &hasher).unwrap();

        assert_ne!(tree.root(), root_before);
        // The pre-update witness folds the new leaf to the new root: the
        // sibling path is untouched by an update of the leaf itself
        assert_eq!(witness_before.fold(leaf(42), &hasher), tree.root());
        assert!(tree.witness(2).unwrap().verify(leaf(42), tree.root(), &hasher));
    }

    #[test]
    fn test_full_tree_rejects_insert() {
        let hasher = Poseidon::new();
        let mut tree = IncrementalTree::new(2, leaf(0), &hasher);

        for n in 0..4 {
            tree.insert(leaf(n), &hasher).unwrap();
        }

        assert_eq!(
            tree.insert(leaf(5), &hasher),
            Err(TreeError::Full { capacity: 4 })
        );
    }

    #[test]
    fn test_update_out_of_range_rejected() {
        let hasher = Poseidon::new();
        let mut tree = IncrementalTree::new(3, leaf(0), &hasher);
        tree.insert(leaf(1), &hasher).unwrap();

        assert!(matches!(
            tree.update(3, leaf(9), &hasher),
            Err(TreeError::LeafOutOfRange { index: 3, len: 1 })
        ));
        assert!(tree.witness(3).is_err());
    }
}
