//! Per-participant vote option records.

use ark_bn254::Fr;
use sotto_hash::FieldHash;
use sotto_tree::{IncrementalTree, MerkleWitness, TreeResult};

/// Current vote weight per option for a single participant.
///
/// The weights are the leaves of the participant's vote option tree; the
/// tree itself is rebuilt on demand because the record is only a handful
/// of words while the tree carries every internal node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteRecord {
    depth: usize,
    weights: Vec<u64>,
}

impl VoteRecord {
    pub fn new(depth: usize, max_options: u64) -> Self {
        Self {
            depth,
            weights: vec![0; max_options as usize],
        }
    }

    pub fn weight(&self, option: u64) -> u64 {
        self.weights.get(option as usize).copied().unwrap_or(0)
    }

    pub fn set_weight(&mut self, option: u64, weight: u64) {
        if let Some(slot) = self.weights.get_mut(option as usize) {
            *slot = weight;
        }
    }

    pub fn weights(&self) -> &[u64] {
        &self.weights
    }

    fn build_tree<H: FieldHash>(&self, hasher: &H) -> TreeResult<IncrementalTree> {
        let mut tree = IncrementalTree::new(self.depth, Fr::from(0u64), hasher);
        for weight in &self.weights {
            tree.insert(Fr::from(*weight), hasher)?;
        }
        Ok(tree)
    }

    /// Root of the participant's vote option tree.
    pub fn root<H: FieldHash>(&self, hasher: &H) -> TreeResult<Fr> {
        Ok(self.build_tree(hasher)?.root())
    }

    /// Inclusion witness for one option's weight leaf.
    pub fn witness<H: FieldHash>(&self, option: u64, hasher: &H) -> TreeResult<MerkleWitness> {
        self.build_tree(hasher)?.witness(option as usize)
    }

    /// Root of a vote option tree in which no votes have been cast.
    pub fn empty_root<H: FieldHash>(depth: usize, hasher: &H) -> Fr {
        IncrementalTree::new(depth, Fr::from(0u64), hasher).empty_root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotto_hash::Poseidon;

    #[test]
    fn fresh_record_matches_empty_root() {
        let hasher = Poseidon::new();
        let record = VoteRecord::new(3, 8);
        // All-zero weights hash to the same root as an all-empty tree with
        // a zero empty leaf.
        assert_eq!(
            record.root(&hasher).unwrap(),
            VoteRecord::empty_root(3, &hasher)
        );
    }

    #[test]
    fn weight_updates_move_the_root() {
        let hasher = Poseidon::new();
        let mut record = VoteRecord::new(3, 8);
        let before = record.root(&hasher).unwrap();
        record.set_weight(2, 5);
        let after = record.root(&hasher).unwrap();
        assert_ne!(before, after);
        assert_eq!(record.weight(2), 5);
        assert_eq!(record.weight(3), 0);
    }

    #[test]
    fn witness_folds_to_root() {
        let hasher = Poseidon::new();
        let mut record = VoteRecord::new(3, 8);
        record.set_weight(1, 4);
        record.set_weight(6, 9);
        let root = record.root(&hasher).unwrap();
        let witness = record.witness(6, &hasher).unwrap();
        assert!(witness.verify(Fr::from(9u64), root, &hasher));
        assert!(!witness.verify(Fr::from(8u64), root, &hasher));
    }

    #[test]
    fn out_of_range_reads_are_zero() {
        let record = VoteRecord::new(3, 8);
        assert_eq!(record.weight(99), 0);
    }
}
