use std::sync::Arc;

use anchor_lang::prelude::*;

use super::builder::Dictionary;
use super::entry::Entry;
use super::label::{key_bit, key_bits, load_label};
use crate::cell::{self, Cell, CellKind};
use crate::{DistributionError, KEY_BITS};

/// Which side of the path a sibling hangs off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sibling {
    pub side: Side,
    pub digest: [u8; 32],
    pub depth: u16,
}

/// Merkle proof cell wrapping the root-to-leaf path of one index, with every
/// branch off that path pruned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    cell: Arc<Cell>,
    tree: Arc<Cell>,
}

struct ProofPath {
    entry: Entry,
    siblings: Vec<Sibling>,
}

impl Dictionary {
    pub fn generate_proof(&self, index: u64) -> Result<MerkleProof> {
        if self.get(index).is_none() {
            msg!("Index {} is not in the dictionary", index);
            return err!(DistributionError::IndexNotFound);
        }
        let path = prune_path(self.root_cell(), index, 0)?;
        MerkleProof::from_cell(Cell::merkle_proof(path)?)
    }
}

impl MerkleProof {
    pub fn from_cell(cell: Arc<Cell>) -> Result<Self> {
        if cell.kind() != CellKind::MerkleProof {
            return err!(DistributionError::MalformedCell);
        }
        let tree = cell
            .refs()
            .first()
            .cloned()
            .ok_or_else(|| error!(DistributionError::MalformedCell))?;
        Ok(Self { cell, tree })
    }

    pub fn from_boc(bytes: &[u8]) -> Result<Self> {
        Self::from_cell(cell::from_boc(bytes)?)
    }

    pub fn to_boc(&self) -> Vec<u8> {
        cell::to_boc(&self.cell)
    }

    pub fn cell(&self) -> &Arc<Cell> {
        &self.cell
    }

    /// Hash of the proof cell itself. Claim instances are keyed by it.
    pub fn fingerprint(&self) -> [u8; 32] {
        self.cell.repr_hash()
    }

    /// Root the proof reproduces.
    pub fn root_hash(&self) -> [u8; 32] {
        self.tree.hash()
    }

    /// Reads the entry for `index` out of the proof. Does not look at the root.
    pub fn entry(&self, index: u64) -> Result<Entry> {
        Ok(walk_path(&self.tree, index)?.entry)
    }

    /// Pruned siblings along the path to `index`, leaf first.
    pub fn siblings(&self, index: u64) -> Result<Vec<Sibling>> {
        Ok(walk_path(&self.tree, index)?.siblings)
    }
}

// `index` must be present below `cell`.
fn prune_path(cell: &Arc<Cell>, index: u64, offset: usize) -> Result<Arc<Cell>> {
    let mut slice = cell.begin_parse();
    let (_, len) = load_label(&mut slice, KEY_BITS - offset)?;
    let split = offset + len;
    if split == KEY_BITS {
        return Ok(cell.clone());
    }

    let next = key_bit(index, split) as usize;
    let refs = cell
        .refs()
        .iter()
        .enumerate()
        .map(|(bit, child)| {
            if bit == next {
                prune_path(child, index, split + 1)
            } else {
                Ok(Cell::pruned_branch(child))
            }
        })
        .collect::<Result<Vec<_>>>()?;
    cell.with_refs(refs)
}

// Only the canonical shape is accepted: ordinary cells on the path, pruned
// branches everywhere else. Anything else could yield a second fingerprint
// for the same index.
fn walk_path(tree: &Cell, index: u64) -> Result<ProofPath> {
    if tree.kind() != CellKind::Ordinary {
        return err!(DistributionError::ProofIndexMismatch);
    }

    let mut cell = tree;
    let mut offset = 0;
    let mut siblings = Vec::new();
    loop {
        let mut slice = cell.begin_parse();
        let (label, len) = load_label(&mut slice, KEY_BITS - offset)?;
        if label != key_bits(index, offset, len) {
            msg!("Proof path diverges from index {} at bit {}", index, offset);
            return err!(DistributionError::ProofIndexMismatch);
        }
        let split = offset + len;

        if split == KEY_BITS {
            let entry = Entry::load_value(index, &mut slice)?;
            slice.end_parse()?;
            siblings.reverse();
            return Ok(ProofPath { entry, siblings });
        }

        if slice.remaining_bits() != 0 || slice.remaining_refs() != 2 {
            return err!(DistributionError::MalformedCell);
        }
        let bit = key_bit(index, split) as usize;
        let next = &cell.refs()[bit];
        let other = &cell.refs()[1 - bit];

        match next.kind() {
            CellKind::Ordinary => {}
            CellKind::PrunedBranch => {
                msg!("Proof prunes the path to index {}", index);
                return err!(DistributionError::ProofIndexMismatch);
            }
            CellKind::MerkleProof => return err!(DistributionError::NonCanonicalProof),
        }
        if other.kind() != CellKind::PrunedBranch {
            msg!("Unpruned sibling at bit {}", split);
            return err!(DistributionError::NonCanonicalProof);
        }

        siblings.push(Sibling {
            side: if bit == 0 { Side::Right } else { Side::Left },
            digest: other.hash(),
            depth: other.depth(),
        });
        cell = next.as_ref();
        offset = split + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::assert_error;
    use crate::dict::{Allocation, IndexMode};

    fn dictionary(count: usize) -> Dictionary {
        let rows: Vec<Allocation> = (0..count)
            .map(|i| Allocation {
                id: None,
                recipient: Pubkey::new_unique(),
                amount: 10 * (i as u128 + 1),
            })
            .collect();
        Dictionary::from_allocations(&rows, IndexMode::Positional).unwrap()
    }

    #[test]
    fn test_proof_reproduces_root() {
        let dict = dictionary(37);
        for entry in dict.entries() {
            let proof = dict.generate_proof(entry.index).unwrap();
            assert_eq!(proof.root_hash(), dict.root());
            assert_eq!(proof.entry(entry.index).unwrap(), *entry);
        }
    }

    #[test]
    fn test_fingerprint_is_unique_per_index() {
        let dict = dictionary(16);
        let a = dict.generate_proof(3).unwrap();
        let b = dict.generate_proof(4).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), dict.generate_proof(3).unwrap().fingerprint());
    }

    #[test]
    fn test_fingerprints_differ_across_all_indices() {
        let dict = dictionary(1000);
        let fingerprints: std::collections::HashSet<[u8; 32]> = dict
            .entries()
            .map(|entry| dict.generate_proof(entry.index).unwrap().fingerprint())
            .collect();
        assert_eq!(fingerprints.len(), 1000);

        // the unpruned tree reproduces the same root under its own fingerprint
        let full = MerkleProof::from_cell(Cell::merkle_proof(dict.root_cell().clone()).unwrap()).unwrap();
        assert_eq!(full.root_hash(), dict.root());
        assert!(!fingerprints.contains(&full.fingerprint()));
    }

    #[test]
    fn test_proof_stays_small() {
        let dict = dictionary(1000);
        let proof = dict.generate_proof(517).unwrap();

        // one fork per bit of 0..1000 at most
        let siblings = proof.siblings(517).unwrap();
        assert_eq!(siblings.len(), 10);
        assert!(proof.to_boc().len() * 20 < dict.to_boc().len());

        let mut depth = 0;
        for sibling in &siblings {
            assert!(sibling.depth >= depth);
            depth = sibling.depth;
        }
    }

    #[test]
    fn test_sibling_sides_follow_index_bits() {
        let dict = dictionary(4);
        // leaf first: index 3 on the right, then the 0..=1 subtree on the left
        let siblings = dict.generate_proof(2).unwrap().siblings(2).unwrap();
        assert_eq!(siblings.len(), 2);
        assert_eq!(siblings[0].side, Side::Right);
        assert_eq!(siblings[1].side, Side::Left);
    }

    #[test]
    fn test_proof_boc_keeps_fingerprint() {
        let dict = dictionary(50);
        let proof = dict.generate_proof(49).unwrap();
        let parsed = MerkleProof::from_boc(&proof.to_boc()).unwrap();
        assert_eq!(parsed, proof);
        assert_eq!(parsed.fingerprint(), proof.fingerprint());
    }

    #[test]
    fn test_proof_does_not_cover_other_indices() {
        let dict = dictionary(8);
        let proof = dict.generate_proof(1).unwrap();
        assert_error(proof.entry(2), DistributionError::ProofIndexMismatch);
        assert_error(proof.entry(1 << 20), DistributionError::ProofIndexMismatch);
        assert_error(dict.generate_proof(8), DistributionError::IndexNotFound);
    }

    #[test]
    fn test_rejects_unpruned_siblings() {
        let dict = dictionary(8);
        let full = MerkleProof::from_cell(Cell::merkle_proof(dict.root_cell().clone()).unwrap()).unwrap();
        assert_eq!(full.root_hash(), dict.root());
        assert_error(full.entry(1), DistributionError::NonCanonicalProof);
    }

    #[test]
    fn test_rejects_ordinary_cell_as_proof() {
        let dict = dictionary(2);
        assert_error(
            MerkleProof::from_cell(dict.root_cell().clone()),
            DistributionError::MalformedCell,
        );
    }
}
