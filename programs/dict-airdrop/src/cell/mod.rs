//! Binary cells: up to 1023 data bits and four references per cell, each cell
//! addressed by the keccak hash of its representation.
//!
//! Two exotic kinds are supported. A pruned branch stands in for a subtree and
//! reports that subtree's hash and depth to its parent, so a tree with pruned
//! branches hashes exactly like the original. A Merkle proof cell wraps such a
//! partial tree and records the hash it claims to reproduce.
//!
//! Every cell therefore carries two hashes. `hash` is what a parent sees and
//! is the same for a subtree and its pruned stand-in. `repr_hash` covers the
//! cell as written, pruned branches included, and tells two partial trees of
//! the same root apart.

use std::sync::Arc;

use anchor_lang::prelude::*;
use anchor_lang::solana_program::keccak::hashv;

use crate::DistributionError;

mod boc;
mod builder;
mod slice;

pub use boc::*;
pub use builder::CellBuilder;
pub use slice::CellSlice;

pub const MAX_CELL_BITS: usize = 1023;
pub const MAX_CELL_REFS: usize = 4;

pub const PRUNED_BRANCH_TAG: u8 = 1;
pub const MERKLE_PROOF_TAG: u8 = 3;

// tag byte, hash, big-endian depth
const EXOTIC_BITS: usize = 8 + 256 + 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Ordinary,
    PrunedBranch,
    MerkleProof,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    kind: CellKind,
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
    hash: [u8; 32],
    repr_hash: [u8; 32],
    depth: u16,
}

impl Cell {
    /// Validates the layout and computes hash and depth. Bits past `bit_len`
    /// in the last byte are cleared.
    pub fn new(
        exotic: bool,
        mut data: Vec<u8>,
        bit_len: usize,
        refs: Vec<Arc<Cell>>,
    ) -> Result<Arc<Cell>> {
        if bit_len > MAX_CELL_BITS || refs.len() > MAX_CELL_REFS || data.len() != (bit_len + 7) / 8 {
            return err!(DistributionError::MalformedCell);
        }
        if bit_len % 8 != 0 {
            let last = data.len() - 1;
            data[last] &= 0xffu8 << (8 - bit_len % 8);
        }

        let kind = if !exotic {
            CellKind::Ordinary
        } else {
            match data.first() {
                Some(&PRUNED_BRANCH_TAG) => CellKind::PrunedBranch,
                Some(&MERKLE_PROOF_TAG) => CellKind::MerkleProof,
                _ => return err!(DistributionError::MalformedCell),
            }
        };

        let (hash, depth) = match kind {
            CellKind::Ordinary => {
                let depth = child_depth(&refs)?;
                (representation_hash(false, &data, bit_len, &refs, Cell::hash), depth)
            }
            CellKind::PrunedBranch => {
                if bit_len != EXOTIC_BITS || !refs.is_empty() {
                    return err!(DistributionError::MalformedCell);
                }
                exotic_payload(&data)
            }
            CellKind::MerkleProof => {
                if bit_len != EXOTIC_BITS || refs.len() != 1 {
                    return err!(DistributionError::MalformedCell);
                }
                let (hash, depth) = exotic_payload(&data);
                if hash != refs[0].hash || depth != refs[0].depth {
                    msg!("Merkle proof claims {:02X?} but wraps {:02X?}", hash, refs[0].hash);
                    return err!(DistributionError::MalformedCell);
                }
                let depth = child_depth(&refs)?;
                (representation_hash(true, &data, bit_len, &refs, Cell::hash), depth)
            }
        };
        let repr_hash = representation_hash(kind != CellKind::Ordinary, &data, bit_len, &refs, Cell::repr_hash);

        Ok(Arc::new(Cell {
            kind,
            data,
            bit_len,
            refs,
            hash,
            repr_hash,
            depth,
        }))
    }

    /// Pruned stand-in for `cell`.
    pub fn pruned_branch(cell: &Cell) -> Arc<Cell> {
        let mut data = Vec::with_capacity(EXOTIC_BITS / 8);
        data.push(PRUNED_BRANCH_TAG);
        data.extend_from_slice(&cell.hash);
        data.extend_from_slice(&cell.depth.to_be_bytes());
        let repr_hash = representation_hash(true, &data, EXOTIC_BITS, &[], Cell::repr_hash);
        Arc::new(Cell {
            kind: CellKind::PrunedBranch,
            data,
            bit_len: EXOTIC_BITS,
            refs: Vec::new(),
            hash: cell.hash,
            repr_hash,
            depth: cell.depth,
        })
    }

    pub fn merkle_proof(tree: Arc<Cell>) -> Result<Arc<Cell>> {
        let mut data = Vec::with_capacity(EXOTIC_BITS / 8);
        data.push(MERKLE_PROOF_TAG);
        data.extend_from_slice(&tree.hash);
        data.extend_from_slice(&tree.depth.to_be_bytes());
        Cell::new(true, data, EXOTIC_BITS, vec![tree])
    }

    /// Same data, different children.
    pub fn with_refs(&self, refs: Vec<Arc<Cell>>) -> Result<Arc<Cell>> {
        Cell::new(self.is_exotic(), self.data.clone(), self.bit_len, refs)
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn is_exotic(&self) -> bool {
        self.kind != CellKind::Ordinary
    }

    pub fn bits(&self) -> usize {
        self.bit_len
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn refs(&self) -> &[Arc<Cell>] {
        &self.refs
    }

    /// Hash of the full subtree this cell stands for.
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    /// Hash of the cell exactly as written. Equal to `hash` unless the subtree
    /// contains pruned branches.
    pub fn repr_hash(&self) -> [u8; 32] {
        self.repr_hash
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    pub fn bit(&self, position: usize) -> bool {
        self.data[position / 8] & (0x80 >> (position % 8)) != 0
    }

    pub fn begin_parse(&self) -> CellSlice<'_> {
        CellSlice::new(self)
    }
}

fn child_depth(refs: &[Arc<Cell>]) -> Result<u16> {
    match refs.iter().map(|r| r.depth).max() {
        None => Ok(0),
        Some(depth) => depth
            .checked_add(1)
            .ok_or_else(|| error!(DistributionError::MalformedCell)),
    }
}

fn exotic_payload(data: &[u8]) -> ([u8; 32], u16) {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&data[1..33]);
    (hash, u16::from_be_bytes([data[33], data[34]]))
}

pub(crate) fn descriptors(exotic: bool, bit_len: usize, ref_count: usize) -> [u8; 2] {
    let d1 = ref_count as u8 + if exotic { 8 } else { 0 };
    let d2 = (bit_len / 8 + (bit_len + 7) / 8) as u8;
    [d1, d2]
}

/// Data bytes with the completion tag appended to an incomplete last byte.
pub(crate) fn padded_data(data: &[u8], bit_len: usize) -> Vec<u8> {
    let mut out = data.to_vec();
    if bit_len % 8 != 0 {
        out[bit_len / 8] |= 0x80 >> (bit_len % 8);
    }
    out
}

fn representation_hash(
    exotic: bool,
    data: &[u8],
    bit_len: usize,
    refs: &[Arc<Cell>],
    child_hash: fn(&Cell) -> [u8; 32],
) -> [u8; 32] {
    let descriptors = descriptors(exotic, bit_len, refs.len());
    let padded = padded_data(data, bit_len);
    let depths: Vec<[u8; 2]> = refs.iter().map(|r| r.depth.to_be_bytes()).collect();

    let mut parts: Vec<&[u8]> = vec![descriptors.as_slice(), padded.as_slice()];
    parts.extend(depths.iter().map(|d| d.as_slice()));
    let hashes: Vec<[u8; 32]> = refs.iter().map(|r| child_hash(r)).collect();
    parts.extend(hashes.iter().map(|h| h.as_slice()));
    hashv(&parts).0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(value: u128) -> Arc<Cell> {
        let mut builder = CellBuilder::new();
        builder.store_uint(value, 40).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_hash_depends_on_data_and_refs() {
        let a = leaf(1);
        let b = leaf(2);
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), leaf(1).hash());

        let mut builder = CellBuilder::new();
        builder.store_bit(true).unwrap().store_ref(a.clone()).unwrap();
        let parent_a = builder.build().unwrap();

        let mut builder = CellBuilder::new();
        builder.store_bit(true).unwrap().store_ref(b).unwrap();
        let parent_b = builder.build().unwrap();

        assert_ne!(parent_a.hash(), parent_b.hash());
        assert_eq!(parent_a.depth(), 1);
        assert_eq!(a.depth(), 0);
    }

    #[test]
    fn test_pruned_branch_keeps_parent_hash() {
        let child = leaf(7);
        let mut builder = CellBuilder::new();
        builder.store_uint(5, 3).unwrap().store_ref(child.clone()).unwrap();
        let parent = builder.build().unwrap();

        let pruned = parent.with_refs(vec![Cell::pruned_branch(&child)]).unwrap();
        assert_eq!(pruned.hash(), parent.hash());
        assert_eq!(pruned.refs()[0].kind(), CellKind::PrunedBranch);
        assert_eq!(pruned.refs()[0].hash(), child.hash());
        assert_ne!(pruned.repr_hash(), parent.repr_hash());
        assert_eq!(parent.repr_hash(), parent.hash());
    }

    #[test]
    fn test_merkle_proof_hash_sees_pruned_branches() {
        let left = leaf(1);
        let right = leaf(2);
        let mut builder = CellBuilder::new();
        builder.store_ref(left.clone()).unwrap().store_ref(right.clone()).unwrap();
        let fork = builder.build().unwrap();

        let keep_left = fork.with_refs(vec![left, Cell::pruned_branch(&right)]).unwrap();
        let keep_right = fork.with_refs(vec![Cell::pruned_branch(&fork.refs()[0]), right]).unwrap();
        assert_eq!(keep_left.hash(), keep_right.hash());

        let proof_left = Cell::merkle_proof(keep_left).unwrap();
        let proof_right = Cell::merkle_proof(keep_right).unwrap();
        assert_eq!(proof_left.data(), proof_right.data());
        assert_ne!(proof_left.repr_hash(), proof_right.repr_hash());
    }

    #[test]
    fn test_merkle_proof_wraps_tree() {
        let tree = leaf(9);
        let proof = Cell::merkle_proof(tree.clone()).unwrap();
        assert_eq!(proof.kind(), CellKind::MerkleProof);
        assert_eq!(proof.refs()[0].hash(), tree.hash());
        assert_ne!(proof.hash(), tree.hash());

        // stored hash must match the wrapped tree
        let mut data = proof.data().to_vec();
        data[1] ^= 0xff;
        assert!(Cell::new(true, data, proof.bits(), vec![tree]).is_err());
    }

    #[test]
    fn test_cell_limits() {
        let mut builder = CellBuilder::new();
        for _ in 0..MAX_CELL_BITS {
            builder.store_bit(false).unwrap();
        }
        assert!(builder.store_bit(true).is_err());

        let mut builder = CellBuilder::new();
        for value in 0..MAX_CELL_REFS {
            builder.store_ref(leaf(value as u128)).unwrap();
        }
        assert!(builder.store_ref(leaf(99)).is_err());

        assert!(Cell::new(false, vec![0, 0, 0], 9, Vec::new()).is_err());
        assert!(Cell::new(true, vec![0xaa], 8, Vec::new()).is_err());
    }
}
