use anchor_lang::prelude::*;

use super::entry::Entry;
use super::proof::MerkleProof;
use crate::DistributionError;

/// Checks `proof` against `root` and returns the entry it proves for `index`.
pub fn verify_entry(index: u64, proof: &MerkleProof, root: &[u8; 32]) -> Result<Entry> {
    let proof_root = proof.root_hash();
    msg!("Proof root {:02X?}", proof_root);
    if proof_root != *root {
        msg!("Expected root {:02X?}", root);
        return err!(DistributionError::RootMismatch);
    }
    proof.entry(index)
}

pub fn verify(index: u64, entry: &Entry, proof: &MerkleProof, root: &[u8; 32]) -> bool {
    matches!(verify_entry(index, proof, root), Ok(found) if found == *entry)
}
