//! Distribution dictionary: a Patricia trie over 64-bit indices whose root
//! hash commits to every `(index, recipient, amount)` entry, plus compact
//! Merkle proofs for single entries.

mod builder;
mod entry;
mod label;
mod proof;
mod verify;

pub use builder::{Dictionary, IndexMode};
pub use entry::{Allocation, Entry};
pub use proof::{MerkleProof, Side, Sibling};
pub use verify::{verify, verify_entry};
