use std::collections::BTreeMap;
use std::sync::Arc;

use anchor_lang::prelude::*;

use super::entry::{Allocation, Entry};
use super::label::{key_bit, key_bits, load_label, store_label};
use crate::cell::{self, Cell, CellBuilder, CellKind};
use crate::{DistributionError, KEY_BITS};

/// How allocation rows become dictionary indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexMode {
    /// Index is the row's position in the list.
    Positional,
    /// Index is the row's `id`, which must be present.
    Explicit,
}

/// Ordered `index -> Entry` mapping committed to by a single root hash.
#[derive(Clone, Debug)]
pub struct Dictionary {
    entries: BTreeMap<u64, Entry>,
    root: Arc<Cell>,
}

impl Dictionary {
    pub fn from_allocations(allocations: &[Allocation], mode: IndexMode) -> Result<Self> {
        let entries = allocations
            .iter()
            .enumerate()
            .map(|(position, allocation)| -> Result<Entry> {
                let index = match mode {
                    IndexMode::Positional => position as u64,
                    IndexMode::Explicit => allocation.id.ok_or_else(|| {
                        msg!("Allocation {} has no id", position);
                        error!(DistributionError::MalformedEntry)
                    })?,
                };
                Ok(Entry {
                    index,
                    recipient: allocation.recipient,
                    amount: allocation.amount,
                })
            })
            .collect::<Result<Vec<Entry>>>()?;
        Self::build(&entries)
    }

    /// Builds the trie over `entries`. Indices must be unique.
    pub fn build(entries: &[Entry]) -> Result<Self> {
        require!(!entries.is_empty(), DistributionError::EmptyDistribution);

        let mut map = BTreeMap::new();
        for entry in entries {
            if map.insert(entry.index, *entry).is_some() {
                msg!("Duplicate index {}", entry.index);
                return err!(DistributionError::DuplicateIndex);
            }
        }

        let sorted: Vec<Entry> = map.values().copied().collect();
        let root = build_node(&sorted, 0)?;
        Ok(Self { entries: map, root })
    }

    /// Reloads a dictionary persisted with [`Dictionary::to_boc`].
    pub fn from_boc(bytes: &[u8]) -> Result<Self> {
        Self::from_root(cell::from_boc(bytes)?)
    }

    pub fn from_root(root: Arc<Cell>) -> Result<Self> {
        let mut entries = BTreeMap::new();
        collect_entries(&root, 0, 0, &mut entries)?;
        Ok(Self { entries, root })
    }

    pub fn to_boc(&self) -> Vec<u8> {
        cell::to_boc(&self.root)
    }

    pub fn root(&self) -> [u8; 32] {
        self.root.hash()
    }

    pub fn root_cell(&self) -> &Arc<Cell> {
        &self.root
    }

    pub fn get(&self, index: u64) -> Option<&Entry> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in index order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }
}

// `entries` is sorted, non-empty and shares the first `offset` key bits.
fn build_node(entries: &[Entry], offset: usize) -> Result<Arc<Cell>> {
    let max_len = KEY_BITS - offset;
    let mut builder = CellBuilder::new();

    if let [entry] = entries {
        store_label(&mut builder, key_bits(entry.index, offset, max_len), max_len, max_len)?;
        entry.store_value(&mut builder)?;
        return builder.build();
    }

    let (first, last) = match (entries.first(), entries.last()) {
        (Some(first), Some(last)) => (first.index, last.index),
        _ => return err!(DistributionError::EmptyDistribution),
    };
    let common = ((first ^ last) << offset).leading_zeros() as usize;
    store_label(&mut builder, key_bits(first, offset, common), common, max_len)?;

    let split = offset + common;
    let pivot = entries.partition_point(|entry| key_bit(entry.index, split) == 0);
    builder
        .store_ref(build_node(&entries[..pivot], split + 1)?)?
        .store_ref(build_node(&entries[pivot..], split + 1)?)?;
    builder.build()
}

fn collect_entries(
    cell: &Cell,
    prefix: u64,
    offset: usize,
    out: &mut BTreeMap<u64, Entry>,
) -> Result<()> {
    if cell.kind() != CellKind::Ordinary {
        return err!(DistributionError::MalformedCell);
    }
    let mut slice = cell.begin_parse();
    let (label, len) = load_label(&mut slice, KEY_BITS - offset)?;
    let split = offset + len;
    let prefix = if len == 0 {
        prefix
    } else {
        prefix | (label << (KEY_BITS - split))
    };

    if split == KEY_BITS {
        let entry = Entry::load_value(prefix, &mut slice)?;
        slice.end_parse()?;
        out.insert(prefix, entry);
        return Ok(());
    }

    if slice.remaining_bits() != 0 || slice.remaining_refs() != 2 {
        return err!(DistributionError::MalformedCell);
    }
    for (bit, child) in cell.refs().iter().enumerate() {
        let child_prefix = prefix | ((bit as u64) << (KEY_BITS - 1 - split));
        collect_entries(child, child_prefix, split + 1, out)?;
    }
    Ok(())
}
