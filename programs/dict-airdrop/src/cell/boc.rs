use std::sync::Arc;

use anchor_lang::prelude::*;

use super::{descriptors, padded_data, Cell, MAX_CELL_REFS};
use crate::DistributionError;

pub const BOC_MAGIC: u32 = 0xb0c5_d1c7;

/// Serializes the tree rooted at `root`.
///
/// Layout: magic, cell count, then every cell in pre-order as
/// `d1 d2 data ref-indices` with big-endian `u32` integers. The root is cell 0
/// and every reference points forward. No cell is referenced twice.
pub fn to_boc(root: &Arc<Cell>) -> Vec<u8> {
    let mut order = Vec::new();
    flatten(root, &mut order);

    let mut out = Vec::new();
    out.extend_from_slice(&BOC_MAGIC.to_be_bytes());
    out.extend_from_slice(&(order.len() as u32).to_be_bytes());
    for (cell, refs) in &order {
        out.extend_from_slice(&descriptors(cell.is_exotic(), cell.bits(), refs.len()));
        out.extend_from_slice(&padded_data(cell.data(), cell.bits()));
        for index in refs {
            out.extend_from_slice(&index.to_be_bytes());
        }
    }
    out
}

fn flatten<'a>(cell: &'a Cell, out: &mut Vec<(&'a Cell, Vec<u32>)>) -> u32 {
    let index = out.len();
    out.push((cell, Vec::new()));
    let children: Vec<u32> = cell.refs().iter().map(|child| flatten(child, out)).collect();
    out[index].1 = children;
    index as u32
}

struct RawCell {
    exotic: bool,
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| error!(DistributionError::MalformedBoc))?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

pub fn from_boc(bytes: &[u8]) -> Result<Arc<Cell>> {
    let mut reader = Reader { bytes, pos: 0 };
    if reader.read_u32()? != BOC_MAGIC {
        return err!(DistributionError::MalformedBoc);
    }
    let count = reader.read_u32()? as usize;
    if count == 0 {
        return err!(DistributionError::MalformedBoc);
    }

    // each cell is referenced at most once, so the result is a tree
    let mut referenced = vec![false; count];
    let mut raw = Vec::new();
    for index in 0..count {
        let d = reader.take(2)?;
        let (d1, d2) = (d[0], d[1]);
        let ref_count = (d1 & 7) as usize;
        if d1 >> 4 != 0 || ref_count > MAX_CELL_REFS {
            return err!(DistributionError::MalformedBoc);
        }

        let byte_len = (d2 as usize + 1) / 2;
        let data = reader.take(byte_len)?.to_vec();
        let bit_len = if d2 % 2 == 0 {
            byte_len * 8
        } else {
            // the lowest set bit of the last byte is the completion tag
            let last = data[byte_len - 1];
            let tag = last.trailing_zeros() as usize;
            if last == 0 || tag == 7 {
                return err!(DistributionError::MalformedBoc);
            }
            byte_len * 8 - tag - 1
        };

        let mut refs = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            let child = reader.read_u32()? as usize;
            if child <= index || child >= count || referenced[child] {
                return err!(DistributionError::MalformedBoc);
            }
            referenced[child] = true;
            refs.push(child);
        }

        raw.push(RawCell {
            exotic: d1 & 8 != 0,
            data,
            bit_len,
            refs,
        });
    }
    if reader.pos != bytes.len() {
        return err!(DistributionError::MalformedBoc);
    }

    let mut built: Vec<Option<Arc<Cell>>> = vec![None; count];
    for (index, cell) in raw.into_iter().enumerate().rev() {
        let refs = cell
            .refs
            .iter()
            .map(|&child| built[child].clone().ok_or_else(|| error!(DistributionError::MalformedBoc)))
            .collect::<Result<Vec<_>>>()?;
        built[index] = Some(Cell::new(cell.exotic, cell.data, cell.bit_len, refs)?);
    }
    built[0]
        .take()
        .ok_or_else(|| error!(DistributionError::MalformedBoc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellBuilder;
    use crate::errors::assert_error;

    fn sample_tree() -> Arc<Cell> {
        let mut left = CellBuilder::new();
        left.store_uint(0b1011, 4).unwrap();
        let left = left.build().unwrap();

        let mut right = CellBuilder::new();
        right.store_bytes(&[1, 2, 3]).unwrap();
        let right = right.build().unwrap();

        let mut root = CellBuilder::new();
        root.store_uint(0x5, 7)
            .unwrap()
            .store_ref(left.clone())
            .unwrap()
            .store_ref(Cell::pruned_branch(&right))
            .unwrap();
        root.build().unwrap()
    }

    #[test]
    fn test_boc_preserves_hashes() {
        let root = sample_tree();
        let bytes = to_boc(&root);
        let parsed = from_boc(&bytes).unwrap();
        assert_eq!(parsed.hash(), root.hash());
        assert_eq!(parsed.repr_hash(), root.repr_hash());
        assert_eq!(parsed.refs().len(), 2);
        assert_eq!(parsed.refs()[0].bits(), 4);
        assert!(parsed.refs()[1].is_exotic());
    }

    #[test]
    fn test_boc_rejects_garbage() {
        let bytes = to_boc(&sample_tree());

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(from_boc(&trailing).is_err());

        assert!(from_boc(&bytes[..bytes.len() - 1]).is_err());

        let mut bad_magic = bytes.clone();
        bad_magic[0] ^= 1;
        assert!(from_boc(&bad_magic).is_err());

        assert!(from_boc(&[]).is_err());
    }

    #[test]
    fn test_boc_rejects_backward_refs() {
        let mut cell = CellBuilder::new();
        cell.store_bit(true).unwrap();
        let cell = cell.build().unwrap();

        // root with a single self reference
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&BOC_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&descriptors(false, cell.bits(), 1));
        bytes.extend_from_slice(&padded_data(cell.data(), cell.bits()));
        bytes.extend_from_slice(&0u32.to_be_bytes());
        assert!(from_boc(&bytes).is_err());
    }

    #[test]
    fn test_boc_rejects_shared_cells() {
        let mut cell = CellBuilder::new();
        cell.store_bit(true).unwrap();
        let cell = cell.build().unwrap();

        // fork with both refs on cell 1
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&BOC_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&descriptors(false, 0, 2));
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&descriptors(false, cell.bits(), 0));
        bytes.extend_from_slice(&padded_data(cell.data(), cell.bits()));
        assert_error(from_boc(&bytes), DistributionError::MalformedBoc);

        let mut fork = CellBuilder::new();
        fork.store_ref(cell.clone()).unwrap().store_ref(cell).unwrap();
        assert!(from_boc(&to_boc(&fork.build().unwrap())).is_ok());
    }
}
