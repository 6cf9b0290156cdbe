use std::sync::Arc;

use anchor_lang::prelude::*;

use super::{Cell, MAX_CELL_BITS, MAX_CELL_REFS};
use crate::DistributionError;

#[derive(Clone, Debug, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits(&self) -> usize {
        self.bit_len
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self> {
        if self.bit_len >= MAX_CELL_BITS {
            return err!(DistributionError::CellOverflow);
        }
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let last = self.data.len() - 1;
            self.data[last] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
        Ok(self)
    }

    /// Big-endian, `bits` wide.
    pub fn store_uint(&mut self, value: u128, bits: usize) -> Result<&mut Self> {
        if bits > 128 || (bits < 128 && value >> bits != 0) {
            return err!(DistributionError::NumericalOverflow);
        }
        if self.bit_len + bits > MAX_CELL_BITS {
            return err!(DistributionError::CellOverflow);
        }
        for shift in (0..bits).rev() {
            self.store_bit((value >> shift) & 1 == 1)?;
        }
        Ok(self)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        if self.bit_len + bytes.len() * 8 > MAX_CELL_BITS {
            return err!(DistributionError::CellOverflow);
        }
        for byte in bytes {
            self.store_uint(u128::from(*byte), 8)?;
        }
        Ok(self)
    }

    pub fn store_pubkey(&mut self, key: &Pubkey) -> Result<&mut Self> {
        self.store_bytes(key.as_ref())
    }

    /// Byte length in `len_bits` bits, then the value in that many bytes.
    pub fn store_var_uint(&mut self, value: u128, len_bits: usize) -> Result<&mut Self> {
        let byte_len = (128 - value.leading_zeros() as usize + 7) / 8;
        self.store_uint(byte_len as u128, len_bits)?;
        self.store_uint(value, byte_len * 8)
    }

    pub fn store_ref(&mut self, cell: Arc<Cell>) -> Result<&mut Self> {
        if self.refs.len() >= MAX_CELL_REFS {
            return err!(DistributionError::CellOverflow);
        }
        self.refs.push(cell);
        Ok(self)
    }

    pub fn build(self) -> Result<Arc<Cell>> {
        Cell::new(false, self.data, self.bit_len, self.refs)
    }
}
