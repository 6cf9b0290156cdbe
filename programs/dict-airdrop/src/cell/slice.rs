use std::sync::Arc;

use anchor_lang::prelude::*;

use super::Cell;
use crate::DistributionError;

/// Read cursor over a cell's bits and references.
#[derive(Clone, Debug)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> CellSlice<'a> {
    pub fn new(cell: &'a Cell) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    pub fn remaining_bits(&self) -> usize {
        self.cell.bits() - self.bit_pos
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs().len() - self.ref_pos
    }

    pub fn load_bit(&mut self) -> Result<bool> {
        if self.remaining_bits() == 0 {
            return err!(DistributionError::CellUnderflow);
        }
        let bit = self.cell.bit(self.bit_pos);
        self.bit_pos += 1;
        Ok(bit)
    }

    pub fn load_uint(&mut self, bits: usize) -> Result<u128> {
        if bits > 128 {
            return err!(DistributionError::NumericalOverflow);
        }
        if bits > self.remaining_bits() {
            return err!(DistributionError::CellUnderflow);
        }
        let mut value = 0u128;
        for _ in 0..bits {
            value = (value << 1) | u128::from(self.load_bit()?);
        }
        Ok(value)
    }

    pub fn load_u32(&mut self) -> Result<u32> {
        Ok(self.load_uint(32)? as u32)
    }

    pub fn load_u64(&mut self) -> Result<u64> {
        Ok(self.load_uint(64)? as u64)
    }

    pub fn load_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        for byte in out.iter_mut() {
            *byte = self.load_uint(8)? as u8;
        }
        Ok(out)
    }

    pub fn load_pubkey(&mut self) -> Result<Pubkey> {
        Ok(Pubkey::new_from_array(self.load_array::<32>()?))
    }

    pub fn load_var_uint(&mut self, len_bits: usize) -> Result<u128> {
        let byte_len = self.load_uint(len_bits)? as usize;
        if byte_len > 16 {
            return err!(DistributionError::MalformedCell);
        }
        self.load_uint(byte_len * 8)
    }

    pub fn load_ref(&mut self) -> Result<&'a Arc<Cell>> {
        let cell = self
            .cell
            .refs()
            .get(self.ref_pos)
            .ok_or_else(|| error!(DistributionError::CellUnderflow))?;
        self.ref_pos += 1;
        Ok(cell)
    }

    /// Fails unless every bit and reference has been read.
    pub fn end_parse(&self) -> Result<()> {
        if self.remaining_bits() != 0 || self.remaining_refs() != 0 {
            return err!(DistributionError::MalformedCell);
        }
        Ok(())
    }
}
