use anchor_lang::prelude::*;

use crate::cell::{CellBuilder, CellSlice};
use crate::AMOUNT_LEN_BITS;

/// One allocation committed to by the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct Entry {
    pub index: u64,
    pub recipient: Pubkey,
    pub amount: u128,
}

/// A row of an allocation list. `id` is only read when indices are explicit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub id: Option<u64>,
    pub recipient: Pubkey,
    pub amount: u128,
}

impl Entry {
    /// Leaf payload: recipient, then the amount as a variable-length integer.
    /// The index is carried by the path to the leaf.
    pub(crate) fn store_value(&self, builder: &mut CellBuilder) -> Result<()> {
        builder
            .store_pubkey(&self.recipient)?
            .store_var_uint(self.amount, AMOUNT_LEN_BITS)?;
        Ok(())
    }

    pub(crate) fn load_value(index: u64, slice: &mut CellSlice) -> Result<Self> {
        let recipient = slice.load_pubkey()?;
        let amount = slice.load_var_uint(AMOUNT_LEN_BITS)?;
        Ok(Self {
            index,
            recipient,
            amount,
        })
    }
}
