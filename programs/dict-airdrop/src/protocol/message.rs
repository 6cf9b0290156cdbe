use std::sync::Arc;

use anchor_lang::prelude::*;

use crate::cell::{self, Cell, CellBuilder, CellSlice};
use crate::dict::MerkleProof;
use crate::{DistributionError, AMOUNT_LEN_BITS};

pub mod op {
    pub const CLAIM: u32 = 0x013a_3ca6;
    pub const PROCESS_CLAIM: u32 = 0x43c7_d5c9;
    pub const SET_LEDGER_ACCOUNT: u32 = 0x610c_a46c;
    pub const WITHDRAW: u32 = 0xd0fc_5dda;
}

pub(crate) fn expect_op(slice: &mut CellSlice, expected: u32) -> Result<()> {
    let found = slice.load_u32()?;
    if found != expected {
        msg!("Opcode {:#010x}, expected {:#010x}", found, expected);
        return err!(DistributionError::InvalidOpcode);
    }
    Ok(())
}

/// Claimant -> claim instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimRequest {
    pub query_id: u64,
    pub proof: MerkleProof,
}

impl ClaimRequest {
    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = CellBuilder::new();
        builder
            .store_uint(u128::from(op::CLAIM), 32)?
            .store_uint(u128::from(self.query_id), 64)?
            .store_ref(self.proof.cell().clone())?;
        builder.build()
    }

    pub fn from_cell(cell: &Cell) -> Result<Self> {
        let mut slice = cell.begin_parse();
        expect_op(&mut slice, op::CLAIM)?;
        let query_id = slice.load_u64()?;
        let proof = MerkleProof::from_cell(slice.load_ref()?.clone())?;
        slice.end_parse()?;
        Ok(Self { query_id, proof })
    }

    pub fn to_boc(&self) -> Result<Vec<u8>> {
        Ok(cell::to_boc(&self.to_cell()?))
    }

    pub fn from_boc(bytes: &[u8]) -> Result<Self> {
        let root = cell::from_boc(bytes)?;
        Self::from_cell(&root)
    }
}

/// Administrative messages handled by the distribution authority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorityMessage {
    SetLedgerAccount { query_id: u64, ledger_account: Pubkey },
    Withdraw { query_id: u64, amount: u128 },
}

impl AuthorityMessage {
    pub fn query_id(&self) -> u64 {
        match self {
            Self::SetLedgerAccount { query_id, .. } | Self::Withdraw { query_id, .. } => *query_id,
        }
    }

    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = CellBuilder::new();
        match self {
            Self::SetLedgerAccount {
                query_id,
                ledger_account,
            } => {
                builder
                    .store_uint(u128::from(op::SET_LEDGER_ACCOUNT), 32)?
                    .store_uint(u128::from(*query_id), 64)?
                    .store_pubkey(ledger_account)?;
            }
            Self::Withdraw { query_id, amount } => {
                builder
                    .store_uint(u128::from(op::WITHDRAW), 32)?
                    .store_uint(u128::from(*query_id), 64)?
                    .store_var_uint(*amount, AMOUNT_LEN_BITS)?;
            }
        }
        builder.build()
    }

    pub fn from_cell(cell: &Cell) -> Result<Self> {
        let mut slice = cell.begin_parse();
        let message = match slice.load_u32()? {
            op::SET_LEDGER_ACCOUNT => Self::SetLedgerAccount {
                query_id: slice.load_u64()?,
                ledger_account: slice.load_pubkey()?,
            },
            op::WITHDRAW => Self::Withdraw {
                query_id: slice.load_u64()?,
                amount: slice.load_var_uint(AMOUNT_LEN_BITS)?,
            },
            other => {
                msg!("Unknown authority opcode {:#010x}", other);
                return err!(DistributionError::InvalidOpcode);
            }
        };
        slice.end_parse()?;
        Ok(message)
    }
}
