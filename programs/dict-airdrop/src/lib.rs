use anchor_lang::prelude::*;

pub mod cell;
pub mod dict;
pub mod protocol;

mod constants;
mod errors;
mod events;
mod ledger;
mod processor;
mod state;
mod utils;
pub use crate::constants::*;
pub use crate::errors::*;
pub use crate::events::*;
pub use crate::ledger::*;
pub use crate::processor::*;
pub use crate::protocol::DistributionData;
pub use crate::state::*;
pub use crate::utils::*;

declare_id!("BUHxAuftdu6jzyzW7u5ttsJbwdM8TMc5rWUTM6hKm1Kr");

#[program]
pub mod dict_airdrop {
    use super::*;

    pub fn initialize(ctx: Context<InitializeDistribution>, params: InitializeParams) -> Result<()> {
        handle_initialize(ctx, params)
    }

    /// `message` is a serialized claim request carrying the proof for `index`.
    pub fn claim(ctx: Context<Claim>, index: u64, proof_hash: [u8; 32], message: Vec<u8>) -> Result<()> {
        handle_claim(ctx, index, proof_hash, message)
    }

    pub fn withdraw(ctx: Context<Withdraw>, query_id: u64, amount: u64) -> Result<()> {
        handle_withdraw(ctx, query_id, amount)
    }

    pub fn get_distribution_data(ctx: Context<GetDistributionData>) -> Result<DistributionData> {
        handle_get_distribution_data(ctx)
    }

    pub fn is_claimed(ctx: Context<IsClaimed>) -> Result<bool> {
        handle_is_claimed(ctx)
    }
}
