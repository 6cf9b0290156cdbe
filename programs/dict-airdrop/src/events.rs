use anchor_lang::prelude::*;

#[event]
pub struct DistributionInitialized {
    pub distribution: Pubkey,
    pub token_mint: Pubkey,
    pub root: [u8; 32],
    pub admin: Option<Pubkey>,
    pub vault: Pubkey,
    pub nonce: u64,
}

#[event]
pub struct ClaimSettled {
    pub distribution: Pubkey,
    pub claim_account: Pubkey,
    pub index: u64,
    pub recipient: Pubkey,
    pub amount: u128,
    pub forward_note: Option<Vec<u8>>,
}

#[event]
pub struct FundsWithdrawn {
    pub distribution: Pubkey,
    pub admin: Pubkey,
    pub amount: u64,
}
