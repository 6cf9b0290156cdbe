use anchor_lang::prelude::*;

use crate::protocol::{Authority, AuthorityConfig, ClaimInstance, ClaimInstanceConfig};
use crate::DistributionError;

/// Distribution authority. Its vault is the associated token account the
/// token program derives for this PDA.
#[account]
pub struct Distribution {
    pub bump: u8,
    pub nonce: u64,
    /// `None` disables withdrawals.
    pub admin: Option<Pubkey>,
    pub root: [u8; 32],
    pub token_mint: Pubkey,
    pub claim_program: Pubkey,
    /// Bound once at initialization.
    pub vault: Option<Pubkey>,
    pub is_token_2022: bool,
    pub forward_note: Option<Vec<u8>>,
}

impl Distribution {
    pub fn space(forward_note_len: usize) -> usize {
        8 + 1 + 8 + 33 + 32 + 32 + 32 + 33 + 1 + 1 + 4 + forward_note_len
    }

    pub fn authority(&self, address: Pubkey) -> Result<Authority> {
        let config = AuthorityConfig {
            admin: self.admin,
            root: self.root,
            claim_program: self.claim_program,
            forward_note: self.forward_note.clone(),
            nonce: self.nonce,
        };
        Ok(Authority::new(address, config)?.with_ledger_account(self.vault))
    }

    pub fn record(&mut self, authority: &Authority) {
        self.vault = authority.ledger_account();
    }
}

/// Claim instance for one `(distribution, index, proof hash)`. Its existence
/// with `claimed` set is what blocks a second payout.
#[account]
pub struct ClaimAccount {
    pub authority: Pubkey,
    pub index: u64,
    pub proof_hash: [u8; 32],
    pub claimed: bool,
    pub bump: u8,
}

impl ClaimAccount {
    pub const LEN: usize = 8 + std::mem::size_of::<ClaimAccount>();

    /// A zeroed account was created by this instruction and takes `config`.
    /// Otherwise the stored config must be the one the address was derived from.
    pub fn instance(&self, address: Pubkey, config: ClaimInstanceConfig) -> Result<ClaimInstance> {
        if self.authority != Pubkey::default() && self.config() != config {
            msg!("Claim account {} holds another config", address);
            return err!(DistributionError::DerivedKeyInvalid);
        }
        Ok(ClaimInstance::at(address, config, self.claimed))
    }

    pub fn config(&self) -> ClaimInstanceConfig {
        ClaimInstanceConfig {
            authority: self.authority,
            index: self.index,
            proof_hash: self.proof_hash,
        }
    }

    pub fn record(&mut self, instance: &ClaimInstance, bump: u8) {
        let config = instance.config();
        self.authority = config.authority;
        self.index = config.index;
        self.proof_hash = config.proof_hash;
        self.claimed = instance.claimed();
        self.bump = bump;
    }
}
