use anchor_lang::prelude::*;

use crate::{CLAIM_SEED, DISTRIBUTION_SEED};

/// Everything a claim instance's address is derived from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct ClaimInstanceConfig {
    pub authority: Pubkey,
    pub index: u64,
    pub proof_hash: [u8; 32],
}

impl ClaimInstanceConfig {
    pub fn seeds(&self) -> [Vec<u8>; 4] {
        [
            CLAIM_SEED.to_vec(),
            self.authority.to_bytes().to_vec(),
            self.index.to_le_bytes().to_vec(),
            self.proof_hash.to_vec(),
        ]
    }

    pub fn derive_address(&self, claim_program: &Pubkey) -> (Pubkey, u8) {
        let seeds = self.seeds();
        let seeds: Vec<&[u8]> = seeds.iter().map(|seed| seed.as_slice()).collect();
        Pubkey::find_program_address(&seeds, claim_program)
    }
}

pub fn distribution_address(
    program_id: &Pubkey,
    token_mint: &Pubkey,
    root: &[u8; 32],
    nonce: u64,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            DISTRIBUTION_SEED,
            token_mint.as_ref(),
            root.as_ref(),
            &nonce.to_le_bytes(),
        ],
        program_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_address_depends_on_every_field() {
        let program = Pubkey::new_unique();
        let config = ClaimInstanceConfig {
            authority: Pubkey::new_unique(),
            index: 1,
            proof_hash: [7; 32],
        };
        let (address, _) = config.derive_address(&program);
        assert_eq!(config.derive_address(&program).0, address);

        let variants = [
            ClaimInstanceConfig { index: 2, ..config },
            ClaimInstanceConfig { proof_hash: [8; 32], ..config },
            ClaimInstanceConfig { authority: Pubkey::new_unique(), ..config },
        ];
        for variant in variants {
            assert_ne!(variant.derive_address(&program).0, address);
        }
        assert_ne!(config.derive_address(&Pubkey::new_unique()).0, address);
    }

    #[test]
    fn test_nonce_separates_distributions() {
        let program = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let root = [3; 32];
        assert_ne!(
            distribution_address(&program, &mint, &root, 0).0,
            distribution_address(&program, &mint, &root, 1).0,
        );
    }
}
