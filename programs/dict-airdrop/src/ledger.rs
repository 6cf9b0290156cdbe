use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::invoke_signed;
use anchor_spl::associated_token::get_associated_token_address_with_program_id;

use crate::protocol::TokenLedger;
use crate::*;

/// SPL Token / Token-2022 ledger as seen from one instruction: the
/// distribution's vault on one side, one destination owner on the other.
pub struct SplLedger<'a, 'info> {
    /// Distribution PDA, signs with `signer_seeds`.
    pub authority: AccountInfo<'info>,
    pub vault: AccountInfo<'info>,
    pub token_mint: AccountInfo<'info>,
    pub decimals: u8,
    pub destination_owner: AccountInfo<'info>,
    pub destination: AccountInfo<'info>,
    pub payer: AccountInfo<'info>,
    pub token_program: AccountInfo<'info>,
    pub ata_program: AccountInfo<'info>,
    pub system_program: AccountInfo<'info>,
    pub is_token_2022: bool,
    pub signer_seeds: &'a [&'a [u8]],
}

impl<'a, 'info> SplLedger<'a, 'info> {
    /// Creates the destination's associated token account when missing.
    pub fn ensure_destination(&self) -> Result<()> {
        if self.destination.data_is_empty() {
            make_ata(
                self.destination.clone(),
                self.destination_owner.clone(),
                self.token_mint.clone(),
                self.payer.clone(),
                self.ata_program.clone(),
                self.token_program.clone(),
                self.system_program.clone(),
                &[],
            )?;
        }
        assert_is_ata(
            &self.destination,
            self.destination_owner.key,
            self.token_mint.key,
            self.is_token_2022,
        )
    }
}

impl<'a, 'info> TokenLedger for SplLedger<'a, 'info> {
    fn ledger_account_of(&self, owner: &Pubkey) -> Pubkey {
        get_associated_token_address_with_program_id(
            owner,
            self.token_mint.key,
            &token_program_id(self.is_token_2022),
        )
    }

    fn transfer(
        &mut self,
        from: &Pubkey,
        recipient: &Pubkey,
        amount: u128,
        forward_note: Option<&[u8]>,
    ) -> Result<()> {
        assert_keys_equal(*from, *self.vault.key)?;
        assert_keys_equal(*recipient, *self.destination_owner.key)?;
        self.ensure_destination()?;
        assert_is_ata(
            &self.vault,
            self.authority.key,
            self.token_mint.key,
            self.is_token_2022,
        )?;

        let amount = u64::try_from(amount).map_err(|_| {
            msg!("Amount {} exceeds the token program limit", amount);
            error!(DistributionError::NumericalOverflow)
        })?;

        let transfer_ix = if self.is_token_2022 {
            spl_token_2022::instruction::transfer_checked(
                self.token_program.key,
                self.vault.key,
                self.token_mint.key,
                self.destination.key,
                self.authority.key,
                &[],
                amount,
                self.decimals,
            )?
        } else {
            spl_token::instruction::transfer(
                self.token_program.key,
                self.vault.key,
                self.destination.key,
                self.authority.key,
                &[],
                amount,
            )?
        };

        let mut invoke_args = vec![
            self.destination.clone(),
            self.vault.clone(),
            self.token_program.clone(),
            self.authority.clone(),
        ];
        if self.is_token_2022 {
            invoke_args.push(self.token_mint.clone());
        }

        invoke_signed(&transfer_ix, &invoke_args, &[self.signer_seeds])?;

        msg!("Transferred {:#} tokens to {}", amount, recipient);
        if let Some(note) = forward_note {
            msg!("Forward note {:02X?}", note);
        }
        Ok(())
    }
}
