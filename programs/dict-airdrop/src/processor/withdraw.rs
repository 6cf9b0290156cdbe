use crate::*;

use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{Mint, TokenInterface},
};

use crate::protocol::{process_authority_message, AuthorityMessage};

#[derive(Accounts)]
pub struct Withdraw<'info> {
    /// Must be the distribution's admin
    #[account(mut)]
    pub admin: Signer<'info>,

    /// CHECK: associated token account of `admin`, created and checked by the ledger
    #[account(mut)]
    pub admin_mint_ata: UncheckedAccount<'info>,

    #[account(mint::token_program = spl_token_program)]
    pub token_mint: InterfaceAccount<'info, Mint>,

    #[account(
        has_one = token_mint,
        seeds = [DISTRIBUTION_SEED, token_mint.key().as_ref(), distribution.root.as_ref(), &distribution.nonce.to_le_bytes()],
        bump = distribution.bump,
    )]
    pub distribution: Account<'info, Distribution>,

    /// CHECK: must be the bound vault, checked by the ledger
    #[account(mut)]
    pub vault: UncheckedAccount<'info>,

    /// The SPL token program account
    pub spl_token_program: Interface<'info, TokenInterface>,
    pub ata_program: Program<'info, AssociatedToken>,

    pub system_program: Program<'info, System>,
}

pub fn handle_withdraw(ctx: Context<Withdraw>, query_id: u64, amount: u64) -> Result<()> {
    let distribution = &ctx.accounts.distribution;
    let distribution_key = distribution.key();
    let admin = ctx.accounts.admin.key();
    let token_mint = &ctx.accounts.token_mint;

    assert_keys_equal(
        ctx.accounts.spl_token_program.key(),
        token_program_id(distribution.is_token_2022),
    )?;

    let authority = distribution.authority(distribution_key)?;
    let message = AuthorityMessage::Withdraw {
        query_id,
        amount: u128::from(amount),
    };

    let token_mint_key = token_mint.key();
    let nonce = distribution.nonce.to_le_bytes();
    let signer_seeds: &[&[u8]] = &[
        DISTRIBUTION_SEED,
        token_mint_key.as_ref(),
        distribution.root.as_ref(),
        &nonce,
        &[distribution.bump],
    ];

    let mut ledger = SplLedger {
        authority: distribution.to_account_info(),
        vault: ctx.accounts.vault.to_account_info(),
        token_mint: token_mint.to_account_info(),
        decimals: token_mint.decimals,
        destination_owner: ctx.accounts.admin.to_account_info(),
        destination: ctx.accounts.admin_mint_ata.to_account_info(),
        payer: ctx.accounts.admin.to_account_info(),
        token_program: ctx.accounts.spl_token_program.to_account_info(),
        ata_program: ctx.accounts.ata_program.to_account_info(),
        system_program: ctx.accounts.system_program.to_account_info(),
        is_token_2022: distribution.is_token_2022,
        signer_seeds,
    };

    process_authority_message(&authority, &admin, &message, &mut ledger)?;

    emit!(FundsWithdrawn {
        distribution: distribution_key,
        admin,
        amount,
    });

    Ok(())
}
