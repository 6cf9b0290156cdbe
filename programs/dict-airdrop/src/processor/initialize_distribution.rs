use crate::*;

use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{Mint, TokenInterface},
};

use crate::protocol::process_authority_message;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct InitializeParams {
    /// `None` disables withdrawals for the life of the distribution.
    pub admin: Option<Pubkey>,
    pub root: [u8; 32],
    pub forward_note: Option<Vec<u8>>,
    /// Lets the same mint and root back more than one distribution.
    pub nonce: u64,
    pub is_token_2022: bool,
}

#[derive(Accounts)]
#[instruction(params: InitializeParams)]
pub struct InitializeDistribution<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,

    #[account(
        init,
        seeds = [DISTRIBUTION_SEED, token_mint.key().as_ref(), params.root.as_ref(), &params.nonce.to_le_bytes()],
        bump,
        space = Distribution::space(params.forward_note.as_ref().map_or(0, Vec::len)),
        payer = payer
    )]
    pub distribution: Account<'info, Distribution>,

    /// CHECK: associated token account of `distribution`, created and checked below
    #[account(mut)]
    pub vault: UncheckedAccount<'info>,

    #[account(mint::token_program = spl_token_program)]
    pub token_mint: InterfaceAccount<'info, Mint>,

    /// The SPL token program account
    pub spl_token_program: Interface<'info, TokenInterface>,
    pub ata_program: Program<'info, AssociatedToken>,

    pub system_program: Program<'info, System>,
}

pub fn handle_initialize(ctx: Context<InitializeDistribution>, params: InitializeParams) -> Result<()> {
    let distribution_key = ctx.accounts.distribution.key();
    let token_mint = &ctx.accounts.token_mint;

    assert_keys_equal(
        ctx.accounts.spl_token_program.key(),
        token_program_id(params.is_token_2022),
    )?;

    msg!("Root {:02X?}", params.root);
    msg!("Nonce {}", params.nonce);

    let distribution = &mut ctx.accounts.distribution;
    distribution.bump = ctx.bumps.distribution;
    distribution.nonce = params.nonce;
    distribution.admin = params.admin;
    distribution.root = params.root;
    distribution.token_mint = token_mint.key();
    distribution.claim_program = crate::ID;
    distribution.vault = None;
    distribution.is_token_2022 = params.is_token_2022;
    distribution.forward_note = params.forward_note;
    let authority = distribution.authority(distribution_key)?;

    let mut ledger = SplLedger {
        authority: ctx.accounts.distribution.to_account_info(),
        vault: ctx.accounts.vault.to_account_info(),
        token_mint: token_mint.to_account_info(),
        decimals: token_mint.decimals,
        destination_owner: ctx.accounts.distribution.to_account_info(),
        destination: ctx.accounts.vault.to_account_info(),
        payer: ctx.accounts.payer.to_account_info(),
        token_program: ctx.accounts.spl_token_program.to_account_info(),
        ata_program: ctx.accounts.ata_program.to_account_info(),
        system_program: ctx.accounts.system_program.to_account_info(),
        is_token_2022: params.is_token_2022,
        signer_seeds: &[],
    };

    // The vault is whatever the token program derives for the distribution.
    ledger.ensure_destination()?;
    let bind = authority.set_ledger_account_message(&ledger, 0);
    let payer = ctx.accounts.payer.key();
    let authority = process_authority_message(&authority, &payer, &bind, &mut ledger)?;

    ctx.accounts.distribution.record(&authority);

    emit!(DistributionInitialized {
        distribution: distribution_key,
        token_mint: token_mint.key(),
        root: params.root,
        admin: params.admin,
        vault: ctx.accounts.vault.key(),
        nonce: params.nonce,
    });

    Ok(())
}
