use crate::*;

use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{Mint, TokenInterface},
};

use crate::protocol::{process_claim, ClaimInstanceConfig, ClaimRequest};

#[derive(Accounts)]
#[instruction(index: u64, proof_hash: [u8; 32])]
pub struct Claim<'info> {
    /// Pays for the claim account. Does not have to be the recipient.
    #[account(mut)]
    pub payer: Signer<'info>,

    /// CHECK: must be the recipient committed to by the proof, checked by the ledger
    pub recipient: UncheckedAccount<'info>,

    /// CHECK: associated token account of `recipient`, created and checked by the ledger
    #[account(mut)]
    pub recipient_mint_ata: UncheckedAccount<'info>,

    #[account(mint::token_program = spl_token_program)]
    pub token_mint: InterfaceAccount<'info, Mint>,

    #[account(
        has_one = token_mint,
        seeds = [DISTRIBUTION_SEED, token_mint.key().as_ref(), distribution.root.as_ref(), &distribution.nonce.to_le_bytes()],
        bump = distribution.bump,
    )]
    pub distribution: Account<'info, Distribution>,

    #[account(
        init_if_needed,
        seeds = [CLAIM_SEED, distribution.key().as_ref(), &index.to_le_bytes(), proof_hash.as_ref()],
        bump,
        space = ClaimAccount::LEN,
        payer = payer
    )]
    pub claim_account: Account<'info, ClaimAccount>,

    /// CHECK: must be the bound vault, checked by the ledger
    #[account(mut)]
    pub vault: UncheckedAccount<'info>,

    /// The SPL token program account
    pub spl_token_program: Interface<'info, TokenInterface>,
    pub ata_program: Program<'info, AssociatedToken>,

    pub system_program: Program<'info, System>,
}

pub fn handle_claim(ctx: Context<Claim>, index: u64, proof_hash: [u8; 32], message: Vec<u8>) -> Result<()> {
    let distribution = &ctx.accounts.distribution;
    let distribution_key = distribution.key();
    let claim_key = ctx.accounts.claim_account.key();
    let token_mint = &ctx.accounts.token_mint;

    assert_keys_equal(
        ctx.accounts.spl_token_program.key(),
        token_program_id(distribution.is_token_2022),
    )?;

    msg!("Claim message length {}", message.len());
    msg!("Index {}", index);
    msg!("Proof hash {:02X?}", proof_hash);

    let request = ClaimRequest::from_boc(&message)?;
    let authority = distribution.authority(distribution_key)?;
    let config = ClaimInstanceConfig {
        authority: distribution_key,
        index,
        proof_hash,
    };
    let instance = ctx.accounts.claim_account.instance(claim_key, config)?;

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
        destination_owner: ctx.accounts.recipient.to_account_info(),
        destination: ctx.accounts.recipient_mint_ata.to_account_info(),
        payer: ctx.accounts.payer.to_account_info(),
        token_program: ctx.accounts.spl_token_program.to_account_info(),
        ata_program: ctx.accounts.ata_program.to_account_info(),
        system_program: ctx.accounts.system_program.to_account_info(),
        is_token_2022: distribution.is_token_2022,
        signer_seeds,
    };

    let settlement = process_claim(&authority, &instance, &request, &mut ledger)?;

    emit!(ClaimSettled {
        distribution: distribution_key,
        claim_account: claim_key,
        index,
        recipient: settlement.recipient,
        amount: settlement.amount,
        forward_note: distribution.forward_note.clone(),
    });

    let bump = ctx.bumps.claim_account;
    ctx.accounts.claim_account.record(&settlement.instance, bump);

    Ok(())
}
