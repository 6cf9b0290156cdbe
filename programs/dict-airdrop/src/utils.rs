use anchor_lang::{
    prelude::*,
    solana_program::{
        program::invoke_signed,
        program_memory::sol_memcmp,
        program_pack::{IsInitialized, Pack},
        pubkey::PUBKEY_BYTES,
    },
};
use anchor_spl::associated_token::get_associated_token_address_with_program_id;

use crate::DistributionError;

pub fn token_program_id(is_token_2022: bool) -> Pubkey {
    if is_token_2022 {
        spl_token_2022::id()
    } else {
        spl_token::id()
    }
}

pub fn assert_initialized<T: Pack + IsInitialized>(account_info: &AccountInfo) -> Result<T> {
    let account: T = T::unpack_unchecked(&account_info.data.borrow())?;
    if !account.is_initialized() {
        Err(DistributionError::UninitializedAccount.into())
    } else {
        Ok(account)
    }
}

/// Checks that `ata` is the initialized associated token account of `wallet`
/// for `mint` under the selected token program.
pub fn assert_is_ata(ata: &AccountInfo, wallet: &Pubkey, mint: &Pubkey, is_token_2022: bool) -> Result<()> {
    let token_program = token_program_id(is_token_2022);
    assert_owned_by(ata, &token_program)?;
    let (owner, ata_mint) = if is_token_2022 {
        // Token-2022 accounts may carry extensions past the base layout
        let data = ata.data.borrow();
        let account = spl_token_2022::extension::StateWithExtensions::<spl_token_2022::state::Account>::unpack(&data)?;
        (account.base.owner, account.base.mint)
    } else {
        let account: spl_token::state::Account = assert_initialized(ata)?;
        (account.owner, account.mint)
    };
    assert_keys_equal(owner, *wallet)?;
    assert_keys_equal(ata_mint, *mint)?;
    assert_keys_equal(
        get_associated_token_address_with_program_id(wallet, mint, &token_program),
        *ata.key,
    )?;
    Ok(())
}

pub fn assert_owned_by(account: &AccountInfo, owner: &Pubkey) -> Result<()> {
    if account.owner != owner {
        msg!("Wrong account owner: {} should be {}", account.owner, owner);
        return Err(DistributionError::WrongAccountOwner.into());
    }
    Ok(())
}

pub fn assert_keys_equal(key1: Pubkey, key2: Pubkey) -> Result<()> {
    if sol_memcmp(key1.as_ref(), key2.as_ref(), PUBKEY_BYTES) != 0 {
        msg!("Wrong public key: {} should be {}", key1, key2);
        return err!(DistributionError::PublicKeyMismatch);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn make_ata<'a>(
    ata: AccountInfo<'a>,
    wallet: AccountInfo<'a>,
    mint: AccountInfo<'a>,
    fee_payer: AccountInfo<'a>,
    ata_program: AccountInfo<'a>,
    token_program: AccountInfo<'a>,
    system_program: AccountInfo<'a>,
    fee_payer_seeds: &[&[u8]],
) -> Result<()> {
    let as_arr = [fee_payer_seeds];

    let seeds: &[&[&[u8]]] = if !fee_payer_seeds.is_empty() {
        &as_arr
    } else {
        &[]
    };

    invoke_signed(
        &spl_associated_token_account::instruction::create_associated_token_account(
            fee_payer.key,
            wallet.key,
            mint.key,
            token_program.key,
        ),
        &[
            ata,
            wallet,
            mint,
            fee_payer,
            ata_program,
            system_program,
            token_program,
        ],
        seeds,
    )?;

    Ok(())
}
