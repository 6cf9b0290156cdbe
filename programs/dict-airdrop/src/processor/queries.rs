use crate::*;

use crate::protocol::{ClaimInstance, DistributionData};

#[derive(Accounts)]
pub struct GetDistributionData<'info> {
    pub distribution: Account<'info, Distribution>,
}

pub fn handle_get_distribution_data(ctx: Context<GetDistributionData>) -> Result<DistributionData> {
    let distribution = &ctx.accounts.distribution;
    Ok(distribution.authority(distribution.key())?.distribution_data())
}

#[derive(Accounts)]
pub struct IsClaimed<'info> {
    /// CHECK: any address; an account this program never created reads as unclaimed
    pub claim_account: UncheckedAccount<'info>,
}

pub fn handle_is_claimed(ctx: Context<IsClaimed>) -> Result<bool> {
    let account = ctx.accounts.claim_account.to_account_info();
    if account.data_is_empty() || account.owner != &crate::ID {
        return Ok(ClaimInstance::is_claimed(None));
    }

    let data = account.try_borrow_data()?;
    let instance = ClaimAccount::try_deserialize(&mut &data[..])
        .ok()
        .map(|claim| ClaimInstance::at(*account.key, claim.config(), claim.claimed));
    let claimed = ClaimInstance::is_claimed(instance.as_ref());
    msg!("Claimed {}", claimed);
    Ok(claimed)
}
