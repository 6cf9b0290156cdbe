//! The two actors of a distribution and the exchange between them.
//!
//! [`Authority`] and [`ClaimInstance`] are pure transition functions from a
//! state and an inbound message to a new state and a list of [`Effect`]s. The
//! driver functions below deliver those effects in order against a
//! [`TokenLedger`]; the program's instruction processors and the tests share
//! them.

use std::collections::VecDeque;

use anchor_lang::prelude::*;

use crate::DistributionError;

mod address;
mod authority;
mod claim_instance;
mod message;

pub use address::*;
pub use authority::*;
pub use claim_instance::*;
pub use message::*;

/// The token ledger holding the distribution's balance.
pub trait TokenLedger {
    /// Ledger account the ledger derives for `owner`.
    fn ledger_account_of(&self, owner: &Pubkey) -> Pubkey;

    /// Moves `amount` from the ledger account `from` to the ledger account of
    /// `recipient`, attaching `forward_note` when present.
    fn transfer(
        &mut self,
        from: &Pubkey,
        recipient: &Pubkey,
        amount: u128,
        forward_note: Option<&[u8]>,
    ) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Transfer {
        query_id: u64,
        from: Pubkey,
        recipient: Pubkey,
        amount: u128,
        forward_note: Option<Vec<u8>>,
    },
    Validate {
        to: Pubkey,
        validation: ClaimValidation,
    },
    ClaimAccepted {
        to: Pubkey,
        query_id: u64,
        index: u64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition<S> {
    pub state: S,
    pub effects: Vec<Effect>,
}

impl<S> Transition<S> {
    pub fn new(state: S, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

/// Outcome of a completed claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub instance: ClaimInstance,
    pub recipient: Pubkey,
    pub amount: u128,
}

/// Runs a claim from `request` to acknowledgement: the instance checks its
/// flag and forwards, the authority verifies and pays, the instance records
/// the claim. Inputs are left untouched on failure.
pub fn process_claim<L: TokenLedger>(
    authority: &Authority,
    instance: &ClaimInstance,
    request: &ClaimRequest,
    ledger: &mut L,
) -> Result<Settlement> {
    let Transition { state, effects } = instance.handle_claim(request)?;
    let mut instance = state;
    let mut authority = authority.clone();
    let mut payout = None;

    // (sender, effect)
    let mut queue: VecDeque<(Pubkey, Effect)> = effects
        .into_iter()
        .map(|effect| (instance.address(), effect))
        .collect();

    while let Some((sender, effect)) = queue.pop_front() {
        match effect {
            Effect::Validate { to, validation } => {
                require_keys_eq!(to, authority.address(), DistributionError::UnexpectedSender);
                let transition = authority.handle_claim_validation(&sender, &validation)?;
                authority = transition.state;
                queue.extend(transition.effects.into_iter().map(|effect| (to, effect)));
            }
            Effect::Transfer {
                from,
                recipient,
                amount,
                forward_note,
                ..
            } => {
                ledger.transfer(&from, &recipient, amount, forward_note.as_deref())?;
                payout = Some((recipient, amount));
            }
            Effect::ClaimAccepted { to, index, .. } => {
                require_keys_eq!(to, instance.address(), DistributionError::UnexpectedSender);
                instance = instance.handle_accepted(&sender, index)?.state;
            }
        }
    }

    match payout {
        Some((recipient, amount)) if instance.claimed() => Ok(Settlement {
            instance,
            recipient,
            amount,
        }),
        _ => err!(DistributionError::ClaimNotSettled),
    }
}

/// Delivers an administrative message and executes the transfers it causes.
pub fn process_authority_message<L: TokenLedger>(
    authority: &Authority,
    sender: &Pubkey,
    message: &AuthorityMessage,
    ledger: &mut L,
) -> Result<Authority> {
    let Transition { state, effects } = authority.handle(sender, message)?;
    for effect in effects {
        match effect {
            Effect::Transfer {
                from,
                recipient,
                amount,
                forward_note,
                ..
            } => ledger.transfer(&from, &recipient, amount, forward_note.as_deref())?,
            other => {
                msg!("Unexpected effect {:?}", other);
                return err!(DistributionError::UnexpectedSender);
            }
        }
    }
    Ok(state)
}
