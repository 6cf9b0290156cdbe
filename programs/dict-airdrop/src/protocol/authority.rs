use anchor_lang::prelude::*;

use super::claim_instance::ClaimValidation;
use super::message::AuthorityMessage;
use super::{Effect, TokenLedger, Transition};
use crate::dict::verify_entry;
use crate::{DistributionError, MAX_FORWARD_NOTE_LEN};

/// Fixed at creation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorityConfig {
    /// `None` disables withdrawals entirely.
    pub admin: Option<Pubkey>,
    pub root: [u8; 32],
    /// Owner of every claim instance of this distribution.
    pub claim_program: Pubkey,
    /// Attached to every payout.
    pub forward_note: Option<Vec<u8>>,
    pub nonce: u64,
}

/// Read-only view returned by `get_distribution_data`.
#[derive(Clone, Debug, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct DistributionData {
    pub ledger_account: Option<Pubkey>,
    pub root: [u8; 32],
    pub claim_program: Pubkey,
    pub admin: Option<Pubkey>,
}

/// The distribution authority: validates claims against its root and pays
/// out of its ledger account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authority {
    address: Pubkey,
    config: AuthorityConfig,
    ledger_account: Option<Pubkey>,
}

impl Authority {
    pub fn new(address: Pubkey, config: AuthorityConfig) -> Result<Self> {
        if let Some(note) = &config.forward_note {
            if note.len() > MAX_FORWARD_NOTE_LEN {
                msg!("Forward note is {} bytes, limit {}", note.len(), MAX_FORWARD_NOTE_LEN);
                return err!(DistributionError::ForwardNoteTooLong);
            }
        }
        Ok(Self {
            address,
            config,
            ledger_account: None,
        })
    }

    /// Restores a previously bound ledger account.
    pub fn with_ledger_account(mut self, ledger_account: Option<Pubkey>) -> Self {
        self.ledger_account = ledger_account;
        self
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    pub fn root(&self) -> [u8; 32] {
        self.config.root
    }

    pub fn ledger_account(&self) -> Option<Pubkey> {
        self.ledger_account
    }

    /// Message that binds the ledger account the token ledger derives for
    /// this authority.
    pub fn set_ledger_account_message<L: TokenLedger>(&self, ledger: &L, query_id: u64) -> AuthorityMessage {
        AuthorityMessage::SetLedgerAccount {
            query_id,
            ledger_account: ledger.ledger_account_of(&self.address),
        }
    }

    pub fn handle(&self, sender: &Pubkey, message: &AuthorityMessage) -> Result<Transition<Authority>> {
        match message {
            AuthorityMessage::SetLedgerAccount { ledger_account, .. } => {
                if let Some(bound) = self.ledger_account {
                    msg!("Ledger account already bound to {}", bound);
                    return err!(DistributionError::LedgerAccountAlreadyBound);
                }
                msg!("Binding ledger account {}", ledger_account);
                let state = self.clone().with_ledger_account(Some(*ledger_account));
                Ok(Transition::new(state, Vec::new()))
            }
            AuthorityMessage::Withdraw { query_id, amount } => {
                let admin = self
                    .config
                    .admin
                    .ok_or_else(|| error!(DistributionError::WithdrawalDisabled))?;
                if *sender != admin {
                    msg!("Withdraw from {} rejected, admin is {}", sender, admin);
                    return err!(DistributionError::IncorrectAuthority);
                }
                let from = self
                    .ledger_account
                    .ok_or_else(|| error!(DistributionError::LedgerAccountNotBound))?;

                msg!("Withdrawing {} tokens", amount);
                let transfer = Effect::Transfer {
                    query_id: *query_id,
                    from,
                    recipient: admin,
                    amount: *amount,
                    forward_note: None,
                };
                Ok(Transition::new(self.clone(), vec![transfer]))
            }
        }
    }

    /// Second leg of a claim. `from` is the claim instance that built
    /// `validation`; the entry is read out of the proof and checked against
    /// the root before anything is paid.
    pub fn handle_claim_validation(
        &self,
        from: &Pubkey,
        validation: &ClaimValidation,
    ) -> Result<Transition<Authority>> {
        let ledger_account = self
            .ledger_account
            .ok_or_else(|| error!(DistributionError::LedgerAccountNotBound))?;
        let entry = verify_entry(validation.index(), validation.proof(), &self.config.root)?;

        msg!("Claiming {:#} tokens for index {}", entry.amount, entry.index);
        let effects = vec![
            Effect::Transfer {
                query_id: validation.query_id(),
                from: ledger_account,
                recipient: entry.recipient,
                amount: entry.amount,
                forward_note: self.config.forward_note.clone(),
            },
            Effect::ClaimAccepted {
                to: *from,
                query_id: validation.query_id(),
                index: entry.index,
            },
        ];
        Ok(Transition::new(self.clone(), effects))
    }

    pub fn distribution_data(&self) -> DistributionData {
        DistributionData {
            ledger_account: self.ledger_account,
            root: self.config.root,
            claim_program: self.config.claim_program,
            admin: self.config.admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::assert_error;

    fn authority(admin: Option<Pubkey>) -> Authority {
        Authority::new(
            Pubkey::new_unique(),
            AuthorityConfig {
                admin,
                root: [1; 32],
                claim_program: Pubkey::new_unique(),
                forward_note: Some(b"thanks".to_vec()),
                nonce: 9,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_ledger_account_binds_once() {
        let authority = authority(None);
        let ledger_account = Pubkey::new_unique();
        let set = AuthorityMessage::SetLedgerAccount {
            query_id: 0,
            ledger_account,
        };

        let bound = authority.handle(&Pubkey::new_unique(), &set).unwrap();
        assert!(bound.effects.is_empty());
        assert_eq!(bound.state.ledger_account(), Some(ledger_account));
        assert_eq!(bound.state.distribution_data().ledger_account, Some(ledger_account));

        assert_error(
            bound.state.handle(&Pubkey::new_unique(), &set),
            DistributionError::LedgerAccountAlreadyBound,
        );
    }

    #[test]
    fn test_withdraw_is_admin_only() {
        let admin = Pubkey::new_unique();
        let ledger_account = Pubkey::new_unique();
        let authority = authority(Some(admin)).with_ledger_account(Some(ledger_account));
        let withdraw = AuthorityMessage::Withdraw {
            query_id: 3,
            amount: 500,
        };

        let transition = authority.handle(&admin, &withdraw).unwrap();
        assert_eq!(
            transition.effects,
            vec![Effect::Transfer {
                query_id: 3,
                from: ledger_account,
                recipient: admin,
                amount: 500,
                forward_note: None,
            }]
        );
        assert_error(
            authority.handle(&Pubkey::new_unique(), &withdraw),
            DistributionError::IncorrectAuthority,
        );
    }

    #[test]
    fn test_withdraw_without_admin_is_disabled() {
        let authority = authority(None).with_ledger_account(Some(Pubkey::new_unique()));
        let withdraw = AuthorityMessage::Withdraw {
            query_id: 0,
            amount: 1,
        };
        assert_error(
            authority.handle(&Pubkey::new_unique(), &withdraw),
            DistributionError::WithdrawalDisabled,
        );
    }

    #[test]
    fn test_rejects_long_forward_note() {
        let config = AuthorityConfig {
            forward_note: Some(vec![0; MAX_FORWARD_NOTE_LEN + 1]),
            ..AuthorityConfig::default()
        };
        assert_error(
            Authority::new(Pubkey::new_unique(), config),
            DistributionError::ForwardNoteTooLong,
        );
    }
}
