use std::sync::Arc;

use anchor_lang::prelude::*;

use super::address::ClaimInstanceConfig;
use super::message::{op, ClaimRequest};
use super::{Effect, Transition};
use crate::cell::{Cell, CellBuilder};
use crate::dict::MerkleProof;
use crate::DistributionError;

/// Claim instance -> authority. Only a [`ClaimInstance`] can build one, so an
/// authority holding it knows which instance asked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimValidation {
    query_id: u64,
    index: u64,
    proof: MerkleProof,
}

impl ClaimValidation {
    pub fn query_id(&self) -> u64 {
        self.query_id
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn proof(&self) -> &MerkleProof {
        &self.proof
    }

    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = CellBuilder::new();
        builder
            .store_uint(u128::from(op::PROCESS_CLAIM), 32)?
            .store_uint(u128::from(self.query_id), 64)?
            .store_uint(u128::from(self.index), 64)?
            .store_ref(self.proof.cell().clone())?;
        builder.build()
    }
}

/// One claim attempt for one index, addressed by
/// `(authority, index, proof fingerprint)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimInstance {
    address: Pubkey,
    config: ClaimInstanceConfig,
    claimed: bool,
}

impl ClaimInstance {
    /// A fresh, unclaimed instance at its derived address.
    pub fn materialize(config: ClaimInstanceConfig, claim_program: &Pubkey) -> Self {
        let (address, _) = config.derive_address(claim_program);
        Self::at(address, config, false)
    }

    pub fn at(address: Pubkey, config: ClaimInstanceConfig, claimed: bool) -> Self {
        Self {
            address,
            config,
            claimed,
        }
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn config(&self) -> &ClaimInstanceConfig {
        &self.config
    }

    pub fn claimed(&self) -> bool {
        self.claimed
    }

    /// `false` for an address nothing has materialized yet.
    pub fn is_claimed(instance: Option<&ClaimInstance>) -> bool {
        instance.map_or(false, |instance| instance.claimed)
    }

    pub fn handle_claim(&self, request: &ClaimRequest) -> Result<Transition<ClaimInstance>> {
        if self.claimed {
            msg!("Index {} already claimed", self.config.index);
            return err!(DistributionError::AlreadyClaimed);
        }
        let fingerprint = request.proof.fingerprint();
        if fingerprint != self.config.proof_hash {
            msg!("Proof hash {:02X?}", fingerprint);
            msg!("Instance expects {:02X?}", self.config.proof_hash);
            return err!(DistributionError::ProofHashMismatch);
        }

        let validation = ClaimValidation {
            query_id: request.query_id,
            index: self.config.index,
            proof: request.proof.clone(),
        };
        let forward = Effect::Validate {
            to: self.config.authority,
            validation,
        };
        Ok(Transition::new(self.clone(), vec![forward]))
    }

    pub fn handle_accepted(&self, from: &Pubkey, index: u64) -> Result<Transition<ClaimInstance>> {
        if *from != self.config.authority {
            msg!("Acknowledgement from {}, expected {}", from, self.config.authority);
            return err!(DistributionError::UnexpectedSender);
        }
        if index != self.config.index {
            msg!("Acknowledged index {}, instance holds {}", index, self.config.index);
            return err!(DistributionError::ProofIndexMismatch);
        }
        let mut state = self.clone();
        state.claimed = true;
        Ok(Transition::new(state, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::{Dictionary, Entry};
    use crate::errors::assert_error;

    struct Fixture {
        authority: Pubkey,
        dict: Dictionary,
        claim_program: Pubkey,
    }

    fn fixture() -> Fixture {
        let entries: Vec<Entry> = (0..10)
            .map(|index| Entry {
                index,
                recipient: Pubkey::new_unique(),
                amount: 100 + u128::from(index),
            })
            .collect();
        Fixture {
            authority: Pubkey::new_unique(),
            dict: Dictionary::build(&entries).unwrap(),
            claim_program: Pubkey::new_unique(),
        }
    }

    fn instance_for(fixture: &Fixture, index: u64) -> (ClaimInstance, ClaimRequest) {
        let proof = fixture.dict.generate_proof(index).unwrap();
        let config = ClaimInstanceConfig {
            authority: fixture.authority,
            index,
            proof_hash: proof.fingerprint(),
        };
        let request = ClaimRequest { query_id: 11, proof };
        (ClaimInstance::materialize(config, &fixture.claim_program), request)
    }

    #[test]
    fn test_claim_forwards_to_authority() {
        let fixture = fixture();
        let (instance, request) = instance_for(&fixture, 4);
        assert!(!ClaimInstance::is_claimed(Some(&instance)));
        assert!(!ClaimInstance::is_claimed(None));

        let transition = instance.handle_claim(&request).unwrap();
        assert!(!transition.state.claimed());
        match &transition.effects[..] {
            [Effect::Validate { to, validation }] => {
                assert_eq!(*to, fixture.authority);
                assert_eq!(validation.index(), 4);
                assert_eq!(validation.query_id(), 11);
                assert_eq!(validation.proof(), &request.proof);
            }
            other => panic!("unexpected effects {:?}", other),
        }
    }

    #[test]
    fn test_acknowledgement_marks_claimed() {
        let fixture = fixture();
        let (instance, request) = instance_for(&fixture, 2);

        assert_error(
            instance.handle_accepted(&Pubkey::new_unique(), 2),
            DistributionError::UnexpectedSender,
        );
        assert_error(
            instance.handle_accepted(&fixture.authority, 3),
            DistributionError::ProofIndexMismatch,
        );

        let claimed = instance.handle_accepted(&fixture.authority, 2).unwrap().state;
        assert!(ClaimInstance::is_claimed(Some(&claimed)));
        assert_error(claimed.handle_claim(&request), DistributionError::AlreadyClaimed);
    }

    #[test]
    fn test_rejects_proof_of_another_fingerprint() {
        let fixture = fixture();
        let (instance, _) = instance_for(&fixture, 1);
        let (_, other) = instance_for(&fixture, 2);
        assert_error(instance.handle_claim(&other), DistributionError::ProofHashMismatch);
    }

    #[test]
    fn test_validation_wire_format() {
        let fixture = fixture();
        let (instance, request) = instance_for(&fixture, 7);
        let transition = instance.handle_claim(&request).unwrap();
        let Some(Effect::Validate { validation, .. }) = transition.effects.first() else {
            panic!("no validation emitted");
        };

        let cell = validation.to_cell().unwrap();
        let mut slice = cell.begin_parse();
        assert_eq!(slice.load_u32().unwrap(), op::PROCESS_CLAIM);
        assert_eq!(slice.load_u64().unwrap(), 11);
        assert_eq!(slice.load_u64().unwrap(), 7);
        assert_eq!(slice.load_ref().unwrap().repr_hash(), request.proof.fingerprint());
        slice.end_parse().unwrap();
    }
}
