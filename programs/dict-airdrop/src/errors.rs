use anchor_lang::prelude::*;

#[error_code]
pub enum DistributionError {
    // 6000
    #[msg("PublicKeyMismatch")]
    PublicKeyMismatch,
    // 6001
    #[msg("UninitializedAccount")]
    UninitializedAccount,
    // 6002
    #[msg("IncorrectAuthority")]
    IncorrectAuthority,
    // 6003
    #[msg("NumericalOverflow")]
    NumericalOverflow,
    // 6004
    #[msg("Derived key invalid")]
    DerivedKeyInvalid,
    // 6005
    #[msg("Wrong account owner")]
    WrongAccountOwner,
    // 6006
    #[msg("Distribution has no entries")]
    EmptyDistribution,
    // 6007
    #[msg("Duplicate entry index")]
    DuplicateIndex,
    // 6008
    #[msg("Index not found")]
    IndexNotFound,
    // 6009
    #[msg("Malformed entry")]
    MalformedEntry,
    // 6010
    #[msg("Cell overflow")]
    CellOverflow,
    // 6011
    #[msg("Cell underflow")]
    CellUnderflow,
    // 6012
    #[msg("Malformed cell")]
    MalformedCell,
    // 6013
    #[msg("Malformed bag of cells")]
    MalformedBoc,
    // 6014
    #[msg("Invalid opcode")]
    InvalidOpcode,
    // 6015
    #[msg("Proof root does not match")]
    RootMismatch,
    // 6016
    #[msg("Proof does not cover index")]
    ProofIndexMismatch,
    // 6017
    #[msg("Proof is not in canonical form")]
    NonCanonicalProof,
    // 6018
    #[msg("Proof hash mismatch")]
    ProofHashMismatch,
    // 6019
    #[msg("Already claimed")]
    AlreadyClaimed,
    // 6020
    #[msg("Unexpected sender")]
    UnexpectedSender,
    // 6021
    #[msg("Ledger account not bound")]
    LedgerAccountNotBound,
    // 6022
    #[msg("Ledger account already bound")]
    LedgerAccountAlreadyBound,
    // 6023
    #[msg("Withdrawal disabled")]
    WithdrawalDisabled,
    // 6024
    #[msg("Forward note too long")]
    ForwardNoteTooLong,
    // 6025
    #[msg("Claim exchange ended without settlement")]
    ClaimNotSettled,
}

#[cfg(test)]
pub(crate) fn assert_error<T: std::fmt::Debug>(result: Result<T>, expected: DistributionError) {
    match result {
        Err(anchor_lang::error::Error::AnchorError(error)) => {
            assert_eq!(error.error_code_number, u32::from(expected), "{}", error.error_msg)
        }
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}
