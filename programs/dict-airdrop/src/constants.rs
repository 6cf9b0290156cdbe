// PDA seeds
pub const DISTRIBUTION_SEED: &[u8] = b"distribution";
pub const CLAIM_SEED: &[u8] = b"claim";

// Dictionary keys are big-endian u64 indices
pub const KEY_BITS: usize = 64;

// Amounts are stored as a 5-bit byte length followed by that many bytes (max 16)
pub const AMOUNT_LEN_BITS: usize = 5;

// Opaque bytes echoed on every payout
pub const MAX_FORWARD_NOTE_LEN: usize = 128;
