//! Edge labels of the index trie.
//!
//! A label holding `len` key bits out of at most `max_len` remaining is written
//! in whichever of three forms is shortest:
//!
//! - `0` + `len` in unary + the bits
//! - `10` + `len` in `ceil(log2(max_len + 1))` bits + the bits
//! - `11` + the repeated bit + `len` in `ceil(log2(max_len + 1))` bits

use anchor_lang::prelude::*;

use crate::cell::{CellBuilder, CellSlice};
use crate::{DistributionError, KEY_BITS};

/// Bit `position` of `key`, counting from the most significant bit.
pub(crate) fn key_bit(key: u64, position: usize) -> u8 {
    ((key >> (KEY_BITS - 1 - position)) & 1) as u8
}

/// `len` bits of `key` starting at `offset`, right-aligned.
pub(crate) fn key_bits(key: u64, offset: usize, len: usize) -> u64 {
    if len == 0 {
        return 0;
    }
    (key << offset) >> (KEY_BITS - len)
}

fn ones(len: usize) -> u64 {
    if len >= KEY_BITS {
        u64::MAX
    } else {
        (1u64 << len) - 1
    }
}

fn len_width(max_len: usize) -> usize {
    (usize::BITS - max_len.leading_zeros()) as usize
}

pub(crate) fn store_label(
    builder: &mut CellBuilder,
    label: u64,
    len: usize,
    max_len: usize,
) -> Result<()> {
    let width = len_width(max_len);
    let short = 2 * len + 2;
    let long = 2 + width + len;
    let same = 3 + width;
    let uniform = len > 0 && (label == 0 || label == ones(len));

    if uniform && same < short && same < long {
        builder
            .store_uint(0b11, 2)?
            .store_bit(label != 0)?
            .store_uint(len as u128, width)?;
    } else if short <= long {
        builder.store_bit(false)?;
        for _ in 0..len {
            builder.store_bit(true)?;
        }
        builder.store_bit(false)?.store_uint(u128::from(label), len)?;
    } else {
        builder
            .store_uint(0b10, 2)?
            .store_uint(len as u128, width)?
            .store_uint(u128::from(label), len)?;
    }
    Ok(())
}

/// Returns `(label, len)`.
pub(crate) fn load_label(slice: &mut CellSlice, max_len: usize) -> Result<(u64, usize)> {
    let width = len_width(max_len);

    if !slice.load_bit()? {
        let mut len = 0;
        while slice.load_bit()? {
            len += 1;
            if len > max_len {
                return err!(DistributionError::MalformedCell);
            }
        }
        let label = slice.load_uint(len)? as u64;
        return Ok((label, len));
    }

    if !slice.load_bit()? {
        let len = slice.load_uint(width)? as usize;
        if len > max_len {
            return err!(DistributionError::MalformedCell);
        }
        let label = slice.load_uint(len)? as u64;
        return Ok((label, len));
    }

    let bit = slice.load_bit()?;
    let len = slice.load_uint(width)? as usize;
    if len > max_len {
        return err!(DistributionError::MalformedCell);
    }
    Ok((if bit { ones(len) } else { 0 }, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(label: u64, len: usize, max_len: usize) -> (usize, (u64, usize)) {
        let mut builder = CellBuilder::new();
        store_label(&mut builder, label, len, max_len).unwrap();
        let bits = builder.bits();
        let cell = builder.build().unwrap();
        let mut slice = cell.begin_parse();
        let decoded = load_label(&mut slice, max_len).unwrap();
        slice.end_parse().unwrap();
        (bits, decoded)
    }

    #[test]
    fn test_key_bits() {
        let key = 0x8000_0000_0000_0001u64;
        assert_eq!(key_bit(key, 0), 1);
        assert_eq!(key_bit(key, 1), 0);
        assert_eq!(key_bit(key, 63), 1);
        assert_eq!(key_bits(key, 0, 64), key);
        assert_eq!(key_bits(key, 0, 2), 0b10);
        assert_eq!(key_bits(key, 62, 2), 0b01);
        assert_eq!(key_bits(key, 64, 0), 0);
    }

    #[test]
    fn test_picks_shortest_form() {
        // empty label: short form `00`
        assert_eq!(encode(0, 0, 64), (2, (0, 0)));
        // a run of zeros: same form, 3 + 7 bits
        assert_eq!(encode(0, 40, 64), (10, (0, 40)));
        // a run of ones
        assert_eq!(encode(ones(20), 20, 64), (10, (ones(20), 20)));
        // mixed bits: long form, 2 + 7 + 10 bits
        assert_eq!(encode(0b10_1100_1110, 10, 64), (19, (0b10_1100_1110, 10)));
        // short labels stay unary
        assert_eq!(encode(0b1, 1, 64), (4, (0b1, 1)));
        // full key
        assert_eq!(encode(0xdead_beef_0123_4567, 64, 64).1, (0xdead_beef_0123_4567, 64));
    }

    #[test]
    fn test_rejects_overlong_label() {
        let mut builder = CellBuilder::new();
        store_label(&mut builder, 0b101, 3, 64).unwrap();
        let cell = builder.build().unwrap();
        assert!(load_label(&mut cell.begin_parse(), 2).is_err());
    }
}
