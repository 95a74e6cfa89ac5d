// A64Mask - AArch64 Logical Immediate Toolkit
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Bitmask-immediate decoding per the A64 `DecodeBitMasks` pseudocode.

use crate::bits::{highest_set_bit, ones, replicate, rotate_right};
use crate::RegisterWidth;

/// Result of decoding an (immN, imms, immr) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Outcome {
    /// The materialized immediate, replicated out to 64 bits. For a
    /// W register the caller truncates with [`RegisterWidth::mask`].
    Valid(u64),
    /// Architecturally UNDEFINED field combination.
    Reserved,
}

impl Outcome {
    pub fn value(self) -> Option<u64> {
        match self {
            Outcome::Valid(value) => Some(value),
            Outcome::Reserved => None,
        }
    }

    pub fn is_reserved(self) -> bool {
        matches!(self, Outcome::Reserved)
    }
}

/// Decodes a bitmask immediate: a run of `imms+1` ones (relative to the
/// element size), rotated right by `immr` and replicated across 64 bits.
///
/// `logical_immediate` selects the AND/ORR/EOR/ANDS immediate context,
/// where an all-ones S field is reserved. `width` is the register width
/// the caller will mask the result to; it does not change the computed
/// bits. Never panics: every in-range field combination decodes to
/// either [`Outcome::Valid`] or [`Outcome::Reserved`].
pub fn decode_bitmask(
    n: u8,
    imms: u8,
    immr: u8,
    logical_immediate: bool,
    width: RegisterWidth,
) -> Outcome {
    // The element size is derived from the MSB of immN:NOT(imms).
    // Length 0 would mean a 1-bit element, which this family never
    // encodes.
    let pattern = (u64::from(n) << 6) | (u64::from(!imms) & 0x3F);
    let length = match highest_set_bit(pattern) {
        Some(length) if length >= 1 => length,
        _ => return Outcome::Reserved,
    };

    let levels = ones(length);

    // An all-ones S field would decode to a trivial all-ones element;
    // the architecture reserves it for the immediate forms.
    if logical_immediate && (u64::from(imms) & levels) == levels {
        return Outcome::Reserved;
    }

    // Only the low `length` bits of S and R participate; higher bits are
    // not part of the element-relative encoding.
    let s = (u64::from(imms) & levels) as u32;
    let r = (u64::from(immr) & levels) as u32;

    let esize = 1u32 << length;
    let welem = ones(s + 1);
    let rotated = rotate_right(welem, r, esize);
    let result = replicate(rotated, esize, 64);

    tracing::trace!(
        "DecodeBitMasks: N={} imms={:#04x} immr={:#04x} esize={} width={} -> {:#018x}",
        n,
        imms,
        immr,
        esize,
        width.bits(),
        result
    );

    Outcome::Valid(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode64(n: u8, imms: u8, immr: u8) -> Outcome {
        decode_bitmask(n, imms, immr, true, RegisterWidth::W64)
    }

    #[test]
    fn test_decode_full_element_run() {
        // N=1, imms=0b011100 (28), immr=0b000011 (3):
        // esize=64, welem=ones(29), ROR 3 wraps three ones to the top.
        assert_eq!(decode64(1, 28, 3), Outcome::Valid(0xE000_0000_03FF_FFFF));
    }

    #[test]
    fn test_decode_small_elements() {
        // esize=2: imms=0b111100, one set bit per element.
        assert_eq!(decode64(0, 0b111100, 0), Outcome::Valid(0x5555_5555_5555_5555));
        // esize=8: imms=0b110000, single one per byte.
        assert_eq!(decode64(0, 0b110000, 0), Outcome::Valid(0x0101_0101_0101_0101));
        // esize=16: imms=0b100111 (s=7), immr=8: 0xFF rotated into the
        // upper byte of each halfword.
        assert_eq!(decode64(0, 0b100111, 8), Outcome::Valid(0xFF00_FF00_FF00_FF00));
        // esize=64: low 32 bits set.
        assert_eq!(decode64(1, 0b011111, 0), Outcome::Valid(0x0000_0000_FFFF_FFFF));
    }

    #[test]
    fn test_decode_w_register_masking() {
        // esize=32, s=0, immr=1: the single one rotates to bit 31 and
        // replicates into both halves of the 64-bit result.
        let outcome = decode_bitmask(0, 0, 1, true, RegisterWidth::W32);
        assert_eq!(outcome, Outcome::Valid(0x8000_0000_8000_0000));
        assert_eq!(RegisterWidth::W32.mask(outcome.value().unwrap()), 0x8000_0000);
    }

    #[test]
    fn test_decode_reserved_all_ones() {
        // imms all-ones within the element: reserved for immediates.
        assert!(decode64(1, 0b111111, 0).is_reserved());
        assert!(decode64(0, 0b011111, 5).is_reserved());
        assert!(decode64(0, 0b101111, 0).is_reserved());

        // Same fields outside the logical-immediate context decode.
        assert_eq!(
            decode_bitmask(1, 0b111111, 0, false, RegisterWidth::W64),
            Outcome::Valid(u64::MAX)
        );
    }

    #[test]
    fn test_decode_reserved_degenerate_length() {
        // N=0, imms=0b111111: immN:NOT(imms) has no set bit.
        for immr in 0..64 {
            assert!(decode64(0, 0b111111, immr).is_reserved());
        }
        // N=0, imms=0b111110: length 0 implies a 1-bit element.
        assert!(decode64(0, 0b111110, 0).is_reserved());
    }

    #[test]
    fn test_decode_ignores_high_rotation_bits() {
        // esize=2 only consumes immr<0>; immr=0b100001 behaves as 1.
        assert_eq!(decode64(0, 0b111100, 0b100001), decode64(0, 0b111100, 1));
    }
}
