//! RFC 5297 §2.5 CTR-mode keystream generator.
//!
//! This is *not* the generic `ctr` crate's counter mode: SIV clears the
//! top bit of bytes 8 and 12 of the initial counter block before
//! incrementing, so that the 64-bit counter in the low half never carries
//! into the high half for any message within the block count limit. That
//! one divergence is why this crate hand-rolls the loop instead of
//! depending on `ctr`.

use aead::generic_array::typenum::U16;
use aead::generic_array::GenericArray;
use alloc::vec::Vec;
use cipher::{BlockCipher, NewBlockCipher};
use core::convert::TryInto;

/// Generate `nb` blocks (`nb * 16` bytes) of keystream from `iv` (the
/// synthetic IV produced by S2V) under `ctr_key`.
pub(crate) fn keystream<C>(ctr_key: &GenericArray<u8, C::KeySize>, iv: &[u8; 16], nb: usize) -> Vec<u8>
where
    C: BlockCipher<BlockSize = U16> + NewBlockCipher,
{
    let cipher = C::new(ctr_key);

    let mut q = *iv;
    q[8] &= 0x7f;
    q[12] &= 0x7f;

    let c0 = u64::from_be_bytes(q[8..16].try_into().expect("8-byte slice"));

    let mut out = Vec::with_capacity(nb * 16);
    for i in 0..nb as u64 {
        let c = c0.wrapping_add(i);
        q[8..16].copy_from_slice(&c.to_be_bytes());

        let mut block = GenericArray::clone_from_slice(&q);
        cipher.encrypt_block(&mut block);
        out.extend_from_slice(block.as_slice());
    }
    out
}
