//! S2V (String-to-Vector), RFC 5297 §2.4: the CMAC-based PRF that chains
//! the associated-data vector and the plaintext into the synthetic IV.

use crate::bitops::{dbl, pad, xor, xorend};
use aead::generic_array::typenum::U16;
use aead::generic_array::GenericArray;
use aead::Error;
use cipher::{BlockCipher, NewBlockCipher};
use cmac::{Cmac, Mac, NewMac};
use core::convert::TryInto;

/// RFC 5297 §2.4: the S2V construction does not remain secure with more
/// than this many AD fields (one block-size's worth of doublings).
const MAX_ASSOCIATED_DATA_FIELDS: usize = 126;

/// `S2V(mac_key, plaintext, associated_data) -> 16-byte synthetic IV`.
///
/// `associated_data` is ordered; `[a, b]` and `[b, a]` produce different
/// tags. `associated_data.len() > 126` is an *invalid-input* error.
pub(crate) fn s2v<C>(
    mac_key: &GenericArray<u8, C::KeySize>,
    plaintext: &[u8],
    associated_data: &[&[u8]],
) -> Result<[u8; 16], Error>
where
    C: BlockCipher<BlockSize = U16> + NewBlockCipher + Clone,
{
    if associated_data.len() > MAX_ASSOCIATED_DATA_FIELDS {
        return Err(Error);
    }

    let mut mac = Cmac::<C>::new(mac_key);
    mac.update(&[0u8; 16]);
    let mut d: [u8; 16] = mac
        .finalize_reset()
        .into_bytes()
        .as_slice()
        .try_into()
        .expect("CMAC output is always 16 bytes");

    for field in associated_data {
        mac.update(field);
        let field_mac: [u8; 16] = mac
            .finalize_reset()
            .into_bytes()
            .as_slice()
            .try_into()
            .expect("CMAC output is always 16 bytes");
        let doubled = dbl(&d);
        for i in 0..16 {
            d[i] = doubled[i] ^ field_mac[i];
        }
    }

    let t = if plaintext.len() >= 16 {
        xorend(plaintext, &d)
    } else {
        let doubled = dbl(&d);
        let padded = pad(plaintext);
        xor(&doubled, &padded)
    };

    mac.update(&t);
    let tag: [u8; 16] = mac
        .finalize_reset()
        .into_bytes()
        .as_slice()
        .try_into()
        .expect("CMAC output is always 16 bytes");
    Ok(tag)
}
