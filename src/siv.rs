//! The `seal`/`open` envelope (RFC 5297 §2.6): S2V for the synthetic IV,
//! CTR for the keystream, constant-time tag verification on `open`.

use crate::ctr::keystream;
use crate::s2v::s2v;
use aead::generic_array::typenum::{Unsigned, U16};
use aead::generic_array::GenericArray;
use aead::Error;
use alloc::vec::Vec;
use cipher::{BlockCipher, NewBlockCipher};
use core::convert::TryInto;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// Plaintext longer than this is rejected by `seal` (RFC 5297's
/// practical bound; the synthetic IV adds another 16 bytes on top).
const MAX_MESSAGE_LEN: usize = usize::MAX - 16;

/// Why [`Siv::open`] failed.
///
/// The immediate caller can match on this to log and alert on
/// *unauthentic* ciphertext separately from a malformed *invalid-length*
/// input, as required of any caller-facing failure. Converting to
/// [`Error`] with `.into()` collapses the distinction back to a single
/// opaque value, which is what any channel an attacker can observe
/// must report instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenError {
    /// `associated_data` carried more fields than S2V supports.
    InvalidInput,
    /// `input` was shorter than the 16-byte IV.
    InvalidLength,
    /// The recomputed IV did not match the one in `input`.
    Unauthentic,
}

impl From<OpenError> for Error {
    fn from(_: OpenError) -> Self {
        Error
    }
}

/// AES-SIV over a 128-bit block cipher `C`.
///
/// `C` is bounded by `BlockSize = U16` at the type level, which is the
/// Rust-idiomatic form of RFC 5297's "the block cipher must be 128-bit"
/// requirement: a mis-sized cipher simply does not implement the bound,
/// so it is a compile error rather than a runtime `configuration` error.
///
/// A single `Siv` is cheap to construct and safe to share across
/// threads (`mac_key`/`ctr_key` are plain byte buffers); each `seal`/
/// `open` call derives its own CMAC and block-cipher instances rather
/// than caching mutable cipher state, so there is no shared mutable
/// state to synchronize.
#[derive(Clone)]
pub struct Siv<C>
where
    C: BlockCipher<BlockSize = U16> + NewBlockCipher + Clone,
{
    mac_key: GenericArray<u8, C::KeySize>,
    ctr_key: GenericArray<u8, C::KeySize>,
}

impl<C> Siv<C>
where
    C: BlockCipher<BlockSize = U16> + NewBlockCipher + Clone,
{
    /// Construct from two independent, already-correctly-sized keys:
    /// `mac_key` for S2V, `ctr_key` for the CTR keystream.
    pub fn new(mac_key: &GenericArray<u8, C::KeySize>, ctr_key: &GenericArray<u8, C::KeySize>) -> Self {
        Self {
            mac_key: mac_key.clone(),
            ctr_key: ctr_key.clone(),
        }
    }

    /// Construct from byte slices, validating their lengths against the
    /// cipher's key size. This is the boundary at which an *invalid-key*
    /// error (spec taxonomy) can actually occur, since fixed-size
    /// `GenericArray` keys make a wrong-length key unrepresentable.
    pub fn from_slices(mac_key: &[u8], ctr_key: &[u8]) -> Result<Self, Error> {
        let key_size = C::KeySize::to_usize();
        if mac_key.len() != key_size || ctr_key.len() != key_size {
            return Err(Error);
        }
        Ok(Self::new(
            GenericArray::from_slice(mac_key),
            GenericArray::from_slice(ctr_key),
        ))
    }

    /// Construct from a single concatenated key `mac_key ‖ ctr_key`, the
    /// layout RFC 5297 itself specifies for "the SIV key."
    pub fn from_combined_key(key: &[u8]) -> Result<Self, Error> {
        let half = C::KeySize::to_usize();
        if key.len() != half * 2 {
            return Err(Error);
        }
        Self::from_slices(&key[..half], &key[half..])
    }

    /// Deterministic seal: `iv ‖ (plaintext XOR CTR-keystream)`.
    ///
    /// `associated_data` is ordered; reordering its elements changes the
    /// result. Fails with `invalid-input` if `plaintext` exceeds the
    /// practical length bound or `associated_data` carries more than 126
    /// fields.
    pub fn seal(&self, plaintext: &[u8], associated_data: &[&[u8]]) -> Result<Vec<u8>, Error> {
        if plaintext.len() > MAX_MESSAGE_LEN {
            return Err(Error);
        }

        let iv = s2v::<C>(&self.mac_key, plaintext, associated_data)?;
        let nb = block_count(plaintext.len());
        let ks = keystream::<C>(&self.ctr_key, &iv, nb);

        let mut out = Vec::with_capacity(16 + plaintext.len());
        out.extend_from_slice(&iv);
        out.extend(plaintext.iter().zip(ks.iter()).map(|(p, k)| p ^ k));
        Ok(out)
    }

    /// Open `iv ‖ ciphertext`, authenticating `associated_data` in the
    /// same order it was sealed with.
    ///
    /// Returns [`OpenError::InvalidLength`] if `input` is shorter than
    /// the 16-byte IV, or [`OpenError::Unauthentic`] if the recomputed
    /// IV does not match, so the caller can log and alert on the two
    /// differently. Use `.map_err(Error::from)` (or `?` into a function
    /// returning `Error`) to collapse both down to the same opaque value
    /// before the result crosses any channel an attacker can observe.
    pub fn open(&self, input: &[u8], associated_data: &[&[u8]]) -> Result<Vec<u8>, OpenError> {
        if input.len() < 16 {
            return Err(OpenError::InvalidLength);
        }
        let (iv, ct) = input.split_at(16);
        let iv: [u8; 16] = iv.try_into().expect("split_at(16) guarantees 16 bytes");

        let nb = block_count(ct.len());
        let ks = keystream::<C>(&self.ctr_key, &iv, nb);
        let plaintext: Vec<u8> = ct.iter().zip(ks.iter()).map(|(c, k)| c ^ k).collect();

        let expected_iv =
            s2v::<C>(&self.mac_key, &plaintext, associated_data).map_err(|_| OpenError::InvalidInput)?;

        if iv[..].ct_eq(&expected_iv[..]).unwrap_u8() == 1 {
            Ok(plaintext)
        } else {
            Err(OpenError::Unauthentic)
        }
    }
}

fn block_count(len: usize) -> usize {
    (len + 15) / 16
}

impl<C> Drop for Siv<C>
where
    C: BlockCipher<BlockSize = U16> + NewBlockCipher + Clone,
{
    fn drop(&mut self) {
        self.mac_key.as_mut_slice().zeroize();
        self.ctr_key.as_mut_slice().zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::{Aes128, Aes256};
    use hex_literal::hex;

    fn siv128(mac_key: [u8; 16], ctr_key: [u8; 16]) -> Siv<Aes128> {
        Siv::new(
            GenericArray::from_slice(&mac_key),
            GenericArray::from_slice(&ctr_key),
        )
    }

    // RFC 5297 Appendix A.1
    #[test]
    fn rfc5297_a1_end_to_end() {
        let mac_key = hex!("fffefdfc fbfaf9f8 f7f6f5f4 f3f2f1f0");
        let ctr_key = hex!("f0f1f2f3 f4f5f6f7 f8f9fafb fcfdfeff");
        let ad = hex!("10111213 14151617 18191a1b 1c1d1e1f 20212223 24252627");
        let pt = hex!("11223344 55667788 99aabbcc ddee");
        let expected_iv = hex!("85632d07 c6e8f37f 950acd32 0a2ecc93");
        let expected_ct = hex!("40c02b96 90c4dc04 daef7f6a fe5c");

        let siv = siv128(mac_key, ctr_key);
        let sealed = siv.seal(&pt, &[&ad]).unwrap();
        assert_eq!(&sealed[..16], &expected_iv[..]);
        assert_eq!(&sealed[16..], &expected_ct[..]);

        let opened = siv.open(&sealed, &[&ad]).unwrap();
        assert_eq!(opened, pt);
    }

    // RFC 5297 Appendix A.2, three AD fields.
    #[test]
    fn rfc5297_a2_three_ad_fields() {
        let mac_key = hex!("7f7e7d7c 7b7a7978 77767574 73727170");
        let ctr_key = hex!("40414243 44454647 48494a4b 4c4d4e4f");
        let ad0 = hex!(
            "00112233 44556677 8899aabb ccddeeff
             deaddada deaddada ffeeddcc bbaa9988
             77665544 33221100"
        );
        let ad1 = hex!("10203040 50607080 90a0");
        let ad2 = hex!("09f91102 9d74e35b d84156c5 635688c0");
        let pt = hex!(
            "74686973 20697320 736f6d65 20706c61
             696e7465 78742074 6f20656e 63727970
             74207573 696e6720 5349562d 414553"
        );
        let expected_iv = hex!("7bdb6e3b 432667eb 06f4d14b ff2fbd0f");
        let expected_ct = hex!(
            "cb900f2f ddbe4043 26601965 c889bf17
             dba77ceb 094fa663 b7a3f748 ba8af829
             ea64ad54 4a272e9c 485b62a3 fd5c0d"
        );

        let siv = siv128(mac_key, ctr_key);
        let ad: [&[u8]; 3] = [&ad0, &ad1, &ad2];
        let sealed = siv.seal(&pt, &ad).unwrap();
        assert_eq!(&sealed[..16], &expected_iv[..]);
        assert_eq!(&sealed[16..], &expected_ct[..]);

        assert_eq!(siv.open(&sealed, &ad).unwrap(), pt);
    }

    #[test]
    fn empty_plaintext_empty_ad_round_trips() {
        let siv = siv128([0u8; 16], [0u8; 16]);
        let sealed = siv.seal(&[], &[]).unwrap();
        assert_eq!(sealed.len(), 16);
        assert_eq!(siv.open(&sealed, &[]).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn single_bit_tamper_is_rejected() {
        let mac_key = hex!("fffefdfc fbfaf9f8 f7f6f5f4 f3f2f1f0");
        let ctr_key = hex!("f0f1f2f3 f4f5f6f7 f8f9fafb fcfdfeff");
        let ad = hex!("10111213 14151617 18191a1b 1c1d1e1f 20212223 24252627");
        let pt = hex!("11223344 55667788 99aabbcc ddee");

        let siv = siv128(mac_key, ctr_key);
        let mut sealed = siv.seal(&pt, &[&ad]).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;

        assert!(siv.open(&sealed, &[&ad]).is_err());
    }

    #[test]
    fn ad_reorder_fails_to_authenticate() {
        let mac_key = hex!("7f7e7d7c 7b7a7978 77767574 73727170");
        let ctr_key = hex!("40414243 44454647 48494a4b 4c4d4e4f");
        let ad0 = hex!("00112233 44556677 8899aabb ccddeeff");
        let ad1 = hex!("10203040 50607080 90a0");
        let pt = hex!("74686973 20697320 736f6d65");

        let siv = siv128(mac_key, ctr_key);
        let sealed_forward = siv.seal(&pt, &[&ad0, &ad1]).unwrap();
        let sealed_reversed = siv.seal(&pt, &[&ad1, &ad0]).unwrap();
        assert_ne!(sealed_forward[..16], sealed_reversed[..16]);

        assert!(siv.open(&sealed_reversed, &[&ad0, &ad1]).is_err());
    }

    #[test]
    fn truncated_input_is_invalid_length_not_unauthentic_panic() {
        let siv = siv128([0u8; 16], [0u8; 16]);
        let short = [0u8; 15];
        assert_eq!(siv.open(&short, &[]), Err(OpenError::InvalidLength));
    }

    #[test]
    fn tampered_input_is_unauthentic_not_invalid_length() {
        let mac_key = hex!("fffefdfc fbfaf9f8 f7f6f5f4 f3f2f1f0");
        let ctr_key = hex!("f0f1f2f3 f4f5f6f7 f8f9fafb fcfdfeff");
        let ad = hex!("10111213 14151617 18191a1b 1c1d1e1f 20212223 24252627");
        let pt = hex!("11223344 55667788 99aabbcc ddee");

        let siv = siv128(mac_key, ctr_key);
        let mut sealed = siv.seal(&pt, &[&ad]).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;

        assert_eq!(siv.open(&sealed, &[&ad]), Err(OpenError::Unauthentic));
    }

    #[test]
    fn determinism() {
        let siv = siv128([7u8; 16], [9u8; 16]);
        let a = siv.seal(b"same input", &[b"aad"]).unwrap();
        let b = siv.seal(b"same input", &[b"aad"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn length_is_plaintext_plus_16() {
        let siv = siv128([1u8; 16], [2u8; 16]);
        let pt = b"a message of some length";
        let sealed = siv.seal(pt, &[]).unwrap();
        assert_eq!(sealed.len(), pt.len() + 16);
    }

    #[test]
    fn aes256_round_trips_too() {
        let siv: Siv<Aes256> = Siv::new(
            GenericArray::from_slice(&[1u8; 32]),
            GenericArray::from_slice(&[2u8; 32]),
        );
        let sealed = siv.seal(b"hello world", &[b"ad"]).unwrap();
        assert_eq!(siv.open(&sealed, &[b"ad"]).unwrap(), b"hello world");
    }

    #[test]
    fn from_combined_key_splits_correctly() {
        let mac_key = [0x11u8; 16];
        let ctr_key = [0x22u8; 16];
        let mut combined = Vec::new();
        combined.extend_from_slice(&mac_key);
        combined.extend_from_slice(&ctr_key);

        let a = Siv::<Aes128>::from_combined_key(&combined).unwrap();
        let b = siv128(mac_key, ctr_key);
        assert_eq!(a.seal(b"x", &[]).unwrap(), b.seal(b"x", &[]).unwrap());
    }

    #[test]
    fn from_slices_rejects_wrong_length() {
        assert!(Siv::<Aes128>::from_slices(&[0u8; 15], &[0u8; 16]).is_err());
        assert!(Siv::<Aes128>::from_slices(&[0u8; 16], &[0u8; 17]).is_err());
    }
}
