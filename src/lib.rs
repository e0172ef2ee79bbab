//! [AES-SIV][1] ([RFC 5297][2]): deterministic, misuse-resistant
//! [Authenticated Encryption with Associated Data (AEAD)][3] built from
//! AES-CMAC and AES-CTR.
//!
//! Unlike nonce-based AEAD constructions, AES-SIV is a *deterministic*
//! AEAD (DAE): identical `(keys, plaintext, associated data)` always
//! produce identical output, and there is no nonce to misuse. The
//! synthetic IV produced by [S2V][4] doubles as both the authentication
//! tag and the CTR-mode starting counter, which is what makes the
//! construction misuse-resistant: reusing identical inputs reproduces
//! the same ciphertext rather than handing an attacker a
//! plaintext-independent keystream oracle, the failure mode nonce reuse
//! causes in GCM or CTR-then-MAC constructions.
//!
//! [1]: https://en.wikipedia.org/wiki/AES-SIV
//! [2]: https://tools.ietf.org/html/rfc5297
//! [3]: https://en.wikipedia.org/wiki/Authenticated_encryption
//! [4]: https://tools.ietf.org/html/rfc5297#section-2.4
//!
//! # Associated data is an ordered vector
//!
//! `seal`/`open` take a *slice of byte-string fields*, not a single
//! associated-data blob: `&[a, b]` authenticates differently than
//! `&[b, a]`. This matches RFC 5297 §2.4's S2V chaining, which folds
//! each field through CMAC and a GF(2^128) doubling in order. Up to 126
//! fields are supported; more than that is rejected (RFC 5297's S2V
//! does not remain secure beyond one block-size's worth of doublings).
//!
//! ```
//! use aes_siv::Aes128Siv;
//! use aead::generic_array::GenericArray;
//!
//! let mac_key = GenericArray::from_slice(&[0x11; 16]);
//! let ctr_key = GenericArray::from_slice(&[0x22; 16]);
//! let siv = Aes128Siv::new(mac_key, ctr_key);
//!
//! let sealed = siv.seal(b"plaintext", &[b"header", b"trailer"]).unwrap();
//! let opened = siv.open(&sealed, &[b"header", b"trailer"]).unwrap();
//! assert_eq!(opened, b"plaintext");
//! ```
//!
//! # What this crate does not do
//!
//! No nonce-based/streaming AEAD mode, no hardware-specific code paths,
//! and no key wrapping as a distinct API (RFC 5297 §2.5 key wrap is just
//! `seal` with an empty plaintext, so it needs no separate surface).
//! Key derivation and key storage are the caller's responsibility. The
//! one exception: a [`Siv`] itself holds a copy of both keys for as
//! long as it lives (to re-key CMAC/CTR on every call), and zeroizes
//! that copy when dropped.

#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

mod bitops;
mod ctr;
mod s2v;
mod siv;

pub use aead::{self, Error};
pub use siv::{OpenError, Siv};

use aes::{Aes128, Aes256};

/// AES-SIV with two independent 128-bit keys (`AEAD_AES_SIV_CMAC_256`).
pub type Aes128Siv = Siv<Aes128>;

/// AES-SIV with two independent 256-bit keys (`AEAD_AES_SIV_CMAC_512`).
pub type Aes256Siv = Siv<Aes256>;
