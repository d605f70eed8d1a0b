//! PIN gate.
//!
//! Both values are hashed with SHA-256 and the digests compared with
//! `subtle::ConstantTimeEq`, so comparison time depends on neither the
//! contents nor the lengths of the PINs.

use common::secret::{is_blank, ExposeSecret, SecretString};
use ring::digest::{digest, SHA256};
use subtle::ConstantTimeEq;

/// Returns `true` only if `supplied` matches a configured, non-blank PIN.
///
/// An unset or blank expected PIN never passes.
pub fn verify(supplied: &SecretString, expected: Option<&SecretString>) -> bool {
    let Some(expected) = expected.filter(|e| !is_blank(e)) else {
        return false;
    };

    let supplied_digest = digest(&SHA256, supplied.expose_secret().as_bytes());
    let expected_digest = digest(&SHA256, expected.expose_secret().as_bytes());

    supplied_digest
        .as_ref()
        .ct_eq(expected_digest.as_ref())
        .into()
}
