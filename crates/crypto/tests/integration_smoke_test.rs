//! Full roundtrip integration smoke test for sealpost-crypto.
//!
//! Exercises the flow two parties go through for one sealed message: key
//! generation, key exchange as strings, shared-secret derivation, encryption,
//! signing, verification and decryption.

use sealpost_crypto::agreement::{
    encryption_public_key_to_string, ephemeral_encryption_keys, string_to_encryption_public_key,
};
use sealpost_crypto::error::CryptoError;
use sealpost_crypto::signing::{
    ephemeral_signature_keys, signature_public_key_to_string, signature_to_string,
    string_to_signature, string_to_signature_public_key,
};
use sealpost_crypto::{content_hash, decrypt, derive_shared_secret, encrypt, sign, verify};

#[test]
fn full_roundtrip_alice_bob() {
    // -- Step 1: both parties generate keys --
    let (alice_enc_sk, alice_enc_pk) = ephemeral_encryption_keys();
    let (alice_sig_sk, alice_sig_pk) = ephemeral_signature_keys();
    let (bob_enc_sk, bob_enc_pk) = ephemeral_encryption_keys();

    // -- Step 2: public keys travel as strings --
    let alice_enc_pk_str = encryption_public_key_to_string(&alice_enc_pk);
    let alice_sig_pk_str = signature_public_key_to_string(&alice_sig_pk);
    let bob_enc_pk_str = encryption_public_key_to_string(&bob_enc_pk);

    // -- Step 3: Alice seals and signs --
    let bob_pk_seen_by_alice = string_to_encryption_public_key(&bob_enc_pk_str).unwrap();
    let alice_secret = derive_shared_secret(&alice_enc_sk, &bob_pk_seen_by_alice).unwrap();
    let sealed = encrypt(b"hello bob", &alice_secret).unwrap();
    let signature = signature_to_string(&sign(&sealed, &alice_sig_sk));
    let digest = content_hash(&sealed);

    // -- Step 4: Bob verifies and opens --
    let alice_sig_pk_seen_by_bob = string_to_signature_public_key(&alice_sig_pk_str).unwrap();
    let sig_bytes = string_to_signature(&signature).unwrap();
    assert!(verify(&sealed, &sig_bytes, &alice_sig_pk_seen_by_bob));
    assert_eq!(content_hash(&sealed), digest);

    let alice_pk_seen_by_bob = string_to_encryption_public_key(&alice_enc_pk_str).unwrap();
    let bob_secret = derive_shared_secret(&bob_enc_sk, &alice_pk_seen_by_bob).unwrap();
    assert_eq!(decrypt(&sealed, &bob_secret).unwrap(), b"hello bob");
}

#[test]
fn eavesdropper_cannot_open() {
    let (alice_sk, _) = ephemeral_encryption_keys();
    let (_, bob_pk) = ephemeral_encryption_keys();
    let (eve_sk, _) = ephemeral_encryption_keys();
    let (_, alice_pk) = ephemeral_encryption_keys();

    let secret = derive_shared_secret(&alice_sk, &bob_pk).unwrap();
    let sealed = encrypt(b"for bob only", &secret).unwrap();

    let eve_secret = derive_shared_secret(&eve_sk, &alice_pk).unwrap();
    assert_eq!(decrypt(&sealed, &eve_secret), Err(CryptoError::DecryptionFailed));
}
