//! Client-authentication crypto primitives
//!
//! Key (de)serialization, ECDH shared-secret derivation, and HMAC token
//! compute/verify for the authenticating RPC gate. Keys are NIST P-256;
//! public keys travel as SEC1 compressed points, base64 URL-safe encoded in
//! call metadata.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use p256::ecdh;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::error::{FedError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Length of the derived HMAC key in bytes
pub const SHARED_KEY_LENGTH: usize = 32;

/// Generate a fresh P-256 key pair
pub fn generate_key_pair() -> (SecretKey, PublicKey) {
    let secret = SecretKey::random(&mut OsRng);
    let public = secret.public_key();
    (secret, public)
}

/// Serialize a public key to SEC1 compressed bytes
pub fn public_key_to_bytes(public_key: &PublicKey) -> Vec<u8> {
    public_key.to_encoded_point(true).as_bytes().to_vec()
}

/// Parse a public key from SEC1 bytes (compressed or uncompressed)
pub fn public_key_from_bytes(bytes: &[u8]) -> Result<PublicKey> {
    PublicKey::from_sec1_bytes(bytes).map_err(|e| FedError::Crypto {
        message: format!("invalid public key: {e}"),
    })
}

/// Derive the shared HMAC key from our secret key and the peer's public key
///
/// ECDH key agreement followed by HKDF-SHA256 expansion to a fixed-length
/// symmetric key. Both sides derive the same key from their own secret and
/// the other's public key.
pub fn generate_shared_key(
    secret_key: &SecretKey,
    public_key: &PublicKey,
) -> Result<[u8; SHARED_KEY_LENGTH]> {
    let shared_secret = ecdh::diffie_hellman(secret_key.to_nonzero_scalar(), public_key.as_affine());
    let hk = Hkdf::<Sha256>::new(None, shared_secret.raw_secret_bytes().as_slice());
    let mut okm = [0u8; SHARED_KEY_LENGTH];
    hk.expand(b"", &mut okm).map_err(|e| FedError::Crypto {
        message: format!("key derivation failed: {e}"),
    })?;
    Ok(okm)
}

/// Compute an HMAC-SHA256 tag over `data`
pub fn compute_hmac(key: &[u8; SHARED_KEY_LENGTH], data: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Verify an HMAC-SHA256 tag over `data` in constant time
pub fn verify_hmac(key: &[u8; SHARED_KEY_LENGTH], data: &[u8], tag: &[u8]) -> bool {
    let mut mac =
        HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.verify_slice(tag).is_ok()
}

/// Encode metadata header bytes as URL-safe base64
pub fn encode_base64(value: &[u8]) -> String {
    URL_SAFE.encode(value)
}

/// Decode a URL-safe base64 metadata header value
pub fn decode_base64(value: &str) -> Result<Vec<u8>> {
    URL_SAFE.decode(value).map_err(|e| FedError::Crypto {
        message: format!("invalid base64: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_round_trip() {
        let (_, public) = generate_key_pair();
        let bytes = public_key_to_bytes(&public);
        let parsed = public_key_from_bytes(&bytes).unwrap();
        assert_eq!(public, parsed);
    }

    #[test]
    fn test_shared_key_agreement() {
        let (server_secret, server_public) = generate_key_pair();
        let (client_secret, client_public) = generate_key_pair();

        let server_side = generate_shared_key(&server_secret, &client_public).unwrap();
        let client_side = generate_shared_key(&client_secret, &server_public).unwrap();
        assert_eq!(server_side, client_side);
    }

    #[test]
    fn test_hmac_verify() {
        let (server_secret, _) = generate_key_pair();
        let (_, client_public) = generate_key_pair();
        let key = generate_shared_key(&server_secret, &client_public).unwrap();

        let tag = compute_hmac(&key, b"payload");
        assert!(verify_hmac(&key, b"payload", &tag));
        assert!(!verify_hmac(&key, b"tampered", &tag));
    }

    #[test]
    fn test_invalid_public_key_rejected() {
        assert!(public_key_from_bytes(&[0u8; 7]).is_err());
    }

    #[test]
    fn test_base64_round_trip() {
        let raw = vec![1u8, 2, 250, 255];
        assert_eq!(decode_base64(&encode_base64(&raw)).unwrap(), raw);
    }
}
