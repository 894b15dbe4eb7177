use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies an HMAC-SHA256 webhook signature against the raw request body
/// (§6: payment webhook + TalkTalk/Kakao push endpoints share this scheme).
/// `signature_hex` is the lowercase-hex digest the sender attached; the
/// comparison is constant-time via [`Mac::verify_slice`] rather than a
/// direct byte comparison.
pub fn verify_hmac_sha256(secret: &str, payload: &[u8], signature_hex: &str) -> bool {
    let Ok(signature_bytes) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&signature_bytes).is_ok()
}

pub fn sign_hmac_sha256(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_correctly_signed_payload() {
        let signature = sign_hmac_sha256("shared-secret", b"payload-body");
        assert!(verify_hmac_sha256("shared-secret", b"payload-body", &signature));
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let signature = sign_hmac_sha256("shared-secret", b"payload-body");
        assert!(!verify_hmac_sha256("shared-secret", b"tampered-body", &signature));
    }

    #[test]
    fn rejects_a_signature_from_the_wrong_secret() {
        let signature = sign_hmac_sha256("wrong-secret", b"payload-body");
        assert!(!verify_hmac_sha256("shared-secret", b"payload-body", &signature));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(!verify_hmac_sha256("shared-secret", b"payload-body", "not-hex"));
    }
}
