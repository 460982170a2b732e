//! Signed ticket payload: AES-256-GCM over a compact JSON structure. The
//! key is a single deployment-wide secret
//! (`AppConfig::ticket_encryption_key`), never generated at import time -
//! loading and validating it is [`crate::config`]'s job, not this one's.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core_types::{CustomerId, EventId, SeatId, TicketId, ZoneId};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketPayload {
    pub ticket_id: TicketId,
    pub ticket_number: String,
    pub event_id: EventId,
    pub customer_id: CustomerId,
    pub zone_id: ZoneId,
    pub seat_id: Option<SeatId>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub max_usage: i32,
    pub created_at: DateTime<Utc>,
}

const NONCE_LEN: usize = 12;

/// Encrypt a payload to the base64 string stored as `signed_payload`.
/// Nonce is random per call and prefixed to the ciphertext, standard AEAD
/// practice (the key alone must never be reused with a fixed nonce).
pub fn encrypt(key: &[u8; 32], payload: &TicketPayload) -> CoreResult<String> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let plaintext = serde_json::to_vec(payload)
        .map_err(|e| CoreError::internal(format!("failed to serialize ticket payload: {e}")))?;
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_ref())
        .map_err(|e| CoreError::internal(format!("ticket encryption failed: {e}")))?;

    let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(combined))
}

/// Decrypt a `signed_payload` string back to its [`TicketPayload`].
/// Errors (including tamper/auth failure) surface as `Validation`, since a
/// malformed payload is caller input, not a core bug.
pub fn decrypt(key: &[u8; 32], signed_payload: &str) -> CoreResult<TicketPayload> {
    let combined = BASE64
        .decode(signed_payload)
        .map_err(|_| CoreError::validation("ticket payload is not valid base64"))?;
    if combined.len() < NONCE_LEN {
        return Err(CoreError::validation("ticket payload is too short"));
    }
    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CoreError::validation("ticket payload failed authenticity check"))?;

    serde_json::from_slice(&plaintext)
        .map_err(|_| CoreError::validation("ticket payload decrypted to malformed data"))
}

/// `SHA-256(ticket_number || event_id || customer_id)`, stored alongside
/// the encrypted payload for a cheap authenticity pre-check.
pub fn validation_hash(ticket_number: &str, event_id: EventId, customer_id: CustomerId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ticket_number.as_bytes());
    hasher.update(event_id.as_bytes());
    hasher.update(customer_id.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_payload() -> TicketPayload {
        TicketPayload {
            ticket_id: Uuid::new_v4(),
            ticket_number: "7-0-1".to_string(),
            event_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            zone_id: Uuid::new_v4(),
            seat_id: Some(Uuid::new_v4()),
            valid_from: Utc::now(),
            valid_until: Utc::now() + chrono::Duration::days(1),
            max_usage: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn round_trips_through_encrypt_decrypt() {
        let key = [7u8; 32];
        let payload = sample_payload();
        let encrypted = encrypt(&key, &payload).unwrap();
        let decrypted = decrypt(&key, &encrypted).unwrap();
        assert_eq!(decrypted, payload);
    }

    #[test]
    fn wrong_key_fails_authenticity() {
        let payload = sample_payload();
        let encrypted = encrypt(&[1u8; 32], &payload).unwrap();
        assert!(decrypt(&[2u8; 32], &encrypted).is_err());
    }

    #[test]
    fn validation_hash_is_deterministic() {
        let event_id = Uuid::new_v4();
        let customer_id = Uuid::new_v4();
        let a = validation_hash("7-0-1", event_id, customer_id);
        let b = validation_hash("7-0-1", event_id, customer_id);
        assert_eq!(a, b);
    }
}
