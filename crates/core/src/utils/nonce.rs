use alloy::primitives::{B256, Bytes};
use uuid::Uuid;

const WORD_BYTES: usize = 32;

/// 32 random bytes for a checker's storage pointer.
pub fn random_nonce() -> B256 {
    let (high, low) = (Uuid::new_v4(), Uuid::new_v4());
    let bytes: [&[u8]; 2] = [high.as_bytes(), low.as_bytes()];
    B256::from_slice(&bytes.concat())
}

/// Drops the trailing nonce word of an encoded initializer. The vault supplies it on execution.
pub fn strip_nonce(encoded: Vec<u8>) -> Bytes {
    let mut encoded = encoded;
    let len = encoded.len().saturating_sub(WORD_BYTES);
    encoded.truncate(len);
    Bytes::from(encoded)
}
