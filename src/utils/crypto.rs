use data_encoding::HEXLOWER;
use ring::digest::{Context, SHA256};

use crate::error::{BlockchainError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Length of a SHA-256 digest rendered as lowercase hex
pub const HEX_DIGEST_LEN: usize = 64;

pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Clock(format!("System time error: {e}")))?
        .as_millis();

    // Ensure the timestamp fits in i64
    if duration > i64::MAX as u128 {
        return Err(BlockchainError::Clock("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

/// SHA-256 of `data` as a 64 character lowercase hex string
pub fn sha256_hex(data: &[u8]) -> String {
    HEXLOWER.encode(sha256_digest(data).as_slice())
}

/// True when `hex_digest` starts with at least `zeros` '0' characters
pub fn has_leading_zeros(hex_digest: &str, zeros: usize) -> bool {
    hex_digest.len() >= zeros && hex_digest.bytes().take(zeros).all(|b| b == b'0')
}
