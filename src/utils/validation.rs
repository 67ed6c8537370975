use crate::error::Result;
use validator::Validate;

/// Runs `validator` rules, logging rejected payloads at debug level.
pub fn validate<T: Validate + std::fmt::Debug>(val: &T) -> Result<()> {
    val.validate().map_err(|e| {
        tracing::debug!(payload = ?val, "validation failed: {}", e);
        e.into()
    })
}
