use rand::RngCore;
use std::time::{SystemTime, UNIX_EPOCH};

const PAYMENT_PREFIX: &str = "HORTENCIA_PAYMENT";
const BOOKING_PREFIX: &str = "BOOK";

/// New reference in the payment space.
pub fn payment_reference() -> String {
    tagged_reference(PAYMENT_PREFIX)
}

/// New reference in the booking space.
pub fn booking_reference() -> String {
    tagged_reference(BOOKING_PREFIX)
}

/// `{PREFIX}_{unix_millis}_{8 uppercase hex}` — 4 random bytes on top of a
/// millisecond clock keeps collisions negligible at hotel volumes, and the
/// prefixes keep the two spaces disjoint from each other and from anything
/// the gateway issues.
fn tagged_reference(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let mut suffix = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut suffix);
    format!("{prefix}_{millis}_{}", hex::encode_upper(suffix))
}
