//! Client id generation

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

/// Length of the random part of an id
const RANDOM_SUFFIX_LEN: usize = 9;

/// Process-wide sequence, guarantees uniqueness even within one millisecond
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate a new client id
///
/// Format: `<unix millis>-<sequence as hex><random alphanumerics>`.
#[must_use]
pub fn generate_client_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    format!("{millis}-{sequence:x}{suffix}")
}
