//! Storage account names: recovering one from a blob URI and generating
//! fresh candidates.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Local;
use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;

/// Azure caps storage account names at 24 characters.
pub const MAX_ACCOUNT_NAME_LEN: usize = 24;

/// Storage account name owning a blob URI, i.e. the host label before the
/// first `.`.
///
/// Returns `None` for anything that does not parse as an absolute URL with a
/// host.
pub fn account_name_from_uri(uri: &str) -> Option<String> {
    let parsed = Url::parse(uri).ok()?;
    let host = parsed.host_str()?;
    let name = host.split('.').next()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Fresh candidate name for a diagnostics account.
///
/// Seeded from a random UUID, the local timestamp, the subscription and the
/// resource group, so two calls practically never collide.
pub fn generate_account_name(subscription_id: &str, resource_group: &str) -> String {
    let seed = format!(
        "{}{}{}{}",
        Uuid::new_v4(),
        Local::now().format("%Y-%m-%dT%H:%M:%S%.f"),
        subscription_id,
        resource_group
    );
    account_name_from_seed(&seed)
}

/// SHA-256 of `seed`, base64 encoded, reduced to lowercase alphanumerics and
/// cut to [`MAX_ACCOUNT_NAME_LEN`].
pub fn account_name_from_seed(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    STANDARD
        .encode(digest)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_ACCOUNT_NAME_LEN)
        .collect()
}
