use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One registered nickname as it sits in the snapshot file.
///
/// The digest is computed by the client before it reaches the wire; the
/// relay stores and compares it as an opaque string. On disk the field
/// keeps the historical name `password`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(rename = "password")]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
