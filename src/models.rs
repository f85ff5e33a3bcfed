use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::crypto::SECRET_HASH_SIZE;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// How the session behind an API key was originally established
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoginType {
    #[default]
    Password,
    Oidc,
    Github,
}

impl LoginType {
    /// Whether validity of the session is governed by an upstream OIDC token
    #[must_use]
    pub fn is_oidc(self) -> bool {
        matches!(self, LoginType::Oidc)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LoginType::Password => "password",
            LoginType::Oidc => "oidc",
            LoginType::Github => "github",
        }
    }
}

impl fmt::Display for LoginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted state behind an API key
///
/// The store owns these records; each request works on its own copy and only
/// ever writes back the fields in [`SessionUpdate`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: String,
    #[serde(with = "secret_hash_base64")]
    pub secret_hash: [u8; SECRET_HASH_SIZE],
    #[serde(default)]
    pub login_type: LoginType,
    pub last_used: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub oidc_access_token: String,
    #[serde(default)]
    pub oidc_refresh_token: String,
    #[serde(default)]
    pub oidc_expiry: Option<DateTime<Utc>>,
}

/// Mutable fields of a [`SessionRecord`] as written by `update_session_by_id`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionUpdate {
    pub last_used: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub oidc_access_token: String,
    pub oidc_refresh_token: String,
    pub oidc_expiry: Option<DateTime<Utc>>,
}

impl From<&SessionRecord> for SessionUpdate {
    fn from(record: &SessionRecord) -> Self {
        Self {
            last_used: record.last_used,
            expires_at: record.expires_at,
            oidc_access_token: record.oidc_access_token.clone(),
            oidc_refresh_token: record.oidc_refresh_token.clone(),
            oidc_expiry: record.oidc_expiry,
        }
    }
}

impl SessionRecord {
    /// Apply a stored update to this record
    pub fn apply(&mut self, update: &SessionUpdate) {
        self.last_used = update.last_used;
        self.expires_at = update.expires_at;
        self.oidc_access_token.clone_from(&update.oidc_access_token);
        self.oidc_refresh_token.clone_from(&update.oidc_refresh_token);
        self.oidc_expiry = update.oidc_expiry;
    }
}

/// Public view of a bound session, safe to hand back to clients
#[derive(Serialize, Debug)]
pub struct SessionSummary {
    pub id: String,
    pub login_type: LoginType,
    pub last_used: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&SessionRecord> for SessionSummary {
    fn from(record: &SessionRecord) -> Self {
        Self {
            id: record.id.clone(),
            login_type: record.login_type,
            last_used: record.last_used,
            expires_at: record.expires_at,
        }
    }
}

mod secret_hash_base64 {
    use super::SECRET_HASH_SIZE;
    use base64::{engine::general_purpose, Engine as _};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        hash: &[u8; SECRET_HASH_SIZE],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[u8; SECRET_HASH_SIZE], D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(D::Error::custom)?;
        <[u8; SECRET_HASH_SIZE]>::try_from(bytes.as_slice()).map_err(|_| {
            D::Error::custom(format!(
                "secret_hash must be {SECRET_HASH_SIZE} bytes, got {}",
                bytes.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crypto::hash_secret;
    use chrono::Duration;

    #[test]
    fn test_session_record_json_uses_base64_hash() {
        let now = Utc::now();
        let record = SessionRecord {
            id: "abcdefghij".to_string(),
            secret_hash: hash_secret("secret"),
            login_type: LoginType::Oidc,
            last_used: now,
            expires_at: now + Duration::hours(1),
            oidc_access_token: "access".to_string(),
            oidc_refresh_token: "refresh".to_string(),
            oidc_expiry: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json["secret_hash"].as_str().unwrap(),
            "K7gNU3sdo+OL0wNhqoVWhr3g6s1xYv72ol/pe/Unols="
        );
        assert_eq!(json["login_type"].as_str().unwrap(), "oidc");

        let decoded: SessionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_session_record_rejects_short_hash() {
        let json = serde_json::json!({
            "id": "abcdefghij",
            "secret_hash": "AAAA",
            "last_used": "2024-01-01T00:00:00Z",
            "expires_at": "2024-01-02T00:00:00Z"
        });
        let err = serde_json::from_value::<SessionRecord>(json).unwrap_err();
        assert!(err.to_string().contains("secret_hash must be 32 bytes"));
    }

    #[test]
    fn test_optional_fields_default() {
        let json = serde_json::json!({
            "id": "abcdefghij",
            "secret_hash": "K7gNU3sdo+OL0wNhqoVWhr3g6s1xYv72ol/pe/Unols=",
            "last_used": "2024-01-01T00:00:00Z",
            "expires_at": "2024-01-02T00:00:00Z"
        });
        let record: SessionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.login_type, LoginType::Password);
        assert!(record.oidc_access_token.is_empty());
        assert!(record.oidc_expiry.is_none());
    }

    #[test]
    fn test_apply_update() {
        let now = Utc::now();
        let mut record = SessionRecord {
            id: "abcdefghij".to_string(),
            secret_hash: hash_secret("secret"),
            login_type: LoginType::Oidc,
            last_used: now - Duration::days(1),
            expires_at: now,
            oidc_access_token: "old".to_string(),
            oidc_refresh_token: "old-refresh".to_string(),
            oidc_expiry: None,
        };
        let update = SessionUpdate {
            last_used: now,
            expires_at: now + Duration::days(1),
            oidc_access_token: "new".to_string(),
            oidc_refresh_token: "new-refresh".to_string(),
            oidc_expiry: Some(now + Duration::days(1)),
        };

        record.apply(&update);
        assert_eq!(SessionUpdate::from(&record), update);
        assert_eq!(record.id, "abcdefghij");
    }
}
