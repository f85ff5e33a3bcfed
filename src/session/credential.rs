//! API key cookie parsing
//!
//! The cookie value is `<id>-<secret>`. Only the shape is checked here; nothing
//! touches the store until the shape is right.

use crate::session::errors::AuthError;

/// Separator between the public identifier and the secret
pub const SEPARATOR: char = '-';

/// Default length of the public identifier segment
pub const DEFAULT_ID_LENGTH: usize = 10;

/// Default length of the secret segment
pub const DEFAULT_SECRET_LENGTH: usize = 22;

/// Expected shape of a presented API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialFormat {
    pub id_length: usize,
    pub secret_length: usize,
}

impl Default for CredentialFormat {
    fn default() -> Self {
        Self {
            id_length: DEFAULT_ID_LENGTH,
            secret_length: DEFAULT_SECRET_LENGTH,
        }
    }
}

/// A structurally valid API key
///
/// `Debug` redacts the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeyCredential {
    pub id: String,
    secret: String,
}

impl std::fmt::Debug for ApiKeyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyCredential")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl ApiKeyCredential {
    /// Parse a raw cookie value
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedCredential` if the value does not split into
    /// exactly two segments or either segment has the wrong length
    pub fn parse(value: &str, format: &CredentialFormat) -> Result<Self, AuthError> {
        let mut segments = value.split(SEPARATOR);
        let (Some(id), Some(secret), None) = (segments.next(), segments.next(), segments.next())
        else {
            return Err(AuthError::MalformedCredential(
                "expected exactly two segments",
            ));
        };

        // Byte lengths: issued keys are ASCII alphanumerics.
        if id.len() != format.id_length {
            return Err(AuthError::MalformedCredential("invalid id length"));
        }
        if secret.len() != format.secret_length {
            return Err(AuthError::MalformedCredential("invalid secret length"));
        }

        Ok(Self {
            id: id.to_string(),
            secret: secret.to_string(),
        })
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}
