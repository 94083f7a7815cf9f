//! User types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a new random user ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Payment method kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayMethodKind {
    /// Credit or check card
    Card,
    /// Bank transfer
    Transfer,
}

impl std::fmt::Display for PayMethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card => write!(f, "card"),
            Self::Transfer => write!(f, "transfer"),
        }
    }
}

impl std::str::FromStr for PayMethodKind {
    type Err = PayMethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "transfer" | "bank" => Ok(Self::Transfer),
            _ => Err(PayMethodParseError(s.to_string())),
        }
    }
}

/// Error parsing a payment method kind
#[derive(Debug, Clone)]
pub struct PayMethodParseError(pub String);

impl std::fmt::Display for PayMethodParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid payment method: {}", self.0)
    }
}

impl std::error::Error for PayMethodParseError {}

/// Non-sensitive payment-method display fields stored on the user document.
///
/// Payment credentials stay with the provider; only what the app renders on
/// the "my payment method" screen is persisted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayMethod {
    /// Card or transfer
    pub kind: PayMethodKind,
    /// Issuer or bank display name
    pub issuer: String,
    /// Masked card/account number (e.g. `1234-****-****-5678`)
    pub masked_number: String,
}
