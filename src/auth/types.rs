use serde::{Deserialize, Serialize};

/// JWT claims carried by staff bearer tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffClaims {
    pub username: String,
    pub is_staff: bool,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// The caller identity, resolved once per connection at handshake time
/// and never re-evaluated.
///
/// Anything short of an authenticated staff user collapses to
/// `Anonymous`: missing tokens, malformed tokens, expired tokens, and
/// valid tokens without the staff flag all look the same to the
/// session gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Staff { username: String },
    Anonymous,
}
