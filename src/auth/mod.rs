// Public API
pub use authenticator::{Authenticator, JwtAuthenticator};
pub use token::TokenConfig;
pub use types::{Identity, StaffClaims};

// Internal modules
mod authenticator;
mod token;
mod types;
