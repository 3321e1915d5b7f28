pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use mocks::MockRelaySocket;
#[allow(unused_imports)]
pub use setup::{TestClient, TestSetup};
