//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Commission report commands
pub mod commissions;

/// General utility commands
pub mod general;

/// Network tree commands
pub mod network;

// Export commands
pub use commissions::*;
pub use general::*;
pub use network::*;
