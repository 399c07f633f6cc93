//! URL error recovery
//!
//! Given a failing image URL and its error classification, tries a bounded
//! sequence of rewrite strategies with increasing backoff:
//! - Unwrap an image-proxy URL back to the original asset
//! - Swap CDN quality/format/size parameters to safe values
//! - Fix common URL defects (scheme, duplicate slashes, whitespace)
//!
//! Every candidate is validated by actually probing it before acceptance.
//! Exhausting the retry budget is a normal outcome, signalled by `None`;
//! callers fall back to their configured placeholder image.

pub mod error;
pub mod probe;
pub mod rewrite;
pub mod strategy;
pub mod types;

pub use error::{RecoveryError, RecoveryResult};
pub use probe::{HttpProbe, UrlProbe};
pub use strategy::ErrorRecoveryStrategy;
pub use types::RecoveryConfig;
