//! Bias and gap detectors
//!
//! - **Bias**: 20-bar SMA trend classification of a coarse series
//! - **Gap**: three-bar Fair Value Gap scan of a fine series, filtered by bias

pub mod helpers;

pub mod bias;
pub mod gap;

// Re-export all detectors for convenience
pub use bias::*;
pub use gap::*;
pub use helpers::*;
