//! Rate-limited credential verification and session token issuance.

pub mod hasher;
pub mod pipeline;
pub mod throttle;
pub mod token;
