//! # Ensaluti
//!
//! `ensaluti` authenticates username/password credentials over HTTP and
//! issues short-lived signed session tokens.
//!
//! ## Login flow
//!
//! `POST /login` runs a fixed sequence: method check, payload parse,
//! per-username attempt throttle, credential lookup, password verify,
//! token issue. Any failure short-circuits to a single JSON response;
//! unknown usernames and wrong passwords are deliberately
//! indistinguishable to the caller.
//!
//! ## Brute-force protection
//!
//! Attempts are counted per username in a windowed in-memory throttle,
//! consulted before credentials are ever checked. Successful logins
//! consume a slot like any other attempt.
//!
//! ## Session tokens
//!
//! Tokens are HS256-signed JWTs carrying `{username, iat, exp}`. The
//! signing key is process configuration; verification is stateless, so
//! rotating the key invalidates every outstanding token.

pub mod auth;
pub mod cli;
pub mod ensaluti;
pub mod store;
