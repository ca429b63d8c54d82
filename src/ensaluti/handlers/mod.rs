pub mod health;
pub use self::health::health;

pub mod login;
pub use self::login::login;

// common functions for the handlers
use regex::Regex;

/// Usernames are a single non-empty token; anything else is a malformed
/// payload, not a failed credential check.
pub fn valid_username(username: &str) -> bool {
    Regex::new(r"^\S{1,64}$").map_or(false, |re| re.is_match(username))
}
