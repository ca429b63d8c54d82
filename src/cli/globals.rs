use secrecy::SecretString;

/// Process-wide configuration shared by the server action.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub token_key: SecretString,
    pub token_ttl_seconds: u64,
    pub max_attempts: u32,
    pub reset_interval_seconds: u64,
    pub admin_username: Option<String>,
    pub admin_password: Option<SecretString>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(token_key: SecretString) -> Self {
        Self {
            token_key,
            token_ttl_seconds: 300,
            max_attempts: 5,
            reset_interval_seconds: 60,
            admin_username: None,
            admin_password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(SecretString::from("sikreta".to_string()));
        assert_eq!(args.token_key.expose_secret(), "sikreta");
        assert_eq!(args.token_ttl_seconds, 300);
        assert_eq!(args.max_attempts, 5);
        assert_eq!(args.reset_interval_seconds, 60);
        assert!(args.admin_username.is_none());
        assert!(args.admin_password.is_none());
    }
}
