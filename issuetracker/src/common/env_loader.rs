//! Environment variable loading with typed parsing and fallbacks

use std::env;
use std::str::FromStr;

/// Read an environment variable, falling back to `default` when unset
pub fn load_env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse an environment variable
///
/// Unset or unparseable values fall back to `default`; a malformed value is
/// logged so a typo in a deployment does not silently change behavior.
pub fn load_env_parsed<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring unparseable value {:?} for {}", raw, key);
                default
            }
        },
        Err(_) => default,
    }
}

/// Read and parse an environment variable as an `Option<T>`
pub fn load_env_optional<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Loads a family of environment variables sharing a common prefix
///
/// `EnvLoader::new("ISSUETRACKER").load_string("HOST", ..)` reads
/// `ISSUETRACKER_HOST`.
#[derive(Debug)]
pub struct EnvLoader {
    prefix: String,
}

impl EnvLoader {
    /// Create a new environment loader with the given prefix
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}_{}", self.prefix, suffix)
    }

    /// Load a string value with default
    pub fn load_string(&self, suffix: &str, default: &str) -> String {
        load_env_string(&self.key(suffix), default)
    }

    /// Load a parsed value with default
    pub fn load_parsed<T>(&self, suffix: &str, default: T) -> T
    where
        T: FromStr,
    {
        load_env_parsed(&self.key(suffix), default)
    }

    /// Load an optional value
    pub fn load_optional<T>(&self, suffix: &str) -> Option<T>
    where
        T: FromStr,
    {
        load_env_optional(&self.key(suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_env_string() {
        let key = "ISSUETRACKER_TEST_STRING_VAR";

        env::remove_var(key);
        assert_eq!(load_env_string(key, "fallback"), "fallback");

        env::set_var(key, "from-env");
        assert_eq!(load_env_string(key, "fallback"), "from-env");

        env::remove_var(key);
    }

    #[test]
    #[serial]
    fn test_load_env_parsed_falls_back_on_garbage() {
        let key = "ISSUETRACKER_TEST_PARSED_VAR";

        env::remove_var(key);
        assert_eq!(load_env_parsed(key, 3000u16), 3000);

        env::set_var(key, "8080");
        assert_eq!(load_env_parsed(key, 3000u16), 8080);

        env::set_var(key, "eighty");
        assert_eq!(load_env_parsed(key, 3000u16), 3000);

        env::remove_var(key);
    }

    #[test]
    #[serial]
    fn test_env_loader_prefix() {
        let loader = EnvLoader::new("ISSUETRACKER_TEST");
        let key = "ISSUETRACKER_TEST_PORT";

        env::remove_var(key);
        assert_eq!(loader.load_optional::<u16>("PORT"), None);
        assert_eq!(loader.load_parsed::<u16>("PORT", 1), 1);

        env::set_var(key, "4242");
        assert_eq!(loader.load_optional::<u16>("PORT"), Some(4242));
        assert_eq!(loader.load_parsed::<u16>("PORT", 1), 4242);

        env::remove_var(key);
    }
}
