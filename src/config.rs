use std::env;

pub const DEFAULT_ADMIN_PREFIX: &str = "/admin";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for the RadosGW admin client.
/// Values are sourced from environment variables with sensible defaults.
#[derive(Clone)]
pub struct Config {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub admin_prefix: String,
    pub region: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

// Keeps the secret key out of logs and panic messages.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("admin_prefix", &self.admin_prefix)
            .field("region", &self.region)
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

fn default_user_agent() -> String {
    format!("rgw-ratelimit/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            admin_prefix: DEFAULT_ADMIN_PREFIX.to_string(),
            region: DEFAULT_REGION.to_string(),
            user_agent: default_user_agent(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - RGW_ENDPOINT [required]
    /// - RGW_ACCESS_KEY [required]
    /// - RGW_SECRET_KEY [required]
    /// - RGW_ADMIN_PREFIX (default: /admin)
    /// - RGW_REGION (default: us-east-1)
    /// - RGW_HTTP_TIMEOUT_SECS (default: 30)
    /// - RGW_USER_AGENT (default: rgw-ratelimit/<version>)
    pub fn from_env() -> Result<Self, String> {
        let endpoint = env::var("RGW_ENDPOINT").map_err(|_| "Missing RGW_ENDPOINT".to_string())?;
        let access_key =
            env::var("RGW_ACCESS_KEY").map_err(|_| "Missing RGW_ACCESS_KEY".to_string())?;
        let secret_key =
            env::var("RGW_SECRET_KEY").map_err(|_| "Missing RGW_SECRET_KEY".to_string())?;

        let mut cfg = Self::new(endpoint, access_key, secret_key);
        if let Ok(prefix) = env::var("RGW_ADMIN_PREFIX") {
            cfg.admin_prefix = prefix;
        }
        if let Ok(region) = env::var("RGW_REGION") {
            cfg.region = region;
        }
        if let Some(secs) = env::var("RGW_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.timeout_secs = secs;
        }
        if let Ok(ua) = env::var("RGW_USER_AGENT") {
            cfg.user_agent = ua;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let cfg = Config::new("http://rgw:8080", "ak", "sk");
        assert_eq!(cfg.admin_prefix, "/admin");
        assert_eq!(cfg.region, "us-east-1");
        assert_eq!(cfg.timeout_secs, 30);
        assert!(cfg.user_agent.starts_with("rgw-ratelimit/"));
    }

    #[test]
    fn debug_hides_secret() {
        let cfg = Config::new("http://rgw:8080", "ak", "super-secret");
        let s = format!("{:?}", cfg);
        assert!(s.contains("ak"));
        assert!(!s.contains("super-secret"));
    }
}
