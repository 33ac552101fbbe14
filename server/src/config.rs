use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Lifetime of a join credential
    pub token_ttl: Duration,
    /// Commands queued per session before senders wait
    pub mailbox_capacity: usize,
    /// Frames queued per connection before new ones are dropped
    pub outbound_capacity: usize,
    /// Fixed seed for every session's launch RNG; random per session when unset
    pub rng_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3001".to_string(),
            token_ttl: Duration::from_secs(5 * 60),
            mailbox_capacity: 256,
            outbound_capacity: 64,
            rng_seed: None,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `LISTEN_PORT`, `TOKEN_TTL_SECS` and `RNG_SEED`.
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(port) = env_parse::<u16>("LISTEN_PORT") {
            config.listen_addr = format!("0.0.0.0:{}", port);
        }
        if let Some(secs) = env_parse::<u64>("TOKEN_TTL_SECS") {
            config.token_ttl = Duration::from_secs(secs);
        }
        if let Some(seed) = env_parse::<u64>("RNG_SEED") {
            config.rng_seed = Some(seed);
        }
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.token_ttl.is_zero() {
            return Err("token_ttl must be positive".to_string());
        }
        if self.token_ttl > Duration::from_secs(24 * 60 * 60) {
            return Err("token_ttl must be at most one day".to_string());
        }
        if self.mailbox_capacity == 0 {
            return Err("mailbox_capacity must be > 0".to_string());
        }
        if self.outbound_capacity == 0 {
            return Err("outbound_capacity must be > 0".to_string());
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_addr, "0.0.0.0:3001");
        assert_eq!(config.token_ttl, Duration::from_secs(300));
    }

    #[test]
    fn zero_capacities_are_rejected() {
        let config = ServerConfig {
            outbound_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = ServerConfig {
            mailbox_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn token_ttl_is_bounded() {
        let config = ServerConfig {
            token_ttl: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = ServerConfig {
            token_ttl: Duration::from_secs(2 * 24 * 60 * 60),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
