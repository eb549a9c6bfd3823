use std::collections::HashMap;

/// Which side of a lane a device token authenticates as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Kiosk,
    Register,
}

/// A provisioned device: one physical kiosk or register, bound to a lane.
#[derive(Debug, Clone)]
pub struct DeviceEntry {
    pub kind: DeviceKind,
    pub lane: String,
    pub disabled: bool,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long an upgrade-hold offer stays live before the scheduler
    /// expires it, in seconds (default: `900`). Global, not per-tier.
    pub offer_window_secs: i64,
    /// Upgrade-hold scheduler tick interval in seconds (default: `5`).
    pub hold_tick_secs: u64,
    /// Waitlist expiry sweep interval in seconds (default: `60`).
    pub waitlist_sweep_secs: u64,
    /// Length of a check-in block in hours (default: `12`).
    pub block_hours: i64,
    /// Device token registry: token -> (kind, lane), parsed from
    /// `KIOSK_TOKENS` / `REGISTER_TOKENS` (`token@lane` pairs, comma
    /// separated). Tokens listed in `DISABLED_TOKENS` stay registered
    /// but are rejected.
    pub devices: HashMap<String, DeviceEntry>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                          |
    /// |------------------------|----------------------------------|
    /// | `HOST`                 | `0.0.0.0`                        |
    /// | `PORT`                 | `3000`                           |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`          |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                             |
    /// | `OFFER_WINDOW_SECS`    | `900`                            |
    /// | `HOLD_TICK_SECS`       | `5`                              |
    /// | `WAITLIST_SWEEP_SECS`  | `60`                             |
    /// | `BLOCK_HOURS`          | `12`                             |
    /// | `KIOSK_TOKENS`         | `dev-kiosk@lane-1`               |
    /// | `REGISTER_TOKENS`      | `dev-register@lane-1`            |
    /// | `DISABLED_TOKENS`      | (empty)                          |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = env_u64("REQUEST_TIMEOUT_SECS", 30);
        let offer_window_secs = env_u64("OFFER_WINDOW_SECS", 900) as i64;
        let hold_tick_secs = env_u64("HOLD_TICK_SECS", 5);
        let waitlist_sweep_secs = env_u64("WAITLIST_SWEEP_SECS", 60);
        let block_hours = env_u64("BLOCK_HOURS", 12) as i64;

        let mut devices = HashMap::new();
        parse_tokens(
            &std::env::var("KIOSK_TOKENS").unwrap_or_else(|_| "dev-kiosk@lane-1".into()),
            DeviceKind::Kiosk,
            &mut devices,
        );
        parse_tokens(
            &std::env::var("REGISTER_TOKENS").unwrap_or_else(|_| "dev-register@lane-1".into()),
            DeviceKind::Register,
            &mut devices,
        );
        for token in std::env::var("DISABLED_TOKENS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            if let Some(entry) = devices.get_mut(token) {
                entry.disabled = true;
            }
        }

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            offer_window_secs,
            hold_tick_secs,
            waitlist_sweep_secs,
            block_hours,
            devices,
        }
    }
}

fn env_u64(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{var} must be a valid u64"))
}

/// Parse `token@lane` pairs into the device registry.
fn parse_tokens(raw: &str, kind: DeviceKind, devices: &mut HashMap<String, DeviceEntry>) {
    for pair in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (token, lane) = match pair.split_once('@') {
            Some((t, l)) => (t.trim(), l.trim()),
            None => panic!("device token '{pair}' must be of the form token@lane"),
        };
        devices.insert(
            token.to_string(),
            DeviceEntry {
                kind,
                lane: lane.to_string(),
                disabled: false,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tokens_splits_token_and_lane() {
        let mut devices = HashMap::new();
        parse_tokens("abc@lane-1, def@lane-2", DeviceKind::Kiosk, &mut devices);

        assert_eq!(devices.len(), 2);
        assert_eq!(devices["abc"].lane, "lane-1");
        assert_eq!(devices["def"].lane, "lane-2");
        assert!(!devices["abc"].disabled);
    }
}
