use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::optimizer::PackingConfig;
use crate::pool::{ContainerPool, JsonFilePool, PoolError, StaticPool};

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub engine: EngineConfig,
    pub pool: PoolConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            engine: EngineConfig::from_env(),
            pool: PoolConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "LOAD_PLANNER_API_HOST";
    const PORT_VAR: &'static str = "LOAD_PLANNER_API_PORT";

    fn from_env() -> Self {
        Self::from_values(env_string(Self::HOST_VAR), env_string(Self::PORT_VAR))
    }

    fn from_values(host: Option<String>, port: Option<String>) -> Self {
        let host_value = host.unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match port {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    warn!(
                        "{} must not be 0. Using {}.",
                        Self::PORT_VAR,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    warn!(
                        "Could not parse {} ('{}'): {}. Using {}.",
                        Self::PORT_VAR,
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// Tunable constants of the placement heuristics.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    packing: PackingConfig,
}

impl EngineConfig {
    const FLOOR_SPACE_RATIO_VAR: &'static str = "LOAD_PLANNER_FLOOR_SPACE_RATIO";
    const VOLUME_SCORE_WEIGHT_VAR: &'static str = "LOAD_PLANNER_VOLUME_SCORE_WEIGHT";
    const WEIGHT_SCORE_WEIGHT_VAR: &'static str = "LOAD_PLANNER_WEIGHT_SCORE_WEIGHT";
    const VOLUME_EPSILON_VAR: &'static str = "LOAD_PLANNER_VOLUME_EPSILON";
    const MAX_UNITS_VAR: &'static str = "LOAD_PLANNER_MAX_UNITS";

    fn from_env() -> Self {
        let floor_space_ratio = load_f64_with_warning(
            Self::FLOOR_SPACE_RATIO_VAR,
            PackingConfig::DEFAULT_FLOOR_SPACE_RATIO,
            |value| value > 0.0 && value <= 1.0,
            "must be greater than 0 and at most 1",
            "Adjusted floor space ceiling changes how much non-stackable cargo fits",
        );

        let volume_score_weight = load_f64_with_warning(
            Self::VOLUME_SCORE_WEIGHT_VAR,
            PackingConfig::DEFAULT_VOLUME_SCORE_WEIGHT,
            |value| (0.0..=1.0).contains(&value),
            "must be between 0 and 1",
            "Adjusted volume weighting changes container ranking",
        );

        let weight_score_weight = load_f64_with_warning(
            Self::WEIGHT_SCORE_WEIGHT_VAR,
            PackingConfig::DEFAULT_WEIGHT_SCORE_WEIGHT,
            |value| (0.0..=1.0).contains(&value),
            "must be between 0 and 1",
            "Adjusted payload weighting changes container ranking",
        );

        let volume_epsilon = load_f64_with_warning(
            Self::VOLUME_EPSILON_VAR,
            PackingConfig::DEFAULT_VOLUME_EPSILON,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted volume tolerance may accept slightly oversized loads",
        );

        let max_units = parse_usize_with_warning(
            Self::MAX_UNITS_VAR,
            env_string(Self::MAX_UNITS_VAR),
            PackingConfig::DEFAULT_MAX_UNITS,
        );

        let packing = PackingConfig::builder()
            .floor_space_ratio(floor_space_ratio)
            .volume_score_weight(volume_score_weight)
            .weight_score_weight(weight_score_weight)
            .volume_epsilon(volume_epsilon)
            .max_units(max_units)
            .build();

        Self { packing }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

/// Where the container fleet is read from.
#[derive(Clone, Debug, Default)]
pub struct PoolConfig {
    pool_file: Option<PathBuf>,
}

impl PoolConfig {
    const POOL_FILE_VAR: &'static str = "LOAD_PLANNER_POOL_FILE";

    fn from_env() -> Self {
        Self {
            pool_file: env_string(Self::POOL_FILE_VAR).map(PathBuf::from),
        }
    }

    /// Builds the configured provider: the JSON file if set, else the embedded fleet.
    pub fn build_pool(&self) -> Result<Arc<dyn ContainerPool>, PoolError> {
        match &self.pool_file {
            Some(path) => {
                info!("Using container pool file {}", path.display());
                Ok(Arc::new(JsonFilePool::new(path.clone())))
            }
            None => {
                let pool = StaticPool::embedded()?;
                if pool.is_empty() {
                    warn!("Embedded fleet contains no containers");
                }
                info!("Using embedded fleet with {} containers", pool.len());
                Ok(Arc::new(pool))
            }
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => non_blank(&value),
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    parse_f64_with_warning(
        var_name,
        env_string(var_name),
        default,
        validator,
        invalid_hint,
        warning,
    )
}

fn parse_f64_with_warning(
    var_name: &str,
    raw: Option<String>,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match raw {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) => {
                if !validator(value) {
                    warn!(
                        "{} contains invalid value '{}': {}. Using {}.",
                        var_name, raw, invalid_hint, default
                    );
                    default
                } else {
                    let tolerance = (default.abs().max(1.0)) * 1e-9;
                    if (value - default).abs() > tolerance {
                        info!("{} ({} = {}).", warning, var_name, value);
                    }
                    value
                }
            }
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}

fn parse_usize_with_warning(var_name: &str, raw: Option<String>, default: usize) -> usize {
    match raw {
        Some(raw) => match raw.parse::<usize>() {
            Ok(0) => {
                warn!("{} must not be 0. Using {}.", var_name, default);
                default
            }
            Ok(value) => {
                if value != default {
                    info!("Unit item limit changed ({} = {}).", var_name, value);
                }
                value
            }
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}') as count: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ratio(raw: Option<&str>) -> f64 {
        parse_f64_with_warning(
            "TEST_VAR",
            raw.map(str::to_string),
            0.85,
            |value| value > 0.0 && value <= 1.0,
            "must be greater than 0 and at most 1",
            "changed",
        )
    }

    #[test]
    fn test_parse_f64_accepts_valid_values() {
        assert_eq!(parse_ratio(Some("0.5")), 0.5);
        assert_eq!(parse_ratio(Some("1")), 1.0);
        assert_eq!(parse_ratio(Some("0.85")), 0.85);
    }

    #[test]
    fn test_parse_f64_falls_back_to_default() {
        assert_eq!(parse_ratio(None), 0.85);
        assert_eq!(parse_ratio(Some("abc")), 0.85);
        assert_eq!(parse_ratio(Some("0")), 0.85);
        assert_eq!(parse_ratio(Some("1.5")), 0.85);
        assert_eq!(parse_ratio(Some("NaN")), 0.85);
    }

    #[test]
    fn test_parse_usize_limit() {
        assert_eq!(parse_usize_with_warning("TEST_VAR", Some("500".into()), 100), 500);
        assert_eq!(parse_usize_with_warning("TEST_VAR", None, 100), 100);
        assert_eq!(parse_usize_with_warning("TEST_VAR", Some("0".into()), 100), 100);
        assert_eq!(parse_usize_with_warning("TEST_VAR", Some("-3".into()), 100), 100);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  value "), Some("value".to_string()));
        assert_eq!(non_blank(""), None);
        assert_eq!(non_blank("   "), None);
    }

    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::from_values(None, None);
        assert_eq!(config.port(), 8080);
        assert_eq!(config.display_host(), "0.0.0.0");
        assert!(config.binds_to_all_interfaces());
    }

    #[test]
    fn test_api_config_custom_values() {
        let config = ApiConfig::from_values(Some("127.0.0.1".into()), Some("9000".into()));
        assert_eq!(config.socket_addr(), "127.0.0.1:9000".parse().unwrap());
        assert!(!config.binds_to_all_interfaces());
    }

    #[test]
    fn test_api_config_rejects_invalid_values() {
        let config = ApiConfig::from_values(Some("not-an-ip".into()), Some("0".into()));
        assert_eq!(config.display_host(), "0.0.0.0");
        assert_eq!(config.port(), 8080);

        let config = ApiConfig::from_values(None, Some("70000".into()));
        assert_eq!(config.port(), 8080);
    }

    #[test]
    fn test_default_pool_config_uses_embedded_fleet() {
        let config = PoolConfig::default();
        assert!(config.pool_file.is_none());
        assert!(config.build_pool().is_ok());
    }
}
