//! Exchange connection settings resolved from the environment.

use super::{ConfigurationError, DiscoveryFilter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Environment variable carrying the exchange address.
pub const EXCHANGE_ADDRESS_ENV: &str = "SWITCHBOARD_EXCHANGE_ADDRESS";

/// Environment variable selecting the exchange authentication method.
pub const EXCHANGE_AUTH_ENV: &str = "SWITCHBOARD_EXCHANGE_AUTH";

/// Environment variable overriding the discovery refresh interval, in seconds.
pub const REFRESH_INTERVAL_ENV: &str = "SWITCHBOARD_REFRESH_INTERVAL_SECS";

/// Interval between reconciliation cycles when none is configured.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Authentication method used when connecting to the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Globus Auth bearer tokens.
    Globus,
}

impl AuthMethod {
    /// Returns the canonical configuration value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Globus => "globus",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AuthMethod {
    type Error = ConfigurationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "globus" => Ok(Self::Globus),
            _ => Err(ConfigurationError::UnsupportedAuthMethod(value.to_owned())),
        }
    }
}

/// Settings for connecting to the exchange and polling its population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    address: String,
    auth_method: Option<AuthMethod>,
    refresh_interval: Duration,
    filter: DiscoveryFilter,
}

impl ExchangeConfig {
    /// Creates settings for the exchange at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidExchangeAddress`] when the address
    /// is not an `http://` or `https://` URL.
    pub fn new(address: impl Into<String>) -> Result<Self, ConfigurationError> {
        let normalized = address.into().trim().to_owned();
        let has_valid_prefix =
            normalized.starts_with("http://") || normalized.starts_with("https://");
        if !has_valid_prefix {
            return Err(ConfigurationError::InvalidExchangeAddress(normalized));
        }

        Ok(Self {
            address: normalized,
            auth_method: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            filter: DiscoveryFilter::default(),
        })
    }

    /// Resolves settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the address is missing or any
    /// value is invalid.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`, which maps variable names to
    /// values.
    ///
    /// Blank values are treated as unset. A non-blank authentication value
    /// must name a supported method (`globus`, in any case); any other value
    /// is rejected rather than falling back to a default method.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingExchangeAddress`] when no address
    /// is available, [`ConfigurationError::UnsupportedAuthMethod`] for an
    /// unrecognized authentication value, or validation errors for the other
    /// variables.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let address = read(EXCHANGE_ADDRESS_ENV).ok_or(
            ConfigurationError::MissingExchangeAddress {
                variable: EXCHANGE_ADDRESS_ENV,
            },
        )?;
        let mut config = Self::new(address)?;

        if let Some(auth) = read(EXCHANGE_AUTH_ENV) {
            config = config.with_auth_method(AuthMethod::try_from(auth.as_str())?);
        }

        if let Some(raw_interval) = read(REFRESH_INTERVAL_ENV) {
            config = config.with_refresh_interval(parse_interval(&raw_interval)?)?;
        }

        Ok(config)
    }

    /// Sets the authentication method.
    #[must_use]
    pub const fn with_auth_method(mut self, auth_method: AuthMethod) -> Self {
        self.auth_method = Some(auth_method);
        self
    }

    /// Sets the interval between reconciliation cycles.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidRefreshInterval`] for a zero
    /// interval.
    pub fn with_refresh_interval(
        mut self,
        refresh_interval: Duration,
    ) -> Result<Self, ConfigurationError> {
        if refresh_interval.is_zero() {
            return Err(ConfigurationError::InvalidRefreshInterval {
                value: format!("{refresh_interval:?}"),
                reason: "interval must be greater than zero".to_owned(),
            });
        }
        self.refresh_interval = refresh_interval;
        Ok(self)
    }

    /// Sets the filter selecting which agents are bridged.
    #[must_use]
    pub fn with_filter(mut self, filter: DiscoveryFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Returns the exchange address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the authentication method, if any.
    #[must_use]
    pub const fn auth_method(&self) -> Option<AuthMethod> {
        self.auth_method
    }

    /// Returns the interval between reconciliation cycles.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Returns the discovery filter.
    #[must_use]
    pub const fn filter(&self) -> &DiscoveryFilter {
        &self.filter
    }
}

fn parse_interval(raw: &str) -> Result<Duration, ConfigurationError> {
    raw.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|error| ConfigurationError::InvalidRefreshInterval {
            value: raw.to_owned(),
            reason: error.to_string(),
        })
}
