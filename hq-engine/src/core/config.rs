/// Engine configuration
///
/// # Environment variables
///
/// Every field can be overridden from the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | LOG_LEVEL | info | tracing filter when RUST_LOG is unset |
/// | LOG_DIR | (unset) | directory for daily rolling log files |
/// | ENVIRONMENT | development | runtime environment |
/// | EVENT_CHANNEL_CAPACITY | 256 | coordinator event queue size |
/// | SHIPPING_LOCAL_CITY | casablanca | city billed at the local rate |
/// | SHIPPING_LOCAL_RATE | 20 | shipping cost per local order |
/// | SHIPPING_DEFAULT_RATE | 30 | shipping cost per other order |
/// | CURRENCY | MAD | display currency |
///
/// # Example
///
/// ```ignore
/// SHIPPING_LOCAL_CITY=rabat LOG_LEVEL=debug cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// tracing filter directive
    pub log_level: String,
    /// Log file directory; console only when unset
    pub log_dir: Option<String>,
    /// development | staging | production
    pub environment: String,
    /// Capacity of the store-event queue feeding the coordinator
    pub event_channel_capacity: usize,
    /// City whose orders ship at the local rate (compared trimmed, case-insensitive)
    pub shipping_local_city: String,
    pub shipping_local_rate: f64,
    pub shipping_default_rate: f64,
    /// Display currency code; amounts are single-currency
    pub currency: String,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            event_channel_capacity: env_or("EVENT_CHANNEL_CAPACITY", 256_usize).max(1),
            shipping_local_city: std::env::var("SHIPPING_LOCAL_CITY")
                .unwrap_or_else(|_| "casablanca".into()),
            shipping_local_rate: env_or("SHIPPING_LOCAL_RATE", 20.0),
            shipping_default_rate: env_or("SHIPPING_DEFAULT_RATE", 30.0),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "MAD".into()),
        }
    }

    /// Override the shipping rule
    ///
    /// Mostly used by tests.
    pub fn with_overrides(
        local_city: impl Into<String>,
        local_rate: f64,
        default_rate: f64,
    ) -> Self {
        let mut config = Self::from_env();
        config.shipping_local_city = local_city.into();
        config.shipping_local_rate = local_rate;
        config.shipping_default_rate = default_rate;
        config
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<String>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
