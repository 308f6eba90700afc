use {
    crate::{decoder::FieldMap, ui::ChartStyle},
    std::{env, path::PathBuf, time::Duration},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Stdin,
    File,
    Kafka,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub topic: String,
    pub group_id: String,
    pub source: SourceKind,
    pub input_path: Option<PathBuf>,
    pub input_from_start: bool,
    pub broker_address: String,
    pub fields: FieldMap,
    pub metric_a_label: String,
    pub metric_b_label: String,
    pub chart_style: ChartStyle,
    pub render_pause: Duration,
    pub max_categories: Option<usize>,
    pub log_file: Option<PathBuf>,
    pub rust_log: String,
    /// Values that were unparseable and replaced by defaults. Config is read
    /// before logging is up, so the binary logs these once the logger exists.
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Call `dotenv::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut warnings = Vec::new();

        let topic = var("WEATHER_TOPIC").unwrap_or_else(|| "unknown_topic".to_string());
        let group_id = var("WEATHER_CONSUMER_GROUP_ID").unwrap_or_else(|| "default_group".to_string());

        let source_str = var("WEATHER_SOURCE").unwrap_or_else(|| "stdin".to_string());
        let source = match source_str.to_lowercase().as_str() {
            "stdin" => SourceKind::Stdin,
            "file" => SourceKind::File,
            "kafka" => SourceKind::Kafka,
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "WEATHER_SOURCE must be stdin, file or kafka, got '{}'",
                    other
                )))
            }
        };

        let input_path = var("WEATHER_INPUT_PATH").map(PathBuf::from);
        if source == SourceKind::File && input_path.is_none() {
            return Err(ConfigError::MissingVariable("WEATHER_INPUT_PATH".to_string()));
        }

        let input_from_start = var("WEATHER_INPUT_FROM_START")
            .map(|v| {
                parse_or_default("WEATHER_INPUT_FROM_START", &v.to_lowercase(), false, &mut warnings)
            })
            .unwrap_or(false);

        let broker_address = var("KAFKA_BROKER_ADDRESS").unwrap_or_else(|| "localhost:9092".to_string());

        let defaults = FieldMap::default();
        let fields = FieldMap {
            category: var("WEATHER_CATEGORY_FIELD").unwrap_or(defaults.category),
            metric_a: var("WEATHER_METRIC_A_FIELD").unwrap_or(defaults.metric_a),
            metric_b: var("WEATHER_METRIC_B_FIELD").unwrap_or(defaults.metric_b),
        };
        let metric_a_label = var("WEATHER_METRIC_A_LABEL").unwrap_or_else(|| fields.metric_a.clone());
        let metric_b_label = var("WEATHER_METRIC_B_LABEL").unwrap_or_else(|| fields.metric_b.clone());

        let style_str = var("WEATHER_CHART_STYLE").unwrap_or_else(|| "grouped".to_string());
        let chart_style = style_str.parse::<ChartStyle>().map_err(|_| {
            ConfigError::InvalidValue(format!(
                "WEATHER_CHART_STYLE must be grouped or dual, got '{}'",
                style_str
            ))
        })?;

        let render_pause_ms = var("WEATHER_RENDER_PAUSE_MS")
            .map(|v| parse_or_default("WEATHER_RENDER_PAUSE_MS", &v, 10u64, &mut warnings))
            .unwrap_or(10);

        let max_categories = match var("WEATHER_MAX_CATEGORIES") {
            None => None,
            Some(v) => match v.parse::<usize>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::InvalidValue(format!(
                        "WEATHER_MAX_CATEGORIES must be a positive integer, got '{}'",
                        v
                    )))
                }
                Ok(limit) => Some(limit),
            },
        };

        let log_file = var("WEATHER_LOG_FILE").map(PathBuf::from);
        let rust_log = var("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            topic,
            group_id,
            source,
            input_path,
            input_from_start,
            broker_address,
            fields,
            metric_a_label,
            metric_b_label,
            chart_style,
            render_pause: Duration::from_millis(render_pause_ms),
            max_categories,
            log_file,
            rust_log,
            warnings,
        })
    }
}

fn parse_or_default<T>(key: &str, raw: &str, default: T, warnings: &mut Vec<String>) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    raw.parse::<T>().unwrap_or_else(|_| {
        warnings.push(format!("Invalid {} '{}', defaulting to {}", key, raw, default));
        default
    })
}
