use chrono::{DateTime, Utc};

use super::{QueryOptions, Target};

/// Specifies how many lines to retrieve from the tail of the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tail {
    /// Return all log lines
    All,
    /// Return a specific number of lines from the end
    Number(u64),
}

/// Error type for parsing `Tail` from a string.
#[derive(Debug, thiserror::Error)]
pub enum TailParseError {
    /// The string is not a valid tail value (must be "all" or a positive number)
    #[error("Invalid tail value: '{0}'. Expected 'all' or a positive number")]
    InvalidValue(String),
}

impl From<u64> for Tail {
    fn from(n: u64) -> Self {
        Tail::Number(n)
    }
}

impl TryFrom<&str> for Tail {
    type Error = TailParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "all" => Ok(Tail::All),
            _ => s
                .parse::<u64>()
                .map(Tail::Number)
                .map_err(|_| TailParseError::InvalidValue(s.to_string())),
        }
    }
}

impl TryFrom<String> for Tail {
    type Error = TailParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.as_str().try_into()
    }
}

impl std::fmt::Display for Tail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tail::All => write!(f, "all"),
            Tail::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Options for retrieving logs from a container.
///
/// This struct provides configuration options for fetching container logs,
/// including filtering by stream type (stdout/stderr), limiting the number
/// of lines, following new output and adding timestamps.
///
/// # Examples
///
/// ```
/// use docker_modem::models::{LogsOptions, Tail};
///
/// let options = LogsOptions::builder()
///     .stdout(true)
///     .stderr(true)
///     .tail(Tail::Number(100))
///     .timestamps(true)
///     .build();
/// ```
#[derive(Debug, Clone, Default, PartialEq, typed_builder::TypedBuilder)]
#[builder(doc)]
pub struct LogsOptions {
    /// Keep the connection open and stream new output
    #[builder(default = false)]
    pub follow: bool,
    /// Return logs from stdout
    #[builder(default = false)]
    pub stdout: bool,
    /// Return logs from stderr
    #[builder(default = false)]
    pub stderr: bool,
    /// Return logs from the given timestamp
    #[builder(default, setter(strip_option))]
    pub since: Option<DateTime<Utc>>,
    /// Return logs before the given timestamp
    #[builder(default, setter(strip_option))]
    pub until: Option<DateTime<Utc>>,
    /// Add timestamps to every log line
    #[builder(default = false)]
    pub timestamps: bool,
    /// Return this number of lines at the tail of the logs
    #[builder(default, setter(strip_option, into))]
    pub tail: Option<Tail>,
}

impl From<LogsOptions> for QueryOptions {
    fn from(options: LogsOptions) -> Self {
        let mut query = QueryOptions::new()
            .set("follow", options.follow)
            .set("stdout", options.stdout)
            .set("stderr", options.stderr)
            .set("timestamps", options.timestamps);
        if let Some(since) = options.since {
            query.insert("since", since.timestamp());
        }
        if let Some(until) = options.until {
            query.insert("until", until.timestamp());
        }
        if let Some(tail) = options.tail {
            query.insert("tail", tail.to_string());
        }
        query
    }
}

impl From<LogsOptions> for Target {
    fn from(options: LogsOptions) -> Self {
        Target::options(options)
    }
}
