//! Endpoint configuration values.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use url::Url;

/// Hosts served by a local development automation server.
static LOCAL_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(localhost|[a-z0-9.-]+\.localhost|127(\.\d{1,3}){3}|0\.0\.0\.0|\[::1\])$")
        .expect("local host pattern is valid")
});

/// Deployment environment an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentTag {
    /// Production automation backend.
    Production,
    /// Shared development/staging backend.
    Development,
    /// Automation server on the developer's machine.
    Local,
}

impl EnvironmentTag {
    /// Sort key under the given build profile (lower runs first).
    #[must_use]
    pub const fn priority(self, profile: BuildProfile) -> u8 {
        match (profile, self) {
            (BuildProfile::Production, Self::Production)
            | (BuildProfile::Development, Self::Development) => 0,
            (BuildProfile::Production, Self::Development)
            | (BuildProfile::Development, Self::Local) => 1,
            (BuildProfile::Production, Self::Local)
            | (BuildProfile::Development, Self::Production) => 2,
        }
    }
}

impl fmt::Display for EnvironmentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Production => "production",
            Self::Development => "development",
            Self::Local => "local",
        };
        f.write_str(name)
    }
}

impl FromStr for EnvironmentTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" | "staging" => Ok(Self::Development),
            "local" => Ok(Self::Local),
            other => Err(format!(
                "unknown environment '{other}': expected production, development, or local"
            )),
        }
    }
}

/// How an endpoint expects to be polled for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollDialect {
    /// `GET {url}/poll/{conversationId}`
    PathParam,
    /// `GET {url}?conversationId={id}&action=poll`
    QueryParam,
}

impl PollDialect {
    /// Infers the dialect from the endpoint URL.
    ///
    /// Only used when configuration does not state a dialect explicitly.
    /// Local development servers use path parameters; hosted automation
    /// backends use query parameters.
    #[must_use]
    pub fn infer(url: &Url) -> Self {
        match url.host_str() {
            Some(host) if LOCAL_HOST.is_match(&host.to_lowercase()) => Self::PathParam,
            _ => Self::QueryParam,
        }
    }

    /// Builds the poll target for a conversation.
    #[must_use]
    pub fn poll_url(self, base: &Url, conversation_id: &str) -> Url {
        let mut target = base.clone();
        match self {
            Self::PathParam => {
                // cannot-be-a-base URLs are rejected at configuration time
                if let Ok(mut segments) = target.path_segments_mut() {
                    segments.pop_if_empty().extend(["poll", conversation_id]);
                }
            }
            Self::QueryParam => {
                target
                    .query_pairs_mut()
                    .append_pair("conversationId", conversation_id)
                    .append_pair("action", "poll");
            }
        }
        target
    }
}

impl FromStr for PollDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "path" | "path_param" | "path-param" => Ok(Self::PathParam),
            "query" | "query_param" | "query-param" => Ok(Self::QueryParam),
            other => Err(format!("unknown poll dialect '{other}': expected path or query")),
        }
    }
}

/// Which kind of build is running; decides endpoint priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildProfile {
    /// Production build: production endpoints first.
    Production,
    /// Any other build: development endpoints first.
    #[default]
    Development,
}

impl BuildProfile {
    /// Profile of the running binary (`debug_assertions` means development).
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }
}

impl FromStr for BuildProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" | "release" => Ok(Self::Production),
            "development" | "dev" | "debug" => Ok(Self::Development),
            other => Err(format!(
                "unknown build profile '{other}': expected production or development"
            )),
        }
    }
}

impl fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str("production"),
            Self::Development => f.write_str("development"),
        }
    }
}

/// One endpoint candidate.
///
/// Immutable once constructed: the builder methods consume `self`, and the
/// registry only hands out clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    url: Url,
    timeout: Duration,
    max_retries: u32,
    environment: EnvironmentTag,
    dialect: PollDialect,
}

impl EndpointConfig {
    /// Default per-attempt timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default failure threshold before an endpoint is skipped.
    pub const DEFAULT_MAX_RETRIES: u32 = 2;

    /// URL of the hardcoded local fallback endpoint.
    pub const LOCAL_DEFAULT_URL: &'static str = "http://localhost:5678/webhook";

    /// Creates an endpoint with default timeout and retry threshold.
    ///
    /// The poll dialect is inferred from the URL.
    #[must_use]
    pub fn new(url: Url, environment: EnvironmentTag) -> Self {
        let dialect = PollDialect::infer(&url);
        Self {
            url,
            timeout: Self::DEFAULT_TIMEOUT,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            environment,
            dialect,
        }
    }

    /// The endpoint used when nothing else is available.
    #[must_use]
    pub fn local_default() -> Self {
        let url = Url::parse(Self::LOCAL_DEFAULT_URL).expect("local default URL is valid");
        Self::new(url, EnvironmentTag::Local).with_dialect(PollDialect::PathParam)
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of recorded failures after which the endpoint is skipped.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Overrides the inferred poll dialect.
    #[must_use]
    pub const fn with_dialect(mut self, dialect: PollDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Endpoint URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Per-attempt timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Failure threshold.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Deployment environment.
    #[must_use]
    pub const fn environment(&self) -> EnvironmentTag {
        self.environment
    }

    /// Poll dialect.
    #[must_use]
    pub const fn dialect(&self) -> PollDialect {
        self.dialect
    }

    /// Poll target for a conversation on this endpoint.
    #[must_use]
    pub fn poll_url(&self, conversation_id: &str) -> Url {
        self.dialect.poll_url(&self.url, conversation_id)
    }
}

impl fmt::Display for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}ms, max_retries={})",
            self.url,
            self.environment,
            self.timeout.as_millis(),
            self.max_retries
        )
    }
}

/// Orders endpoints by environment priority for the given build profile.
///
/// The sort is stable: endpoints of the same environment keep their
/// configured order.
#[must_use]
pub fn order_by_priority(
    mut endpoints: Vec<EndpointConfig>,
    profile: BuildProfile,
) -> Vec<EndpointConfig> {
    endpoints.sort_by_key(|e| e.environment.priority(profile));
    endpoints
}
