use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;

/// Default Zoom OAuth token endpoint used for the account-credentials exchange.
pub const DEFAULT_ZOOM_OAUTH_TOKEN_URL: &str = "https://zoom.us/oauth/token";

/// Default Zoom REST API base URL.
pub const DEFAULT_ZOOM_API_BASE_URL: &str = "https://api.zoom.us/v2";

/// Default base for browser join links (`{base}/{meeting_id}`).
pub const DEFAULT_ZOOM_JOIN_BASE_URL: &str = "https://zoom.us/j";

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The Zoom account ID used for the account-credentials OAuth exchange.
    #[arg(long, env)]
    zoom_account_id: Option<String>,

    /// The Zoom Server-to-Server OAuth app client ID.
    #[arg(long, env)]
    zoom_client_id: Option<String>,

    /// The Zoom Server-to-Server OAuth app client secret.
    #[arg(long, env, hide_env_values = true)]
    zoom_client_secret: Option<String>,

    /// The Meeting SDK key embedded in join signatures as `appKey`.
    #[arg(long, env)]
    sdk_key: Option<String>,

    /// The Meeting SDK secret used to sign join signatures.
    #[arg(long, env, hide_env_values = true)]
    sdk_secret: Option<String>,

    /// The OAuth token endpoint.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_ZOOM_OAUTH_TOKEN_URL)]
    zoom_oauth_token_url: String,

    /// The base URL of the Zoom REST API.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_ZOOM_API_BASE_URL)]
    zoom_api_base_url: String,

    /// The base URL used to build browser join links.
    #[arg(long, env, default_value = DEFAULT_ZOOM_JOIN_BASE_URL)]
    zoom_join_base_url: String,

    /// Timeout in seconds for any single outbound HTTP request
    #[arg(long, env, default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Number of retries for transient HTTP failures (connection errors, 5xx, 429)
    #[arg(long, env, default_value_t = 1)]
    pub http_max_retries: u32,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Config {
    pub fn zoom_account_id(&self) -> Option<String> {
        self.zoom_account_id.clone()
    }

    pub fn zoom_client_id(&self) -> Option<String> {
        self.zoom_client_id.clone()
    }

    pub fn zoom_client_secret(&self) -> Option<String> {
        self.zoom_client_secret.clone()
    }

    pub fn sdk_key(&self) -> Option<String> {
        self.sdk_key.clone()
    }

    pub fn sdk_secret(&self) -> Option<String> {
        self.sdk_secret.clone()
    }

    /// Returns the OAuth token endpoint.
    pub fn zoom_oauth_token_url(&self) -> &str {
        &self.zoom_oauth_token_url
    }

    /// Returns the Zoom REST API base URL.
    pub fn zoom_api_base_url(&self) -> &str {
        &self.zoom_api_base_url
    }

    /// Returns the base URL for browser join links.
    pub fn zoom_join_base_url(&self) -> &str {
        &self.zoom_join_base_url
    }
}

/// Loads variables from a `.env` file into the process environment, if one exists.
///
/// Binaries that flatten [`Config`] into a larger command line call this before parsing.
pub fn load_dotenv() {
    dotenv().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["meeting_broker"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_explicit_flags_populate_credentials() {
        let config = parse(&[
            "--zoom-account-id",
            "acct",
            "--zoom-client-id",
            "client",
            "--zoom-client-secret",
            "shh",
            "--sdk-key",
            "key",
            "--sdk-secret",
            "secret",
        ]);

        assert_eq!(config.zoom_account_id(), Some("acct".to_string()));
        assert_eq!(config.zoom_client_id(), Some("client".to_string()));
        assert_eq!(config.zoom_client_secret(), Some("shh".to_string()));
        assert_eq!(config.sdk_key(), Some("key".to_string()));
        assert_eq!(config.sdk_secret(), Some("secret".to_string()));
    }

    #[test]
    fn test_log_level_filter_parses_uppercase_names() {
        let config = parse(&["--log-level-filter", "DEBUG"]);
        assert_eq!(config.log_level_filter, LevelFilter::Debug);
    }

    #[test]
    fn test_url_flags_override_defaults() {
        let config = parse(&[
            "--zoom-oauth-token-url",
            "http://127.0.0.1:1234/oauth/token",
            "--zoom-api-base-url",
            "http://127.0.0.1:1234/v2",
        ]);

        assert_eq!(
            config.zoom_oauth_token_url(),
            "http://127.0.0.1:1234/oauth/token"
        );
        assert_eq!(config.zoom_api_base_url(), "http://127.0.0.1:1234/v2");
        assert_eq!(config.zoom_join_base_url(), DEFAULT_ZOOM_JOIN_BASE_URL);
    }
}
