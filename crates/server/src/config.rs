//! Runtime configuration read from the environment (`.env` is loaded first)

use axum::http::HeaderValue;
use quiz_core::api::google::DEFAULT_TOKENINFO_URL;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Origins allowed to call the API from a browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    /// Parse a comma-separated origin list. `*` (or nothing) allows any origin.
    /// Trailing slashes are dropped since browsers never send them in `Origin`.
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(|o| o.trim().trim_end_matches('/'))
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            Self::Any
        } else {
            Self::List(origins)
        }
    }

    pub fn layer(&self) -> CorsLayer {
        match self {
            Self::Any => CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
            Self::List(origins) => {
                let values: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|o| match HeaderValue::from_str(o) {
                        Ok(v) => Some(v),
                        Err(_) => {
                            warn!(origin = %o, "Ignoring unparseable CORS origin");
                            None
                        }
                    })
                    .collect();

                // Credentials forbid wildcards, so methods and headers mirror the request
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(values))
                    .allow_methods(AllowMethods::mirror_request())
                    .allow_headers(AllowHeaders::mirror_request())
                    .allow_credentials(true)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite file, used when `database_url` is unset
    pub db_path: String,
    /// Full `sqlite:` connection string
    pub database_url: Option<String>,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub cors_origins: CorsOrigins,
    /// OAuth client id the Google token audience must match
    pub google_client_id: Option<String>,
    pub tokeninfo_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var("QUIZ_DB_PATH").unwrap_or_else(|_| "data/quiz.db".to_string()),
            database_url: non_empty_var("DATABASE_URL"),
            mongodb_uri: non_empty_var("MONGODB_URI"),
            mongodb_database: std::env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "quizapp".to_string()),
            cors_origins: CorsOrigins::parse(&std::env::var("CORS_ORIGINS").unwrap_or_default()),
            google_client_id: non_empty_var("GOOGLE_CLIENT_ID"),
            tokeninfo_url: std::env::var("GOOGLE_TOKENINFO_URL")
                .unwrap_or_else(|_| DEFAULT_TOKENINFO_URL.to_string()),
        }
    }

    /// Human-readable SQLite location for logs
    pub fn sqlite_location(&self) -> &str {
        self.database_url.as_deref().unwrap_or(&self.db_path)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wildcard_and_empty() {
        assert_eq!(CorsOrigins::parse("*"), CorsOrigins::Any);
        assert_eq!(CorsOrigins::parse(""), CorsOrigins::Any);
        assert_eq!(CorsOrigins::parse(" , "), CorsOrigins::Any);
        assert_eq!(CorsOrigins::parse("https://a.app,*"), CorsOrigins::Any);
    }

    #[test]
    fn test_parse_strips_trailing_slash() {
        assert_eq!(
            CorsOrigins::parse("https://quiz.example.app/, http://localhost:5173"),
            CorsOrigins::List(vec![
                "https://quiz.example.app".to_string(),
                "http://localhost:5173".to_string(),
            ])
        );
    }
}
