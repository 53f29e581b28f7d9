//! Configuration for LingoBee
//!
//! CLI arguments and environment variable handling using clap. Values in a
//! `.env` file are loaded by `main` before parsing.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::auth::jwt::MIN_SECRET_LEN;

/// LingoBee - language-learning API for students
#[derive(Parser, Debug, Clone)]
#[command(name = "lingobee")]
#[command(about = "Language-learning API: practice path, assignments, dashboard and to-dos")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// Enable development mode (dev JWT secret, in-memory store fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "lingobee")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "604800")]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Directory uploaded assignment files are written to
    #[arg(long, env = "UPLOAD_DIR", default_value = "./uploads")]
    pub upload_dir: PathBuf,

    /// Public base URL used to build links to uploaded files
    /// (e.g., "https://api.lingobee.app")
    #[arg(long, env = "PUBLIC_URL", default_value = "http://localhost:5000")]
    pub public_url: String,

    /// Comma-separated CORS origin allowlist; empty allows any origin
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Catalog JSON (sections, nodes, questions, news, materials, assignments)
    /// imported at startup
    #[arg(long, env = "SEED_FILE")]
    pub seed_file: Option<PathBuf>,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            match self.jwt_secret.as_deref() {
                None | Some("") => {
                    return Err("JWT_SECRET is required in production mode".to_string());
                }
                Some(secret) if secret.len() < MIN_SECRET_LEN => {
                    return Err(format!(
                        "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
                    ));
                }
                Some(_) => {}
            }
        }

        if self.jwt_expiry_seconds == 0 {
            return Err("JWT_EXPIRY_SECONDS must be greater than zero".to_string());
        }

        if !self.public_url.starts_with("http://") && !self.public_url.starts_with("https://") {
            return Err("PUBLIC_URL must start with http:// or https://".to_string());
        }

        Ok(())
    }

    /// Allowed origins with blanks removed
    pub fn cors_origins(&self) -> Vec<String> {
        self.allowed_origins
            .iter()
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("lingobee").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--dev-mode"]);
        assert_eq!(args.listen.port(), 5000);
        assert_eq!(args.mongodb_db, "lingobee");
        assert_eq!(args.jwt_expiry_seconds, 7 * 24 * 60 * 60);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_production_requires_secret() {
        let args = parse(&[]);
        assert_eq!(
            args.validate().unwrap_err(),
            "JWT_SECRET is required in production mode"
        );

        let args = parse(&["--jwt-secret", "short"]);
        assert!(args.validate().unwrap_err().contains("at least 32"));

        let args = parse(&["--jwt-secret", "0123456789abcdef0123456789abcdef"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_cors_origins_split_and_trimmed() {
        let args = parse(&[
            "--dev-mode",
            "--allowed-origins",
            "http://localhost:5173/, https://lingobee.app,",
        ]);
        assert_eq!(
            args.cors_origins(),
            vec!["http://localhost:5173", "https://lingobee.app"]
        );
    }

    #[test]
    fn test_public_url_scheme() {
        let args = parse(&["--dev-mode", "--public-url", "ftp://files"]);
        assert!(args.validate().is_err());
    }
}
