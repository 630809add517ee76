//! Configuration management for the car listings service.
//!
//! Every setting can come from a command-line flag or an environment
//! variable; flags win.
//!
//! # Example
//!
//! ```ignore
//! use car_listings::config::{Cli, Command};
//! use clap::Parser;
//!
//! match Cli::parse().command {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Token(config) => println!("Minting a token for {}", config.user_id),
//!     Command::Check(config) => println!("Checking {}", config.mongo_url),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 5000)
//! - `MONGO_URL` - MongoDB connection string (required)
//! - `MONGO_DATABASE` - Database used when the URL names none (default: test)
//! - `JWT_SECRET` - HS256 secret for bearer tokens (required)
//! - `C_NAME` - Cloudinary cloud name (required)
//! - `C_KEY` - Cloudinary API key (required)
//! - `C_SECRETKEY` - Cloudinary API secret (required)
//! - `CLOUDINARY_FOLDER` - Upload folder (default: car_images)
//! - `CLOUDINARY_API_BASE` - Upload API host (default: https://api.cloudinary.com)
//! - `CORS_ORIGINS` - Allowed origins, comma-separated (default: any)
//! - `MAX_BODY_BYTES` - Request body cap (default: 50 MiB)

use clap::{Args, Parser, Subcommand};

use crate::server::DEFAULT_MAX_BODY_BYTES;
use crate::upload::{CloudinaryConfig, DEFAULT_CLOUDINARY_API_BASE, DEFAULT_UPLOAD_FOLDER};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Database used when the connection string does not name one.
pub const DEFAULT_MONGO_DATABASE: &str = "test";

/// Default lifetime of tokens minted by the `token` command (1 day).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 86400;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Car listings - a CRUD backend for car listings with hosted photos.
#[derive(Parser, Debug, Clone)]
#[command(name = "car-listings")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeConfig),

    /// Mint a bearer token for a user id.
    Token(TokenConfig),

    /// Check connectivity to MongoDB.
    Check(CheckConfig),
}

/// Settings for `serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    /// Largest accepted request body in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES, env = "MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// MongoDB connection string.
    #[arg(long, env = "MONGO_URL")]
    pub mongo_url: String,

    /// Database to use when the connection string names none.
    #[arg(long, default_value = DEFAULT_MONGO_DATABASE, env = "MONGO_DATABASE")]
    pub mongo_database: String,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// HS256 secret used to verify bearer tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    // =========================================================================
    // Image Host Configuration
    // =========================================================================
    /// Cloudinary cloud name.
    #[arg(long, env = "C_NAME")]
    pub cloud_name: String,

    /// Cloudinary API key.
    #[arg(long, env = "C_KEY")]
    pub cloud_api_key: String,

    /// Cloudinary API secret.
    #[arg(long, env = "C_SECRETKEY", hide_env_values = true)]
    pub cloud_api_secret: String,

    /// Folder uploaded images are placed in.
    #[arg(long, default_value = DEFAULT_UPLOAD_FOLDER, env = "CLOUDINARY_FOLDER")]
    pub cloud_folder: String,

    /// Base URL of the upload API.
    #[arg(long, default_value = DEFAULT_CLOUDINARY_API_BASE, env = "CLOUDINARY_API_BASE")]
    pub cloud_api_base: String,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.mongo_url.trim().is_empty() {
            return Err("MongoDB URL is required. Set --mongo-url or MONGO_URL".to_string());
        }

        if self.jwt_secret.is_empty() {
            return Err("JWT secret is required. Set --jwt-secret or JWT_SECRET".to_string());
        }

        let cloudinary = [
            (&self.cloud_name, "C_NAME"),
            (&self.cloud_api_key, "C_KEY"),
            (&self.cloud_api_secret, "C_SECRETKEY"),
        ];
        for (value, env) in cloudinary {
            if value.trim().is_empty() {
                return Err(format!("Cloudinary credentials are incomplete: {} is empty", env));
            }
        }

        match url::Url::parse(&self.cloud_api_base) {
            Ok(base) if matches!(base.scheme(), "http" | "https") => {}
            Ok(base) => {
                return Err(format!(
                    "CLOUDINARY_API_BASE must be an http(s) URL, got scheme '{}'",
                    base.scheme()
                ))
            }
            Err(e) => return Err(format!("CLOUDINARY_API_BASE is not a valid URL: {}", e)),
        }

        if self.max_body_bytes == 0 {
            return Err("max_body_bytes must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upload client settings.
    pub fn cloudinary(&self) -> CloudinaryConfig {
        CloudinaryConfig::new(
            self.cloud_name.as_str(),
            self.cloud_api_key.as_str(),
            self.cloud_api_secret.as_str(),
        )
        .with_folder(self.cloud_folder.as_str())
        .with_api_base(self.cloud_api_base.as_str())
    }
}

/// Settings for `token`.
#[derive(Args, Debug, Clone)]
pub struct TokenConfig {
    /// User id placed in the token's `id` claim.
    pub user_id: String,

    /// HS256 secret; must match the server's.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Token lifetime in seconds. 0 mints a token without `exp`.
    #[arg(long, default_value_t = DEFAULT_TOKEN_TTL_SECS)]
    pub ttl: u64,
}

impl TokenConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("user id must not be empty".to_string());
        }
        if self.jwt_secret.is_empty() {
            return Err("JWT secret is required. Set --jwt-secret or JWT_SECRET".to_string());
        }
        Ok(())
    }
}

/// Settings for `check`.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// MongoDB connection string.
    #[arg(long, env = "MONGO_URL")]
    pub mongo_url: String,

    /// Database to use when the connection string names none.
    #[arg(long, default_value = DEFAULT_MONGO_DATABASE, env = "MONGO_DATABASE")]
    pub mongo_database: String,

    /// Also count the stored listings.
    #[arg(long, default_value_t = false)]
    pub count_listings: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
