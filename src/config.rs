// src/config.rs

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use dotenvy::dotenv;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. `None` runs the in-process store.
    pub database_url: Option<String>,
    pub rust_log: String,
    pub bind_addr: SocketAddr,

    /// Directory the local object store writes uploads into.
    pub upload_dir: PathBuf,
    /// Base URL uploads are served from; must end with '/'.
    pub public_url: Url,
    /// Per-file upload limit in bytes.
    pub max_upload_bytes: usize,

    pub sweep_interval_secs: u64,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));

        let public_url = env::var("PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:3000/uploads/".to_string());
        let public_url = Url::parse(&with_trailing_slash(public_url))
            .expect("PUBLIC_URL must be a valid absolute URL");

        let max_upload_mb = env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|mb| *mb > 0)
            .unwrap_or(10);

        let sweep_interval_secs = env::var("SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|s| s != "false" && s != "0")
            .unwrap_or(true);

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            database_url,
            rust_log,
            bind_addr,
            upload_dir,
            public_url,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            sweep_interval_secs,
            cookie_secure,
            cors_origins,
        }
    }
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
