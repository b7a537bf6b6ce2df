use std::net::SocketAddr;

const DEFAULT_DATABASE_URL: &str = "sqlite:data/visitors.db";
const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
    3000,
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Read configuration from the process environment. Call `dotenvy::dotenv()`
    /// first if a `.env` file should be honoured.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("DATABASE_URL").ok(),
            std::env::var("BIND_ADDR").ok(),
        )
    }

    fn from_vars(database_url: Option<String>, bind_addr: Option<String>) -> Self {
        let database_url = database_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = match bind_addr {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Invalid BIND_ADDR {raw:?} ({e}), using {DEFAULT_BIND_ADDR}");
                DEFAULT_BIND_ADDR
            }),
            None => DEFAULT_BIND_ADDR,
        };

        Self {
            database_url,
            bind_addr,
        }
    }
}
