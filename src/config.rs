use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// FCM server key; push delivery is disabled when unset.
    pub fcm_server_key: Option<String>,
    pub admin_email: Option<String>,
    pub admin_name: String,
    pub service_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://gatepass.db?mode=rwc".to_string());

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let fcm_server_key = env::var("FCM_SERVER_KEY").ok();

        let admin_email = env::var("ADMIN_EMAIL").ok();

        let admin_name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());

        let service_name = env::var("SERVICE_NAME").unwrap_or_else(|_| "gatepass".to_string());

        Ok(Config {
            database_url,
            server_host,
            server_port,
            fcm_server_key,
            admin_email,
            admin_name,
            service_name,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
}
