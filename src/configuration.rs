use serde;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub app_port: u16,
    pub app_host: String,
    pub auth: AuthSettings,
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database_name: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AuthSettings {
    pub secret: String,
    pub issuer: String,
}

/// Scheduler tuning handed to the agent binary as its defaults.
/// Configuration, not hard-coded policy.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SyncSettings {
    pub activity_debounce_secs: u64,
    pub periodic_interval_secs: u64,
    pub min_push_interval_secs: u64,
}

impl DatabaseSettings {
    // Connection string: postgresql://<username>:<password>@<host>:<port>/<database_name>
    pub fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name,
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port,
        )
    }
}

impl AuthSettings {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let secret = std::env::var("CHATVAULT_AUTH_SECRET")
            .map_err(|_| config::ConfigError::NotFound("CHATVAULT_AUTH_SECRET".to_string()))?;
        let issuer =
            std::env::var("CHATVAULT_AUTH_ISSUER").unwrap_or_else(|_| "chatvault".to_string());

        Ok(AuthSettings { secret, issuer })
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize our configuration reader
    let mut settings = config::Config::default();

    // Add configuration values from a file named `configuration`
    // with the .yaml extension
    settings.merge(config::File::with_name("configuration"))?; // .json, .toml, .yaml, .yml

    let mut config: Settings = settings.try_deserialize()?;

    // The signing secret is environment-only so it never lands in a config file
    if let Ok(auth) = AuthSettings::from_env() {
        config.auth = auth;
    }

    Ok(config)
}
