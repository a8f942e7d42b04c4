use chatvault::configuration::{get_configuration, DatabaseSettings, Settings};
use chatvault::helpers::token;
use chrono::{Duration, Utc};
use sqlx::{Connection, Executor, PgConnection, PgPool};

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub settings: Settings,
}

impl TestApp {
    /// Mint a token the server will accept for the given owner.
    pub fn token_for(&self, owner_id: &str) -> String {
        self.signed_token(owner_id, self.settings.auth.issuer.clone(), Duration::minutes(30))
    }

    pub fn expired_token_for(&self, owner_id: &str) -> String {
        self.signed_token(owner_id, self.settings.auth.issuer.clone(), Duration::minutes(-5))
    }

    pub fn foreign_issuer_token_for(&self, owner_id: &str) -> String {
        self.signed_token(owner_id, "someone-else".to_string(), Duration::minutes(30))
    }

    pub fn subjectless_token(&self) -> String {
        self.signed_token("", self.settings.auth.issuer.clone(), Duration::minutes(30))
    }

    fn signed_token(&self, owner_id: &str, issuer: String, expires_in: Duration) -> String {
        let claims = token::Claims {
            sub: owner_id.to_string(),
            iss: issuer,
            exp: (Utc::now() + expires_in).timestamp(),
        };
        token::sign(&claims, &self.settings.auth.secret)
    }
}

pub async fn spawn_app() -> Option<TestApp> {
    let mut configuration = get_configuration().expect("Failed to get configuration");

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();

    let connection_pool = match configure_database(&configuration.database).await {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("Skipping tests: failed to connect to postgres: {}", err);
            return None;
        }
    };

    let server = chatvault::startup::run(listener, connection_pool.clone(), configuration.clone())
        .await
        .expect("Failed to bind address.");

    let _ = tokio::spawn(server);

    Some(TestApp {
        address,
        db_pool: connection_pool,
        settings: configuration,
    })
}

pub async fn configure_database(config: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let mut connection = PgConnection::connect(&config.connection_string_without_db()).await?;

    connection
        .execute(format!(r#"CREATE DATABASE "{}""#, config.database_name).as_str())
        .await?;

    let connection_pool = PgPool::connect(&config.connection_string()).await?;

    sqlx::migrate!("./migrations").run(&connection_pool).await?;

    Ok(connection_pool)
}
