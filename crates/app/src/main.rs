use engine::Bootstrap;
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "checkin={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let server = settings.server;
    let db = parse_database(&server.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;

    bootstrap_admin(&engine, settings.bootstrap).await?;

    let ttl = time::Duration::hours(i64::from(server.session_ttl_hours));
    let mut state = server::ServerState::new(engine, server.secret_key.as_bytes(), ttl)?;
    state.secure_cookie = server.secure_cookie;
    if !state.secure_cookie {
        tracing::warn!("session cookie is not marked Secure");
    }

    let addr = format!("{}:{}", server.bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(state, listener).await?;

    Ok(())
}

async fn bootstrap_admin(
    engine: &engine::Engine,
    bootstrap: settings::Bootstrap,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let generated = bootstrap.admin_password.is_none();
    let password = bootstrap
        .admin_password
        .unwrap_or_else(engine::generate_password);

    match engine
        .ensure_bootstrap_admin(&bootstrap.admin_username, &password)
        .await?
    {
        Bootstrap::Skipped => {}
        Bootstrap::Created(user) if generated => {
            tracing::warn!(
                "created admin {:?} with generated password {password:?}; change it at first login",
                user.username
            );
        }
        Bootstrap::Created(user) => {
            tracing::warn!(
                "created admin {:?} from configured credentials; change the password at first login",
                user.username
            );
        }
    }
    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
