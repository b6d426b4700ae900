mod config;
mod game_locks;
mod repos;
mod services;
mod system;
mod wake;

pub use config::{ChatWebhookSettings, Config};
pub use game_locks::GameLocks;
pub use repos::{IGameRepo, IParticipantRepo, IScheduleRecordRepo, Repos};
pub use services::*;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
pub use system::ISys;
use system::RealSys;
use tracing::{info, warn};
pub use wake::{IWakeChannel, InMemoryWakeChannel, WakeReason, SCHEDULE_RECORDS_CHANNEL};
use wake::PostgresWakeChannel;

#[derive(Clone)]
pub struct NotifyContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub wake: Arc<dyn IWakeChannel>,
    pub event_bus: Arc<dyn IEventBus>,
    pub messaging: Arc<dyn IMessagingClient>,
    pub game_locks: Arc<GameLocks>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

fn create_messaging_client(config: &Config) -> Arc<dyn IMessagingClient> {
    match &config.chat_webhook {
        Some(settings) => Arc::new(WebhookMessagingClient::new(settings.clone())),
        None => Arc::new(InMemoryMessagingClient::new()),
    }
}

impl NotifyContext {
    async fn create(params: ContextParams) -> anyhow::Result<Self> {
        let pool = connect(&params.postgres_connection_string).await?;
        let config = Config::new();
        let sys: Arc<dyn ISys> = Arc::new(RealSys {});

        Ok(Self {
            repos: Repos::create_postgres(pool.clone()),
            wake: Arc::new(PostgresWakeChannel::new(pool.clone())),
            event_bus: Arc::new(PostgresEventBus::new(
                pool,
                sys.clone(),
                config.event_bus_lease_millis,
            )),
            messaging: create_messaging_client(&config),
            game_locks: Arc::new(GameLocks::new()),
            config,
            sys,
        })
    }

    /// Context where every collaborator lives in process memory
    pub fn create_inmemory() -> Self {
        let config = Config::new();
        let sys: Arc<dyn ISys> = Arc::new(RealSys {});

        Self {
            repos: Repos::create_inmemory(),
            wake: Arc::new(InMemoryWakeChannel::new()),
            event_bus: Arc::new(InMemoryEventBus::new(sys.clone())),
            messaging: create_messaging_client(&config),
            game_locks: Arc::new(GameLocks::new()),
            config,
            sys,
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> anyhow::Result<NotifyContext> {
    match get_psql_connection_string() {
        Some(postgres_connection_string) => {
            NotifyContext::create(ContextParams {
                postgres_connection_string,
            })
            .await
        }
        None => {
            warn!("DATABASE_URL is not set, running with an in-memory schedule store.");
            Ok(NotifyContext::create_inmemory())
        }
    }
}

fn get_psql_connection_string() -> Option<String> {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING).ok()
}

async fn connect(connection_string: &str) -> Result<PgPool, sqlx::Error> {
    info!("DB CHECKING CONNECTION ...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(connection_string)
        .await?;
    info!("DB CHECKING CONNECTION ... [done]");
    Ok(pool)
}

pub async fn run_migration() -> Result<(), MigrateError> {
    let connection_string = match get_psql_connection_string() {
        Some(connection_string) => connection_string,
        None => return Ok(()),
    };
    let pool = connect(&connection_string).await?;

    sqlx::migrate!().run(&pool).await
}

/// Pool against `DATABASE_URL` with migrations applied. `None` when the
/// variable is not set, in which case Postgres backed tests are skipped.
#[cfg(test)]
pub(crate) async fn test_pool() -> Option<PgPool> {
    let connection_string = get_psql_connection_string()?;
    let pool = connect(&connection_string)
        .await
        .expect("DATABASE_URL to point at a reachable database");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Migrations to apply");
    Some(pool)
}
