// --- File: crates/services/bodyshop_backend/src/app_state.rs ---
use bodyshop_chat::{chat_state, ChatState};
use bodyshop_common::error::BodyshopError;
use bodyshop_common::services::{BookingService, BookingStore, SlotAvailability};
use bodyshop_config::AppConfig;
use bodyshop_db::{BookingRecordRepository, DbClient, DbError, SqlBookingRecordRepository};
use bodyshop_gcal::{gcal_state_from_config, GcalState};
use std::sync::Arc;
use tracing::{info, warn};

const FALLBACK_DATABASE_URL: &str = "sqlite::memory:";

/// Application state shared by the top-level routes.
///
/// Feature states are `None` when disabled by the `use_*` flags.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Configured database; `None` when `use_database` is off.
    pub db: Option<DbClient>,
    pub gcal_state: Option<Arc<GcalState>>,
    pub chat_state: Option<Arc<ChatState>>,
}

fn db_setup_error(err: DbError) -> BodyshopError {
    BodyshopError::ConfigError(format!("Database setup failed: {}", err))
}

impl AppState {
    /// Connects the database, prepares the schema and wires calendar and chat states.
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, BodyshopError> {
        let db = if config.use_database {
            Some(DbClient::new(&config).await.map_err(db_setup_error)?)
        } else {
            None
        };

        let gcal_state = if config.use_gcal {
            let client = match &db {
                Some(client) => client.clone(),
                None => {
                    warn!("Database disabled, booking records are kept in memory only");
                    DbClient::from_url(FALLBACK_DATABASE_URL)
                        .await
                        .map_err(db_setup_error)?
                }
            };
            let repository = SqlBookingRecordRepository::new(client);
            repository.init_schema().await.map_err(db_setup_error)?;
            let store: Arc<dyn BookingStore> = Arc::new(repository);
            Some(gcal_state_from_config(&config, store)?)
        } else {
            info!("Google Calendar disabled, booking routes are not mounted");
            None
        };

        let chat_state = match (&gcal_state, config.use_chat) {
            (Some(gcal), true) => {
                let booking: Arc<dyn BookingService> = gcal.writer.clone();
                let availability: Arc<dyn SlotAvailability> = gcal.resolver.clone();
                Some(chat_state(&config, booking, Some(availability))?)
            }
            (None, true) => {
                warn!("Chat assistant needs Google Calendar to book, chat route is not mounted");
                None
            }
            (_, false) => None,
        };

        Ok(Self {
            config,
            db,
            gcal_state,
            chat_state,
        })
    }
}
