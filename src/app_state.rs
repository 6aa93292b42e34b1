use crate::configuration::Settings;
use crate::db::Database;
use crate::session::SessionStore;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub sessions: Arc<SessionStore>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn init(db: Database, settings: &Settings) -> Self {
        Self {
            db: Arc::new(db),
            sessions: Arc::new(SessionStore::new(settings.session.lifetime_minutes)),
            settings: Arc::new(settings.clone()),
        }
    }
}
