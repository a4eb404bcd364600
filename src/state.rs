use crate::config::{Config, Credentials};
use crate::session::SessionStore;
use crate::store::{RosterStore, TableStore};
use chrono::{FixedOffset, NaiveDate, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct TablesState {
    pub store: Arc<TableStore>,
    pub sessions: SessionStore,
    pub operator: Arc<Credentials>,
    pub utc_offset: FixedOffset,
}

impl TablesState {
    pub fn new(store: TableStore, operator: Credentials, config: &Config) -> Self {
        Self {
            store: Arc::new(store),
            sessions: SessionStore::new(),
            operator: Arc::new(operator),
            utc_offset: config.utc_offset,
        }
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.utc_offset).date_naive()
    }
}

#[derive(Clone)]
pub struct RosterState {
    pub store: Arc<RosterStore>,
    pub utc_offset: FixedOffset,
}

impl RosterState {
    pub fn new(store: RosterStore, config: &Config) -> Self {
        Self {
            store: Arc::new(store),
            utc_offset: config.utc_offset,
        }
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.utc_offset).date_naive()
    }
}
