use crate::errors::{AppError, AppResult};
use crate::models::{RosterPerson, Status};
use crate::storage::{load_document, persist_document};
use crate::store::require_name;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Proof that the operator answered "yes" to both clear-all questions.
#[derive(Debug)]
pub struct ClearConfirmation {
    _private: (),
}

impl ClearConfirmation {
    pub fn from_answers(first: bool, second: bool) -> Option<Self> {
        (first && second).then_some(Self { _private: () })
    }
}

/// The roster document: every person with an embedded status, newest first.
pub struct RosterStore {
    path: PathBuf,
    people: Mutex<Vec<RosterPerson>>,
}

impl RosterStore {
    pub async fn open(path: &Path) -> AppResult<Self> {
        let people = load_document(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            people: Mutex::new(people),
        })
    }

    pub async fn list_people(&self) -> Vec<RosterPerson> {
        self.people.lock().await.clone()
    }

    pub async fn add_person(&self, name: &str, at: DateTime<Utc>) -> AppResult<RosterPerson> {
        let name = require_name(name)?;

        let mut people = self.people.lock().await;
        let person = RosterPerson {
            id: next_id(&people, at),
            name,
            status: Status::Pending,
            created_at: at,
            marked_at: None,
        };
        let mut next = people.clone();
        next.insert(0, person.clone());
        persist_document(&self.path, &next).await?;
        *people = next;

        info!(person_id = %person.id, name = %person.name, "roster person added");
        Ok(person)
    }

    /// Overwrites the status unconditionally.
    pub async fn mark_status(
        &self,
        id: &str,
        status: Status,
        at: DateTime<Utc>,
    ) -> AppResult<RosterPerson> {
        let mut people = self.people.lock().await;
        let mut next = people.clone();
        let person = next
            .iter_mut()
            .find(|person| person.id == id)
            .ok_or_else(|| AppError::UnknownPerson(id.to_string()))?;
        person.status = status;
        person.marked_at = match status {
            Status::Pending => None,
            Status::Attended | Status::NotAttended => Some(at),
        };
        let updated = person.clone();

        persist_document(&self.path, &next).await?;
        *people = next;

        info!(person_id = %id, status = status.as_str(), "roster status marked");
        Ok(updated)
    }

    pub async fn delete_person(&self, id: &str) -> AppResult<RosterPerson> {
        let mut people = self.people.lock().await;
        let position = people
            .iter()
            .position(|person| person.id == id)
            .ok_or_else(|| AppError::UnknownPerson(id.to_string()))?;
        let mut next = people.clone();
        let removed = next.remove(position);

        persist_document(&self.path, &next).await?;
        *people = next;

        info!(person_id = %id, "roster person deleted");
        Ok(removed)
    }

    /// Wipes the roster. Returns how many people were removed.
    pub async fn clear_all(&self, _confirmation: ClearConfirmation) -> AppResult<usize> {
        let mut people = self.people.lock().await;
        let removed = people.len();
        let next: Vec<RosterPerson> = Vec::new();
        persist_document(&self.path, &next).await?;
        *people = next;

        warn!(removed, "roster cleared");
        Ok(removed)
    }
}

/// Millisecond timestamp, bumped until it does not collide.
fn next_id(people: &[RosterPerson], at: DateTime<Utc>) -> String {
    let mut candidate = at.timestamp_millis();
    loop {
        let id = candidate.to_string();
        if !people.iter().any(|person| person.id == id) {
            return id;
        }
        candidate += 1;
    }
}
