use crate::errors::{AppError, AppResult};
use crate::models::{AttendanceRecord, Day, Person, Slot, TablesData};
use crate::storage::{load_document, persist_document};
use crate::store::{normalize_category, require_name};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// `personas` and `asistencias` kept as one JSON document.
pub struct TableStore {
    path: PathBuf,
    data: Mutex<TablesData>,
}

impl TableStore {
    pub async fn open(path: &Path) -> AppResult<Self> {
        let data = load_document(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            data: Mutex::new(data),
        })
    }

    /// People ordered by name.
    pub async fn list_people(&self) -> Vec<Person> {
        let data = self.data.lock().await;
        let mut people = data.personas.clone();
        people.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        people
    }

    pub async fn list_attendance(&self) -> Vec<AttendanceRecord> {
        self.data.lock().await.asistencias.clone()
    }

    pub async fn add_person(&self, name: &str, category: Option<&str>) -> AppResult<Person> {
        let name = require_name(name)?;
        let person = Person {
            id: Uuid::new_v4(),
            name,
            category: normalize_category(category),
        };

        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.personas.push(person.clone());
        persist_document(&self.path, &next).await?;
        *data = next;

        info!(person_id = %person.id, name = %person.name, "person added");
        Ok(person)
    }

    /// Sets one slot of the (person, day) record, creating the record on first
    /// use. Lookup and write happen under one lock, so a pair never gets two
    /// records. A slot that is already set keeps its original timestamp.
    pub async fn mark_attendance(
        &self,
        person_id: Uuid,
        day: Day,
        slot: Slot,
        at: DateTime<Utc>,
    ) -> AppResult<AttendanceRecord> {
        let mut data = self.data.lock().await;
        if !data.personas.iter().any(|person| person.id == person_id) {
            return Err(AppError::UnknownPerson(person_id.to_string()));
        }

        let mut next = data.clone();
        let record = match find_record(&mut next.asistencias, person_id, day) {
            Some(record) => {
                let value = record.slot_mut(slot);
                if value.is_some() {
                    return Ok(record.clone());
                }
                *value = Some(at);
                record.clone()
            }
            None => {
                next.next_record_id += 1;
                let mut record = AttendanceRecord {
                    id: next.next_record_id,
                    person_id,
                    day,
                    check_in: None,
                    check_out: None,
                };
                *record.slot_mut(slot) = Some(at);
                next.asistencias.push(record.clone());
                record
            }
        };

        persist_document(&self.path, &next).await?;
        *data = next;

        info!(
            %person_id,
            day = day.number(),
            slot = slot.form_value(),
            record_id = record.id,
            "attendance marked"
        );
        Ok(record)
    }
}

fn find_record(
    records: &mut [AttendanceRecord],
    person_id: Uuid,
    day: Day,
) -> Option<&mut AttendanceRecord> {
    records
        .iter_mut()
        .find(|record| record.person_id == person_id && record.day == day)
}
