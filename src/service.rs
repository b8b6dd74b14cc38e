use crate::errors::AppResult;
use crate::models::{NewRequestPayload, RequestPatch, ServiceRequest};
use crate::store::{LoadOutcome, RecordStore};
use chrono::{DateTime, Local};
use serde_json::Map;

pub const CREATED_AT_FORMAT: &str = "%d.%m.%Y";

/// The five request operations. Each one reloads the whole record set,
/// applies its change in memory and writes the whole set back.
#[derive(Debug, Clone)]
pub struct RequestService {
    store: RecordStore,
    strict_storage: bool,
}

impl RequestService {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            strict_storage: false,
        }
    }

    /// Storage read/write failures become errors instead of log lines.
    pub fn strict(store: RecordStore) -> Self {
        Self {
            store,
            strict_storage: true,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn list(&self) -> AppResult<Vec<ServiceRequest>> {
        self.load_records()
    }

    pub fn replace_all(&self, records: Vec<ServiceRequest>) -> AppResult<()> {
        tracing::info!(count = records.len(), "replacing all requests");
        self.persist(&records)
    }

    pub fn create(&self, payload: NewRequestPayload) -> AppResult<ServiceRequest> {
        self.create_at(payload, Local::now())
    }

    pub(crate) fn create_at(&self, payload: NewRequestPayload, now: DateTime<Local>) -> AppResult<ServiceRequest> {
        let mut records = self.load_records()?;
        let request = ServiceRequest {
            id: next_request_id(now.timestamp_millis(), &records),
            name: payload.name,
            city: payload.city,
            request_type: payload.request_type,
            status: payload.status,
            created_at: now.format(CREATED_AT_FORMAT).to_string(),
            archived: None,
            extra: Map::new(),
        };
        records.push(request.clone());
        self.persist(&records)?;
        tracing::info!(request_id = %request.id, status = request.status.as_str(), "request created");
        Ok(request)
    }

    /// `Ok(None)` when no request has `id`; nothing is written in that case.
    pub fn update(&self, id: &str, patch: RequestPatch) -> AppResult<Option<ServiceRequest>> {
        let mut records = self.load_records()?;
        let Some(entry) = records.iter_mut().find(|request| request.id == id) else {
            tracing::debug!(request_id = %id, "update skipped: request not found");
            return Ok(None);
        };

        let archived = match &patch.status {
            Some(status) if !status.is_empty() => status.implies_archived(),
            _ => entry.is_archived(),
        };
        if let Some(name) = patch.name {
            entry.name = name;
        }
        if let Some(city) = patch.city {
            entry.city = city;
        }
        if let Some(request_type) = patch.request_type {
            entry.request_type = request_type;
        }
        if let Some(status) = patch.status {
            entry.status = status;
        }
        entry.archived = Some(archived);

        let updated = entry.clone();
        self.persist(&records)?;
        tracing::info!(
            request_id = %updated.id,
            status = updated.status.as_str(),
            archived,
            "request updated"
        );
        Ok(Some(updated))
    }

    /// Drops every request with `id`. Absent ids still save and succeed.
    pub fn remove(&self, id: &str) -> AppResult<bool> {
        let mut records = self.load_records()?;
        let before = records.len();
        records.retain(|request| request.id != id);
        self.persist(&records)?;
        tracing::info!(request_id = %id, removed = before - records.len(), "request removed");
        Ok(true)
    }

    fn load_records(&self) -> AppResult<Vec<ServiceRequest>> {
        if !self.strict_storage {
            return Ok(self.store.load());
        }
        match self.store.try_load() {
            LoadOutcome::Failed(error) => Err(error),
            outcome => Ok(outcome.into_records()),
        }
    }

    fn persist(&self, records: &[ServiceRequest]) -> AppResult<()> {
        if self.strict_storage {
            self.store.try_save(records)
        } else {
            self.store.save(records);
            Ok(())
        }
    }
}

/// Millisecond timestamp, bumped forward until it collides with nothing in
/// the current set.
fn next_request_id(now_millis: i64, existing: &[ServiceRequest]) -> String {
    let mut candidate = now_millis;
    loop {
        let id = candidate.to_string();
        if !existing.iter().any(|request| request.id == id) {
            return id;
        }
        candidate += 1;
    }
}
