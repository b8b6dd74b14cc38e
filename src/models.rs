use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request status. Values written by other tools are kept verbatim in
/// `Other` so a single odd record never makes the whole file unreadable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    #[default]
    New,
    InProgress,
    Completed,
    Other(String),
}

impl RequestStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "new",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Archived flag implied by moving a request into this status.
    pub fn implies_archived(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl From<String> for RequestStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "new" => Self::New,
            "in-progress" => Self::InProgress,
            "completed" => Self::Completed,
            _ => Self::Other(raw),
        }
    }
}

impl Serialize for RequestStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RequestStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// One customer service request as persisted in the record set. Every
/// field is defaulted and unknown keys ride along in `extra`, so records
/// written by hand or by older builds survive a read/write cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub request_type: String,
    #[serde(default)]
    pub status: RequestStatus,
    /// `DD.MM.YYYY`, local calendar date at creation.
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceRequest {
    pub fn is_archived(&self) -> bool {
        self.archived.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequestPayload {
    pub name: String,
    pub city: String,
    pub request_type: String,
    #[serde(default)]
    pub status: RequestStatus,
}

/// Partial field update. `id`, `createdAt` and `archived` are not patchable:
/// unknown keys are ignored on the wire and `archived` follows `status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
}

impl RequestPatch {
    pub fn status(status: RequestStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestView {
    #[default]
    All,
    Archived,
    New,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub total: usize,
    pub new: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub archived: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    /// 1-based, clamped into `1..=page_count`.
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub stats: RequestStats,
    pub archived: PageResponse<ServiceRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub path: String,
    pub sheet_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_wire_names() {
        let request = ServiceRequest {
            id: "1700000000000".to_string(),
            name: "A".to_string(),
            city: "Kyiv".to_string(),
            request_type: "General".to_string(),
            status: RequestStatus::InProgress,
            created_at: "19.10.2026".to_string(),
            archived: None,
            extra: Map::new(),
        };
        let value = serde_json::to_value(&request).expect("serialize request");
        assert_eq!(value["requestType"], "General");
        assert_eq!(value["createdAt"], "19.10.2026");
        assert_eq!(value["status"], "in-progress");
        assert!(value.get("archived").is_none());
    }

    #[test]
    fn patch_ignores_immutable_fields() {
        let patch: RequestPatch = serde_json::from_value(serde_json::json!({
            "id": "other",
            "createdAt": "01.01.2000",
            "archived": true,
            "name": "X"
        }))
        .expect("patch parses");
        assert_eq!(patch.name.as_deref(), Some("X"));
        assert_eq!(patch.status, None);
    }

    #[test]
    fn new_payload_defaults_to_new_status() {
        let payload: NewRequestPayload = serde_json::from_value(serde_json::json!({
            "name": "A",
            "city": "Lviv",
            "requestType": "Complaint"
        }))
        .expect("payload parses");
        assert_eq!(payload.status, RequestStatus::New);
    }

    #[test]
    fn unexpected_status_and_keys_are_kept() {
        let raw = serde_json::json!({
            "id": "2",
            "name": "Petro",
            "status": "pending",
            "phone": "+380441234567"
        });
        let request: ServiceRequest = serde_json::from_value(raw.clone()).expect("lenient record");
        assert_eq!(request.status, RequestStatus::Other("pending".to_string()));
        assert_eq!(request.city, "");
        assert_eq!(request.extra["phone"], "+380441234567");

        let written = serde_json::to_value(&request).expect("serialize");
        assert_eq!(written["status"], "pending");
        assert_eq!(written["phone"], "+380441234567");
    }
}
