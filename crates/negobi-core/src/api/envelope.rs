//! Response envelopes and list query parameters shared by every collection.
//!
//! Lists: `{ "data": { "data": [...], "total": n, "totalPages": n } }`.
//! Mutations: `{ "status": n, "data": { "data": {...}, "message": "..." } }`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub page: u32,
    pub items_per_page: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: DEFAULT_PAGE,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
        }
    }
}

impl ListQuery {
    pub fn page(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() { None } else { Some(search) };
        self
    }

    pub fn with_items_per_page(mut self, items_per_page: u32) -> Self {
        self.items_per_page = items_per_page.max(1);
        self
    }
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            total_pages: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListEnvelope<T> {
    pub data: Page<T>,
}

/// A successful mutation: effective status, returned record and the
/// backend's message, if it sent one.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation<T> {
    pub status: u16,
    pub data: T,
    pub message: Option<String>,
}

/// A successful mutation that returns no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub status: u16,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MutationEnvelope<T> {
    pub status: Option<u16>,
    pub data: MutationBody<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MutationBody<T> {
    /// Absent or null when the envelope reports a failure.
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Mutation responses whose `data.data` may be absent (deletes, password
/// changes).
#[derive(Debug, Deserialize)]
pub(crate) struct AckEnvelope {
    pub status: Option<u16>,
    #[serde(default)]
    pub data: Option<AckData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AckData {
    #[serde(default)]
    pub message: Option<String>,
}

/// Whether an envelope status (when present) signals success.
pub(crate) fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: i64,
    }

    #[test]
    fn test_list_query_serialization() {
        let query = ListQuery::page(2).with_search("harina").with_items_per_page(25);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value, serde_json::json!({"search": "harina", "page": 2, "itemsPerPage": 25}));

        let blank = ListQuery::default().with_search("   ");
        assert_eq!(blank.search, None);
        assert_eq!(ListQuery::default().with_items_per_page(0).items_per_page, 1);
    }

    #[test]
    fn test_parse_list_envelope() {
        let json = r#"{"data": {"data": [{"id": 1}, {"id": 2}], "total": 12, "totalPages": 6}}"#;
        let envelope: ListEnvelope<Item> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.data.len(), 2);
        assert_eq!(envelope.data.total, 12);
        assert_eq!(envelope.data.total_pages, 6);
    }

    #[test]
    fn test_parse_mutation_envelope() {
        let json = r#"{"status": 201, "data": {"data": {"id": 5}, "message": "Creado"}}"#;
        let envelope: MutationEnvelope<Item> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status, Some(201));
        assert_eq!(envelope.data.data, Some(Item { id: 5 }));
        assert_eq!(envelope.data.message.as_deref(), Some("Creado"));
    }

    #[test]
    fn test_parse_failed_mutation_envelope() {
        let json = r#"{"status": 409, "data": {"data": null, "message": "El RIF ya existe"}}"#;
        let envelope: MutationEnvelope<Item> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status, Some(409));
        assert_eq!(envelope.data.data, None);
    }

    #[test]
    fn test_parse_ack_without_data() {
        let envelope: AckEnvelope = serde_json::from_str(r#"{"status": 200}"#).unwrap();
        assert!(envelope.data.is_none());
        assert!(is_success_status(envelope.status.unwrap_or(200)));
        assert!(!is_success_status(400));
    }
}
