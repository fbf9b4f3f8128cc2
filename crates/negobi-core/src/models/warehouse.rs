use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: i64,
    pub company_id: Option<i64>,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl Warehouse {
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehousePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}
