//! Sellable catalog: products, services and the instances (categories)
//! they are grouped under.

use serde::{Deserialize, Serialize};

use crate::currency::{Currency, CurrencyContext, CurrencyError};

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub company_id: Option<i64>,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub currency: Currency,
    pub instance_id: Option<i64>,
    pub unit: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl Product {
    /// Price expressed in the context's base currency.
    pub fn price_in_base(&self, ctx: &CurrencyContext) -> Result<f64, CurrencyError> {
        ctx.convert(self.price, self.currency)
    }
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub company_id: Option<i64>,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub currency: Currency,
    #[serde(default)]
    pub is_active: bool,
}

impl Service {
    pub fn price_in_base(&self, ctx: &CurrencyContext) -> Result<f64, CurrencyError> {
        ctx.convert(self.price, self.currency)
    }
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub currency: Currency,
}

/// Category node; instances may nest through `parent_id`.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: i64,
    pub company_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
}

impl Instance {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::RateTable;

    #[test]
    fn test_product_price_in_base() {
        let json = r#"{"id": 1, "code": "P-001", "name": "Harina", "price": 2.0, "currency": "USD", "isActive": true}"#;
        let product: Product = serde_json::from_str(json).unwrap();

        let table = RateTable::with_rates(Currency::Ves, [(Currency::Usd, 0.025)]).unwrap();
        let ctx = CurrencyContext::new(Currency::Usd, table);
        let price = product.price_in_base(&ctx).unwrap();
        assert!((price - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_instance_root() {
        let instance = Instance {
            id: 4,
            company_id: None,
            name: "Víveres".to_string(),
            description: None,
            parent_id: None,
        };
        assert!(instance.is_root());
    }
}
