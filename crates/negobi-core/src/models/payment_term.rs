use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTerm {
    pub id: i64,
    pub company_id: Option<i64>,
    pub name: String,
    pub days: u32,
    pub description: Option<String>,
}

impl PaymentTerm {
    pub fn is_cash(&self) -> bool {
        self.days == 0
    }

    pub fn days_display(&self) -> String {
        match self.days {
            0 => "Contado".to_string(),
            1 => "1 día".to_string(),
            n => format!("{} días", n),
        }
    }
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTermPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    pub name: String,
    pub days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_display() {
        let mut term = PaymentTerm {
            id: 1,
            company_id: None,
            name: "Crédito".to_string(),
            days: 0,
            description: None,
        };
        assert!(term.is_cash());
        assert_eq!(term.days_display(), "Contado");
        term.days = 30;
        assert_eq!(term.days_display(), "30 días");
    }
}
