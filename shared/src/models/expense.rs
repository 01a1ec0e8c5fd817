//! Expense Model
//!
//! Category-specific fields are carried by [`ExpenseKind`]: only the
//! Marketing variant has a platform and a campaign. On the wire an expense
//! is a flat record (`category`, `platform`, `campaign`, ...); conversion
//! happens through [`ExpenseDoc`].

use super::collection::{Collection, Record};
use crate::util::lenient;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known id of the automated shipping expense
pub const AUTO_SHIPPING_ID: &str = "autoShipping";

/// Description written on the automated shipping expense
pub const AUTO_SHIPPING_DESCRIPTION: &str = "Automated shipping costs from orders";

/// Expense category as stored on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Materials,
    Shipping,
    Marketing,
    Tools,
    /// Also used for missing or unrecognised categories
    #[default]
    #[serde(other)]
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Materials,
        ExpenseCategory::Shipping,
        ExpenseCategory::Marketing,
        ExpenseCategory::Tools,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Materials => "Materials",
            ExpenseCategory::Shipping => "Shipping",
            ExpenseCategory::Marketing => "Marketing",
            ExpenseCategory::Tools => "Tools",
            ExpenseCategory::Other => "Other",
        }
    }

    fn parse(raw: &str) -> Self {
        match raw {
            "Materials" => ExpenseCategory::Materials,
            "Shipping" => ExpenseCategory::Shipping,
            "Marketing" => ExpenseCategory::Marketing,
            "Tools" => ExpenseCategory::Tools,
            _ => ExpenseCategory::Other,
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advertising platform of a marketing expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MarketingPlatform {
    #[default]
    Facebook,
    Instagram,
    TikTok,
    #[serde(other)]
    Other,
}

impl MarketingPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketingPlatform::Facebook => "Facebook",
            MarketingPlatform::Instagram => "Instagram",
            MarketingPlatform::TikTok => "TikTok",
            MarketingPlatform::Other => "Other",
        }
    }

    fn parse(raw: &str) -> Self {
        match raw {
            "Facebook" => MarketingPlatform::Facebook,
            "Instagram" => MarketingPlatform::Instagram,
            "TikTok" => MarketingPlatform::TikTok,
            _ => MarketingPlatform::Other,
        }
    }
}

impl fmt::Display for MarketingPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of an expense, with the fields only that category carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseKind {
    Materials,
    Shipping,
    Marketing {
        platform: MarketingPlatform,
        campaign: String,
    },
    Tools,
    Other,
}

impl ExpenseKind {
    pub fn category(&self) -> ExpenseCategory {
        match self {
            ExpenseKind::Materials => ExpenseCategory::Materials,
            ExpenseKind::Shipping => ExpenseCategory::Shipping,
            ExpenseKind::Marketing { .. } => ExpenseCategory::Marketing,
            ExpenseKind::Tools => ExpenseCategory::Tools,
            ExpenseKind::Other => ExpenseCategory::Other,
        }
    }

    /// Description synthesized for marketing expenses: "[platform] campaign"
    pub fn marketing_description(&self) -> Option<String> {
        match self {
            ExpenseKind::Marketing { platform, campaign } => {
                Some(format!("[{}] {}", platform, campaign))
            }
            _ => None,
        }
    }

    fn from_wire(
        category: ExpenseCategory,
        platform: Option<MarketingPlatform>,
        campaign: Option<String>,
    ) -> Self {
        match category {
            ExpenseCategory::Materials => ExpenseKind::Materials,
            ExpenseCategory::Shipping => ExpenseKind::Shipping,
            ExpenseCategory::Marketing => ExpenseKind::Marketing {
                platform: platform.unwrap_or_default(),
                campaign: campaign.unwrap_or_default(),
            },
            ExpenseCategory::Tools => ExpenseKind::Tools,
            ExpenseCategory::Other => ExpenseKind::Other,
        }
    }

    fn wire_extras(&self) -> (Option<MarketingPlatform>, Option<String>) {
        match self {
            ExpenseKind::Marketing { platform, campaign } => {
                (Some(*platform), Some(campaign.clone()))
            }
            _ => (None, None),
        }
    }
}

/// Expense entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ExpenseDoc", into = "ExpenseDoc")]
pub struct Expense {
    pub id: String,
    /// ISO calendar date (YYYY-MM-DD)
    pub date: String,
    pub kind: ExpenseKind,
    pub description: String,
    pub amount: f64,
    /// System-owned record, read-only for users
    pub is_auto: bool,
}

impl Expense {
    pub fn category(&self) -> ExpenseCategory {
        self.kind.category()
    }
}

/// Flat wire shape of an expense record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDoc {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "category_or_other")]
    pub category: ExpenseCategory,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient::bool_or_false")]
    pub is_auto: bool,
    #[serde(
        default,
        deserialize_with = "platform_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub platform: Option<MarketingPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
}

fn category_or_other<'de, D>(deserializer: D) -> Result<ExpenseCategory, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = lenient::string_or_empty(deserializer)?;
    Ok(ExpenseCategory::parse(&raw))
}

fn platform_or_none<'de, D>(deserializer: D) -> Result<Option<MarketingPlatform>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = lenient::string_or_empty(deserializer)?;
    Ok((!raw.is_empty()).then(|| MarketingPlatform::parse(&raw)))
}

impl From<ExpenseDoc> for Expense {
    fn from(doc: ExpenseDoc) -> Self {
        Self {
            id: doc.id,
            date: doc.date,
            kind: ExpenseKind::from_wire(doc.category, doc.platform, doc.campaign),
            description: doc.description,
            amount: doc.amount,
            is_auto: doc.is_auto,
        }
    }
}

impl From<Expense> for ExpenseDoc {
    fn from(expense: Expense) -> Self {
        let (platform, campaign) = expense.kind.wire_extras();
        Self {
            id: expense.id,
            date: expense.date,
            category: expense.kind.category(),
            description: expense.description,
            amount: expense.amount,
            is_auto: expense.is_auto,
            platform,
            campaign,
        }
    }
}

/// Create expense payload
///
/// Never carries `isAuto = true`; the automated record is written by the
/// shipping synthesizer only.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseCreate {
    pub date: String,
    pub kind: ExpenseKind,
    /// Ignored for marketing expenses, which get a synthesized description
    pub description: String,
    pub amount: f64,
}

impl ExpenseCreate {
    pub fn effective_description(&self) -> String {
        self.kind
            .marketing_description()
            .unwrap_or_else(|| self.description.clone())
    }
}

impl Serialize for ExpenseCreate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (platform, campaign) = self.kind.wire_extras();
        ExpenseDoc {
            id: String::new(),
            date: self.date.clone(),
            category: self.kind.category(),
            description: self.effective_description(),
            amount: self.amount,
            is_auto: false,
            platform,
            campaign,
        }
        .serialize(serializer)
    }
}

/// Update expense payload (merged into the stored record)
///
/// Changing the kind away from Marketing clears the stored platform and
/// campaign so no stray marketing fields survive the merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseUpdate {
    pub date: Option<String>,
    pub kind: Option<ExpenseKind>,
    pub description: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseUpdateDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<ExpenseCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    platform: Option<Option<MarketingPlatform>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    campaign: Option<Option<String>>,
}

impl Serialize for ExpenseUpdate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (platform, campaign) = match &self.kind {
            Some(kind) => {
                let (p, c) = kind.wire_extras();
                (Some(p), Some(c))
            }
            None => (None, None),
        };
        let description = self
            .kind
            .as_ref()
            .and_then(ExpenseKind::marketing_description)
            .or_else(|| self.description.clone());
        ExpenseUpdateDoc {
            date: self.date.clone(),
            category: self.kind.as_ref().map(ExpenseKind::category),
            description,
            amount: self.amount,
            platform,
            campaign,
        }
        .serialize(serializer)
    }
}

/// The system-owned shipping expense, as written by the synthesizer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoShippingExpense {
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: f64,
    pub date: String,
    pub is_auto: bool,
}

impl AutoShippingExpense {
    pub fn new(amount: f64, date: impl Into<String>) -> Self {
        Self {
            category: ExpenseCategory::Shipping,
            description: AUTO_SHIPPING_DESCRIPTION.to_string(),
            amount,
            date: date.into(),
            is_auto: true,
        }
    }
}

impl Record for Expense {
    const COLLECTION: Collection = Collection::Expenses;
    type Create = ExpenseCreate;
    type Update = ExpenseUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        Document::new("e1", value.as_object().unwrap().clone())
    }

    #[test]
    fn test_marketing_expense_decodes_with_platform() {
        let expense: Expense = doc(json!({
            "date": "2024-03-20",
            "category": "Marketing",
            "description": "[Instagram] Spring bags",
            "amount": 40,
            "platform": "Instagram",
            "campaign": "Spring bags"
        }))
        .decode()
        .unwrap();
        assert_eq!(
            expense.kind,
            ExpenseKind::Marketing {
                platform: MarketingPlatform::Instagram,
                campaign: "Spring bags".to_string()
            }
        );
        assert!(!expense.is_auto);
    }

    #[test]
    fn test_stray_platform_on_non_marketing_is_dropped() {
        let expense: Expense = doc(json!({
            "category": "Tools",
            "amount": "12.5",
            "platform": "Facebook",
            "campaign": "old"
        }))
        .decode()
        .unwrap();
        assert_eq!(expense.kind, ExpenseKind::Tools);
        assert_eq!(expense.amount, 12.5);

        let wire = serde_json::to_value(&expense).unwrap();
        assert!(wire.get("platform").is_none());
        assert!(wire.get("campaign").is_none());
    }

    #[test]
    fn test_unknown_category_is_other() {
        let expense: Expense = doc(json!({"category": "Rent", "amount": 100})).decode().unwrap();
        assert_eq!(expense.category(), ExpenseCategory::Other);
        let expense: Expense = doc(json!({"amount": 1})).decode().unwrap();
        assert_eq!(expense.category(), ExpenseCategory::Other);
    }

    #[test]
    fn test_create_synthesizes_marketing_description() {
        let create = ExpenseCreate {
            date: "2024-03-01".to_string(),
            kind: ExpenseKind::Marketing {
                platform: MarketingPlatform::TikTok,
                campaign: "Belts launch".to_string(),
            },
            description: "ignored".to_string(),
            amount: 80.0,
        };
        let wire = serde_json::to_value(&create).unwrap();
        assert_eq!(wire["description"], json!("[TikTok] Belts launch"));
        assert_eq!(wire["category"], json!("Marketing"));
        assert_eq!(wire["isAuto"], json!(false));
        assert!(wire.get("id").is_none());
    }

    #[test]
    fn test_update_away_from_marketing_clears_extras() {
        let update = ExpenseUpdate {
            kind: Some(ExpenseKind::Materials),
            ..Default::default()
        };
        let wire = serde_json::to_value(&update).unwrap();
        assert_eq!(wire["category"], json!("Materials"));
        assert_eq!(wire["platform"], serde_json::Value::Null);
        assert_eq!(wire["campaign"], serde_json::Value::Null);

        let amount_only = ExpenseUpdate {
            amount: Some(5.0),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&amount_only).unwrap(), json!({"amount": 5.0}));
    }

    #[test]
    fn test_auto_shipping_shape() {
        let wire = serde_json::to_value(AutoShippingExpense::new(70.0, "2024-03-01")).unwrap();
        assert_eq!(
            wire,
            json!({
                "category": "Shipping",
                "description": AUTO_SHIPPING_DESCRIPTION,
                "amount": 70.0,
                "date": "2024-03-01",
                "isAuto": true
            })
        );
    }
}
