use serde::{Deserialize, Serialize};

/// A trainer record, as stored in the document collection and the bundled
/// JSON snapshot. Only `id` and `title` are needed for display; the rest is
/// checked by [`crate::catalog::data_manager::validate_product`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub price: Option<f64>,

    #[serde(default)]
    pub image: String,

    /// Comma-separated list of categories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specialization: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<Badge>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_description: Option<String>,
}

impl Product {
    /// Categories split on commas, trimmed. Falls back to a generic label.
    pub fn categories(&self) -> Vec<String> {
        let raw = self.category.as_deref().unwrap_or("Trainer");
        raw.split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }

    pub fn in_category(&self, filter: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|c| c.contains(filter))
    }
}

/// Extra card badge: either a bare label or a styled one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Badge {
    Label(String),
    Styled {
        text: String,
        #[serde(default)]
        dark: bool,
        #[serde(default)]
        color: Option<String>,
        #[serde(default, rename = "textColor")]
        text_color: Option<String>,
    },
}

impl Badge {
    pub fn text(&self) -> &str {
        match self {
            Badge::Label(text) => text,
            Badge::Styled { text, .. } => text,
        }
    }
}

/// `2000, Some("RUB")` → `"2000 ₽"`. Unknown currency codes are printed as-is.
pub fn format_price(price: f64, currency: Option<&str>) -> String {
    let code = currency.unwrap_or("RUB");
    let symbol = match code {
        "RUB" => "\u{20bd}",
        "USD" => "$",
        "EUR" => "\u{20ac}",
        "GBP" => "\u{a3}",
        other => other,
    };

    let amount = if price.fract() == 0.0 && price.abs() < 1e15 {
        format!("{}", price as i64)
    } else {
        format!("{}", price)
    };

    format!("{} {}", amount, symbol)
}
