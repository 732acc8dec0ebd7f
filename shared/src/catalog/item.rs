//! Ad-catalog item shape
//!
//! The `data` block of a batch request and the row source for CSV feeds.

use serde::{Deserialize, Serialize};

/// Tri-state availability understood by the ad catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Availability {
    #[serde(rename = "in stock")]
    InStock,
    #[serde(rename = "preorder")]
    Preorder,
    #[default]
    #[serde(rename = "out of stock")]
    OutOfStock,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "in stock",
            Self::Preorder => "preorder",
            Self::OutOfStock => "out of stock",
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rendered-image entry: URL plus placement tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImage {
    pub url: String,
    pub tag: Vec<String>,
}

/// A single catalog item
///
/// `id` always equals the top-level retailer id of the batch entry carrying
/// it; the remote API requires the duplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    /// Stripped markup, truncated to 5000 characters
    pub description: String,
    /// Stripped markup, not truncated
    pub rich_text_description: String,
    pub availability: Availability,
    pub condition: String,
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<String>,
    pub link: String,
    pub image_link: String,
    pub brand: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(rename = "image", default)]
    pub images: Vec<CatalogImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_wire_format() {
        assert_eq!(
            serde_json::to_string(&Availability::InStock).unwrap(),
            "\"in stock\""
        );
        assert_eq!(
            serde_json::to_string(&Availability::OutOfStock).unwrap(),
            "\"out of stock\""
        );
        assert_eq!(
            serde_json::to_string(&Availability::Preorder).unwrap(),
            "\"preorder\""
        );
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let item = CatalogItem {
            id: "wc_42".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("sale_price").is_none());
        assert!(value.get("item_group_id").is_none());
        assert!(value.get("inventory").is_none());
    }
}
