//! Source store product model
//!
//! One struct covers all three product kinds. A variation row is the same
//! shape with `kind = Variation` and `parent_id > 0`; the nested variation
//! id list is only populated for variable parents.

use serde::{Deserialize, Serialize};

/// Product kind as reported by the source store's `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    /// Standalone sellable product
    #[default]
    Simple,
    /// Parent grouping; sellable units are its variations
    Variable,
    /// Concrete sellable child of a variable product
    Variation,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Variable => "variable",
            Self::Variation => "variation",
        }
    }
}

impl std::str::FromStr for ProductKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Self::Simple),
            "variable" => Ok(Self::Variable),
            "variation" => Ok(Self::Variation),
            _ => Err(()),
        }
    }
}

/// Stock status tri-state
///
/// Unknown values from the source deserialize as out-of-stock, which is the
/// conservative side for a catalog that prefers marking items unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StockStatus {
    #[serde(rename = "instock")]
    InStock,
    #[serde(rename = "onbackorder")]
    OnBackorder,
    #[default]
    #[serde(rename = "outofstock")]
    #[serde(other)]
    OutOfStock,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "instock",
            Self::OutOfStock => "outofstock",
            Self::OnBackorder => "onbackorder",
        }
    }

    pub fn is_in_stock(&self) -> bool {
        matches!(self, Self::InStock)
    }
}

impl std::str::FromStr for StockStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instock" => Ok(Self::InStock),
            "onbackorder" => Ok(Self::OnBackorder),
            _ => Ok(Self::OutOfStock),
        }
    }
}

/// Product image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProductImage {
    #[serde(default)]
    pub src: String,
}

/// Typed attribute: a name plus either a single selected option (variations)
/// or the full option list (parents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProductAttribute {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl ProductAttribute {
    /// The selected option value: `option` for variations, first of
    /// `options` for parents
    pub fn value(&self) -> Option<&str> {
        self.option
            .as_deref()
            .or_else(|| self.options.first().map(String::as_str))
    }
}

/// Category reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProductCategory {
    #[serde(default)]
    pub name: String,
}

/// A source-side product or variation row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Product {
    pub id: i64,
    /// 0 for top-level rows, the parent product id for variations
    #[serde(default)]
    pub parent_id: i64,
    #[serde(default, rename = "type")]
    pub kind: ProductKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub regular_price: String,
    /// Current effective price as reported by the source
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub sale_price: String,
    #[serde(default)]
    pub stock_status: StockStatus,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    /// May contain markup; stripped by the mapper
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Variation payloads carry a single `image` object instead of a list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ProductImage>,
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
    #[serde(default)]
    pub categories: Vec<ProductCategory>,
    /// Child variation ids, populated for variable parents only
    #[serde(default)]
    pub variations: Vec<i64>,
}

impl Product {
    /// Normalize the single-image form into the image list
    pub fn normalize_images(&mut self) {
        if self.images.is_empty()
            && let Some(image) = self.image.take()
        {
            self.images.push(image);
        }
    }

    /// First image URL, if any
    pub fn first_image_src(&self) -> Option<&str> {
        self.images
            .first()
            .map(|i| i.src.as_str())
            .or_else(|| self.image.as_ref().map(|i| i.src.as_str()))
    }

    /// The price to advertise: regular price, falling back to the current
    /// effective price
    pub fn effective_price(&self) -> &str {
        if self.regular_price.is_empty() {
            &self.price
        } else {
            &self.regular_price
        }
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock_status.is_in_stock()
    }
}
