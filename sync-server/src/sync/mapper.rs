//! Product → catalog-item mapper
//!
//! Pure mapping from a source product (plus optional parent and feed style)
//! into the ad-catalog item shape. The same output feeds the batch endpoint
//! and the CSV rows.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use url::Url;

use shared::catalog::{CatalogImage, CatalogItem};
use shared::models::{Product, ProductKind};

use super::policy;
use crate::core::Config;

/// Feed style; only changes the `style` parameter of rendered-image URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStyle {
    Standard,
    Christmas,
}

impl FeedStyle {
    pub const ALL: [FeedStyle; 2] = [FeedStyle::Standard, FeedStyle::Christmas];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Christmas => "christmas",
        }
    }
}

impl std::str::FromStr for FeedStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "christmas" => Ok(Self::Christmas),
            _ => Err(()),
        }
    }
}

/// Maximum length of the plain `description` field; the rich-text variant is
/// never truncated
const DESCRIPTION_MAX_CHARS: usize = 5000;

/// Condition constant emitted with every item
const CONDITION_NEW: &str = "new";

/// Currency suffix the image render service expects, independent of the
/// catalog currency
const IMAGE_PRICE_SUFFIX: &str = "KM";

/// Rendered-image variants, in the exact order the catalog expects
const IMAGE_VARIANTS: &[(&str, &[&str])] = &[
    ("1:1", &[]),
    ("4:5", &["ASPECT_RATIO_4_5_PREFERRED"]),
    ("9:16", &["STORY_PREFERRED", "REELS_PREFERRED"]),
];

/// The constants the mapper needs from server configuration
#[derive(Debug, Clone)]
pub struct MapperConfig {
    pub brand: String,
    pub currency_suffix: String,
    pub image_render_url: String,
}

impl From<&Config> for MapperConfig {
    fn from(config: &Config) -> Self {
        Self {
            brand: config.brand.clone(),
            currency_suffix: config.currency_suffix.clone(),
            image_render_url: config.image_render_url.clone(),
        }
    }
}

/// Map one product (with optional parent context) into a catalog item
pub fn map_to_item(
    product: &Product,
    parent: Option<&Product>,
    style: FeedStyle,
    cfg: &MapperConfig,
) -> CatalogItem {
    let title = parent
        .map(|p| p.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(product.name.as_str());

    let raw_description = if product.description.is_empty() {
        parent.map(|p| p.description.as_str()).unwrap_or("")
    } else {
        product.description.as_str()
    };
    let stripped = strip_markup(raw_description);
    let description = truncate_chars(&stripped, DESCRIPTION_MAX_CHARS);

    let price = format!("{} {}", product.effective_price(), cfg.currency_suffix);
    let sale_price = (!product.sale_price.is_empty())
        .then(|| format!("{} {}", product.sale_price, cfg.currency_suffix));

    let link = if product.permalink.is_empty() {
        parent.map(|p| p.permalink.clone()).unwrap_or_default()
    } else {
        product.permalink.clone()
    };

    let (color, size, gender, age_group) = extract_attributes(product, parent);

    let categories = match product.kind {
        ProductKind::Variation => parent
            .map(|p| &p.categories)
            .unwrap_or(&product.categories),
        _ => &product.categories,
    };
    let product_type = (!categories.is_empty()).then(|| {
        categories
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join("/")
    });

    let source_image = product
        .first_image_src()
        .or_else(|| parent.and_then(Product::first_image_src));
    let images = source_image
        .map(|src| render_images(product, title, src, style, cfg))
        .unwrap_or_default();
    let image_link = images.first().map(|i| i.url.clone()).unwrap_or_default();

    CatalogItem {
        id: policy::retailer_id(product),
        title: title.to_string(),
        description,
        rich_text_description: stripped,
        availability: policy::availability(product.stock_status),
        condition: CONDITION_NEW.to_string(),
        price,
        sale_price,
        link,
        image_link,
        brand: cfg.brand.clone(),
        item_group_id: policy::group_id(product),
        product_type,
        inventory: policy::inventory(product),
        color,
        size,
        gender,
        age_group,
        images,
    }
}

/// Compose the three rendered-image URLs against the image service
fn render_images(
    product: &Product,
    title: &str,
    source_src: &str,
    style: FeedStyle,
    cfg: &MapperConfig,
) -> Vec<CatalogImage> {
    IMAGE_VARIANTS
        .iter()
        .map(|(aspect_ratio, tags)| CatalogImage {
            url: render_image_url(product, title, source_src, style, aspect_ratio, cfg),
            tag: tags.iter().map(|t| t.to_string()).collect(),
        })
        .collect()
}

fn render_image_url(
    product: &Product,
    title: &str,
    source_src: &str,
    style: FeedStyle,
    aspect_ratio: &str,
    cfg: &MapperConfig,
) -> String {
    let Ok(mut url) = Url::parse(&cfg.image_render_url) else {
        // Unusable render base; fall back to the original image
        return source_src.to_string();
    };

    {
        let mut query = url.query_pairs_mut();
        query.append_pair(
            "price",
            &format!("{} {IMAGE_PRICE_SUFFIX}", product.effective_price()),
        );
        if !product.sale_price.is_empty() {
            query.append_pair(
                "discount_price",
                &format!("{} {IMAGE_PRICE_SUFFIX}", product.sale_price),
            );
        }
        query.append_pair("name", title);
        query.append_pair("img", &URL_SAFE_NO_PAD.encode(source_src));
        query.append_pair("style", style.as_str());
        query.append_pair("aspect_ratio", aspect_ratio);
    }

    url.to_string()
}

/// Pick color/size/gender/age values from the merged attribute lists
///
/// The product's own attributes take precedence over the parent's: a
/// variation carries its selected option, the parent only the option list.
fn extract_attributes(
    product: &Product,
    parent: Option<&Product>,
) -> (
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
) {
    let mut color = None;
    let mut size = None;
    let mut gender = None;
    let mut age_group = None;

    let merged = product
        .attributes
        .iter()
        .chain(parent.into_iter().flat_map(|p| p.attributes.iter()));

    for attribute in merged {
        let name = attribute.name.to_lowercase();
        let value = || attribute.value().map(str::to_string);
        if color.is_none() && name.contains("color") {
            color = value();
        } else if size.is_none() && name.contains("size") {
            size = value();
        } else if gender.is_none() && name.contains("gender") {
            gender = value();
        } else if age_group.is_none() && name.contains("age") {
            age_group = value();
        }
    }

    (color, size, gender, age_group)
}

/// Strip markup from a description
///
/// Block-close tags become newlines, every other tag is dropped, the small
/// entity set the source emits is decoded, and whitespace is collapsed.
pub fn strip_markup(input: &str) -> String {
    let mut text = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '<' {
            text.push(ch);
            continue;
        }
        let mut tag = String::new();
        for inner in chars.by_ref() {
            if inner == '>' {
                break;
            }
            tag.push(inner);
        }
        let normalized: String = tag
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if matches!(normalized.as_str(), "br" | "br/" | "/p" | "/div" | "/li") {
            text.push('\n');
        }
    }

    collapse_whitespace(&decode_entities(&text))
}

fn decode_entities(input: &str) -> String {
    // &amp; decoded last so it cannot manufacture new entities
    input
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collapse horizontal whitespace runs into single spaces and newline runs
/// into single newlines; the result carries no leading or trailing blanks
fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    let mut pending_newline = false;

    for ch in input.chars() {
        if ch == '\n' || ch == '\r' {
            pending_newline = true;
            pending_space = false;
        } else if ch.is_whitespace() {
            pending_space = true;
        } else {
            if pending_newline {
                if !out.is_empty() {
                    out.push('\n');
                }
                pending_newline = false;
                pending_space = false;
            } else if pending_space {
                if !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
            }
            out.push(ch);
        }
    }

    out
}

/// Truncate to a character count without splitting a code point
fn truncate_chars(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((index, _)) => input[..index].to_string(),
        None => input.to_string(),
    }
}
