//! CSV column contract
//!
//! The column order is a hard external contract with the feed consumer;
//! reordering silently breaks ingestion downstream. Both feed modes and both
//! styles serialize through this one module.

use shared::catalog::CatalogItem;
use shared::error::{AppError, AppResult, ErrorCode};

/// Fixed column order; every row is fully quoted and absent values are empty
/// strings
pub const COLUMNS: [&str; 28] = [
    "id",
    "title",
    "description",
    "rich_text_description",
    "availability",
    "condition",
    "price",
    "link",
    "image_link",
    "brand",
    "image[0].url",
    "image[0].tag[0]",
    "image[1].url",
    "image[1].tag[0]",
    "image[2].url",
    "image[2].tag[0]",
    "image[2].tag[1]",
    "age_group",
    "color",
    "gender",
    "item_group_id",
    "google_product_category",
    "product_type",
    "sale_price",
    "sale_price_effective_date",
    "size",
    "status",
    "inventory",
];

/// Status constant for every emitted row
const STATUS_ACTIVE: &str = "active";

fn image_url(item: &CatalogItem, index: usize) -> String {
    item.images
        .get(index)
        .map(|image| image.url.clone())
        .unwrap_or_default()
}

fn image_tag(item: &CatalogItem, index: usize, tag: usize) -> String {
    item.images
        .get(index)
        .and_then(|image| image.tag.get(tag).cloned())
        .unwrap_or_default()
}

/// One catalog item as an ordered CSV record
pub fn item_record(item: &CatalogItem) -> Vec<String> {
    vec![
        item.id.clone(),
        item.title.clone(),
        item.description.clone(),
        item.rich_text_description.clone(),
        item.availability.as_str().to_string(),
        item.condition.clone(),
        item.price.clone(),
        item.link.clone(),
        item.image_link.clone(),
        item.brand.clone(),
        image_url(item, 0),
        image_tag(item, 0, 0),
        image_url(item, 1),
        image_tag(item, 1, 0),
        image_url(item, 2),
        image_tag(item, 2, 0),
        image_tag(item, 2, 1),
        item.age_group.clone().unwrap_or_default(),
        item.color.clone().unwrap_or_default(),
        item.gender.clone().unwrap_or_default(),
        item.item_group_id.clone().unwrap_or_default(),
        String::new(),
        item.product_type.clone().unwrap_or_default(),
        item.sale_price.clone().unwrap_or_default(),
        String::new(),
        item.size.clone().unwrap_or_default(),
        STATUS_ACTIVE.to_string(),
        item.inventory.map(|i| i.to_string()).unwrap_or_default(),
    ]
}

/// Serialize items into the final CSV artifact (header row included, every
/// field quoted)
pub fn to_csv_string(items: &[CatalogItem]) -> AppResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer
        .write_record(COLUMNS)
        .map_err(|e| AppError::with_message(ErrorCode::CsvError, e.to_string()))?;
    for item in items {
        writer
            .write_record(item_record(item))
            .map_err(|e| AppError::with_message(ErrorCode::CsvError, e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::with_message(ErrorCode::CsvError, e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::with_message(ErrorCode::CsvError, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::catalog::{Availability, CatalogImage};

    fn item() -> CatalogItem {
        CatalogItem {
            id: "wc_42".into(),
            title: "Shirt".into(),
            description: "desc".into(),
            rich_text_description: "desc".into(),
            availability: Availability::InStock,
            condition: "new".into(),
            price: "10.00 BAM".into(),
            sale_price: None,
            link: "https://x/shirt".into(),
            image_link: "https://img/0".into(),
            brand: "CTX".into(),
            item_group_id: None,
            product_type: Some("Shirts".into()),
            inventory: Some(7),
            color: Some("Red".into()),
            size: None,
            gender: None,
            age_group: None,
            images: vec![
                CatalogImage {
                    url: "https://img/0".into(),
                    tag: vec![],
                },
                CatalogImage {
                    url: "https://img/1".into(),
                    tag: vec!["ASPECT_RATIO_4_5_PREFERRED".into()],
                },
                CatalogImage {
                    url: "https://img/2".into(),
                    tag: vec!["STORY_PREFERRED".into(), "REELS_PREFERRED".into()],
                },
            ],
        }
    }

    #[test]
    fn test_record_matches_column_count() {
        assert_eq!(item_record(&item()).len(), COLUMNS.len());
    }

    #[test]
    fn test_golden_header_row() {
        // Hard external contract; do not reorder
        let csv = to_csv_string(&[]).unwrap();
        assert_eq!(
            csv.trim_end(),
            "\"id\",\"title\",\"description\",\"rich_text_description\",\"availability\",\
\"condition\",\"price\",\"link\",\"image_link\",\"brand\",\"image[0].url\",\"image[0].tag[0]\",\
\"image[1].url\",\"image[1].tag[0]\",\"image[2].url\",\"image[2].tag[0]\",\"image[2].tag[1]\",\
\"age_group\",\"color\",\"gender\",\"item_group_id\",\"google_product_category\",\"product_type\",\
\"sale_price\",\"sale_price_effective_date\",\"size\",\"status\",\"inventory\""
        );
    }

    #[test]
    fn test_all_fields_quoted_and_empty_for_absent() {
        let csv = to_csv_string(&[item()]).unwrap();
        let mut lines = csv.lines();
        let _header = lines.next().unwrap();
        let row = lines.next().unwrap();

        assert!(row.starts_with("\"wc_42\",\"Shirt\""));
        // Absent sale_price and item_group_id serialize as quoted empties
        assert!(row.contains("\"\",\"Shirts\",\"\",\"\",\"\",\"active\",\"7\""));
        // Placement tags land in their fixed slots
        assert!(row.contains("\"ASPECT_RATIO_4_5_PREFERRED\""));
        assert!(row.contains("\"STORY_PREFERRED\",\"REELS_PREFERRED\""));
    }
}
