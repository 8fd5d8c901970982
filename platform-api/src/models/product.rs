//! Product model - marketplace listings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Digital,
    Physical,
    Service,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Draft,
    Published,
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Published => "published",
            ProductStatus::Archived => "archived",
        }
    }
}

/// Product document as stored in MongoDB.
///
/// Monetary fields are `Decimal`; the sale window is a pair of optional
/// instants interpreted inclusively by `pricing::current_unit_price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub vendor_id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    pub kind: ProductKind,
    pub status: ProductStatus,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub is_on_sale: bool,
    pub sale_start: Option<mongodb::bson::DateTime>,
    pub sale_end: Option<mongodb::bson::DateTime>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        vendor_id: String,
        title: String,
        description: String,
        category: String,
        kind: ProductKind,
        price: Decimal,
    ) -> Self {
        let slug = slugify(&title);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            vendor_id,
            title,
            slug,
            description,
            category,
            kind,
            status: ProductStatus::Draft,
            price,
            sale_price: None,
            is_on_sale: false,
            sale_start: None,
            sale_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sale window as chrono instants, when both bounds are set.
    pub fn sale_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.sale_start, self.sale_end) {
            (Some(start), Some(end)) => Some((start.to_chrono(), end.to_chrono())),
            _ => None,
        }
    }
}

pub(crate) fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}
