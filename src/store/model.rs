//! Product records as stored in and read from the `products` table.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Image used for products created without an upload
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/800x600?text=Product+Image";

/// A stored catalog product
///
/// Serialized with the camelCase field names the JSON API exposes
/// (`productName`, `imageURL`, `from`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub product_name: String,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    /// Origin or brand
    #[serde(rename = "from")]
    pub origin: String,
    pub specifications: Option<String>,
    pub quantity: String,
    pub price: BigDecimal,
    pub energy_savings: String,
    pub description: String,
    pub eco: bool,
    pub created_at: DateTime<Utc>,
}

/// Product attributes supplied on insert or update
///
/// `id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub product_name: String,
    #[serde(rename = "imageURL", alias = "image", default)]
    pub image_url: Option<String>,
    #[serde(rename = "from")]
    pub origin: String,
    #[serde(default)]
    pub specifications: Option<String>,
    pub quantity: String,
    pub price: BigDecimal,
    #[serde(default)]
    pub energy_savings: String,
    pub description: String,
    #[serde(default = "default_eco")]
    pub eco: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_eco() -> bool {
    true
}

impl NewProduct {
    /// Image URL to persist, falling back to the placeholder
    pub fn image_url_or_placeholder(&self) -> &str {
        self.image_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE_URL)
    }

    /// Build the stored record for this product
    #[cfg(test)]
    pub fn into_product(self, id: i64, created_at: DateTime<Utc>) -> Product {
        let image_url = Some(self.image_url_or_placeholder().to_string());
        Product {
            id,
            product_name: self.product_name,
            image_url,
            origin: self.origin,
            specifications: self.specifications,
            quantity: self.quantity,
            price: self.price,
            energy_savings: self.energy_savings,
            description: self.description,
            eco: self.eco,
            created_at,
        }
    }
}
