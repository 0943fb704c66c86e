//! Product record.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId, Record, RecordKind, VersionTag};

/// A product in the catalogue.
///
/// `image_url` is empty until an image has been uploaded to the
/// `product-images` container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    #[serde(rename = "RowKey")]
    pub id: ProductId,
    pub product_name: String,
    pub description: String,
    pub price: Price,
    pub stock_available: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip)]
    pub version: Option<VersionTag>,
}

impl Product {
    /// A new, unsaved product with a fresh row ID.
    #[must_use]
    pub fn new(product_name: String, description: String, price: Price, stock_available: u32) -> Self {
        Self {
            id: ProductId::generate(),
            product_name,
            description,
            price,
            stock_available,
            image_url: None,
            version: None,
        }
    }

    #[must_use]
    pub const fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock_available >= quantity
    }
}

impl Record for Product {
    const KIND: RecordKind = RecordKind::Product;

    fn row_key(&self) -> &str {
        self.id.as_str()
    }

    fn version(&self) -> Option<&VersionTag> {
        self.version.as_ref()
    }

    fn set_version(&mut self, version: Option<VersionTag>) {
        self.version = version;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_omitted_until_set() {
        let mut product = Product::new(
            "Kettle".to_owned(),
            "1.7l".to_owned(),
            Price::parse_lenient("349.99").unwrap(),
            10,
        );
        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("ImageUrl").is_none());
        assert_eq!(json["StockAvailable"], 10);

        product.image_url = Some("https://x/product-images/a.png".to_owned());
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["ImageUrl"], "https://x/product-images/a.png");
    }

    #[test]
    fn test_has_stock_for() {
        let product = Product::new(String::new(), String::new(), Price::ZERO, 3);
        assert!(product.has_stock_for(3));
        assert!(!product.has_stock_for(4));
    }
}
