//! Cart line items and the product attributes captured when adding them.

use serde::{Deserialize, Serialize};

use super::{Money, ProductId};

/// One product's quantity and display attributes within a cart.
///
/// Display fields are denormalized copies taken when the line was added, so
/// the cart can render without a catalog lookup. Field names follow the
/// backend's camelCase JSON, which is also the durable cache format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product identifier, unique within a cart.
    pub product_id: ProductId,
    /// Product display name.
    #[serde(default)]
    pub product_name: String,
    /// List price per unit. The backend calls this `price`.
    #[serde(default, alias = "price")]
    pub unit_price: Money,
    /// Discounted price per unit; totals are computed from this.
    #[serde(default)]
    pub special_price: Money,
    /// Number of units, always at least 1 for a stored line.
    pub quantity: u32,
    /// Product image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Product description.
    #[serde(default)]
    pub description: Option<String>,
    /// Discount percentage reported by the backend, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Money>,
}

impl CartLine {
    /// Price of this line (`special_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.special_price * self.quantity
    }
}

/// Product attributes supplied by the caller when adding to the cart.
///
/// `quantity` is the product card's stock figure, not a cart quantity. It is
/// only consulted when the catalog snapshot has no entry for the product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMeta {
    #[serde(default)]
    pub product_name: String,
    #[serde(default, alias = "price")]
    pub unit_price: Money,
    #[serde(default)]
    pub special_price: Money,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub discount: Option<Money>,
    /// Stock hint from the product listing.
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl ProductMeta {
    /// Build a cart line for `product_id` at `quantity` from these attributes.
    #[must_use]
    pub fn to_line(&self, product_id: ProductId, quantity: u32) -> CartLine {
        CartLine {
            product_id,
            product_name: self.product_name.clone(),
            unit_price: self.unit_price,
            special_price: self.special_price,
            quantity,
            image: self.image.clone(),
            description: self.description.clone(),
            discount: self.discount,
        }
    }
}

impl From<&CartLine> for ProductMeta {
    /// Recover the display attributes of an existing line. The stock hint is
    /// unknown at this point and left empty.
    fn from(line: &CartLine) -> Self {
        Self {
            product_name: line.product_name.clone(),
            unit_price: line.unit_price,
            special_price: line.special_price,
            image: line.image.clone(),
            description: line.description.clone(),
            discount: line.discount,
            quantity: None,
        }
    }
}
