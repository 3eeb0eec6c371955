//! Domain primitives: Sku, SizeLabel, Platform, ItemStatus.

use serde::{Deserialize, Serialize};

/// Manufacturer style code (e.g., "ASICS-GK20", "DD1391-100").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sku(pub String);

impl Sku {
    /// Create a Sku from a string, trimming surrounding whitespace.
    pub fn new(sku: impl Into<String>) -> Self {
        Sku(sku.into().trim().to_string())
    }

    /// Get the SKU as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the SKU carries no characters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Sku {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shoe size label as printed on the box (e.g., "EU38", "US 9.5").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SizeLabel(pub String);

impl SizeLabel {
    /// Create a SizeLabel from a string, trimming surrounding whitespace.
    pub fn new(size: impl Into<String>) -> Self {
        SizeLabel(size.into().trim().to_string())
    }

    /// Get the size as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the label carries no characters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marketplace identifier, normalized to lowercase (e.g., "stockx", "goat").
///
/// The normalization makes `(platform, external_id)` dedup keys stable no
/// matter how the source spelled the platform name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Platform(String);

impl Platform {
    /// Create a Platform from a marketplace name.
    pub fn new(name: impl Into<String>) -> Self {
        Platform(name.into().trim().to_lowercase())
    }

    /// Get the platform as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the platform carries no characters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inventory item lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Held and available for sale.
    InStock,
    /// Listed on a marketplace, still owned.
    Listed,
    /// Sold through a reconciled order. Terminal.
    Sold,
    /// Returned to the supplier.
    Returned,
}

impl ItemStatus {
    /// Parse a status from its database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_stock" => Some(ItemStatus::InStock),
            "listed" => Some(ItemStatus::Listed),
            "sold" => Some(ItemStatus::Sold),
            "returned" => Some(ItemStatus::Returned),
            _ => None,
        }
    }

    /// Database/string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::InStock => "in_stock",
            ItemStatus::Listed => "listed",
            ItemStatus::Sold => "sold",
            ItemStatus::Returned => "returned",
        }
    }

}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
