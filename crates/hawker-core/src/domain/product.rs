//! Product descriptors as delivered by the external product store.
//!
//! Products are read-only to this crate: the scheduler looks them up by
//! id when synthesizing a task but never mutates them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Voice-independent hawking mode of a product.
///
/// Only `LowStock` changes generated copy (it forces the clearance
/// closing line); the other variants are carried for the client UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HawkingMode {
    /// Not being hawked.
    #[default]
    Stopped,
    /// Regular rotation.
    Normal,
    /// Well stocked, push volume.
    Abundant,
    /// Nearly sold out, clearance copy.
    LowStock,
    /// Time-limited promotion.
    Promotion,
}

/// A sellable product, fetched by id from the external store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Selling unit, e.g. "斤" or "只".
    #[serde(default)]
    pub unit: String,
    /// Default price; tasks usually carry their own promotional price.
    #[serde(default)]
    pub price: f64,
    /// Category name, consulted by the trait-phrase keyword match.
    #[serde(default)]
    pub category_name: String,
    /// Core physical selling point, e.g. "新鲜现切的".
    #[serde(default)]
    pub marketing_label: Option<String>,
    #[serde(default)]
    pub hawking_mode: HawkingMode,
}

impl Product {
    /// Lowercased string form of the id — the task-table key.
    pub fn key(&self) -> String {
        self.id.to_string().to_lowercase()
    }
}
