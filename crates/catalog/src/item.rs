use serde::{Deserialize, Serialize};

use rxstock_core::{DomainError, DomainResult, ItemId};

/// Therapeutic category of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Analgesic,
    Antibiotic,
    Antihistamine,
    Cardiovascular,
    Dermatological,
    Gastrointestinal,
    Respiratory,
    Vitamin,
    Other,
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Category::Analgesic => "analgesic",
            Category::Antibiotic => "antibiotic",
            Category::Antihistamine => "antihistamine",
            Category::Cardiovascular => "cardiovascular",
            Category::Dermatological => "dermatological",
            Category::Gastrointestinal => "gastrointestinal",
            Category::Respiratory => "respiratory",
            Category::Vitamin => "vitamin",
            Category::Other => "other",
        };
        f.write_str(s)
    }
}

/// Dispensing unit of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitOfMeasure {
    Tablet,
    Capsule,
    Vial,
    Ampoule,
    Bottle,
    Tube,
    Unit,
}

/// Catalog item.
///
/// Referenced by movements and order lines; the catalog owns it. Unit cost
/// is in minor currency units (cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    name: String,
    category: Category,
    unit_cost: u64,
    minimum_threshold: i64,
    unit: UnitOfMeasure,
}

impl Item {
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        category: Category,
        unit_cost: u64,
        minimum_threshold: i64,
        unit: UnitOfMeasure,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if minimum_threshold < 0 {
            return Err(DomainError::validation(
                "minimum threshold cannot be negative",
            ));
        }
        Ok(Self {
            id,
            name,
            category,
            unit_cost,
            minimum_threshold,
            unit,
        })
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn unit_cost(&self) -> u64 {
        self.unit_cost
    }

    pub fn minimum_threshold(&self) -> i64 {
        self.minimum_threshold
    }

    pub fn unit(&self) -> UnitOfMeasure {
        self.unit
    }
}
