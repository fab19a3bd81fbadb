//! Product variants

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Tag identifying which variant table a generic product reference points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Laptop,
    Smartphone,
}

/// Every variant the catalog knows about, in showcase call order.
pub const ALL_KINDS: [ProductKind; 2] = [ProductKind::Laptop, ProductKind::Smartphone];

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Laptop => "laptop",
            ProductKind::Smartphone => "smartphone",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            ProductKind::Laptop => "laptops",
            ProductKind::Smartphone => "smartphones",
        }
    }

    /// Category slug the admin form restricts this variant to.
    pub fn category_slug(&self) -> &'static str {
        match self {
            ProductKind::Laptop => "laptops",
            ProductKind::Smartphone => "smartphones",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProductKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "laptop" => Ok(ProductKind::Laptop),
            "smartphone" => Ok(ProductKind::Smartphone),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown product kind: {0}")]
pub struct UnknownVariant(pub String);

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Laptop {
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub diagonal: String,
    pub display_type: String,
    pub processor_frequency: String,
    pub ram: String,
    pub graphics_card: String,
    pub time_without_charge: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Smartphone {
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub diagonal: String,
    pub display_type: String,
    pub resolution: String,
    pub ram: String,
    pub have_sd: bool,
    pub sd_volume_max: String,
    pub accum_volume: String,
    pub main_cam: String,
    pub frontal_cam: String,
    pub created_at: DateTime<Utc>,
}

/// A resolved product: the tagged union replacing the source's late-bound
/// (content-type, object-id) lookup.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductVariant {
    Laptop(Laptop),
    Smartphone(Smartphone),
}

impl ProductVariant {
    pub fn kind(&self) -> ProductKind {
        match self {
            ProductVariant::Laptop(_) => ProductKind::Laptop,
            ProductVariant::Smartphone(_) => ProductKind::Smartphone,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ProductVariant::Laptop(p) => p.id,
            ProductVariant::Smartphone(p) => p.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ProductVariant::Laptop(p) => &p.title,
            ProductVariant::Smartphone(p) => &p.title,
        }
    }

    pub fn slug(&self) -> &str {
        match self {
            ProductVariant::Laptop(p) => &p.slug,
            ProductVariant::Smartphone(p) => &p.slug,
        }
    }

    pub fn price(&self) -> Decimal {
        match self {
            ProductVariant::Laptop(p) => p.price,
            ProductVariant::Smartphone(p) => p.price,
        }
    }
}

/// One tile on the storefront showcase.
#[derive(Clone, Debug, Serialize)]
pub struct ProductCard {
    pub kind: ProductKind,
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Stable reorder putting `kind`'s cards first. Relative order inside both
/// groups is preserved.
pub fn feature_first(cards: &mut [ProductCard], kind: ProductKind) {
    cards.sort_by_key(|c| c.kind != kind);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(kind: ProductKind, title: &str) -> ProductCard {
        ProductCard {
            kind,
            id: Uuid::new_v4(),
            title: title.into(),
            slug: title.to_lowercase(),
            price: Decimal::new(99999, 2),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in ALL_KINDS {
            assert_eq!(kind.as_str().parse::<ProductKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = "toaster".parse::<ProductKind>().unwrap_err();
        assert_eq!(err, UnknownVariant("toaster".into()));
    }

    #[test]
    fn test_category_slug_per_kind() {
        assert_eq!(ProductKind::Laptop.category_slug(), "laptops");
        assert_eq!(ProductKind::Smartphone.category_slug(), "smartphones");
    }

    #[test]
    fn test_feature_first_is_stable() {
        let mut cards = vec![
            card(ProductKind::Laptop, "L1"),
            card(ProductKind::Laptop, "L2"),
            card(ProductKind::Smartphone, "S1"),
            card(ProductKind::Smartphone, "S2"),
        ];
        feature_first(&mut cards, ProductKind::Smartphone);
        let titles: Vec<&str> = cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["S1", "S2", "L1", "L2"]);
    }

    #[test]
    fn test_feature_first_noop_when_already_first() {
        let mut cards = vec![
            card(ProductKind::Laptop, "L1"),
            card(ProductKind::Smartphone, "S1"),
        ];
        feature_first(&mut cards, ProductKind::Laptop);
        let titles: Vec<&str> = cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["L1", "S1"]);
    }
}
