//! Specification tables
//!
//! Maps a resolved product variant to the ordered (label, value) rows shown
//! on its detail page. Each variant has one fixed field map; row order is
//! declaration order.

use serde::Serialize;
use thiserror::Error;

use crate::domain::aggregates::product::ProductVariant;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SpecRow {
    pub label: &'static str,
    pub value: String,
}

pub const LAPTOP_LABELS: &[&str] = &[
    "Diagonal",
    "Display type",
    "Processor frequency",
    "RAM",
    "Graphics card",
    "Battery life",
];

pub const SMARTPHONE_LABELS: &[&str] = &[
    "Diagonal",
    "Display type",
    "Resolution",
    "RAM",
    "SD card support",
    "Max SD card volume",
    "Battery capacity",
    "Main camera",
    "Front camera",
];

/// Field template for a raw variant tag, for admin form building. Tags with
/// no spec table are rejected.
pub fn labels(tag: &str) -> Result<&'static [&'static str], UnsupportedVariant> {
    match tag {
        "laptop" => Ok(LAPTOP_LABELS),
        "smartphone" => Ok(SMARTPHONE_LABELS),
        other => Err(UnsupportedVariant(other.to_string())),
    }
}

/// Ordered specification rows for a resolved variant.
pub fn rows(variant: &ProductVariant) -> Vec<SpecRow> {
    match variant {
        ProductVariant::Laptop(p) => vec![
            row("Diagonal", &p.diagonal),
            row("Display type", &p.display_type),
            row("Processor frequency", &p.processor_frequency),
            row("RAM", &p.ram),
            row("Graphics card", &p.graphics_card),
            row("Battery life", &p.time_without_charge),
        ],
        ProductVariant::Smartphone(p) => vec![
            row("Diagonal", &p.diagonal),
            row("Display type", &p.display_type),
            row("Resolution", &p.resolution),
            row("RAM", &p.ram),
            row("SD card support", yes_no(p.have_sd)),
            row("Max SD card volume", &p.sd_volume_max),
            row("Battery capacity", &p.accum_volume),
            row("Main camera", &p.main_cam),
            row("Front camera", &p.frontal_cam),
        ],
    }
}

fn row(label: &'static str, value: impl Into<String>) -> SpecRow {
    SpecRow {
        label,
        value: value.into(),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no specification table for product kind: {0}")]
pub struct UnsupportedVariant(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::{Laptop, Smartphone};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn laptop() -> ProductVariant {
        ProductVariant::Laptop(Laptop {
            id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            title: "Zenbook 14".into(),
            slug: "zenbook-14".into(),
            description: None,
            price: Decimal::new(119900, 2),
            diagonal: "14\"".into(),
            display_type: "OLED".into(),
            processor_frequency: "3.6 GHz".into(),
            ram: "16 GB".into(),
            graphics_card: "Iris Xe".into(),
            time_without_charge: "10 h".into(),
            created_at: Utc::now(),
        })
    }

    fn smartphone(have_sd: bool) -> ProductVariant {
        ProductVariant::Smartphone(Smartphone {
            id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            title: "Pixel 9".into(),
            slug: "pixel-9".into(),
            description: None,
            price: Decimal::new(79900, 2),
            diagonal: "6.3\"".into(),
            display_type: "AMOLED".into(),
            resolution: "2424x1080".into(),
            ram: "12 GB".into(),
            have_sd,
            sd_volume_max: "512 GB".into(),
            accum_volume: "4700 mAh".into(),
            main_cam: "50 MP".into(),
            frontal_cam: "10.5 MP".into(),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn test_laptop_row_order() {
        let values: Vec<String> = rows(&laptop()).into_iter().map(|r| r.value).collect();
        assert_eq!(values, ["14\"", "OLED", "3.6 GHz", "16 GB", "Iris Xe", "10 h"]);
    }

    #[test]
    fn test_rows_match_label_template() {
        for (variant, tag) in [(laptop(), "laptop"), (smartphone(true), "smartphone")] {
            let row_labels: Vec<&str> = rows(&variant).into_iter().map(|r| r.label).collect();
            assert_eq!(row_labels, labels(tag).unwrap());
        }
    }

    #[test]
    fn test_sd_support_rendered_as_words() {
        assert_eq!(rows(&smartphone(true))[4].value, "yes");
        assert_eq!(rows(&smartphone(false))[4].value, "no");
    }

    #[test]
    fn test_unsupported_tag() {
        assert_eq!(labels("toaster"), Err(UnsupportedVariant("toaster".into())));
    }
}
