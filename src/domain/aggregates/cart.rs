//! Cart lines and derived totals

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// One stored cart line. `kind` + `product_id` form the generic reference
/// into the variant tables; `total_price` is unit price times quantity and
/// is rewritten on every mutation.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: Uuid,
    pub kind: String,
    pub product_id: Uuid,
    pub quantity: i32,
    pub total_price: Decimal,
}

/// Cached cart aggregates, always recomputed from the lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CartTotals {
    pub total_products: i32,
    pub final_price: Decimal,
}

impl CartTotals {
    pub fn compute(lines: &[CartLine]) -> Self {
        Self {
            total_products: lines.len() as i32,
            final_price: lines.iter().map(|l| l.total_price).sum(),
        }
    }
}

pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart item not found")]
    ItemNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i32, total_price: Decimal) -> CartLine {
        CartLine {
            id: Uuid::new_v4(),
            kind: "laptop".into(),
            product_id: Uuid::new_v4(),
            quantity,
            total_price,
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(Decimal::new(1050, 2), 3), Decimal::new(3150, 2));
    }

    #[test]
    fn test_totals_over_lines() {
        let lines = vec![
            line(2, Decimal::new(2100, 2)),
            line(1, Decimal::new(49999, 2)),
        ];
        let totals = CartTotals::compute(&lines);
        assert_eq!(totals.total_products, 2);
        assert_eq!(totals.final_price, Decimal::new(52099, 2));
    }

    #[test]
    fn test_totals_of_empty_cart() {
        let totals = CartTotals::compute(&[]);
        assert_eq!(totals.total_products, 0);
        assert_eq!(totals.final_price, Decimal::ZERO);
    }
}
