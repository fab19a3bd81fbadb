//! Aggregates module
pub mod cart;
pub mod product;

pub use cart::{CartError, CartLine, CartTotals};
pub use product::{Laptop, ProductCard, ProductKind, ProductVariant, Smartphone, UnknownVariant};
