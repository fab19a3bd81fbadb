//! Value objects for the catalog

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// URL slug value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl Into<String>) -> Result<Self, SlugError> {
        let value = value.into().trim().to_lowercase();
        if value.is_empty() {
            return Err(SlugError::Empty);
        }
        if value.len() > 100 {
            return Err(SlugError::TooLong);
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(SlugError::InvalidChar);
        }
        Ok(Self(value))
    }

    /// Derives a slug from a display name: lowercased, spaces hyphenated.
    pub fn from_title(title: &str) -> Result<Self, SlugError> {
        Self::new(title.to_lowercase().replace(' ', "-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug is empty")]
    Empty,
    #[error("slug is longer than 100 characters")]
    TooLong,
    #[error("slug may only contain lowercase letters, digits and hyphens")]
    InvalidChar,
}

/// Cart line quantity, at least 1
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 {
            return Err(QuantityError::Zero);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity must be at least 1")]
    Zero,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_normalizes() {
        let slug = Slug::new(" Gaming-Laptops ").unwrap();
        assert_eq!(slug.as_str(), "gaming-laptops");
    }

    #[test]
    fn test_slug_from_title() {
        let slug = Slug::from_title("Gaming Laptops").unwrap();
        assert_eq!(slug.as_str(), "gaming-laptops");
    }

    #[test]
    fn test_slug_rejects_bad_input() {
        assert_eq!(Slug::new("  "), Err(SlugError::Empty));
        assert_eq!(Slug::new("bad/slug"), Err(SlugError::InvalidChar));
        assert_eq!(Slug::new("x".repeat(101)), Err(SlugError::TooLong));
    }

    #[test]
    fn test_quantity_floor() {
        assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
        assert_eq!(Quantity::new(3).unwrap().value(), 3);
    }
}
