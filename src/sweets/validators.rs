use rust_decimal::{Decimal, RoundingStrategy};

use super::{
    dto::{CreateSweetRequest, UpdateSweetRequest},
    repo_types::{NewSweet, SweetPatch},
};
use crate::validation::{FieldError, Validate, ValidationResult};

/// Largest price a `NUMERIC(10, 2)` column holds.
fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

fn check_text(result: &mut ValidationResult, field: &str, value: &str) {
    if value.trim().is_empty() {
        result.add_error(field, "must not be empty");
    }
}

fn check_price(result: &mut ValidationResult, price: Decimal) {
    if price < Decimal::ZERO {
        result.add_error("price", "must be greater than or equal to 0");
    } else if round_price(price) > max_price() {
        result.add_error("price", "is too large");
    }
}

fn check_quantity(result: &mut ValidationResult, quantity: i64) {
    if quantity < 0 {
        result.add_error("quantity", "must be greater than or equal to 0");
    } else if quantity > i64::from(i32::MAX) {
        result.add_error("quantity", "is too large");
    }
}

impl Validate for CreateSweetRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        check_text(&mut result, "name", &self.name);
        check_text(&mut result, "category", &self.category);
        check_price(&mut result, self.price);
        check_quantity(&mut result, self.quantity);
        result
    }
}

impl Validate for UpdateSweetRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        if let Some(name) = &self.name {
            check_text(&mut result, "name", name);
        }
        if let Some(category) = &self.category {
            check_text(&mut result, "category", category);
        }
        if let Some(price) = self.price {
            check_price(&mut result, price);
        }
        if let Some(quantity) = self.quantity {
            check_quantity(&mut result, quantity);
        }
        result
    }
}

impl TryFrom<CreateSweetRequest> for NewSweet {
    type Error = Vec<FieldError>;

    fn try_from(req: CreateSweetRequest) -> Result<Self, Self::Error> {
        req.validate().into_result()?;
        Ok(NewSweet {
            name: req.name.trim().to_string(),
            category: req.category.trim().to_string(),
            price: round_price(req.price),
            quantity: req.quantity as i32,
            image_url: req.image_url.filter(|u| !u.trim().is_empty()),
        })
    }
}

impl TryFrom<UpdateSweetRequest> for SweetPatch {
    type Error = Vec<FieldError>;

    fn try_from(req: UpdateSweetRequest) -> Result<Self, Self::Error> {
        req.validate().into_result()?;
        Ok(SweetPatch {
            name: req.name.map(|n| n.trim().to_string()),
            category: req.category.map(|c| c.trim().to_string()),
            price: req.price.map(round_price),
            quantity: req.quantity.map(|q| q as i32),
            image_url: req
                .image_url
                .map(|u| (!u.trim().is_empty()).then_some(u)),
        })
    }
}

/// Cents, half away from zero as NUMERIC rounds.
fn round_price(price: Decimal) -> Decimal {
    price
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Restock amounts must be strictly positive and fit the quantity column.
pub fn validate_restock_amount(amount: i64) -> Result<i32, Vec<FieldError>> {
    let mut result = ValidationResult::new();
    if amount <= 0 {
        result.add_error("quantity", "Restock quantity must be positive");
    } else if amount > i64::from(i32::MAX) {
        result.add_error("quantity", "is too large");
    }
    result.into_result()?;
    Ok(amount as i32)
}
