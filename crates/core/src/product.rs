//! # Product Module
//!
//! Minimal product data needed to quick-create a product from a sales or
//! purchase document: the product, its default variant and the lookup
//! values offered in the creation form.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Stored product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub reference: String,
    pub description: String,
    pub price: Decimal,
    pub family_code: Option<String>,
    pub manufacturer_code: Option<String>,
    pub tax_code: Option<String>,
    pub vat_exception: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Product about to be inserted.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub reference: String,
    pub description: String,
    pub price: Decimal,
    pub family_code: Option<String>,
    pub manufacturer_code: Option<String>,
    pub tax_code: Option<String>,
    pub vat_exception: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewProduct {
    pub fn new(reference: &str, description: &str, price: Decimal) -> Self {
        Self {
            reference: reference.trim().to_string(),
            description: description.to_string(),
            price,
            family_code: None,
            manufacturer_code: None,
            tax_code: None,
            vat_exception: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_family(mut self, code: Option<&str>) -> Self {
        self.family_code = non_blank(code);
        self
    }

    pub fn with_manufacturer(mut self, code: Option<&str>) -> Self {
        self.manufacturer_code = non_blank(code);
        self
    }

    pub fn with_tax(mut self, code: Option<&str>) -> Self {
        self.tax_code = non_blank(code);
        self
    }

    pub fn with_vat_exception(mut self, code: Option<&str>) -> Self {
        self.vat_exception = non_blank(code);
        self
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse a user-entered price. Blank means zero; a comma is accepted as the
/// decimal separator.
pub fn parse_price(input: &str) -> CoreResult<Decimal> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Decimal::ZERO);
    }

    Decimal::from_str(&input.replace(',', "."))
        .map_err(|_| CoreError::InvalidPrice(input.to_string()))
}

/// A `(value, label)` pair offered in a select box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOption {
    pub value: String,
    pub label: String,
}

impl LookupOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// VAT exemption causes accepted on a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VatException {
    /// Exempt under article 20
    Article20,
    /// Exempt under article 21 (exports)
    Article21,
    /// Exempt under article 22 (operations assimilated to exports)
    Article22,
    /// Exempt under articles 23 and 24
    Articles23And24,
    /// Exempt under article 25 (intra-community deliveries)
    Article25,
    /// Other exemptions
    Other,
}

impl VatException {
    pub const ALL: [VatException; 6] = [
        VatException::Article20,
        VatException::Article21,
        VatException::Article22,
        VatException::Articles23And24,
        VatException::Article25,
        VatException::Other,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            VatException::Article20 => "E1",
            VatException::Article21 => "E2",
            VatException::Article22 => "E3",
            VatException::Articles23And24 => "E4",
            VatException::Article25 => "E5",
            VatException::Other => "E6",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VatException::Article20 => "Exempt - article 20",
            VatException::Article21 => "Exempt - article 21",
            VatException::Article22 => "Exempt - article 22",
            VatException::Articles23And24 => "Exempt - articles 23 and 24",
            VatException::Article25 => "Exempt - article 25",
            VatException::Other => "Exempt - other",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }

    /// All exemptions as select options
    pub fn options() -> Vec<LookupOption> {
        Self::ALL
            .iter()
            .map(|e| LookupOption::new(e.code(), e.label()))
            .collect()
    }
}
