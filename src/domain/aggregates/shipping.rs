//! Shipping profile and courier catalog

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::domain::value_objects::Money;

/// Delivery address captured at the address step. Every field is required.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    #[validate(custom = "not_blank")]
    pub full_name: String,
    #[validate(custom = "not_blank")]
    pub address: String,
    #[validate(custom = "not_blank")]
    pub city: String,
    #[validate(custom = "not_blank")]
    pub zip_code: String,
    #[validate(custom = "not_blank")]
    pub phone_number: String,
}

impl ShippingInfo {
    /// `address, city, zip` as shown on order listings.
    pub fn one_line_address(&self) -> String {
        format!("{}, {}, {}", self.address, self.city, self.zip_code)
    }
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethodId { Jnt, Lbc, Ninja }

/// A courier option offered at the shipping step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub id: ShippingMethodId,
    pub name: String,
    pub duration: String,
    pub fee: Money,
}

impl ShippingMethodId {
    pub const ALL: [ShippingMethodId; 3] = [Self::Jnt, Self::Lbc, Self::Ninja];

    pub fn as_str(&self) -> &'static str {
        match self { Self::Jnt => "jnt", Self::Lbc => "lbc", Self::Ninja => "ninja" }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value)
    }

    pub fn method(&self, currency: &str) -> ShippingMethod {
        let (name, duration, fee) = match self {
            Self::Jnt => ("J&T Express", "2-4 Business Days", 50),
            Self::Lbc => ("LBC Express", "1-3 Business Days", 60),
            Self::Ninja => ("Ninja Van", "3-5 Business Days", 45),
        };
        ShippingMethod { id: *self, name: name.into(), duration: duration.into(), fee: Money::new(Decimal::from(fee), currency) }
    }
}

pub fn shipping_methods(currency: &str) -> Vec<ShippingMethod> {
    ShippingMethodId::ALL.iter().map(|id| id.method(currency)).collect()
}
