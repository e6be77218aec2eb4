use serde::{Deserialize, Serialize};

use crate::error::SafiriError;

pub const DEFAULT_MIN_QUANTITY: i32 = 1;
pub const DEFAULT_MAX_QUANTITY: i32 = 1000;

/// Tunables for the USSD menu. Quantities are counted in bags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UssdSettings {
    pub min_quantity: i32,
    pub max_quantity: i32,
}

impl Default for UssdSettings {
    fn default() -> Self {
        Self {
            min_quantity: DEFAULT_MIN_QUANTITY,
            max_quantity: DEFAULT_MAX_QUANTITY,
        }
    }
}

impl UssdSettings {
    pub fn validate(&self) -> Result<(), SafiriError> {
        if self.min_quantity < 1 {
            return Err(SafiriError::InvalidInput(format!(
                "min_quantity must be at least 1, got {}",
                self.min_quantity
            )));
        }
        if self.min_quantity > self.max_quantity {
            return Err(SafiriError::InvalidInput(format!(
                "min_quantity {} exceeds max_quantity {}",
                self.min_quantity, self.max_quantity
            )));
        }
        Ok(())
    }

    pub fn quantity_in_bounds(&self, quantity: i32) -> bool {
        (self.min_quantity..=self.max_quantity).contains(&quantity)
    }
}
