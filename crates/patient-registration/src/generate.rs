//! Identifier and pincode generation.

use crate::registration::Pincode;
use rand::Rng;

/// Produces globally unique record identifiers.
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Produces verification codes that callers cannot predict.
#[cfg_attr(test, mockall::automock)]
pub trait PincodeGenerator: Send + Sync {
    fn generate(&self) -> Pincode;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Shortest and longest supported pincodes.
pub const MIN_PINCODE_DIGITS: u32 = 4;
pub const MAX_PINCODE_DIGITS: u32 = 9;

/// Uniform random pincodes with a fixed number of digits.
///
/// Codes never start with a zero, so the emailed number and the number a
/// user types back always have the same length.
#[derive(Debug, Clone, Copy)]
pub struct RandomPincodeGenerator {
    low: u64,
    high: u64,
}

impl RandomPincodeGenerator {
    /// Create a generator for `digits`-long codes, clamped to the supported range.
    pub fn new(digits: u32) -> Self {
        let digits = digits.clamp(MIN_PINCODE_DIGITS, MAX_PINCODE_DIGITS);
        Self {
            low: 10u64.pow(digits - 1),
            high: 10u64.pow(digits) - 1,
        }
    }
}

impl Default for RandomPincodeGenerator {
    fn default() -> Self {
        Self::new(6)
    }
}

impl PincodeGenerator for RandomPincodeGenerator {
    fn generate(&self) -> Pincode {
        let value = rand::thread_rng().gen_range(self.low..=self.high);
        Pincode::new(value).unwrap_or_else(|| unreachable!("pincode range excludes zero"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_generator_unique() {
        let generator = UuidGenerator;
        let ids: HashSet<String> = (0..1000).map(|_| generator.generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_pincode_has_requested_digits() {
        let generator = RandomPincodeGenerator::new(6);
        for _ in 0..1000 {
            let pin = generator.generate().value();
            assert!((100_000..=999_999).contains(&pin));
        }
    }

    #[test]
    fn test_pincode_digits_are_clamped() {
        let short = RandomPincodeGenerator::new(1);
        assert!(short.generate().value() >= 1000);

        let long = RandomPincodeGenerator::new(20);
        assert!(long.generate().value() <= 999_999_999);
    }
}
