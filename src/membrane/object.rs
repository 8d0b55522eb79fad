//! Objects: the typed, valued tokens that membranes hold and rules rewrite.

use serde::{Deserialize, Serialize};

/// Charge carried by spam-leaning objects.
pub const NEGATIVE: i32 = -1;
/// Charge carried by neutral objects.
pub const NEUTRAL: i32 = 0;
/// Charge carried by ham-leaning objects.
pub const POSITIVE: i32 = 1;

/// A computational object inside a membrane.
///
/// Objects are values: rules consume them and emit new ones, so no identity
/// survives a transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// Type tag matched against rule inputs.
    pub kind: String,
    pub value: f64,
    /// Sign carries meaning: +1 ham-leaning, -1 spam-leaning, 0 neutral.
    pub charge: i32,
    /// How easily the object crosses a membrane boundary, in [0, 1].
    pub mobility: f64,
}

impl Object {
    pub fn new(kind: impl Into<String>, value: f64, charge: i32, mobility: f64) -> Self {
        Self {
            kind: kind.into(),
            value,
            charge,
            mobility,
        }
    }

    /// Neutral object with the given mobility.
    pub fn neutral(kind: impl Into<String>, value: f64, mobility: f64) -> Self {
        Self::new(kind, value, NEUTRAL, mobility)
    }

    pub fn is_charged(&self) -> bool {
        self.charge != 0
    }

    pub fn is_spam_leaning(&self) -> bool {
        self.charge < 0
    }

    pub fn is_ham_leaning(&self) -> bool {
        self.charge > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_helpers() {
        let spam = Object::new("negative_signal", 1.5, NEGATIVE, 0.9);
        let ham = Object::new("positive_signal", 1.0, POSITIVE, 0.7);
        let token = Object::neutral("token", 1.0, 0.5);

        assert!(spam.is_charged() && spam.is_spam_leaning() && !spam.is_ham_leaning());
        assert!(ham.is_charged() && ham.is_ham_leaning());
        assert!(!token.is_charged());
    }
}
