//! Order status.
//!
//! The status set is open: orders start as `Submitted` and operators may move
//! them to any value. The well-known values are offered in the UI; anything
//! else round-trips unchanged through [`OrderStatus::Other`].

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    #[default]
    Submitted,
    Processing,
    Shipped,
    Completed,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    /// Statuses offered in the order screens.
    pub const KNOWN: [Self; 5] = [
        Self::Submitted,
        Self::Processing,
        Self::Shipped,
        Self::Completed,
        Self::Cancelled,
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Submitted => "Submitted",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        match value.trim() {
            "Submitted" => Self::Submitted,
            "Processing" => Self::Processing,
            "Shipped" => Self::Shipped,
            "Completed" => Self::Completed,
            "Cancelled" => Self::Cancelled,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(value) => value,
            known => known.as_str().to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values_round_trip() {
        for status in OrderStatus::KNOWN {
            assert_eq!(OrderStatus::from(status.as_str()), status);
        }
    }

    #[test]
    fn test_operator_values_are_preserved() {
        let status = OrderStatus::from("Awaiting pickup");
        assert_eq!(status, OrderStatus::Other("Awaiting pickup".to_owned()));
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            "\"Awaiting pickup\""
        );
    }

    #[test]
    fn test_default_is_submitted() {
        assert_eq!(OrderStatus::default().to_string(), "Submitted");
    }
}
