//! Status enums for orders and accounts.

use serde::{Deserialize, Serialize};

/// Order lifecycle status, as stored by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Wire representation (e.g. `PENDING`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Customer,
    Admin,
}

impl UserRole {
    /// Wire representation (e.g. `ADMIN`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Admin => "ADMIN",
        }
    }

    /// Whether the account may use the admin endpoints.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Outcome of verifying a payment reference with the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// The provider confirmed the charge.
    Success,
    /// Anything else: abandoned, declined, or still pending.
    Failed,
}

impl PaymentStatus {
    /// Interpret the envelope status string returned by the verify endpoint.
    ///
    /// Only an exact `"Success"` counts as paid. The lowercase `"success"`
    /// every other envelope carries only means the request was handled.
    #[must_use]
    pub fn from_envelope_status(status: &str) -> Self {
        if status == "Success" {
            Self::Success
        } else {
            Self::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
    }

    #[test]
    fn test_payment_status_from_envelope() {
        assert_eq!(
            PaymentStatus::from_envelope_status("Success"),
            PaymentStatus::Success
        );
        assert_eq!(
            PaymentStatus::from_envelope_status("fail"),
            PaymentStatus::Failed
        );
    }

    #[test]
    fn test_lowercase_envelope_success_is_not_paid() {
        assert_eq!(
            PaymentStatus::from_envelope_status("success"),
            PaymentStatus::Failed
        );
        assert_eq!(
            PaymentStatus::from_envelope_status("SUCCESS"),
            PaymentStatus::Failed
        );
    }

    #[test]
    fn test_user_role_wire_format() {
        let role: UserRole = serde_json::from_str("\"ADMIN\"").unwrap();
        assert!(role.is_admin());
        assert_eq!(UserRole::Customer.to_string(), "CUSTOMER");
        assert!(!UserRole::default().is_admin());
    }
}
