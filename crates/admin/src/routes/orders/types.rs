//! Form and JSON types for order handlers.

use abc_retailers_core::{Order, OrderStatus, Price};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format used to pre-fill `datetime-local` inputs.
pub const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parse an order date from a form.
///
/// Accepts RFC 3339, `datetime-local` values with or without seconds, and
/// plain dates (midnight UTC). Naive values are taken as UTC.
#[must_use]
pub fn parse_order_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", DATETIME_INPUT_FORMAT, "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Order placement form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderCreateForm {
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub order_date: String,
}

impl OrderCreateForm {
    /// A blank form dated now.
    #[must_use]
    pub fn today() -> Self {
        Self {
            quantity: "1".to_string(),
            order_date: Utc::now().format(DATETIME_INPUT_FORMAT).to_string(),
            ..Self::default()
        }
    }

    /// Quantity and order date, or the message for the first invalid field.
    ///
    /// # Errors
    ///
    /// Returns a message when a selection is missing, the quantity is not a
    /// whole number of at least one, or the date cannot be read.
    pub fn validate(&self) -> Result<(u32, DateTime<Utc>), String> {
        if self.customer_id.trim().is_empty() || self.product_id.trim().is_empty() {
            return Err("Please select a customer and a product.".to_string());
        }
        let quantity = self
            .quantity
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| "Quantity must be at least 1.".to_string())?;
        let order_date = if self.order_date.trim().is_empty() {
            Utc::now()
        } else {
            parse_order_date(&self.order_date)
                .ok_or_else(|| "Order date is not a valid date.".to_string())?
        };
        Ok((quantity, order_date))
    }
}

/// Order edit form input. Every stored field is editable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderEditForm {
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub order_date: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub unit_price: String,
    #[serde(default)]
    pub total_price: String,
    #[serde(default)]
    pub status: String,
}

impl OrderEditForm {
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        Self {
            customer_id: order.customer_id.to_string(),
            username: order.username.clone(),
            product_id: order.product_id.to_string(),
            product_name: order.product_name.clone(),
            order_date: order.order_date.format(DATETIME_INPUT_FORMAT).to_string(),
            quantity: order.quantity.to_string(),
            unit_price: order.unit_price.to_string(),
            total_price: order.total_price.to_string(),
            status: order.status.to_string(),
        }
    }

    /// Copy the submitted fields onto `order`.
    ///
    /// The total is taken as submitted and not recomputed from quantity and
    /// unit price.
    ///
    /// # Errors
    ///
    /// Returns the message for the first invalid field; `order` is left
    /// untouched in that case.
    pub fn apply_to(&self, order: &mut Order) -> Result<(), String> {
        let required = |value: &str, label: &str| {
            let value = value.trim();
            if value.is_empty() {
                Err(format!("{label} is required."))
            } else {
                Ok(value.to_string())
            }
        };

        let customer_id = required(&self.customer_id, "Customer ID")?;
        let username = required(&self.username, "Username")?;
        let product_id = required(&self.product_id, "Product ID")?;
        let product_name = required(&self.product_name, "Product name")?;
        let status = required(&self.status, "Status")?;
        let order_date = parse_order_date(&self.order_date)
            .ok_or_else(|| "Order date is not a valid date.".to_string())?;
        let quantity = self
            .quantity
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| "Quantity must be at least 1.".to_string())?;
        let unit_price = Price::parse_lenient(&self.unit_price)
            .map_err(|_| "Unit price must be a number.".to_string())?;
        let total_price = Price::parse_lenient(&self.total_price)
            .map_err(|_| "Total price must be a number.".to_string())?;

        order.customer_id = customer_id.into();
        order.username = username;
        order.product_id = product_id.into();
        order.product_name = product_name;
        order.order_date = order_date;
        order.quantity = quantity;
        order.unit_price = unit_price;
        order.total_price = total_price;
        order.status = OrderStatus::from(status);
        Ok(())
    }
}

/// Body of `POST /orders/{id}/status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateInput {
    pub new_status: String,
}

/// Reply of `POST /orders/{id}/status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use abc_retailers_core::{Customer, Email, Product};
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse_order_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap();
        assert_eq!(parse_order_date("2024-03-09T14:30"), Some(expected));
        assert_eq!(parse_order_date("2024-03-09T14:30:00"), Some(expected));
        assert_eq!(parse_order_date("2024-03-09T16:30:00+02:00"), Some(expected));
        assert_eq!(
            parse_order_date("2024-03-09"),
            Some(Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_order_date("09/03/2024"), None);
    }

    #[test]
    fn test_create_form_validation() {
        let mut form = OrderCreateForm {
            customer_id: "c-1".to_string(),
            product_id: "p-1".to_string(),
            quantity: "2".to_string(),
            order_date: "2024-03-09".to_string(),
        };
        assert_eq!(form.validate().unwrap().0, 2);

        form.quantity = "0".to_string();
        assert_eq!(form.validate().unwrap_err(), "Quantity must be at least 1.");

        form.quantity = "1".to_string();
        form.product_id = String::new();
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_edit_form_keeps_submitted_total() {
        let customer = Customer::new(
            "Lerato".to_string(),
            "Dlamini".to_string(),
            "leratod".to_string(),
            Email::parse("lerato@example.com").unwrap(),
            "1 Main Rd".to_string(),
        );
        let product = Product::new(
            "Mug".to_string(),
            "Ceramic".to_string(),
            Price::parse_lenient("50").unwrap(),
            5,
        );
        let mut order = Order::place(&customer, &product, 1, Utc::now());

        let mut form = OrderEditForm::from_order(&order);
        form.quantity = "4".to_string();
        form.status = "Shipped".to_string();
        form.apply_to(&mut order).unwrap();

        assert_eq!(order.quantity, 4);
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.total_price, Price::parse_lenient("50").unwrap());
    }

    #[test]
    fn test_edit_form_rejects_bad_input_without_changes() {
        let customer = Customer::new(
            "Lerato".to_string(),
            "Dlamini".to_string(),
            "leratod".to_string(),
            Email::parse("lerato@example.com").unwrap(),
            "1 Main Rd".to_string(),
        );
        let product = Product::new(
            "Mug".to_string(),
            "Ceramic".to_string(),
            Price::parse_lenient("50").unwrap(),
            5,
        );
        let mut order = Order::place(&customer, &product, 1, Utc::now());
        let before = order.clone();

        let mut form = OrderEditForm::from_order(&order);
        form.username = "changed".to_string();
        form.unit_price = "abc".to_string();
        assert_eq!(form.apply_to(&mut order).unwrap_err(), "Unit price must be a number.");
        assert_eq!(order, before);
    }
}
