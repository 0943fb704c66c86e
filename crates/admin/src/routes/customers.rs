//! Customer route handlers.

use abc_retailers_core::{Customer, Email, RecordKind};
use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::AppError,
    filters,
    middleware::{Flash, push_flash, take_flash},
    state::AppState,
    storage::StorageError,
};

use super::{failure_message, render};

/// Customer form input. Also used to re-render the form after a failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub shipping_address: String,
}

/// Validated customer fields.
#[derive(Debug)]
pub struct CustomerFields {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: Email,
    pub shipping_address: String,
}

impl CustomerForm {
    fn from_customer(customer: &Customer) -> Self {
        Self {
            name: customer.name.clone(),
            surname: customer.surname.clone(),
            username: customer.username.clone(),
            email: customer.email.to_string(),
            shipping_address: customer.shipping_address.clone(),
        }
    }

    /// Check that every field is present and the email is well-formed.
    ///
    /// # Errors
    ///
    /// Returns the message for the first invalid field.
    pub fn validate(&self) -> Result<CustomerFields, String> {
        let required = |value: &str, label: &str| {
            let value = value.trim();
            if value.is_empty() {
                Err(format!("{label} is required."))
            } else {
                Ok(value.to_string())
            }
        };

        let name = required(&self.name, "Name")?;
        let surname = required(&self.surname, "Surname")?;
        let username = required(&self.username, "Username")?;
        required(&self.email, "Email")?;
        let email = Email::parse(&self.email)
            .map_err(|e| format!("Please enter a valid email address ({e})."))?;
        let shipping_address = required(&self.shipping_address, "Shipping address")?;

        Ok(CustomerFields {
            name,
            surname,
            username,
            email,
            shipping_address,
        })
    }
}

/// Customers list page template.
#[derive(Template)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub current_path: String,
    pub flashes: Vec<Flash>,
    pub customers: Vec<Customer>,
}

/// Customer create/edit form template.
#[derive(Template)]
#[template(path = "customers/form.html")]
pub struct CustomerFormTemplate {
    pub current_path: String,
    pub flashes: Vec<Flash>,
    pub heading: String,
    pub action: String,
    pub form: CustomerForm,
    pub error: Option<String>,
}

impl CustomerFormTemplate {
    fn create(form: CustomerForm, error: Option<String>) -> Self {
        Self {
            current_path: "/customers".to_string(),
            flashes: Vec::new(),
            heading: "New Customer".to_string(),
            action: "/customers".to_string(),
            form,
            error,
        }
    }

    fn edit(id: &str, form: CustomerForm, error: Option<String>) -> Self {
        Self {
            current_path: "/customers".to_string(),
            flashes: Vec::new(),
            heading: "Edit Customer".to_string(),
            action: format!("/customers/{id}"),
            form,
            error,
        }
    }
}

/// Customers list page handler.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> Html<String> {
    let mut flashes = take_flash(&session).await;
    let customers = match state.storage().entities().list::<Customer>().await {
        Ok(customers) => customers,
        Err(e) => {
            tracing::error!("Failed to fetch customers: {e}");
            flashes.push(Flash::error("Customers could not be loaded."));
            Vec::new()
        }
    };

    render(&CustomersIndexTemplate {
        current_path: "/customers".to_string(),
        flashes,
        customers,
    })
}

/// New customer form handler.
pub async fn new_form() -> Html<String> {
    render(&CustomerFormTemplate::create(CustomerForm::default(), None))
}

/// Create customer handler.
#[instrument(skip(state, session, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CustomerForm>,
) -> Response {
    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(message) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                render(&CustomerFormTemplate::create(form, Some(message))),
            )
                .into_response();
        }
    };

    let customer = Customer::new(
        fields.name,
        fields.surname,
        fields.username,
        fields.email,
        fields.shipping_address,
    );

    match state.storage().entities().insert(customer).await {
        Ok(customer) => {
            tracing::info!(customer_id = %customer.id, "Customer created");
            push_flash(&session, Flash::success("Customer created successfully.")).await;
            Redirect::to("/customers").into_response()
        }
        Err(e) => {
            let message = failure_message("Error creating customer", &e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                render(&CustomerFormTemplate::create(form, Some(message))),
            )
                .into_response()
        }
    }
}

/// Edit customer form handler.
#[instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let customer = state
        .storage()
        .entities()
        .find::<Customer>(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {id}", RecordKind::Customer)))?;

    Ok(render(&CustomerFormTemplate::edit(
        &id,
        CustomerForm::from_customer(&customer),
        None,
    )))
}

/// Update customer handler.
///
/// Copies the submitted fields onto a fresh read and writes it back with
/// that read's version tag.
#[instrument(skip(state, session, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<CustomerForm>,
) -> Result<Response, AppError> {
    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(message) => {
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                render(&CustomerFormTemplate::edit(&id, form, Some(message))),
            )
                .into_response());
        }
    };

    let entities = state.storage().entities();
    let mut customer = entities
        .find::<Customer>(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {id}", RecordKind::Customer)))?;

    customer.name = fields.name;
    customer.surname = fields.surname;
    customer.username = fields.username;
    customer.email = fields.email;
    customer.shipping_address = fields.shipping_address;

    match entities.update(customer).await {
        Ok(_) => {
            push_flash(&session, Flash::success("Customer updated successfully.")).await;
            Ok(Redirect::to("/customers").into_response())
        }
        Err(e) => {
            let status = if matches!(e, StorageError::ConcurrencyConflict) {
                StatusCode::CONFLICT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            let message = failure_message("Error updating customer", &e);
            Ok((
                status,
                render(&CustomerFormTemplate::edit(&id, form, Some(message))),
            )
                .into_response())
        }
    }
}

/// Delete customer handler.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Redirect {
    let flash = match state
        .storage()
        .entities()
        .delete::<Customer>(RecordKind::Customer.partition_key(), &id)
        .await
    {
        Ok(()) => Flash::success("Customer deleted successfully."),
        Err(e) => Flash::error(failure_message("Error deleting customer", &e)),
    };
    push_flash(&session, flash).await;
    Redirect::to("/customers")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> CustomerForm {
        CustomerForm {
            name: " Thabo ".to_string(),
            surname: "Mokoena".to_string(),
            username: "thabom".to_string(),
            email: "thabo@example.com".to_string(),
            shipping_address: "12 Long St, Cape Town".to_string(),
        }
    }

    #[test]
    fn test_validate_trims_fields() {
        let fields = form().validate().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(fields.name, "Thabo");
        assert_eq!(fields.email.as_str(), "thabo@example.com");
    }

    #[test]
    fn test_validate_requires_every_field() {
        let mut missing = form();
        missing.surname = "   ".to_string();
        assert_eq!(missing.validate().unwrap_err(), "Surname is required.");

        let mut missing = form();
        missing.shipping_address = String::new();
        assert_eq!(
            missing.validate().unwrap_err(),
            "Shipping address is required."
        );
    }

    #[test]
    fn test_validate_rejects_malformed_email() {
        let mut bad = form();
        bad.email = "thabo.example.com".to_string();
        assert!(
            bad.validate()
                .unwrap_err()
                .starts_with("Please enter a valid email address")
        );
    }
}
