//! Product route handlers.
//!
//! Product forms are multipart so an image can be uploaded alongside the
//! fields. Images go to the public `product-images` container under a random
//! name, and the product stores the resulting URL.

use abc_retailers_core::{ObjectNaming, Price, Product, RecordKind, Visibility};
use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::AppError,
    filters,
    middleware::{Flash, push_flash, take_flash},
    state::AppState,
    storage::{PRODUCT_IMAGES_CONTAINER, StorageError},
};

use super::{UploadedFile, failure_message, multipart_error, render};

/// Product form input. Numeric fields are kept as text so the form can be
/// re-rendered exactly as submitted.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub product_name: String,
    pub description: String,
    pub price: String,
    pub stock_available: String,
}

/// Validated product fields.
#[derive(Debug)]
pub struct ProductFields {
    pub product_name: String,
    pub description: String,
    pub price: Price,
    pub stock_available: u32,
}

impl ProductForm {
    fn from_product(product: &Product) -> Self {
        Self {
            product_name: product.product_name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            stock_available: product.stock_available.to_string(),
        }
    }

    /// Read the form fields and the optional `image` file.
    async fn read(mut multipart: Multipart) -> Result<(Self, Option<UploadedFile>), AppError> {
        let mut form = Self::default();
        let mut image = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                image = UploadedFile::read(field).await?;
                continue;
            }

            let value = field.text().await.map_err(multipart_error)?;
            match name.as_str() {
                "product_name" => form.product_name = value,
                "description" => form.description = value,
                "price" => form.price = value,
                "stock_available" => form.stock_available = value,
                _ => {}
            }
        }

        Ok((form, image))
    }

    /// Check the fields. The price is parsed leniently and must be positive.
    ///
    /// # Errors
    ///
    /// Returns the message for the first invalid field.
    pub fn validate(&self) -> Result<ProductFields, String> {
        let product_name = self.product_name.trim();
        if product_name.is_empty() {
            return Err("Product name is required.".to_string());
        }

        let description = self.description.trim();
        if description.is_empty() {
            return Err("Description is required.".to_string());
        }

        let price = Price::parse_lenient(&self.price)
            .ok()
            .filter(Price::is_positive)
            .ok_or_else(|| "Price must be a positive number.".to_string())?;

        let stock_available = self
            .stock_available
            .trim()
            .parse::<u32>()
            .map_err(|_| "Stock available must be a whole number of zero or more.".to_string())?;

        Ok(ProductFields {
            product_name: product_name.to_string(),
            description: description.to_string(),
            price,
            stock_available,
        })
    }
}

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub current_path: String,
    pub flashes: Vec<Flash>,
    pub products: Vec<Product>,
}

/// Product create/edit form template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub current_path: String,
    pub flashes: Vec<Flash>,
    pub heading: String,
    pub action: String,
    pub form: ProductForm,
    pub image_url: Option<String>,
    pub error: Option<String>,
}

impl ProductFormTemplate {
    fn create(form: ProductForm, error: Option<String>) -> Self {
        Self {
            current_path: "/products".to_string(),
            flashes: Vec::new(),
            heading: "New Product".to_string(),
            action: "/products".to_string(),
            form,
            image_url: None,
            error,
        }
    }

    fn edit(id: &str, form: ProductForm, image_url: Option<String>, error: Option<String>) -> Self {
        Self {
            current_path: "/products".to_string(),
            flashes: Vec::new(),
            heading: "Edit Product".to_string(),
            action: format!("/products/{id}"),
            form,
            image_url,
            error,
        }
    }
}

/// Upload a product image and return its public URL.
async fn upload_image(state: &AppState, image: UploadedFile) -> Result<String, StorageError> {
    let stored = state
        .storage()
        .objects()
        .put_object(
            PRODUCT_IMAGES_CONTAINER,
            image.content,
            &image.filename,
            Visibility::PublicRead,
            ObjectNaming::RandomId,
        )
        .await?;
    Ok(stored.url)
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("{} {id}", RecordKind::Product))
}

/// Products list page handler.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> Html<String> {
    let mut flashes = take_flash(&session).await;
    let products = match state.storage().entities().list::<Product>().await {
        Ok(products) => products,
        Err(e) => {
            tracing::error!("Failed to fetch products: {e}");
            flashes.push(Flash::error("Products could not be loaded."));
            Vec::new()
        }
    };

    render(&ProductsIndexTemplate {
        current_path: "/products".to_string(),
        flashes,
        products,
    })
}

/// New product form handler.
pub async fn new_form() -> Html<String> {
    render(&ProductFormTemplate::create(ProductForm::default(), None))
}

/// Create product handler.
#[instrument(skip(state, session, multipart))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (form, image) = ProductForm::read(multipart).await?;
    tracing::debug!(price = %form.price, "Product form received");

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(message) => {
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                render(&ProductFormTemplate::create(form, Some(message))),
            )
                .into_response());
        }
    };

    let mut product = Product::new(
        fields.product_name,
        fields.description,
        fields.price,
        fields.stock_available,
    );

    let result: Result<Product, StorageError> = async {
        if let Some(image) = image {
            product.image_url = Some(upload_image(&state, image).await?);
        }
        state.storage().entities().insert(product).await
    }
    .await;

    match result {
        Ok(product) => {
            tracing::info!(product_id = %product.id, price = %product.price, "Product created");
            let message = format!(
                "Product '{}' created successfully with price {}.",
                product.product_name, product.price
            );
            push_flash(&session, Flash::success(message)).await;
            Ok(Redirect::to("/products").into_response())
        }
        Err(e) => {
            let message = failure_message("An error occurred while creating the product", &e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                render(&ProductFormTemplate::create(form, Some(message))),
            )
                .into_response())
        }
    }
}

/// Edit product form handler.
#[instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let product = state
        .storage()
        .entities()
        .find::<Product>(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    Ok(render(&ProductFormTemplate::edit(
        &id,
        ProductForm::from_product(&product),
        product.image_url.clone(),
        None,
    )))
}

/// Update product handler.
///
/// Copies the submitted fields onto a fresh read. A new image replaces the
/// stored URL; without one the existing image is kept.
#[instrument(skip(state, session, multipart))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (form, image) = ProductForm::read(multipart).await?;

    let entities = state.storage().entities();
    let mut product = entities
        .find::<Product>(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(message) => {
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                render(&ProductFormTemplate::edit(
                    &id,
                    form,
                    product.image_url,
                    Some(message),
                )),
            )
                .into_response());
        }
    };

    let current_image = product.image_url.clone();
    product.product_name = fields.product_name;
    product.description = fields.description;
    product.price = fields.price;
    product.stock_available = fields.stock_available;

    let result: Result<Product, StorageError> = async {
        if let Some(image) = image {
            product.image_url = Some(upload_image(&state, image).await?);
        }
        entities.update(product).await
    }
    .await;

    match result {
        Ok(product) => {
            let message = format!(
                "Product '{}' has been updated successfully.",
                product.product_name
            );
            push_flash(&session, Flash::success(message)).await;
            Ok(Redirect::to("/products").into_response())
        }
        Err(e) => {
            let status = if matches!(e, StorageError::ConcurrencyConflict) {
                StatusCode::CONFLICT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            let message = failure_message("An error occurred while updating the product", &e);
            Ok((
                status,
                render(&ProductFormTemplate::edit(&id, form, current_image, Some(message))),
            )
                .into_response())
        }
    }
}

/// Delete product handler.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Redirect {
    let flash = match state
        .storage()
        .entities()
        .delete::<Product>(RecordKind::Product.partition_key(), &id)
        .await
    {
        Ok(()) => Flash::success("Product deleted successfully."),
        Err(e) => Flash::error(failure_message(
            "An error occurred while deleting the product",
            &e,
        )),
    };
    push_flash(&session, flash).await;
    Redirect::to("/products")
}
