use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::list_query::{project_fields, ListQuery, PageMeta};
use crate::db::models::Product;
use crate::db::queries;
use crate::error::AppError;
use crate::validation::{
    sanitize_string, validate_new_product, validate_update_product, NewProduct, UpdateProduct,
};

pub const PRODUCT_COLUMNS: &[&str] = &[
    "id",
    "owner",
    "brand",
    "model",
    "year",
    "price",
    "category",
    "description",
    "quantity",
    "in_stock",
    "image_url",
    "created_at",
    "updated_at",
];

pub const PRODUCT_SEARCHABLE_FIELDS: &[&str] = &["brand", "model", "category"];

#[derive(Clone)]
pub struct ProductService {
    pool: PgPool,
}

impl ProductService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_one(
        &self,
        caller: &AuthUser,
        payload: NewProduct,
    ) -> Result<Product, AppError> {
        validate_new_product(&payload)?;

        let product = Product::new(
            caller.id,
            sanitize_string(&payload.brand),
            sanitize_string(&payload.model),
            payload.year,
            payload.price,
            payload.category,
            sanitize_string(&payload.description),
            payload.quantity,
            payload.image_url,
        );

        Ok(queries::insert_product(&self.pool, &product).await?)
    }

    /// List products through the query builder. An empty result page is a
    /// NotFound, not an empty success.
    pub async fn fetch_all(
        &self,
        query: HashMap<String, String>,
    ) -> Result<(PageMeta, Vec<serde_json::Value>), AppError> {
        let list_query = ListQuery::new("products", PRODUCT_COLUMNS, query)
            .search(PRODUCT_SEARCHABLE_FIELDS)
            .filter()
            .sort()
            .paginate()
            .limit_fields();

        let products: Vec<Product> = list_query.fetch_all(&self.pool).await?;
        let meta = list_query.count_total(&self.pool).await?;

        if products.is_empty() {
            return Err(AppError::NotFound("No product found".to_string()));
        }

        let rows = products
            .iter()
            .map(|product| {
                let row = serde_json::to_value(product)
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                Ok(match list_query.selected_fields() {
                    Some(fields) => project_fields(&row, fields),
                    None => row,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok((meta, rows))
    }

    pub async fn fetch_one(&self, id: Uuid) -> Result<Product, AppError> {
        queries::get_product(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No product found with id: {}", id)))
    }

    pub async fn update_one(
        &self,
        caller: &AuthUser,
        id: Uuid,
        payload: UpdateProduct,
    ) -> Result<Product, AppError> {
        validate_update_product(&payload)?;

        let mut product = queries::get_product(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No product found with id: {}", id)))?;

        if product.owner != caller.id {
            return Err(AppError::Forbidden(
                "You do not have permission to update this product".to_string(),
            ));
        }

        apply_update(&mut product, &payload);
        Ok(queries::update_product(&self.pool, &product).await?)
    }

    pub async fn delete_one(&self, caller: &AuthUser, id: Uuid) -> Result<(), AppError> {
        let product = queries::get_product(&self.pool, id).await?.ok_or_else(|| {
            AppError::NotFound("This product is not found or already deleted".to_string())
        })?;

        if product.owner != caller.id {
            return Err(AppError::Forbidden(
                "You do not have permission to delete this product".to_string(),
            ));
        }

        queries::delete_product(&self.pool, id).await?;
        Ok(())
    }
}

/// Apply the recognized update fields. Quantity changes keep `in_stock`
/// consistent in the same step; owner and id are never touched.
fn apply_update(product: &mut Product, payload: &UpdateProduct) {
    if let Some(brand) = &payload.brand {
        product.brand = brand.clone();
    }
    if let Some(model) = &payload.model {
        product.model = model.clone();
    }
    if let Some(year) = payload.year {
        product.year = year;
    }
    if let Some(price) = &payload.price {
        product.price = price.clone();
    }
    if let Some(category) = &payload.category {
        product.category = category.clone();
    }
    if let Some(description) = &payload.description {
        product.description = description.clone();
    }
    if let Some(quantity) = payload.quantity {
        product.quantity = quantity;
        product.in_stock = quantity > 0;
    }
    if let Some(image_url) = &payload.image_url {
        product.image_url = image_url.clone();
    }
}
