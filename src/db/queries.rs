use crate::db::models::{Order, OrderItem, Product, User};
use bigdecimal::BigDecimal;
use sqlx::{PgPool, Postgres, Result, Transaction as SqlxTransaction};
use uuid::Uuid;

// --- Product queries ---

pub async fn insert_product(pool: &PgPool, product: &Product) -> Result<Product> {
    sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (
            id, owner, brand, model, year, price, category,
            description, quantity, in_stock, image_url, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(product.id)
    .bind(product.owner)
    .bind(&product.brand)
    .bind(&product.model)
    .bind(product.year)
    .bind(&product.price)
    .bind(&product.category)
    .bind(&product.description)
    .bind(product.quantity)
    .bind(product.in_stock)
    .bind(&product.image_url)
    .bind(product.created_at)
    .bind(product.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_products_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
}

pub async fn update_product(pool: &PgPool, product: &Product) -> Result<Product> {
    sqlx::query_as::<_, Product>(
        r#"
        UPDATE products SET
            brand = $2, model = $3, year = $4, price = $5, category = $6,
            description = $7, quantity = $8, in_stock = $9, image_url = $10,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(product.id)
    .bind(&product.brand)
    .bind(&product.model)
    .bind(product.year)
    .bind(&product.price)
    .bind(&product.category)
    .bind(&product.description)
    .bind(product.quantity)
    .bind(product.in_stock)
    .bind(&product.image_url)
    .fetch_one(pool)
    .await
}

pub async fn delete_product(pool: &PgPool, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Conditional stock reservation. Decrements only when enough stock remains
/// and keeps `in_stock` consistent with the new quantity in the same
/// statement. Returns false when the guard did not match (insufficient
/// stock), which callers must treat as a conflict and abort the surrounding
/// transaction.
pub async fn decrement_stock(
    executor: &mut SqlxTransaction<'_, Postgres>,
    product_id: Uuid,
    quantity: i32,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity - $2,
            in_stock = quantity - $2 > 0,
            updated_at = NOW()
        WHERE id = $1 AND quantity >= $2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut **executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

// --- Order queries ---

pub async fn insert_order(
    executor: &mut SqlxTransaction<'_, Postgres>,
    order: &Order,
    items: &[OrderItem],
) -> Result<Order> {
    let inserted = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (id, user_id, total_price, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(&order.total_price)
    .bind(&order.status)
    .bind(order.created_at)
    .bind(order.updated_at)
    .fetch_one(&mut **executor)
    .await?;

    for item in items {
        sqlx::query("INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3)")
            .bind(item.order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .execute(&mut **executor)
            .await?;
    }

    Ok(inserted)
}

pub async fn get_order_for_user(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_orders(pool: &PgPool) -> Result<Vec<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn list_orders_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Order>> {
    sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_order_items(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderItem>> {
    sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
        .bind(order_id)
        .fetch_all(pool)
        .await
}

pub async fn update_order_status(pool: &PgPool, id: Uuid, status: &str) -> Result<Option<Order>> {
    sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_optional(pool)
    .await
}

/// Record the gateway's initial checkout response on a freshly created order.
pub async fn set_order_transaction(
    pool: &PgPool,
    order_id: Uuid,
    transaction_id: &str,
    transaction_status: &str,
) -> Result<Option<Order>> {
    sqlx::query_as::<_, Order>(
        r#"
        UPDATE orders
        SET transaction_id = $2, transaction_status = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(transaction_id)
    .bind(transaction_status)
    .fetch_optional(pool)
    .await
}

/// Apply a gateway verification record to the order holding this
/// transaction id. Writes are plain SETs, so re-applying an identical
/// record converges to the same row.
#[allow(clippy::too_many_arguments)]
pub async fn apply_verification(
    pool: &PgPool,
    transaction_id: &str,
    bank_status: &str,
    sp_code: &str,
    sp_message: &str,
    transaction_status: &str,
    payment_method: &str,
    paid_at_text: &str,
    status: &str,
) -> Result<Option<Order>> {
    sqlx::query_as::<_, Order>(
        r#"
        UPDATE orders
        SET bank_status = $2, sp_code = $3, sp_message = $4,
            transaction_status = $5, payment_method = $6, paid_at_text = $7,
            status = $8, updated_at = NOW()
        WHERE transaction_id = $1
        RETURNING *
        "#,
    )
    .bind(transaction_id)
    .bind(bank_status)
    .bind(sp_code)
    .bind(sp_message)
    .bind(transaction_status)
    .bind(payment_method)
    .bind(paid_at_text)
    .bind(status)
    .fetch_optional(pool)
    .await
}

/// Revenue across every order line: unit price (current catalog price, as in
/// the reference aggregation) times ordered quantity.
pub async fn total_revenue(pool: &PgPool) -> Result<BigDecimal> {
    sqlx::query_scalar::<_, BigDecimal>(
        r#"
        SELECT COALESCE(SUM(p.price * oi.quantity), 0)
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        "#,
    )
    .fetch_one(pool)
    .await
}

// --- User queries ---

pub async fn insert_user(pool: &PgPool, user: &User) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, role, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.role)
    .bind(&user.status)
    .bind(user.created_at)
    .bind(user.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_users_with_role(pool: &PgPool, role: &str) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = $1 ORDER BY created_at DESC")
        .bind(role)
        .fetch_all(pool)
        .await
}

pub async fn update_user_status(pool: &PgPool, id: Uuid, status: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_optional(pool)
    .await
}
