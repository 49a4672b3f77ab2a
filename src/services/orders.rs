use bigdecimal::BigDecimal;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::models::{Order, OrderItem, OrderStatus, Product};
use crate::db::queries;
use crate::error::AppError;
use crate::payment::{CheckoutRequest, PaymentClient, VerificationRecord};
use crate::validation::{
    validate_order_request, validate_order_status, OrderLine, OrderRequest, UpdateOrderStatus,
};

pub const ORDER_CURRENCY: &str = "BDT";

// Customer contact fields the gateway requires but the user record does not
// carry yet; mirrors the reference checkout payload.
const CUSTOMER_PHONE: &str = "0123456789";
const CUSTOMER_ADDRESS: &str = "BD, Dhaka";
const CUSTOMER_CITY: &str = "Dhaka";

/// Validated order lines plus the price snapshot taken at planning time.
#[derive(Debug)]
struct OrderPlan {
    lines: Vec<(Uuid, i32)>,
    total_price: BigDecimal,
}

/// Check every requested line against the loaded products and price the
/// order from the prices as read. Performs no writes.
fn plan_order(requested: &[OrderLine], products: &[Product]) -> Result<OrderPlan, AppError> {
    if requested.is_empty() {
        return Err(AppError::Validation("Order not specified".to_string()));
    }

    let by_id: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let mut lines = Vec::with_capacity(requested.len());
    let mut total_price = BigDecimal::from(0);

    for line in requested {
        let product = by_id.get(&line.product).ok_or_else(|| {
            AppError::NotFound(format!("Product with id {} does not exist", line.product))
        })?;

        if !product.in_stock {
            return Err(AppError::Conflict(format!(
                "Product with id {} is out of stock",
                line.product
            )));
        }

        if product.quantity < line.quantity {
            return Err(AppError::Conflict(format!(
                "Insufficient product available. Requested: {}, Available: {}",
                line.quantity, product.quantity
            )));
        }

        total_price += product.price.clone() * BigDecimal::from(line.quantity);
        lines.push((product.id, line.quantity));
    }

    Ok(OrderPlan { lines, total_price })
}

#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    gateway: PaymentClient,
}

impl OrderService {
    pub fn new(pool: PgPool, gateway: PaymentClient) -> Self {
        Self { pool, gateway }
    }

    /// Reserve inventory, persist the order and hand off to the payment
    /// gateway. Returns the checkout URL the caller should redirect to.
    ///
    /// The stock decrement and the order insert commit together; each
    /// decrement re-checks availability, so a concurrent order that drains
    /// stock between the read and the write surfaces as a conflict instead
    /// of negative inventory. The gateway round trip happens after the
    /// commit and is not rolled back on gateway failure: the order stays
    /// Pending with its stock reserved.
    pub async fn create_order(
        &self,
        caller: &AuthUser,
        payload: OrderRequest,
        client_ip: &str,
    ) -> Result<String, AppError> {
        if payload.products.is_empty() {
            return Err(AppError::Validation("Order not specified".to_string()));
        }
        validate_order_request(&payload)?;

        let ids: Vec<Uuid> = payload.products.iter().map(|line| line.product).collect();
        let products = queries::get_products_by_ids(&self.pool, &ids).await?;
        let plan = plan_order(&payload.products, &products)?;

        let order = Order::new(caller.id, plan.total_price.clone());
        let items: Vec<OrderItem> = plan
            .lines
            .iter()
            .map(|(product_id, quantity)| OrderItem {
                order_id: order.id,
                product_id: *product_id,
                quantity: *quantity,
            })
            .collect();

        let mut tx = self.pool.begin().await?;
        for item in &items {
            let applied = queries::decrement_stock(&mut tx, item.product_id, item.quantity).await?;
            if !applied {
                tx.rollback().await?;
                return Err(AppError::Conflict(format!(
                    "Insufficient stock for product {}",
                    item.product_id
                )));
            }
        }
        let order = queries::insert_order(&mut tx, &order, &items).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %caller.id,
            total_price = %order.total_price,
            "order created"
        );

        let checkout = self
            .gateway
            .create_checkout(&CheckoutRequest {
                amount: order.total_price.clone(),
                order_id: order.id.to_string(),
                currency: ORDER_CURRENCY.to_string(),
                customer_name: caller.name.clone(),
                customer_email: caller.email.clone(),
                customer_phone: CUSTOMER_PHONE.to_string(),
                customer_address: CUSTOMER_ADDRESS.to_string(),
                customer_city: CUSTOMER_CITY.to_string(),
                client_ip: client_ip.to_string(),
            })
            .await?;

        if let Some(status) = &checkout.transaction_status {
            queries::set_order_transaction(&self.pool, order.id, &checkout.sp_order_id, status)
                .await?;
        }

        Ok(checkout.checkout_url)
    }

    /// Reconcile an order against the gateway's verification endpoint.
    /// Re-running with the same gateway response converges to the same
    /// stored state. Returns the raw record for response shaping, or None
    /// when the gateway reports nothing.
    pub async fn verify_payment(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<VerificationRecord>, AppError> {
        let record = self.gateway.verify(gateway_order_id).await?.into_iter().next();

        if let Some(record) = &record {
            let status = OrderStatus::from_bank_status(&record.bank_status);
            let updated = queries::apply_verification(
                &self.pool,
                gateway_order_id,
                &record.bank_status,
                &record.sp_code,
                &record.sp_message,
                &record.transaction_status,
                &record.method,
                &record.date_time,
                status.as_str(),
            )
            .await?;

            match updated {
                Some(order) => tracing::info!(
                    order_id = %order.id,
                    bank_status = %record.bank_status,
                    status = %order.status,
                    "payment verification applied"
                ),
                None => tracing::warn!(
                    gateway_order_id = %gateway_order_id,
                    "verification matched no stored order"
                ),
            }
        }

        Ok(record)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        payload: UpdateOrderStatus,
    ) -> Result<Order, AppError> {
        validate_order_status(&payload)?;

        queries::update_order_status(&self.pool, id, &payload.status)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No order found with id: {}", id)))
    }

    pub async fn list_all(&self) -> Result<Vec<Order>, AppError> {
        Ok(queries::list_orders(&self.pool).await?)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, AppError> {
        Ok(queries::list_orders_for_user(&self.pool, user_id).await?)
    }

    pub async fn get_for_user(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(Order, Vec<OrderItem>), AppError> {
        let order = queries::get_order_for_user(&self.pool, user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No order found with id: {}", id)))?;
        let items = queries::list_order_items(&self.pool, order.id).await?;

        Ok((order, items))
    }

    pub async fn calculate_revenue(&self) -> Result<BigDecimal, AppError> {
        Ok(queries::total_revenue(&self.pool).await?)
    }
}
