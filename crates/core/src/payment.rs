use crate::{
    order_total, validate_order_request, DeckConfig, IdRng, NewOrder, Order, OrderError,
    OrderRepository, OrderRequest, ShippingDetails, StorageError, StoreConfig,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

pub const PAYMENT_PROVIDER: &str = "paystack";

/// Gateway transaction reference, `DK_<millis>_<7 base36 chars>`.
pub fn generate_reference(now: OffsetDateTime, rng: &mut IdRng) -> String {
    let millis = (now.unix_timestamp_nanos() / 1_000_000).max(0);
    format!("DK_{millis}_{}", rng.base36(7))
}

/// Order details carried through the gateway and returned on verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutMetadata {
    pub deck_config: DeckConfig,
    pub quantity: u32,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInit {
    pub email: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub reference: String,
    pub callback_url: String,
    pub metadata: CheckoutMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub authorization_url: String,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Failed,
    Abandoned,
    Pending,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedPayment {
    pub reference: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub currency: String,
    pub customer_email: String,
    pub metadata: CheckoutMetadata,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment gateway error: {0}")]
    Gateway(String),
    #[error("Payment not successful ({0:?})")]
    NotSuccessful(PaymentStatus),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub trait PaymentGateway {
    fn initialize(&self, init: &PaymentInit) -> Result<PaymentSession, PaymentError>;
    fn verify(&self, reference: &str) -> Result<VerifiedPayment, PaymentError>;
}

pub fn checkout_payment(
    request: &OrderRequest,
    store: &StoreConfig,
    callback_base: &str,
    now: OffsetDateTime,
    rng: &mut IdRng,
) -> Result<PaymentInit, OrderError> {
    validate_order_request(request, store)?;
    let reference = generate_reference(now, rng);
    let callback_url = format!(
        "{}/success?reference={reference}",
        callback_base.trim_end_matches('/')
    );
    Ok(PaymentInit {
        email: request.shipping.email.trim().to_string(),
        amount: order_total(store.pricing.deck_price, request.quantity),
        currency: store.currency.code.clone(),
        reference,
        callback_url,
        metadata: CheckoutMetadata {
            deck_config: request.deck_config.clone(),
            quantity: request.quantity,
            shipping: request.shipping.clone(),
        },
    })
}

pub fn order_from_payment(verified: VerifiedPayment) -> Result<NewOrder, PaymentError> {
    if verified.status != PaymentStatus::Success {
        return Err(PaymentError::NotSuccessful(verified.status));
    }
    let mut shipping = verified.metadata.shipping;
    if shipping.email.trim().is_empty() {
        shipping.email = verified.customer_email;
    }
    Ok(NewOrder {
        deck_config: verified.metadata.deck_config,
        quantity: verified.metadata.quantity.max(1),
        total_amount: verified.amount,
        shipping,
        payment_reference: Some(verified.reference),
        payment_provider: Some(PAYMENT_PROVIDER.to_string()),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The reference was already turned into an order earlier.
    Existing(Order),
    Created(Order),
}

impl PaymentOutcome {
    pub fn order(&self) -> &Order {
        match self {
            PaymentOutcome::Existing(order) | PaymentOutcome::Created(order) => order,
        }
    }
}

/// Verifies a reference and records the order once. Repeated calls for the
/// same reference return the stored order without asking the gateway again.
pub fn confirm_payment<R, G>(
    orders: &mut R,
    gateway: &G,
    reference: &str,
    now: OffsetDateTime,
) -> Result<PaymentOutcome, PaymentError>
where
    R: OrderRepository + ?Sized,
    G: PaymentGateway + ?Sized,
{
    if let Some(existing) = orders.get_by_reference(reference)? {
        return Ok(PaymentOutcome::Existing(existing));
    }
    let verified = gateway.verify(reference)?;
    let order = orders.create(order_from_payment(verified)?, now)?;
    info!(order_id = %order.id, reference, "order created from payment");
    Ok(PaymentOutcome::Created(order))
}
