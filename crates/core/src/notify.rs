use crate::{format_price, Order, StoreConfig};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to send email to {to}: {reason}")]
    Send { to: String, reason: String },
}

pub trait OrderNotifier {
    fn send(&self, email: &OrderEmail) -> Result<(), NotifyError>;
}

/// Writes outgoing emails to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl OrderNotifier for LogNotifier {
    fn send(&self, email: &OrderEmail) -> Result<(), NotifyError> {
        info!(to = %email.to, subject = %email.subject, "email\n{}", email.body);
        Ok(())
    }
}

fn plural(quantity: u32) -> &'static str {
    if quantity > 1 {
        "s"
    } else {
        ""
    }
}

fn card_back_name<'a>(order: &'a Order, store: &'a StoreConfig) -> &'a str {
    order
        .details
        .deck_config
        .card_back_design()
        .map(|id| store.card_back_name(id))
        .unwrap_or("Custom")
}

fn address_lines(order: &Order) -> [String; 3] {
    let ship = &order.details.shipping;
    [
        ship.address.clone(),
        format!("{}, {} {}", ship.city, ship.state, ship.zip),
        ship.country.clone(),
    ]
}

pub fn order_confirmation_email(order: &Order, store: &StoreConfig) -> OrderEmail {
    let details = &order.details;
    let number = order.short_id();
    let mut lines = vec![
        format!("Hi {},", details.shipping.name),
        String::new(),
        "Thank you for your order! Your custom deck is being prepared.".to_string(),
        String::new(),
        format!("Order #{number}"),
        format!(
            "Quantity: {} deck{}",
            details.quantity,
            plural(details.quantity)
        ),
        format!(
            "Total: {}",
            format_price(details.total_amount, &store.currency)
        ),
        format!("Card Back Design: {}", card_back_name(order, store)),
        String::new(),
        "Categories:".to_string(),
    ];
    lines.extend(
        details
            .deck_config
            .counts
            .non_zero()
            .map(|(category, count)| format!("{}: {count} cards", category.label())),
    );
    lines.push(String::new());
    lines.push("Shipping to:".to_string());
    lines.push(details.shipping.name.clone());
    lines.extend(address_lines(order));
    lines.push(String::new());
    lines.push(format!(
        "Estimated delivery: {} business days.",
        store.delivery.estimate_days
    ));
    lines.push(format!(
        "Questions? Contact us at {}.",
        store.notifications.support_email
    ));

    OrderEmail {
        to: details.shipping.email.clone(),
        subject: format!("Order Confirmed - DeckBuilder #{number}"),
        body: lines.join("\n"),
    }
}

pub fn admin_notification_email(order: &Order, store: &StoreConfig) -> OrderEmail {
    let details = &order.details;
    let number = order.short_id();
    let total = format_price(details.total_amount, &store.currency);
    let breakdown: Vec<String> = details
        .deck_config
        .counts
        .non_zero()
        .map(|(category, count)| format!("{}: {count}", category.label()))
        .collect();
    let admin = store.notifications.admin_url.as_deref().unwrap_or("/admin");
    let mut lines = vec![
        format!("Order #{number}"),
        format!("Total: {total}"),
        format!(
            "Quantity: {} deck{}",
            details.quantity,
            plural(details.quantity)
        ),
        format!(
            "Payment: {} - {}",
            details.payment_provider.as_deref().unwrap_or("N/A"),
            details.payment_reference.as_deref().unwrap_or("N/A")
        ),
        String::new(),
        "Customer:".to_string(),
        format!("Name: {}", details.shipping.name),
        format!("Email: {}", details.shipping.email),
        format!(
            "Phone: {}",
            details.shipping.phone().unwrap_or("Not provided")
        ),
        String::new(),
        "Shipping address:".to_string(),
    ];
    lines.extend(address_lines(order));
    lines.extend([
        String::new(),
        format!("Card Back: {}", card_back_name(order, store)),
        breakdown.join(", "),
        format!("Manage orders: {admin}"),
    ]);

    OrderEmail {
        to: store.notifications.admin_email.clone(),
        subject: format!("New Order! #{number} - {total}"),
        body: lines.join("\n"),
    }
}

/// Sends the customer and admin emails. Failures are logged, never returned:
/// an order stands whether or not its emails go out.
pub fn send_order_emails<N>(notifier: &N, order: &Order, store: &StoreConfig)
where
    N: OrderNotifier + ?Sized,
{
    for email in [
        order_confirmation_email(order, store),
        admin_notification_email(order, store),
    ] {
        match notifier.send(&email) {
            Ok(()) => info!(order_id = %order.id, to = %email.to, "order email sent"),
            Err(err) => warn!(order_id = %order.id, error = %err, "order email not sent"),
        }
    }
}
