use crate::{MessagingRule, OrderSummary};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn build_shareable_message(summary: &OrderSummary) -> String {
    let mut lines = vec![
        "Hi! I'd like to order a custom conversation deck.".to_string(),
        String::new(),
        format!("Deck ID: {}", summary.deck_id),
        "Categories:".to_string(),
    ];
    lines.extend(
        summary
            .categories
            .iter()
            .map(|line| format!("- {}: {} cards", line.label, line.count)),
    );
    lines.push(format!("Total: {} cards", summary.total_cards));
    lines.push(match summary.card_back_hue {
        Some(hue) => format!("Card back: {} (Hue: {hue})", summary.card_back_design),
        None => format!("Card back: {}", summary.card_back_design),
    });
    let plural = if summary.quantity > 1 { "decks" } else { "deck" };
    lines.push(format!("Quantity: {} {plural}", summary.quantity));
    if summary.quantity > 1 {
        lines.push(format!(
            "Price per deck: {}",
            summary.formatted_price_per_deck
        ));
    }
    lines.push(format!("Total price: {}", summary.formatted_total_price));
    lines.push(format!("Estimated delivery: {}", summary.estimated_delivery));
    lines.push(String::new());
    lines.push("Please send me the payment details to confirm my order. Thank you!".to_string());
    lines.join("\n")
}

/// Digits only, with the country code in front. A leading trunk `0` is
/// replaced by the code.
pub fn normalize_phone(phone: &str, country_code: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let code: String = country_code.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return String::new();
    }
    if let Some(rest) = digits.strip_prefix('0') {
        return format!("{code}{rest}");
    }
    if digits.starts_with(&code) {
        return digits;
    }
    format!("{code}{digits}")
}

pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

pub fn messaging_link(base_url: &str, phone: &str, message: &str) -> String {
    format!(
        "{}/{}?text={}",
        base_url.trim_end_matches('/'),
        phone,
        encode_uri_component(message)
    )
}

/// Hand-off link to the store's messaging number for a finished summary.
pub fn order_message_link(rule: &MessagingRule, summary: &OrderSummary) -> String {
    let phone = normalize_phone(&rule.phone, &rule.country_code);
    messaging_link(&rule.base_url, &phone, &build_shareable_message(summary))
}
