use crate::{
    format_price, order_total, to_base36, validation_issues, CardBackColors, Category,
    DeckConfig, IdRng, StoreConfig, ValidationIssue,
};
use serde::Serialize;
use thiserror::Error;
use time::{format_description::FormatItem, macros::format_description, Duration, OffsetDateTime};

const DELIVERY_FORMAT: &[FormatItem<'static>] =
    format_description!("[weekday], [month repr:long] [day padding:none], [year]");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryLine {
    pub category: Category,
    pub label: String,
    pub count: u32,
}

/// Frozen, display-ready view of a finished deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub deck_id: String,
    pub categories: Vec<CategoryLine>,
    pub total_cards: u32,
    pub card_back_id: String,
    pub card_back_design: String,
    pub card_back_hue: Option<u16>,
    pub card_back_colors: Option<CardBackColors>,
    pub quantity: u32,
    pub price_per_deck: i64,
    pub total_price: i64,
    pub formatted_price_per_deck: String,
    pub formatted_total_price: String,
    pub estimated_delivery: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("deck is not ready to order: {}", describe(.issues))]
pub struct IncompleteDeck {
    pub issues: Vec<ValidationIssue>,
}

impl IncompleteDeck {
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

fn describe(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Label-style deck id: base36 timestamp plus a short random suffix.
/// Not checked for collisions.
pub fn generate_deck_id(now: OffsetDateTime, rng: &mut IdRng) -> String {
    let millis = (now.unix_timestamp_nanos() / 1_000_000).max(0) as u64;
    format!(
        "DECK-{}-{}",
        to_base36(millis).to_uppercase(),
        rng.upper_alnum(4)
    )
}

pub fn estimated_delivery(now: OffsetDateTime, days: i64) -> String {
    let date = (now + Duration::days(days)).date();
    date.format(DELIVERY_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

pub fn build_summary(
    config: &DeckConfig,
    store: &StoreConfig,
    quantity: u32,
    now: OffsetDateTime,
    rng: &mut IdRng,
) -> Result<OrderSummary, IncompleteDeck> {
    let issues = validation_issues(config);
    let Some(card_back) = config.card_back.as_ref().filter(|_| issues.is_empty()) else {
        return Err(IncompleteDeck { issues });
    };

    let quantity = quantity.clamp(1, store.pricing.max_quantity.max(1));
    let categories = config
        .counts
        .non_zero()
        .map(|(category, count)| CategoryLine {
            category,
            label: category.label().to_string(),
            count,
        })
        .collect();
    let price_per_deck = store.pricing.deck_price;
    let total_price = order_total(price_per_deck, quantity);
    let card_back_hue = store
        .supports_hue(&card_back.design)
        .then_some(config.card_back_hue);

    Ok(OrderSummary {
        deck_id: generate_deck_id(now, rng),
        categories,
        total_cards: config.total(),
        card_back_id: card_back.design.clone(),
        card_back_design: store.card_back_name(&card_back.design).to_string(),
        card_back_hue,
        card_back_colors: config.card_back_colors.clone(),
        quantity,
        price_per_deck,
        total_price,
        formatted_price_per_deck: format_price(price_per_deck, &store.currency),
        formatted_total_price: format_price(total_price, &store.currency),
        estimated_delivery: estimated_delivery(now, store.delivery.estimate_days),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CardBackSelection;
    use time::macros::datetime;

    fn complete_deck() -> DeckConfig {
        let mut config = DeckConfig::empty();
        config.counts.set(Category::Romantic, 30);
        config.counts.set(Category::Deep, 22);
        config
    }

    #[test]
    fn incomplete_decks_have_no_summary() {
        let store = StoreConfig::builtin();
        let now = datetime!(2026-10-18 12:00 UTC);
        let mut rng = IdRng::from_seed(3);

        let mut partial = DeckConfig::empty();
        partial.counts.set(Category::Deep, 30);
        let err = build_summary(&partial, &store, 1, now, &mut rng).expect_err("partial");
        assert!(err.issues.contains(&ValidationIssue::IncompleteDeck { total: 30 }));

        let err = build_summary(&complete_deck(), &store, 1, now, &mut rng).expect_err("no back");
        assert_eq!(err.issues, vec![ValidationIssue::MissingCardBack]);
    }

    #[test]
    fn summary_lists_only_non_zero_categories() {
        let store = StoreConfig::builtin();
        let now = datetime!(2026-10-18 12:00 UTC);
        let mut config = complete_deck();
        config.card_back = Some(CardBackSelection::new("origin", 1));
        config.card_back_hue = 200;

        let summary = build_summary(&config, &store, 2, now, &mut IdRng::from_seed(3))
            .expect("summary");
        let keys: Vec<_> = summary.categories.iter().map(|line| line.category).collect();
        assert_eq!(keys, vec![Category::Romantic, Category::Deep]);
        assert_eq!(summary.total_cards, 52);
        assert_eq!(summary.card_back_design, "Origin");
        assert_eq!(summary.card_back_hue, Some(200));
        assert_eq!(summary.total_price, 5_000_000);
        assert_eq!(summary.formatted_price_per_deck, "₦25,000.00");
        assert_eq!(summary.formatted_total_price, "₦50,000.00");
        assert_eq!(summary.estimated_delivery, "Sunday, October 25, 2026");
        assert!(summary.deck_id.starts_with("DECK-MVDRWQO0-"));
        assert_eq!(summary.deck_id.len(), "DECK-MVDRWQO0-".len() + 4);
    }

    #[test]
    fn hue_is_dropped_for_designs_without_tinting() {
        let store = StoreConfig::builtin();
        let mut config = complete_deck();
        config.card_back = Some(CardBackSelection::new("custom-gradient", 0));
        config.card_back_hue = 90;
        let summary = build_summary(
            &config,
            &store,
            1,
            datetime!(2026-12-28 08:00 UTC),
            &mut IdRng::from_seed(9),
        )
        .expect("summary");
        assert_eq!(summary.card_back_hue, None);
        assert_eq!(summary.estimated_delivery, "Monday, January 4, 2027");
    }

    #[test]
    fn quantity_is_kept_within_limits() {
        let store = StoreConfig::builtin();
        let mut config = complete_deck();
        config.card_back = Some(CardBackSelection::new("pulse", 2));
        let now = datetime!(2026-10-18 12:00 UTC);
        let summary = build_summary(&config, &store, 0, now, &mut IdRng::from_seed(1))
            .expect("summary");
        assert_eq!(summary.quantity, 1);
        let summary = build_summary(&config, &store, 99, now, &mut IdRng::from_seed(1))
            .expect("summary");
        assert_eq!(summary.quantity, 10);
    }
}
