use crate::{DeckConfig, REQUIRED_TOTAL};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    EmptyDeck,
    IncompleteDeck { total: u32 },
    MissingCardBack,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyDeck => f.write_str("Please select at least one category"),
            ValidationIssue::IncompleteDeck { total } => write!(
                f,
                "Your deck needs exactly {REQUIRED_TOTAL} cards (currently {total})"
            ),
            ValidationIssue::MissingCardBack => f.write_str("Please select a card-back design"),
        }
    }
}

pub fn is_complete(config: &DeckConfig) -> bool {
    config.total() == REQUIRED_TOTAL
}

pub fn can_proceed_to_card_back(config: &DeckConfig) -> bool {
    is_complete(config)
}

pub fn can_proceed_to_preview(config: &DeckConfig) -> bool {
    is_complete(config) && config.card_back.is_some()
}

pub fn can_checkout(config: &DeckConfig) -> bool {
    can_proceed_to_preview(config)
}

/// Every reason the config cannot be ordered yet, in display order.
pub fn validation_issues(config: &DeckConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let total = config.total();
    if total == 0 {
        issues.push(ValidationIssue::EmptyDeck);
    }
    if total != REQUIRED_TOTAL {
        issues.push(ValidationIssue::IncompleteDeck { total });
    }
    if config.card_back.is_none() {
        issues.push(ValidationIssue::MissingCardBack);
    }
    issues
}

pub fn validation_messages(config: &DeckConfig) -> Vec<String> {
    validation_issues(config)
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CardBackSelection, Category};

    #[test]
    fn empty_deck_reports_every_issue() {
        let issues = validation_issues(&DeckConfig::empty());
        assert_eq!(
            issues,
            vec![
                ValidationIssue::EmptyDeck,
                ValidationIssue::IncompleteDeck { total: 0 },
                ValidationIssue::MissingCardBack,
            ]
        );
    }

    #[test]
    fn partial_deck_reports_current_total() {
        let mut config = DeckConfig::empty();
        config.counts.set(Category::Deep, 30);
        let messages = validation_messages(&config);
        assert_eq!(
            messages,
            vec![
                "Your deck needs exactly 52 cards (currently 30)".to_string(),
                "Please select a card-back design".to_string(),
            ]
        );
        assert!(!can_proceed_to_card_back(&config));
    }

    #[test]
    fn full_deck_with_back_passes_every_gate() {
        let mut config = DeckConfig::empty();
        config.counts.set(Category::Romantic, 52);
        assert!(can_proceed_to_card_back(&config));
        assert!(!can_proceed_to_preview(&config));
        config.card_back = Some(CardBackSelection::new("origin", 1));
        assert!(can_proceed_to_preview(&config));
        assert!(can_checkout(&config));
        assert!(validation_issues(&config).is_empty());
    }
}
