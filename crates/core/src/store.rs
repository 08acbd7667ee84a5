use crate::{
    clamp_count, clamp_hue, CardBackColors, CardBackSelection, Category, CategoryCounts,
    DeckConfig, KeyValueStorage, Sanitized, StorageError, REQUIRED_TOTAL,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub const STORAGE_KEY: &str = "deckConfigV1";

/// Partial update merged onto the stored config by [`DeckStore::write`].
/// `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeckPatch {
    pub counts: Option<CategoryCounts>,
    pub card_back: Option<Option<CardBackSelection>>,
    pub card_back_hue: Option<u16>,
    pub card_back_colors: Option<Option<CardBackColors>>,
}

impl DeckPatch {
    pub fn counts(counts: CategoryCounts) -> Self {
        Self {
            counts: Some(counts),
            ..Self::default()
        }
    }

    pub fn with_card_back(mut self, selection: Option<CardBackSelection>) -> Self {
        self.card_back = Some(selection);
        self
    }

    pub fn with_hue(mut self, hue: u16) -> Self {
        self.card_back_hue = Some(hue);
        self
    }

    pub fn with_colors(mut self, colors: Option<CardBackColors>) -> Self {
        self.card_back_colors = Some(colors);
        self
    }

    fn apply(self, config: &mut DeckConfig) {
        if let Some(counts) = self.counts {
            config.counts = counts;
        }
        if let Some(card_back) = self.card_back {
            config.card_back = card_back;
        }
        if let Some(hue) = self.card_back_hue {
            config.card_back_hue = hue;
        }
        if let Some(colors) = self.card_back_colors {
            config.card_back_colors = colors;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{category} cannot drop below zero (attempted {attempted})")]
    NegativeCount { category: Category, attempted: i64 },
    #[error("{category} change would make {attempted_total} cards (max {})", REQUIRED_TOTAL)]
    OverCapacity {
        category: Category,
        attempted_total: i64,
    },
}

#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Mutation {
    Applied(DeckConfig),
    Rejected(Rejection),
}

impl Mutation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied(_))
    }

    pub fn config(&self) -> Option<&DeckConfig> {
        match self {
            Mutation::Applied(config) => Some(config),
            Mutation::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Mutation::Applied(_) => None,
            Mutation::Rejected(rejection) => Some(*rejection),
        }
    }
}

/// Count a category would hold after `delta`, or why it cannot.
pub fn check_adjust(config: &DeckConfig, category: Category, delta: i64) -> Result<u32, Rejection> {
    let current = i64::from(config.count(category));
    let Some(attempted) = current.checked_add(delta) else {
        return Err(if delta < 0 {
            Rejection::NegativeCount {
                category,
                attempted: i64::MIN,
            }
        } else {
            Rejection::OverCapacity {
                category,
                attempted_total: i64::MAX,
            }
        });
    };
    if attempted < 0 {
        return Err(Rejection::NegativeCount {
            category,
            attempted,
        });
    }
    let attempted_total = (i64::from(config.total()) - current).saturating_add(attempted);
    if attempted_total > i64::from(REQUIRED_TOTAL) {
        return Err(Rejection::OverCapacity {
            category,
            attempted_total,
        });
    }
    Ok(attempted as u32)
}

/// Clamped count a category would hold after an absolute set, or why it cannot.
pub fn check_set(config: &DeckConfig, category: Category, value: i64) -> Result<u32, Rejection> {
    let clamped = clamp_count(value);
    let others = config.total() - config.count(category);
    let attempted_total = i64::from(others) + i64::from(clamped);
    if attempted_total > i64::from(REQUIRED_TOTAL) {
        return Err(Rejection::OverCapacity {
            category,
            attempted_total,
        });
    }
    Ok(clamped)
}

/// Owner of the in-progress deck. Every mutation reads the stored value,
/// applies the change, re-derives the dependent fields and persists.
#[derive(Debug)]
pub struct DeckStore<S> {
    storage: S,
    key: String,
}

impl<S: KeyValueStorage> DeckStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn read(&self) -> Result<DeckConfig, StorageError> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(DeckConfig::empty());
        };
        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %self.key, error = %err, "stored deck is not valid JSON, using defaults");
                return Ok(DeckConfig::empty());
            }
        };
        let Sanitized { config, repairs } = DeckConfig::sanitize(&value);
        for repair in &repairs {
            warn!(key = %self.key, repair = %repair, "repaired stored deck");
        }
        Ok(config)
    }

    pub fn write(&mut self, patch: DeckPatch) -> Result<DeckConfig, StorageError> {
        let mut config = self.read()?;
        patch.apply(&mut config);
        config.normalize();
        let body = serde_json::to_string(&config)?;
        self.storage.set(&self.key, &body)?;
        debug!(total = config.total(), card_back = ?config.card_back_design(), "deck saved");
        Ok(config)
    }

    pub fn adjust_category(
        &mut self,
        category: Category,
        delta: i64,
    ) -> Result<Mutation, StorageError> {
        let state = self.read()?;
        match check_adjust(&state, category, delta) {
            Ok(count) => self.commit_count(state.counts, category, count),
            Err(rejection) => Ok(Mutation::Rejected(rejection)),
        }
    }

    pub fn set_category(
        &mut self,
        category: Category,
        value: i64,
    ) -> Result<Mutation, StorageError> {
        let state = self.read()?;
        match check_set(&state, category, value) {
            Ok(count) => self.commit_count(state.counts, category, count),
            Err(rejection) => Ok(Mutation::Rejected(rejection)),
        }
    }

    /// Records a card-back choice. The deck must already be full for the
    /// choice to stick; otherwise only the hue and colours are kept.
    pub fn set_card_back(
        &mut self,
        design: &str,
        index: usize,
        hue: i64,
        colors: Option<CardBackColors>,
    ) -> Result<DeckConfig, StorageError> {
        let patch = DeckPatch::default()
            .with_card_back(Some(CardBackSelection::new(design, index)))
            .with_hue(clamp_hue(hue))
            .with_colors(colors);
        self.write(patch)
    }

    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.storage.remove(&self.key)
    }

    fn commit_count(
        &mut self,
        mut counts: CategoryCounts,
        category: Category,
        count: u32,
    ) -> Result<Mutation, StorageError> {
        counts.set(category, count);
        self.write(DeckPatch::counts(counts)).map(Mutation::Applied)
    }
}
