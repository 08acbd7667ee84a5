use crate::{Category, CategoryCounts, REQUIRED_TOTAL};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const MAX_HUE: u16 = 360;

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid hex color pattern"));

pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

pub fn clamp_hue(value: i64) -> u16 {
    value.clamp(0, i64::from(MAX_HUE)) as u16
}

pub fn clamp_count(value: i64) -> u32 {
    value.clamp(0, i64::from(REQUIRED_TOTAL)) as u32
}

/// Chosen card-back design together with its position in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardBackSelection {
    pub design: String,
    pub index: usize,
}

impl CardBackSelection {
    pub fn new(design: impl Into<String>, index: usize) -> Self {
        Self {
            design: design.into(),
            index,
        }
    }
}

/// Explicit three-colour tint for designs that support it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardBackColors {
    pub color_up: String,
    pub color_down: String,
    pub background_color: String,
}

impl CardBackColors {
    pub fn new(
        color_up: impl Into<String>,
        color_down: impl Into<String>,
        background_color: impl Into<String>,
    ) -> Self {
        Self {
            color_up: color_up.into(),
            color_down: color_down.into(),
            background_color: background_color.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        [&self.color_up, &self.color_down, &self.background_color]
            .iter()
            .all(|color| is_hex_color(color))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeckConfigError {
    #[error("category {category} has {count} cards (max {})", REQUIRED_TOTAL)]
    CountOutOfRange { category: Category, count: u32 },
    #[error("deck has {0} cards, more than {}", REQUIRED_TOTAL)]
    OverCapacity(u32),
    #[error("hue {0} is outside 0..=360")]
    HueOutOfRange(u16),
    #[error("card back colors must be #RRGGBB values")]
    InvalidColors,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DeckConfigWire", into = "DeckConfigWire")]
pub struct DeckConfig {
    pub counts: CategoryCounts,
    pub card_back: Option<CardBackSelection>,
    pub card_back_hue: u16,
    pub card_back_colors: Option<CardBackColors>,
}

impl DeckConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u32 {
        self.counts.total()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn is_complete(&self) -> bool {
        self.total() == REQUIRED_TOTAL
    }

    pub fn remaining(&self) -> u32 {
        REQUIRED_TOTAL.saturating_sub(self.total())
    }

    pub fn count(&self, category: Category) -> u32 {
        self.counts.get(category)
    }

    pub fn card_back_design(&self) -> Option<&str> {
        self.card_back.as_ref().map(|back| back.design.as_str())
    }

    pub fn card_back_index(&self) -> Option<usize> {
        self.card_back.as_ref().map(|back| back.index)
    }

    /// Clamps every count, empties a deck whose counts sum past the limit and
    /// drops the card-back choice unless the deck is exactly full.
    pub fn normalize(&mut self) {
        for category in Category::ALL {
            let count = self.counts.get(category).min(REQUIRED_TOTAL);
            self.counts.set(category, count);
        }
        if self.total() > REQUIRED_TOTAL {
            self.counts = CategoryCounts::default();
        }
        if !self.is_complete() {
            self.card_back = None;
        }
        self.card_back_hue = self.card_back_hue.min(MAX_HUE);
    }

    /// Lenient load of a stored blob. Every field falls back to its default on
    /// its own; `total` is never read.
    pub fn sanitize(raw: &Value) -> Sanitized {
        let mut repairs = Vec::new();
        let mut config = DeckConfig::empty();
        let Some(obj) = raw.as_object() else {
            if !raw.is_null() {
                repairs.push("stored deck is not an object".to_string());
            }
            return Sanitized { config, repairs };
        };

        match obj.get("counts") {
            Some(Value::Object(counts)) => {
                for category in Category::ALL {
                    let raw_count = counts.get(category.key());
                    let parsed = raw_count.and_then(lenient_int);
                    let value = match parsed {
                        Some(value) => value,
                        None => {
                            if raw_count.is_some() {
                                repairs.push(format!("counts.{category} is not a number"));
                            }
                            0
                        }
                    };
                    let clamped = clamp_count(value);
                    if i64::from(clamped) != value {
                        repairs.push(format!("counts.{category} clamped from {value}"));
                    }
                    config.counts.set(category, clamped);
                }
            }
            Some(_) => repairs.push("counts is not an object".to_string()),
            None => {}
        }

        if config.total() > REQUIRED_TOTAL {
            repairs.push(format!(
                "stored counts sum to {}, resetting",
                config.total()
            ));
            config.counts = CategoryCounts::default();
        }

        match obj.get("cardBackDesign") {
            Some(Value::String(design)) if !design.is_empty() => {
                let index = obj
                    .get("cardBackIndex")
                    .and_then(lenient_int)
                    .unwrap_or(0)
                    .max(0) as usize;
                config.card_back = Some(CardBackSelection::new(design.clone(), index));
            }
            Some(Value::Null) | Some(Value::String(_)) | None => {}
            Some(_) => repairs.push("cardBackDesign is not a string".to_string()),
        }

        if let Some(raw_hue) = obj.get("cardBackHue") {
            match lenient_int(raw_hue) {
                Some(hue) => {
                    let clamped = clamp_hue(hue);
                    if i64::from(clamped) != hue {
                        repairs.push(format!("cardBackHue clamped from {hue}"));
                    }
                    config.card_back_hue = clamped;
                }
                None if raw_hue.is_null() => {}
                None => repairs.push("cardBackHue is not a number".to_string()),
            }
        }

        match obj.get("cardBackColors") {
            Some(Value::Null) | None => {}
            Some(raw_colors) => {
                match serde_json::from_value::<CardBackColors>(raw_colors.clone()) {
                    Ok(colors) if colors.is_valid() => config.card_back_colors = Some(colors),
                    _ => repairs.push("cardBackColors is malformed".to_string()),
                }
            }
        }

        if config.card_back.is_some() && !config.is_complete() {
            repairs.push("card back dropped for an incomplete deck".to_string());
        }
        config.normalize();
        Sanitized { config, repairs }
    }
}

/// Result of [`DeckConfig::sanitize`]: the usable config plus a note for every
/// field that had to be repaired.
#[derive(Debug, Clone)]
pub struct Sanitized {
    pub config: DeckConfig,
    pub repairs: Vec<String>,
}

/// Integer parse in the manner of a browser `parseInt`: numbers truncate,
/// strings take their leading integer.
fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|n| n.is_finite()).map(|n| n.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim_start();
            let (sign, digits) = match text.strip_prefix('-') {
                Some(rest) => (-1, rest),
                None => (1, text.strip_prefix('+').unwrap_or(text)),
            };
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            digits[..end].parse::<i64>().ok().map(|n| sign * n)
        }
        _ => None,
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeckConfigWire {
    counts: CategoryCounts,
    #[serde(default)]
    total: u32,
    #[serde(default)]
    card_back_design: Option<String>,
    #[serde(default)]
    card_back_index: Option<usize>,
    #[serde(default)]
    card_back_hue: u16,
    #[serde(default)]
    card_back_colors: Option<CardBackColors>,
}

impl From<DeckConfig> for DeckConfigWire {
    fn from(config: DeckConfig) -> Self {
        let total = config.total();
        let (card_back_design, card_back_index) = match config.card_back {
            Some(back) => (Some(back.design), Some(back.index)),
            None => (None, None),
        };
        Self {
            counts: config.counts,
            total,
            card_back_design,
            card_back_index,
            card_back_hue: config.card_back_hue,
            card_back_colors: config.card_back_colors,
        }
    }
}

impl TryFrom<DeckConfigWire> for DeckConfig {
    type Error = DeckConfigError;

    fn try_from(wire: DeckConfigWire) -> Result<Self, Self::Error> {
        for (category, count) in wire.counts.iter() {
            if count > REQUIRED_TOTAL {
                return Err(DeckConfigError::CountOutOfRange { category, count });
            }
        }
        if wire.counts.total() > REQUIRED_TOTAL {
            return Err(DeckConfigError::OverCapacity(wire.counts.total()));
        }
        if wire.card_back_hue > MAX_HUE {
            return Err(DeckConfigError::HueOutOfRange(wire.card_back_hue));
        }
        if let Some(colors) = wire.card_back_colors.as_ref() {
            if !colors.is_valid() {
                return Err(DeckConfigError::InvalidColors);
            }
        }
        let card_back = wire
            .card_back_design
            .filter(|design| !design.is_empty())
            .map(|design| CardBackSelection::new(design, wire.card_back_index.unwrap_or(0)));
        let mut config = DeckConfig {
            counts: wire.counts,
            card_back,
            card_back_hue: wire.card_back_hue,
            card_back_colors: wire.card_back_colors,
        };
        config.normalize();
        Ok(config)
    }
}
