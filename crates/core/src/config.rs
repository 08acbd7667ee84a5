use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardBackKind {
    Custom,
    Animated,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardBackDesign {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub kind: CardBackKind,
    #[serde(default)]
    pub supports_hue: bool,
    #[serde(default)]
    pub supports_colors: bool,
    #[serde(default)]
    pub asset_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrencyRule {
    pub code: String,
    pub symbol: String,
    pub minor_per_major: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PricingRule {
    /// Price of one deck in minor currency units.
    pub deck_price: i64,
    pub max_quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryRule {
    pub estimate_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagingRule {
    pub base_url: String,
    pub phone: String,
    pub country_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationRule {
    pub admin_email: String,
    pub support_email: String,
    #[serde(default)]
    pub admin_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    pub currency: CurrencyRule,
    pub pricing: PricingRule,
    pub delivery: DeliveryRule,
    pub messaging: MessagingRule,
    pub notifications: NotificationRule,
    pub card_backs: Vec<CardBackDesign>,
}

impl StoreConfig {
    pub fn card_back(&self, id: &str) -> Option<&CardBackDesign> {
        self.card_backs.iter().find(|design| design.id == id)
    }

    pub fn card_back_index(&self, id: &str) -> Option<usize> {
        self.card_backs.iter().position(|design| design.id == id)
    }

    /// Display name for a design id; unknown ids are shown as-is.
    pub fn card_back_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.card_back(id)
            .map(|design| design.display_name.as_str())
            .unwrap_or(id)
    }

    pub fn supports_hue(&self, id: &str) -> bool {
        self.card_back(id).is_some_and(|design| design.supports_hue)
    }

    pub fn builtin() -> Self {
        Self {
            currency: CurrencyRule {
                code: "NGN".to_string(),
                symbol: "₦".to_string(),
                minor_per_major: 100,
            },
            pricing: PricingRule {
                deck_price: 2_500_000,
                max_quantity: 10,
            },
            delivery: DeliveryRule { estimate_days: 7 },
            messaging: MessagingRule {
                base_url: "https://wa.me".to_string(),
                phone: "08165429119".to_string(),
                country_code: "234".to_string(),
            },
            notifications: NotificationRule {
                admin_email: "admin@deckbuilder.com".to_string(),
                support_email: "support@deckbuilder.com".to_string(),
                admin_url: None,
            },
            card_backs: vec![
                design(
                    "custom-gradient",
                    "Custom Gradient",
                    "Customize your own color scheme",
                    CardBackKind::Custom,
                    None,
                ),
                design(
                    "origin",
                    "Origin",
                    "Premium animated design",
                    CardBackKind::Animated,
                    Some("originCardBack"),
                ),
                design(
                    "pulse",
                    "Pulse",
                    "Dynamic animated pulse effect",
                    CardBackKind::Animated,
                    Some("pulseCardBack"),
                ),
                design(
                    "after-hours",
                    "After Hours",
                    "Elegant nighttime ambiance",
                    CardBackKind::Animated,
                    Some("afterHoursCardBack"),
                ),
            ],
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

fn design(
    id: &str,
    display_name: &str,
    description: &str,
    kind: CardBackKind,
    asset_id: Option<&str>,
) -> CardBackDesign {
    CardBackDesign {
        id: id.to_string(),
        display_name: display_name.to_string(),
        description: description.to_string(),
        kind,
        supports_hue: kind == CardBackKind::Animated,
        supports_colors: kind == CardBackKind::Custom,
        asset_id: asset_id.map(str::to_string),
    }
}
