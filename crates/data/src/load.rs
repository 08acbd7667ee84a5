use anyhow::{bail, Context};
use convodeck_core::{
    CardBackDesign, CardBackKind, CurrencyRule, DeliveryRule, MessagingRule, NotificationRule,
    PricingRule, StoreConfig,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const STORE_FILE: &str = "store.json";
const CARD_BACKS_FILE: &str = "card_backs.json";

pub const ADMIN_EMAIL_VAR: &str = "CONVODECK_ADMIN_EMAIL";
pub const WHATSAPP_PHONE_VAR: &str = "CONVODECK_WHATSAPP_PHONE";
pub const ADMIN_URL_VAR: &str = "CONVODECK_ADMIN_URL";

#[derive(Debug, Deserialize)]
struct StoreFile {
    currency: CurrencyRule,
    pricing: PricingRule,
    delivery: DeliveryRule,
    messaging: MessagingRule,
    notifications: NotificationRule,
}

/// Repository `assets/` directory, for binaries run from a checkout.
pub fn default_assets_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("assets")
}

pub fn load_store_config(dir: &Path) -> anyhow::Result<StoreConfig> {
    let store: StoreFile = load_json(dir.join(STORE_FILE))?;
    let card_backs: Vec<CardBackDesign> = load_json(dir.join(CARD_BACKS_FILE))?;
    let config = StoreConfig {
        currency: store.currency,
        pricing: store.pricing,
        delivery: store.delivery,
        messaging: store.messaging,
        notifications: store.notifications,
        card_backs,
    };
    validate_store_config(&config).with_context(|| format!("validate {}", dir.display()))?;
    info!(
        dir = %dir.display(),
        designs = config.card_backs.len(),
        "store config loaded"
    );
    Ok(config)
}

/// Loads from `dir` and applies overrides from the process environment.
pub fn load_store_config_with_env(dir: &Path) -> anyhow::Result<StoreConfig> {
    let mut config = load_store_config(dir)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

pub fn apply_env_overrides<F>(config: &mut StoreConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    if let Some(email) = non_empty(ADMIN_EMAIL_VAR) {
        debug!(var = ADMIN_EMAIL_VAR, "override");
        config.notifications.admin_email = email;
    }
    if let Some(phone) = non_empty(WHATSAPP_PHONE_VAR) {
        debug!(var = WHATSAPP_PHONE_VAR, "override");
        config.messaging.phone = phone;
    }
    if let Some(url) = non_empty(ADMIN_URL_VAR) {
        debug!(var = ADMIN_URL_VAR, "override");
        config.notifications.admin_url = Some(url);
    }
}

pub fn validate_store_config(config: &StoreConfig) -> anyhow::Result<()> {
    if config.pricing.deck_price <= 0 {
        bail!("deck price must be positive");
    }
    if config.pricing.max_quantity == 0 {
        bail!("max quantity must be at least 1");
    }
    if config.currency.minor_per_major <= 0 {
        bail!("currency {} has no minor unit ratio", config.currency.code);
    }
    if config.card_backs.is_empty() {
        bail!("no card-back designs");
    }
    let mut seen = HashSet::new();
    for design in &config.card_backs {
        if !seen.insert(design.id.as_str()) {
            bail!("duplicate card-back id {}", design.id);
        }
        if design.kind == CardBackKind::Animated && design.asset_id.is_none() {
            bail!("animated card back {} has no asset", design.id);
        }
    }
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_skip_blank_values() {
        let mut config = StoreConfig::builtin();
        apply_env_overrides(&mut config, |name| match name {
            ADMIN_EMAIL_VAR => Some("orders@shop.example".to_string()),
            WHATSAPP_PHONE_VAR => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.notifications.admin_email, "orders@shop.example");
        assert_eq!(config.messaging.phone, "08165429119");
        assert_eq!(config.notifications.admin_url, None);
    }

    #[test]
    fn duplicate_designs_are_rejected() {
        let mut config = StoreConfig::builtin();
        let copy = config.card_backs[1].clone();
        config.card_backs.push(copy);
        let err = validate_store_config(&config).expect_err("duplicate");
        assert!(err.to_string().contains("duplicate card-back id origin"));
    }

    #[test]
    fn builtin_config_is_valid() {
        validate_store_config(&StoreConfig::builtin()).expect("valid");
    }
}
