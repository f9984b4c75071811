use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration metafield on the discount")]
    Missing,
    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}

// Wire shape written by the admin app into the `function-configuration` metafield.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredConfiguration {
    #[serde(default)]
    main_product_id: Option<String>,
    #[serde(default)]
    product_gift_ids: Option<Vec<String>>,
}

/// Merchant settings for the BOGO + free gift discount.
///
/// Gift ids keep the order the merchant picked them in, without duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscountConfiguration {
    pub main_product_id: Option<String>,
    pub gift_product_ids: Vec<String>,
}

impl DiscountConfiguration {
    #[cfg(test)]
    pub fn new<I, S>(main_product_id: impl Into<String>, gift_product_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::normalized(
            Some(main_product_id.into()),
            gift_product_ids.into_iter().map(Into::into),
        )
    }

    fn normalized(main: Option<String>, gifts: impl Iterator<Item = String>) -> Self {
        let main_product_id = main.filter(|id| !id.trim().is_empty());

        let gifts: Vec<String> = gifts.collect();
        let mut seen = HashSet::with_capacity(gifts.len());
        let gift_product_ids = gifts
            .iter()
            .filter(|id| !id.trim().is_empty() && seen.insert(id.as_str()))
            .cloned()
            .collect();

        Self {
            main_product_id,
            gift_product_ids,
        }
    }

    /// A main product without gifts (or gifts without a main product) disables the discount.
    pub fn is_applicable(&self) -> bool {
        self.main_product_id.is_some() && !self.gift_product_ids.is_empty()
    }

    /// Serializes back into the metafield JSON the admin app stores.
    #[cfg(test)]
    pub fn to_metafield_value(&self) -> serde_json::Result<String> {
        let stored = StoredConfiguration {
            main_product_id: self.main_product_id.clone(),
            product_gift_ids: Some(self.gift_product_ids.clone()),
        };
        serde_json::to_string(&stored)
    }
}

/// Strict decode of the metafield value.
pub fn parse(raw: Option<&str>) -> Result<DiscountConfiguration, ConfigError> {
    let raw = raw.ok_or(ConfigError::Missing)?;
    let stored: StoredConfiguration = serde_json::from_str(raw)?;

    Ok(DiscountConfiguration::normalized(
        stored.main_product_id,
        stored.product_gift_ids.unwrap_or_default().into_iter(),
    ))
}

/// Never fails: anything that doesn't parse is handed to `report` and
/// becomes the inapplicable default.
pub fn decode(raw: Option<&str>, report: impl FnOnce(&ConfigError)) -> DiscountConfiguration {
    parse(raw).unwrap_or_else(|err| {
        report(&err);
        DiscountConfiguration::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MAIN: &str = "gid://shopify/Product/1";
    const GIFT_A: &str = "gid://shopify/Product/2";
    const GIFT_B: &str = "gid://shopify/Product/3";

    fn decode(raw: Option<&str>) -> DiscountConfiguration {
        super::decode(raw, |_| {})
    }

    #[test]
    fn decodes_admin_payload() {
        let raw = json!({ "mainProductId": MAIN, "productGiftIds": [GIFT_A, GIFT_B] }).to_string();
        let config = parse(Some(&raw)).unwrap();

        assert_eq!(config.main_product_id.as_deref(), Some(MAIN));
        assert_eq!(config.gift_product_ids, vec![GIFT_A, GIFT_B]);
        assert!(config.is_applicable());
    }

    #[test]
    fn missing_payload_is_an_error_but_decodes_to_default() {
        assert!(matches!(parse(None), Err(ConfigError::Missing)));
        assert_eq!(decode(None), DiscountConfiguration::default());
    }

    #[test]
    fn decode_reports_the_failure() {
        let mut reported = None;
        let config = super::decode(Some("{"), |err| reported = Some(err.to_string()));

        assert_eq!(config, DiscountConfiguration::default());
        assert!(reported.unwrap().starts_with("malformed configuration"));

        let mut reported = false;
        super::decode(Some("{}"), |_| reported = true);
        assert!(!reported);
    }

    #[test]
    fn truncated_json_decodes_to_default() {
        let raw = r#"{"mainProductId": "gid://shopify/Produ"#;

        assert!(matches!(parse(Some(raw)), Err(ConfigError::Malformed(_))));
        let config = decode(Some(raw));
        assert_eq!(config, DiscountConfiguration::default());
        assert!(!config.is_applicable());
    }

    #[test]
    fn wrong_field_types_are_malformed() {
        let raw = json!({ "mainProductId": 42, "productGiftIds": [GIFT_A] }).to_string();
        assert!(matches!(parse(Some(&raw)), Err(ConfigError::Malformed(_))));

        let raw = json!({ "mainProductId": MAIN, "productGiftIds": GIFT_A }).to_string();
        assert!(matches!(parse(Some(&raw)), Err(ConfigError::Malformed(_))));
    }

    #[test]
    fn absent_and_null_fields_are_empty() {
        let config = decode(Some("{}"));
        assert_eq!(config.main_product_id, None);
        assert!(config.gift_product_ids.is_empty());

        let raw = json!({ "mainProductId": null, "productGiftIds": null }).to_string();
        assert_eq!(decode(Some(&raw)), DiscountConfiguration::default());

        let raw = json!({ "mainProductId": MAIN }).to_string();
        let config = decode(Some(&raw));
        assert_eq!(config.main_product_id.as_deref(), Some(MAIN));
        assert!(!config.is_applicable());
    }

    #[test]
    fn blank_main_product_counts_as_unset() {
        let raw = json!({ "mainProductId": "  ", "productGiftIds": [GIFT_A] }).to_string();
        let config = decode(Some(&raw));

        assert_eq!(config.main_product_id, None);
        assert!(!config.is_applicable());
    }

    #[test]
    fn gift_ids_are_deduplicated_in_order() {
        let raw = json!({
            "mainProductId": MAIN,
            "productGiftIds": [GIFT_B, "", GIFT_A, GIFT_B],
        })
        .to_string();

        assert_eq!(decode(Some(&raw)).gift_product_ids, vec![GIFT_B, GIFT_A]);
    }

    #[test]
    fn long_gift_lists_keep_first_occurrences() {
        let ids: Vec<String> = (0..500)
            .chain(0..500)
            .map(|n| format!("gid://shopify/Product/{n}"))
            .collect();
        let config = DiscountConfiguration::new(MAIN, ids.clone());

        assert_eq!(config.gift_product_ids, ids[..500].to_vec());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let raw = json!({
            "mainProductId": MAIN,
            "productGiftIds": [GIFT_A],
            "cartLinePercentage": 10,
        })
        .to_string();

        assert!(decode(Some(&raw)).is_applicable());
    }

    #[test]
    fn metafield_value_matches_admin_shape() {
        let config = DiscountConfiguration::new(MAIN, [GIFT_A, GIFT_B]);
        let stored = config.to_metafield_value().unwrap();
        let value: serde_json::Value = serde_json::from_str(&stored).unwrap();

        assert_eq!(
            value,
            json!({ "mainProductId": MAIN, "productGiftIds": [GIFT_A, GIFT_B] })
        );
        assert_eq!(decode(Some(&stored)), config);
    }
}
