#![forbid(unsafe_code)]

//! Canned payloads served by the payment backend mock.

use std::collections::BTreeMap;

pub const PURCHASE_STATE_COMPLETE: &str = "Complete";
pub const PURCHASE_STATE_IN_PROGRESS: &str = "InProgress";
/// Redirect served for the `/interaction/` scenario tag when no control target is set.
pub const SCENARIO_INTERACTION_REDIRECT: &str = "/redirect.url?currency=USD";
/// Redirect the control API installs when asked for interaction without a target.
pub const DEFAULT_INTERACTION_REDIRECT: &str = "/creditcard_interaction";

pub const CLICK_TOKEN_HEADER: &str = "x-click-token";
pub const CLICK_TOKEN_VALUE: &str = "X-Click-Token";
pub const SUGGESTED_CURRENCY_HEADER: &str = "x-suggested-currency";

/// Purchase reply. A degenerate reply serializes as `{}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct PurchaseReply {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub redirect_to: Option<String>,
}

impl PurchaseReply {
    pub fn complete() -> Self {
        Self {
            state: Some(PURCHASE_STATE_COMPLETE.to_string()),
            redirect_to: None,
        }
    }

    pub fn in_progress(redirect_to: impl Into<String>) -> Self {
        Self {
            state: Some(PURCHASE_STATE_IN_PROGRESS.to_string()),
            redirect_to: Some(redirect_to.into()),
        }
    }

    pub fn degenerate() -> Self {
        Self::default()
    }

    pub fn is_degenerate(&self) -> bool {
        self.state.is_none() && self.redirect_to.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ItemInfo {
    pub title: String,
    pub publisher: String,
    pub price: f64,
    pub prices: BTreeMap<String, f64>,
    pub icon_url: String,
}

impl ItemInfo {
    pub fn canned() -> Self {
        let prices = [("USD", 1.99), ("EUR", 1.69), ("GBP", 1.29), ("ARS", 18.05)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self {
            title: "title".to_string(),
            publisher: "publisher".to_string(),
            price: 9.99,
            prices,
            icon_url: "icon_url".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Credentials {
    pub token_key: String,
    pub token_secret: String,
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl Credentials {
    pub fn canned() -> Self {
        Self {
            token_key: "token_key".to_string(),
            token_secret: "token_secret".to_string(),
            consumer_key: "consumer_key".to_string(),
            consumer_secret: "consumer_secret".to_string(),
        }
    }
}
