#![forbid(unsafe_code)]

//! Maps an inbound method and path onto one backend response case.
//!
//! Categories are tried in table order and the first substring hit wins. Scenario
//! tags are read independently of the category so one path can carry several.

use axum::http::Method;
use paymock_contracts::session::EndpointCategory;

const ROUTE_TABLE: &[(&str, EndpointCategory)] = &[
    ("/authError/", EndpointCategory::AuthError),
    ("shutdown", EndpointCategory::Shutdown),
    ("paymentmethods/add/", EndpointCategory::PaymentMethodAdd),
    ("paymentmethods/completeadd", EndpointCategory::PaymentMethodCompleteAdd),
    ("paymentmethods/", EndpointCategory::PaymentMethods),
    ("creditcard_interaction/", EndpointCategory::CreditCardInteraction),
    ("purchases/", EndpointCategory::Purchase),
    ("creds/", EndpointCategory::Credentials),
    ("wallet/", EndpointCategory::Credentials),
    ("iteminfo/", EndpointCategory::ItemInfo),
];

const TAG_FAIL: &str = "/fail/";
const TAG_INTERACTION: &str = "/interaction/";
const TAG_EUROZONE: &str = "/eurozone/";
const TAG_DOTAR: &str = "/dotar/";
const TAG_NOT_PURCHASED: &str = "/notpurchased/";

/// Page variant served by the add-card flow, picked from the first path segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddFlowVariant {
    #[default]
    Plain,
    Alert,
    BeforeUnload,
    Confirm,
    Prompt,
}

impl AddFlowVariant {
    fn from_path(path: &str) -> Self {
        let segment = path.split('/').nth(1).unwrap_or_default();
        if segment.contains("js_alert") {
            AddFlowVariant::Alert
        } else if segment.contains("js_beforeunload") {
            AddFlowVariant::BeforeUnload
        } else if segment.contains("js_confirm") {
            AddFlowVariant::Confirm
        } else if segment.contains("js_prompt") {
            AddFlowVariant::Prompt
        } else {
            AddFlowVariant::Plain
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioTags {
    pub fail: bool,
    pub interaction: bool,
    pub eurozone: bool,
    pub dotar: bool,
    pub not_purchased: bool,
    pub add_flow: AddFlowVariant,
}

impl ScenarioTags {
    pub fn from_path(path: &str) -> Self {
        Self {
            fail: path.contains(TAG_FAIL),
            interaction: path.contains(TAG_INTERACTION),
            eurozone: path.contains(TAG_EUROZONE),
            dotar: path.contains(TAG_DOTAR),
            not_purchased: path.contains(TAG_NOT_PURCHASED),
            add_flow: AddFlowVariant::from_path(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `HEAD` on any path.
    Head,
    Endpoint {
        category: EndpointCategory,
        tags: ScenarioTags,
    },
    Unhandled,
}

pub fn classify(method: &Method, path: &str) -> Route {
    if method == Method::HEAD {
        return Route::Head;
    }
    if method != Method::GET && method != Method::POST {
        return Route::Unhandled;
    }
    match ROUTE_TABLE
        .iter()
        .find(|(pattern, _)| path.contains(pattern))
    {
        Some((_, category)) => Route::Endpoint {
            category: *category,
            tags: ScenarioTags::from_path(path),
        },
        None => Route::Unhandled,
    }
}
