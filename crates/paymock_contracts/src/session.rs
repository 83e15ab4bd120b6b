#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use crate::common::ContractViolation;

/// Resource categories the HTTP backend mock recognizes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EndpointCategory {
    AuthError,
    Shutdown,
    PaymentMethodAdd,
    PaymentMethodCompleteAdd,
    PaymentMethods,
    CreditCardInteraction,
    Purchase,
    Credentials,
    ItemInfo,
}

impl EndpointCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            EndpointCategory::AuthError => "auth_error",
            EndpointCategory::Shutdown => "shutdown",
            EndpointCategory::PaymentMethodAdd => "payment_method_add",
            EndpointCategory::PaymentMethodCompleteAdd => "payment_method_complete_add",
            EndpointCategory::PaymentMethods => "payment_methods",
            EndpointCategory::CreditCardInteraction => "credit_card_interaction",
            EndpointCategory::Purchase => "purchase",
            EndpointCategory::Credentials => "credentials",
            EndpointCategory::ItemInfo => "item_info",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ContractViolation> {
        let out = match value.trim() {
            "auth_error" => EndpointCategory::AuthError,
            "shutdown" => EndpointCategory::Shutdown,
            "payment_method_add" => EndpointCategory::PaymentMethodAdd,
            "payment_method_complete_add" => EndpointCategory::PaymentMethodCompleteAdd,
            "payment_methods" => EndpointCategory::PaymentMethods,
            "credit_card_interaction" => EndpointCategory::CreditCardInteraction,
            "purchase" => EndpointCategory::Purchase,
            "credentials" => EndpointCategory::Credentials,
            "item_info" => EndpointCategory::ItemInfo,
            _ => {
                return Err(ContractViolation::InvalidValue {
                    field: "endpoint_category",
                    reason: "unknown endpoint category",
                })
            }
        };
        Ok(out)
    }

    /// Categories whose response changes when failure is requested.
    pub fn honors_fail(self) -> bool {
        matches!(
            self,
            EndpointCategory::PaymentMethods
                | EndpointCategory::Purchase
                | EndpointCategory::Credentials
                | EndpointCategory::ItemInfo
        )
    }
}

/// Mutable per-service flags read on every matching request. Nothing resets them
/// except an explicit control call.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionFlags {
    pub fail: bool,
    #[serde(default)]
    pub failing_endpoints: BTreeSet<EndpointCategory>,
    pub interaction_required: Option<String>,
    pub interaction_cancelled: bool,
}

impl SessionFlags {
    pub fn fails(&self, category: EndpointCategory) -> bool {
        category.honors_fail() && (self.fail || self.failing_endpoints.contains(&category))
    }
}
