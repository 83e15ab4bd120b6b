#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use crate::common::{validate_id, validate_text, ContractViolation, Validate};

/// Payment type that receives the synthetic choice when a web add-card flow completes.
pub const COMPLETED_ADD_TARGET_TYPE: &str = "credit_card";
pub const COMPLETED_ADD_CHOICE_ID: u64 = 1999;

const DESCRIPTION_MAX_LEN: usize = 256;
const MAX_PAYMENT_TYPES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PaymentChoice {
    pub currencies: Vec<String>,
    pub id: u64,
    pub requires_interaction: bool,
    pub preferred: bool,
    pub description: String,
}

impl PaymentChoice {
    pub fn v1(id: u64, currencies: &[&str], preferred: bool, description: &str) -> Self {
        Self {
            currencies: currencies.iter().map(|c| c.to_string()).collect(),
            id,
            requires_interaction: false,
            preferred,
            description: description.to_string(),
        }
    }

    /// Choice appended when the add-card flow reports completion.
    pub fn completed_add() -> Self {
        Self::v1(
            COMPLETED_ADD_CHOICE_ID,
            &["USD"],
            false,
            "Yet another payment method",
        )
    }
}

impl Validate for PaymentChoice {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_text("payment_choice.description", &self.description, DESCRIPTION_MAX_LEN)?;
        if self.currencies.iter().any(|c| c.trim().is_empty()) {
            return Err(ContractViolation::InvalidValue {
                field: "payment_choice.currencies",
                reason: "currency codes must not be empty",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PaymentType {
    pub description: String,
    pub id: String,
    pub preferred: bool,
    #[serde(default)]
    pub choices: Vec<PaymentChoice>,
}

impl Validate for PaymentType {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("payment_type.id", &self.id, 64)?;
        validate_text("payment_type.description", &self.description, DESCRIPTION_MAX_LEN)?;
        for choice in &self.choices {
            choice.validate()?;
        }
        Ok(())
    }
}

/// Ordered list of payment types served by the payment-methods listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PaymentMethodCatalog {
    types: Vec<PaymentType>,
}

impl PaymentMethodCatalog {
    pub fn new(types: Vec<PaymentType>) -> Result<Self, ContractViolation> {
        let v = Self { types };
        v.validate()?;
        Ok(v)
    }

    /// PayPal plus a preferred credit-card type with two stored cards.
    pub fn seeded() -> Self {
        Self {
            types: vec![
                PaymentType {
                    description: "PayPal".to_string(),
                    id: "paypal".to_string(),
                    preferred: false,
                    choices: vec![PaymentChoice::v1(
                        532,
                        &["USD", "GBP", "EUR"],
                        false,
                        "PayPal Preapproved Payment (exp. 2014-04-12)",
                    )],
                },
                PaymentType {
                    description: "Credit or Debit Card".to_string(),
                    id: COMPLETED_ADD_TARGET_TYPE.to_string(),
                    preferred: true,
                    choices: vec![
                        PaymentChoice::v1(
                            1767,
                            &["USD"],
                            false,
                            "**** **** **** 1111 (Visa, exp. 02/2015)",
                        ),
                        PaymentChoice::v1(
                            1726,
                            &["USD"],
                            true,
                            "**** **** **** 1111 (Visa, exp. 03/2015)",
                        ),
                    ],
                },
            ],
        }
    }

    pub fn types(&self) -> &[PaymentType] {
        &self.types
    }

    pub fn payment_type(&self, id: &str) -> Option<&PaymentType> {
        self.types.iter().find(|t| t.id == id)
    }

    pub fn choice_count(&self, type_id: &str) -> Option<usize> {
        self.payment_type(type_id).map(|t| t.choices.len())
    }

    /// Replaces the type with the same id in place, or appends it.
    pub fn upsert_type(&mut self, payment_type: PaymentType) -> Result<(), ContractViolation> {
        payment_type.validate()?;
        if let Some(existing) = self.types.iter_mut().find(|t| t.id == payment_type.id) {
            *existing = payment_type;
            return Ok(());
        }
        if self.types.len() >= MAX_PAYMENT_TYPES {
            return Err(ContractViolation::TooMany {
                field: "payment_types",
                max: MAX_PAYMENT_TYPES,
                got: self.types.len() + 1,
            });
        }
        self.types.push(payment_type);
        Ok(())
    }

    /// Appends a choice to the named type and returns that type's new choice count.
    pub fn append_choice(
        &mut self,
        type_id: &str,
        choice: PaymentChoice,
    ) -> Result<usize, ContractViolation> {
        choice.validate()?;
        let target = self
            .types
            .iter_mut()
            .find(|t| t.id == type_id)
            .ok_or(ContractViolation::InvalidValue {
                field: "payment_type.id",
                reason: "unknown payment type",
            })?;
        target.choices.push(choice);
        Ok(target.choices.len())
    }
}

impl Validate for PaymentMethodCatalog {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.types.len() > MAX_PAYMENT_TYPES {
            return Err(ContractViolation::TooMany {
                field: "payment_types",
                max: MAX_PAYMENT_TYPES,
                got: self.types.len(),
            });
        }
        let mut seen = BTreeSet::new();
        for t in &self.types {
            t.validate()?;
            if !seen.insert(t.id.as_str()) {
                return Err(ContractViolation::InvalidValue {
                    field: "payment_type.id",
                    reason: "must be unique within the catalog",
                });
            }
        }
        Ok(())
    }
}
