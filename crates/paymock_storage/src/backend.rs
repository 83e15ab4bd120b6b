#![forbid(unsafe_code)]

use paymock_contracts::catalog::{
    PaymentChoice, PaymentMethodCatalog, PaymentType, COMPLETED_ADD_TARGET_TYPE,
};
use paymock_contracts::session::{EndpointCategory, SessionFlags};

use crate::error::StorageError;

/// Payment-method catalog plus the session flags the HTTP backend mock reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendFixture {
    catalog: PaymentMethodCatalog,
    flags: SessionFlags,
}

impl BackendFixture {
    pub fn new(catalog: PaymentMethodCatalog) -> Self {
        Self {
            catalog,
            flags: SessionFlags::default(),
        }
    }

    pub fn seeded() -> Self {
        Self::new(PaymentMethodCatalog::seeded())
    }

    pub fn catalog(&self) -> &PaymentMethodCatalog {
        &self.catalog
    }

    pub fn flags(&self) -> &SessionFlags {
        &self.flags
    }

    pub fn replace_catalog(&mut self, catalog: PaymentMethodCatalog) {
        self.catalog = catalog;
    }

    pub fn upsert_payment_type(&mut self, payment_type: PaymentType) -> Result<(), StorageError> {
        self.catalog.upsert_type(payment_type)?;
        Ok(())
    }

    pub fn set_fail(&mut self, fail: bool) {
        self.flags.fail = fail;
    }

    pub fn set_endpoint_failure(&mut self, category: EndpointCategory, failing: bool) {
        if failing {
            self.flags.failing_endpoints.insert(category);
        } else {
            self.flags.failing_endpoints.remove(&category);
        }
    }

    pub fn require_interaction(&mut self, redirect_to: Option<String>) {
        self.flags.interaction_required = redirect_to;
    }

    pub fn set_interaction_cancelled(&mut self, cancelled: bool) {
        self.flags.interaction_cancelled = cancelled;
    }

    /// Appends the synthetic card to the credit-card type; returns its new choice count.
    pub fn complete_add(&mut self) -> Result<usize, StorageError> {
        let count = self
            .catalog
            .append_choice(COMPLETED_ADD_TARGET_TYPE, PaymentChoice::completed_add())?;
        Ok(count)
    }
}
