#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use crate::common::{validate_id, ContractViolation, Validate};

/// Property keys shared by both item schemas.
pub mod keys {
    pub const ACKNOWLEDGED: &str = "acknowledged";
    pub const ACKNOWLEDGED_TIME: &str = "acknowledged_time";
    pub const DESCRIPTION: &str = "description";
    pub const PRICE: &str = "price";
    pub const PURCHASED_TIME: &str = "purchased_time";
    pub const TYPE: &str = "type";
    pub const TITLE: &str = "title";

    pub const SKU: &str = "sku";
    pub const STATE: &str = "state";
    pub const ID: &str = "id";
    pub const STATUS: &str = "status";

    pub const PACKAGE_NAME: &str = "package_name";
    pub const REFUND_TIMEOUT: &str = "refund_timeout";
}

pub mod status {
    pub const AVAILABLE: &str = "available";
    pub const APPROVED: &str = "approved";
    pub const PURCHASED: &str = "purchased";
    pub const NOT_PURCHASED: &str = "not purchased";
    pub const COMPLETE: &str = "Complete";
}

/// Package entries live in the store whose encoded path carries this suffix.
pub const PACKAGE_STORE_PATH_SUFFIX: &str = "click_2Dscope";
pub const PACKAGE_REFUND_WINDOW_SECS: u64 = 15 * 60;
/// Key consulted when refunding a package. Purchases write `refund_timeout`, so a
/// refund never finds a deadline under this spelling and leaves the entry in place.
pub const PACKAGE_REFUND_DEADLINE_LOOKUP_KEY: &str = "refund_tiemout";

const DEFAULT_DESCRIPTION: &str = "The is a default item";
const DEFAULT_PRICE: &str = "$1";
const DEFAULT_TYPE: &str = "unlockable";
const DEFAULT_TITLE: &str = "Default Item";
const ITEM_ID_MAX_LEN: usize = 255;

pub fn is_purchased_status(value: &str) -> bool {
    matches!(value, status::APPROVED | status::PURCHASED)
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(id.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for ItemId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("item_id", &self.0, ITEM_ID_MAX_LEN)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    U64(u64),
    Str(String),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            PropertyValue::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Str(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Str(v)
    }
}

impl From<u64> for PropertyValue {
    fn from(v: u64) -> Self {
        PropertyValue::U64(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

pub type PropertyBag = BTreeMap<String, PropertyValue>;

/// Builds a bag from literal pairs; handy for fixtures.
pub fn property_bag<I, K, V>(pairs: I) -> PropertyBag
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<PropertyValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// The two item layouts the store daemon mocks used. They differ in which key
/// carries identity and status and in what a purchase or refund writes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ItemSchema {
    #[default]
    PayStore,
    Libpay,
}

impl ItemSchema {
    pub fn parse(value: &str) -> Result<Self, ContractViolation> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pay-store" | "pay_store" | "paystore" => Ok(ItemSchema::PayStore),
            "libpay" => Ok(ItemSchema::Libpay),
            _ => Err(ContractViolation::InvalidValue {
                field: "item_schema",
                reason: "expected pay-store or libpay",
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemSchema::PayStore => "pay-store",
            ItemSchema::Libpay => "libpay",
        }
    }

    pub fn id_key(self) -> &'static str {
        match self {
            ItemSchema::PayStore => keys::SKU,
            ItemSchema::Libpay => keys::ID,
        }
    }

    pub fn status_key(self) -> &'static str {
        match self {
            ItemSchema::PayStore => keys::STATE,
            ItemSchema::Libpay => keys::STATUS,
        }
    }

    pub fn default_status(self) -> &'static str {
        match self {
            ItemSchema::PayStore => status::AVAILABLE,
            ItemSchema::Libpay => status::NOT_PURCHASED,
        }
    }

    pub fn purchased_status(self) -> &'static str {
        match self {
            ItemSchema::PayStore => status::APPROVED,
            ItemSchema::Libpay => status::PURCHASED,
        }
    }

    pub fn default_properties(self, id: &ItemId) -> PropertyBag {
        let mut bag = PropertyBag::new();
        bag.insert(keys::ACKNOWLEDGED.to_string(), PropertyValue::Bool(false));
        bag.insert(keys::ACKNOWLEDGED_TIME.to_string(), PropertyValue::U64(0));
        bag.insert(keys::DESCRIPTION.to_string(), DEFAULT_DESCRIPTION.into());
        bag.insert(keys::PRICE.to_string(), DEFAULT_PRICE.into());
        bag.insert(keys::PURCHASED_TIME.to_string(), PropertyValue::U64(0));
        bag.insert(keys::TYPE.to_string(), DEFAULT_TYPE.into());
        bag.insert(keys::TITLE.to_string(), DEFAULT_TITLE.into());
        bag.insert(self.id_key().to_string(), id.as_str().into());
        bag.insert(self.status_key().to_string(), self.default_status().into());
        bag
    }

    pub fn allows_key(self, key: &str) -> bool {
        matches!(
            key,
            keys::ACKNOWLEDGED
                | keys::ACKNOWLEDGED_TIME
                | keys::DESCRIPTION
                | keys::PRICE
                | keys::PURCHASED_TIME
                | keys::TYPE
                | keys::TITLE
        ) || key == self.id_key()
            || key == self.status_key()
    }

    /// Reads the identity out of a property bag submitted for a new item.
    pub fn item_id_from(self, bag: &PropertyBag) -> Result<ItemId, ContractViolation> {
        match bag.get(self.id_key()) {
            None => Err(ContractViolation::InvalidValue {
                field: "item_id",
                reason: "item has no id property",
            }),
            Some(PropertyValue::Str(id)) => ItemId::new(id.clone()),
            Some(_) => Err(ContractViolation::InvalidValue {
                field: "item_id",
                reason: "must be a string",
            }),
        }
    }
}

/// Properties a package entry carries right after purchase.
pub fn package_purchase_properties(package: &ItemId, refund_deadline_secs: u64) -> PropertyBag {
    let mut bag = PropertyBag::new();
    bag.insert(keys::STATE.to_string(), status::COMPLETE.into());
    bag.insert(
        keys::REFUND_TIMEOUT.to_string(),
        PropertyValue::U64(refund_deadline_secs),
    );
    bag.insert(keys::PACKAGE_NAME.to_string(), package.as_str().into());
    bag
}

pub fn package_available_properties(package: &ItemId) -> PropertyBag {
    let mut bag = PropertyBag::new();
    bag.insert(keys::STATE.to_string(), status::AVAILABLE.into());
    bag.insert(keys::PACKAGE_NAME.to_string(), package.as_str().into());
    bag
}
