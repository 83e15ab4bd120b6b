#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use paymock_contracts::item::{
    is_purchased_status, keys, package_available_properties, package_purchase_properties, status,
    ItemId, ItemSchema, PropertyBag, PropertyValue, PACKAGE_REFUND_DEADLINE_LOOKUP_KEY,
    PACKAGE_REFUND_WINDOW_SECS,
};
use paymock_contracts::object_path::{is_package_store_path, store_object_path};
use paymock_contracts::UnixTimeSecs;

use crate::error::StorageError;

/// A single item. The keys present at creation are the only keys it accepts later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: ItemId,
    properties: PropertyBag,
}

impl Item {
    pub fn with_defaults(schema: ItemSchema, id: ItemId) -> Self {
        let properties = schema.default_properties(&id);
        Self { id, properties }
    }

    fn package_purchase(id: ItemId, now: UnixTimeSecs) -> Self {
        let deadline = now.saturating_add_secs(PACKAGE_REFUND_WINDOW_SECS);
        let properties = package_purchase_properties(&id, deadline.0);
        Self { id, properties }
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Applies every pair or none of them.
    pub fn apply(&mut self, updates: &PropertyBag) -> Result<(), StorageError> {
        if let Some(unknown) = updates.keys().find(|k| !self.properties.contains_key(*k)) {
            return Err(StorageError::UnknownProperty(unknown.clone()));
        }
        for (key, value) in updates {
            self.properties.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn set(&mut self, key: &str, value: PropertyValue) -> Result<(), StorageError> {
        match self.properties.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(StorageError::UnknownProperty(key.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    InApp,
    Package,
}

/// Items of one package, keyed by id.
#[derive(Debug, Clone)]
pub struct Store {
    name: String,
    object_path: String,
    schema: ItemSchema,
    kind: StoreKind,
    items: BTreeMap<ItemId, Item>,
}

impl Store {
    pub fn new(schema: ItemSchema, name: &str) -> Result<Self, StorageError> {
        // Store names share the item id rules.
        ItemId::new(name)?;
        let object_path = store_object_path(schema, name);
        let kind = if is_package_store_path(schema, &object_path) {
            StoreKind::Package
        } else {
            StoreKind::InApp
        };
        Ok(Self {
            name: name.to_string(),
            object_path,
            schema,
            kind,
            items: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object_path(&self) -> &str {
        &self.object_path
    }

    pub fn schema(&self) -> ItemSchema {
        self.schema
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        let id = ItemId::new(id).ok()?;
        self.items.get(&id)
    }

    pub fn get(&self, id: &str) -> Result<PropertyBag, StorageError> {
        let item_id = ItemId::new(id)?;
        match self.items.get(&item_id) {
            Some(item) => Ok(item.properties.clone()),
            None if self.kind == StoreKind::Package => {
                Ok(package_available_properties(&item_id))
            }
            None => Err(self.not_found(id)),
        }
    }

    /// Creates an item from defaults and then applies `properties` on top.
    pub fn add(&mut self, properties: &PropertyBag) -> Result<PropertyBag, StorageError> {
        let id = self.schema.item_id_from(properties)?;
        if self.items.contains_key(&id) {
            return Err(StorageError::DuplicateItem {
                store: self.name.clone(),
                id: id.to_string(),
            });
        }
        let mut item = Item::with_defaults(self.schema, id.clone());
        item.apply(properties)?;
        let out = item.properties.clone();
        self.items.insert(id, item);
        Ok(out)
    }

    pub fn set_properties(
        &mut self,
        id: &str,
        properties: &PropertyBag,
    ) -> Result<PropertyBag, StorageError> {
        let item = self.item_mut(id)?;
        item.apply(properties)?;
        Ok(item.properties.clone())
    }

    pub fn list_purchased(&self) -> Vec<PropertyBag> {
        let status_key = self.schema.status_key();
        self.items
            .values()
            .filter(|item| {
                item.property(status_key)
                    .and_then(PropertyValue::as_str)
                    .is_some_and(is_purchased_status)
            })
            .map(|item| item.properties.clone())
            .collect()
    }

    pub fn remove(&mut self, id: &str) -> Option<Item> {
        let id = ItemId::new(id).ok()?;
        self.items.remove(&id)
    }

    pub fn purchase(&mut self, id: &str, now: UnixTimeSecs) -> Result<PropertyBag, StorageError> {
        if self.kind == StoreKind::Package {
            let item_id = ItemId::new(id)?;
            let item = Item::package_purchase(item_id.clone(), now);
            let out = item.properties.clone();
            self.items.insert(item_id, item);
            return Ok(out);
        }
        let schema = self.schema;
        let item = self.item_mut(id)?;
        item.set(schema.status_key(), schema.purchased_status().into())?;
        item.set(keys::PURCHASED_TIME, PropertyValue::U64(now.0))?;
        Ok(item.properties.clone())
    }

    pub fn refund(&mut self, id: &str, now: UnixTimeSecs) -> Result<PropertyBag, StorageError> {
        match (self.schema, self.kind) {
            (ItemSchema::PayStore, StoreKind::InApp) => {
                Err(StorageError::Rejected("Refunds are only available for packages"))
            }
            (ItemSchema::PayStore, StoreKind::Package) => self.refund_package(id, now),
            (ItemSchema::Libpay, _) => {
                let item = self.item_mut(id)?;
                item.set(keys::STATUS, status::NOT_PURCHASED.into())?;
                item.set(keys::PURCHASED_TIME, PropertyValue::U64(0))?;
                Ok(item.properties.clone())
            }
        }
    }

    fn refund_package(&mut self, id: &str, now: UnixTimeSecs) -> Result<PropertyBag, StorageError> {
        let item_id = ItemId::new(id)?;
        let Some(item) = self.items.get(&item_id) else {
            return Ok(package_available_properties(&item_id));
        };
        let complete = item
            .property(keys::STATE)
            .and_then(PropertyValue::as_str)
            .map(|s| s == status::COMPLETE);
        let deadline = item
            .property(PACKAGE_REFUND_DEADLINE_LOOKUP_KEY)
            .map(PropertyValue::as_u64);
        match (complete, deadline) {
            (None, _) => Ok(package_available_properties(&item_id)),
            (Some(false), _) => Ok(PropertyBag::new()),
            // Entries written by `purchase` never carry the lookup key, so this is the
            // branch every real refund takes: answer available, keep the entry.
            (Some(true), None) => Ok(package_available_properties(&item_id)),
            (Some(true), Some(Some(deadline))) if deadline > now.0 => {
                self.items.remove(&item_id);
                Ok(package_available_properties(&item_id))
            }
            (Some(true), Some(_)) => Ok(PropertyBag::new()),
        }
    }

    pub fn acknowledge(
        &mut self,
        id: &str,
        now: UnixTimeSecs,
    ) -> Result<PropertyBag, StorageError> {
        if self.kind == StoreKind::Package {
            return Err(StorageError::Rejected(
                "Only in-app purchase items can be acknowledged",
            ));
        }
        let item = self.item_mut(id)?;
        item.set(keys::ACKNOWLEDGED, PropertyValue::Bool(true))?;
        item.set(keys::ACKNOWLEDGED_TIME, PropertyValue::U64(now.0))?;
        Ok(item.properties.clone())
    }

    fn item_mut(&mut self, id: &str) -> Result<&mut Item, StorageError> {
        let item_id = ItemId::new(id)?;
        let store = self.name.clone();
        self.items
            .get_mut(&item_id)
            .ok_or_else(|| StorageError::ItemNotFound {
                store,
                id: id.to_string(),
            })
    }

    fn not_found(&self, id: &str) -> StorageError {
        StorageError::ItemNotFound {
            store: self.name.clone(),
            id: id.to_string(),
        }
    }
}
