#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use paymock_contracts::item::{ItemSchema, PropertyBag};

use crate::error::StorageError;
use crate::store::Store;

/// Every store the mock daemon exposes, keyed by package name.
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    schema: ItemSchema,
    stores: BTreeMap<String, Store>,
}

impl FixtureStore {
    pub fn new_in_memory(schema: ItemSchema) -> Self {
        Self {
            schema,
            stores: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> ItemSchema {
        self.schema
    }

    /// Registers a store and seeds it. Nothing is registered when any seed item fails.
    pub fn add_store(
        &mut self,
        package_name: &str,
        items: &[PropertyBag],
    ) -> Result<&Store, StorageError> {
        if self.stores.contains_key(package_name) {
            return Err(StorageError::DuplicateStore(package_name.to_string()));
        }
        let mut store = Store::new(self.schema, package_name)?;
        if self
            .stores
            .values()
            .any(|s| s.object_path() == store.object_path())
        {
            return Err(StorageError::DuplicateStore(package_name.to_string()));
        }
        for item in items {
            store.add(item)?;
        }
        Ok(self
            .stores
            .entry(package_name.to_string())
            .or_insert(store))
    }

    pub fn store_names(&self) -> Vec<String> {
        self.stores.keys().cloned().collect()
    }

    pub fn store(&self, package_name: &str) -> Result<&Store, StorageError> {
        self.stores
            .get(package_name)
            .ok_or_else(|| StorageError::StoreNotFound(package_name.to_string()))
    }

    pub fn store_mut(&mut self, package_name: &str) -> Result<&mut Store, StorageError> {
        self.stores
            .get_mut(package_name)
            .ok_or_else(|| StorageError::StoreNotFound(package_name.to_string()))
    }

    pub fn store_by_path_mut(&mut self, object_path: &str) -> Option<&mut Store> {
        self.stores
            .values_mut()
            .find(|s| s.object_path() == object_path)
    }

    pub fn add_item(
        &mut self,
        package_name: &str,
        properties: &PropertyBag,
    ) -> Result<PropertyBag, StorageError> {
        self.store_mut(package_name)?.add(properties)
    }

    /// Updates the item named by the id carried inside `properties`.
    pub fn set_item(
        &mut self,
        package_name: &str,
        properties: &PropertyBag,
    ) -> Result<PropertyBag, StorageError> {
        let schema = self.schema;
        let store = self.store_mut(package_name)?;
        let id = schema.item_id_from(properties)?;
        store.set_properties(id.as_str(), properties)
    }
}
