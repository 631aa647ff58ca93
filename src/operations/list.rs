//! Listing operations

use super::Engine;
use crate::config::{ComponentConfig, Profile};
use crate::domain::Receipt;
use crate::error::{Result, install as install_error};

impl Engine {
    /// Profiles of the base manifest and plugins, by name
    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        let namespace = self
            .resolver
            .namespace()
            .map_err(|e| install_error::operation_failed("list", e))?;
        Ok(namespace.profiles.into_values().collect())
    }

    /// Every component in the namespace, by id
    pub fn list_components(&self) -> Result<Vec<ComponentConfig>> {
        let namespace = self
            .resolver
            .namespace()
            .map_err(|e| install_error::operation_failed("list", e))?;
        Ok(namespace.components.into_values().collect())
    }

    /// Receipts of installed components; unreadable ones are skipped
    pub fn list_installed(&self) -> Result<Vec<Receipt>> {
        let ids = self
            .receipts
            .installed()
            .map_err(|e| install_error::operation_failed("list", e))?;

        let mut receipts = Vec::with_capacity(ids.len());
        for id in ids {
            match self.receipts.read(&id) {
                Ok(Some(receipt)) => receipts.push(receipt),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping receipt of '{id}': {e}"),
            }
        }
        Ok(receipts)
    }
}
