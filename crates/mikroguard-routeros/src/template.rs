// Copyright (C) 2025 Joseph Sacchini
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Shared in-memory connection template.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

use mikroguard_types::{ConfigTemplate, TemplateUpdate};

/// Process-wide template state, seeded from settings at startup.
///
/// Reads and updates are each atomic with respect to the whole record, so
/// concurrent admin updates cannot interleave at field granularity. Contents
/// live only for the life of the process and reset from settings on restart.
#[derive(Debug)]
pub struct TemplateStore {
    inner: RwLock<ConfigTemplate>,
}

impl TemplateStore {
    pub fn new(template: ConfigTemplate) -> Self {
        Self {
            inner: RwLock::new(template),
        }
    }

    /// Snapshot of the current template.
    pub fn get(&self) -> ConfigTemplate {
        self.read().clone()
    }

    /// Swap in a whole new template.
    pub fn replace(&self, template: ConfigTemplate) {
        *self.write() = template;
        info!("template replaced");
    }

    /// Apply a partial update as one atomic record swap, returning the
    /// merged result.
    pub fn merge(&self, update: TemplateUpdate) -> ConfigTemplate {
        let mut guard = self.write();
        guard.apply(update);
        info!(endpoint = %guard.endpoint, dns = %guard.dns, "template updated");
        guard.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, ConfigTemplate> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ConfigTemplate> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
