//! The exporter handed to declarative setups.
//!
//! Exporting assigns a binding on the module's shared namespace, then
//! pushes the updated namespace to every importer through the setter wired
//! at this module's position. While the push is in progress the module is
//! locked; a locked importer is skipped, which stops an importer that is
//! itself mid-export from being re-entered through a cycle.

use std::rc::Weak;

use modlink_value::{Namespace, Value};

use crate::loader::LoaderState;
use crate::records::RecordId;

/// Assigns exports of one declarative module and notifies its importers.
///
/// Cheap to clone; typically captured by the module's execute body.
#[derive(Clone)]
pub struct Exporter {
    state: Weak<LoaderState>,
    record: RecordId,
    exports: Namespace,
}

impl Exporter {
    pub(crate) fn new(state: Weak<LoaderState>, record: RecordId, exports: Namespace) -> Self {
        Exporter {
            state,
            record,
            exports,
        }
    }

    /// Assign one export and notify importers. Returns `value` unchanged.
    pub fn export(&self, name: impl Into<String>, value: Value) -> Value {
        self.exports.set(name, value.clone());
        self.notify_importers();
        value
    }

    /// Assign several exports, then notify importers once.
    pub fn export_all<K: Into<String>>(&self, bindings: impl IntoIterator<Item = (K, Value)>) {
        for (name, value) in bindings {
            self.exports.set(name, value);
        }
        self.notify_importers();
    }

    /// The module's live exports.
    pub fn exports(&self) -> &Namespace {
        &self.exports
    }

    fn notify_importers(&self) {
        // Without a loader there is nobody left to notify.
        let Some(state) = self.state.upgrade() else {
            return;
        };

        state.records.borrow_mut().get_mut(self.record).locked = true;

        let importer_count = state.records.borrow().get(self.record).importers.len();
        tracing::trace!(record = ?self.record, importers = importer_count, "notifying importers");
        for position in 0..importer_count {
            let setter = {
                let records = state.records.borrow();
                let importer_id = records.get(self.record).importers[position];
                let importer = records.get(importer_id);
                if importer.locked {
                    tracing::trace!(?importer_id, "skipping locked importer");
                    continue;
                }
                importer.setter_for(self.record)
            };
            if let Some(setter) = setter {
                setter(&Value::Namespace(self.exports.clone()));
            }
        }

        state.records.borrow_mut().get_mut(self.record).locked = false;
    }
}
