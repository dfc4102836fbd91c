//! Row-level planning.
//!
//! Extraction results are grouped by the row they address
//! ([`ChangeGrouper`]), adds and deletes of the same (subject, predicate)
//! are paired into in-place updates ([`PairingReconciler`]), and each row
//! change is turned into mutation statements by [`RowMutationPlanner`],
//! probing current database state where the right statement depends on it.

mod grouper;
mod pairing;
mod planner;

pub use grouper::ChangeGrouper;
pub use pairing::{PairKey, PairingReconciler, Partition, TriplePair};
pub use planner::RowMutationPlanner;

use std::collections::BTreeSet;

use crate::model::{Attribute, BindingMap, RelationName};
use crate::store::DatabaseHandle;

/// Object values one extraction result asserts about a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectBindings {
    pub values: BindingMap,
    pub projections: BTreeSet<Attribute>,
}

/// Every asserted change to one row of one table.
///
/// `subject` holds only primary-key bindings, with aliases resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowChange {
    pub database: DatabaseHandle,
    pub table: RelationName,
    pub subject: BindingMap,
    pub objects: Vec<ObjectBindings>,
}

impl RowChange {
    /// Whether some attribute is asserted with two different values.
    pub fn has_conflicting_values(&self) -> bool {
        let mut seen = BindingMap::new();
        for object in &self.objects {
            for (attr, value) in &object.values {
                match seen.get(attr) {
                    Some(previous) if previous != value => return true,
                    Some(_) => {}
                    None => {
                        seen.insert(attr.clone(), value.clone());
                    }
                }
            }
        }
        false
    }

    /// All object values merged into one map.
    pub fn merged_values(&self) -> BindingMap {
        self.objects
            .iter()
            .flat_map(|o| o.values.iter())
            .map(|(a, v)| (a.clone(), v.clone()))
            .collect()
    }
}

/// An in-place replacement of values in one row: `old` values removed and
/// `new` values added under the same subject and predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedChange {
    pub database: DatabaseHandle,
    pub table: RelationName,
    pub subject: BindingMap,
    pub old: BindingMap,
    pub new: BindingMap,
}
