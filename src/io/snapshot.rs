//! JSON snapshot of the whole data store
//!
//! A snapshot holds every registry table and the payment ledger in one
//! JSON object, one array per table:
//!
//! ```text
//! {
//!   "villages": [...], "classes": [...], "academic_years": [...],
//!   "students": [...], "fee_types": [...], "fee_structure": [...],
//!   "bus_fee_structure": [...], "charge_categories": [...],
//!   "miscellaneous_charges": [...], "academic_year_transitions": [...],
//!   "student_promotion_history": [...], "settings": {...},
//!   "fee_payments": [...], "payment_allocation": [...]
//! }
//! ```
//!
//! Missing tables load as empty.

use crate::core::ledger::{FeeLedger, LedgerTables};
use crate::core::registry::{RegistryTables, SchoolRegistry};
use crate::types::SchoolError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchoolSnapshot {
    #[serde(flatten)]
    pub registry: RegistryTables,
    #[serde(flatten)]
    pub ledger: LedgerTables,
}

impl SchoolSnapshot {
    pub fn from_parts(registry: &SchoolRegistry, ledger: &FeeLedger) -> Self {
        Self {
            registry: registry.to_tables(),
            ledger: ledger.to_tables(),
        }
    }

    /// Rebuild the registry and ledger
    ///
    /// # Errors
    ///
    /// `ArithmeticOverflow` if the stored payments of a student do not add
    /// up within `Decimal` range.
    pub fn into_parts(self) -> Result<(SchoolRegistry, FeeLedger), SchoolError> {
        Ok((
            SchoolRegistry::from_tables(self.registry),
            FeeLedger::from_tables(self.ledger)?,
        ))
    }

    /// Read a snapshot file
    ///
    /// # Errors
    ///
    /// * `FileNotFound` if the file does not exist
    /// * `SnapshotError` if it is not a valid snapshot
    pub fn load(path: &Path) -> Result<Self, SchoolError> {
        let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SchoolError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => SchoolError::from(e),
        })?;
        let snapshot: SchoolSnapshot = serde_json::from_str(&raw)?;
        debug!(
            path = %path.display(),
            students = snapshot.registry.students.len(),
            payments = snapshot.ledger.fee_payments.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Write the snapshot as pretty-printed JSON, replacing the file
    pub fn save(&self, path: &Path) -> Result<(), SchoolError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")?;
        info!(path = %path.display(), "snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaymentRules;
    use crate::core::engine::FeeEngine;
    use crate::core::fixtures::{dec, sample_registry};
    use crate::core::traits::PaymentLedger;
    use crate::types::PaymentRecord;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_keeps_tables() {
        let mut engine = FeeEngine::new(sample_registry(), FeeLedger::new(), PaymentRules::default());
        engine
            .record_payment(PaymentRecord::record(7, 1, dec("6500")))
            .unwrap();
        let (mut registry, ledger) = engine.into_parts();
        registry.put_setting("school_name", serde_json::json!("Govt. Higher Primary School"));

        let dir = tempdir().unwrap();
        let path = dir.path().join("school.json");
        SchoolSnapshot::from_parts(&registry, &ledger).save(&path).unwrap();

        let (loaded_registry, loaded_ledger) = SchoolSnapshot::load(&path).unwrap().into_parts().unwrap();
        assert_eq!(loaded_registry, registry);
        assert_eq!(loaded_ledger, ledger);
        assert_eq!(loaded_ledger.paid(1, 1).bus, dec("6000"));
    }

    #[test]
    fn test_missing_tables_default_to_empty() {
        let snapshot: SchoolSnapshot =
            serde_json::from_str(r#"{"classes": [{"id": 1, "name": "Class 1", "grade_order": 1}]}"#)
                .unwrap();

        let (registry, ledger) = snapshot.into_parts().unwrap();
        assert_eq!(registry.classes().len(), 1);
        assert!(registry.current_year().is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();

        let missing = SchoolSnapshot::load(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(missing, SchoolError::FileNotFound { .. }));

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        let err = SchoolSnapshot::load(&corrupt).unwrap_err();
        assert!(matches!(err, SchoolError::SnapshotError { .. }));
    }
}
