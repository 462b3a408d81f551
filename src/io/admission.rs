//! Bulk student admission from CSV
//!
//! ```text
//! admission_number,first_name,last_name,class,village,uses_school_bus,admission_date,guardian_phone
//! ADM-101,Kiran,Shetty,Class 1,Riverside,yes,2024-06-03,9845012345
//! ```
//!
//! Class and village are given by name and resolved against the registry.
//! Students join the current academic year. Every row is validated and
//! inserted on its own, so one bad row never blocks the rest of the file.

use crate::core::engine::resolve_year;
use crate::core::registry::SchoolRegistry;
use crate::io::csv_format::parse_date;
use crate::io::sync_reader::open_file;
use crate::types::{AcademicYearId, NewStudent, SchoolError, StudentId};
use chrono::{Local, NaiveDate};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// One row of an admission file
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct AdmissionCsvRecord {
    pub admission_number: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub class: String,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub uses_school_bus: Option<String>,
    #[serde(default)]
    pub admission_date: Option<String>,
    #[serde(default)]
    pub guardian_phone: Option<String>,
}

/// Outcome of a bulk admission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// IDs of the students created, in file order
    pub inserted: Vec<StudentId>,
    /// Rejected rows as (line number, reason); the header is line 1
    pub failed: Vec<(u64, String)>,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.inserted.len() + self.failed.len()
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_flag(raw: Option<&str>) -> Result<bool, String> {
    match raw.map(str::to_lowercase).as_deref() {
        None | Some("no") | Some("n") | Some("false") | Some("0") => Ok(false),
        Some("yes") | Some("y") | Some("true") | Some("1") => Ok(true),
        Some(other) => Err(format!("Invalid uses_school_bus value '{}'", other)),
    }
}

/// Resolve names and defaults of one row into a `NewStudent`
fn to_new_student(
    registry: &SchoolRegistry,
    row: AdmissionCsvRecord,
    year: AcademicYearId,
    today: NaiveDate,
) -> Result<NewStudent, String> {
    let class = registry
        .class_by_name(row.class.trim())
        .ok_or_else(|| format!("Unknown class '{}'", row.class.trim()))?;

    let village_id = match non_empty(&row.village) {
        Some(name) => Some(
            registry
                .village_by_name(name)
                .ok_or_else(|| format!("Unknown village '{}'", name))?
                .id,
        ),
        None => None,
    };

    let admission_date = match non_empty(&row.admission_date) {
        Some(raw) => parse_date(raw)?,
        None => today,
    };

    Ok(NewStudent {
        admission_number: row.admission_number,
        first_name: row.first_name,
        last_name: non_empty(&row.last_name).unwrap_or_default().to_string(),
        class_id: class.id,
        village_id,
        uses_school_bus: parse_flag(non_empty(&row.uses_school_bus))?,
        academic_year_id: year,
        admission_date,
        guardian_phone: non_empty(&row.guardian_phone).map(str::to_string),
    })
}

/// Admit every student listed in an admission CSV
///
/// # Errors
///
/// Only fatal problems are returned: the file cannot be opened or there is
/// no current academic year. Row problems end up in
/// [`ImportSummary::failed`].
pub fn import_admissions(
    registry: &mut SchoolRegistry,
    path: &Path,
) -> Result<ImportSummary, SchoolError> {
    let file = open_file(path)?;
    import_admissions_from(registry, file, Local::now().date_naive())
}

/// Admit students from any reader; rows without a date use `today`
pub fn import_admissions_from<R: Read>(
    registry: &mut SchoolRegistry,
    input: R,
    today: NaiveDate,
) -> Result<ImportSummary, SchoolError> {
    let year = resolve_year(registry, None)?;
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input);

    let mut summary = ImportSummary::default();
    for (index, row) in reader.deserialize::<AdmissionCsvRecord>().enumerate() {
        let line = index as u64 + 2;
        let admitted = row
            .map_err(|e| e.to_string())
            .and_then(|row| to_new_student(registry, row, year, today))
            .and_then(|new| registry.register_student(new).map_err(|e| e.to_string()));

        match admitted {
            Ok(id) => summary.inserted.push(id),
            Err(reason) => {
                warn!(line, reason = %reason, "admission row rejected");
                summary.failed.push((line, reason));
            }
        }
    }

    info!(
        academic_year = year,
        inserted = summary.inserted.len(),
        failed = summary.failed.len(),
        "bulk admission finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{date, sample_registry};
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "admission_number,first_name,last_name,class,village,uses_school_bus,admission_date,guardian_phone\n";

    fn import(rows: &str) -> (SchoolRegistry, ImportSummary) {
        let mut registry = sample_registry();
        let input = format!("{}{}", HEADER, rows);
        let summary =
            import_admissions_from(&mut registry, input.as_bytes(), date(2024, 6, 1)).unwrap();
        (registry, summary)
    }

    #[test]
    fn test_import_resolves_names_and_defaults() {
        let (registry, summary) = import(
            "ADM-101,Kiran,Shetty,class 2,riverside,yes,2024-06-03,98450 11111\n\
             ADM-102,Nila,,Class 1,,,,\n",
        );

        assert_eq!(summary.inserted.len(), 2);
        assert!(summary.failed.is_empty());

        let kiran = registry.student_by_admission("ADM-101").unwrap();
        assert_eq!(kiran.class_id, 2);
        assert_eq!(kiran.village_id, Some(1));
        assert!(kiran.uses_school_bus);
        assert_eq!(kiran.academic_year_id, 1);
        assert_eq!(kiran.admission_date, date(2024, 6, 3));

        let nila = registry.student_by_admission("ADM-102").unwrap();
        assert_eq!(nila.last_name, "");
        assert_eq!(nila.village_id, None);
        assert!(!nila.uses_school_bus);
        assert_eq!(nila.admission_date, date(2024, 6, 1));
        assert_eq!(nila.guardian_phone, None);
    }

    #[rstest]
    #[case::unknown_class("ADM-201,A,B,Class 9,,no,,\n", "Unknown class")]
    #[case::unknown_village("ADM-201,A,B,Class 1,Lakeside,no,,\n", "Unknown village")]
    #[case::bad_flag("ADM-201,A,B,Class 1,,maybe,,\n", "uses_school_bus")]
    #[case::bad_date("ADM-201,A,B,Class 1,,no,03/06/2024,\n", "Invalid date")]
    #[case::duplicate_admission("ADM-001,A,B,Class 1,,no,,\n", "ADM-001")]
    #[case::bus_without_village("ADM-201,A,B,Class 1,,yes,,\n", "village")]
    fn test_rejected_rows(#[case] row: &str, #[case] reason: &str) {
        let (registry, summary) = import(row);

        assert!(summary.inserted.is_empty());
        assert_eq!(summary.failed.len(), 1);
        let (line, message) = &summary.failed[0];
        assert_eq!(*line, 2);
        assert!(message.contains(reason), "got: {}", message);
        assert_eq!(registry.students().count(), 3);
    }

    #[test]
    fn test_bad_rows_do_not_block_others() {
        let (registry, summary) = import(
            "ADM-301,Tara,Iyer,Class 3,Hilltop,y,,\n\
             ADM-302,Bad,Row,Class 7,,,,\n\
             ADM-303,Dev,Nair,Class 1,,,,\n",
        );

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.inserted.len(), 2);
        assert_eq!(summary.failed[0].0, 3);
        assert!(registry.student_by_admission("ADM-303").is_some());
    }

    #[test]
    fn test_import_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}ADM-401,Uma,Rao,Class 1,Riverside,yes,2024-07-01,", HEADER).unwrap();
        file.flush().unwrap();

        let mut registry = sample_registry();
        let summary = import_admissions(&mut registry, file.path()).unwrap();
        assert_eq!(summary.inserted, vec![4]);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let mut registry = sample_registry();
        let err = import_admissions(&mut registry, Path::new("missing-admissions.csv"))
            .unwrap_err();
        assert!(matches!(err, SchoolError::FileNotFound { .. }));
    }
}
