//! School record registry
//!
//! This module provides the `SchoolRegistry` struct which owns every
//! reference table of the school: villages, classes, academic years,
//! students, fee configuration, miscellaneous charges, transition history
//! and the settings blob store.
//!
//! The registry is responsible for:
//! - Assigning sequential IDs to new rows
//! - Validating fields (non-empty names, non-negative amounts, date ranges)
//! - Enforcing unique keys and referential integrity on insert and removal
//!
//! Payments are kept separately in the fee ledger; removing a student that
//! still has payments is checked by the engine.

use crate::types::{
    AcademicYear, AcademicYearId, AcademicYearTransition, BusFeeId, BusFeeStructure,
    CategoryId, ChargeCategory, ChargeId, Class, ClassId, FeeStructure, FeeStructureId, FeeType,
    FeeTypeId, MiscellaneousCharge, NewStudent, PromotionHistory, SchoolError, Student,
    StudentId, StudentStatus, TransitionId, Village, VillageId,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Owns all school reference tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchoolRegistry {
    villages: BTreeMap<VillageId, Village>,
    classes: BTreeMap<ClassId, Class>,
    academic_years: BTreeMap<AcademicYearId, AcademicYear>,
    students: BTreeMap<StudentId, Student>,
    fee_types: BTreeMap<FeeTypeId, FeeType>,
    fee_structures: BTreeMap<FeeStructureId, FeeStructure>,
    bus_fees: BTreeMap<BusFeeId, BusFeeStructure>,
    charge_categories: BTreeMap<CategoryId, ChargeCategory>,
    misc_charges: BTreeMap<ChargeId, MiscellaneousCharge>,
    transitions: BTreeMap<TransitionId, AcademicYearTransition>,
    promotion_history: Vec<PromotionHistory>,
    settings: BTreeMap<String, serde_json::Value>,
}

/// Flat, serializable form of the registry (one list per table)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryTables {
    pub villages: Vec<Village>,
    pub classes: Vec<Class>,
    pub academic_years: Vec<AcademicYear>,
    pub students: Vec<Student>,
    pub fee_types: Vec<FeeType>,
    pub fee_structure: Vec<FeeStructure>,
    pub bus_fee_structure: Vec<BusFeeStructure>,
    pub charge_categories: Vec<ChargeCategory>,
    pub miscellaneous_charges: Vec<MiscellaneousCharge>,
    pub academic_year_transitions: Vec<AcademicYearTransition>,
    pub student_promotion_history: Vec<PromotionHistory>,
    pub settings: BTreeMap<String, serde_json::Value>,
}

fn next_id<T>(entity: &str, table: &BTreeMap<u32, T>) -> Result<u32, SchoolError> {
    match table.keys().next_back() {
        None => Ok(1),
        Some(last) => last
            .checked_add(1)
            .ok_or_else(|| SchoolError::validation(entity, "no IDs left above the highest ID")),
    }
}

fn required_name(entity: &str, name: &str) -> Result<String, SchoolError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SchoolError::validation(entity, "name must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn non_negative(entity: &str, field: &str, amount: Decimal) -> Result<(), SchoolError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(SchoolError::validation(
            entity,
            format!("{} must not be negative (got {})", field, amount),
        ));
    }
    Ok(())
}

impl SchoolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from its flat form
    pub fn from_tables(tables: RegistryTables) -> Self {
        fn keyed<T>(rows: Vec<T>, key: impl Fn(&T) -> u32) -> BTreeMap<u32, T> {
            rows.into_iter().map(|row| (key(&row), row)).collect()
        }

        Self {
            villages: keyed(tables.villages, |v| v.id),
            classes: keyed(tables.classes, |c| c.id),
            academic_years: keyed(tables.academic_years, |y| y.id),
            students: keyed(tables.students, |s| s.id),
            fee_types: keyed(tables.fee_types, |f| f.id),
            fee_structures: keyed(tables.fee_structure, |f| f.id),
            bus_fees: keyed(tables.bus_fee_structure, |b| b.id),
            charge_categories: keyed(tables.charge_categories, |c| c.id),
            misc_charges: keyed(tables.miscellaneous_charges, |m| m.id),
            transitions: keyed(tables.academic_year_transitions, |t| t.id),
            promotion_history: tables.student_promotion_history,
            settings: tables.settings,
        }
    }

    /// Flatten the registry for serialization
    pub fn to_tables(&self) -> RegistryTables {
        RegistryTables {
            villages: self.villages.values().cloned().collect(),
            classes: self.classes.values().cloned().collect(),
            academic_years: self.academic_years.values().cloned().collect(),
            students: self.students.values().cloned().collect(),
            fee_types: self.fee_types.values().cloned().collect(),
            fee_structure: self.fee_structures.values().cloned().collect(),
            bus_fee_structure: self.bus_fees.values().cloned().collect(),
            charge_categories: self.charge_categories.values().cloned().collect(),
            miscellaneous_charges: self.misc_charges.values().cloned().collect(),
            academic_year_transitions: self.transitions.values().cloned().collect(),
            student_promotion_history: self.promotion_history.clone(),
            settings: self.settings.clone(),
        }
    }

    // ---- villages ----

    /// Add a village; names are unique ignoring case
    pub fn add_village(
        &mut self,
        name: &str,
        distance_km: Decimal,
        bus_number: Option<String>,
    ) -> Result<VillageId, SchoolError> {
        let name = required_name("village", name)?;
        non_negative("village", "distance_km", distance_km)?;
        if self.village_by_name(&name).is_some() {
            return Err(SchoolError::duplicate("Village", name));
        }

        let id = next_id("village", &self.villages)?;
        self.villages.insert(
            id,
            Village {
                id,
                name,
                distance_km,
                bus_number,
                is_active: true,
            },
        );
        Ok(id)
    }

    /// Replace a village row
    pub fn update_village(&mut self, village: Village) -> Result<(), SchoolError> {
        if !self.villages.contains_key(&village.id) {
            return Err(SchoolError::not_found("Village", village.id));
        }
        let name = required_name("village", &village.name)?;
        non_negative("village", "distance_km", village.distance_km)?;
        if let Some(other) = self.village_by_name(&name) {
            if other.id != village.id {
                return Err(SchoolError::duplicate("Village", name));
            }
        }

        self.villages.insert(village.id, Village { name, ..village });
        Ok(())
    }

    /// Remove a village no student or bus fee refers to
    pub fn remove_village(&mut self, id: VillageId) -> Result<Village, SchoolError> {
        if !self.villages.contains_key(&id) {
            return Err(SchoolError::not_found("Village", id));
        }
        if self.students.values().any(|s| s.village_id == Some(id)) {
            return Err(SchoolError::in_use("Village", id, "students"));
        }
        if self.bus_fees.values().any(|b| b.village_id == id) {
            return Err(SchoolError::in_use("Village", id, "bus_fee_structure"));
        }
        self.villages
            .remove(&id)
            .ok_or_else(|| SchoolError::not_found("Village", id))
    }

    pub fn village(&self, id: VillageId) -> Option<&Village> {
        self.villages.get(&id)
    }

    pub fn village_by_name(&self, name: &str) -> Option<&Village> {
        let name = name.trim();
        self.villages
            .values()
            .find(|v| v.name.eq_ignore_ascii_case(name))
    }

    pub fn villages(&self) -> impl Iterator<Item = &Village> {
        self.villages.values()
    }

    // ---- classes ----

    /// Add a class; both the name and the grade order must be unique
    pub fn add_class(&mut self, name: &str, grade_order: u32) -> Result<ClassId, SchoolError> {
        let name = required_name("class", name)?;
        if self.class_by_name(&name).is_some() {
            return Err(SchoolError::duplicate("Class", name));
        }
        if self.classes.values().any(|c| c.grade_order == grade_order) {
            return Err(SchoolError::duplicate(
                "Class grade order",
                grade_order.to_string(),
            ));
        }

        let id = next_id("class", &self.classes)?;
        self.classes.insert(
            id,
            Class {
                id,
                name,
                grade_order,
            },
        );
        Ok(id)
    }

    /// Remove a class no student or fee structure refers to
    pub fn remove_class(&mut self, id: ClassId) -> Result<Class, SchoolError> {
        if !self.classes.contains_key(&id) {
            return Err(SchoolError::not_found("Class", id));
        }
        if self.students.values().any(|s| s.class_id == id) {
            return Err(SchoolError::in_use("Class", id, "students"));
        }
        if self.fee_structures.values().any(|f| f.class_id == id) {
            return Err(SchoolError::in_use("Class", id, "fee_structure"));
        }
        self.classes
            .remove(&id)
            .ok_or_else(|| SchoolError::not_found("Class", id))
    }

    pub fn class(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(&id)
    }

    pub fn class_by_name(&self, name: &str) -> Option<&Class> {
        let name = name.trim();
        self.classes
            .values()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// All classes in promotion order
    pub fn classes(&self) -> Vec<&Class> {
        let mut classes: Vec<&Class> = self.classes.values().collect();
        classes.sort_by_key(|c| c.grade_order);
        classes
    }

    /// The class a student of `id` is promoted into, if any
    pub fn next_class(&self, id: ClassId) -> Option<&Class> {
        let current = self.classes.get(&id)?;
        self.classes
            .values()
            .filter(|c| c.grade_order > current.grade_order)
            .min_by_key(|c| c.grade_order)
    }

    // ---- academic years ----

    pub fn add_academic_year(
        &mut self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<AcademicYearId, SchoolError> {
        let name = required_name("academic year", name)?;
        if start_date >= end_date {
            return Err(SchoolError::validation(
                "academic year",
                format!("start {} must be before end {}", start_date, end_date),
            ));
        }
        if self
            .academic_years
            .values()
            .any(|y| y.name.eq_ignore_ascii_case(&name))
        {
            return Err(SchoolError::duplicate("Academic year", name));
        }

        let id = next_id("academic year", &self.academic_years)?;
        let is_current = self.academic_years.is_empty();
        self.academic_years.insert(
            id,
            AcademicYear {
                id,
                name,
                start_date,
                end_date,
                is_current,
            },
        );
        Ok(id)
    }

    /// Mark one academic year as current and clear the flag on the others
    pub fn set_current_year(&mut self, id: AcademicYearId) -> Result<(), SchoolError> {
        if !self.academic_years.contains_key(&id) {
            return Err(SchoolError::not_found("Academic year", id));
        }
        for year in self.academic_years.values_mut() {
            year.is_current = year.id == id;
        }
        Ok(())
    }

    pub fn academic_year(&self, id: AcademicYearId) -> Option<&AcademicYear> {
        self.academic_years.get(&id)
    }

    pub fn current_year(&self) -> Option<&AcademicYear> {
        self.academic_years.values().find(|y| y.is_current)
    }

    pub fn academic_years(&self) -> impl Iterator<Item = &AcademicYear> {
        self.academic_years.values()
    }

    pub(crate) fn require_year(&self, id: AcademicYearId) -> Result<&AcademicYear, SchoolError> {
        self.academic_years
            .get(&id)
            .ok_or_else(|| SchoolError::not_found("Academic year", id))
    }

    // ---- students ----

    /// Register a new active student
    pub fn register_student(&mut self, new: NewStudent) -> Result<StudentId, SchoolError> {
        let id = next_id("student", &self.students)?;
        let student = Student {
            id,
            admission_number: new.admission_number,
            first_name: new.first_name,
            last_name: new.last_name,
            class_id: new.class_id,
            village_id: new.village_id,
            uses_school_bus: new.uses_school_bus,
            academic_year_id: new.academic_year_id,
            status: StudentStatus::Active,
            admission_date: new.admission_date,
            guardian_phone: new.guardian_phone,
        };
        let student = self.validate_student(student)?;
        self.students.insert(id, student);
        Ok(id)
    }

    /// Replace a student row after validating it like a new registration
    pub fn update_student(&mut self, student: Student) -> Result<(), SchoolError> {
        if !self.students.contains_key(&student.id) {
            return Err(SchoolError::not_found("Student", student.id));
        }
        let student = self.validate_student(student)?;
        self.students.insert(student.id, student);
        Ok(())
    }

    fn validate_student(&self, mut student: Student) -> Result<Student, SchoolError> {
        student.admission_number = student.admission_number.trim().to_string();
        student.first_name = student.first_name.trim().to_string();
        student.last_name = student.last_name.trim().to_string();

        if student.admission_number.is_empty() {
            return Err(SchoolError::validation(
                "student",
                "admission number must not be empty",
            ));
        }
        if student.first_name.is_empty() {
            return Err(SchoolError::validation(
                "student",
                "first name must not be empty",
            ));
        }
        if let Some(other) = self.student_by_admission(&student.admission_number) {
            if other.id != student.id {
                return Err(SchoolError::duplicate(
                    "Student",
                    student.admission_number.clone(),
                ));
            }
        }
        if !self.classes.contains_key(&student.class_id) {
            return Err(SchoolError::not_found("Class", student.class_id));
        }
        self.require_year(student.academic_year_id)?;
        match student.village_id {
            Some(village) if !self.villages.contains_key(&village) => {
                return Err(SchoolError::not_found("Village", village));
            }
            None if student.uses_school_bus => {
                return Err(SchoolError::validation(
                    "student",
                    "a school bus user needs a village",
                ));
            }
            _ => {}
        }
        if let Some(phone) = student.guardian_phone.as_deref() {
            let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
            if digits < 7 || phone.chars().any(|c| c.is_alphabetic()) {
                return Err(SchoolError::validation(
                    "student",
                    format!("invalid guardian phone '{}'", phone),
                ));
            }
        }
        Ok(student)
    }

    /// Remove a student and nothing else
    ///
    /// Rejected while miscellaneous charges are billed to the student.
    pub fn remove_student(&mut self, id: StudentId) -> Result<Student, SchoolError> {
        if !self.students.contains_key(&id) {
            return Err(SchoolError::not_found("Student", id));
        }
        if self.misc_charges.values().any(|m| m.student_id == id) {
            return Err(SchoolError::in_use("Student", id, "miscellaneous_charges"));
        }
        self.students
            .remove(&id)
            .ok_or_else(|| SchoolError::not_found("Student", id))
    }

    pub fn set_student_status(
        &mut self,
        id: StudentId,
        status: StudentStatus,
    ) -> Result<(), SchoolError> {
        let student = self
            .students
            .get_mut(&id)
            .ok_or_else(|| SchoolError::not_found("Student", id))?;
        student.status = status;
        Ok(())
    }

    pub fn student(&self, id: StudentId) -> Option<&Student> {
        self.students.get(&id)
    }

    pub fn student_by_admission(&self, admission_number: &str) -> Option<&Student> {
        let admission_number = admission_number.trim();
        self.students
            .values()
            .find(|s| s.admission_number.eq_ignore_ascii_case(admission_number))
    }

    /// All students ordered by ID
    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.students.values()
    }

    /// Students whose class assignment belongs to `year`
    pub fn students_in_year(&self, year: AcademicYearId) -> impl Iterator<Item = &Student> {
        self.students
            .values()
            .filter(move |s| s.academic_year_id == year)
    }

    /// Students who were enrolled during `year`, ordered by ID
    ///
    /// Covers both students currently assigned to the year and students a
    /// transition has since moved out of it.
    pub fn students_enrolled_in(&self, year: AcademicYearId) -> Vec<&Student> {
        self.students
            .values()
            .filter(|s| self.was_enrolled(s, year))
            .collect()
    }

    /// Whether the student is assigned to `year` or a transition moved them out of it
    pub fn was_enrolled(&self, student: &Student, year: AcademicYearId) -> bool {
        student.academic_year_id == year
            || self
                .promotion_history
                .iter()
                .any(|h| h.student_id == student.id && h.from_year == year)
    }

    /// The class a student attended during `year`
    pub fn class_in_year(&self, student: &Student, year: AcademicYearId) -> ClassId {
        if student.academic_year_id == year {
            return student.class_id;
        }
        self.promotion_history
            .iter()
            .find(|h| h.student_id == student.id && h.from_year == year)
            .map_or(student.class_id, |h| h.from_class)
    }

    pub(crate) fn require_student(&self, id: StudentId) -> Result<&Student, SchoolError> {
        self.students
            .get(&id)
            .ok_or_else(|| SchoolError::not_found("Student", id))
    }

    pub(crate) fn student_mut(&mut self, id: StudentId) -> Option<&mut Student> {
        self.students.get_mut(&id)
    }

    // ---- fee types & structures ----

    pub fn add_fee_type(
        &mut self,
        name: &str,
        description: Option<String>,
    ) -> Result<FeeTypeId, SchoolError> {
        let name = required_name("fee type", name)?;
        if self
            .fee_types
            .values()
            .any(|f| f.name.eq_ignore_ascii_case(&name))
        {
            return Err(SchoolError::duplicate("Fee type", name));
        }

        let id = next_id("fee type", &self.fee_types)?;
        self.fee_types.insert(
            id,
            FeeType {
                id,
                name,
                description,
            },
        );
        Ok(id)
    }

    pub fn remove_fee_type(&mut self, id: FeeTypeId) -> Result<FeeType, SchoolError> {
        if !self.fee_types.contains_key(&id) {
            return Err(SchoolError::not_found("Fee type", id));
        }
        if self.fee_structures.values().any(|f| f.fee_type_id == id) {
            return Err(SchoolError::in_use("Fee type", id, "fee_structure"));
        }
        self.fee_types
            .remove(&id)
            .ok_or_else(|| SchoolError::not_found("Fee type", id))
    }

    pub fn fee_type(&self, id: FeeTypeId) -> Option<&FeeType> {
        self.fee_types.get(&id)
    }

    /// Add a fee line for a class in an academic year
    ///
    /// Each fee type may appear once per (class, year).
    pub fn add_fee_structure(
        &mut self,
        class_id: ClassId,
        academic_year_id: AcademicYearId,
        fee_type_id: FeeTypeId,
        amount: Decimal,
        recurring_monthly: bool,
    ) -> Result<FeeStructureId, SchoolError> {
        if !self.classes.contains_key(&class_id) {
            return Err(SchoolError::not_found("Class", class_id));
        }
        self.require_year(academic_year_id)?;
        let fee_type = self
            .fee_types
            .get(&fee_type_id)
            .ok_or_else(|| SchoolError::not_found("Fee type", fee_type_id))?;
        non_negative("fee structure", "amount", amount)?;
        if self.fee_structures.values().any(|f| {
            f.class_id == class_id
                && f.academic_year_id == academic_year_id
                && f.fee_type_id == fee_type_id
        }) {
            return Err(SchoolError::duplicate(
                "Fee structure",
                format!(
                    "{} for class {} in year {}",
                    fee_type.name, class_id, academic_year_id
                ),
            ));
        }

        let id = next_id("fee structure", &self.fee_structures)?;
        self.fee_structures.insert(
            id,
            FeeStructure {
                id,
                class_id,
                academic_year_id,
                fee_type_id,
                amount,
                recurring_monthly,
            },
        );
        Ok(id)
    }

    pub fn remove_fee_structure(
        &mut self,
        id: FeeStructureId,
    ) -> Result<FeeStructure, SchoolError> {
        self.fee_structures
            .remove(&id)
            .ok_or_else(|| SchoolError::not_found("Fee structure", id))
    }

    /// Fee lines of one class in one academic year
    pub fn fee_structures_for(
        &self,
        class_id: ClassId,
        academic_year_id: AcademicYearId,
    ) -> impl Iterator<Item = &FeeStructure> {
        self.fee_structures.values().filter(move |f| {
            f.class_id == class_id && f.academic_year_id == academic_year_id
        })
    }

    // ---- bus fees ----

    /// Set the monthly bus fee for a village in an academic year
    pub fn add_bus_fee(
        &mut self,
        village_id: VillageId,
        academic_year_id: AcademicYearId,
        monthly_fee: Decimal,
    ) -> Result<BusFeeId, SchoolError> {
        if !self.villages.contains_key(&village_id) {
            return Err(SchoolError::not_found("Village", village_id));
        }
        self.require_year(academic_year_id)?;
        non_negative("bus fee", "monthly_fee", monthly_fee)?;
        if self.bus_fee_for(village_id, academic_year_id).is_some() {
            return Err(SchoolError::duplicate(
                "Bus fee",
                format!("village {} in year {}", village_id, academic_year_id),
            ));
        }

        let id = next_id("bus fee", &self.bus_fees)?;
        self.bus_fees.insert(
            id,
            BusFeeStructure {
                id,
                village_id,
                academic_year_id,
                monthly_fee,
                is_active: true,
            },
        );
        Ok(id)
    }

    pub fn remove_bus_fee(&mut self, id: BusFeeId) -> Result<BusFeeStructure, SchoolError> {
        self.bus_fees
            .remove(&id)
            .ok_or_else(|| SchoolError::not_found("Bus fee", id))
    }

    /// The active bus fee for a village in a year
    pub fn bus_fee_for(
        &self,
        village_id: VillageId,
        academic_year_id: AcademicYearId,
    ) -> Option<&BusFeeStructure> {
        self.bus_fees.values().find(|b| {
            b.is_active && b.village_id == village_id && b.academic_year_id == academic_year_id
        })
    }

    // ---- charge categories & miscellaneous charges ----

    pub fn add_charge_category(
        &mut self,
        name: &str,
        description: Option<String>,
    ) -> Result<CategoryId, SchoolError> {
        let name = required_name("charge category", name)?;
        if self
            .charge_categories
            .values()
            .any(|c| c.name.eq_ignore_ascii_case(&name))
        {
            return Err(SchoolError::duplicate("Charge category", name));
        }

        let id = next_id("charge category", &self.charge_categories)?;
        self.charge_categories.insert(
            id,
            ChargeCategory {
                id,
                name,
                description,
            },
        );
        Ok(id)
    }

    pub fn remove_charge_category(
        &mut self,
        id: CategoryId,
    ) -> Result<ChargeCategory, SchoolError> {
        if !self.charge_categories.contains_key(&id) {
            return Err(SchoolError::not_found("Charge category", id));
        }
        if self.misc_charges.values().any(|m| m.category_id == id) {
            return Err(SchoolError::in_use(
                "Charge category",
                id,
                "miscellaneous_charges",
            ));
        }
        self.charge_categories
            .remove(&id)
            .ok_or_else(|| SchoolError::not_found("Charge category", id))
    }

    pub fn charge_category(&self, id: CategoryId) -> Option<&ChargeCategory> {
        self.charge_categories.get(&id)
    }

    /// Bill a one-off charge to a student
    ///
    /// The charge date must fall inside the academic year.
    pub fn add_misc_charge(
        &mut self,
        student_id: StudentId,
        academic_year_id: AcademicYearId,
        category_id: CategoryId,
        amount: Decimal,
        description: Option<String>,
        charge_date: NaiveDate,
    ) -> Result<ChargeId, SchoolError> {
        self.require_student(student_id)?;
        let year = self.require_year(academic_year_id)?;
        if !year.contains(charge_date) {
            return Err(SchoolError::validation(
                "miscellaneous charge",
                format!("date {} is outside academic year {}", charge_date, year.name),
            ));
        }
        if !self.charge_categories.contains_key(&category_id) {
            return Err(SchoolError::not_found("Charge category", category_id));
        }
        if amount <= Decimal::ZERO {
            return Err(SchoolError::validation(
                "miscellaneous charge",
                format!("amount must be positive (got {})", amount),
            ));
        }

        let id = next_id("miscellaneous charge", &self.misc_charges)?;
        self.misc_charges.insert(
            id,
            MiscellaneousCharge {
                id,
                student_id,
                academic_year_id,
                category_id,
                amount,
                description,
                charge_date,
            },
        );
        Ok(id)
    }

    pub fn remove_misc_charge(&mut self, id: ChargeId) -> Result<MiscellaneousCharge, SchoolError> {
        self.misc_charges
            .remove(&id)
            .ok_or_else(|| SchoolError::not_found("Miscellaneous charge", id))
    }

    pub fn misc_charges_for(
        &self,
        student_id: StudentId,
        academic_year_id: AcademicYearId,
    ) -> impl Iterator<Item = &MiscellaneousCharge> {
        self.misc_charges.values().filter(move |m| {
            m.student_id == student_id && m.academic_year_id == academic_year_id
        })
    }

    // ---- transitions & settings ----

    pub fn transitions(&self) -> impl Iterator<Item = &AcademicYearTransition> {
        self.transitions.values()
    }

    pub fn transition_between(
        &self,
        from: AcademicYearId,
        to: AcademicYearId,
    ) -> Option<&AcademicYearTransition> {
        self.transitions
            .values()
            .find(|t| t.from_year == from && t.to_year == to)
    }

    pub fn promotion_history(&self) -> &[PromotionHistory] {
        &self.promotion_history
    }

    pub(crate) fn next_transition_id(&self) -> Result<TransitionId, SchoolError> {
        next_id("academic year transition", &self.transitions)
    }

    pub(crate) fn record_transition(
        &mut self,
        transition: AcademicYearTransition,
        history: Vec<PromotionHistory>,
    ) {
        self.transitions.insert(transition.id, transition);
        self.promotion_history.extend(history);
    }

    pub fn put_setting(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.settings.insert(key.into(), value);
    }

    pub fn setting(&self, key: &str) -> Option<&serde_json::Value> {
        self.settings.get(key)
    }
}
