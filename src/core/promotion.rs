//! Academic-year transition
//!
//! Moves every active student of one academic year into the next: promoted
//! to the next class, retained in the same class, transferred out, or
//! graduated. Students in the highest class graduate unless told otherwise.
//!
//! # Atomicity
//!
//! The whole cohort is planned and validated before the registry is touched.
//! Applying the plan cannot fail, so a rejected request leaves the registry
//! exactly as it was.
//!
//! # Idempotency
//!
//! A completed transition is recorded in the registry; running the same
//! transition again is rejected with `TransitionAlreadyCompleted`.

use crate::core::registry::SchoolRegistry;
use crate::types::{
    AcademicYearId, AcademicYearTransition, ClassId, PromotionAction, PromotionHistory,
    SchoolError, StudentId, StudentStatus,
};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Parameters of one academic-year transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionRequest {
    pub from_year: AcademicYearId,
    pub to_year: AcademicYearId,
    /// Students kept in their current class
    pub retain: BTreeSet<StudentId>,
    /// Students leaving the school
    pub transfer: BTreeSet<StudentId>,
    /// Students graduating regardless of class
    pub graduate: BTreeSet<StudentId>,
    pub executed_on: NaiveDate,
}

impl PromotionRequest {
    /// A request with no per-student overrides
    pub fn new(from_year: AcademicYearId, to_year: AcademicYearId, executed_on: NaiveDate) -> Self {
        Self {
            from_year,
            to_year,
            retain: BTreeSet::new(),
            transfer: BTreeSet::new(),
            graduate: BTreeSet::new(),
            executed_on,
        }
    }

    fn override_for(&self, student: StudentId) -> Option<PromotionAction> {
        if self.retain.contains(&student) {
            Some(PromotionAction::Retain)
        } else if self.transfer.contains(&student) {
            Some(PromotionAction::Transfer)
        } else if self.graduate.contains(&student) {
            Some(PromotionAction::Graduate)
        } else {
            None
        }
    }

    fn overridden(&self) -> impl Iterator<Item = &StudentId> {
        self.retain
            .iter()
            .chain(self.transfer.iter())
            .chain(self.graduate.iter())
    }
}

/// What a completed transition did
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionOutcome {
    pub transition: AcademicYearTransition,
    pub history: Vec<PromotionHistory>,
}

struct PlannedMove {
    student: StudentId,
    from_class: ClassId,
    to_class: Option<ClassId>,
    action: PromotionAction,
}

/// Run an academic-year transition
///
/// # Errors
///
/// * `SameAcademicYear` if both years are the same
/// * `NotFound` if either year does not exist
/// * `TransitionAlreadyCompleted` if this transition already ran
/// * `NoStudentsToPromote` if the source year has no active students
/// * `Validation` if an override names a student outside the cohort or
///   names a student more than once
pub fn promote_students(
    registry: &mut SchoolRegistry,
    request: &PromotionRequest,
) -> Result<PromotionOutcome, SchoolError> {
    let plan = plan_transition(registry, request)?;

    let transition_id = registry.next_transition_id()?;
    let mut transition = AcademicYearTransition {
        id: transition_id,
        from_year: request.from_year,
        to_year: request.to_year,
        promoted: 0,
        retained: 0,
        transferred: 0,
        graduated: 0,
        executed_on: request.executed_on,
    };
    let mut history = Vec::with_capacity(plan.len());

    for step in plan {
        if let Some(student) = registry.student_mut(step.student) {
            match step.action {
                PromotionAction::Promote | PromotionAction::Retain => {
                    student.class_id = step.to_class.unwrap_or(step.from_class);
                    student.academic_year_id = request.to_year;
                }
                PromotionAction::Transfer => student.status = StudentStatus::Transferred,
                PromotionAction::Graduate => student.status = StudentStatus::Graduated,
            }
        }
        match step.action {
            PromotionAction::Promote => transition.promoted += 1,
            PromotionAction::Retain => transition.retained += 1,
            PromotionAction::Transfer => transition.transferred += 1,
            PromotionAction::Graduate => transition.graduated += 1,
        }
        debug!(student = step.student, action = %step.action, "student moved");
        history.push(PromotionHistory {
            transition_id,
            student_id: step.student,
            from_year: request.from_year,
            to_year: request.to_year,
            from_class: step.from_class,
            to_class: step.to_class,
            action: step.action,
        });
    }

    registry.record_transition(transition.clone(), history.clone());
    registry.set_current_year(request.to_year)?;

    info!(
        from = request.from_year,
        to = request.to_year,
        promoted = transition.promoted,
        retained = transition.retained,
        transferred = transition.transferred,
        graduated = transition.graduated,
        "academic year transition completed"
    );

    Ok(PromotionOutcome {
        transition,
        history,
    })
}

fn plan_transition(
    registry: &SchoolRegistry,
    request: &PromotionRequest,
) -> Result<Vec<PlannedMove>, SchoolError> {
    if request.from_year == request.to_year {
        return Err(SchoolError::SameAcademicYear {
            year: request.from_year,
        });
    }
    registry.require_year(request.from_year)?;
    registry.require_year(request.to_year)?;
    if registry
        .transition_between(request.from_year, request.to_year)
        .is_some()
    {
        return Err(SchoolError::TransitionAlreadyCompleted {
            from: request.from_year,
            to: request.to_year,
        });
    }

    let cohort: Vec<_> = registry
        .students_in_year(request.from_year)
        .filter(|s| s.is_active())
        .collect();
    if cohort.is_empty() {
        return Err(SchoolError::NoStudentsToPromote {
            year: request.from_year,
        });
    }

    let mut seen = BTreeSet::new();
    for id in request.overridden() {
        if !seen.insert(*id) {
            return Err(SchoolError::validation(
                "promotion",
                format!("student {} has more than one override", id),
            ));
        }
        if !cohort.iter().any(|s| s.id == *id) {
            return Err(SchoolError::validation(
                "promotion",
                format!(
                    "student {} is not an active student of academic year {}",
                    id, request.from_year
                ),
            ));
        }
    }

    Ok(cohort
        .into_iter()
        .map(|student| {
            let next = registry.next_class(student.class_id).map(|c| c.id);
            let action = request.override_for(student.id).unwrap_or(match next {
                Some(_) => PromotionAction::Promote,
                None => PromotionAction::Graduate,
            });
            let to_class = match action {
                PromotionAction::Promote => next,
                PromotionAction::Retain => Some(student.class_id),
                PromotionAction::Transfer | PromotionAction::Graduate => None,
            };
            PlannedMove {
                student: student.id,
                from_class: student.class_id,
                to_class,
                action,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{date, sample_registry};
    use rstest::rstest;

    fn request() -> PromotionRequest {
        PromotionRequest::new(1, 2, date(2025, 3, 31))
    }

    #[test]
    fn test_default_actions() {
        let mut registry = sample_registry();
        let outcome = promote_students(&mut registry, &request()).unwrap();

        assert_eq!(outcome.transition.promoted, 2);
        assert_eq!(outcome.transition.graduated, 1);
        assert_eq!(outcome.transition.total_students(), 3);
        assert_eq!(outcome.history.len(), 3);

        let first = registry.student(1).unwrap();
        assert_eq!(first.class_id, 2);
        assert_eq!(first.academic_year_id, 2);
        assert_eq!(registry.student(3).unwrap().status, StudentStatus::Graduated);
        assert_eq!(registry.current_year().map(|y| y.id), Some(2));
    }

    #[test]
    fn test_overrides() {
        let mut registry = sample_registry();
        let mut req = request();
        req.retain.insert(1);
        req.transfer.insert(2);
        let outcome = promote_students(&mut registry, &req).unwrap();

        assert_eq!(outcome.transition.retained, 1);
        assert_eq!(outcome.transition.transferred, 1);
        assert_eq!(outcome.transition.graduated, 1);

        let retained = registry.student(1).unwrap();
        assert_eq!(retained.class_id, 1);
        assert_eq!(retained.academic_year_id, 2);
        assert_eq!(registry.student(2).unwrap().status, StudentStatus::Transferred);

        let history = &outcome.history[1];
        assert_eq!(history.action, PromotionAction::Transfer);
        assert_eq!(history.to_class, None);
    }

    #[test]
    fn test_second_run_rejected() {
        let mut registry = sample_registry();
        promote_students(&mut registry, &request()).unwrap();
        let err = promote_students(&mut registry, &request()).unwrap_err();
        assert_eq!(err, SchoolError::TransitionAlreadyCompleted { from: 1, to: 2 });
        assert_eq!(registry.transitions().count(), 1);
        assert_eq!(registry.promotion_history().len(), 3);
    }

    #[test]
    fn test_history_keeps_past_class_for_balances() {
        let mut registry = sample_registry();
        promote_students(&mut registry, &request()).unwrap();
        let student = registry.student(1).unwrap().clone();
        assert_eq!(registry.class_in_year(&student, 1), 1);
        assert_eq!(registry.class_in_year(&student, 2), 2);
        assert_eq!(registry.students_enrolled_in(1).len(), 3);
    }

    #[rstest]
    #[case::same_year(PromotionRequest::new(1, 1, date(2025, 3, 31)), SchoolError::SameAcademicYear { year: 1 })]
    #[case::unknown_target(PromotionRequest::new(1, 9, date(2025, 3, 31)), SchoolError::not_found("Academic year", 9))]
    #[case::empty_cohort(PromotionRequest::new(2, 1, date(2026, 3, 31)), SchoolError::NoStudentsToPromote { year: 2 })]
    fn test_rejected_requests(#[case] req: PromotionRequest, #[case] expected: SchoolError) {
        let mut registry = sample_registry();
        let before = registry.clone();
        assert_eq!(promote_students(&mut registry, &req).unwrap_err(), expected);
        assert_eq!(registry, before);
    }

    #[rstest]
    #[case::outside_cohort(vec![42], vec![])]
    #[case::conflicting(vec![1], vec![1])]
    fn test_invalid_overrides_leave_registry_unchanged(
        #[case] retain: Vec<StudentId>,
        #[case] transfer: Vec<StudentId>,
    ) {
        let mut registry = sample_registry();
        let before = registry.clone();
        let mut req = request();
        req.retain.extend(retain);
        req.transfer.extend(transfer);

        let err = promote_students(&mut registry, &req).unwrap_err();
        assert!(matches!(err, SchoolError::Validation { .. }));
        assert_eq!(registry, before);
    }

    #[test]
    fn test_inactive_students_are_skipped() {
        let mut registry = sample_registry();
        registry
            .set_student_status(2, StudentStatus::Inactive)
            .unwrap();
        let outcome = promote_students(&mut registry, &request()).unwrap();

        assert_eq!(outcome.transition.total_students(), 2);
        assert_eq!(registry.student(2).unwrap().academic_year_id, 1);
    }
}
