//! Academic-year transition types

use super::school::{AcademicYearId, ClassId, StudentId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transition identifier
pub type TransitionId = u32;

/// What happens to a student when the academic year rolls over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionAction {
    /// Move to the next class
    Promote,
    /// Stay in the same class for another year
    Retain,
    /// Leave the school
    Transfer,
    /// Complete the highest class and leave
    Graduate,
}

impl fmt::Display for PromotionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PromotionAction::Promote => "promote",
            PromotionAction::Retain => "retain",
            PromotionAction::Transfer => "transfer",
            PromotionAction::Graduate => "graduate",
        };
        f.write_str(s)
    }
}

/// One student's move during a transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionHistory {
    pub transition_id: TransitionId,
    pub student_id: StudentId,
    pub from_year: AcademicYearId,
    pub to_year: AcademicYearId,
    pub from_class: ClassId,
    /// `None` when the student left the school
    pub to_class: Option<ClassId>,
    pub action: PromotionAction,
}

/// A completed academic-year transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicYearTransition {
    pub id: TransitionId,
    pub from_year: AcademicYearId,
    pub to_year: AcademicYearId,
    pub promoted: u32,
    pub retained: u32,
    pub transferred: u32,
    pub graduated: u32,
    pub executed_on: NaiveDate,
}

impl AcademicYearTransition {
    pub fn total_students(&self) -> u32 {
        self.promoted + self.retained + self.transferred + self.graduated
    }
}
