//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `school`: Villages, classes, academic years and students
//! - `fee`: Fee types, fee structures, bus fees and miscellaneous charges
//! - `payment`: Fee payments, allocations and batch records
//! - `promotion`: Academic-year transitions and promotion history
//! - `error`: Error types for the school fees engine

pub mod error;
pub mod fee;
pub mod payment;
pub mod promotion;
pub mod school;

pub use error::SchoolError;
pub use fee::{
    BusFeeId, BusFeeStructure, CategoryId, ChargeCategory, ChargeId, FeeStructure,
    FeeStructureId, FeeType, FeeTypeId, MiscellaneousCharge,
};
pub use payment::{
    AllocationPolicy, FeePayment, PaymentAction, PaymentAllocation, PaymentId, PaymentMode,
    PaymentRecord,
};
pub use promotion::{AcademicYearTransition, PromotionAction, PromotionHistory, TransitionId};
pub use school::{
    AcademicYear, AcademicYearId, Class, ClassId, NewStudent, Student, StudentId,
    StudentStatus, Village, VillageId,
};
