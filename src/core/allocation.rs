//! Payment allocation across the bus and school fee buckets
//!
//! A single payment is split between what the student still owes for the
//! school bus and what they owe for school fees. Three policies exist:
//!
//! - **standard**: exhaust the bus balance first, remainder to school, capped
//!   at the school outstanding.
//! - **equal**: 50/50 split; whatever one bucket cannot absorb moves to the
//!   other.
//! - **proportional**: split by the ratio of the bus monthly charge to the
//!   combined monthly charge, with the same overflow reassignment. With no
//!   monthly charges at all it behaves like `equal`.
//!
//! Whatever neither bucket can absorb is reported as `excess`, so
//! `bus + school + excess == amount` always holds, and `excess` is zero
//! whenever the amount does not exceed the combined outstanding.
//!
//! All functions here are pure; the engine decides what to do with excess.

use crate::types::AllocationPolicy;
use rust_decimal::Decimal;
use serde::Serialize;

/// A pair of amounts, one per fee bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Buckets {
    pub bus: Decimal,
    pub school: Decimal,
}

impl Buckets {
    pub fn new(bus: Decimal, school: Decimal) -> Self {
        Self { bus, school }
    }

    pub fn total(&self) -> Decimal {
        self.bus + self.school
    }

    /// Per-bucket difference, never below zero
    pub fn saturating_sub(self, other: Buckets) -> Self {
        Self::new(self.bus - other.bus, self.school - other.school).clamped()
    }

    pub fn checked_add(self, other: Buckets) -> Option<Self> {
        Some(Self::new(
            self.bus.checked_add(other.bus)?,
            self.school.checked_add(other.school)?,
        ))
    }

    /// Negative balances (overpaid buckets) count as nothing owed
    fn clamped(self) -> Self {
        Self {
            bus: self.bus.max(Decimal::ZERO),
            school: self.school.max(Decimal::ZERO),
        }
    }
}

/// Result of splitting a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub bus: Decimal,
    pub school: Decimal,
    /// Part of the payment neither bucket could absorb
    pub excess: Decimal,
}

impl Allocation {
    fn unallocated(amount: Decimal) -> Self {
        Self {
            bus: Decimal::ZERO,
            school: Decimal::ZERO,
            excess: amount,
        }
    }

    pub fn allocated(&self) -> Decimal {
        self.bus + self.school
    }
}

/// Split `amount` across the two buckets
///
/// # Arguments
///
/// * `amount` - Payment amount; non-positive amounts allocate nothing
/// * `outstanding` - What is still owed per bucket
/// * `monthly` - Recurring monthly charge per bucket (used by `Proportional`)
/// * `policy` - Which split to apply
pub fn allocate(
    amount: Decimal,
    outstanding: Buckets,
    monthly: Buckets,
    policy: AllocationPolicy,
) -> Allocation {
    if amount <= Decimal::ZERO {
        return Allocation::unallocated(amount);
    }
    let outstanding = outstanding.clamped();

    match policy {
        AllocationPolicy::Standard => standard(amount, outstanding),
        AllocationPolicy::Equal => equal(amount, outstanding),
        AllocationPolicy::Proportional => proportional(amount, outstanding, monthly.clamped()),
    }
}

fn standard(amount: Decimal, outstanding: Buckets) -> Allocation {
    let bus = amount.min(outstanding.bus);
    let school = (amount - bus).min(outstanding.school);
    Allocation {
        bus,
        school,
        excess: amount - bus - school,
    }
}

fn equal(amount: Decimal, outstanding: Buckets) -> Allocation {
    let bus = (amount / Decimal::TWO).round_dp(2);
    rebalance(bus, amount - bus, outstanding)
}

fn proportional(amount: Decimal, outstanding: Buckets, monthly: Buckets) -> Allocation {
    let combined = monthly.total();
    if combined.is_zero() {
        return equal(amount, outstanding);
    }
    // ratio <= 1, so the product never exceeds the amount
    let bus = (amount * (monthly.bus / combined)).round_dp(2);
    rebalance(bus, amount - bus, outstanding)
}

/// Move overflow from one bucket into the other's remaining room
fn rebalance(mut bus: Decimal, mut school: Decimal, outstanding: Buckets) -> Allocation {
    if bus > outstanding.bus {
        school += bus - outstanding.bus;
        bus = outstanding.bus;
    }

    let mut excess = Decimal::ZERO;
    if school > outstanding.school {
        let overflow = school - outstanding.school;
        school = outstanding.school;
        let moved = overflow.min(outstanding.bus - bus);
        bus += moved;
        excess = overflow - moved;
    }

    Allocation {
        bus,
        school,
        excess,
    }
}
