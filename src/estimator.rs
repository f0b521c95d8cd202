//! Budget plan estimator
//!
//! Estimates annual heating oil usage from a home profile and spreads the
//! yearly cost over an equal monthly payment plan.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tracing::debug;

use crate::models::{BudgetEstimate, BudgetRequest, CostBreakdown, HomeProfile, HouseType, UsageBreakdown};

pub const BASELINE_THERMOSTAT_C: f64 = 18.0;

const BASEMENT_LITERS: f64 = 300.0;
const THERMOSTAT_STEP: f64 = 0.10;
const HOT_WATER_BASE_LITERS: f64 = 250.0;
const HOT_WATER_PER_EXTRA_OCCUPANT: f64 = 100.0;
const HOT_WATER_INCLUDED_OCCUPANTS: i32 = 2;

/// Budget plans bill over ten months, whatever the calendar
const PLAN_MONTHS: i64 = 10;
/// Monthly payments round up to this increment
const PAYMENT_INCREMENT: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimateError {
    #[error("price per liter is required")]
    MissingPrice,
    #[error("price per liter must be positive, got {0}")]
    NonPositivePrice(Decimal),
    #[error("annual usage is required")]
    MissingUsage,
    #[error("annual usage must be positive, got {0}")]
    NonPositiveUsage(Decimal),
    #[error("estimate is too large to price")]
    OutOfRange,
}

/// Base heating usage in liters per year
pub fn base_heating_liters(house_type: HouseType) -> f64 {
    match house_type {
        HouseType::Single => 1500.0,
        HouseType::TwoStory => 2200.0,
        HouseType::ThreeStory => 2800.0,
    }
}

/// Fraction of heating oil still burned with supplemental heat pumps
pub fn heat_pump_retention(heat_pumps: u32) -> f64 {
    match heat_pumps {
        0 => 1.00,
        1 => 0.50,
        2 => 0.35,
        _ => 0.25,
    }
}

/// Multiplier for setpoints above the baseline. At or below it there is no adjustment.
pub fn thermostat_factor(thermostat_c: f64) -> f64 {
    let diff = thermostat_c - BASELINE_THERMOSTAT_C;
    if diff > 0.0 {
        1.0 + diff * THERMOSTAT_STEP
    } else {
        1.0
    }
}

pub fn hot_water_liters(profile: &HomeProfile) -> f64 {
    if !profile.has_oil_hot_water {
        return 0.0;
    }
    if profile.occupants <= HOT_WATER_INCLUDED_OCCUPANTS {
        HOT_WATER_BASE_LITERS
    } else {
        let extra = f64::from(profile.occupants - HOT_WATER_INCLUDED_OCCUPANTS);
        HOT_WATER_BASE_LITERS + extra * HOT_WATER_PER_EXTRA_OCCUPANT
    }
}

/// Heating subtotal: base, then basement, then thermostat, then heat pumps.
///
/// Hot water is kept out of this on purpose; neither multiplier touches it.
pub fn heating_liters(profile: &HomeProfile) -> f64 {
    let mut heating = base_heating_liters(profile.house_type);
    if profile.has_basement {
        heating += BASEMENT_LITERS;
    }
    heating *= thermostat_factor(profile.thermostat_c);
    heating * heat_pump_retention(profile.heat_pumps)
}

pub fn estimate_usage(profile: &HomeProfile) -> UsageBreakdown {
    UsageBreakdown {
        heating_liters: heating_liters(profile),
        hot_water_liters: hot_water_liters(profile),
    }
}

/// Total usage to the nearest liter. Non-finite or unrepresentable totals are out of range.
fn rounded_liters(usage: &UsageBreakdown) -> Result<Decimal, EstimateError> {
    let total = (usage.heating_liters + usage.hot_water_liters).round();
    Decimal::from_f64(total)
        .map(|liters| liters.trunc())
        .ok_or(EstimateError::OutOfRange)
}

fn check_price(price_per_liter: Option<Decimal>) -> Result<Decimal, EstimateError> {
    match price_per_liter {
        None => Err(EstimateError::MissingPrice),
        Some(p) if p <= Decimal::ZERO => Err(EstimateError::NonPositivePrice(p)),
        Some(p) => Ok(p),
    }
}

/// Yearly cost and the equal monthly payment for a known annual usage
pub fn compute_cost(usage_liters: Decimal, price_per_liter: Decimal) -> Result<CostBreakdown, EstimateError> {
    let price = check_price(Some(price_per_liter))?;
    if usage_liters <= Decimal::ZERO {
        return Err(EstimateError::NonPositiveUsage(usage_liters));
    }

    let yearly_total = usage_liters
        .checked_mul(price)
        .ok_or(EstimateError::OutOfRange)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let increment = Decimal::from(PAYMENT_INCREMENT);
    let monthly_payment = yearly_total
        .checked_div(Decimal::from(PLAN_MONTHS))
        .and_then(|base| base.checked_div(increment))
        .and_then(|steps| steps.ceil().checked_mul(increment))
        .ok_or(EstimateError::OutOfRange)?;

    Ok(CostBreakdown {
        yearly_total,
        monthly_payment,
    })
}

/// Estimate usage from a home profile, then price it
pub fn estimate(profile: &HomeProfile, price_per_liter: Decimal) -> Result<BudgetEstimate, EstimateError> {
    let price = check_price(Some(price_per_liter))?;
    let usage = estimate_usage(profile);
    let liters = rounded_liters(&usage)?;
    debug!(?profile, %liters, "estimated annual usage");

    let cost = compute_cost(liters, price)?;
    Ok(BudgetEstimate {
        estimated_annual_liters: liters,
        price_per_liter: price,
        yearly_total: cost.yearly_total,
        monthly_payment: cost.monthly_payment,
        breakdown: Some(usage),
    })
}

/// Price a usage figure the customer already knows
pub fn direct(annual_liters: Option<Decimal>, price_per_liter: Option<Decimal>) -> Result<BudgetEstimate, EstimateError> {
    let price = check_price(price_per_liter)?;
    let liters = annual_liters.ok_or(EstimateError::MissingUsage)?;
    let cost = compute_cost(liters, price)?;
    Ok(BudgetEstimate {
        estimated_annual_liters: liters,
        price_per_liter: price,
        yearly_total: cost.yearly_total,
        monthly_payment: cost.monthly_payment,
        breakdown: None,
    })
}

/// Dispatch a request to direct entry or estimation.
///
/// A supplied usage figure wins over a profile. With neither, the request
/// is treated as a direct entry with the usage missing.
pub fn budget(request: &BudgetRequest) -> Result<BudgetEstimate, EstimateError> {
    match (&request.annual_liters, &request.profile) {
        (Some(_), _) | (None, None) => direct(request.annual_liters, request.price_per_liter),
        (None, Some(profile)) => estimate(profile, check_price(request.price_per_liter)?),
    }
}
