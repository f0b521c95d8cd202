//! Data models for home profiles, budget estimates and customer submissions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HouseType {
    Single,
    TwoStory,
    ThreeStory,
}

/// Home and occupant attributes used to estimate annual oil consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeProfile {
    pub house_type: HouseType,
    #[serde(default)]
    pub has_basement: bool,
    #[serde(default)]
    pub heat_pumps: u32,
    #[serde(default)]
    pub has_oil_hot_water: bool,
    /// Only read when `has_oil_hot_water` is set
    #[serde(default = "default_occupants")]
    pub occupants: i32,
    #[serde(default = "default_thermostat")]
    pub thermostat_c: f64,
}

fn default_occupants() -> i32 {
    1
}

fn default_thermostat() -> f64 {
    crate::estimator::BASELINE_THERMOSTAT_C
}

impl HomeProfile {
    pub fn new(house_type: HouseType) -> Self {
        Self {
            house_type,
            has_basement: false,
            heat_pumps: 0,
            has_oil_hot_water: false,
            occupants: default_occupants(),
            thermostat_c: default_thermostat(),
        }
    }
}

/// Usage split into its two independent components
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageBreakdown {
    pub heating_liters: f64,
    pub hot_water_liters: f64,
}

/// Yearly cost and equal monthly payment for a known usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostBreakdown {
    pub yearly_total: Decimal,
    pub monthly_payment: Decimal,
}

/// Result of a budget plan calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetEstimate {
    pub estimated_annual_liters: Decimal,
    pub price_per_liter: Decimal,
    pub yearly_total: Decimal,
    pub monthly_payment: Decimal,
    /// Absent when the usage was entered directly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<UsageBreakdown>,
}

/// Budget plan request as it arrives from a form or the command line.
///
/// When `annual_liters` is supplied the profile is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetRequest {
    #[serde(default)]
    pub profile: Option<HomeProfile>,
    #[serde(default)]
    pub annual_liters: Option<Decimal>,
    #[serde(default)]
    pub price_per_liter: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source_page: Option<String>,
    pub interest: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub town: String,
    pub liters: Option<Decimal>,
    pub fill_tank: bool,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditApplication {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub years_at_address: Option<u32>,
    pub employer: Option<String>,
    pub notes: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A completion event reported by an embedded payment or signup form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSubmission {
    pub id: i64,
    pub form: String,
    pub submission_id: String,
    pub email: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// Row counts per collection, for the admin summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub leads: i64,
    pub orders: i64,
    pub pending_orders: i64,
    pub credit_applications: i64,
    pub pending_applications: i64,
    pub form_submissions: i64,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

/// Delivery order status. Any status may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Credit application decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Declined,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Declined => "declined",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "declined" => Ok(ApplicationStatus::Declined),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
