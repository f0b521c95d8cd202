//! Validation for lead, order and credit application submissions
//!
//! Every landing page posts one of these flat records. Strings are trimmed
//! and blank optional fields become `None` before anything is stored.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("an email address or phone number is required")]
    NoContact,
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("order quantity must be positive, or ask for a fill")]
    InvalidQuantity,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewLead {
    #[serde(default)]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    /// Slug of the landing page the form sat on
    pub source_page: Option<String>,
    /// What the visitor asked about: delivery, budget plan, furnace service...
    pub interest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewOrder {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub email: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub town: String,
    pub liters: Option<Decimal>,
    #[serde(default)]
    pub fill_tank: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewCreditApplication {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    pub years_at_address: Option<u32>,
    pub employer: Option<String>,
    pub notes: Option<String>,
}

fn required(value: String, field: &'static str) -> Result<String, IntakeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IntakeError::Missing(field));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_email(email: String) -> Result<String, IntakeError> {
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(IntakeError::InvalidEmail(email)),
    }
}

impl NewLead {
    pub fn validate(self) -> Result<NewLead, IntakeError> {
        let name = required(self.name, "name")?;
        let email = optional(self.email).map(check_email).transpose()?;
        let phone = optional(self.phone);
        if email.is_none() && phone.is_none() {
            return Err(IntakeError::NoContact);
        }

        Ok(NewLead {
            name,
            email,
            phone,
            message: optional(self.message),
            source_page: optional(self.source_page),
            interest: optional(self.interest),
        })
    }
}

impl NewOrder {
    pub fn validate(self) -> Result<NewOrder, IntakeError> {
        let name = required(self.name, "name")?;
        let phone = required(self.phone, "phone")?;
        let address = required(self.address, "address")?;
        let town = required(self.town, "town")?;
        let email = optional(self.email).map(check_email).transpose()?;

        // A fill order carries no quantity
        let liters = if self.fill_tank {
            None
        } else {
            match self.liters {
                Some(l) if l > Decimal::ZERO => Some(l),
                _ => return Err(IntakeError::InvalidQuantity),
            }
        };

        Ok(NewOrder {
            name,
            phone,
            email,
            address,
            town,
            liters,
            fill_tank: self.fill_tank,
            notes: optional(self.notes),
        })
    }
}

impl NewCreditApplication {
    pub fn validate(self) -> Result<NewCreditApplication, IntakeError> {
        Ok(NewCreditApplication {
            name: required(self.name, "name")?,
            phone: required(self.phone, "phone")?,
            email: check_email(required(self.email, "email")?)?,
            address: required(self.address, "address")?,
            years_at_address: self.years_at_address,
            employer: optional(self.employer),
            notes: optional(self.notes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_needs_a_name() {
        let lead = NewLead {
            name: "   ".into(),
            phone: Some("902-555-0101".into()),
            ..Default::default()
        };
        assert_eq!(lead.validate().unwrap_err(), IntakeError::Missing("name"));
    }

    #[test]
    fn lead_needs_some_contact() {
        let lead = NewLead {
            name: "Mary MacNeil".into(),
            email: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(lead.validate().unwrap_err(), IntakeError::NoContact);
    }

    #[test]
    fn lead_is_trimmed_and_blank_optionals_dropped() {
        let lead = NewLead {
            name: "  Mary MacNeil ".into(),
            email: Some(" mary@example.com ".into()),
            phone: Some("".into()),
            message: Some("\n".into()),
            source_page: Some("glace-bay".into()),
            interest: None,
        }
        .validate()
        .unwrap();

        assert_eq!(lead.name, "Mary MacNeil");
        assert_eq!(lead.email.as_deref(), Some("mary@example.com"));
        assert_eq!(lead.phone, None);
        assert_eq!(lead.message, None);
        assert_eq!(lead.source_page.as_deref(), Some("glace-bay"));
    }

    #[test]
    fn lead_rejects_malformed_email() {
        let lead = NewLead {
            name: "Mary".into(),
            email: Some("mary.example.com".into()),
            ..Default::default()
        };
        assert_eq!(
            lead.validate().unwrap_err(),
            IntakeError::InvalidEmail("mary.example.com".into())
        );
    }

    fn order() -> NewOrder {
        NewOrder {
            name: "John Boutilier".into(),
            phone: "902-555-0199".into(),
            address: "12 Commercial St".into(),
            town: "Dominion".into(),
            liters: Some(Decimal::from(500)),
            ..Default::default()
        }
    }

    #[test]
    fn order_requires_positive_quantity_unless_fill() {
        let mut bad = order();
        bad.liters = Some(Decimal::ZERO);
        assert_eq!(bad.validate().unwrap_err(), IntakeError::InvalidQuantity);

        let mut none = order();
        none.liters = None;
        assert_eq!(none.validate().unwrap_err(), IntakeError::InvalidQuantity);

        let mut fill = order();
        fill.liters = Some(Decimal::from(-3));
        fill.fill_tank = true;
        let fill = fill.validate().unwrap();
        assert_eq!(fill.liters, None);
        assert!(fill.fill_tank);
    }

    #[test]
    fn order_requires_address_and_town() {
        let mut o = order();
        o.town = " ".into();
        assert_eq!(o.validate().unwrap_err(), IntakeError::Missing("town"));

        let mut o = order();
        o.address = String::new();
        assert_eq!(o.validate().unwrap_err(), IntakeError::Missing("address"));
    }

    #[test]
    fn application_requires_valid_email() {
        let app = NewCreditApplication {
            name: "Anne Gillis".into(),
            phone: "902-555-0142".into(),
            email: "anne".into(),
            address: "4 Main St, Donkin".into(),
            ..Default::default()
        };
        assert_eq!(app.validate().unwrap_err(), IntakeError::InvalidEmail("anne".into()));
    }
}
