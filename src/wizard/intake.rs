//! Intake form fields and contact-shape validation.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::booking::model::UserIdentity;
use crate::error::BookingError;

/// How soon the user feels they need support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("Unknown urgency: {other}")),
        }
    }
}

/// Contact details and background collected on the intake step.
///
/// The email is seeded from the authenticated identity when the wizard is
/// built and there is no action that edits it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntakeForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub previous_therapy: String,
    pub current_medication: String,
    pub urgency: Option<Urgency>,
    pub additional_notes: String,
}

impl IntakeForm {
    /// Initial form for an authenticated user: name and email pre-filled.
    pub fn for_identity(identity: &UserIdentity) -> Self {
        Self {
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            ..Self::default()
        }
    }

    /// Whether name, email and phone are all non-empty.
    pub fn contact_complete(&self) -> bool {
        self.missing_contact_fields().is_empty()
    }

    /// Names of the required contact fields that are still empty.
    pub fn missing_contact_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        if self.phone.trim().is_empty() {
            missing.push("phone");
        }
        missing
    }
}

/// Compiled shape rules for contact fields, applied at submission time.
///
/// Per-step gating only requires the fields to be non-empty; these rules
/// catch malformed values before the payload leaves the wizard.
#[derive(Debug, Clone)]
pub struct ContactRules {
    email: Regex,
    phone_charset: Regex,
}

impl ContactRules {
    pub fn new() -> Self {
        Self {
            email: Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap(),
            phone_charset: Regex::new(r"^[0-9+\-()\s]+$").unwrap(),
        }
    }

    /// Check email and phone shape. Empty fields are reported as missing
    /// elsewhere; this only rejects non-empty malformed values.
    pub fn check(&self, form: &IntakeForm) -> Result<(), BookingError> {
        let email = form.email.trim();
        if !email.is_empty() && !self.email.is_match(email) {
            return Err(BookingError::InvalidContact {
                field: "email".to_string(),
                reason: format!("'{email}' is not a valid email address"),
            });
        }

        let phone = form.phone.trim();
        if !phone.is_empty() {
            if !self.phone_charset.is_match(phone) {
                return Err(BookingError::InvalidContact {
                    field: "phone".to_string(),
                    reason: "phone may only contain digits, spaces, +, -, ()".to_string(),
                });
            }
            let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
            if digits < 7 {
                return Err(BookingError::InvalidContact {
                    field: "phone".to_string(),
                    reason: format!("expected at least 7 digits, got {digits}"),
                });
            }
        }

        Ok(())
    }
}

impl Default for ContactRules {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> IntakeForm {
        IntakeForm {
            name: "Maya Sharma".to_string(),
            email: "maya@rkgit.edu.in".to_string(),
            phone: "+91 98765 43210".to_string(),
            ..IntakeForm::default()
        }
    }

    #[test]
    fn identity_prefills_name_and_email() {
        let identity = UserIdentity {
            display_name: "Maya Sharma".to_string(),
            email: "maya@rkgit.edu.in".to_string(),
        };
        let form = IntakeForm::for_identity(&identity);
        assert_eq!(form.name, "Maya Sharma");
        assert_eq!(form.email, "maya@rkgit.edu.in");
        assert!(form.phone.is_empty());
    }

    #[test]
    fn contact_complete_requires_all_three() {
        let mut form = valid_form();
        assert!(form.contact_complete());

        form.phone.clear();
        assert!(!form.contact_complete());
        assert_eq!(form.missing_contact_fields(), vec!["phone"]);

        form.name = "   ".to_string();
        assert_eq!(form.missing_contact_fields(), vec!["name", "phone"]);
    }

    #[test]
    fn rules_accept_valid_contact() {
        let rules = ContactRules::new();
        assert!(rules.check(&valid_form()).is_ok());
    }

    #[test]
    fn rules_reject_malformed_email() {
        let rules = ContactRules::new();
        let mut form = valid_form();
        form.email = "not-an-address".to_string();
        let err = rules.check(&form).unwrap_err();
        assert!(matches!(err, BookingError::InvalidContact { field, .. } if field == "email"));
    }

    #[test]
    fn rules_reject_short_phone() {
        let rules = ContactRules::new();
        let mut form = valid_form();
        form.phone = "12345".to_string();
        let err = rules.check(&form).unwrap_err();
        assert!(matches!(err, BookingError::InvalidContact { field, .. } if field == "phone"));
    }

    #[test]
    fn rules_reject_phone_with_letters() {
        let rules = ContactRules::new();
        let mut form = valid_form();
        form.phone = "call me maybe".to_string();
        assert!(rules.check(&form).is_err());
    }

    #[test]
    fn urgency_display_matches_serde() {
        for urgency in [Urgency::Low, Urgency::Medium, Urgency::High] {
            let display = format!("{urgency}");
            let json = serde_json::to_string(&urgency).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }

    #[test]
    fn urgency_parses_from_str() {
        assert_eq!("high".parse::<Urgency>().unwrap(), Urgency::High);
        assert_eq!(" Medium ".parse::<Urgency>().unwrap(), Urgency::Medium);
        assert!("urgent".parse::<Urgency>().is_err());
    }
}
