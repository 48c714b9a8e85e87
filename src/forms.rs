// src/forms.rs
use std::collections::HashMap;

use crate::auth::sessions::normalize_email;
use crate::store::NewApplication;

pub const LOAN_TYPES: [&str; 5] = [
    "Personal Loan",
    "Home Loan",
    "Auto Loan",
    "Business Loan",
    "Education Loan",
];

pub const MAX_AMOUNT: u64 = 5_000_000;

/// Decode an `application/x-www-form-urlencoded` body or query string.
pub fn parse_form(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

/// Raw application form input, kept as typed so it can be re-rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationForm {
    pub applicant_name: String,
    pub email: String,
    pub loan_type: String,
    pub amount: String,
    pub term_months: String,
    pub purpose: String,
}

impl ApplicationForm {
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let get = |k: &str| fields.get(k).map(|v| v.trim().to_string()).unwrap_or_default();
        Self {
            applicant_name: get("applicant_name"),
            email: get("email"),
            loan_type: get("loan_type"),
            amount: get("amount"),
            term_months: get("term_months"),
            purpose: get("purpose"),
        }
    }

    /// Check every field, collecting all messages.
    pub fn validate(&self, customer_id: &str) -> Result<NewApplication, Vec<String>> {
        let mut errors = Vec::new();

        if self.applicant_name.is_empty() {
            errors.push("Applicant name is required".to_string());
        }

        let email = match normalize_email(&self.email) {
            Ok(e) => Some(e),
            Err(_) => {
                errors.push("A valid email address is required".to_string());
                None
            }
        };

        if !LOAN_TYPES.contains(&self.loan_type.as_str()) {
            errors.push("Choose a loan type".to_string());
        }

        let amount = match self.amount.replace(',', "").parse::<u64>() {
            Ok(0) | Err(_) => {
                errors.push("Amount must be a positive whole number".to_string());
                None
            }
            Ok(n) if n > MAX_AMOUNT => {
                errors.push(format!("Amount cannot exceed {MAX_AMOUNT}"));
                None
            }
            Ok(n) => Some(n),
        };

        let term_months = if self.term_months.is_empty() {
            None
        } else {
            match self.term_months.parse::<u32>() {
                Ok(n) if (1..=480).contains(&n) => Some(n),
                _ => {
                    errors.push("Term must be between 1 and 480 months".to_string());
                    None
                }
            }
        };

        match (email, amount) {
            (Some(email), Some(amount)) if errors.is_empty() => Ok(NewApplication {
                customer_id: customer_id.to_string(),
                applicant_name: self.applicant_name.clone(),
                email,
                loan_type: self.loan_type.clone(),
                amount,
                term_months,
                purpose: (!self.purpose.is_empty()).then(|| self.purpose.clone()),
            }),
            _ => Err(errors),
        }
    }
}
