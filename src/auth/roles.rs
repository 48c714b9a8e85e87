// src/auth/roles.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    LoanOfficer,
    Underwriter,
    ComplianceOfficer,
    Manager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Customer,
        Role::LoanOfficer,
        Role::Underwriter,
        Role::ComplianceOfficer,
        Role::Manager,
        Role::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::LoanOfficer => "loan_officer",
            Role::Underwriter => "underwriter",
            Role::ComplianceOfficer => "compliance_officer",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::LoanOfficer => "Loan Officer",
            Role::Underwriter => "Underwriter",
            Role::ComplianceOfficer => "Compliance Officer",
            Role::Manager => "Manager",
            Role::Admin => "Administrator",
        }
    }

    /// Staff see every application, customers only their own.
    pub fn is_staff(self) -> bool {
        !matches!(self, Role::Customer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| ServerError::BadRequest(format!("unknown role '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_role_name() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn only_customers_are_not_staff() {
        assert!(!Role::Customer.is_staff());
        assert!(Role::Underwriter.is_staff());
    }
}
