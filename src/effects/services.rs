// src/effects/services.rs
//! Stand-ins for the credit bureau, OCR, compliance and core-banking
//! systems. `RandomServices` is what the portal runs with; `FixedServices`
//! gives tests a fixed outcome.
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use crate::store::{ComplianceResult, CreditReport, DocumentRecord, LoanApplication};

/// Amounts above this always get a manual exposure review flag.
pub const LARGE_EXPOSURE_AMOUNT: u64 = 250_000;

const BUREAUS: [&str; 3] = ["Equifax", "Experian", "TransUnion"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceFailure {
    #[error("service unavailable")]
    Unavailable,
    #[error("request timed out")]
    TimedOut,
    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentVerdict {
    Verified,
    Rejected(String),
}

pub trait ExternalServices: Send + Sync {
    fn credit_bureau(&self, app: &LoanApplication) -> Result<CreditReport, ServiceFailure>;

    fn ocr(&self, doc: &DocumentRecord) -> Result<BTreeMap<String, String>, ServiceFailure>;

    fn verify_document(&self, doc: &DocumentRecord) -> DocumentVerdict;

    fn compliance(&self, app: &LoanApplication) -> Result<ComplianceResult, ServiceFailure>;

    /// Returns the core-banking account reference.
    fn core_banking(&self, app: &LoanApplication) -> Result<String, ServiceFailure>;
}

/// Flags every compliance engine raises regardless of randomness.
pub fn baseline_compliance_flags(app: &LoanApplication) -> Vec<String> {
    let mut flags = Vec::new();
    if app.amount > LARGE_EXPOSURE_AMOUNT {
        flags.push("Large exposure review".to_string());
    }
    if !app.email.contains('@') {
        flags.push("Contact details incomplete".to_string());
    }
    flags
}

/// Guess a document type from its file name. `id` counts only as a whole
/// word of the name, so `paid_salary.pdf` is not an identity document.
pub fn document_kind(name: &str) -> &'static str {
    let n = name.to_lowercase();
    let has_id_word = n.split(|c: char| !c.is_ascii_alphanumeric()).any(|w| w == "id");
    if n.contains("passport") || n.contains("license") || has_id_word {
        "identity"
    } else if n.contains("pay") || n.contains("salary") || n.contains("w2") {
        "income"
    } else if n.contains("bank") || n.contains("statement") {
        "bank_statement"
    } else {
        "other"
    }
}

pub struct RandomServices {
    rng: Mutex<StdRng>,
}

impl RandomServices {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomServices {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalServices for RandomServices {
    fn credit_bureau(&self, _app: &LoanApplication) -> Result<CreditReport, ServiceFailure> {
        let mut rng = self.rng.lock();
        let roll: f64 = rng.gen();
        if roll < 0.10 {
            return Err(ServiceFailure::Unavailable);
        }
        if roll < 0.15 {
            return Err(ServiceFailure::TimedOut);
        }
        if roll < 0.20 {
            return Err(ServiceFailure::ValidationFailed(
                "applicant identity mismatch".into(),
            ));
        }

        Ok(CreditReport {
            bureau: BUREAUS.choose(&mut *rng).copied().unwrap_or("Equifax").to_string(),
            score: rng.gen_range(300..=850),
            open_accounts: rng.gen_range(1..=12),
            delinquencies: rng.gen_range(0..=3),
            debt_to_income: rng.gen_range(10..=55),
            pulled_at: Utc::now(),
        })
    }

    fn ocr(&self, doc: &DocumentRecord) -> Result<BTreeMap<String, String>, ServiceFailure> {
        let mut rng = self.rng.lock();
        if rng.gen_bool(0.10) {
            return Err(ServiceFailure::TimedOut);
        }

        let confidence: f64 = rng.gen_range(0.70..0.99);
        let mut fields = BTreeMap::new();
        fields.insert("document_type".to_string(), document_kind(&doc.name).to_string());
        fields.insert("confidence".to_string(), format!("{confidence:.2}"));
        fields.insert("pages".to_string(), rng.gen_range(1..=6u32).to_string());
        Ok(fields)
    }

    fn verify_document(&self, _doc: &DocumentRecord) -> DocumentVerdict {
        if self.rng.lock().gen_bool(0.15) {
            DocumentVerdict::Rejected("Image quality too low".into())
        } else {
            DocumentVerdict::Verified
        }
    }

    fn compliance(&self, app: &LoanApplication) -> Result<ComplianceResult, ServiceFailure> {
        let mut rng = self.rng.lock();
        if rng.gen_bool(0.05) {
            return Err(ServiceFailure::Unavailable);
        }

        let mut flags = baseline_compliance_flags(app);
        if rng.gen_bool(0.10) {
            flags.push("Sanctions screening partial match".to_string());
        }
        Ok(ComplianceResult {
            passed: flags.is_empty(),
            flags,
            checked_at: Utc::now(),
        })
    }

    fn core_banking(&self, _app: &LoanApplication) -> Result<String, ServiceFailure> {
        let mut rng = self.rng.lock();
        let roll: f64 = rng.gen();
        if roll < 0.15 {
            return Err(ServiceFailure::Unavailable);
        }
        if roll < 0.20 {
            return Err(ServiceFailure::ValidationFailed(
                "account mapping incomplete".into(),
            ));
        }
        Ok(format!("CBS-{:08}", rng.gen_range(0..100_000_000u32)))
    }
}

/// Always answers the same way.
#[derive(Debug, Clone)]
pub struct FixedServices {
    pub failure: Option<ServiceFailure>,
    pub score: u16,
    pub document_verdict: DocumentVerdict,
    pub core_reference: String,
}

impl FixedServices {
    pub fn succeeding() -> Self {
        Self {
            failure: None,
            score: 720,
            document_verdict: DocumentVerdict::Verified,
            core_reference: "CBS-00000001".to_string(),
        }
    }

    pub fn failing(failure: ServiceFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::succeeding()
        }
    }

    fn check(&self) -> Result<(), ServiceFailure> {
        match &self.failure {
            Some(f) => Err(f.clone()),
            None => Ok(()),
        }
    }
}

impl ExternalServices for FixedServices {
    fn credit_bureau(&self, _app: &LoanApplication) -> Result<CreditReport, ServiceFailure> {
        self.check()?;
        Ok(CreditReport {
            bureau: "Experian".to_string(),
            score: self.score,
            open_accounts: 4,
            delinquencies: 0,
            debt_to_income: 28,
            pulled_at: Utc::now(),
        })
    }

    fn ocr(&self, doc: &DocumentRecord) -> Result<BTreeMap<String, String>, ServiceFailure> {
        self.check()?;
        let mut fields = BTreeMap::new();
        fields.insert("document_type".to_string(), document_kind(&doc.name).to_string());
        fields.insert("confidence".to_string(), "0.95".to_string());
        Ok(fields)
    }

    fn verify_document(&self, _doc: &DocumentRecord) -> DocumentVerdict {
        self.document_verdict.clone()
    }

    fn compliance(&self, app: &LoanApplication) -> Result<ComplianceResult, ServiceFailure> {
        self.check()?;
        let flags = baseline_compliance_flags(app);
        Ok(ComplianceResult {
            passed: flags.is_empty(),
            flags,
            checked_at: Utc::now(),
        })
    }

    fn core_banking(&self, _app: &LoanApplication) -> Result<String, ServiceFailure> {
        self.check()?;
        Ok(self.core_reference.clone())
    }
}
