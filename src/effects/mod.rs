// src/effects/mod.rs
//! Delayed mutations that emulate asynchronous replies from external systems.
//!
//! Each effect runs on its own thread, sleeps for its configured delay, then
//! asks an [`ExternalServices`] implementation for an outcome and writes the
//! result into the store. Effects are never cancelled: one scheduled for a
//! page the user has left still completes.
pub mod services;

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::errors::ServerError;
use crate::store::{
    ApplicationPatch, ApplicationStatus, ApplicationStore, DocumentRecord, DocumentStatus,
    LoanApplication, NotificationKind,
};

pub use services::{
    DocumentVerdict, ExternalServices, FixedServices, RandomServices, ServiceFailure,
};

const CREDIT_BUREAU_ACTOR: &str = "Credit Bureau";
const OCR_ACTOR: &str = "OCR Service";
const VERIFIER_ACTOR: &str = "Document Verification";
const COMPLIANCE_ACTOR: &str = "Compliance Engine";
const CORE_ACTOR: &str = "Core Banking";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectDelays {
    pub credit_check: Duration,
    pub ocr: Duration,
    pub compliance: Duration,
    pub core_submission: Duration,
    pub document_verification: Duration,
}

impl Default for EffectDelays {
    fn default() -> Self {
        Self {
            credit_check: Duration::from_millis(2000),
            ocr: Duration::from_millis(3000),
            compliance: Duration::from_millis(2500),
            core_submission: Duration::from_millis(4000),
            document_verification: Duration::from_millis(1500),
        }
    }
}

impl EffectDelays {
    pub fn uniform(delay: Duration) -> Self {
        Self {
            credit_check: delay,
            ocr: delay,
            compliance: delay,
            core_submission: delay,
            document_verification: delay,
        }
    }

    pub fn immediate() -> Self {
        Self::uniform(Duration::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EffectOutcome {
    Completed,
    /// The simulated service answered with a failure; only audited.
    Failed(ServiceFailure),
    /// The effect could not be applied (record gone, storage error, panic).
    Aborted(String),
}

/// Join handle for a scheduled effect. Dropping it detaches the effect.
#[must_use = "dropping the handle detaches the effect"]
pub struct EffectHandle {
    name: &'static str,
    handle: JoinHandle<EffectOutcome>,
}

impl EffectHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Block until the effect has run.
    pub fn wait(self) -> EffectOutcome {
        self.handle
            .join()
            .unwrap_or_else(|_| EffectOutcome::Aborted(format!("{} effect panicked", self.name)))
    }

    pub fn detach(self) {}
}

/// Rejection reason forced by the file name, before any service is asked.
pub fn filename_rejection(name: &str) -> Option<&'static str> {
    let n = name.to_lowercase();
    if n.contains("corrupted") {
        Some("File appears to be corrupted")
    } else if n.contains("malicious") {
        Some("File failed malware scan")
    } else {
        None
    }
}

#[derive(Clone)]
pub struct Effects {
    store: ApplicationStore,
    services: Arc<dyn ExternalServices>,
    delays: EffectDelays,
}

impl Effects {
    pub fn new(
        store: ApplicationStore,
        services: Arc<dyn ExternalServices>,
        delays: EffectDelays,
    ) -> Self {
        Self {
            store,
            services,
            delays,
        }
    }

    pub fn store(&self) -> &ApplicationStore {
        &self.store
    }

    /// Append a pending document now; verify it after a delay.
    pub fn add_document(
        &self,
        app_id: &str,
        file_name: &str,
        actor: &str,
    ) -> Result<(DocumentRecord, EffectHandle), ServerError> {
        let doc = self.store.append_document(app_id, file_name, actor)?;
        let app_id = app_id.to_string();
        let pending = doc.clone();

        let handle = self.schedule(
            "document-verification",
            self.delays.document_verification,
            move |store, services| {
                let verdict = match filename_rejection(&pending.name) {
                    Some(reason) => DocumentVerdict::Rejected(reason.to_string()),
                    None => services.verify_document(&pending),
                };

                match verdict {
                    DocumentVerdict::Verified => {
                        store.resolve_document(
                            &app_id,
                            &pending.id,
                            DocumentStatus::Verified,
                            None,
                            VERIFIER_ACTOR,
                        )?;
                    }
                    DocumentVerdict::Rejected(reason) => {
                        store.resolve_document(
                            &app_id,
                            &pending.id,
                            DocumentStatus::Rejected,
                            Some(reason.clone()),
                            VERIFIER_ACTOR,
                        )?;
                        if let Some(app) = store.get_application_by_id(&app_id) {
                            store.add_notification(
                                &app.customer_id,
                                NotificationKind::Reminder,
                                format!(
                                    "{} on application {app_id} was rejected ({reason}). Please upload a replacement.",
                                    pending.name
                                ),
                            )?;
                        }
                    }
                }
                Ok(EffectOutcome::Completed)
            },
        )?;

        Ok((doc, handle))
    }

    pub fn simulate_credit_check(&self, app_id: &str, actor: &str) -> Result<EffectHandle, ServerError> {
        self.store.record_audit(app_id, actor, "Credit Check Requested")?;
        let app_id = app_id.to_string();

        self.schedule("credit-check", self.delays.credit_check, move |store, services| {
            let app = store.get_application_by_id(&app_id).ok_or(ServerError::NotFound)?;
            match services.credit_bureau(&app) {
                Ok(report) => {
                    store.update_application_with(&app_id, CREDIT_BUREAU_ACTOR, |current| {
                        ApplicationPatch {
                            // Only move forward; a later stage set meanwhile is kept.
                            status: forward_to(current, ApplicationStatus::CreditCheckComplete),
                            credit_score: Some(report.score),
                            credit_report: Some(report.clone()),
                            ..ApplicationPatch::default()
                        }
                    })?;
                    store.add_notification(
                        &app.customer_id,
                        NotificationKind::StatusUpdate,
                        format!("Credit check for {app_id} completed via {}.", report.bureau),
                    )?;
                    tracing::info!(application = %app_id, score = report.score, "credit check completed");
                    Ok(EffectOutcome::Completed)
                }
                Err(failure) => fail(store, &app_id, CREDIT_BUREAU_ACTOR, "Credit Check Failed", failure),
            }
        })
    }

    pub fn simulate_ocr_processing(
        &self,
        app_id: &str,
        doc_id: &str,
        actor: &str,
    ) -> Result<EffectHandle, ServerError> {
        let app = self
            .store
            .get_application_by_id(app_id)
            .ok_or(ServerError::NotFound)?;
        let doc = app.document(doc_id).cloned().ok_or(ServerError::NotFound)?;
        self.store
            .record_audit(app_id, actor, &format!("OCR Requested for {doc_id}"))?;
        let app_id = app_id.to_string();

        self.schedule("ocr", self.delays.ocr, move |store, services| match services.ocr(&doc) {
            Ok(fields) => {
                store.set_document_extraction(&app_id, &doc.id, fields, OCR_ACTOR)?;
                Ok(EffectOutcome::Completed)
            }
            Err(failure) => fail(
                store,
                &app_id,
                OCR_ACTOR,
                &format!("OCR Failed for {}", doc.id),
                failure,
            ),
        })
    }

    pub fn run_compliance_check(&self, app_id: &str, actor: &str) -> Result<EffectHandle, ServerError> {
        self.store
            .record_audit(app_id, actor, "Compliance Check Requested")?;
        let app_id = app_id.to_string();

        self.schedule("compliance", self.delays.compliance, move |store, services| {
            let app = store.get_application_by_id(&app_id).ok_or(ServerError::NotFound)?;
            match services.compliance(&app) {
                Ok(result) => {
                    store.update_application_with(&app_id, COMPLIANCE_ACTOR, |current| {
                        ApplicationPatch {
                            status: if result.passed {
                                None
                            } else {
                                forward_to(current, ApplicationStatus::ComplianceReview)
                            },
                            compliance: Some(result),
                            ..ApplicationPatch::default()
                        }
                    })?;
                    Ok(EffectOutcome::Completed)
                }
                Err(failure) => fail(store, &app_id, COMPLIANCE_ACTOR, "Compliance Check Failed", failure),
            }
        })
    }

    /// Book the loan in core banking. No approval check is made here.
    pub fn submit_to_core_system(&self, app_id: &str, actor: &str) -> Result<EffectHandle, ServerError> {
        self.store
            .record_audit(app_id, actor, "Core Submission Requested")?;
        let app_id = app_id.to_string();

        self.schedule("core-submission", self.delays.core_submission, move |store, services| {
            let app = store.get_application_by_id(&app_id).ok_or(ServerError::NotFound)?;
            match services.core_banking(&app) {
                Ok(reference) => {
                    let patch = ApplicationPatch {
                        status: Some(ApplicationStatus::Funded),
                        core_reference: Some(reference.clone()),
                        ..ApplicationPatch::default()
                    };
                    store.update_application(&app_id, patch, CORE_ACTOR)?;
                    store.add_notification(
                        &app.customer_id,
                        NotificationKind::StatusUpdate,
                        format!("Loan {app_id} has been funded. Account reference {reference}."),
                    )?;
                    Ok(EffectOutcome::Completed)
                }
                Err(failure) => fail(store, &app_id, CORE_ACTOR, "Core Submission Failed", failure),
            }
        })
    }

    fn schedule<F>(&self, name: &'static str, delay: Duration, job: F) -> Result<EffectHandle, ServerError>
    where
        F: FnOnce(&ApplicationStore, &dyn ExternalServices) -> Result<EffectOutcome, ServerError>
            + Send
            + 'static,
    {
        let store = self.store.clone();
        let services = Arc::clone(&self.services);

        let handle = std::thread::Builder::new()
            .name(format!("effect-{name}"))
            .spawn(move || {
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                match job(&store, services.as_ref()) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::warn!(effect = name, error = %e, "effect could not be applied");
                        EffectOutcome::Aborted(e.to_string())
                    }
                }
            })
            .map_err(|e| {
                tracing::error!(effect = name, error = %e, "failed to spawn effect thread");
                ServerError::InternalError
            })?;

        tracing::debug!(effect = name, delay_ms = delay.as_millis() as u64, "effect scheduled");
        Ok(EffectHandle { name, handle })
    }
}

/// `Some(to)` when moving there would not regress `app`.
fn forward_to(app: &LoanApplication, to: ApplicationStatus) -> Option<ApplicationStatus> {
    app.status.is_forward_move(to).then_some(to)
}

/// Failure branch shared by all effects: audit it and move on.
fn fail(
    store: &ApplicationStore,
    app_id: &str,
    actor: &str,
    what: &str,
    failure: ServiceFailure,
) -> Result<EffectOutcome, ServerError> {
    tracing::warn!(application = %app_id, %failure, "{what}");
    store.record_audit(app_id, actor, &format!("{what}: {failure}"))?;
    Ok(EffectOutcome::Failed(failure))
}
