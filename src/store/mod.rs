// src/store/mod.rs
//! Single source of truth for loan applications and notifications.
//!
//! State lives in memory behind one lock and is written through to the
//! key/value table as a JSON snapshot after every mutation. Scalar fields are
//! last-write-wins; list appends (documents, audit trail) happen under the
//! lock so concurrent effects never drop each other's entries.
pub mod model;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::kv::{self, APPLICATIONS_KEY, LEGACY_APPLICATIONS_KEY, NOTIFICATIONS_KEY};
use crate::db::Database;
use crate::errors::ServerError;

pub use model::{
    ApplicationPatch, ApplicationStatus, AuditEntry, ComplianceResult, CreditReport,
    DocumentRecord, DocumentStatus, LoanApplication, NewApplication, Notification,
    NotificationKind,
};

pub const SUBMITTED_ACTION: &str = "Application Submitted";

#[derive(Default)]
struct StoreState {
    applications: Vec<LoanApplication>,
    notifications: Vec<Notification>,
    next_app_seq: u64,
    next_notification_seq: u64,
}

#[derive(Clone)]
pub struct ApplicationStore {
    db: Database,
    inner: Arc<Mutex<StoreState>>,
}

impl ApplicationStore {
    /// Hydrate from the snapshot keys, or start empty. Legacy records are
    /// backfilled and rewritten under the current key.
    pub fn open(db: Database) -> Result<Self, ServerError> {
        let (applications, notifications) = db.with_conn(|conn| {
            let now = Utc::now().timestamp();
            let applications: Vec<LoanApplication> =
                match kv::load_snapshot(conn, APPLICATIONS_KEY, now)? {
                    Some(apps) => apps,
                    None => {
                        let mut legacy: Vec<LoanApplication> =
                            kv::load_snapshot(conn, LEGACY_APPLICATIONS_KEY, now)?.unwrap_or_default();
                        let backfilled = legacy
                            .iter_mut()
                            .map(LoanApplication::backfill_legacy)
                            .filter(|changed| *changed)
                            .count();
                        if !legacy.is_empty() {
                            kv::set_json(conn, APPLICATIONS_KEY, &legacy, now)?;
                            tracing::info!(
                                applications = legacy.len(),
                                backfilled,
                                "migrated legacy applications snapshot"
                            );
                        }
                        legacy
                    }
                };
            let notifications: Vec<Notification> =
                kv::load_snapshot(conn, NOTIFICATIONS_KEY, now)?.unwrap_or_default();
            Ok((applications, notifications))
        })?;

        tracing::info!(
            applications = applications.len(),
            notifications = notifications.len(),
            "store hydrated"
        );

        let state = StoreState {
            next_app_seq: next_seq(applications.iter().map(|a| a.id.as_str()), "APP-"),
            next_notification_seq: next_seq(notifications.iter().map(|n| n.id.as_str()), "NTF-"),
            applications,
            notifications,
        };

        Ok(Self {
            db,
            inner: Arc::new(Mutex::new(state)),
        })
    }

    pub fn add_application(&self, data: NewApplication, actor: &str) -> Result<String, ServerError> {
        let mut state = self.inner.lock();
        let now = Utc::now();

        let mut seq = state.next_app_seq;
        let id = loop {
            let candidate = format!("APP-{seq:06}");
            seq += 1;
            if !state.applications.iter().any(|a| a.id == candidate) {
                break candidate;
            }
        };
        state.next_app_seq = seq;

        state.applications.push(LoanApplication {
            id: id.clone(),
            customer_id: data.customer_id,
            applicant_name: data.applicant_name,
            email: data.email,
            loan_type: data.loan_type,
            amount: data.amount,
            term_months: data.term_months,
            purpose: data.purpose,
            status: ApplicationStatus::Submitted,
            documents: Vec::new(),
            credit_score: None,
            credit_report: None,
            compliance: None,
            core_reference: None,
            audit_trail: vec![AuditEntry {
                timestamp: now,
                user: actor.to_string(),
                action: SUBMITTED_ACTION.to_string(),
            }],
            submitted_at: now,
            updated_at: now,
        });

        self.persist_applications(&state.applications, now)?;
        tracing::info!(application = %id, actor, "application submitted");
        Ok(id)
    }

    pub fn get_application_by_id(&self, id: &str) -> Option<LoanApplication> {
        self.inner
            .lock()
            .applications
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn applications(&self) -> Vec<LoanApplication> {
        self.inner.lock().applications.clone()
    }

    pub fn customer_applications(&self, customer_id: &str) -> Vec<LoanApplication> {
        self.inner
            .lock()
            .applications
            .iter()
            .filter(|a| a.customer_id == customer_id)
            .cloned()
            .collect()
    }

    /// Shallow-merge `patch`. Any status is accepted, including moves
    /// backwards through the pipeline.
    pub fn update_application(
        &self,
        id: &str,
        patch: ApplicationPatch,
        actor: &str,
    ) -> Result<LoanApplication, ServerError> {
        self.update_application_with(id, actor, |_| patch)
    }

    /// Build the patch from the record as it stands under the lock, so the
    /// decision and the write cannot interleave with another update.
    pub fn update_application_with<F>(
        &self,
        id: &str,
        actor: &str,
        build: F,
    ) -> Result<LoanApplication, ServerError>
    where
        F: FnOnce(&LoanApplication) -> ApplicationPatch,
    {
        self.mutate_with(id, actor, |app| {
            let patch = build(app);
            let action = patch.describe();
            patch.apply_to(app);
            Ok((app.clone(), action))
        })
    }

    /// Append an audit entry without touching any other field.
    pub fn record_audit(&self, id: &str, actor: &str, action: &str) -> Result<(), ServerError> {
        self.mutate_application(id, actor, action.to_string(), |_| Ok(()))
    }

    /// Append a `pending` document descriptor.
    pub fn append_document(
        &self,
        app_id: &str,
        name: &str,
        actor: &str,
    ) -> Result<DocumentRecord, ServerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServerError::BadRequest("document name is required".into()));
        }
        let action = format!("Document Uploaded: {name}");
        self.mutate_application(app_id, actor, action, |app| {
            let doc = DocumentRecord {
                id: format!("DOC-{:03}", app.documents.len() + 1),
                name: name.to_string(),
                status: DocumentStatus::Pending,
                reason: None,
                extracted_fields: None,
                uploaded_at: Utc::now(),
            };
            app.documents.push(doc.clone());
            Ok(doc)
        })
    }

    pub fn resolve_document(
        &self,
        app_id: &str,
        doc_id: &str,
        status: DocumentStatus,
        reason: Option<String>,
        actor: &str,
    ) -> Result<DocumentRecord, ServerError> {
        let action = match (&status, &reason) {
            (DocumentStatus::Rejected, Some(r)) => format!("Document {doc_id} rejected: {r}"),
            (DocumentStatus::Rejected, None) => format!("Document {doc_id} rejected"),
            (DocumentStatus::Verified, _) => format!("Document {doc_id} verified"),
            (DocumentStatus::Pending, _) => format!("Document {doc_id} returned to pending"),
        };
        self.mutate_application(app_id, actor, action, |app| {
            let doc = app
                .documents
                .iter_mut()
                .find(|d| d.id == doc_id)
                .ok_or(ServerError::NotFound)?;
            doc.status = status;
            doc.reason = reason;
            Ok(doc.clone())
        })
    }

    pub fn set_document_extraction(
        &self,
        app_id: &str,
        doc_id: &str,
        fields: BTreeMap<String, String>,
        actor: &str,
    ) -> Result<(), ServerError> {
        let action = format!("OCR extracted {} field(s) from {doc_id}", fields.len());
        self.mutate_application(app_id, actor, action, |app| {
            let doc = app
                .documents
                .iter_mut()
                .find(|d| d.id == doc_id)
                .ok_or(ServerError::NotFound)?;
            doc.extracted_fields = Some(fields);
            Ok(())
        })
    }

    // Notifications

    pub fn add_notification(
        &self,
        user_id: &str,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> Result<String, ServerError> {
        let mut state = self.inner.lock();
        let now = Utc::now();

        let id = format!("NTF-{:06}", state.next_notification_seq);
        state.next_notification_seq += 1;
        state.notifications.push(Notification {
            id: id.clone(),
            user_id: user_id.to_string(),
            kind,
            message: message.into(),
            read: false,
            timestamp: now,
        });

        self.persist_notifications(&state.notifications, now)?;
        tracing::debug!(notification = %id, user_id, kind = kind.as_str(), "notification added");
        Ok(id)
    }

    pub fn notifications_for(&self, user_id: &str) -> Vec<Notification> {
        self.inner
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn notifications_of_type(&self, user_id: &str, kind: NotificationKind) -> Vec<Notification> {
        self.inner
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && n.kind == kind)
            .cloned()
            .collect()
    }

    pub fn unread_count(&self, user_id: &str) -> usize {
        self.inner
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count()
    }

    /// Only the recipient can mark a notification read.
    pub fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<(), ServerError> {
        let mut state = self.inner.lock();
        let notification = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .ok_or(ServerError::NotFound)?;
        if notification.read {
            return Ok(());
        }
        notification.read = true;
        self.persist_notifications(&state.notifications, Utc::now())
    }

    fn mutate_application<T, F>(
        &self,
        id: &str,
        actor: &str,
        action: String,
        f: F,
    ) -> Result<T, ServerError>
    where
        F: FnOnce(&mut LoanApplication) -> Result<T, ServerError>,
    {
        self.mutate_with(id, actor, |app| Ok((f(app)?, action)))
    }

    /// Run `f` on the record under the lock; it returns the audit text
    /// alongside its result.
    fn mutate_with<T, F>(&self, id: &str, actor: &str, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&mut LoanApplication) -> Result<(T, String), ServerError>,
    {
        let mut state = self.inner.lock();
        let now = Utc::now();

        let app = state
            .applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(ServerError::NotFound)?;
        let (out, action) = f(app)?;
        app.updated_at = now;
        app.audit_trail.push(AuditEntry {
            timestamp: now,
            user: actor.to_string(),
            action,
        });

        self.persist_applications(&state.applications, now)?;
        Ok(out)
    }

    fn persist_applications(
        &self,
        applications: &[LoanApplication],
        now: DateTime<Utc>,
    ) -> Result<(), ServerError> {
        self.db
            .with_conn(|conn| kv::set_json(conn, APPLICATIONS_KEY, applications, now.timestamp()))
            .inspect_err(|e| tracing::warn!(error = %e, "persisting applications failed"))
    }

    fn persist_notifications(
        &self,
        notifications: &[Notification],
        now: DateTime<Utc>,
    ) -> Result<(), ServerError> {
        self.db
            .with_conn(|conn| kv::set_json(conn, NOTIFICATIONS_KEY, notifications, now.timestamp()))
            .inspect_err(|e| tracing::warn!(error = %e, "persisting notifications failed"))
    }
}

/// One past the highest numeric suffix among ids with `prefix`.
fn next_seq<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str) -> u64 {
    ids.filter_map(|id| id.strip_prefix(prefix)?.parse::<u64>().ok())
        .max()
        .map_or(1, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use std::collections::HashSet;

    fn open_store() -> (tempfile::TempDir, Database, ApplicationStore) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("store.sqlite3"));
        init_db(&db).unwrap();
        let store = ApplicationStore::open(db.clone()).unwrap();
        (dir, db, store)
    }

    fn jane() -> NewApplication {
        NewApplication {
            customer_id: "jane@x.com".into(),
            applicant_name: "Jane".into(),
            email: "jane@x.com".into(),
            loan_type: "Personal Loan".into(),
            amount: 5000,
            term_months: None,
            purpose: None,
        }
    }

    #[test]
    fn jane_submission_starts_submitted_with_one_audit_entry() {
        let (_dir, _db, store) = open_store();
        let id = store.add_application(jane(), "jane@x.com").unwrap();

        let app = store.get_application_by_id(&id).unwrap();
        assert_eq!(app.status, ApplicationStatus::Submitted);
        assert_eq!(app.applicant_name, "Jane");
        assert_eq!(app.amount, 5000);
        assert_eq!(app.credit_score, None);
        assert_eq!(app.credit_report, None);
        assert_eq!(app.audit_trail.len(), 1);
        assert_eq!(app.audit_trail[0].action, SUBMITTED_ACTION);
        assert_eq!(app.audit_trail[0].user, "jane@x.com");
    }

    #[test]
    fn ids_are_unique_and_each_record_appears_once() {
        let (_dir, _db, store) = open_store();
        let ids: Vec<String> = (0..25)
            .map(|_| store.add_application(jane(), "jane@x.com").unwrap())
            .collect();

        let distinct: HashSet<&String> = ids.iter().collect();
        assert_eq!(distinct.len(), ids.len());

        let all = store.applications();
        for id in &ids {
            assert_eq!(all.iter().filter(|a| &a.id == id).count(), 1);
            assert_eq!(store.get_application_by_id(id).unwrap().id, *id);
        }
    }

    #[test]
    fn missing_id_is_none() {
        let (_dir, _db, store) = open_store();
        assert!(store.get_application_by_id("APP-999999").is_none());
    }

    #[test]
    fn status_update_is_last_write_wins_without_transition_checks() {
        let (_dir, _db, store) = open_store();
        let id = store.add_application(jane(), "jane@x.com").unwrap();

        store
            .update_application(&id, ApplicationPatch::status(ApplicationStatus::Approved), "officer")
            .unwrap();
        // Backwards move is accepted.
        store
            .update_application(&id, ApplicationPatch::status(ApplicationStatus::Submitted), "officer")
            .unwrap();
        assert_eq!(
            store.get_application_by_id(&id).unwrap().status,
            ApplicationStatus::Submitted
        );

        let app = store.get_application_by_id(&id).unwrap();
        assert_eq!(app.audit_trail.len(), 3);
        assert_eq!(app.audit_trail[1].action, "Status changed to Approved");
        assert!(app.updated_at >= app.submitted_at);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let (_dir, _db, store) = open_store();
        let res = store.update_application("APP-000042", ApplicationPatch::default(), "x");
        assert!(matches!(res, Err(ServerError::NotFound)));
    }

    #[test]
    fn reload_yields_identical_collections() {
        let (_dir, db, store) = open_store();
        let id = store.add_application(jane(), "jane@x.com").unwrap();
        let doc = store.append_document(&id, "payslip.pdf", "jane@x.com").unwrap();
        store
            .resolve_document(&id, &doc.id, DocumentStatus::Verified, None, "system")
            .unwrap();
        store
            .add_notification("jane@x.com", NotificationKind::Reminder, "Upload your ID")
            .unwrap();

        let before_apps = store.applications();
        let before_notes = store.notifications_for("jane@x.com");

        let reloaded = ApplicationStore::open(db).unwrap();
        assert_eq!(reloaded.applications(), before_apps);
        assert_eq!(reloaded.notifications_for("jane@x.com"), before_notes);

        // Sequence continues past hydrated ids.
        let next = reloaded.add_application(jane(), "jane@x.com").unwrap();
        assert_ne!(next, id);
    }

    #[test]
    fn legacy_key_is_read_when_current_key_missing() {
        let (_dir, db, store) = open_store();
        let id = store.add_application(jane(), "jane@x.com").unwrap();
        let snapshot = store.applications();

        db.with_conn(|conn| {
            kv::remove_item(conn, APPLICATIONS_KEY)?;
            kv::set_json(conn, LEGACY_APPLICATIONS_KEY, &snapshot, 0)
        })
        .unwrap();

        let reloaded = ApplicationStore::open(db).unwrap();
        assert!(reloaded.get_application_by_id(&id).is_some());
    }

    #[test]
    fn older_client_records_hydrate_and_migrate() {
        let (_dir, db, _store) = open_store();
        db.with_conn(|conn| {
            kv::remove_item(conn, APPLICATIONS_KEY)?;
            kv::set_item(
                conn,
                LEGACY_APPLICATIONS_KEY,
                r#"[{"id":"LN-1","applicantName":"Jane","email":"jane@x.com","loanAmount":5000,
                    "loanType":"Personal Loan","status":"Pending Document Review",
                    "documents":[],"auditTrail":[]}]"#,
                0,
            )
        })
        .unwrap();

        let store = ApplicationStore::open(db.clone()).unwrap();
        let app = store.get_application_by_id("LN-1").unwrap();
        assert_eq!(app.amount, 5000);
        assert_eq!(app.customer_id, "jane@x.com");
        assert_eq!(app.status, ApplicationStatus::PendingDocumentReview);
        assert_eq!(store.customer_applications("jane@x.com").len(), 1);

        // Rewritten under the current key, so a second open reads it directly.
        let migrated = db
            .with_conn(|conn| kv::get_item(conn, APPLICATIONS_KEY))
            .unwrap()
            .unwrap();
        assert!(migrated.contains("\"customerId\":\"jane@x.com\""));
        let reopened = ApplicationStore::open(db).unwrap();
        assert_eq!(reopened.applications(), store.applications());
    }

    #[test]
    fn unreadable_snapshot_starts_empty_and_is_kept_aside() {
        let (_dir, db, _store) = open_store();
        db.with_conn(|conn| kv::set_item(conn, APPLICATIONS_KEY, "[{\"id\":", 0))
            .unwrap();

        let store = ApplicationStore::open(db.clone()).unwrap();
        assert!(store.applications().is_empty());
        let kept = db
            .with_conn(|conn| kv::get_item(conn, "applications:unreadable"))
            .unwrap();
        assert_eq!(kept.as_deref(), Some("[{\"id\":"));

        // The store keeps working afterwards.
        assert!(store.add_application(jane(), "jane@x.com").is_ok());
    }

    #[test]
    fn patch_builder_sees_the_current_record() {
        let (_dir, _db, store) = open_store();
        let id = store.add_application(jane(), "jane@x.com").unwrap();
        store
            .update_application(&id, ApplicationPatch::status(ApplicationStatus::Funded), "mgr")
            .unwrap();

        let app = store
            .update_application_with(&id, "bureau", |current| ApplicationPatch {
                status: current
                    .status
                    .is_forward_move(ApplicationStatus::CreditCheckComplete)
                    .then_some(ApplicationStatus::CreditCheckComplete),
                credit_score: Some(700),
                ..ApplicationPatch::default()
            })
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::Funded);
        assert_eq!(app.credit_score, Some(700));
        assert_eq!(app.audit_trail.last().unwrap().action, "Credit score set to 700");
    }

    #[test]
    fn documents_append_in_order_and_resolve() {
        let (_dir, _db, store) = open_store();
        let id = store.add_application(jane(), "jane@x.com").unwrap();
        let a = store.append_document(&id, "id.png", "jane@x.com").unwrap();
        let b = store.append_document(&id, "bank.pdf", "jane@x.com").unwrap();
        assert_eq!(a.id, "DOC-001");
        assert_eq!(b.id, "DOC-002");
        assert_eq!(a.status, DocumentStatus::Pending);

        store
            .resolve_document(&id, &b.id, DocumentStatus::Rejected, Some("blurry".into()), "system")
            .unwrap();
        let app = store.get_application_by_id(&id).unwrap();
        assert_eq!(app.documents[1].status, DocumentStatus::Rejected);
        assert_eq!(app.documents[1].reason.as_deref(), Some("blurry"));
        assert!(!app.documents_verified());

        assert!(store.append_document(&id, "   ", "jane@x.com").is_err());
        assert!(matches!(
            store.resolve_document(&id, "DOC-404", DocumentStatus::Verified, None, "system"),
            Err(ServerError::NotFound)
        ));
    }

    #[test]
    fn customer_applications_filter_by_owner() {
        let (_dir, _db, store) = open_store();
        store.add_application(jane(), "jane@x.com").unwrap();
        let mut other = jane();
        other.customer_id = "bob@x.com".into();
        store.add_application(other, "bob@x.com").unwrap();

        assert_eq!(store.customer_applications("jane@x.com").len(), 1);
        assert_eq!(store.customer_applications("bob@x.com").len(), 1);
        assert!(store.customer_applications("nobody@x.com").is_empty());
    }

    #[test]
    fn notifications_filter_and_mark_read() {
        let (_dir, _db, store) = open_store();
        let n1 = store
            .add_notification("jane@x.com", NotificationKind::StatusUpdate, "Approved")
            .unwrap();
        store
            .add_notification("jane@x.com", NotificationKind::Reminder, "Upload ID")
            .unwrap();
        store
            .add_notification("bob@x.com", NotificationKind::Reminder, "Upload ID")
            .unwrap();

        assert_eq!(store.notifications_for("jane@x.com").len(), 2);
        assert_eq!(
            store
                .notifications_of_type("jane@x.com", NotificationKind::Reminder)
                .len(),
            1
        );
        assert_eq!(store.unread_count("jane@x.com"), 2);

        // Someone else's notification is invisible.
        assert!(matches!(
            store.mark_notification_read(&n1, "bob@x.com"),
            Err(ServerError::NotFound)
        ));

        store.mark_notification_read(&n1, "jane@x.com").unwrap();
        store.mark_notification_read(&n1, "jane@x.com").unwrap();
        assert_eq!(store.unread_count("jane@x.com"), 1);
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let (_dir, _db, store) = open_store();
        let id = store.add_application(jane(), "jane@x.com").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let id = id.clone();
                std::thread::spawn(move || {
                    store.record_audit(&id, "worker", &format!("tick {i}")).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.get_application_by_id(&id).unwrap().audit_trail.len(), 9);
    }

    #[test]
    fn next_seq_skips_foreign_ids() {
        let ids = ["APP-000003", "legacy-7", "APP-000010"];
        assert_eq!(next_seq(ids.into_iter(), "APP-"), 11);
        assert_eq!(next_seq(std::iter::empty(), "APP-"), 1);
    }
}
