use chrono::Utc;
use log::{info, warn};

use crate::core::auth::{Role, Session};
use crate::core::models::student::{StudentAction, StudentApplication, StudentApplicationInsert, StudentStatus};
use crate::core::ports::repository::StudentStore;
use crate::error::Error;

/// Runs one workflow transition: role check, fetch, ownership check,
/// transition-table lookup, field mutation, save. Nothing is written when
/// any step fails.
async fn transition<D>(db: &mut D, session: &Session, id: i32, action: StudentAction, reason: Option<String>) -> Result<StudentStatus, Error>
where
    D: StudentStore,
{
    session.require(action.role())?;
    let mut app = db.find(id).await?.ok_or(Error::NotFound)?;
    if action.role() == Role::Institute {
        let code = session.owner_key()?;
        let owned = app.institute_code.as_deref().map_or(false, |c| c.eq_ignore_ascii_case(code));
        if !owned {
            warn!("institute {} denied {} on student application {}", code, action.name(), id);
            return Err(Error::Forbidden);
        }
    }
    let from = app.status;
    app.status = action.apply(from)?;
    app.last_updated_on = Some(Utc::now());
    if let Some(default) = action.default_note() {
        let reason = reason.map(|r| r.trim().to_owned()).filter(|r| !r.is_empty());
        app.admin_notes = Some(reason.unwrap_or_else(|| default.to_owned()));
    }
    if app.status == StudentStatus::Approved {
        app.approved_on = Some(Utc::now());
    }
    db.save(&app).await?;
    info!("student application {}: {} -> {} ({})", id, from, app.status, action.name());
    Ok(app.status)
}

pub async fn verify_by_institute<D: StudentStore>(db: &mut D, session: &Session, id: i32) -> Result<StudentStatus, Error> {
    transition(db, session, id, StudentAction::VerifyByInstitute, None).await
}

pub async fn reject_by_institute<D: StudentStore>(db: &mut D, session: &Session, id: i32, reason: Option<String>) -> Result<StudentStatus, Error> {
    transition(db, session, id, StudentAction::RejectByInstitute, reason).await
}

pub async fn approve_by_state<D: StudentStore>(db: &mut D, session: &Session, id: i32) -> Result<StudentStatus, Error> {
    transition(db, session, id, StudentAction::ApproveByState, None).await
}

pub async fn reject_by_state<D: StudentStore>(db: &mut D, session: &Session, id: i32, reason: Option<String>) -> Result<StudentStatus, Error> {
    transition(db, session, id, StudentAction::RejectByState, reason).await
}

pub async fn forward_to_ministry<D: StudentStore>(db: &mut D, session: &Session, id: i32) -> Result<StudentStatus, Error> {
    transition(db, session, id, StudentAction::ForwardToMinistry, None).await
}

pub async fn approve_and_forward<D: StudentStore>(db: &mut D, session: &Session, id: i32) -> Result<StudentStatus, Error> {
    transition(db, session, id, StudentAction::ApproveAndForward, None).await
}

pub async fn approve_by_ministry<D: StudentStore>(db: &mut D, session: &Session, id: i32) -> Result<StudentStatus, Error> {
    transition(db, session, id, StudentAction::ApproveByMinistry, None).await
}

pub async fn reject_by_ministry<D: StudentStore>(db: &mut D, session: &Session, id: i32, reason: Option<String>) -> Result<StudentStatus, Error> {
    transition(db, session, id, StudentAction::RejectByMinistry, reason).await
}

/// Submit a fresh application. Requires a student session whose email is the
/// application's owner email.
pub async fn submit<D: StudentStore>(db: &mut D, session: &Session, mut app: StudentApplicationInsert) -> Result<i32, Error> {
    let email = session.require_student()?;
    if !app.email.eq_ignore_ascii_case(email) {
        return Err(Error::Forbidden);
    }
    if app.student_name.trim().is_empty() {
        return Err(Error::Validation("student name must not be blank".into()));
    }
    app.email = email.to_owned();
    db.insert(app).await
}

/// Fetch one application, enforcing ownership: students see only their own,
/// institutes only their students, state and ministry see everything.
pub async fn detail<D: StudentStore>(db: &mut D, session: &Session, id: i32) -> Result<StudentApplication, Error> {
    let app = db.find(id).await?.ok_or(Error::NotFound)?;
    match session.role {
        Role::Student => {
            if !app.email.eq_ignore_ascii_case(session.owner_key()?) {
                return Err(Error::Forbidden);
            }
        }
        Role::Institute => {
            let code = session.owner_key()?;
            if !app.institute_code.as_deref().map_or(false, |c| c.eq_ignore_ascii_case(code)) {
                return Err(Error::Forbidden);
            }
        }
        Role::State | Role::Ministry => {}
    }
    Ok(app)
}

pub async fn my_applications<D: StudentStore>(db: &mut D, session: &Session) -> Result<Vec<StudentApplication>, Error> {
    let email = session.require_student()?;
    db.list_by_owner(email).await
}

pub async fn institute_applications<D: StudentStore>(db: &mut D, session: &Session) -> Result<Vec<StudentApplication>, Error> {
    let code = session.require_institute()?;
    db.list_by_institute(code).await
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    struct MemStore {
        rows: HashMap<i32, StudentApplication>,
        next_id: i32,
    }

    impl MemStore {
        fn new() -> Self {
            Self { rows: HashMap::new(), next_id: 1 }
        }

        fn with(app: StudentApplication) -> Self {
            let mut store = Self::new();
            store.next_id = app.id + 1;
            store.rows.insert(app.id, app);
            store
        }

        fn status_of(&self, id: i32) -> StudentStatus {
            self.rows[&id].status
        }
    }

    impl StudentStore for MemStore {
        async fn find(&mut self, id: i32) -> Result<Option<StudentApplication>, Error> {
            Ok(self.rows.get(&id).cloned())
        }

        async fn list_by_status(&mut self, statuses: &[StudentStatus]) -> Result<Vec<StudentApplication>, Error> {
            let mut list: Vec<_> = self.rows.values().filter(|a| statuses.contains(&a.status)).cloned().collect();
            list.sort_by(|a, b| b.date_submitted.cmp(&a.date_submitted));
            Ok(list)
        }

        async fn list_by_owner(&mut self, email: &str) -> Result<Vec<StudentApplication>, Error> {
            Ok(self.rows.values().filter(|a| a.email.eq_ignore_ascii_case(email)).cloned().collect())
        }

        async fn list_by_institute(&mut self, code: &str) -> Result<Vec<StudentApplication>, Error> {
            Ok(self
                .rows
                .values()
                .filter(|a| a.institute_code.as_deref().map_or(false, |c| c.eq_ignore_ascii_case(code)))
                .cloned()
                .collect())
        }

        async fn save(&mut self, app: &StudentApplication) -> Result<(), Error> {
            let current = self.rows.get(&app.id).ok_or(Error::Conflict)?;
            if current.version != app.version {
                return Err(Error::Conflict);
            }
            let mut saved = app.clone();
            saved.version += 1;
            self.rows.insert(saved.id, saved);
            Ok(())
        }

        async fn insert(&mut self, app: StudentApplicationInsert) -> Result<i32, Error> {
            let id = self.next_id;
            self.next_id += 1;
            self.rows.insert(id, application(id, &app.email, app.institute_code.as_deref().unwrap_or("INS1")));
            Ok(id)
        }
    }

    fn application(id: i32, email: &str, institute_code: &str) -> StudentApplication {
        StudentApplication {
            id,
            email: email.to_owned(),
            student_name: "Asha Rao".into(),
            scheme_name: Some("Post-Matric".into()),
            status: StudentStatus::Submitted,
            date_submitted: Utc::now(),
            gender: None,
            date_of_birth: None,
            mobile_number: None,
            aadhar_number: None,
            institute_name: Some("Model College".into()),
            institute_code: Some(institute_code.to_owned()),
            present_course: None,
            university_or_board_name: None,
            previous_class_percentage: None,
            admission_fee: None,
            tuition_fee: None,
            father_name: None,
            mother_name: None,
            family_annual_income: None,
            bank_name: None,
            ifsc_code: None,
            bank_account: None,
            state: None,
            district: None,
            pincode: None,
            photo_path: None,
            aadhar_path: None,
            institute_id_card_path: None,
            previous_marksheet_path: None,
            fee_receipt_path: None,
            bank_passbook_path: None,
            admin_notes: None,
            approved_on: None,
            last_updated_on: None,
            version: 1,
        }
    }

    fn institute(code: &str) -> Session {
        Session::new(Role::Institute, Some(code.to_owned()))
    }

    fn state() -> Session {
        Session::new(Role::State, None)
    }

    fn ministry() -> Session {
        Session::new(Role::Ministry, None)
    }

    #[tokio::test]
    async fn test_full_approval_chain() {
        let mut db = MemStore::with(application(1, "a@x.com", "INS1"));

        assert_eq!(verify_by_institute(&mut db, &institute("INS1"), 1).await.unwrap(), StudentStatus::VerifiedByInstitute);
        assert_eq!(approve_by_state(&mut db, &state(), 1).await.unwrap(), StudentStatus::ApprovedByState);
        assert_eq!(forward_to_ministry(&mut db, &state(), 1).await.unwrap(), StudentStatus::ForwardedToMinistry);
        assert_eq!(approve_by_ministry(&mut db, &ministry(), 1).await.unwrap(), StudentStatus::Approved);

        let app = &db.rows[&1];
        assert!(app.approved_on.is_some());
        assert!(app.last_updated_on.is_some());
    }

    #[tokio::test]
    async fn test_wrong_role_leaves_status_unchanged() {
        let mut db = MemStore::with(application(1, "a@x.com", "INS1"));
        let student = Session::new(Role::Student, Some("a@x.com".into()));

        assert!(matches!(approve_by_state(&mut db, &student, 1).await, Err(Error::Unauthorized)));
        assert!(matches!(approve_by_ministry(&mut db, &state(), 1).await, Err(Error::Unauthorized)));
        assert_eq!(db.status_of(1), StudentStatus::Submitted);
    }

    #[tokio::test]
    async fn test_institute_mismatch_is_forbidden() {
        let mut db = MemStore::with(application(1, "a@x.com", "INS1"));

        assert!(matches!(verify_by_institute(&mut db, &institute("INS2"), 1).await, Err(Error::Forbidden)));
        assert_eq!(db.status_of(1), StudentStatus::Submitted);
        // codes match case-insensitively
        assert!(verify_by_institute(&mut db, &institute("ins1"), 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_reject_records_reason() {
        let mut db = MemStore::with(application(1, "a@x.com", "INS1"));
        reject_by_state(&mut db, &state(), 1, Some("incomplete docs".into())).await.unwrap();
        assert_eq!(db.rows[&1].admin_notes.as_deref(), Some("incomplete docs"));
        assert_eq!(db.status_of(1), StudentStatus::RejectedByState);
    }

    #[tokio::test]
    async fn test_blank_reason_falls_back_to_default_note() {
        let mut db = MemStore::with(application(1, "a@x.com", "INS1"));
        reject_by_institute(&mut db, &institute("INS1"), 1, Some("   ".into())).await.unwrap();
        assert_eq!(db.rows[&1].admin_notes.as_deref(), Some("Rejected by institute"));
    }

    #[tokio::test]
    async fn test_terminal_state_rejects_further_transitions() {
        let mut db = MemStore::with(application(1, "a@x.com", "INS1"));
        reject_by_ministry(&mut db, &ministry(), 1, None).await.unwrap();
        assert!(matches!(
            approve_by_ministry(&mut db, &ministry(), 1).await,
            Err(Error::InvalidTransition { .. })
        ));
        assert_eq!(db.status_of(1), StudentStatus::RejectedByMinistry);
    }

    #[tokio::test]
    async fn test_forward_only_from_state_approval() {
        let mut db = MemStore::with(application(1, "a@x.com", "INS1"));
        assert!(matches!(forward_to_ministry(&mut db, &state(), 1).await, Err(Error::InvalidTransition { .. })));
        // but the one-step shortcut is a legal edge
        assert_eq!(approve_and_forward(&mut db, &state(), 1).await.unwrap(), StudentStatus::ForwardedToMinistry);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let mut db = MemStore::new();
        assert!(matches!(approve_by_state(&mut db, &state(), 99).await, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_stale_save_conflicts() {
        let mut db = MemStore::with(application(1, "a@x.com", "INS1"));
        let stale = db.rows[&1].clone();
        verify_by_institute(&mut db, &institute("INS1"), 1).await.unwrap();
        assert!(matches!(db.save(&stale).await, Err(Error::Conflict)));
    }

    #[tokio::test]
    async fn test_fetch_then_save_drifts_nothing_but_version() {
        let mut db = MemStore::with(application(1, "a@x.com", "INS1"));
        let fetched = db.find(1).await.unwrap().unwrap();
        db.save(&fetched).await.unwrap();

        let stored = db.rows[&1].clone();
        assert_eq!(stored.version, fetched.version + 1);
        let mut before = serde_json::to_value(&fetched).unwrap();
        let mut after = serde_json::to_value(&stored).unwrap();
        before.as_object_mut().unwrap().remove("version");
        after.as_object_mut().unwrap().remove("version");
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_detail_enforces_ownership() {
        let mut db = MemStore::with(application(1, "a@x.com", "INS1"));
        let owner = Session::new(Role::Student, Some("a@x.com".into()));
        let stranger = Session::new(Role::Student, Some("b@x.com".into()));

        assert_eq!(detail(&mut db, &owner, 1).await.unwrap().id, 1);
        assert!(matches!(detail(&mut db, &stranger, 1).await, Err(Error::Forbidden)));
        assert!(detail(&mut db, &ministry(), 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_submit_requires_matching_owner() {
        let mut db = MemStore::new();
        let owner = Session::new(Role::Student, Some("a@x.com".into()));
        let insert = StudentApplicationInsert {
            email: "someone-else@x.com".into(),
            student_name: "Asha Rao".into(),
            scheme_name: None,
            gender: None,
            date_of_birth: None,
            mobile_number: None,
            aadhar_number: None,
            institute_name: None,
            institute_code: Some("INS1".into()),
            present_course: None,
            university_or_board_name: None,
            previous_class_percentage: None,
            admission_fee: None,
            tuition_fee: None,
            father_name: None,
            mother_name: None,
            family_annual_income: None,
            bank_name: None,
            ifsc_code: None,
            bank_account: None,
            state: None,
            district: None,
            pincode: None,
            photo_path: None,
            aadhar_path: None,
            institute_id_card_path: None,
            previous_marksheet_path: None,
            fee_receipt_path: None,
            bank_passbook_path: None,
        };
        assert!(matches!(submit(&mut db, &owner, insert.clone()).await, Err(Error::Forbidden)));

        let mut own = insert;
        own.email = "a@x.com".into();
        let id = submit(&mut db, &owner, own).await.unwrap();
        assert_eq!(db.status_of(id), StudentStatus::Submitted);
    }
}
