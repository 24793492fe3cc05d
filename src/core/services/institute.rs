use chrono::Utc;
use log::info;

use crate::core::auth::{Role, Session};
use crate::core::models::institute::{InstituteAction, InstituteApplication, InstituteApplicationInsert, InstituteProfileUpdate, InstituteStatus};
use crate::core::ports::repository::InstituteStore;
use crate::error::Error;

/// Same pipeline as the student machine, with the one cross-field effect of
/// the whole system: ministry approval switches the institute's login on.
async fn transition<D>(db: &mut D, session: &Session, id: i32, action: InstituteAction, reason: Option<String>) -> Result<InstituteStatus, Error>
where
    D: InstituteStore,
{
    session.require(action.role())?;
    let mut app = db.find(id).await?.ok_or(Error::NotFound)?;
    let from = app.status;
    app.status = action.apply(from)?;
    app.last_updated_on = Some(Utc::now());
    if let Some(default) = action.default_note() {
        let reason = reason.map(|r| r.trim().to_owned()).filter(|r| !r.is_empty());
        app.admin_notes = Some(reason.unwrap_or_else(|| default.to_owned()));
    }
    if app.status == InstituteStatus::ApprovedByMinistry {
        app.is_active_login = true;
        app.approved_on = Some(Utc::now());
    }
    db.save(&app).await?;
    info!("institute application {}: {} -> {} ({})", id, from, app.status, action.name());
    Ok(app.status)
}

pub async fn verify_by_state<D: InstituteStore>(db: &mut D, session: &Session, id: i32) -> Result<InstituteStatus, Error> {
    transition(db, session, id, InstituteAction::VerifyByState, None).await
}

pub async fn forward_to_ministry<D: InstituteStore>(db: &mut D, session: &Session, id: i32) -> Result<InstituteStatus, Error> {
    transition(db, session, id, InstituteAction::ForwardToMinistry, None).await
}

pub async fn reject_by_state<D: InstituteStore>(db: &mut D, session: &Session, id: i32, reason: Option<String>) -> Result<InstituteStatus, Error> {
    transition(db, session, id, InstituteAction::RejectByState, reason).await
}

pub async fn approve_by_ministry<D: InstituteStore>(db: &mut D, session: &Session, id: i32) -> Result<InstituteStatus, Error> {
    transition(db, session, id, InstituteAction::ApproveByMinistry, None).await
}

pub async fn reject_by_ministry<D: InstituteStore>(db: &mut D, session: &Session, id: i32, reason: Option<String>) -> Result<InstituteStatus, Error> {
    transition(db, session, id, InstituteAction::RejectByMinistry, reason).await
}

/// Register a new institute. Anyone may apply, but codes must be unique.
pub async fn register<D: InstituteStore>(db: &mut D, app: InstituteApplicationInsert) -> Result<i32, Error> {
    if app.institute_name.trim().is_empty() || app.institute_code.trim().is_empty() {
        return Err(Error::Validation("institute name and code must not be blank".into()));
    }
    if !app.declaration_accepted {
        return Err(Error::Validation("declaration must be accepted".into()));
    }
    if db.find_by_code(&app.institute_code).await?.is_some() {
        return Err(Error::Validation("institute code already registered".into()));
    }
    db.insert(app).await
}

/// Self-service profile edit: the authenticated institute updates the
/// descriptive fields of its own record. Status, `is_active_login` and
/// credential material are untouched.
pub async fn update_profile<D: InstituteStore>(db: &mut D, session: &Session, data: InstituteProfileUpdate) -> Result<InstituteApplication, Error> {
    let code = session.require_institute()?.to_owned();
    let mut app = db.find_by_code(&code).await?.ok_or(Error::NotFound)?;
    if data.state.trim().is_empty() || data.district.trim().is_empty() {
        return Err(Error::Validation("state and district must not be blank".into()));
    }
    app.dise_code = data.dise_code;
    app.state = data.state;
    app.district = data.district;
    app.university_board_name = data.university_board_name;
    app.year_admission_started = data.year_admission_started;
    app.address = data.address;
    app.principal_name = data.principal_name;
    app.mobile_number = data.mobile_number;
    db.save(&app).await?;
    info!("institute {} updated its profile", code);
    // re-read so the caller sees the stored row, current version included
    db.find(app.id).await?.ok_or(Error::NotFound)
}

/// Fetch one institute application; institutes see only their own record.
pub async fn detail<D: InstituteStore>(db: &mut D, session: &Session, id: i32) -> Result<InstituteApplication, Error> {
    let app = db.find(id).await?.ok_or(Error::NotFound)?;
    match session.role {
        Role::Institute => {
            if !app.institute_code.eq_ignore_ascii_case(session.owner_key()?) {
                return Err(Error::Forbidden);
            }
        }
        Role::Student => return Err(Error::Unauthorized),
        Role::State | Role::Ministry => {}
    }
    Ok(app)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    struct MemStore {
        rows: HashMap<i32, InstituteApplication>,
        next_id: i32,
    }

    impl MemStore {
        fn new() -> Self {
            Self { rows: HashMap::new(), next_id: 1 }
        }

        fn with(app: InstituteApplication) -> Self {
            let mut store = Self::new();
            store.next_id = app.id + 1;
            store.rows.insert(app.id, app);
            store
        }
    }

    impl InstituteStore for MemStore {
        async fn find(&mut self, id: i32) -> Result<Option<InstituteApplication>, Error> {
            Ok(self.rows.get(&id).cloned())
        }

        async fn find_by_code(&mut self, code: &str) -> Result<Option<InstituteApplication>, Error> {
            Ok(self.rows.values().find(|a| a.institute_code.eq_ignore_ascii_case(code)).cloned())
        }

        async fn list_by_status(&mut self, statuses: &[InstituteStatus]) -> Result<Vec<InstituteApplication>, Error> {
            let mut list: Vec<_> = self.rows.values().filter(|a| statuses.contains(&a.status)).cloned().collect();
            list.sort_by(|a, b| b.submitted_on.cmp(&a.submitted_on));
            Ok(list)
        }

        async fn save(&mut self, app: &InstituteApplication) -> Result<(), Error> {
            let current = self.rows.get(&app.id).ok_or(Error::Conflict)?;
            if current.version != app.version {
                return Err(Error::Conflict);
            }
            let mut saved = app.clone();
            saved.version += 1;
            self.rows.insert(saved.id, saved);
            Ok(())
        }

        async fn insert(&mut self, app: InstituteApplicationInsert) -> Result<i32, Error> {
            let id = self.next_id;
            self.next_id += 1;
            self.rows.insert(id, application(id, &app.institute_code));
            Ok(id)
        }
    }

    fn application(id: i32, code: &str) -> InstituteApplication {
        InstituteApplication {
            id,
            institute_name: "Model College".into(),
            institute_code: code.to_owned(),
            dise_code: None,
            state: "Kerala".into(),
            district: "Ernakulam".into(),
            location: Some("Urban".into()),
            institute_type: Some("College".into()),
            affiliated_university_state: None,
            university_board_name: None,
            year_admission_started: Some(1998),
            address: None,
            principal_name: None,
            mobile_number: None,
            telephone: None,
            establish_certificate_path: None,
            affiliation_certificate_path: None,
            declaration_accepted: true,
            status: InstituteStatus::Pending,
            submitted_on: Utc::now(),
            approved_on: None,
            is_active_login: false,
            admin_notes: None,
            last_updated_on: None,
            password_hash: "hash".into(),
            salt: "salt".into(),
            security_question: None,
            security_answer: None,
            version: 1,
        }
    }

    fn state() -> Session {
        Session::new(Role::State, None)
    }

    fn ministry() -> Session {
        Session::new(Role::Ministry, None)
    }

    #[tokio::test]
    async fn test_full_approval_chain_enables_login() {
        let mut db = MemStore::with(application(1, "INS1"));

        assert_eq!(verify_by_state(&mut db, &state(), 1).await.unwrap(), InstituteStatus::VerifiedByState);
        assert_eq!(forward_to_ministry(&mut db, &state(), 1).await.unwrap(), InstituteStatus::ForwardedToMinistry);
        assert!(!db.rows[&1].is_active_login);
        assert_eq!(approve_by_ministry(&mut db, &ministry(), 1).await.unwrap(), InstituteStatus::ApprovedByMinistry);

        let app = &db.rows[&1];
        assert!(app.is_active_login);
        assert!(app.approved_on.is_some());
    }

    #[tokio::test]
    async fn test_ministry_approval_from_pending_also_enables_login() {
        let mut db = MemStore::with(application(1, "INS1"));
        approve_by_ministry(&mut db, &ministry(), 1).await.unwrap();
        assert!(db.rows[&1].is_active_login);
    }

    #[tokio::test]
    async fn test_reject_keeps_login_disabled_and_is_terminal() {
        let mut db = MemStore::with(application(1, "INS1"));
        reject_by_state(&mut db, &state(), 1, Some("incomplete docs".into())).await.unwrap();

        let app = &db.rows[&1];
        assert_eq!(app.status, InstituteStatus::RejectedByState);
        assert_eq!(app.admin_notes.as_deref(), Some("incomplete docs"));
        assert!(!app.is_active_login);

        // terminal: a later ministry approval is refused outright
        assert!(matches!(
            approve_by_ministry(&mut db, &ministry(), 1).await,
            Err(Error::InvalidTransition { .. })
        ));
        assert!(!db.rows[&1].is_active_login);
    }

    #[tokio::test]
    async fn test_wrong_role_leaves_status_unchanged() {
        let mut db = MemStore::with(application(1, "INS1"));
        assert!(matches!(verify_by_state(&mut db, &ministry(), 1).await, Err(Error::Unauthorized)));
        assert!(matches!(approve_by_ministry(&mut db, &state(), 1).await, Err(Error::Unauthorized)));
        assert_eq!(db.rows[&1].status, InstituteStatus::Pending);
    }

    #[tokio::test]
    async fn test_forward_requires_prior_verification() {
        let mut db = MemStore::with(application(1, "INS1"));
        assert!(matches!(forward_to_ministry(&mut db, &state(), 1).await, Err(Error::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_code() {
        let mut db = MemStore::with(application(1, "INS1"));
        let insert = InstituteApplicationInsert {
            institute_name: "Other College".into(),
            institute_code: "ins1".into(),
            dise_code: None,
            state: "Kerala".into(),
            district: "Kollam".into(),
            location: None,
            institute_type: None,
            affiliated_university_state: None,
            university_board_name: None,
            year_admission_started: None,
            address: None,
            principal_name: None,
            mobile_number: None,
            telephone: None,
            establish_certificate_path: None,
            affiliation_certificate_path: None,
            declaration_accepted: true,
            password_hash: "hash".into(),
            salt: "salt".into(),
            security_question: None,
            security_answer: None,
        };
        assert!(matches!(register(&mut db, insert.clone()).await, Err(Error::Validation(_))));

        let mut fresh = insert;
        fresh.institute_code = "INS2".into();
        let id = register(&mut db, fresh).await.unwrap();
        assert_eq!(db.rows[&id].status, InstituteStatus::Pending);
    }

    #[tokio::test]
    async fn test_update_profile_edits_descriptive_fields_only() {
        let mut db = MemStore::with(application(1, "INS1"));
        let own = Session::new(Role::Institute, Some("INS1".into()));
        let update = InstituteProfileUpdate {
            dise_code: Some("DISE-42".into()),
            state: "Kerala".into(),
            district: "Kollam".into(),
            university_board_name: Some("MG University".into()),
            year_admission_started: Some(2001),
            address: Some("College Road".into()),
            principal_name: Some("Dr. Nair".into()),
            mobile_number: Some("9900112233".into()),
        };
        let updated = update_profile(&mut db, &own, update).await.unwrap();
        assert_eq!(updated.district, "Kollam");
        assert_eq!(updated.dise_code.as_deref(), Some("DISE-42"));

        let stored = &db.rows[&1];
        assert_eq!(stored.principal_name.as_deref(), Some("Dr. Nair"));
        assert_eq!(stored.year_admission_started, Some(2001));
        // workflow and credential fields are untouched
        assert_eq!(stored.status, InstituteStatus::Pending);
        assert!(!stored.is_active_login);
        assert_eq!(stored.password_hash, "hash");
        assert_eq!(stored.salt, "salt");
    }

    #[tokio::test]
    async fn test_update_profile_requires_institute_session() {
        let mut db = MemStore::with(application(1, "INS1"));
        let update = InstituteProfileUpdate {
            dise_code: None,
            state: "Kerala".into(),
            district: "Kollam".into(),
            university_board_name: None,
            year_admission_started: None,
            address: None,
            principal_name: None,
            mobile_number: None,
        };
        assert!(matches!(update_profile(&mut db, &state(), update.clone()).await, Err(Error::Unauthorized)));

        let mut blank = update;
        blank.district = "  ".into();
        let own = Session::new(Role::Institute, Some("INS1".into()));
        assert!(matches!(update_profile(&mut db, &own, blank).await, Err(Error::Validation(_))));
        assert_eq!(db.rows[&1].district, "Ernakulam");
    }

    #[tokio::test]
    async fn test_detail_scoped_to_own_institute() {
        let mut db = MemStore::with(application(1, "INS1"));
        let own = Session::new(Role::Institute, Some("ins1".into()));
        let other = Session::new(Role::Institute, Some("INS2".into()));

        assert!(detail(&mut db, &own, 1).await.is_ok());
        assert!(matches!(detail(&mut db, &other, 1).await, Err(Error::Forbidden)));
        assert!(detail(&mut db, &state(), 1).await.is_ok());
    }
}
