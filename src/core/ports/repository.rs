use crate::core::models::institute::{InstituteApplication, InstituteApplicationInsert, InstituteStatus};
use crate::core::models::student::{StudentApplication, StudentApplicationInsert, StudentStatus};
use crate::error::Error;

/// Persistence contract for student applications. `save` writes the full
/// entity row in one statement (status, notes and timestamps never land
/// separately) and is a compare-and-swap on `version`: a stale save fails
/// with [`Error::Conflict`]. Listings come back newest-submission-first.
pub trait StudentStore {
    async fn find(&mut self, id: i32) -> Result<Option<StudentApplication>, Error>;
    async fn list_by_status(&mut self, statuses: &[StudentStatus]) -> Result<Vec<StudentApplication>, Error>;
    async fn list_by_owner(&mut self, email: &str) -> Result<Vec<StudentApplication>, Error>;
    async fn list_by_institute(&mut self, institute_code: &str) -> Result<Vec<StudentApplication>, Error>;
    async fn save(&mut self, app: &StudentApplication) -> Result<(), Error>;
    async fn insert(&mut self, app: StudentApplicationInsert) -> Result<i32, Error>;
}

/// Persistence contract for institute registration applications. Same save
/// semantics as [`StudentStore`]. Institute codes are matched
/// case-insensitively.
pub trait InstituteStore {
    async fn find(&mut self, id: i32) -> Result<Option<InstituteApplication>, Error>;
    async fn find_by_code(&mut self, institute_code: &str) -> Result<Option<InstituteApplication>, Error>;
    async fn list_by_status(&mut self, statuses: &[InstituteStatus]) -> Result<Vec<InstituteApplication>, Error>;
    async fn save(&mut self, app: &InstituteApplication) -> Result<(), Error>;
    async fn insert(&mut self, app: InstituteApplicationInsert) -> Result<i32, Error>;
}
