use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Who the caller is. Students and institutes additionally carry an owner
/// key (email / institute code) in their [`Session`]; state and ministry
/// accounts oversee everything and have no ownership scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Student,
    Institute,
    State,
    Ministry,
}

/// An authenticated session, rebuilt from the signed token on every request
/// and passed explicitly into each service call. Never read from ambient
/// state.
#[derive(Debug, Clone)]
pub struct Session {
    pub role: Role,
    pub owner: Option<String>,
}

impl Session {
    pub fn new(role: Role, owner: Option<String>) -> Self {
        Self { role, owner }
    }

    pub fn require(&self, role: Role) -> Result<(), Error> {
        if self.role != role {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    /// The identity key of a student or institute session.
    pub fn owner_key(&self) -> Result<&str, Error> {
        self.owner.as_deref().ok_or(Error::Unauthorized)
    }

    /// Require the institute role and return the caller's institute code.
    pub fn require_institute(&self) -> Result<&str, Error> {
        self.require(Role::Institute)?;
        self.owner_key()
    }

    /// Require the student role and return the caller's email.
    pub fn require_student(&self) -> Result<&str, Error> {
        self.require(Role::Student)?;
        self.owner_key()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_require_role() {
        let state = Session::new(Role::State, None);
        assert!(state.require(Role::State).is_ok());
        assert!(matches!(state.require(Role::Ministry), Err(Error::Unauthorized)));
    }

    #[test]
    fn test_owner_key_missing() {
        let bare = Session::new(Role::Institute, None);
        assert!(matches!(bare.require_institute(), Err(Error::Unauthorized)));
        let inst = Session::new(Role::Institute, Some("INS1".into()));
        assert_eq!(inst.require_institute().unwrap(), "INS1");
    }
}
