use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::core::auth::Role;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR")]
pub enum InstituteStatus {
    Pending,
    VerifiedByState,
    ForwardedToMinistry,
    ApprovedByMinistry,
    RejectedByState,
    RejectedByMinistry,
}

impl InstituteStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InstituteStatus::ApprovedByMinistry | InstituteStatus::RejectedByState | InstituteStatus::RejectedByMinistry
        )
    }
}

impl fmt::Display for InstituteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstituteStatus::Pending => "Pending",
            InstituteStatus::VerifiedByState => "VerifiedByState",
            InstituteStatus::ForwardedToMinistry => "ForwardedToMinistry",
            InstituteStatus::ApprovedByMinistry => "ApprovedByMinistry",
            InstituteStatus::RejectedByState => "RejectedByState",
            InstituteStatus::RejectedByMinistry => "RejectedByMinistry",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstituteAction {
    VerifyByState,
    ForwardToMinistry,
    RejectByState,
    ApproveByMinistry,
    RejectByMinistry,
}

impl InstituteAction {
    pub fn name(&self) -> &'static str {
        match self {
            InstituteAction::VerifyByState => "verify",
            InstituteAction::ForwardToMinistry => "forward",
            InstituteAction::RejectByState => "reject",
            InstituteAction::ApproveByMinistry => "approve",
            InstituteAction::RejectByMinistry => "reject",
        }
    }

    pub fn role(&self) -> Role {
        match self {
            InstituteAction::VerifyByState | InstituteAction::ForwardToMinistry | InstituteAction::RejectByState => Role::State,
            InstituteAction::ApproveByMinistry | InstituteAction::RejectByMinistry => Role::Ministry,
        }
    }

    pub fn default_note(&self) -> Option<&'static str> {
        match self {
            InstituteAction::RejectByState => Some("Rejected by State"),
            InstituteAction::RejectByMinistry => Some("Rejected by Ministry"),
            _ => None,
        }
    }

    /// Transition table for institute registration applications. The only
    /// authority on legal edges; terminal states admit no action.
    pub fn apply(&self, from: InstituteStatus) -> Result<InstituteStatus, Error> {
        use InstituteStatus::*;
        let to = match (self, from) {
            (InstituteAction::VerifyByState, Pending) => VerifiedByState,
            (InstituteAction::ForwardToMinistry, VerifiedByState) => ForwardedToMinistry,
            (InstituteAction::RejectByState, Pending | VerifiedByState) => RejectedByState,
            (InstituteAction::ApproveByMinistry, Pending | VerifiedByState | ForwardedToMinistry) => ApprovedByMinistry,
            (InstituteAction::RejectByMinistry, Pending | VerifiedByState | ForwardedToMinistry) => RejectedByMinistry,
            _ => {
                return Err(Error::InvalidTransition {
                    from: from.to_string(),
                    action: self.name(),
                })
            }
        };
        Ok(to)
    }
}

/// An institute's registration application. `institute_code` doubles as the
/// login username once the ministry approves and `is_active_login` turns on.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InstituteApplication {
    pub id: i32,
    pub institute_name: String,
    pub institute_code: String,
    pub dise_code: Option<String>,
    pub state: String,
    pub district: String,
    pub location: Option<String>,
    pub institute_type: Option<String>,
    pub affiliated_university_state: Option<String>,
    pub university_board_name: Option<String>,
    pub year_admission_started: Option<i32>,
    pub address: Option<String>,
    pub principal_name: Option<String>,
    pub mobile_number: Option<String>,
    pub telephone: Option<String>,
    pub establish_certificate_path: Option<String>,
    pub affiliation_certificate_path: Option<String>,
    pub declaration_accepted: bool,
    pub status: InstituteStatus,
    pub submitted_on: DateTime<Utc>,
    pub approved_on: Option<DateTime<Utc>>,
    pub is_active_login: bool,
    pub admin_notes: Option<String>,
    pub last_updated_on: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub salt: String,
    pub security_question: Option<String>,
    #[serde(skip_serializing)]
    pub security_answer: Option<String>,
    pub version: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstituteApplicationInsert {
    pub institute_name: String,
    pub institute_code: String,
    pub dise_code: Option<String>,
    pub state: String,
    pub district: String,
    pub location: Option<String>,
    pub institute_type: Option<String>,
    pub affiliated_university_state: Option<String>,
    pub university_board_name: Option<String>,
    pub year_admission_started: Option<i32>,
    pub address: Option<String>,
    pub principal_name: Option<String>,
    pub mobile_number: Option<String>,
    pub telephone: Option<String>,
    pub establish_certificate_path: Option<String>,
    pub affiliation_certificate_path: Option<String>,
    pub declaration_accepted: bool,
    // filled in by the registration handler, never taken from the client
    #[serde(skip_deserializing)]
    pub password_hash: String,
    #[serde(skip_deserializing)]
    pub salt: String,
    pub security_question: Option<String>,
    pub security_answer: Option<String>,
}

/// Descriptive fields an institute may edit on its own record after
/// registration. Status, login flag and credentials are not among them.
#[derive(Debug, Clone, Deserialize)]
pub struct InstituteProfileUpdate {
    pub dise_code: Option<String>,
    pub state: String,
    pub district: String,
    pub university_board_name: Option<String>,
    pub year_admission_started: Option<i32>,
    pub address: Option<String>,
    pub principal_name: Option<String>,
    pub mobile_number: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_happy_path_edges() {
        assert_eq!(
            InstituteAction::VerifyByState.apply(InstituteStatus::Pending).unwrap(),
            InstituteStatus::VerifiedByState
        );
        assert_eq!(
            InstituteAction::ForwardToMinistry.apply(InstituteStatus::VerifiedByState).unwrap(),
            InstituteStatus::ForwardedToMinistry
        );
        assert_eq!(
            InstituteAction::ApproveByMinistry.apply(InstituteStatus::ForwardedToMinistry).unwrap(),
            InstituteStatus::ApprovedByMinistry
        );
    }

    #[test]
    fn test_ministry_may_short_circuit() {
        assert_eq!(
            InstituteAction::ApproveByMinistry.apply(InstituteStatus::Pending).unwrap(),
            InstituteStatus::ApprovedByMinistry
        );
        assert_eq!(
            InstituteAction::RejectByMinistry.apply(InstituteStatus::VerifiedByState).unwrap(),
            InstituteStatus::RejectedByMinistry
        );
    }

    #[test]
    fn test_forward_requires_verification() {
        assert!(matches!(
            InstituteAction::ForwardToMinistry.apply(InstituteStatus::Pending),
            Err(Error::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_terminal_states_admit_no_action() {
        let terminals = [
            InstituteStatus::ApprovedByMinistry,
            InstituteStatus::RejectedByState,
            InstituteStatus::RejectedByMinistry,
        ];
        let actions = [
            InstituteAction::VerifyByState,
            InstituteAction::ForwardToMinistry,
            InstituteAction::RejectByState,
            InstituteAction::ApproveByMinistry,
            InstituteAction::RejectByMinistry,
        ];
        for from in terminals {
            for action in actions {
                assert!(matches!(action.apply(from), Err(Error::InvalidTransition { .. })));
            }
        }
    }
}
