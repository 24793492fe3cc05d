use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::core::auth::Role;
use crate::error::Error;

/// Closed set of statuses a student application can hold. `Submitted` is the
/// single initial/pending state; the database stores the variant name
/// verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR")]
pub enum StudentStatus {
    Submitted,
    VerifiedByInstitute,
    ApprovedByState,
    ForwardedToMinistry,
    Approved,
    RejectedByInstitute,
    RejectedByState,
    RejectedByMinistry,
}

impl StudentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StudentStatus::Approved
                | StudentStatus::RejectedByInstitute
                | StudentStatus::RejectedByState
                | StudentStatus::RejectedByMinistry
        )
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StudentStatus::Submitted => "Submitted",
            StudentStatus::VerifiedByInstitute => "VerifiedByInstitute",
            StudentStatus::ApprovedByState => "ApprovedByState",
            StudentStatus::ForwardedToMinistry => "ForwardedToMinistry",
            StudentStatus::Approved => "Approved",
            StudentStatus::RejectedByInstitute => "RejectedByInstitute",
            StudentStatus::RejectedByState => "RejectedByState",
            StudentStatus::RejectedByMinistry => "RejectedByMinistry",
        };
        f.write_str(s)
    }
}

/// Every transition an actor can request on a student application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentAction {
    VerifyByInstitute,
    RejectByInstitute,
    ApproveByState,
    RejectByState,
    ForwardToMinistry,
    ApproveAndForward,
    ApproveByMinistry,
    RejectByMinistry,
}

impl StudentAction {
    pub fn name(&self) -> &'static str {
        match self {
            StudentAction::VerifyByInstitute => "verify",
            StudentAction::RejectByInstitute => "reject",
            StudentAction::ApproveByState => "approve",
            StudentAction::RejectByState => "reject",
            StudentAction::ForwardToMinistry => "forward",
            StudentAction::ApproveAndForward => "approve and forward",
            StudentAction::ApproveByMinistry => "approve",
            StudentAction::RejectByMinistry => "reject",
        }
    }

    /// The role that may request this action. Institute actions additionally
    /// require an institute-code match, enforced in the service layer.
    pub fn role(&self) -> Role {
        match self {
            StudentAction::VerifyByInstitute | StudentAction::RejectByInstitute => Role::Institute,
            StudentAction::ApproveByState
            | StudentAction::RejectByState
            | StudentAction::ForwardToMinistry
            | StudentAction::ApproveAndForward => Role::State,
            StudentAction::ApproveByMinistry | StudentAction::RejectByMinistry => Role::Ministry,
        }
    }

    /// Note written into `admin_notes` when a reject action carries no
    /// reason.
    pub fn default_note(&self) -> Option<&'static str> {
        match self {
            StudentAction::RejectByInstitute => Some("Rejected by institute"),
            StudentAction::RejectByState => Some("Rejected by State"),
            StudentAction::RejectByMinistry => Some("Rejected by Ministry"),
            _ => None,
        }
    }

    /// The transition table. Sole authority on which edges are legal;
    /// everything not listed here is an invalid transition. Terminal states
    /// admit no action.
    pub fn apply(&self, from: StudentStatus) -> Result<StudentStatus, Error> {
        use StudentStatus::*;
        let to = match (self, from) {
            (StudentAction::VerifyByInstitute, Submitted) => VerifiedByInstitute,
            (StudentAction::RejectByInstitute, Submitted) => RejectedByInstitute,
            (StudentAction::ApproveByState, Submitted | VerifiedByInstitute) => ApprovedByState,
            (StudentAction::RejectByState, Submitted | VerifiedByInstitute) => RejectedByState,
            (StudentAction::ForwardToMinistry, ApprovedByState) => ForwardedToMinistry,
            // state may approve and forward in one step without the
            // institute having verified first
            (StudentAction::ApproveAndForward, Submitted | VerifiedByInstitute) => ForwardedToMinistry,
            (StudentAction::ApproveByMinistry, Submitted | VerifiedByInstitute | ForwardedToMinistry) => Approved,
            (StudentAction::RejectByMinistry, Submitted | VerifiedByInstitute | ForwardedToMinistry) => RejectedByMinistry,
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

/// A scholarship application. The descriptive fields (personal, academic,
/// bank, document paths) are opaque payload; only `status`, the timestamps,
/// `admin_notes` and `version` take part in the workflow.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudentApplication {
    pub id: i32,
    pub email: String,
    pub student_name: String,
    pub scheme_name: Option<String>,
    pub status: StudentStatus,
    pub date_submitted: DateTime<Utc>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub mobile_number: Option<String>,
    pub aadhar_number: Option<String>,
    pub institute_name: Option<String>,
    pub institute_code: Option<String>,
    pub present_course: Option<String>,
    pub university_or_board_name: Option<String>,
    pub previous_class_percentage: Option<String>,
    pub admission_fee: Option<f64>,
    pub tuition_fee: Option<f64>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub family_annual_income: Option<f64>,
    pub bank_name: Option<String>,
    pub ifsc_code: Option<String>,
    pub bank_account: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub pincode: Option<String>,
    pub photo_path: Option<String>,
    pub aadhar_path: Option<String>,
    pub institute_id_card_path: Option<String>,
    pub previous_marksheet_path: Option<String>,
    pub fee_receipt_path: Option<String>,
    pub bank_passbook_path: Option<String>,
    pub admin_notes: Option<String>,
    pub approved_on: Option<DateTime<Utc>>,
    pub last_updated_on: Option<DateTime<Utc>>,
    pub version: i32,
}

/// Submission payload; id, status, timestamps and version are assigned by
/// the store.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentApplicationInsert {
    pub email: String,
    pub student_name: String,
    pub scheme_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub mobile_number: Option<String>,
    pub aadhar_number: Option<String>,
    pub institute_name: Option<String>,
    pub institute_code: Option<String>,
    pub present_course: Option<String>,
    pub university_or_board_name: Option<String>,
    pub previous_class_percentage: Option<String>,
    pub admission_fee: Option<f64>,
    pub tuition_fee: Option<f64>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub family_annual_income: Option<f64>,
    pub bank_name: Option<String>,
    pub ifsc_code: Option<String>,
    pub bank_account: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub pincode: Option<String>,
    pub photo_path: Option<String>,
    pub aadhar_path: Option<String>,
    pub institute_id_card_path: Option<String>,
    pub previous_marksheet_path: Option<String>,
    pub fee_receipt_path: Option<String>,
    pub bank_passbook_path: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_happy_path_edges() {
        assert_eq!(
            StudentAction::VerifyByInstitute.apply(StudentStatus::Submitted).unwrap(),
            StudentStatus::VerifiedByInstitute
        );
        assert_eq!(
            StudentAction::ApproveByState.apply(StudentStatus::VerifiedByInstitute).unwrap(),
            StudentStatus::ApprovedByState
        );
        assert_eq!(
            StudentAction::ForwardToMinistry.apply(StudentStatus::ApprovedByState).unwrap(),
            StudentStatus::ForwardedToMinistry
        );
        assert_eq!(
            StudentAction::ApproveByMinistry.apply(StudentStatus::ForwardedToMinistry).unwrap(),
            StudentStatus::Approved
        );
    }

    #[test]
    fn test_short_circuit_edges() {
        // ministry may decide before the institute or state have acted
        assert_eq!(
            StudentAction::ApproveByMinistry.apply(StudentStatus::Submitted).unwrap(),
            StudentStatus::Approved
        );
        assert_eq!(
            StudentAction::ApproveAndForward.apply(StudentStatus::Submitted).unwrap(),
            StudentStatus::ForwardedToMinistry
        );
    }

    #[test]
    fn test_forward_requires_state_approval() {
        assert!(matches!(
            StudentAction::ForwardToMinistry.apply(StudentStatus::Submitted),
            Err(Error::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_terminal_states_admit_no_action() {
        let terminals = [
            StudentStatus::Approved,
            StudentStatus::RejectedByInstitute,
            StudentStatus::RejectedByState,
            StudentStatus::RejectedByMinistry,
        ];
        let actions = [
            StudentAction::VerifyByInstitute,
            StudentAction::RejectByInstitute,
            StudentAction::ApproveByState,
            StudentAction::RejectByState,
            StudentAction::ForwardToMinistry,
            StudentAction::ApproveAndForward,
            StudentAction::ApproveByMinistry,
            StudentAction::RejectByMinistry,
        ];
        for from in terminals {
            assert!(from.is_terminal());
            for action in actions {
                assert!(
                    matches!(action.apply(from), Err(Error::InvalidTransition { .. })),
                    "{:?} must not leave terminal state {}",
                    action,
                    from
                );
            }
        }
    }
}
