//! Per-form configuration for [`crate::SubmissionMachine`]: which fields are
//! required and what a successful submission does.

use shared::{
    error::{FieldError, FieldKey, FieldProblem, ValidationError},
    protocol::{Notice, Route},
};

use crate::draft::{ContactDraft, Draft, LoginDraft, ProfileDraft, UploadDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPolicy {
    /// One-shot forms: a success resets the draft to empty.
    ClearDraft,
    /// View/edit forms: a success makes the draft the committed value.
    CommitDraft,
}

#[derive(Debug, Clone)]
pub struct SuccessEffect {
    pub notice: Notice,
    pub navigate: Option<Route>,
    pub commit: CommitPolicy,
}

pub type ExtraCheck<D> = fn(&D) -> Vec<FieldError>;

#[derive(Debug, Clone)]
pub struct FormDescriptor<D> {
    pub name: &'static str,
    pub required_fields: &'static [FieldKey],
    pub extra_check: Option<ExtraCheck<D>>,
    pub on_success: SuccessEffect,
    pub failure_title: &'static str,
}

impl<D: Draft> FormDescriptor<D> {
    pub fn validate(&self, draft: &D) -> Result<(), ValidationError> {
        let mut fields: Vec<FieldError> = self
            .required_fields
            .iter()
            .filter(|key| !draft.is_filled(key))
            .map(|&field| FieldError {
                field,
                problem: FieldProblem::Missing,
            })
            .collect();

        if let Some(check) = self.extra_check {
            for err in check(draft) {
                if !fields.iter().any(|f| f.field == err.field) {
                    fields.push(err);
                }
            }
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { fields })
        }
    }

    pub fn commit_policy(&self) -> CommitPolicy {
        self.on_success.commit
    }
}

pub fn login() -> FormDescriptor<LoginDraft> {
    FormDescriptor {
        name: "login",
        required_fields: &["email", "password"],
        extra_check: None,
        on_success: SuccessEffect {
            notice: Notice::success("Login Successful", "Welcome back to RadAssist!"),
            navigate: Some(Route::Dashboard),
            commit: CommitPolicy::ClearDraft,
        },
        failure_title: "Login Failed",
    }
}

pub fn contact() -> FormDescriptor<ContactDraft> {
    FormDescriptor {
        name: "contact",
        required_fields: &["first_name", "last_name", "email", "subject", "message"],
        extra_check: None,
        on_success: SuccessEffect {
            notice: Notice::success(
                "Message Sent Successfully",
                "Thank you for your inquiry. We'll get back to you within 24 hours.",
            ),
            navigate: None,
            commit: CommitPolicy::ClearDraft,
        },
        failure_title: "Message Not Sent",
    }
}

pub fn upload() -> FormDescriptor<UploadDraft> {
    FormDescriptor {
        name: "upload",
        required_fields: &["scan_file", "patient_name", "patient_id"],
        extra_check: Some(check_scan_file),
        on_success: SuccessEffect {
            notice: Notice::success(
                "Upload Successful",
                "Scan uploaded successfully. AI analysis in progress...",
            ),
            navigate: None,
            commit: CommitPolicy::ClearDraft,
        },
        failure_title: "Upload Failed",
    }
}

fn check_scan_file(draft: &UploadDraft) -> Vec<FieldError> {
    if draft.is_filled("scan_file") && !draft.has_accepted_extension() {
        vec![FieldError {
            field: "scan_file",
            problem: FieldProblem::UnsupportedFormat,
        }]
    } else {
        Vec::new()
    }
}

pub fn profile() -> FormDescriptor<ProfileDraft> {
    FormDescriptor {
        name: "profile",
        required_fields: &["first_name", "last_name", "email"],
        extra_check: None,
        on_success: SuccessEffect {
            notice: Notice::success(
                "Profile Updated",
                "Your profile has been successfully updated.",
            ),
            navigate: None,
            commit: CommitPolicy::CommitDraft,
        },
        failure_title: "Profile Not Saved",
    }
}
