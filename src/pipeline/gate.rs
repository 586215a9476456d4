//! Trust gate
//!
//! Every run ends in exactly one [`Decision`]. Only a verified signature
//! proceeds silently; everything else aborts unless the operator opted into
//! insecure mode, in which case it proceeds with a warning that says why.

use crate::helpers::acquire::VerificationOutcome;

/// Operator-chosen policy. Immutable for the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policy {
    /// Do not download or check the signature at all.
    pub skip_verify: bool,
    /// Continue, loudly, when verification did not succeed.
    pub allow_insecure: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    ProceedWithWarning { warning: String },
    Abort { reason: String },
}

impl Decision {
    /// Process exit code for this decision. Aborting is the only failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Decision::Proceed | Decision::ProceedWithWarning { .. } => 0,
            Decision::Abort { .. } => 1,
        }
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, Decision::Abort { .. })
    }

    /// Short label used on the final outcome line.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Proceed => "verified",
            Decision::ProceedWithWarning { .. } => "accepted-unverified",
            Decision::Abort { .. } => "rejected",
        }
    }
}

/// Decide whether to trust the tarball.
///
/// `outcome` is `None` when verification was skipped. Without
/// `skip_verify`, a missing outcome is treated as a failure.
pub fn decide(policy: Policy, outcome: Option<&VerificationOutcome>) -> Decision {
    let problem = match (policy.skip_verify, outcome) {
        (true, _) => {
            return Decision::ProceedWithWarning {
                warning: "signature verification was skipped (--skip-verify); \
                          the tarball is UNVERIFIED and could have been tampered with"
                    .to_string(),
            };
        }
        (false, Some(VerificationOutcome::Verified { .. })) => return Decision::Proceed,
        (false, None) => "no verification outcome was recorded".to_string(),
        (false, Some(VerificationOutcome::SignatureMissing)) => {
            "the signature could not be downloaded from any mirror".to_string()
        }
        (false, Some(VerificationOutcome::KeysUnimportable)) => {
            "the trusted signing keys could not be imported from any keyserver".to_string()
        }
        (false, Some(VerificationOutcome::VerificationFailed { reason })) => format!(
            "signature verification FAILED ({}); the tarball could have been tampered with",
            reason
        ),
    };

    if policy.allow_insecure {
        Decision::ProceedWithWarning {
            warning: format!("{}; continuing because --allow-insecure was given", problem),
        }
    } else {
        Decision::Abort {
            reason: format!("{} (pass --allow-insecure to continue anyway)", problem),
        }
    }
}
