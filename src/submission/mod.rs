//! Submission of a finished draft
//!
//! - [`pipeline`] runs the entry guard, calls the transaction service and
//!   applies the outcome to the draft
//! - [`classifier`] maps service failures onto stable categories
//! - [`payload`] is the wire shape of a withdrawal request

pub mod classifier;
pub mod payload;
pub mod pipeline;

pub use classifier::{
    ClassifiedFailure, ErrorCategory, ErrorClassifier, FailureSignal, TransportCode,
};
pub use payload::{SubmitReceipt, TransactionKind, WithdrawPayload};
pub use pipeline::{
    BlockReason, Collaborators, PipelineState, SessionSettings, SubmitResult, WithdrawSession,
};

/// Terminal outcome of a submission that reached the transaction service
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Success(SubmitReceipt),
    Failure(ClassifiedFailure),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success(_))
    }
}
