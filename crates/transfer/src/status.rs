use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TransferError;

/// Lifecycle of a file record's transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferStatus {
    /// Chunking and hashing in progress.
    Preparing,
    /// Content identifier known, waiting for the transfer to start.
    PendingTransfer,
    Transferring,
    Paused,
    Success,
    Error,
}

impl TransferStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: TransferStatus) -> bool {
        use TransferStatus::*;
        match (self, next) {
            (_, Error) => true,
            (Preparing, PendingTransfer) => true,
            (PendingTransfer, Transferring) => true,
            (Transferring, Paused | Success) => true,
            (Paused, Transferring) => true,
            // Retry after failure, or a fresh session after success.
            (Error | Success, Transferring) => true,
            // A failed preparation may be redone.
            (Error, Preparing) => true,
            _ => false,
        }
    }

    /// Returns `next` if the transition is legal.
    pub fn transition(self, next: TransferStatus) -> Result<TransferStatus, TransferError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransferError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// `true` for states that end a session.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferStatus::Success | TransferStatus::Error)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferStatus::Preparing => "preparing",
            TransferStatus::PendingTransfer => "pending transfer",
            TransferStatus::Transferring => "transferring",
            TransferStatus::Paused => "paused",
            TransferStatus::Success => "success",
            TransferStatus::Error => "error",
        };
        f.write_str(s)
    }
}
