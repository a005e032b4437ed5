//! Seam to the external credential document engine.
//!
//! Issuance, storage, and presentation of verifiable credentials are owned
//! by the wallet-core protocol library; this crate orchestrates it (wallet
//! deletion, PID lookup) through this interface only. Long-running
//! operations report progress as an event stream over a channel.

use tokio::sync::mpsc::Receiver;

/// A stored credential document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Engine-assigned document identifier.
    pub id: String,
    /// Document type, e.g. `eu.europa.ec.eudi.pid.1`.
    pub doc_type: String,
}

/// Progress events for a document issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    /// Issuance finished; the listed documents were stored.
    Success {
        /// Identifiers of the issued documents.
        document_ids: Vec<String>,
    },
    /// Issuance failed.
    Failure {
        /// Engine-provided reason.
        message: String,
    },
    /// The engine needs the user to authenticate before continuing.
    UserAuthRequired,
}

/// Progress events for a document collection deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// All documents were deleted.
    Success,
    /// Deletion failed.
    Failure {
        /// Engine-provided reason.
        message: String,
    },
}

/// Credential document engine operations consumed by this crate.
pub trait DocumentController: Send + Sync {
    /// Starts issuance for a credential offer URI, optionally with a
    /// transaction code, and returns the event stream.
    fn issue_documents_by_offer_uri(
        &self,
        offer_uri: &str,
        tx_code: Option<&str>,
    ) -> Receiver<IssueOutcome>;

    /// Returns all stored documents.
    fn get_all_documents(&self) -> Vec<Document>;

    /// Returns the primary PID document, if one is stored.
    fn get_main_pid_document(&self) -> Option<Document>;

    /// Deletes every stored document, anchored on the PID with `pid_id`,
    /// and returns the event stream.
    fn delete_all_documents(&self, pid_id: &str) -> Receiver<DeleteOutcome>;
}
