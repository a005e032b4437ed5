//! Wallet teardown.
//!
//! Deleting a wallet instance spans three independently-failing stores: the
//! document database, the hardware keystore, and the preferences file. The
//! orchestrator attempts every step regardless of earlier failures (a key
//! that is already gone must not leave an encrypted database behind) and
//! always runs to completion, reporting per-step outcomes instead of
//! raising.

use std::sync::Arc;

use idwallet_store::{PreferencesStore, StorageHandle};
use tracing::{info, warn};

use crate::documents::{DeleteOutcome, DocumentController};
use crate::instance::SecureAreaRepository;

/// One step of the teardown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStep {
    /// Delete the stored document collection (requires the database open).
    DeleteDocuments,
    /// Close the document database handle.
    CloseDatabase,
    /// Delete the encrypted database file.
    DeleteDatabaseFile,
    /// Delete the hardware key.
    DeleteHardwareKey,
    /// Clear all local preferences.
    ClearPreferences,
    /// Reset the database handle for the next wallet.
    ResetDatabaseHandle,
}

/// Per-step outcomes of a completed teardown.
#[derive(Debug, Default)]
pub struct DeletionReport {
    steps: Vec<(DeletionStep, Option<String>)>,
}

impl DeletionReport {
    fn record(&mut self, step: DeletionStep, failure: Option<String>) {
        if let Some(reason) = &failure {
            warn!(?step, reason, "wallet deletion step failed");
        }
        self.steps.push((step, failure));
    }

    /// The executed steps with their failure reasons, in order.
    #[must_use]
    pub fn steps(&self) -> &[(DeletionStep, Option<String>)] {
        &self.steps
    }

    /// Whether every step succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.steps.iter().all(|(_, failure)| failure.is_none())
    }
}

/// Coordinates atomic wallet teardown across all stores.
pub struct WalletDeletionOrchestrator {
    documents: Arc<dyn DocumentController>,
    database: Arc<dyn StorageHandle>,
    repository: Arc<SecureAreaRepository>,
    prefs: Arc<dyn PreferencesStore>,
}

impl WalletDeletionOrchestrator {
    /// Wires the orchestrator over the four stores it tears down.
    pub fn new(
        documents: Arc<dyn DocumentController>,
        database: Arc<dyn StorageHandle>,
        repository: Arc<SecureAreaRepository>,
        prefs: Arc<dyn PreferencesStore>,
    ) -> Self {
        Self {
            documents,
            database,
            repository,
            prefs,
        }
    }

    /// Destroys the wallet instance. Always completes; consult the report
    /// for partial failures.
    pub async fn delete_wallet(&self) -> DeletionReport {
        let mut report = DeletionReport::default();

        // Documents go first: the engine may need its database still open.
        report.record(DeletionStep::DeleteDocuments, self.delete_documents().await);

        report.record(
            DeletionStep::CloseDatabase,
            self.database.close().err().map(|e| e.to_string()),
        );
        report.record(
            DeletionStep::DeleteDatabaseFile,
            self.database.delete_backing_file().err().map(|e| e.to_string()),
        );

        // Idempotent and self-absorbing; an absent key is fine.
        self.repository.delete_instance();
        report.record(DeletionStep::DeleteHardwareKey, None);

        report.record(
            DeletionStep::ClearPreferences,
            self.prefs.clear_all().err().map(|e| e.to_string()),
        );
        report.record(
            DeletionStep::ResetDatabaseHandle,
            self.database.reset().err().map(|e| e.to_string()),
        );

        info!(clean = report.is_clean(), "wallet deletion completed");
        report
    }

    async fn delete_documents(&self) -> Option<String> {
        let Some(pid) = self.documents.get_main_pid_document() else {
            return None;
        };
        let mut events = self.documents.delete_all_documents(&pid.id);
        let mut failure = None;
        while let Some(outcome) = events.recv().await {
            if let DeleteOutcome::Failure { message } = outcome {
                failure = Some(message);
            }
        }
        failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{Document, IssueOutcome};
    use crate::secure_area::{SecureArea, SoftwareSecureArea};
    use idwallet_store::{MemoryStore, StoreError};
    use tokio::sync::mpsc;

    struct FakeDocuments {
        pid: Option<Document>,
        fail_delete: bool,
    }

    impl DocumentController for FakeDocuments {
        fn issue_documents_by_offer_uri(
            &self,
            _offer_uri: &str,
            _tx_code: Option<&str>,
        ) -> mpsc::Receiver<IssueOutcome> {
            let (_tx, rx) = mpsc::channel(1);
            rx
        }

        fn get_all_documents(&self) -> Vec<Document> {
            self.pid.clone().into_iter().collect()
        }

        fn get_main_pid_document(&self) -> Option<Document> {
            self.pid.clone()
        }

        fn delete_all_documents(&self, _pid_id: &str) -> mpsc::Receiver<DeleteOutcome> {
            let (tx, rx) = mpsc::channel(1);
            let outcome = if self.fail_delete {
                DeleteOutcome::Failure {
                    message: "engine unavailable".to_owned(),
                }
            } else {
                DeleteOutcome::Success
            };
            tx.try_send(outcome).expect("channel has capacity");
            rx
        }
    }

    /// Storage handle whose close step always fails.
    struct BrokenDatabase;

    impl StorageHandle for BrokenDatabase {
        fn close(&self) -> idwallet_store::StoreResult<()> {
            Err(StoreError::Closed)
        }

        fn delete_backing_file(&self) -> idwallet_store::StoreResult<()> {
            Ok(())
        }

        fn reset(&self) -> idwallet_store::StoreResult<()> {
            Ok(())
        }
    }

    fn orchestrator(
        documents: FakeDocuments,
        database: Arc<dyn StorageHandle>,
    ) -> (Arc<SoftwareSecureArea>, Arc<MemoryStore>, WalletDeletionOrchestrator) {
        let area = Arc::new(SoftwareSecureArea::new());
        let prefs = Arc::new(MemoryStore::new());
        let repository = Arc::new(SecureAreaRepository::new(
            Arc::clone(&area) as Arc<dyn SecureArea>,
            Arc::clone(&prefs) as Arc<dyn PreferencesStore>,
        ));
        let orchestrator = WalletDeletionOrchestrator::new(
            Arc::new(documents),
            database,
            repository,
            Arc::clone(&prefs) as Arc<dyn PreferencesStore>,
        );
        (area, prefs, orchestrator)
    }

    #[tokio::test]
    async fn test_clean_deletion() {
        let documents = FakeDocuments {
            pid: Some(Document {
                id: "pid-1".to_owned(),
                doc_type: "eu.europa.ec.eudi.pid.1".to_owned(),
            }),
            fail_delete: false,
        };
        let (area, prefs, orchestrator) = orchestrator(documents, Arc::new(MemoryStore::new()));

        let repository = SecureAreaRepository::new(
            Arc::clone(&area) as Arc<dyn SecureArea>,
            Arc::clone(&prefs) as Arc<dyn PreferencesStore>,
        );
        repository.generate_key_with_attestation("dGVzdC1ub25jZQ").unwrap();
        assert_eq!(area.key_count(), 1);

        let report = orchestrator.delete_wallet().await;
        assert!(report.is_clean());
        assert_eq!(report.steps().len(), 6);
        assert_eq!(area.key_count(), 0);
        assert!(!prefs.contains("wallet_instance_key_alias").unwrap());
    }

    #[tokio::test]
    async fn test_partial_failures_do_not_block_remaining_steps() {
        let documents = FakeDocuments {
            pid: Some(Document {
                id: "pid-1".to_owned(),
                doc_type: "eu.europa.ec.eudi.pid.1".to_owned(),
            }),
            fail_delete: true,
        };
        let (_, prefs, orchestrator) = orchestrator(documents, Arc::new(BrokenDatabase));
        prefs.set_string("leftover", "x").unwrap();

        let report = orchestrator.delete_wallet().await;

        // Every step ran, the failures are recorded, nothing escaped.
        assert_eq!(report.steps().len(), 6);
        assert!(!report.is_clean());
        let failed: Vec<_> = report
            .steps()
            .iter()
            .filter(|(_, failure)| failure.is_some())
            .map(|(step, _)| *step)
            .collect();
        assert_eq!(
            failed,
            vec![DeletionStep::DeleteDocuments, DeletionStep::CloseDatabase]
        );
        // Preferences were still cleared after the earlier failures.
        assert!(!prefs.contains("leftover").unwrap());
    }

    #[tokio::test]
    async fn test_deletion_without_documents_or_key() {
        let documents = FakeDocuments {
            pid: None,
            fail_delete: false,
        };
        let (_, _, orchestrator) = orchestrator(documents, Arc::new(MemoryStore::new()));

        // Nothing exists; the sequence still completes cleanly, twice.
        assert!(orchestrator.delete_wallet().await.is_clean());
        assert!(orchestrator.delete_wallet().await.is_clean());
    }
}
