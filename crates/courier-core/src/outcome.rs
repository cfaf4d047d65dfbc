//! Send outcome reconciliation.
//!
//! The transport reports every send attempt later, through a signal carrying
//! the receipt token's action, the platform result code and the record it is
//! about. [`OutcomeReconciler`] maps those signals onto record status changes:
//!
//! | signal | result | record |
//! |---|---|---|
//! | sent | ok | `Queued` → `Sent`, sent folder |
//! | sent | generic failure | `Queued` or `Sent` → `Failed`, failed folder |
//! | sent | no service, null PDU, radio off | stays `Queued` in the outbox, code recorded |
//! | delivered | ok | `Sent` → `Delivered` |
//! | delivered | anything else | unchanged |
//!
//! Every change is conditional on the status it starts from, so a late or
//! duplicate signal never moves a record backwards. A failure reported for
//! any segment of a multipart send fails the record even after an earlier
//! segment reported success; a delivered record is never failed.

use std::sync::Arc;

use courier_sms::SendResult;

use crate::Result;
use crate::config::SignalActions;
use crate::dispatch::ReceiptToken;
use crate::store::{Folder, SendStatus, StatusChange, Store, StoreLocation};

/// Asynchronous result of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSignal {
    /// Action from the receipt token.
    pub action: String,
    /// Raw platform result code.
    pub result_code: i32,
    /// Record the signal is about.
    pub record: StoreLocation,
    /// Extra platform error code, if the transport supplied one.
    pub error_code: Option<i32>,
}

impl TransportSignal {
    /// Creates a signal for the record named by `token`.
    #[must_use]
    pub fn from_token(token: &ReceiptToken, result_code: i32) -> Self {
        Self {
            action: token.action.clone(),
            result_code,
            record: token.record,
            error_code: None,
        }
    }

    /// Sets the platform error code.
    #[must_use]
    pub const fn with_error_code(mut self, code: i32) -> Self {
        self.error_code = Some(code);
        self
    }
}

/// What a signal did to its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The record changed status or folder.
    Applied(StatusChange),
    /// The record was not in the status the change starts from.
    Stale(StatusChange),
    /// The signal does not change anything.
    Ignored,
}

impl Transition {
    /// Returns true if the record was updated.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Applies transport signals to stored records.
#[derive(Clone)]
pub struct OutcomeReconciler {
    store: Arc<dyn Store>,
    actions: SignalActions,
}

impl OutcomeReconciler {
    /// Creates a reconciler answering to `actions`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, actions: SignalActions) -> Self {
        Self { store, actions }
    }

    /// Handles one signal.
    ///
    /// Unknown actions and result codes are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store update fails.
    pub async fn on_transport_signal(&self, signal: &TransportSignal) -> Result<Transition> {
        let Some(result) = SendResult::from_platform_code(signal.result_code) else {
            tracing::warn!(
                record = %signal.record,
                code = signal.result_code,
                "Ignoring unknown transport result code"
            );
            return Ok(Transition::Ignored);
        };

        let change = if signal.action == self.actions.sent {
            Some(sent_change(result, signal))
        } else if signal.action == self.actions.delivered {
            delivered_change(result)
        } else {
            tracing::warn!(
                record = %signal.record,
                action = %signal.action,
                "Ignoring signal with unknown action"
            );
            return Ok(Transition::Ignored);
        };

        let Some(change) = change else {
            tracing::debug!(record = %signal.record, %result, "Delivery not confirmed");
            return Ok(Transition::Ignored);
        };

        if result.is_transient() {
            tracing::warn!(
                record = %signal.record,
                %result,
                "Transient send failure, leaving message queued"
            );
        }

        if self.store.move_to_folder(signal.record, &change).await? {
            tracing::debug!(
                record = %signal.record,
                from = %change.from,
                to = %change.to,
                folder = change.folder.as_str(),
                "Applied transport signal"
            );
            Ok(Transition::Applied(change))
        } else if let Some(late) = late_failure(&change)
            && self.store.move_to_folder(signal.record, &late).await?
        {
            tracing::warn!(
                record = %signal.record,
                code = ?late.error_code,
                "Segment failed after an earlier segment was sent"
            );
            Ok(Transition::Applied(late))
        } else {
            tracing::debug!(
                record = %signal.record,
                expected = %change.from,
                "Record not in expected status, signal dropped"
            );
            Ok(Transition::Stale(change))
        }
    }
}

impl std::fmt::Debug for OutcomeReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeReconciler")
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

fn sent_change(result: SendResult, signal: &TransportSignal) -> StatusChange {
    let error_code = signal
        .error_code
        .or_else(|| (!result.is_success()).then_some(signal.result_code));
    let (to, folder) = match result {
        SendResult::Ok => (SendStatus::Sent, Folder::Sent),
        SendResult::GenericFailure => (SendStatus::Failed, Folder::Failed),
        SendResult::NoService | SendResult::NullPdu | SendResult::RadioOff => {
            (SendStatus::Queued, Folder::Outbox)
        }
    };
    StatusChange {
        from: SendStatus::Queued,
        to,
        folder,
        error_code,
    }
}

/// Failure of a later segment once the record already shows as sent.
fn late_failure(change: &StatusChange) -> Option<StatusChange> {
    (change.from == SendStatus::Queued && change.to == SendStatus::Failed).then_some(
        StatusChange {
            from: SendStatus::Sent,
            ..*change
        },
    )
}

fn delivered_change(result: SendResult) -> Option<StatusChange> {
    result.is_success().then_some(StatusChange {
        from: SendStatus::Sent,
        to: SendStatus::Delivered,
        folder: Folder::Sent,
        error_code: None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{OutboxRecord, SqliteStore};
    use chrono::Utc;

    async fn queued() -> (Arc<SqliteStore>, StoreLocation) {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let thread_id = store.resolve_thread_id(&["5551234".into()]).await.unwrap();
        let location = store
            .insert_outbox_record(&OutboxRecord {
                address: "5551234".into(),
                body: "Hello".into(),
                thread_id,
                timestamp: Utc::now(),
            })
            .await
            .unwrap();
        (store, location)
    }

    fn signal(action: &str, result: SendResult, record: StoreLocation) -> TransportSignal {
        TransportSignal::from_token(&ReceiptToken::new(action, record), result.platform_code())
    }

    #[tokio::test]
    async fn test_success_moves_to_sent() {
        let (store, location) = queued().await;
        let actions = SignalActions::default();
        let reconciler = OutcomeReconciler::new(store.clone(), actions.clone());

        let transition = reconciler
            .on_transport_signal(&signal(&actions.sent, SendResult::Ok, location))
            .await
            .unwrap();
        assert!(transition.is_applied());

        let record = store.record(location).await.unwrap().unwrap();
        assert_eq!(record.status, SendStatus::Sent);
        assert_eq!(record.folder, Folder::Sent);
    }

    #[tokio::test]
    async fn test_no_service_stays_queued() {
        let (store, location) = queued().await;
        let actions = SignalActions::default();
        let reconciler = OutcomeReconciler::new(store.clone(), actions.clone());

        reconciler
            .on_transport_signal(&signal(&actions.sent, SendResult::NoService, location))
            .await
            .unwrap();

        let record = store.record(location).await.unwrap().unwrap();
        assert_eq!(record.status, SendStatus::Queued);
        assert_eq!(record.folder, Folder::Outbox);
        assert_eq!(record.error_code, Some(SendResult::NoService.platform_code()));
    }

    #[tokio::test]
    async fn test_generic_failure_is_terminal() {
        let (store, location) = queued().await;
        let actions = SignalActions::default();
        let reconciler = OutcomeReconciler::new(store.clone(), actions.clone());

        let failure =
            signal(&actions.sent, SendResult::GenericFailure, location).with_error_code(38);
        reconciler.on_transport_signal(&failure).await.unwrap();
        let late = reconciler
            .on_transport_signal(&signal(&actions.sent, SendResult::Ok, location))
            .await
            .unwrap();
        assert!(matches!(late, Transition::Stale(_)));

        let record = store.record(location).await.unwrap().unwrap();
        assert_eq!(record.status, SendStatus::Failed);
        assert_eq!(record.folder, Folder::Failed);
        assert_eq!(record.error_code, Some(38));
    }

    #[tokio::test]
    async fn test_segment_failure_after_sent_fails_record() {
        let (store, location) = queued().await;
        let actions = SignalActions::default();
        let reconciler = OutcomeReconciler::new(store.clone(), actions.clone());

        reconciler
            .on_transport_signal(&signal(&actions.sent, SendResult::Ok, location))
            .await
            .unwrap();
        let failure = reconciler
            .on_transport_signal(&signal(&actions.sent, SendResult::GenericFailure, location))
            .await
            .unwrap();
        assert!(failure.is_applied());

        let record = store.record(location).await.unwrap().unwrap();
        assert_eq!(record.status, SendStatus::Failed);
        assert_eq!(record.folder, Folder::Failed);
        assert_eq!(
            record.error_code,
            Some(SendResult::GenericFailure.platform_code())
        );
    }

    #[tokio::test]
    async fn test_delivered_record_is_never_failed() {
        let (store, location) = queued().await;
        let actions = SignalActions::default();
        let reconciler = OutcomeReconciler::new(store.clone(), actions.clone());

        for action in [&actions.sent, &actions.delivered] {
            reconciler
                .on_transport_signal(&signal(action, SendResult::Ok, location))
                .await
                .unwrap();
        }
        let late = reconciler
            .on_transport_signal(&signal(&actions.sent, SendResult::GenericFailure, location))
            .await
            .unwrap();
        assert!(matches!(late, Transition::Stale(_)));

        let record = store.record(location).await.unwrap().unwrap();
        assert_eq!(record.status, SendStatus::Delivered);
        assert_eq!(record.folder, Folder::Sent);
    }

    #[tokio::test]
    async fn test_delivery_after_sent() {
        let (store, location) = queued().await;
        let actions = SignalActions::default();
        let reconciler = OutcomeReconciler::new(store.clone(), actions.clone());

        let early = reconciler
            .on_transport_signal(&signal(&actions.delivered, SendResult::Ok, location))
            .await
            .unwrap();
        assert!(matches!(early, Transition::Stale(_)));

        reconciler
            .on_transport_signal(&signal(&actions.sent, SendResult::Ok, location))
            .await
            .unwrap();
        let failed_report = reconciler
            .on_transport_signal(&signal(
                &actions.delivered,
                SendResult::GenericFailure,
                location,
            ))
            .await
            .unwrap();
        assert_eq!(failed_report, Transition::Ignored);
        assert_eq!(
            store.record(location).await.unwrap().unwrap().status,
            SendStatus::Sent
        );

        reconciler
            .on_transport_signal(&signal(&actions.delivered, SendResult::Ok, location))
            .await
            .unwrap();
        assert_eq!(
            store.record(location).await.unwrap().unwrap().status,
            SendStatus::Delivered
        );
    }

    #[tokio::test]
    async fn test_unknown_code_and_action_ignored() {
        let (store, location) = queued().await;
        let reconciler = OutcomeReconciler::new(store.clone(), SignalActions::default());

        let unknown_code = TransportSignal {
            action: SignalActions::default().sent,
            result_code: 99,
            record: location,
            error_code: None,
        };
        assert_eq!(
            reconciler.on_transport_signal(&unknown_code).await.unwrap(),
            Transition::Ignored
        );

        let foreign = signal("other.app.SENT", SendResult::Ok, location);
        assert_eq!(
            reconciler.on_transport_signal(&foreign).await.unwrap(),
            Transition::Ignored
        );
        assert_eq!(
            store.record(location).await.unwrap().unwrap().status,
            SendStatus::Queued
        );
    }
}
