//! Message submission.
//!
//! A [`Transaction`] routes each message to SMS or MMS, records it in the
//! store when asked to, and hands it to the transport. It returns as soon as
//! the hand-off is done; send and delivery outcomes arrive later through
//! [`OutcomeReconciler`](crate::OutcomeReconciler).

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use courier_pdu::{DroppedPart, SendConf};

use crate::classify::{SendMode, classify};
use crate::config::Settings;
use crate::dispatch::{
    NetworkDelivery, ReceiptToken, Receipts, SegmentHandle, SmsTransport, TransportDispatcher,
};
use crate::encode::{EncodedPayload, Envelope, PayloadEncoder};
use crate::message::{Message, ThreadId};
use crate::outcome::OutcomeReconciler;
use crate::parts::PartBuilder;
use crate::store::{
    Folder, LogicalMessage, OutboxRecord, PersistenceChain, SendStatus, StatusChange, Store,
    StoreLocation,
};
use crate::{Error, Result};

/// Problem the pipeline worked around without failing the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// A part was left out of the MMS.
    PartDropped(DroppedPart),
    /// A persistence strategy failed and a later one stored the message.
    PersistenceFallback {
        /// Strategy that failed.
        strategy: &'static str,
        /// Its error.
        reason: String,
    },
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartDropped(part) => write!(f, "dropped {part}"),
            Self::PersistenceFallback { strategy, reason } => {
                write!(f, "{strategy} persistence failed: {reason}")
            }
        }
    }
}

/// Result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Transport the message went out on.
    pub mode: SendMode,
    /// Stored records, one per SMS recipient or one for the MMS.
    pub locations: Vec<StoreLocation>,
    /// SMS segments handed to the transport.
    pub segments: Vec<SegmentHandle>,
    /// Gateway confirmation of an MMS.
    pub confirmation: Option<SendConf>,
    /// Problems worked around along the way.
    pub recoveries: Vec<Recovery>,
}

impl Submission {
    fn new(mode: SendMode) -> Self {
        Self {
            mode,
            locations: Vec::new(),
            segments: Vec::new(),
            confirmation: None,
            recoveries: Vec::new(),
        }
    }

    /// Number of parts left out of the MMS.
    #[must_use]
    pub fn dropped_parts(&self) -> usize {
        self.recoveries
            .iter()
            .filter(|r| matches!(r, Recovery::PartDropped(_)))
            .count()
    }
}

/// Sends messages with one set of settings.
pub struct Transaction {
    settings: Settings,
    store: Arc<dyn Store>,
    dispatcher: TransportDispatcher,
    persistence: PersistenceChain,
}

impl Transaction {
    /// Creates a transaction over the given collaborators.
    #[must_use]
    pub fn new(
        settings: Settings,
        store: Arc<dyn Store>,
        transport: Arc<dyn SmsTransport>,
        network: Arc<dyn NetworkDelivery>,
    ) -> Self {
        let dispatcher = TransportDispatcher::new(transport, network)
            .segments_individually(settings.send_segments_individually);
        Self {
            settings,
            store,
            dispatcher,
            persistence: PersistenceChain::default(),
        }
    }

    /// Replaces the MMS persistence strategies.
    #[must_use]
    pub fn with_persistence(mut self, persistence: PersistenceChain) -> Self {
        self.persistence = persistence;
        self
    }

    /// Settings in use.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reconciler for the signals this transaction's sends will produce.
    #[must_use]
    pub fn reconciler(&self) -> OutcomeReconciler {
        OutcomeReconciler::new(self.store.clone(), self.settings.signal_actions.clone())
    }

    /// Sends `message`.
    ///
    /// `thread` is used as-is for a single recipient; otherwise threads are
    /// resolved from the recipients.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecipients`] if no recipient is usable,
    /// [`Error::TransportUnavailable`] if an MMS cannot reach the gateway,
    /// [`Error::Dispatch`] if the hand-off fails, and store or encoding
    /// errors as they occur.
    pub async fn submit(&self, message: &Message, thread: ThreadId) -> Result<Submission> {
        if message.addresses.iter().all(|a| a.trim().is_empty()) {
            return Err(Error::InvalidRecipients);
        }

        match classify(message, &self.settings).mode() {
            SendMode::Sms => self.send_sms(message, thread).await,
            SendMode::Mms => self.send_mms(message).await,
        }
    }

    async fn send_sms(&self, message: &Message, thread: ThreadId) -> Result<Submission> {
        let mut submission = Submission::new(SendMode::Sms);
        let (body, stored_body) = self.prepare_body(&message.text);
        let chunks = self.split(&body)?;
        let addresses: Vec<&str> = message
            .addresses
            .iter()
            .map(String::as_str)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect();

        for address in addresses {
            let location = if message.save {
                let thread_id = match thread.usable_for(message.addresses.len()) {
                    Some(id) => id,
                    None => self.store.resolve_thread_id(&[address.to_string()]).await?,
                };
                let record = OutboxRecord {
                    address: address.to_string(),
                    body: stored_body.clone(),
                    thread_id,
                    timestamp: Utc::now(),
                };
                Some(self.store.insert_outbox_record(&record).await?)
            } else {
                None
            };

            let receipts = self.receipts(location);
            for chunk in &chunks {
                let parts = self.dispatcher.divide(chunk);
                match self.dispatcher.send_segments(address, &parts, &receipts) {
                    Ok(handles) => submission.segments.extend(handles),
                    Err(e) => {
                        if let Some(location) = location {
                            self.mark_failed(location).await;
                        }
                        return Err(e);
                    }
                }
            }

            submission.locations.extend(location);
        }

        tracing::info!(
            recipients = message.addresses.len(),
            segments = submission.segments.len(),
            "Queued SMS"
        );
        Ok(submission)
    }

    /// Returns the body to send and the body to store.
    fn prepare_body(&self, text: &str) -> (String, String) {
        let mut stored = text.to_string();
        if let Some(signature) = self.settings.signature() {
            stored.push('\n');
            stored.push_str(signature);
        }
        if self.settings.strip_unicode {
            stored = courier_sms::strip_accents(&stored);
        }

        let body = match self.settings.pre_text() {
            Some(pre_text) => format!("{pre_text} {stored}"),
            None => stored.clone(),
        };
        (body, stored)
    }

    /// Splits the body into separately sent messages, or keeps it whole.
    fn split(&self, body: &str) -> Result<Vec<String>> {
        if !self.settings.split || body.is_empty() {
            return Ok(vec![body.to_string()]);
        }

        let plan = courier_sms::plan_split(body, self.settings.split_counter);
        let chunks = courier_sms::segment(body, plan.chunk_size, plan.counter)?;
        tracing::debug!(
            chunk_size = plan.chunk_size,
            counter = plan.counter,
            chunks = chunks.len(),
            "Split SMS body"
        );
        Ok(chunks)
    }

    fn receipts(&self, location: Option<StoreLocation>) -> Receipts {
        let Some(location) = location else {
            return Receipts::none();
        };
        let actions = &self.settings.signal_actions;
        Receipts {
            sent: Some(ReceiptToken::new(actions.sent.as_str(), location)),
            delivered: self
                .settings
                .delivery_reports
                .then(|| ReceiptToken::new(actions.delivered.as_str(), location)),
        }
    }

    async fn send_mms(&self, message: &Message) -> Result<Submission> {
        let mut submission = Submission::new(SendMode::Mms);
        let policy = self.settings.failure_policy;

        let built = PartBuilder::new(policy).build(message)?;
        let now = Utc::now();
        let envelope = Envelope::new(&message.addresses, now.timestamp_millis())
            .subject(message.subject.as_deref())
            .sender(self.settings.own_number())
            .delivery_report(self.settings.delivery_reports);
        let encoded = PayloadEncoder::new(policy).encode(&envelope, &built.parts)?;

        submission.recoveries.extend(
            built
                .dropped
                .into_iter()
                .chain(encoded.dropped.iter().cloned())
                .map(Recovery::PartDropped),
        );

        let store_location = if message.save {
            let manifest = encoded
                .request
                .body
                .parts()
                .first()
                .filter(|p| p.is_smil())
                .map(|p| String::from_utf8_lossy(&p.data).into_owned());
            let logical = LogicalMessage {
                recipients: message.addresses.clone(),
                subject: message.subject.clone(),
                parts: built
                    .parts
                    .into_iter()
                    .filter(|p| !encoded.dropped.iter().any(|d| d.name == p.name))
                    .collect(),
                manifest,
                transaction_id: envelope.transaction_id.clone(),
                timestamp: now,
                group: self.settings.group && message.addresses.len() > 1,
            };

            let persisted = self.persistence.persist(self.store.as_ref(), &logical).await?;
            submission
                .recoveries
                .extend(persisted.fallbacks.into_iter().map(|f| Recovery::PersistenceFallback {
                    strategy: f.strategy,
                    reason: f.reason,
                }));
            submission.locations.push(persisted.location);
            Some(persisted.location)
        } else {
            None
        };

        let payload = EncodedPayload {
            bytes: encoded.bytes,
            store_location,
        };

        match self
            .dispatcher
            .deliver(&payload, self.settings.mmsc.as_ref())
            .await
        {
            Ok(confirmation) => {
                if let Some(location) = payload.store_location {
                    self.mark_sent(location).await;
                }
                submission.confirmation = confirmation;
                Ok(submission)
            }
            Err(e) => {
                if let Some(location) = payload.store_location {
                    self.mark_failed(location).await;
                }
                Err(e)
            }
        }
    }

    /// Moves a delivered record to the sent folder, logging instead of failing.
    async fn mark_sent(&self, location: StoreLocation) {
        let change = StatusChange {
            from: SendStatus::Queued,
            to: SendStatus::Sent,
            folder: Folder::Sent,
            error_code: None,
        };
        if let Err(e) = self.store.move_to_folder(location, &change).await {
            tracing::warn!(record = %location, error = %e, "Failed to mark record as sent");
        }
    }

    /// Moves a queued record to the failed folder, logging instead of failing.
    async fn mark_failed(&self, location: StoreLocation) {
        let change = StatusChange {
            from: SendStatus::Queued,
            to: SendStatus::Failed,
            folder: Folder::Failed,
            error_code: None,
        };
        if let Err(e) = self.store.move_to_folder(location, &change).await {
            tracing::warn!(record = %location, error = %e, "Failed to mark record as failed");
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("settings", &self.settings)
            .field("dispatcher", &self.dispatcher)
            .field("persistence", &self.persistence)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{ProxyConfig, SignalActions};
    use crate::store::SqliteStore;
    use async_trait::async_trait;

    struct NoopTransport;

    impl SmsTransport for NoopTransport {
        fn send_multipart(
            &self,
            _: &str,
            _: &[String],
            _: &[Option<ReceiptToken>],
            _: &[Option<ReceiptToken>],
        ) -> Result<()> {
            Ok(())
        }

        fn send_single(
            &self,
            _: &str,
            _: &str,
            _: Option<&ReceiptToken>,
            _: Option<&ReceiptToken>,
        ) -> Result<()> {
            Ok(())
        }
    }

    struct NoNetwork;

    #[async_trait]
    impl NetworkDelivery for NoNetwork {
        async fn ensure_route(&self, host: &str) -> Result<()> {
            Err(Error::TransportUnavailable(host.to_string()))
        }

        async fn post(&self, _: &str, _: &[u8], _: Option<&ProxyConfig>) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    async fn transaction(settings: Settings) -> Transaction {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        Transaction::new(settings, store, Arc::new(NoopTransport), Arc::new(NoNetwork))
    }

    #[tokio::test]
    async fn test_prepare_body() {
        let settings = Settings {
            signature: "-- me".into(),
            pre_text: "[work]".into(),
            strip_unicode: true,
            ..Settings::default()
        };
        let tx = transaction(settings).await;

        let (body, stored) = tx.prepare_body("Café");
        assert_eq!(body, "[work] Cafe\n-- me");
        assert_eq!(stored, "Cafe\n-- me");
    }

    #[tokio::test]
    async fn test_signature_accents_are_stripped() {
        let settings = Settings {
            signature: "José".into(),
            strip_unicode: true,
            ..Settings::default()
        };
        let tx = transaction(settings).await;

        let (body, stored) = tx.prepare_body("Olá");
        assert_eq!(body, "Ola\nJose");
        assert_eq!(stored, body);
    }

    #[tokio::test]
    async fn test_split_keeps_short_body_whole() {
        let settings = Settings {
            split: true,
            split_counter: true,
            ..Settings::default()
        };
        let tx = transaction(settings).await;
        assert_eq!(tx.split("short").unwrap(), vec!["short".to_string()]);

        let chunks = tx.split(&"a".repeat(400)).unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].starts_with("(1/3) "));
    }

    #[tokio::test]
    async fn test_receipts_follow_settings() {
        let tx = transaction(Settings::default()).await;
        assert_eq!(tx.receipts(None), Receipts::none());

        let receipts = tx.receipts(Some(StoreLocation::sms(1)));
        assert!(receipts.sent.is_some());
        assert!(receipts.delivered.is_none());

        let tx = transaction(Settings {
            delivery_reports: true,
            ..Settings::default()
        })
        .await;
        let receipts = tx.receipts(Some(StoreLocation::sms(1)));
        assert_eq!(
            receipts.delivered.unwrap().action,
            SignalActions::default().delivered
        );
    }

    #[tokio::test]
    async fn test_blank_recipients_rejected() {
        let tx = transaction(Settings::default()).await;
        let err = tx
            .submit(&Message::new("Hi", ["  "]), ThreadId::None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRecipients));
    }
}
