//! # courier-core
//!
//! Send pipeline for SMS and MMS.
//!
//! This crate provides:
//! - Routing of each message to SMS or MMS
//! - SMS body preparation, split-on-send and segment hand-off
//! - MMS part building, payload encoding and gateway delivery
//! - Local storage of sent messages (`SQLite`)
//! - Reconciliation of asynchronous send and delivery signals
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use courier_core::{HttpDelivery, Message, Settings, SqliteStore, ThreadId, Transaction};
//!
//! let settings = Settings::load("courier.json")?;
//! let store = Arc::new(SqliteStore::new("messages.db").await?);
//! let tx = Transaction::new(settings, store, transport, Arc::new(HttpDelivery::new()?));
//!
//! let submission = tx.submit(&Message::new("Hello", ["+15551234567"]), ThreadId::None).await?;
//!
//! // Later, from the transport's callback:
//! tx.reconciler().on_transport_signal(&signal).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod classify;
pub mod config;
pub mod dispatch;
pub mod encode;
mod error;
pub mod message;
pub mod outcome;
pub mod parts;
pub mod store;
pub mod transaction;

pub use classify::{Classification, MmsReason, SendMode, classify};
pub use config::{MmscSettings, ProxyConfig, Settings, SignalActions};
pub use dispatch::{
    HttpDelivery, NetworkDelivery, ReceiptToken, Receipts, SegmentHandle, SmsTransport,
    TransportDispatcher,
};
pub use encode::{Encoded, EncodedPayload, Envelope, PayloadEncoder};
pub use error::{Error, Result};
pub use message::{ImageError, ImageSource, JpegBytes, Media, Message, ThreadId};
pub use outcome::{OutcomeReconciler, Transition, TransportSignal};
pub use parts::{BuiltParts, PartBuilder};
pub use store::{
    Folder, LogicalMessage, OutboxRecord, PersistenceChain, PersistenceStrategy, SendRecord,
    SendStatus, SqliteStore, StatusChange, Store, StoreLocation,
};
pub use transaction::{Recovery, Submission, Transaction};

pub use courier_pdu::{DroppedPart, FailurePolicy, Part};
pub use courier_sms::SendResult;
