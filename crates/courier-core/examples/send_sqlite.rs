//! Sends a message through the full pipeline into a `SQLite` store.
//!
//! The SMS transport here only logs what it is handed and remembers the
//! receipt tokens, then reports success for each of them the way a platform
//! callback would.
//!
//! ```text
//! cargo run -p courier-core --example send_sqlite -- messages.db "+15551234567" "Hello there"
//! COURIER_SETTINGS=courier.json cargo run -p courier-core --example send_sqlite -- ...
//! ```

use std::sync::{Arc, Mutex};

use anyhow::Context;
use courier_core::{
    HttpDelivery, Message, ReceiptToken, SendResult, Settings, SmsTransport, SqliteStore, Store,
    ThreadId, Transaction, TransportSignal,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Transport that logs segments and keeps their send receipts.
#[derive(Default)]
struct LoggingTransport {
    receipts: Mutex<Vec<ReceiptToken>>,
}

impl LoggingTransport {
    fn take_receipts(&self) -> Vec<ReceiptToken> {
        self.receipts
            .lock()
            .map(|mut r| std::mem::take(&mut *r))
            .unwrap_or_default()
    }

    fn keep(&self, token: Option<&ReceiptToken>) {
        if let (Some(token), Ok(mut receipts)) = (token, self.receipts.lock()) {
            if !receipts.contains(token) {
                receipts.push(token.clone());
            }
        }
    }
}

impl SmsTransport for LoggingTransport {
    fn send_multipart(
        &self,
        address: &str,
        parts: &[String],
        sent: &[Option<ReceiptToken>],
        _delivered: &[Option<ReceiptToken>],
    ) -> courier_core::Result<()> {
        for (i, part) in parts.iter().enumerate() {
            info!(address, part = i + 1, of = parts.len(), text = %part, "SMS segment");
        }
        self.keep(sent.iter().flatten().next());
        Ok(())
    }

    fn send_single(
        &self,
        address: &str,
        part: &str,
        sent: Option<&ReceiptToken>,
        _delivered: Option<&ReceiptToken>,
    ) -> courier_core::Result<()> {
        info!(address, text = %part, "SMS");
        self.keep(sent);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier_core=debug,courier_sms=debug,send_sqlite=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let db = args.next().unwrap_or_else(|| "courier.db".to_string());
    let address = args.next().unwrap_or_else(|| "+15551234567".to_string());
    let text = args.next().unwrap_or_else(|| "Hello from courier".to_string());

    let settings = match std::env::var("COURIER_SETTINGS") {
        Ok(path) => Settings::load(&path).with_context(|| format!("loading {path}"))?,
        Err(_) => Settings::default(),
    };

    let store = Arc::new(SqliteStore::new(&db).await?);
    let transport = Arc::new(LoggingTransport::default());
    let tx = Transaction::new(
        settings,
        store.clone(),
        transport.clone(),
        Arc::new(HttpDelivery::new()?),
    );

    let submission = tx
        .submit(&Message::new(text, [address]), ThreadId::None)
        .await?;
    info!(mode = ?submission.mode, records = submission.locations.len(), "Submitted");
    for recovery in &submission.recoveries {
        info!(%recovery, "Recovered");
    }

    let reconciler = tx.reconciler();
    for token in transport.take_receipts() {
        let signal = TransportSignal::from_token(&token, SendResult::Ok.platform_code());
        reconciler.on_transport_signal(&signal).await?;
    }

    for location in &submission.locations {
        if let Some(record) = store.record(*location).await? {
            info!(
                record = %location,
                status = %record.status,
                folder = record.folder.as_str(),
                body = %record.body,
                "Stored"
            );
        }
    }

    Ok(())
}
