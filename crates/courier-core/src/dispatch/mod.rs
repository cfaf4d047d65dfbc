//! Hand-off of encoded messages to the transport and network collaborators.

mod network;
mod transport;

use std::sync::Arc;

use courier_pdu::SendConf;

pub use network::{HttpDelivery, NetworkDelivery};
pub use transport::{ReceiptToken, Receipts, SegmentHandle, SmsTransport};

use crate::config::MmscSettings;
use crate::encode::EncodedPayload;
use crate::{Error, Result};

/// Sends SMS segments and MMS payloads.
#[derive(Clone)]
pub struct TransportDispatcher {
    transport: Arc<dyn SmsTransport>,
    network: Arc<dyn NetworkDelivery>,
    individually: bool,
}

impl TransportDispatcher {
    /// Creates a dispatcher over the given collaborators.
    #[must_use]
    pub fn new(transport: Arc<dyn SmsTransport>, network: Arc<dyn NetworkDelivery>) -> Self {
        Self {
            transport,
            network,
            individually: false,
        }
    }

    /// Submit SMS segments one at a time instead of as one multi-part request.
    ///
    /// Individually submitted segments can arrive out of order or partly.
    #[must_use]
    pub const fn segments_individually(mut self, flag: bool) -> Self {
        self.individually = flag;
        self
    }

    /// Divides a body with the transport's own division rules.
    #[must_use]
    pub fn divide(&self, text: &str) -> Vec<String> {
        self.transport.divide_message(text)
    }

    /// Hands `segments` for `address` to the transport.
    ///
    /// Every segment carries the same receipt tokens. Returns one handle per
    /// segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dispatch`] if the transport refuses a request.
    pub fn send_segments(
        &self,
        address: &str,
        segments: &[String],
        receipts: &Receipts,
    ) -> Result<Vec<SegmentHandle>> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }

        if self.individually {
            for segment in segments {
                self.transport
                    .send_single(
                        address,
                        segment,
                        receipts.sent.as_ref(),
                        receipts.delivered.as_ref(),
                    )
                    .map_err(into_dispatch)?;
            }
        } else {
            let sent = vec![receipts.sent.clone(); segments.len()];
            let delivered = vec![receipts.delivered.clone(); segments.len()];
            self.transport
                .send_multipart(address, segments, &sent, &delivered)
                .map_err(into_dispatch)?;
        }

        tracing::debug!(
            address,
            segments = segments.len(),
            individually = self.individually,
            "Handed segments to transport"
        );

        let record = receipts
            .sent
            .as_ref()
            .or(receipts.delivered.as_ref())
            .map(|token| token.record);
        Ok((0..segments.len())
            .map(|index| SegmentHandle {
                address: address.to_string(),
                index,
                record,
            })
            .collect())
    }

    /// Posts an MMS payload to the gateway.
    ///
    /// Returns the parsed m-send-conf, or `None` if the gateway answered
    /// with an empty body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportUnavailable`] if no gateway is configured or
    /// no route to it exists, and [`Error::Dispatch`] if the post fails or
    /// the gateway rejects the message.
    pub async fn deliver(
        &self,
        payload: &EncodedPayload,
        mmsc: Option<&MmscSettings>,
    ) -> Result<Option<SendConf>> {
        let mmsc =
            mmsc.ok_or_else(|| Error::TransportUnavailable("No MMSC configured".into()))?;
        let host = mmsc
            .route_host()
            .map_err(|e| Error::TransportUnavailable(e.to_string()))?;

        self.network
            .ensure_route(&host)
            .await
            .map_err(|e| Error::TransportUnavailable(format!("No route to {host}: {e}")))?;

        let response = self
            .network
            .post(&mmsc.url, &payload.bytes, mmsc.proxy.as_ref())
            .await
            .map_err(into_dispatch)?;

        if response.is_empty() {
            tracing::warn!(url = %mmsc.url, "MMSC returned an empty response");
            return Ok(None);
        }

        let conf = SendConf::parse(&response)
            .map_err(|e| Error::Dispatch(format!("Unreadable m-send-conf: {e}")))?;
        if !conf.status.is_ok() {
            return Err(Error::Dispatch(format!(
                "MMSC rejected message: {}{}",
                conf.status,
                conf.response_text
                    .as_deref()
                    .map(|text| format!(" ({text})"))
                    .unwrap_or_default()
            )));
        }

        tracing::info!(
            url = %mmsc.url,
            bytes = payload.bytes.len(),
            message_id = conf.message_id.as_deref().unwrap_or_default(),
            "Delivered MMS"
        );
        Ok(Some(conf))
    }
}

impl std::fmt::Debug for TransportDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportDispatcher")
            .field("individually", &self.individually)
            .finish_non_exhaustive()
    }
}

fn into_dispatch(e: Error) -> Error {
    match e {
        Error::Dispatch(_) => e,
        other => Error::Dispatch(other.to_string()),
    }
}
