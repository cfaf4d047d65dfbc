//! Network delivery of MMS payloads.

use async_trait::async_trait;
use courier_pdu::MMS_MESSAGE;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::config::ProxyConfig;
use crate::{Error, Result};

/// Media types accepted back from the gateway.
const ACCEPT_TYPES: &str = "*/*, application/vnd.wap.mms-message, application/vnd.wap.sic";

/// Carrier network used to reach the MMS gateway.
#[async_trait]
pub trait NetworkDelivery: Send + Sync {
    /// Makes sure `host` is reachable before posting.
    ///
    /// # Errors
    ///
    /// Returns an error if no route to `host` can be established.
    async fn ensure_route(&self, host: &str) -> Result<()>;

    /// Posts a PDU and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure or a non-success status.
    async fn post(&self, url: &str, body: &[u8], proxy: Option<&ProxyConfig>) -> Result<Vec<u8>>;
}

/// HTTP delivery through `reqwest`.
///
/// Environment proxy variables are ignored; the gateway proxy comes from
/// [`MmscSettings`](crate::MmscSettings) only.
#[derive(Debug, Clone)]
pub struct HttpDelivery {
    client: Client,
}

impl HttpDelivery {
    /// Creates a delivery client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self> {
        let client = Client::builder().no_proxy().build()?;
        Ok(Self { client })
    }

    fn client_for(&self, proxy: Option<&ProxyConfig>) -> Result<Client> {
        match proxy {
            Some(proxy) => Ok(Client::builder()
                .proxy(reqwest::Proxy::all(proxy.url())?)
                .build()?),
            None => Ok(self.client.clone()),
        }
    }
}

#[async_trait]
impl NetworkDelivery for HttpDelivery {
    async fn ensure_route(&self, host: &str) -> Result<()> {
        let mut addrs = tokio::net::lookup_host((host, 80)).await?;
        if addrs.next().is_none() {
            return Err(Error::TransportUnavailable(format!(
                "{host} resolved to no addresses"
            )));
        }
        Ok(())
    }

    async fn post(&self, url: &str, body: &[u8], proxy: Option<&ProxyConfig>) -> Result<Vec<u8>> {
        let response = self
            .client_for(proxy)?
            .post(url)
            .header(CONTENT_TYPE, MMS_MESSAGE)
            .header(ACCEPT, ACCEPT_TYPES)
            .body(body.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Dispatch(format!(
                "MMSC returned HTTP {}",
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accepts one request, returns what was read, and answers with `status`.
    async fn serve_once(
        listener: TcpListener,
        status: &'static str,
        reply: &'static [u8],
    ) -> Vec<u8> {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if let Some(end) = find(&request, b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&request[..end]).to_lowercase();
                let length: usize = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .map_or(0, |v| v.trim().parse().unwrap());
                if request.len() >= end + 4 + length {
                    break;
                }
            }
        }

        let head = format!(
            "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            reply.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(reply).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[tokio::test]
    async fn test_ensure_route_localhost() {
        HttpDelivery::new().unwrap().ensure_route("localhost").await.unwrap();
    }

    #[tokio::test]
    async fn test_post_sends_pdu() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(listener, "200 OK", b"\x8c\x81"));

        let reply = HttpDelivery::new()
            .unwrap()
            .post(&format!("http://{addr}/mms"), &[0x8C, 0x80, 0x98], None)
            .await
            .unwrap();
        assert_eq!(reply, vec![0x8C, 0x81]);

        let request = server.await.unwrap();
        let text = String::from_utf8_lossy(&request).to_lowercase();
        assert!(text.starts_with("post /mms"));
        assert!(text.contains("content-type: application/vnd.wap.mms-message"));
        assert!(request.ends_with(&[0x8C, 0x80, 0x98]));
    }

    #[tokio::test]
    async fn test_post_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(listener, "503 Service Unavailable", b""));

        let err = HttpDelivery::new()
            .unwrap()
            .post(&format!("http://{addr}/mms"), &[0x8C], None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Dispatch(_)));
        server.await.unwrap();
    }
}
