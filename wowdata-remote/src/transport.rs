use crate::error::{RemoteError, RemoteResult};
use std::time::Duration;
use tracing::debug;

/// Fetches raw response bodies.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, headers: &[(String, String)]) -> RemoteResult<Vec<u8>>;
}

/// Blocking HTTP transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> RemoteResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, headers: &[(String, String)]) -> RemoteResult<Vec<u8>> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request.send()?;
        let status = response.status();
        debug!(url, status = status.as_u16(), "remote response");
        if !status.is_success() {
            return Err(RemoteError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}
