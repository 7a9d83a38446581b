use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use revolt_result::{create_error, Result};
use serde::de::DeserializeOwned;

use crate::Headers;

/// A response whose body can only be read once
#[async_trait]
pub trait LiveResponse: Send {
    fn status(&self) -> u16;
    fn url(&self) -> &Url;
    fn headers(&self) -> Headers;

    /// Drain the body, consuming the response
    async fn bytes(self: Box<Self>) -> Result<Bytes>;
}

#[async_trait]
impl LiveResponse for reqwest::Response {
    fn status(&self) -> u16 {
        reqwest::Response::status(self).as_u16()
    }

    fn url(&self) -> &Url {
        reqwest::Response::url(self)
    }

    fn headers(&self) -> Headers {
        Headers::from(reqwest::Response::headers(self))
    }

    async fn bytes(self: Box<Self>) -> Result<Bytes> {
        reqwest::Response::bytes(*self).await.map_err(|err| {
            create_error!(BodyReadFailed {
                error: err.to_string()
            })
        })
    }
}

/// Fully read response that any number of readers can consume independently
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    status: u16,
    url: Url,
    headers: Headers,
    body: Bytes,
}

impl Snapshot {
    /// Read the body of `response` into memory, once
    pub async fn capture(response: Box<dyn LiveResponse>) -> Result<Snapshot> {
        let status = response.status();
        let url = response.url().clone();
        let headers = response.headers();
        let body = response.bytes().await?;

        Ok(Snapshot {
            status,
            url,
            headers,
            body,
        })
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Handle to the captured body, each call gets its own
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|err| {
            create_error!(BodyReadFailed {
                error: err.to_string()
            })
        })
    }
}
