mod client;
mod headers;
mod key;
mod request;
mod snapshot;
mod transport;

pub use client::{DeduplicateConfig, DeduplicatingClient};
pub use headers::Headers;
pub use key::request_key;
pub use request::Request;
pub use snapshot::{LiveResponse, Snapshot};
pub use transport::{ReqwestTransport, Transport};

pub use reqwest::{Method, Url};
