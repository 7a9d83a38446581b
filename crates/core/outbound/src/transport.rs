use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    redirect, Client,
};
use revolt_result::{create_error, report_internal_error, Result};

use crate::{LiveResponse, Request};

/// Something that can perform the real network call
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn execute(&self, request: Request) -> Result<Box<dyn LiveResponse>>;
}

/// [`Transport`] backed by a shared `reqwest` client
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the `[client]` configuration section
    pub fn from_settings(settings: &revolt_config::Client) -> Result<Self> {
        let max_redirects = settings.max_redirects;
        let client = report_internal_error!(Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .redirect(redirect::Policy::custom(move |attempt| {
                if attempt.previous().len() > max_redirects {
                    attempt.error("too many redirects")
                } else {
                    attempt.follow()
                }
            }))
            .build())?;

        Ok(Self::new(client))
    }

    pub async fn from_config() -> Result<Self> {
        Self::from_settings(&revolt_config::config().await.client)
    }

    fn header_map(request: &Request) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();

        for (name, values) in request.headers().iter() {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                create_error!(InvalidHeader {
                    name: name.to_string()
                })
            })?;

            for value in values {
                let value = HeaderValue::from_str(value).map_err(|_| {
                    create_error!(InvalidHeader {
                        name: name.to_string()
                    })
                })?;

                map.append(header_name.clone(), value);
            }
        }

        Ok(map)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: Request) -> Result<Box<dyn LiveResponse>> {
        let headers = Self::header_map(&request)?;
        let (method, url, _, body) = request.into_parts();

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|err| {
            tracing::warn!("Outbound request failed: {err}");
            create_error!(RequestFailed {
                error: err.to_string()
            })
        })?;

        Ok(Box::new(response))
    }
}

#[cfg(test)]
mod tests {
    use revolt_result::ErrorType;

    use super::{ReqwestTransport, Transport};
    use crate::Request;

    fn settings() -> revolt_config::Client {
        revolt_config::Client {
            user_agent: "test".to_string(),
            timeout_secs: 1,
            connect_timeout_secs: 1,
            max_redirects: 2,
        }
    }

    #[test]
    fn header_names_are_validated() {
        let request = Request::get("http://api.test/users")
            .unwrap()
            .header("Bad Header", "x");

        let error = ReqwestTransport::header_map(&request).unwrap_err();
        assert!(matches!(
            error.error_type,
            ErrorType::InvalidHeader { ref name } if name == "Bad Header"
        ));
    }

    #[test]
    fn repeated_values_are_kept() {
        let request = Request::get("http://api.test/users")
            .unwrap()
            .header("Accept", "text/html")
            .header("Accept", "*/*");

        let map = ReqwestTransport::header_map(&request).unwrap();
        assert_eq!(map.get_all("accept").iter().count(), 2);
    }

    #[tokio::test]
    async fn connection_failure_is_a_request_failure() {
        let transport = ReqwestTransport::from_settings(&settings()).unwrap();
        let request = Request::get("http://127.0.0.1:9/unreachable").unwrap();

        let error = match transport.execute(request).await {
            Ok(_) => panic!("request to a closed port succeeded"),
            Err(error) => error,
        };
        assert!(matches!(error.error_type, ErrorType::RequestFailed { .. }));
    }
}
