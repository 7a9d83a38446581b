use bytes::Bytes;
use reqwest::{Method, Url};
use revolt_result::{create_error, Result};

use crate::Headers;

/// Description of one outbound call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: Url,
    headers: Headers,
    body: Option<Bytes>,
}

impl Request {
    /// Create a new request, the URL may include a query string
    pub fn new(method: Method, url: &str) -> Result<Request> {
        let url = Url::parse(url).map_err(|_| {
            create_error!(InvalidUrl {
                url: url.to_string()
            })
        })?;

        Ok(Request {
            method,
            url,
            headers: Headers::new(),
            body: None,
        })
    }

    pub fn get(url: &str) -> Result<Request> {
        Request::new(Method::GET, url)
    }

    pub fn post(url: &str) -> Result<Request> {
        Request::new(Method::POST, url)
    }

    /// Append a header value
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn payload(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub(crate) fn into_parts(self) -> (Method, Url, Headers, Option<Bytes>) {
        (self.method, self.url, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use revolt_result::ErrorType;

    use super::Request;

    #[test]
    fn builds_request_with_query_and_headers() {
        let request = Request::get("http://api.test/users?id=1")
            .unwrap()
            .header("Accept", "application/json")
            .header("Accept", "text/plain");

        assert_eq!(request.url().query(), Some("id=1"));
        assert_eq!(
            request.headers().get_all("Accept"),
            ["application/json", "text/plain"]
        );
        assert!(request.payload().is_none());
    }

    #[test]
    fn rejects_relative_url() {
        let error = Request::get("/users").unwrap_err();
        assert!(matches!(error.error_type, ErrorType::InvalidUrl { ref url } if url == "/users"));
    }
}
