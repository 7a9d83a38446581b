use std::{collections::HashSet, sync::Arc, time::Duration};

use reqwest::Method;
use revolt_coalesced::{CoalescionService, CoalescionServiceConfig};
use revolt_result::{create_error, report_internal_error, Result};

use crate::{request_key, ReqwestTransport, Request, Snapshot, Transport};

/// Which requests get coalesced and how they are keyed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeduplicateConfig {
    /// Methods eligible for coalescing, everything else goes straight to the transport
    pub deduplicate_methods: HashSet<Method>,
    /// Header names left out of the request key (case-sensitive)
    pub exclude_headers: HashSet<String>,
    /// Minimum time a coalescing group stays open
    pub min_window: Duration,
}

impl Default for DeduplicateConfig {
    fn default() -> Self {
        Self {
            deduplicate_methods: HashSet::from([Method::GET]),
            exclude_headers: HashSet::new(),
            min_window: Duration::ZERO,
        }
    }
}

impl DeduplicateConfig {
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.deduplicate_methods = methods.into_iter().collect();
        self
    }

    pub fn with_excluded_headers<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.exclude_headers = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_min_window(mut self, min_window: Duration) -> Self {
        self.min_window = min_window;
        self
    }
}

impl TryFrom<&revolt_config::Coalescing> for DeduplicateConfig {
    type Error = revolt_result::Error;

    fn try_from(settings: &revolt_config::Coalescing) -> Result<Self> {
        let deduplicate_methods = settings
            .deduplicate_methods
            .iter()
            .map(|method| {
                Method::from_bytes(method.as_bytes()).map_err(|_| {
                    create_error!(InvalidMethod {
                        method: method.to_string()
                    })
                })
            })
            .collect::<Result<_>>()?;

        Ok(Self {
            deduplicate_methods,
            exclude_headers: settings.exclude_headers.iter().cloned().collect(),
            min_window: settings.min_window(),
        })
    }
}

/// Outbound client that shares one network call between identical concurrent requests
pub struct DeduplicatingClient<T> {
    transport: Arc<T>,
    config: Arc<DeduplicateConfig>,
    coalescion: CoalescionService<String, Result<Snapshot>>,
}

impl<T> Clone for DeduplicatingClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            config: self.config.clone(),
            coalescion: self.coalescion.clone(),
        }
    }
}

/// Perform the real call and read the whole response
async fn fetch<T: Transport + ?Sized>(transport: &T, request: Request) -> Result<Snapshot> {
    let response = transport.execute(request).await?;
    Snapshot::capture(response).await
}

impl<T: Transport> DeduplicatingClient<T> {
    pub fn new(transport: T, config: DeduplicateConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            coalescion: CoalescionService::from_config(CoalescionServiceConfig::with_min_window(
                config.min_window,
            )),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &DeduplicateConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Number of coalescing groups currently waiting on a call
    pub fn in_flight(&self) -> usize {
        self.coalescion.in_flight()
    }

    /// Send a request.
    ///
    /// Eligible requests that match one already in flight wait for that call
    /// instead of making their own, and receive the same response or error.
    pub async fn execute(&self, request: Request) -> Result<Snapshot> {
        if !self.config.deduplicate_methods.contains(request.method()) {
            return fetch(self.transport.as_ref(), request).await;
        }

        let key = request_key(&request, &self.config.exclude_headers);
        let transport = self.transport.clone();

        let shared = report_internal_error!(
            self.coalescion
                .execute(key, move || async move {
                    fetch(transport.as_ref(), request).await
                })
                .await
        )?;

        (*shared).clone()
    }
}

impl DeduplicatingClient<ReqwestTransport> {
    /// Build a client from the global configuration
    pub async fn from_config() -> Result<Self> {
        let settings = revolt_config::config().await;

        Ok(Self::new(
            ReqwestTransport::from_settings(&settings.client)?,
            DeduplicateConfig::try_from(&settings.coalescing)?,
        ))
    }
}
