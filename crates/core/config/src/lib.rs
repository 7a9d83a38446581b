use std::time::Duration;

use cached::proc_macro::cached;
use config::{Config, Environment, File, FileFormat};
use futures_locks::RwLock;
use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

static CONFIG_BUILDER: Lazy<RwLock<Config>> = Lazy::new(|| {
    RwLock::new({
        let mut builder = Config::builder().add_source(File::from_str(
            include_str!("../Outbound.toml"),
            FileFormat::Toml,
        ));

        if std::path::Path::new("Outbound.toml").exists() {
            builder = builder.add_source(File::new("Outbound.toml", FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("OUTBOUND")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build().unwrap()
    })
});

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Coalescing {
    pub deduplicate_methods: Vec<String>,
    pub exclude_headers: Vec<String>,
    pub min_window_ms: u64,
}

impl Coalescing {
    pub fn min_window(&self) -> Duration {
        Duration::from_millis(self.min_window_ms)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_redirects: usize,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub coalescing: Coalescing,
    pub client: Client,
}

/// Install the global tracing subscriber, honouring `RUST_LOG` (defaults to `info`)
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Another subscriber may already be installed (tests, embedding applications)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Configure logging and print the resolved configuration
#[macro_export]
macro_rules! configure {
    ($application: ident) => {
        $crate::setup_logging();
        ::tracing::info!("Starting {}", stringify!($application));
        $crate::init().await;
    };
}

pub async fn init() {
    tracing::debug!(":: Outbound Configuration ::\n{:?}", config().await);
}

pub async fn read() -> Config {
    CONFIG_BUILDER.read().await.clone()
}

#[cached(time = 30)]
pub async fn config() -> Settings {
    read().await.try_deserialize::<Settings>().unwrap()
}
