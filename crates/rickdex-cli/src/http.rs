//! `PageSource` over the public character API.
//!
//! Each request runs a blocking `ureq` call on its own thread and hands the
//! result back through a oneshot channel. The returned future only waits on
//! the channel, so every request of a fan-out is in flight at once while the
//! aggregator stays on the executor's thread.

use std::future::Future;
use std::time::Duration;

use futures::channel::oneshot;
use rickdex_core::model::{Record, RecordId};
use rickdex_core::source::{FetchError, Page, PageMeta, PageSource};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Envelope {
    info: PageMeta,
}

#[derive(Debug, Clone)]
pub struct HttpPageSource {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpPageSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("rickdex/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn get_json<T>(&self, url: String) -> impl Future<Output = Result<T, FetchError>> + use<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let agent = self.agent.clone();
        std::thread::spawn(move || {
            // Receiver gone means nobody wants the answer.
            let _ = tx.send(fetch_json(&agent, &url));
        });
        async move { rx.await.unwrap_or(Err(FetchError::Canceled)) }
    }
}

fn fetch_json<T: DeserializeOwned>(agent: &ureq::Agent, url: &str) -> Result<T, FetchError> {
    debug!(url, "GET");
    let response = agent.get(url).call().map_err(|err| match err {
        ureq::Error::Status(status, _) => FetchError::Status {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(transport) => FetchError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    })?;

    response.into_json::<T>().map_err(|err| FetchError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })
}

impl PageSource for HttpPageSource {
    fn fetch_page(&self, page: u32) -> impl Future<Output = Result<Page, FetchError>> {
        self.get_json(format!("{}?page={page}", self.base_url))
    }

    fn fetch_meta(&self) -> impl Future<Output = Result<PageMeta, FetchError>> {
        let envelope = self.get_json::<Envelope>(self.base_url.clone());
        async move { envelope.await.map(|envelope| envelope.info) }
    }

    fn fetch_record(&self, id: RecordId) -> impl Future<Output = Result<Record, FetchError>> {
        self.get_json(format!("{}/{id}", self.base_url))
    }
}
