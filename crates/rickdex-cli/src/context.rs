//! Per-invocation wiring: config, output mode, storage and the core engine.

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use rickdex_core::aggregator::{AggregatorConfig, DatasetAggregator};
use rickdex_core::config::{EffectiveConfig, resolve_config};
use rickdex_core::error::ErrorCode;
use rickdex_core::favorites::FavoritesStore;
use rickdex_core::kv::SqliteStore;
use rickdex_core::observe::Subscription;
use rickdex_core::session::{Identity, Session};

use crate::http::HttpPageSource;
use crate::output::OutputMode;

pub type Store = Rc<SqliteStore>;

pub struct Context {
    pub config: EffectiveConfig,
    pub output: OutputMode,
}

/// The current identity plus its favorites, kept in sync by a subscription.
pub struct Profile {
    pub session: Session<Store>,
    pub favorites: Rc<FavoritesStore<Store>>,
    _follow: Subscription,
}

impl Profile {
    /// The logged-in identity, or [`ErrorCode::NotAuthenticated`].
    pub fn require_identity(&self) -> Result<Identity> {
        self.session
            .current()
            .ok_or_else(|| ErrorCode::NotAuthenticated.into())
    }
}

impl Context {
    pub fn new(cli_json: bool) -> Result<Self> {
        let config = resolve_config(cli_json)?;
        let output = OutputMode::from_resolved(&config.resolved_output);
        Ok(Self { config, output })
    }

    pub fn source(&self) -> HttpPageSource {
        let api = &self.config.browser.api;
        HttpPageSource::new(api.base_url.clone(), Duration::from_secs(api.timeout_secs))
    }

    pub fn aggregator(&self) -> DatasetAggregator<HttpPageSource> {
        DatasetAggregator::with_config(
            self.source(),
            AggregatorConfig::from(&self.config.browser.dataset),
        )
    }

    pub fn store(&self) -> Result<Store> {
        let path = &self.config.store_path;
        let store = SqliteStore::open(path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        Ok(Rc::new(store))
    }

    /// Restore the session and load its favorites.
    pub fn profile(&self) -> Result<Profile> {
        let kv = self.store()?;
        let session = Session::restore(Rc::clone(&kv));
        let favorites = Rc::new(FavoritesStore::new(kv));
        let follow = favorites.follow(session.identities());
        Ok(Profile {
            session,
            favorites,
            _follow: follow,
        })
    }
}
