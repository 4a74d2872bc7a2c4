//! Bounded/full dataset reconciliation.
//!
//! [`DatasetAggregator`] keeps two views of the remote catalog:
//!
//! - the **bounded view**: the first `bounded_limit` records, fetched eagerly
//!   over `bounded_pages` pages by [`DatasetAggregator::load_initial`];
//! - the **full view**: every record, fetched at most once per aggregator by
//!   [`DatasetAggregator::load_all`].
//!
//! The display view is derived from the active predicate and whichever view
//! is authoritative. It is recomputed on every state change and never edited
//! in place, except by [`DatasetAggregator::sort`] which reorders it.
//!
//! All methods take `&self`. State lives in a `RefCell` whose borrows never
//! span an `.await`, so overlapping calls on one executor are safe.

use std::cell::RefCell;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{ErrorCode, LoadError};
use crate::filter::{self, FilterOptions, Predicate};
use crate::model::{Record, RecordId};
use crate::observe::Observable;
use crate::sort::{SortDirection, SortField, SortKey, sort_records};
use crate::source::{FetchError, PageSource};
use crate::view::{EnrichedRecord, FavoriteLookup, Overlay, UNKNOWN_LOCATION, project};

pub const DEFAULT_BOUNDED_PAGES: u32 = 5;
pub const DEFAULT_BOUNDED_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Pages fetched by `load_initial`.
    pub bounded_pages: u32,
    /// Cap on the bounded view (K).
    pub bounded_limit: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            bounded_pages: DEFAULT_BOUNDED_PAGES,
            bounded_limit: DEFAULT_BOUNDED_LIMIT,
        }
    }
}

/// Externally visible loading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Idle,
    LoadingBounded,
    LoadingFull,
    Complete,
}

/// How a load request settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { records: usize },
    /// Nothing to do: already complete, already in flight, or not needed.
    Skipped,
    /// The load failed; see [`DatasetAggregator::error`].
    Failed,
}

/// Published after every settled state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Refresh {
    pub revision: u64,
    pub load_state: LoadState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Empty,
    Loading,
    Ready,
}

#[derive(Debug)]
struct DatasetState {
    bounded: Vec<Record>,
    bounded_phase: Phase,
    full: Vec<Record>,
    full_phase: Phase,
    display: Vec<Record>,
    predicate: Predicate,
    show_everything: bool,
    sort: Option<SortKey>,
    next_direction: SortDirection,
    overlay: Overlay,
    error: Option<LoadError>,
}

impl DatasetState {
    fn new() -> Self {
        Self {
            bounded: Vec::new(),
            bounded_phase: Phase::Empty,
            full: Vec::new(),
            full_phase: Phase::Empty,
            display: Vec::new(),
            predicate: Predicate::all(),
            show_everything: false,
            sort: None,
            next_direction: SortDirection::Asc,
            overlay: Overlay::default(),
            error: None,
        }
    }

    fn authoritative(&self) -> &[Record] {
        if self.full_phase == Phase::Ready {
            &self.full
        } else {
            &self.bounded
        }
    }

    fn recompute(&mut self, limit: usize) {
        let mut display = if !self.predicate.is_noop() {
            filter::apply(self.authoritative(), &self.predicate)
        } else if self.show_everything {
            self.authoritative().to_vec()
        } else {
            self.bounded[..self.bounded.len().min(limit)].to_vec()
        };
        if let Some(key) = self.sort {
            sort_records(&mut display, key);
        }
        self.display = display;
    }

    fn load_state(&self) -> LoadState {
        if self.bounded_phase == Phase::Loading {
            LoadState::LoadingBounded
        } else if self.full_phase == Phase::Loading {
            LoadState::LoadingFull
        } else if self.full_phase == Phase::Ready {
            LoadState::Complete
        } else {
            LoadState::Idle
        }
    }

    fn find(&self, id: RecordId) -> Option<&Record> {
        self.display
            .iter()
            .chain(&self.bounded)
            .chain(&self.full)
            .find(|record| record.id == id)
    }
}

/// Reconciles the bounded and full views and derives the display view.
#[derive(Debug)]
pub struct DatasetAggregator<S> {
    source: S,
    config: AggregatorConfig,
    state: RefCell<DatasetState>,
    refresh: Observable<Refresh>,
}

impl<S: PageSource> DatasetAggregator<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, AggregatorConfig::default())
    }

    pub fn with_config(source: S, config: AggregatorConfig) -> Self {
        Self {
            source,
            config,
            state: RefCell::new(DatasetState::new()),
            refresh: Observable::new(Refresh {
                revision: 0,
                load_state: LoadState::Idle,
            }),
        }
    }

    #[must_use]
    pub const fn config(&self) -> AggregatorConfig {
        self.config
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Refresh signal for the presentation layer.
    #[must_use]
    pub const fn refresh(&self) -> &Observable<Refresh> {
        &self.refresh
    }

    fn publish(&self) {
        let load_state = self.state.borrow().load_state();
        let revision = self.refresh.borrow().revision + 1;
        self.refresh.set(Refresh {
            revision,
            load_state,
        });
    }

    /// Fetch `pages` together and concatenate them in page order.
    ///
    /// Every request settles before this returns. Any failed page fails the
    /// whole batch.
    async fn fetch_pages(&self, pages: impl Iterator<Item = u32>) -> Result<Vec<Record>, FetchError> {
        let requests = pages.map(|page| async move { (page, self.source.fetch_page(page).await) });
        let mut settled = join_all(requests).await;
        debug!(pages = settled.len(), "page fan-out settled");
        settled.sort_by_key(|(page, _)| *page);

        let mut records = Vec::new();
        let mut first_error = None;
        for (page, result) in settled {
            match result {
                Ok(fetched) => records.extend(fetched.records),
                Err(err) => {
                    warn!(page, error = %err, "page fetch failed");
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(records), Err)
    }

    /// Load the bounded view.
    ///
    /// All-or-nothing: on any page failure the previous bounded view is
    /// kept and the error slot is set. A completed full view is never
    /// discarded.
    #[instrument(skip_all)]
    pub async fn load_initial(&self) -> LoadOutcome {
        let previous = {
            let mut state = self.state.borrow_mut();
            if state.bounded_phase == Phase::Loading {
                return LoadOutcome::Skipped;
            }
            state.error = None;
            std::mem::replace(&mut state.bounded_phase, Phase::Loading)
        };
        self.publish();

        let result = self.fetch_pages(1..=self.config.bounded_pages).await;

        let outcome = {
            let mut state = self.state.borrow_mut();
            match result {
                Ok(mut records) => {
                    records.truncate(self.config.bounded_limit);
                    let count = records.len();
                    state.bounded = records;
                    state.bounded_phase = Phase::Ready;
                    state.recompute(self.config.bounded_limit);
                    info!(records = count, "bounded view loaded");
                    LoadOutcome::Loaded { records: count }
                }
                Err(err) => {
                    state.bounded_phase = previous;
                    state.error = Some(LoadError::new(err.code()));
                    warn!(error = %err, "bounded load failed");
                    LoadOutcome::Failed
                }
            }
        };
        self.publish();
        outcome
    }

    /// Load every page into the full view, once.
    ///
    /// Skipped while a full load is in flight or after one has completed.
    /// A failed load leaves the full view empty so a later call retries.
    #[instrument(skip_all)]
    pub async fn load_all(&self) -> LoadOutcome {
        {
            let mut state = self.state.borrow_mut();
            if state.full_phase != Phase::Empty {
                return LoadOutcome::Skipped;
            }
            state.full_phase = Phase::Loading;
            state.error = None;
        }
        self.publish();

        let result = match self.source.fetch_meta().await {
            Ok(meta) => {
                debug!(total_pages = meta.total_pages, "catalog metadata fetched");
                self.fetch_pages(1..=meta.total_pages)
                    .await
                    .map_err(|err| (err.code(), err))
            }
            Err(err) => {
                warn!(error = %err, "metadata fetch failed");
                let code = match err.code() {
                    ErrorCode::FetchFailed => ErrorCode::MetadataFetchFailed,
                    other => other,
                };
                Err((code, err))
            }
        };

        let outcome = {
            let mut state = self.state.borrow_mut();
            match result {
                Ok(records) => {
                    let count = records.len();
                    state.full = records;
                    state.full_phase = Phase::Ready;
                    state.recompute(self.config.bounded_limit);
                    info!(records = count, "full view loaded");
                    LoadOutcome::Loaded { records: count }
                }
                Err((code, err)) => {
                    state.full_phase = Phase::Empty;
                    state.error = Some(LoadError::new(code));
                    warn!(error = %err, "full load failed; retry allowed");
                    LoadOutcome::Failed
                }
            }
        };
        self.publish();
        outcome
    }

    /// Replace the predicate.
    ///
    /// The display view is recomputed at once from whatever is loaded. If the
    /// predicate is active and the full view is not complete, this then
    /// awaits [`DatasetAggregator::load_all`], whose completion recomputes
    /// the display view from the full view.
    pub async fn set_predicate(&self, predicate: Predicate) -> LoadOutcome {
        let needs_full = {
            let mut state = self.state.borrow_mut();
            state.predicate = predicate;
            state.show_everything = false;
            state.sort = None;
            state.recompute(self.config.bounded_limit);
            !state.predicate.is_noop() && state.full_phase != Phase::Ready
        };
        self.publish();

        if needs_full {
            self.load_all().await
        } else {
            LoadOutcome::Skipped
        }
    }

    /// Display every record without filters, loading the full view if
    /// needed. The bounded view is shown in the meantime.
    pub async fn show_all(&self) -> LoadOutcome {
        let needs_full = {
            let mut state = self.state.borrow_mut();
            state.predicate = Predicate::all();
            state.show_everything = true;
            state.sort = None;
            state.recompute(self.config.bounded_limit);
            state.full_phase != Phase::Ready
        };
        self.publish();

        if needs_full {
            self.load_all().await
        } else {
            LoadOutcome::Skipped
        }
    }

    /// Reset to the no-op predicate and the bounded window. The full view
    /// stays loaded.
    pub fn clear(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.predicate = Predicate::all();
            state.show_everything = false;
            state.sort = None;
            state.recompute(self.config.bounded_limit);
        }
        self.publish();
    }

    /// Order the display view by `field`.
    ///
    /// Direction alternates on every call regardless of field, starting with
    /// ascending. Returns the direction applied.
    pub fn sort(&self, field: SortField) -> SortDirection {
        let direction = {
            let mut state = self.state.borrow_mut();
            let direction = state.next_direction;
            state.next_direction = direction.flipped();
            let key = SortKey { field, direction };
            state.sort = Some(key);
            sort_records(&mut state.display, key);
            direction
        };
        self.publish();
        direction
    }

    /// Flag a record's image as loaded. Presentation-only.
    pub fn mark_image_loaded(&self, id: RecordId) {
        let changed = self.state.borrow_mut().overlay.mark_image_loaded(id);
        if changed {
            self.publish();
        }
    }

    /// Display name for a record's location, fetching the record when the
    /// loaded copy has none. Falls back to `"Unknown"`.
    pub async fn resolve_location(&self, id: RecordId) -> String {
        let known = {
            let state = self.state.borrow();
            state.overlay.location_name(id).map(str::to_string).or_else(|| {
                state
                    .find(id)
                    .map(crate::view::display_location)
                    .filter(|name| *name != UNKNOWN_LOCATION)
                    .map(str::to_string)
            })
        };
        if let Some(name) = known {
            return name;
        }

        let name = match self.source.fetch_record(id).await {
            Ok(record) => crate::view::display_location(&record).to_string(),
            Err(err) => {
                warn!(%id, error = %err, "location lookup failed");
                UNKNOWN_LOCATION.to_string()
            }
        };
        self.state
            .borrow_mut()
            .overlay
            .set_location_name(id, name.clone());
        self.publish();
        name
    }

    /// Snapshot of the display view.
    #[must_use]
    pub fn display(&self) -> Vec<Record> {
        self.state.borrow().display.clone()
    }

    /// The display view projected through favorites and the overlay.
    #[must_use]
    pub fn display_projected(&self, favorites: &impl FavoriteLookup) -> Vec<EnrichedRecord> {
        let state = self.state.borrow();
        state
            .display
            .iter()
            .map(|record| project(record, &state.overlay, favorites))
            .collect()
    }

    #[must_use]
    pub fn bounded(&self) -> Vec<Record> {
        self.state.borrow().bounded.clone()
    }

    #[must_use]
    pub fn predicate(&self) -> Predicate {
        self.state.borrow().predicate.clone()
    }

    #[must_use]
    pub fn sort_key(&self) -> Option<SortKey> {
        self.state.borrow().sort
    }

    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.state.borrow().load_state()
    }

    /// The last load failure, cleared when the next load starts.
    #[must_use]
    pub fn error(&self) -> Option<LoadError> {
        self.state.borrow().error.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().bounded_phase == Phase::Loading
    }

    #[must_use]
    pub fn is_loading_all(&self) -> bool {
        self.state.borrow().full_phase == Phase::Loading
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.borrow().full_phase == Phase::Ready
    }

    /// Full view length once complete, bounded view length before.
    #[must_use]
    pub fn total_loaded(&self) -> usize {
        self.state.borrow().authoritative().len()
    }

    #[must_use]
    pub fn displayed_count(&self) -> usize {
        self.state.borrow().display.len()
    }

    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        !self.state.borrow().predicate.is_noop()
    }

    /// Filter choices drawn from the bounded view.
    #[must_use]
    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions::from_records(&self.state.borrow().bounded)
    }
}
