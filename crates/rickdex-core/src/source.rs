//! The remote fetch capability consumed by the aggregator.
//!
//! Pages are 1-based. Futures returned by a [`PageSource`] are polled on a
//! single logical thread and need not be `Send`.

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

use crate::error::ErrorCode;
use crate::model::{Record, RecordId};

/// One page of records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(rename = "results")]
    pub records: Vec<Record>,
}

/// Paging metadata for the whole remote collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageMeta {
    #[serde(rename = "pages")]
    pub total_pages: u32,
    #[serde(rename = "count", default)]
    pub total_records: u32,
}

/// Network or HTTP failure on a page, metadata, or record call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("request was dropped before completing")]
    Canceled,
}

impl FetchError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Transport { .. } | Self::Canceled => ErrorCode::FetchFailed,
            Self::Status { status: 404, .. } => ErrorCode::RecordNotFound,
            Self::Status { .. } => ErrorCode::FetchFailed,
            Self::Decode { .. } => ErrorCode::DecodeFailed,
        }
    }
}

/// Source of catalog pages.
pub trait PageSource {
    /// Fetch page `page` (1-based).
    fn fetch_page(&self, page: u32) -> impl Future<Output = Result<Page, FetchError>>;

    /// Fetch paging metadata (total page count).
    fn fetch_meta(&self) -> impl Future<Output = Result<PageMeta, FetchError>>;

    /// Fetch a single record by id.
    fn fetch_record(&self, id: RecordId) -> impl Future<Output = Result<Record, FetchError>>;
}

impl<S: PageSource + ?Sized> PageSource for &S {
    fn fetch_page(&self, page: u32) -> impl Future<Output = Result<Page, FetchError>> {
        (**self).fetch_page(page)
    }

    fn fetch_meta(&self) -> impl Future<Output = Result<PageMeta, FetchError>> {
        (**self).fetch_meta()
    }

    fn fetch_record(&self, id: RecordId) -> impl Future<Output = Result<Record, FetchError>> {
        (**self).fetch_record(id)
    }
}
