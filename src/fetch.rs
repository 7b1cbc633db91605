//! Collaborator interfaces between a feed and its data source.
//!
//! A feed does not know where its items come from. The host supplies an async
//! page fetcher returning [`Page`] values; the feed drives it through
//! bubbletea-rs commands and treats every failure as a transient
//! [`FetchError`], wrapped at the component boundary into a [`FeedError`]
//! naming the flow that failed.

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Trait for items that can be displayed in a feed.
///
/// `key()` must return a stable identity derived from the item's own
/// identifier (a database id, a URL, a hash). The feed uses it to keep the
/// selection on the same record when the sequence is replaced by a refresh;
/// it must not change between fetches of the same record.
///
/// # Examples
///
/// ```rust
/// use bubbletea_feed::fetch::Item;
///
/// #[derive(Clone)]
/// struct Post {
///     id: u64,
///     title: String,
/// }
///
/// impl std::fmt::Display for Post {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "{}", self.title)
///     }
/// }
///
/// impl Item for Post {
///     fn key(&self) -> String {
///         self.id.to_string()
///     }
/// }
/// ```
pub trait Item: Display + Clone + Send + 'static {
    /// Stable identity key for this item.
    fn key(&self) -> String;
}

/// One fetched page of items.
///
/// `total` is the server-reported number of items across all pages, when the
/// backend provides one. The feed uses it as a fallback exhaustion signal
/// when no `has_more` predicate is configured.
#[derive(Debug, Clone)]
pub struct Page<I> {
    /// The items on this page, in server order.
    pub items: Vec<I>,
    /// Total item count across all pages, if the backend reports one.
    pub total: Option<usize>,
}

impl<I> Page<I> {
    /// Creates a page with no total.
    pub fn new(items: Vec<I>) -> Self {
        Self { items, total: None }
    }

    /// Sets the server-reported total item count.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }
}

/// A transient page-fetch failure.
///
/// The feed does not distinguish network errors from decode errors or
/// anything else; every failure is retriable by the next trigger.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct FetchError(String);

impl FetchError {
    /// Creates a fetch error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A fetch failure tagged with the feed flow it interrupted.
///
/// Both kinds are caught at the feed boundary, logged, and swallowed; they
/// never propagate to the host.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The load-more flow failed while fetching `page`.
    #[error("loading page {page} failed: {source}")]
    LoadMore {
        /// The page that was being fetched.
        page: usize,
        /// The underlying fetch failure.
        source: FetchError,
    },
    /// The refresh flow failed while refetching `page`.
    #[error("refreshing page {page} failed: {source}")]
    Refresh {
        /// The page that was being refetched.
        page: usize,
        /// The underlying fetch failure.
        source: FetchError,
    },
}

/// The boxed future a page fetcher resolves to.
pub type PageFuture<I> = Pin<Box<dyn Future<Output = Result<Page<I>, FetchError>> + Send>>;
