#![warn(missing_docs)]

//! # bubbletea-feed
//!
//! An infinite-scroll feed component for building terminal applications with
//! [bubbletea-rs](https://github.com/joshka/bubbletea-rs).
//!
//! ## Overview
//!
//! The crate centers on [`feed::Model`], a component that accumulates pages
//! of items from an async fetcher and decides when to ask for more: scrolling
//! near the end of the content triggers the next page, a refresh key
//! refetches the first one, and in-flight/cooldown guards keep duplicate
//! requests off the wire. It follows the Elm Architecture pattern used
//! throughout the bubbletea ecosystem — `update()` consumes messages and
//! returns commands, `view()` renders a string.
//!
//! ## Quick start
//!
//! ```rust
//! use bubbletea_feed::prelude::*;
//!
//! #[derive(Clone)]
//! struct Headline {
//!     id: u64,
//!     text: String,
//! }
//! # impl std::fmt::Display for Headline {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//! #         write!(f, "{}", self.text)
//! #     }
//! # }
//!
//! impl Item for Headline {
//!     fn key(&self) -> String {
//!         self.id.to_string()
//!     }
//! }
//!
//! let feed: Feed<Headline> = Feed::new(80, 24)
//!     .with_threshold(0.8)
//!     .with_fetcher(|page| async move {
//!         // Fetch `page` from your backend and map it into a Page.
//!         Ok(Page::new(Vec::new()).with_total(0))
//!     });
//! ```
//!
//! Wire the feed into a program by forwarding messages in your `update()`
//! and rendering `feed.view()`; return `feed.tick()` from `init()` so the
//! loading indicator animates while fetches are in flight.
//!
//! ## Components
//!
//! - [`feed`] — the paginated feed itself
//! - [`fetch`] — the data-source contract: [`fetch::Item`], [`fetch::Page`],
//!   error types
//! - [`scroll`] — the scroll geometry the feed renders through
//! - [`indicator`] — the animated loading indicator
//! - [`key`] — type-safe key bindings

pub mod feed;
pub mod fetch;
pub mod indicator;
pub mod key;
pub mod scroll;

pub use feed::{
    CooldownMsg, FeedKeyMap, FeedStyles, Model as Feed, PageFailedMsg, PageLoadedMsg,
    RefreshFailedMsg, RefreshedMsg,
};
pub use fetch::{FeedError, FetchError, Item, Page, PageFuture};
pub use indicator::Model as Indicator;
pub use key::{Binding, KeyMap};
pub use scroll::Surface;

/// Prelude module for convenient imports.
///
/// ```rust
/// use bubbletea_feed::prelude::*;
/// ```
pub mod prelude {
    pub use crate::feed::{FeedKeyMap, FeedStyles, Model as Feed};
    pub use crate::fetch::{FeedError, FetchError, Item, Page};
    pub use crate::indicator::Model as Indicator;
    pub use crate::key::{Binding, KeyMap};
    pub use crate::scroll::Surface;
}
