//! Infinite-scroll feed component.
//!
//! `feed::Model` owns a paginated item sequence and everything needed to grow
//! it: the page cursor, the exhaustion flag, in-flight markers for load-more
//! and refresh, and the scroll-trigger cooldown. Pages are pulled through a
//! caller-supplied async fetcher; the feed never fetches on its own schedule,
//! only in response to scrolling near the end of the content or an explicit
//! refresh.
//!
//! The component follows the usual contract: feed messages go through
//! [`Model::update`], the visible window is rendered by [`Model::view`], and
//! asynchronous work is returned as commands for the runtime to execute.
//!
//! # Behavior
//!
//! - Scrolling past the configured threshold of the content triggers a
//!   load-more, at most once per 2-second cooldown window.
//! - At most one load-more is in flight at a time; an exhausted feed
//!   (`has_more` false) stops triggering entirely.
//! - A failed page fetch is logged and swallowed: the page cursor is not
//!   advanced, so the next trigger retries the same page.
//! - Refresh refetches the first page and replaces the sequence with the
//!   result, keeping the selection on the same item when it is still present.
//!
//! # Examples
//!
//! ```rust
//! use bubbletea_feed::feed::Model;
//! use bubbletea_feed::fetch::{Item, Page};
//!
//! #[derive(Clone)]
//! struct Post {
//!     id: u64,
//!     title: String,
//! }
//! # impl std::fmt::Display for Post {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//! #         write!(f, "{}", self.title)
//! #     }
//! # }
//!
//! impl Item for Post {
//!     fn key(&self) -> String {
//!         self.id.to_string()
//!     }
//! }
//!
//! let feed: Model<Post> = Model::new(80, 24)
//!     .with_fetcher(|page| async move {
//!         // Call your API here; `page` starts at the configured initial page.
//!         Ok(Page::new(Vec::new()).with_total(0))
//!     })
//!     .with_has_more(|count| count < 100);
//!
//! assert_eq!(feed.page(), 1);
//! assert!(feed.has_more());
//! ```

use crate::fetch::{FeedError, Item, PageFuture};
use crate::indicator;
use crate::key::{self, KeyMap as KeyMapTrait};
use crate::scroll::Surface;
use bubbletea_rs::{tick as bubbletea_tick, Cmd, KeyMsg, Msg};
use crossterm::event::KeyCode;
use lipgloss_extras::prelude::*;
use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Scroll fraction past which a load-more is triggered, unless overridden
/// with [`Model::with_threshold`].
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// First page requested unless overridden with [`Model::with_initial_page`].
pub const DEFAULT_INITIAL_PAGE: usize = 1;

/// How long the scroll trigger stays suppressed after a triggered load
/// completes. Fixed; unrelated to scroll velocity or distance.
pub const LOAD_COOLDOWN: Duration = Duration::from_secs(2);

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

type Fetcher<I> = Arc<dyn Fn(usize) -> PageFuture<I> + Send + Sync>;
type HasMorePredicate = Arc<dyn Fn(usize) -> bool + Send + Sync>;

/// A load-more fetch resolved with a page of items.
pub struct PageLoadedMsg<I> {
    /// Identifier of the feed this page belongs to.
    pub id: i64,
    /// The page that was fetched.
    pub page: usize,
    /// The fetched items, in server order.
    pub items: Vec<I>,
    /// Server-reported total item count, if any.
    pub total: Option<usize>,
}

/// A load-more fetch rejected.
#[derive(Debug)]
pub struct PageFailedMsg {
    /// Identifier of the feed the fetch belonged to.
    pub id: i64,
    /// The page that failed to load.
    pub page: usize,
    /// What went wrong. Logged by the feed, never propagated.
    pub error: FeedError,
}

/// A refresh fetch resolved with a fresh first page.
pub struct RefreshedMsg<I> {
    /// Identifier of the feed this refresh belongs to.
    pub id: i64,
    /// The fresh items replacing the sequence.
    pub items: Vec<I>,
    /// Server-reported total item count, if any.
    pub total: Option<usize>,
}

/// A refresh fetch rejected.
#[derive(Debug)]
pub struct RefreshFailedMsg {
    /// Identifier of the feed the refresh belonged to.
    pub id: i64,
    /// What went wrong. Logged by the feed, never propagated.
    pub error: FeedError,
}

/// Releases the scroll-trigger guard once the cooldown window has elapsed.
#[derive(Debug, Clone)]
pub struct CooldownMsg {
    /// Identifier of the feed the cooldown belongs to.
    pub id: i64,
    tag: i64,
}

/// Key bindings for feed navigation and data actions.
#[derive(Debug, Clone)]
pub struct FeedKeyMap {
    /// Move the selection up one item. Default: `↑`, `k`.
    pub cursor_up: key::Binding,
    /// Move the selection down one item. Default: `↓`, `j`.
    pub cursor_down: key::Binding,
    /// Move the selection up one window. Default: `PgUp`, `b`.
    pub page_up: key::Binding,
    /// Move the selection down one window. Default: `PgDn`, `f`.
    pub page_down: key::Binding,
    /// Jump back to the top of the feed. Default: `g`, `Home`.
    pub go_to_top: key::Binding,
    /// Refetch the first page. Default: `r`. Disabled while a refresh is in
    /// flight.
    pub refresh: key::Binding,
}

impl Default for FeedKeyMap {
    fn default() -> Self {
        Self {
            cursor_up: key::Binding::new(vec![KeyCode::Up, KeyCode::Char('k')])
                .with_help("↑/k", "up"),
            cursor_down: key::Binding::new(vec![KeyCode::Down, KeyCode::Char('j')])
                .with_help("↓/j", "down"),
            page_up: key::Binding::new(vec![KeyCode::PageUp, KeyCode::Char('b')])
                .with_help("b/pgup", "page up"),
            page_down: key::Binding::new(vec![KeyCode::PageDown, KeyCode::Char('f')])
                .with_help("f/pgdn", "page down"),
            go_to_top: key::Binding::new(vec![KeyCode::Char('g'), KeyCode::Home])
                .with_help("g/home", "top"),
            refresh: key::Binding::new(vec![KeyCode::Char('r')]).with_help("r", "refresh"),
        }
    }
}

impl KeyMapTrait for FeedKeyMap {
    fn short_help(&self) -> Vec<&key::Binding> {
        vec![&self.cursor_up, &self.cursor_down, &self.refresh]
    }

    fn full_help(&self) -> Vec<Vec<&key::Binding>> {
        vec![
            vec![&self.cursor_up, &self.cursor_down],
            vec![&self.page_up, &self.page_down],
            vec![&self.go_to_top, &self.refresh],
        ]
    }
}

/// Styles for the feed's rows, status bar, and footer.
#[derive(Debug, Clone)]
pub struct FeedStyles {
    /// Style for unselected rows.
    pub item: Style,
    /// Style for the selected row.
    pub selected_item: Style,
    /// Style for the empty-feed placeholder.
    pub empty: Style,
    /// Style for the status bar (count and scroll position).
    pub status: Style,
    /// Style for the footer state line (loading, refreshing, end of feed).
    pub footer: Style,
    /// Style for the help line.
    pub help: Style,
}

impl Default for FeedStyles {
    fn default() -> Self {
        fn subdued() -> AdaptiveColor {
            AdaptiveColor {
                Light: "#A49FA5",
                Dark: "#777777",
            }
        }
        Self {
            item: Style::new().foreground(AdaptiveColor {
                Light: "#1a1a1a",
                Dark: "#dddddd",
            }),
            selected_item: Style::new().foreground(Color::from("#EE6FF8")).bold(true),
            empty: Style::new().foreground(subdued()),
            status: Style::new().foreground(subdued()),
            footer: Style::new().foreground(subdued()),
            help: Style::new().foreground(subdued()),
        }
    }
}

/// An infinite-scroll feed of items.
///
/// See the [module documentation](crate::feed) for behavior and an example.
pub struct Model<I: Item> {
    items: Vec<I>,
    page: usize,
    initial_page: usize,
    threshold: f64,
    has_more: bool,
    loading: bool,
    refreshing: bool,
    cooling: bool,
    seeded: bool,
    cursor: usize,
    last_total: Option<usize>,
    fetcher: Option<Fetcher<I>>,
    has_more_fn: Option<HasMorePredicate>,
    surface: Surface,
    indicator: indicator::Model,
    status_item_singular: Option<String>,
    status_item_plural: Option<String>,
    /// Key bindings. Replace or edit to rebind actions.
    pub keymap: FeedKeyMap,
    /// Rendering styles.
    pub styles: FeedStyles,
    id: i64,
    cooldown_tag: i64,
}

impl<I: Item> Model<I> {
    /// Creates an empty feed rendering into a window of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            items: Vec::new(),
            page: DEFAULT_INITIAL_PAGE,
            initial_page: DEFAULT_INITIAL_PAGE,
            threshold: DEFAULT_THRESHOLD,
            has_more: true,
            loading: false,
            refreshing: false,
            cooling: false,
            seeded: false,
            cursor: 0,
            last_total: None,
            fetcher: None,
            has_more_fn: None,
            surface: Surface::new(width, height),
            indicator: indicator::Model::new(),
            status_item_singular: None,
            status_item_plural: None,
            keymap: FeedKeyMap::default(),
            styles: FeedStyles::default(),
            id: next_id(),
            cooldown_tag: 0,
        }
    }

    /// Sets the first page number requested from the fetcher (default 1).
    pub fn with_initial_page(mut self, page: usize) -> Self {
        self.initial_page = page;
        self.page = page;
        self
    }

    /// Sets the scroll fraction past which a load-more is triggered.
    /// Values outside `0.0..=1.0` are clamped.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Seeds the feed with an initial batch of items. A non-empty batch
    /// consumes the one-shot seeding latch, so a later [`Model::seed`] call
    /// is a no-op.
    pub fn with_initial_items(mut self, items: Vec<I>) -> Self {
        if !items.is_empty() {
            self.items = items;
            self.seeded = true;
            self.sync_surface();
        }
        self
    }

    /// Sets the async page fetcher. Pages are requested by number, starting
    /// at the initial page; the fetcher must be safe to call again with the
    /// same page after a failure.
    pub fn with_fetcher<F, Fut>(mut self, fetcher: F) -> Self
    where
        F: Fn(usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<crate::fetch::Page<I>, crate::fetch::FetchError>>
            + Send
            + 'static,
    {
        self.fetcher = Some(Arc::new(move |page| {
            let fut: PageFuture<I> = Box::pin(fetcher(page));
            fut
        }));
        self
    }

    /// Sets the exhaustion predicate, called with the accumulated item count
    /// after every successful append. Without one, the feed falls back to
    /// comparing the count against the most recent server-reported total, and
    /// assumes more data exists when neither signal is available.
    pub fn with_has_more<F>(mut self, predicate: F) -> Self
    where
        F: Fn(usize) -> bool + Send + Sync + 'static,
    {
        self.has_more_fn = Some(Arc::new(predicate));
        self
    }

    /// Sets the rendering styles.
    pub fn with_styles(mut self, styles: FeedStyles) -> Self {
        self.styles = styles;
        self
    }

    /// Sets the noun used by the status bar (default "item" / "items").
    pub fn set_status_item_name(&mut self, singular: &str, plural: &str) {
        self.status_item_singular = Some(singular.to_string());
        self.status_item_plural = Some(plural.to_string());
    }

    /// Resizes the rendering window.
    pub fn set_size(&mut self, width: usize, height: usize) {
        self.surface.set_size(width, height);
    }

    /// The accumulated items, in load order.
    pub fn items(&self) -> &[I] {
        &self.items
    }

    /// Number of accumulated items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the feed holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The page the next load-more will request.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Whether more pages are believed to exist.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a load-more fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether a refresh fetch is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// Index of the selected row.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The selected item, if the feed is non-empty.
    pub fn selected_item(&self) -> Option<&I> {
        self.items.get(self.cursor)
    }

    /// The configured trigger threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// This feed's unique id, used for message routing.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// The scroll geometry the feed renders through.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Schedules the loading indicator's animation. Return this from the
    /// host's `init` to keep the footer animated.
    pub fn tick(&self) -> Cmd {
        self.indicator.tick()
    }

    fn eval_has_more(&self) -> bool {
        if let Some(predicate) = &self.has_more_fn {
            predicate(self.items.len())
        } else if let Some(total) = self.last_total {
            self.items.len() < total
        } else {
            // No predicate and no reported total: nothing proves exhaustion.
            true
        }
    }

    fn sync_surface(&mut self) {
        self.surface.set_content_len(self.items.len());
        if !self.items.is_empty() && self.cursor >= self.items.len() {
            self.cursor = self.items.len() - 1;
        }
        if self.items.is_empty() {
            self.cursor = 0;
        }
        self.surface.ensure_visible(self.cursor);
    }

    /// Appends items to the end of the sequence and recomputes `has_more`.
    ///
    /// This is the single mutation point for page data: load-more successes
    /// route through it, and hosts pushing externally-sourced items should
    /// call it too. Duplicates are kept; overlapping pages are the fetcher's
    /// concern.
    pub fn append_items(&mut self, new_items: Vec<I>) {
        self.items.extend(new_items);
        self.has_more = self.eval_has_more();
        self.sync_surface();
    }

    /// Adopts an initial batch of items exactly once.
    ///
    /// The first non-empty batch replaces the (empty) sequence and consumes
    /// the latch; every later call is a no-op. This mirrors hosts that
    /// receive their first page out of band and hand it to the feed when it
    /// arrives, without re-seeding on every upstream change.
    pub fn seed(&mut self, items: Vec<I>) {
        if self.seeded || items.is_empty() {
            return;
        }
        self.items = items;
        self.seeded = true;
        self.sync_surface();
    }

    /// Starts a load-more fetch for the current page.
    ///
    /// No-op when the feed is exhausted (the predicate is re-evaluated at
    /// entry), a load is already in flight, or no fetcher is configured. On
    /// success the items are appended and the page cursor advances by one;
    /// on failure the cursor is left alone so the same page is retried by
    /// the next trigger.
    pub fn load_more(&mut self) -> Option<Cmd> {
        self.has_more = self.eval_has_more();
        if !self.has_more || self.loading {
            return None;
        }
        let fetcher = self.fetcher.clone()?;
        self.loading = true;
        let id = self.id;
        let page = self.page;
        Some(Box::pin(async move {
            match fetcher(page).await {
                Ok(p) => Some(Box::new(PageLoadedMsg {
                    id,
                    page,
                    items: p.items,
                    total: p.total,
                }) as Msg),
                Err(source) => Some(Box::new(PageFailedMsg {
                    id,
                    page,
                    error: FeedError::LoadMore { page, source },
                }) as Msg),
            }
        }))
    }

    /// Reports a scroll position and triggers a load-more when warranted.
    ///
    /// `offset` is the index of the first visible row, `viewport_len` the
    /// window height, and `content_len` the total number of rows; the feed
    /// computes `(offset + viewport_len) / content_len` and triggers when the
    /// fraction exceeds the threshold, the feed is not exhausted, no load is
    /// in flight, and the trigger is not cooling down. The feed calls this
    /// itself after every scroll-moving key press; hosts driving their own
    /// scroll surface can call it directly.
    pub fn on_scroll(
        &mut self,
        offset: usize,
        viewport_len: usize,
        content_len: usize,
    ) -> Option<Cmd> {
        if !self.has_more || self.loading || content_len == 0 {
            return None;
        }
        let fraction = (offset + viewport_len) as f64 / content_len as f64;
        if fraction <= self.threshold || self.cooling {
            return None;
        }
        self.cooling = true;
        let cmd = self.load_more();
        if cmd.is_none() {
            // The load declined to start; nothing will complete and release
            // the guard, so it must not arm.
            self.cooling = false;
        }
        cmd
    }

    /// Starts a refresh: resets the page cursor to the initial page and
    /// refetches it. The fetched page replaces the item sequence. No-op when
    /// no fetcher is configured.
    pub fn refresh(&mut self) -> Option<Cmd> {
        let fetcher = self.fetcher.clone()?;
        self.refreshing = true;
        self.keymap.refresh.set_enabled(false);
        self.page = self.initial_page;
        let id = self.id;
        let page = self.initial_page;
        Some(Box::pin(async move {
            match fetcher(page).await {
                Ok(p) => Some(Box::new(RefreshedMsg {
                    id,
                    items: p.items,
                    total: p.total,
                }) as Msg),
                Err(source) => Some(Box::new(RefreshFailedMsg {
                    id,
                    error: FeedError::Refresh { page, source },
                }) as Msg),
            }
        }))
    }

    /// Discards all accumulated state: empty sequence, page cursor back to
    /// the initial page, `has_more` true, nothing loading. For upstream
    /// filter or sort changes that invalidate the accumulated pages.
    pub fn reset(&mut self) {
        self.items.clear();
        self.page = self.initial_page;
        self.has_more = true;
        self.loading = false;
        self.last_total = None;
        self.cursor = 0;
        self.surface.goto_top();
        self.sync_surface();
    }

    /// Scrolls the surface to offset zero and selects the first item.
    pub fn scroll_to_top(&mut self) {
        self.cursor = 0;
        self.surface.goto_top();
    }

    fn move_cursor_up(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.cursor = self.cursor.saturating_sub(n);
        self.surface.ensure_visible(self.cursor);
    }

    fn move_cursor_down(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.cursor = (self.cursor + n).min(self.items.len() - 1);
        self.surface.ensure_visible(self.cursor);
    }

    fn maybe_trigger(&mut self) -> Option<Cmd> {
        self.on_scroll(
            self.surface.y_offset(),
            self.surface.height(),
            self.surface.content_len(),
        )
    }

    fn cooldown_cmd(&mut self) -> Option<Cmd> {
        if !self.cooling {
            return None;
        }
        self.cooldown_tag += 1;
        let id = self.id;
        let tag = self.cooldown_tag;
        Some(bubbletea_tick(LOAD_COOLDOWN, move |_| {
            Box::new(CooldownMsg { id, tag }) as Msg
        }))
    }

    fn handle_key(&mut self, key_msg: &KeyMsg) -> Option<Cmd> {
        if self.keymap.cursor_up.matches(key_msg) {
            self.move_cursor_up(1);
        } else if self.keymap.cursor_down.matches(key_msg) {
            self.move_cursor_down(1);
        } else if self.keymap.page_up.matches(key_msg) {
            self.move_cursor_up(self.surface.height());
        } else if self.keymap.page_down.matches(key_msg) {
            self.move_cursor_down(self.surface.height());
        } else if self.keymap.go_to_top.matches(key_msg) {
            self.scroll_to_top();
            return None;
        } else if self.keymap.refresh.matches(key_msg) {
            return self.refresh();
        } else {
            return None;
        }
        self.maybe_trigger()
    }

    fn on_page_loaded(&mut self, msg: PageLoadedMsg<I>) -> Option<Cmd> {
        debug!(page = msg.page, count = msg.items.len(), "page loaded");
        if msg.total.is_some() {
            self.last_total = msg.total;
        }
        self.append_items(msg.items);
        self.page += 1;
        self.loading = false;
        self.cooldown_cmd()
    }

    fn on_page_failed(&mut self, msg: PageFailedMsg) -> Option<Cmd> {
        warn!(page = msg.page, error = %msg.error, "load more failed");
        self.loading = false;
        self.cooldown_cmd()
    }

    fn on_refreshed(&mut self, msg: RefreshedMsg<I>) -> Option<Cmd> {
        debug!(count = msg.items.len(), "feed refreshed");
        let selected_key = self.selected_item().map(|item| item.key());
        if msg.total.is_some() {
            self.last_total = msg.total;
        }
        self.items = msg.items;
        self.seeded = true;
        self.page = self.initial_page + 1;
        self.has_more = self.eval_has_more();
        self.cursor = selected_key
            .and_then(|k| self.items.iter().position(|item| item.key() == k))
            .unwrap_or(0);
        self.refreshing = false;
        self.keymap.refresh.set_enabled(true);
        self.sync_surface();
        None
    }

    fn on_refresh_failed(&mut self, msg: RefreshFailedMsg) -> Option<Cmd> {
        warn!(error = %msg.error, "refresh failed");
        self.refreshing = false;
        self.keymap.refresh.set_enabled(true);
        None
    }

    /// Processes key presses, fetch completions, cooldown releases, and
    /// indicator ticks. Messages addressed to other feed instances are
    /// ignored.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
            return self.handle_key(key_msg);
        }
        if let Some(cooldown) = msg.downcast_ref::<CooldownMsg>() {
            if cooldown.id == self.id && cooldown.tag == self.cooldown_tag {
                self.cooling = false;
            }
            return None;
        }
        if let Some(cmd) = self.indicator.update(&msg) {
            return Some(cmd);
        }
        let msg = match msg.downcast::<PageLoadedMsg<I>>() {
            Ok(loaded) => {
                if loaded.id != self.id {
                    return None;
                }
                return self.on_page_loaded(*loaded);
            }
            Err(other) => other,
        };
        let msg = match msg.downcast::<PageFailedMsg>() {
            Ok(failed) => {
                if failed.id != self.id {
                    return None;
                }
                return self.on_page_failed(*failed);
            }
            Err(other) => other,
        };
        let msg = match msg.downcast::<RefreshedMsg<I>>() {
            Ok(refreshed) => {
                if refreshed.id != self.id {
                    return None;
                }
                return self.on_refreshed(*refreshed);
            }
            Err(other) => other,
        };
        if let Ok(failed) = msg.downcast::<RefreshFailedMsg>() {
            if failed.id != self.id {
                return None;
            }
            return self.on_refresh_failed(*failed);
        }
        None
    }

    fn status_view(&self) -> String {
        let singular = self.status_item_singular.as_deref().unwrap_or("item");
        let plural = self.status_item_plural.as_deref().unwrap_or("items");
        let status = if self.items.is_empty() {
            format!("no {plural}")
        } else {
            let noun = if self.items.len() == 1 { singular } else { plural };
            format!(
                "{}/{} {} · {:.0}%",
                self.cursor + 1,
                self.items.len(),
                noun,
                self.surface.scroll_percent() * 100.0
            )
        };
        self.styles.status.render(&status)
    }

    fn footer_view(&self) -> String {
        let state = if self.refreshing {
            format!("{} refreshing…", self.indicator.view())
        } else if self.loading {
            format!("{} loading more…", self.indicator.view())
        } else if !self.has_more {
            "end of feed".to_string()
        } else {
            return String::new();
        };
        self.styles.footer.render(&state)
    }

    fn help_view(&self) -> String {
        let parts: Vec<String> = self
            .keymap
            .short_help()
            .iter()
            .filter(|b| b.enabled())
            .map(|b| format!("{} {}", b.help().key, b.help().desc))
            .collect();
        self.styles.help.render(&parts.join(" · "))
    }

    /// Renders the visible window, the status bar, the footer state line,
    /// and a short help line.
    pub fn view(&self) -> String {
        let mut out = String::new();
        if self.items.is_empty() {
            out.push_str(&self.styles.empty.render("Nothing here yet."));
            out.push('\n');
        } else {
            for idx in self.surface.visible_range() {
                let marker = if idx == self.cursor { "❯ " } else { "  " };
                let line = self
                    .surface
                    .fit(&format!("{}{}", marker, self.items[idx]));
                let styled = if idx == self.cursor {
                    self.styles.selected_item.render(&line)
                } else {
                    self.styles.item.render(&line)
                };
                out.push_str(&styled);
                out.push('\n');
            }
        }
        out.push_str(&self.status_view());
        let footer = self.footer_view();
        if !footer.is_empty() {
            out.push('\n');
            out.push_str(&footer);
        }
        out.push('\n');
        out.push_str(&self.help_view());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, Page};
    use crossterm::event::KeyModifiers;
    use std::fmt;
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone, Debug, PartialEq)]
    struct Post {
        id: usize,
        title: String,
    }

    impl fmt::Display for Post {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.title)
        }
    }

    impl Item for Post {
        fn key(&self) -> String {
            self.id.to_string()
        }
    }

    fn posts(start: usize, count: usize) -> Vec<Post> {
        (start..start + count)
            .map(|id| Post {
                id,
                title: format!("post {id}"),
            })
            .collect()
    }

    /// A feed whose fetcher serves `total` posts in pages of `per_page`,
    /// with a matching exhaustion predicate.
    fn paged_feed(per_page: usize, total: usize) -> Model<Post> {
        Model::new(40, 10)
            .with_fetcher(move |page| async move {
                let start = (page - 1) * per_page;
                let end = (start + per_page).min(total);
                Ok(Page::new(posts(start, end.saturating_sub(start))).with_total(total))
            })
            .with_has_more(move |count| count < total)
    }

    fn key(code: KeyCode) -> Msg {
        Box::new(KeyMsg {
            key: code,
            modifiers: KeyModifiers::NONE,
        })
    }

    async fn complete(feed: &mut Model<Post>, cmd: Cmd) -> Option<Cmd> {
        let msg = cmd.await.expect("fetch command produced no message");
        feed.update(msg)
    }

    #[tokio::test]
    async fn successful_loads_advance_the_cursor_until_exhaustion() {
        // 25 posts in pages of 10: 10, 10, then 5.
        let mut feed = paged_feed(10, 25);
        assert_eq!(feed.page(), 1);

        let cmd = feed.load_more().expect("first load should start");
        assert!(feed.is_loading());
        complete(&mut feed, cmd).await;
        assert_eq!(feed.len(), 10);
        assert_eq!(feed.page(), 2);
        assert!(feed.has_more());
        assert!(!feed.is_loading());

        let cmd = feed.load_more().expect("second load should start");
        complete(&mut feed, cmd).await;
        assert_eq!(feed.len(), 20);
        assert_eq!(feed.page(), 3);
        assert!(feed.has_more());

        let cmd = feed.load_more().expect("third load should start");
        complete(&mut feed, cmd).await;
        assert_eq!(feed.len(), 25);
        assert_eq!(feed.page(), 4);
        assert!(!feed.has_more());

        // Exhausted: the fourth call is a no-op.
        assert!(feed.load_more().is_none());
        assert_eq!(feed.len(), 25);
        assert_eq!(feed.page(), 4);
    }

    #[tokio::test]
    async fn failed_load_leaves_the_cursor_for_a_retry() {
        let mut feed = Model::new(40, 10)
            .with_fetcher(|page| async move {
                if page == 1 {
                    Ok(Page::new(posts(0, 10)).with_total(25))
                } else {
                    Err(FetchError::new("boom"))
                }
            })
            .with_has_more(|count| count < 25);

        let cmd = feed.load_more().unwrap();
        complete(&mut feed, cmd).await;
        assert_eq!(feed.page(), 2);

        let cmd = feed.load_more().unwrap();
        complete(&mut feed, cmd).await;
        assert_eq!(feed.len(), 10, "failed page must not append");
        assert_eq!(feed.page(), 2, "failed page must not advance the cursor");
        assert!(!feed.is_loading(), "loading must reset so a retry can start");

        // The same page is retried by the next trigger.
        assert!(feed.load_more().is_some());
        assert_eq!(feed.page(), 2);
    }

    #[tokio::test]
    async fn load_more_while_in_flight_is_a_noop() {
        let mut feed = paged_feed(10, 25);

        let first = feed.load_more().expect("first load should start");
        assert!(feed.is_loading());
        assert!(feed.load_more().is_none(), "second load must not start");

        complete(&mut feed, first).await;
        assert_eq!(feed.len(), 10);
        assert_eq!(feed.page(), 2);
    }

    #[test]
    fn load_more_when_exhausted_is_a_noop() {
        let mut feed = Model::new(40, 10)
            .with_fetcher(|_| async { Ok(Page::new(posts(0, 10))) })
            .with_has_more(|_| false);

        assert!(feed.load_more().is_none());
        assert!(!feed.has_more());
        assert!(!feed.is_loading());
        assert_eq!(feed.len(), 0);
        assert_eq!(feed.page(), 1);
    }

    #[test]
    fn scroll_below_threshold_never_triggers() {
        let mut feed = paged_feed(10, 100);
        assert!(feed.on_scroll(0, 10, 100).is_none());
        // Exactly at the threshold does not trigger either.
        assert!(feed.on_scroll(70, 10, 100).is_none());
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn scroll_triggers_once_per_cooldown_window() {
        let mut feed = paged_feed(10, 100);

        let cmd = feed
            .on_scroll(75, 10, 100)
            .expect("past the threshold should trigger");
        assert!(feed.is_loading());

        // Repeated scroll events during the window do nothing, even after
        // the load completes.
        assert!(feed.on_scroll(90, 10, 100).is_none());
        let cooldown = complete(&mut feed, cmd).await;
        assert!(cooldown.is_some(), "completion schedules the guard release");
        assert!(!feed.is_loading());
        assert!(feed.on_scroll(90, 10, 100).is_none());

        // Once the cooldown elapses the next scroll triggers again.
        let release: Msg = Box::new(CooldownMsg {
            id: feed.id(),
            tag: feed.cooldown_tag,
        });
        feed.update(release);
        assert!(feed.on_scroll(90, 10, 100).is_some());
    }

    #[tokio::test]
    async fn stale_cooldown_release_is_ignored() {
        let mut feed = paged_feed(10, 100);
        let cmd = feed.on_scroll(85, 10, 100).expect("should trigger");
        complete(&mut feed, cmd).await;

        // A release carrying an old tag does not disarm the guard.
        let stale: Msg = Box::new(CooldownMsg {
            id: feed.id(),
            tag: feed.cooldown_tag + 1,
        });
        feed.update(stale);
        assert!(feed.on_scroll(95, 10, 100).is_none());

        // The tag scheduled at completion does.
        let release: Msg = Box::new(CooldownMsg {
            id: feed.id(),
            tag: feed.cooldown_tag,
        });
        feed.update(release);
        assert!(feed.on_scroll(95, 10, 100).is_some());
    }

    #[tokio::test]
    async fn short_content_can_still_trigger() {
        // Fewer rows than the window: the visible fraction exceeds 1.0.
        let mut feed = paged_feed(5, 20);
        let cmd = feed.on_scroll(0, 10, 5).expect("should trigger");
        complete(&mut feed, cmd).await;
        assert_eq!(feed.len(), 5);
    }

    #[tokio::test]
    async fn reset_restores_initial_state() {
        let mut feed = paged_feed(10, 25).with_initial_page(3);
        assert_eq!(feed.page(), 3);

        let cmd = feed.load_more().unwrap();
        complete(&mut feed, cmd).await;
        assert!(!feed.is_empty());

        feed.reset();
        assert!(feed.is_empty());
        assert_eq!(feed.page(), 3);
        assert!(feed.has_more());
        assert!(!feed.is_loading());
        assert_eq!(feed.cursor(), 0);
    }

    #[test]
    fn seed_adopts_items_exactly_once() {
        let mut feed: Model<Post> = Model::new(40, 10);

        // An empty batch does not consume the latch.
        feed.seed(Vec::new());
        assert!(feed.is_empty());

        feed.seed(posts(0, 5));
        assert_eq!(feed.len(), 5);
        assert_eq!(feed.items()[0].id, 0);

        // Consumed: later batches are ignored.
        feed.seed(posts(50, 5));
        assert_eq!(feed.len(), 5);
        assert_eq!(feed.items()[0].id, 0);
    }

    #[test]
    fn initial_items_consume_the_seeding_latch() {
        let mut feed = Model::new(40, 10).with_initial_items(posts(0, 3));
        assert_eq!(feed.len(), 3);
        feed.seed(posts(10, 3));
        assert_eq!(feed.items()[0].id, 0);
        assert_eq!(feed.len(), 3);
    }

    #[test]
    fn append_items_recomputes_has_more() {
        let mut feed: Model<Post> = Model::new(40, 10).with_has_more(|count| count < 5);
        feed.append_items(posts(0, 3));
        assert!(feed.has_more());
        feed.append_items(posts(3, 3));
        assert!(!feed.has_more());
        assert_eq!(feed.len(), 6);
    }

    #[tokio::test]
    async fn refresh_replaces_items_and_keeps_the_selection() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut feed = Model::new(40, 10)
            .with_fetcher(move |_page| {
                let call = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        // Initial load: posts 0..10.
                        Ok(Page::new(posts(0, 10)).with_total(10))
                    } else {
                        // Refresh: two new posts on top, some old ones gone.
                        Ok(Page::new(posts(2, 10)).with_total(10))
                    }
                }
            })
            .with_has_more(|count| count < 10);

        let cmd = feed.load_more().unwrap();
        complete(&mut feed, cmd).await;
        assert_eq!(feed.len(), 10);

        // Select post 3.
        feed.update(key(KeyCode::Char('j')));
        feed.update(key(KeyCode::Char('j')));
        feed.update(key(KeyCode::Char('j')));
        assert_eq!(feed.selected_item().unwrap().id, 3);

        let cmd = feed.refresh().expect("refresh should start");
        assert!(feed.is_refreshing());
        assert!(!feed.keymap.refresh.enabled());
        complete(&mut feed, cmd).await;

        assert!(!feed.is_refreshing());
        assert!(feed.keymap.refresh.enabled());
        assert_eq!(feed.items()[0].id, 2, "sequence was replaced");
        assert_eq!(feed.page(), 2, "next load-more fetches the second page");
        assert_eq!(
            feed.selected_item().unwrap().id,
            3,
            "selection follows the item's key, not its old index"
        );
        assert_eq!(feed.cursor(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_leaves_the_sequence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut feed = Model::new(40, 10)
            .with_fetcher(move |_page| {
                let call = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Ok(Page::new(posts(0, 10)).with_total(10))
                    } else {
                        Err(FetchError::new("offline"))
                    }
                }
            })
            .with_has_more(|count| count < 10);

        let cmd = feed.load_more().unwrap();
        complete(&mut feed, cmd).await;

        let cmd = feed.refresh().unwrap();
        complete(&mut feed, cmd).await;
        assert_eq!(feed.len(), 10, "failed refresh keeps the old items");
        assert_eq!(feed.items()[0].id, 0);
        assert!(!feed.is_refreshing());
    }

    #[test]
    fn messages_for_other_feeds_are_ignored() {
        let mut feed: Model<Post> = Model::new(40, 10);
        let foreign: Msg = Box::new(PageLoadedMsg {
            id: feed.id() + 999,
            page: 1,
            items: posts(0, 5),
            total: Some(5),
        });
        assert!(feed.update(foreign).is_none());
        assert!(feed.is_empty());
    }

    #[test]
    fn keys_move_the_selection_and_scroll_the_window() {
        let mut feed = Model::new(40, 10).with_initial_items(posts(0, 30));

        feed.update(key(KeyCode::Char('j')));
        assert_eq!(feed.cursor(), 1);
        feed.update(key(KeyCode::Char('k')));
        assert_eq!(feed.cursor(), 0);

        // A window-sized jump scrolls the surface to keep the cursor visible.
        feed.update(key(KeyCode::Char('f')));
        assert_eq!(feed.cursor(), 10);
        assert_eq!(feed.surface().y_offset(), 1);

        feed.update(key(KeyCode::Char('g')));
        assert_eq!(feed.cursor(), 0);
        assert_eq!(feed.surface().y_offset(), 0);

        // Movement clamps at the ends.
        feed.update(key(KeyCode::Char('k')));
        assert_eq!(feed.cursor(), 0);
    }

    #[tokio::test]
    async fn navigating_near_the_end_triggers_a_load() {
        let mut feed = paged_feed(10, 100);
        let cmd = feed.load_more().unwrap();
        complete(&mut feed, cmd).await;
        assert_eq!(feed.len(), 10);

        // Ten items in a ten-row window: the whole feed is visible, so any
        // movement reports a fraction past the threshold.
        let cmd = feed.update(key(KeyCode::Char('j')));
        assert!(cmd.is_some(), "scrolling near the end starts the next load");
        assert!(feed.is_loading());
    }

    #[test]
    fn view_renders_rows_status_and_help() {
        let mut feed = Model::new(40, 10).with_initial_items(posts(0, 3));
        feed.set_status_item_name("post", "posts");
        let view = feed.view();
        assert!(view.contains("post 0"));
        assert!(view.contains("❯"));
        assert!(view.contains("1/3 posts"));
        assert!(view.contains("↑/k up"));

        let empty: Model<Post> = Model::new(40, 10);
        assert!(empty.view().contains("Nothing here yet."));
    }

    #[test]
    fn footer_reports_exhaustion() {
        let mut feed: Model<Post> = Model::new(40, 10).with_has_more(|count| count < 3);
        feed.append_items(posts(0, 3));
        assert!(!feed.has_more());
        assert!(feed.view().contains("end of feed"));
    }
}
