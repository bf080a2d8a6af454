use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::Result;

/// Generic user-facing failure message. Individual causes (transport,
/// status, decode) are logged but not distinguished in the UI.
pub const FETCH_FAILED: &str = "Something went wrong";

/// Pagination block returned by the routes API. The server is authoritative
/// for all three fields; in particular `has_more` may reflect filters the
/// client cannot recompute from counts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub total_count: u64,
    pub has_more: bool,
}

/// One page of results as served by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

/// Fetches one page of a resource. Implementations wrap a single API
/// endpoint; `query` is the committed search filter, if any.
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    async fn fetch(&self, page: u32, limit: u32, query: Option<&str>) -> Result<Page<T>>;
}

/// Save/unsave mutation for lists that support it (saved routes, search
/// results). Toggle is idempotent by route id on the server side.
#[async_trait]
pub trait RouteToggler: Send + Sync {
    async fn toggle(&self, route_id: i64) -> Result<()>;
}

/// Completion message produced by a paginator's background tasks. Routed
/// back through the app's action channel and applied via [`Paginator::handle`]
/// on the update loop, so all state mutation stays single threaded.
#[derive(Debug)]
pub enum PaginatorMsg<T> {
    /// A fetch resolved. `seq` identifies which dispatch it belongs to.
    Loaded { seq: u64, outcome: Result<Page<T>> },
    /// The search debounce timer fired for `text`.
    QueryElapsed { generation: u64, text: String },
    /// The toggle mutation resolved.
    Toggled { outcome: Result<()> },
}

/// Driver for one paginated, searchable list screen.
///
/// Owns the page cursor, loading/error state and the debounced search query,
/// and dispatches fetches on spawned tasks. Completions come back as
/// [`PaginatorMsg`] values wrapped into the app's message type `M`; responses
/// from superseded requests are discarded by sequence number, so rapid
/// next/previous/query changes can never revert the list to a stale page.
pub struct Paginator<T, M> {
    items: Vec<T>,
    page: u32,
    limit: u32,
    total_count: u64,
    has_more: bool,
    is_loading: bool,
    error: Option<String>,
    query: Option<String>,
    pending_query: String,
    seq: u64,
    debounce: Duration,
    debounce_generation: u64,
    debounce_task: Option<JoinHandle<()>>,
    fetcher: Arc<dyn PageFetcher<T>>,
    toggler: Option<Arc<dyn RouteToggler>>,
    tx: mpsc::UnboundedSender<M>,
    wrap: fn(PaginatorMsg<T>) -> M,
}

impl<T, M> Paginator<T, M>
where
    T: Send + 'static,
    M: Send + 'static,
{
    pub fn new(
        fetcher: Arc<dyn PageFetcher<T>>,
        limit: u32,
        debounce: Duration,
        tx: mpsc::UnboundedSender<M>,
        wrap: fn(PaginatorMsg<T>) -> M,
    ) -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            limit: limit.max(1),
            total_count: 0,
            has_more: false,
            is_loading: false,
            error: None,
            query: None,
            pending_query: String::new(),
            seq: 0,
            debounce,
            debounce_generation: 0,
            debounce_task: None,
            fetcher,
            toggler: None,
            tx,
            wrap,
        }
    }

    pub fn with_toggler(mut self, toggler: Arc<dyn RouteToggler>) -> Self {
        self.toggler = Some(toggler);
        self
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The search text as typed, before the debounce commits it.
    pub fn pending_query(&self) -> &str {
        &self.pending_query
    }

    pub fn can_go_back(&self) -> bool {
        self.page > 1
    }

    pub fn can_go_forward(&self) -> bool {
        self.has_more
    }

    /// Fetch the current `(page, limit, query)` tuple.
    pub fn load(&mut self) {
        self.is_loading = true;
        self.error = None;
        self.dispatch();
    }

    /// Reset to the first page and fetch. Used when a screen is (re)entered.
    pub fn refresh(&mut self) {
        self.page = 1;
        self.load();
    }

    pub fn next_page(&mut self) {
        if !self.can_go_forward() {
            return;
        }
        self.page += 1;
        self.load();
    }

    pub fn previous_page(&mut self) {
        if !self.can_go_back() {
            return;
        }
        self.page -= 1;
        self.load();
    }

    /// Record a keystroke and (re)start the debounce timer. Only the final
    /// value in a burst is committed; earlier timers are aborted, and a
    /// generation tag rejects any fire that slips through the abort.
    pub fn set_query(&mut self, text: String) {
        self.pending_query = text.clone();
        self.debounce_generation += 1;
        if let Some(task) = self.debounce_task.take() {
            task.abort();
        }
        let generation = self.debounce_generation;
        let delay = self.debounce;
        let tx = self.tx.clone();
        let wrap = self.wrap;
        self.debounce_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tx.send(wrap(PaginatorMsg::QueryElapsed { generation, text }))
                .ok();
        }));
    }

    /// Save or unsave a route. On completion the current page is re-fetched
    /// silently so the list reconciles with actual server state.
    pub fn toggle(&mut self, route_id: i64) {
        let Some(toggler) = self.toggler.clone() else {
            return;
        };
        let tx = self.tx.clone();
        let wrap = self.wrap;
        tokio::spawn(async move {
            let outcome = toggler.toggle(route_id).await;
            tx.send(wrap(PaginatorMsg::Toggled { outcome })).ok();
        });
    }

    /// Apply a completion message. Must run on the app's update loop.
    pub fn handle(&mut self, msg: PaginatorMsg<T>) {
        match msg {
            PaginatorMsg::Loaded { seq, outcome } => {
                if seq != self.seq {
                    // Superseded by a later dispatch; applying it would
                    // revert the list to a stale page.
                    return;
                }
                self.is_loading = false;
                match outcome {
                    Ok(page) => {
                        self.items = page.data;
                        self.page = page.pagination.page.max(1);
                        self.has_more = page.pagination.has_more;
                        self.total_count = page.pagination.total_count;
                    }
                    Err(err) => {
                        warn!(error = %err, "page fetch failed");
                        self.error = Some(FETCH_FAILED.to_string());
                    }
                }
            }
            PaginatorMsg::QueryElapsed { generation, text } => {
                if generation != self.debounce_generation {
                    return;
                }
                // Page must reset before the fetch dispatches so an in-flight
                // fetch for the old page is superseded consistently.
                self.page = 1;
                self.query = if text.is_empty() { None } else { Some(text) };
                self.load();
            }
            PaginatorMsg::Toggled { outcome } => {
                if let Err(err) = outcome {
                    warn!(error = %err, "route toggle failed");
                    self.error = Some(FETCH_FAILED.to_string());
                }
                // Silent refresh: never turns the loading indicator on, so
                // the list updates in place without a flicker.
                self.dispatch();
            }
        }
    }

    fn dispatch(&mut self) {
        self.seq += 1;
        let seq = self.seq;
        let page = self.page;
        let limit = self.limit;
        let query = self.query.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        let wrap = self.wrap;
        tokio::spawn(async move {
            let outcome = fetcher.fetch(page, limit, query.as_deref()).await;
            tx.send(wrap(PaginatorMsg::Loaded { seq, outcome })).ok();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RfError;
    use std::convert::identity;
    use std::sync::Mutex;

    type TestPager = Paginator<u32, PaginatorMsg<u32>>;
    type TestRx = mpsc::UnboundedReceiver<PaginatorMsg<u32>>;

    /// Answers every fetch with `per_page` items tagged by page number.
    /// `has_more` holds until `last_page`.
    struct ScriptedPages {
        calls: Mutex<Vec<(u32, Option<String>)>>,
        per_page: u32,
        total_count: u64,
        last_page: u32,
    }

    impl ScriptedPages {
        fn new(per_page: u32, total_count: u64, last_page: u32) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                per_page,
                total_count,
                last_page,
            })
        }

        fn calls(&self) -> Vec<(u32, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher<u32> for ScriptedPages {
        async fn fetch(&self, page: u32, _limit: u32, query: Option<&str>) -> Result<Page<u32>> {
            self.calls
                .lock()
                .unwrap()
                .push((page, query.map(str::to_string)));
            Ok(Page {
                data: (0..self.per_page).map(|i| page * 100 + i).collect(),
                pagination: PageInfo {
                    page,
                    total_count: self.total_count,
                    has_more: page < self.last_page,
                },
            })
        }
    }

    /// Fails every fetch for pages past the first.
    struct FlakyPages;

    #[async_trait]
    impl PageFetcher<u32> for FlakyPages {
        async fn fetch(&self, page: u32, _limit: u32, _query: Option<&str>) -> Result<Page<u32>> {
            if page > 1 {
                return Err(RfError::Api("boom".into()));
            }
            Ok(Page {
                data: vec![1, 2, 3],
                pagination: PageInfo {
                    page: 1,
                    total_count: 30,
                    has_more: true,
                },
            })
        }
    }

    struct RecordingToggler {
        ids: Mutex<Vec<i64>>,
        fail: bool,
    }

    #[async_trait]
    impl RouteToggler for RecordingToggler {
        async fn toggle(&self, route_id: i64) -> Result<()> {
            self.ids.lock().unwrap().push(route_id);
            if self.fail {
                Err(RfError::Api("boom".into()))
            } else {
                Ok(())
            }
        }
    }

    fn pager(fetcher: Arc<dyn PageFetcher<u32>>, limit: u32) -> (TestPager, TestRx) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pager = Paginator::new(fetcher, limit, Duration::from_millis(300), tx, identity);
        (pager, rx)
    }

    async fn pump(pager: &mut TestPager, rx: &mut TestRx) {
        let msg = rx.recv().await.expect("paginator message");
        pager.handle(msg);
    }

    #[tokio::test]
    async fn first_load_applies_server_cursor() {
        let pages = ScriptedPages::new(3, 25, 3);
        let (mut pager, mut rx) = pager(pages.clone(), 10);

        pager.load();
        assert!(pager.is_loading());
        pump(&mut pager, &mut rx).await;

        assert_eq!(pager.items(), &[100, 101, 102]);
        assert_eq!(pager.page(), 1);
        assert_eq!(pager.total_count(), 25);
        assert!(pager.can_go_forward());
        assert!(!pager.can_go_back());
        assert!(!pager.is_loading());
        assert!(pager.error().is_none());
    }

    #[tokio::test]
    async fn last_page_disables_forward() {
        let pages = ScriptedPages::new(5, 25, 3);
        let (mut pager, mut rx) = pager(pages.clone(), 10);

        pager.load();
        pump(&mut pager, &mut rx).await;
        pager.next_page();
        pump(&mut pager, &mut rx).await;
        pager.next_page();
        pump(&mut pager, &mut rx).await;

        assert_eq!(pager.page(), 3);
        assert!(!pager.can_go_forward());
        assert!(pager.can_go_back());
    }

    #[tokio::test]
    async fn navigation_is_guarded_at_the_edges() {
        let pages = ScriptedPages::new(2, 2, 1);
        let (mut pager, mut rx) = pager(pages.clone(), 10);

        // Nothing loaded yet: has_more is false and page is 1, so neither
        // direction may dispatch.
        pager.next_page();
        pager.previous_page();
        pager.previous_page();
        assert_eq!(pager.page(), 1);

        pager.load();
        pump(&mut pager, &mut rx).await;
        pager.next_page();
        pager.previous_page();
        assert_eq!(pager.page(), 1);
        assert_eq!(pages.calls().len(), 1);
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let pages = ScriptedPages::new(2, 25, 3);
        let (mut pager, mut rx) = pager(pages.clone(), 10);

        pager.load();
        pump(&mut pager, &mut rx).await;

        // Page 2 fetch goes out, then the user immediately steps back,
        // issuing a page 1 fetch before the first resolves.
        pager.next_page();
        pager.previous_page();

        let first = rx.recv().await.expect("first completion");
        let second = rx.recv().await.expect("second completion");
        let served_page = |msg: &PaginatorMsg<u32>| match msg {
            PaginatorMsg::Loaded { outcome: Ok(p), .. } => p.pagination.page,
            _ => panic!("expected a successful load"),
        };

        // Apply the page 1 response first, then the page 2 response, i.e.
        // the stale reply arrives last in wall-clock order.
        let (fresh, stale) = if served_page(&first) == 1 {
            (first, second)
        } else {
            (second, first)
        };
        pager.handle(fresh);
        pager.handle(stale);

        assert_eq!(pager.page(), 1);
        assert_eq!(pager.items(), &[100, 101]);
        assert!(!pager.is_loading());
        assert_eq!(
            pages.calls().iter().map(|c| c.0).collect::<Vec<_>>(),
            vec![1, 2, 1]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_collapses_bursts() {
        let pages = ScriptedPages::new(1, 5, 1);
        let (mut pager, mut rx) = pager(pages.clone(), 10);

        pager.set_query("a".into());
        tokio::time::advance(Duration::from_millis(100)).await;
        pager.set_query("ab".into());
        tokio::time::advance(Duration::from_millis(100)).await;
        pager.set_query("abc".into());
        assert_eq!(pager.pending_query(), "abc");

        tokio::time::advance(Duration::from_millis(300)).await;
        pump(&mut pager, &mut rx).await; // QueryElapsed
        pump(&mut pager, &mut rx).await; // Loaded

        assert_eq!(pager.query(), Some("abc"));
        assert_eq!(pager.page(), 1);
        assert_eq!(pages.calls(), vec![(1, Some("abc".to_string()))]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stale_debounce_generation_is_ignored() {
        let pages = ScriptedPages::new(1, 5, 1);
        let (mut pager, _rx) = pager(pages.clone(), 10);

        pager.set_query("old".into());
        pager.set_query("new".into());

        // A fire from the aborted "old" timer must not commit.
        pager.handle(PaginatorMsg::QueryElapsed {
            generation: 1,
            text: "old".into(),
        });

        assert_eq!(pager.query(), None);
        assert!(pages.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_the_query_goes_through_the_debounce() {
        let pages = ScriptedPages::new(1, 5, 1);
        let (mut pager, mut rx) = pager(pages.clone(), 10);

        pager.set_query("abc".into());
        tokio::time::advance(Duration::from_millis(300)).await;
        pump(&mut pager, &mut rx).await;
        pump(&mut pager, &mut rx).await;
        assert_eq!(pager.query(), Some("abc"));

        pager.set_query(String::new());
        tokio::time::advance(Duration::from_millis(300)).await;
        pump(&mut pager, &mut rx).await;
        pump(&mut pager, &mut rx).await;

        assert_eq!(pager.query(), None);
        assert_eq!(pages.calls().last().unwrap(), &(1, None));
    }

    #[tokio::test]
    async fn failure_keeps_previous_items() {
        let (mut pager, mut rx) = pager(Arc::new(FlakyPages), 10);

        pager.load();
        pump(&mut pager, &mut rx).await;
        assert_eq!(pager.items(), &[1, 2, 3]);

        pager.next_page();
        pump(&mut pager, &mut rx).await;

        assert_eq!(pager.items(), &[1, 2, 3]);
        assert_eq!(pager.error(), Some(FETCH_FAILED));
        assert!(!pager.is_loading());

        // The next attempt clears the error before dispatching.
        pager.previous_page();
        assert!(pager.error().is_none());
        pump(&mut pager, &mut rx).await;
        assert!(pager.error().is_none());
    }

    #[tokio::test]
    async fn empty_page_is_a_success_state() {
        let pages = ScriptedPages::new(0, 0, 0);
        let (mut pager, mut rx) = pager(pages, 10);

        pager.load();
        pump(&mut pager, &mut rx).await;

        assert!(pager.items().is_empty());
        assert_eq!(pager.total_count(), 0);
        assert!(pager.error().is_none());
        assert!(!pager.can_go_forward());
    }

    #[tokio::test]
    async fn toggle_refetches_silently() {
        let pages = ScriptedPages::new(2, 4, 2);
        let toggler = Arc::new(RecordingToggler {
            ids: Mutex::new(Vec::new()),
            fail: false,
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut pager: TestPager =
            Paginator::new(pages.clone(), 10, Duration::from_millis(300), tx, identity)
                .with_toggler(toggler.clone());

        pager.load();
        pump(&mut pager, &mut rx).await;
        assert_eq!(pages.calls().len(), 1);

        pager.toggle(42);
        pump(&mut pager, &mut rx).await; // Toggled
        assert!(!pager.is_loading());
        pump(&mut pager, &mut rx).await; // silent Loaded
        assert!(!pager.is_loading());

        assert_eq!(toggler.ids.lock().unwrap().as_slice(), &[42]);
        assert_eq!(pages.calls().len(), 2);
        assert!(pager.error().is_none());
    }

    #[tokio::test]
    async fn failed_toggle_surfaces_error_and_still_refetches() {
        let pages = ScriptedPages::new(2, 4, 2);
        let toggler = Arc::new(RecordingToggler {
            ids: Mutex::new(Vec::new()),
            fail: true,
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut pager: TestPager =
            Paginator::new(pages.clone(), 10, Duration::from_millis(300), tx, identity)
                .with_toggler(toggler);

        pager.load();
        pump(&mut pager, &mut rx).await;

        pager.toggle(7);
        pump(&mut pager, &mut rx).await; // Toggled (failure)
        assert_eq!(pager.error(), Some(FETCH_FAILED));
        pump(&mut pager, &mut rx).await; // silent Loaded still happens

        assert_eq!(pages.calls().len(), 2);
        // The silent refresh does not clear the surfaced toggle error.
        assert_eq!(pager.error(), Some(FETCH_FAILED));
    }

    #[tokio::test]
    async fn refresh_returns_to_the_first_page() {
        let pages = ScriptedPages::new(2, 25, 3);
        let (mut pager, mut rx) = pager(pages.clone(), 10);

        pager.load();
        pump(&mut pager, &mut rx).await;
        pager.next_page();
        pump(&mut pager, &mut rx).await;
        assert_eq!(pager.page(), 2);

        pager.refresh();
        pump(&mut pager, &mut rx).await;
        assert_eq!(pager.page(), 1);
    }
}
