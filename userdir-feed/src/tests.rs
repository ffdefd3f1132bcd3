use crate::*;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use userdir_window::Align;

const PAGE_SIZE: usize = 10;

fn user(id: u64) -> UserRecord {
    UserRecord {
        id,
        first_name: format!("first{id}"),
        last_name: format!("last{id}"),
        email: format!("user{id}@example.com"),
        phone: format!("+1 555 {id:04}"),
        image: format!("https://example.com/{id}.png"),
        university: "State University".to_string(),
        company: Company {
            title: "Engineer".to_string(),
        },
    }
}

/// Page `index` of a `total`-user directory, with ids starting at 1.
fn page(index: usize, total: u64) -> Page {
    let skip = page_skip(index, PAGE_SIZE);
    let end = (skip + PAGE_SIZE as u64).min(total);
    Page {
        index,
        users: (skip..end.max(skip)).map(|i| user(i + 1)).collect(),
        skip,
        limit: PAGE_SIZE as u64,
        total,
    }
}

fn server_error() -> FetchError {
    FetchError::Server {
        status: 500,
        status_text: "Internal Server Error".to_string(),
    }
}

fn options() -> FeedOptions {
    FeedOptions {
        page_size: PAGE_SIZE,
        item_height: 1,
        overscan: 0,
        near_end_threshold: 2,
    }
}

/// A feed over a 3-row viewport.
fn small_feed() -> Feed {
    let mut feed = Feed::new(options());
    assert_eq!(feed.set_viewport_height(3), None);
    feed
}

fn ids(feed: &Feed) -> Vec<u64> {
    feed.items().map(|u| u.id).collect()
}

/// Serves pages of a `total`-user directory; pages listed in `fail` answer with HTTP 500 once.
struct ScriptedFetcher {
    total: u64,
    fail: Mutex<HashMap<usize, FetchError>>,
    calls: Mutex<Vec<usize>>,
}

impl ScriptedFetcher {
    fn new(total: u64) -> Self {
        Self {
            total,
            fail: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_once(self, page_index: usize, error: FetchError) -> Self {
        self.fail.lock().unwrap().insert(page_index, error);
        self
    }

    fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, page_index: usize) -> Result<Page, FetchError> {
        self.calls.lock().unwrap().push(page_index);
        if let Some(error) = self.fail.lock().unwrap().remove(&page_index) {
            return Err(error);
        }
        Ok(page(page_index, self.total))
    }
}

// ---- page cache -------------------------------------------------------------------------

#[test]
fn flattened_items_concatenate_pages_in_request_order() {
    let mut cache = PageCache::new(PAGE_SIZE);
    let mut expected = 0;
    for index in 0..3 {
        let request = cache.request_page(index).unwrap();
        let p = page(index, 27);
        expected += p.len();
        assert_eq!(
            cache.complete(request, Ok(p)),
            Completion::Resolved {
                page_index: index,
                len: if index == 2 { 7 } else { 10 }
            }
        );
    }

    let ids: Vec<u64> = cache.flattened_items().map(|u| u.id).collect();
    assert_eq!(ids.len(), expected);
    assert_eq!(ids, (1..=27).collect::<Vec<_>>());
    assert_eq!(cache.loaded_count(), 27);
    assert_eq!(cache.total_count(), Some(27));
    assert_eq!(cache.item(0).map(|u| u.id), Some(1));
    assert_eq!(cache.item(19).map(|u| u.id), Some(20));
    assert_eq!(cache.item(26).map(|u| u.id), Some(27));
    assert_eq!(cache.item(27), None);
}

#[test]
fn duplicate_request_while_pending_is_a_noop() {
    let mut cache = PageCache::new(PAGE_SIZE);
    let first = cache.request_page(0);
    assert!(first.is_some());
    assert_eq!(cache.request_page(0), None);
    assert_eq!(cache.fetch_state(0), FetchState::InFlight);
    assert_eq!(cache.in_flight(), Some(0));

    cache.complete(first.unwrap(), Ok(page(0, 25)));
    assert_eq!(cache.request_page(0), None);
    assert_eq!(cache.fetch_state(0), FetchState::Resolved);
    assert_eq!(cache.in_flight(), None);
}

#[test]
fn flattened_items_stop_at_the_first_gap() {
    let mut cache = PageCache::new(PAGE_SIZE);
    let r0 = cache.request_page(0).unwrap();
    let _r1 = cache.request_page(1).unwrap();
    let r2 = cache.request_page(2).unwrap();
    cache.complete(r0, Ok(page(0, 30)));
    cache.complete(r2, Ok(page(2, 30)));

    assert_eq!(cache.fetch_state(2), FetchState::Resolved);
    assert_eq!(cache.resolved_pages(), 1);
    assert_eq!(cache.loaded_count(), 10);
    assert_eq!(cache.flattened_items().count(), 10);
    assert_eq!(cache.item(20), None);
}

#[test]
fn results_from_before_a_reset_are_discarded() {
    let mut cache = PageCache::new(PAGE_SIZE);
    let old = cache.request_page(0).unwrap();
    cache.reset();
    assert_eq!(cache.session(), old.session + 1);
    assert_eq!(cache.fetch_state(0), FetchState::NotRequested);

    assert_eq!(cache.complete(old, Ok(page(0, 25))), Completion::Stale);
    assert!(!cache.has_data());

    let fresh = cache.request_page(0).unwrap();
    assert_eq!(fresh.session, cache.session());
    assert!(matches!(
        cache.complete(fresh, Ok(page(0, 25))),
        Completion::Resolved { .. }
    ));
}

#[test]
fn failure_is_retained_until_the_page_is_requested_again() {
    let mut cache = PageCache::new(PAGE_SIZE);
    let r0 = cache.request_page(0).unwrap();
    cache.complete(r0, Ok(page(0, 25)));
    let r1 = cache.request_page(1).unwrap();

    assert_eq!(
        cache.complete(r1, Err(server_error())),
        Completion::Failed {
            page_index: 1,
            error: server_error()
        }
    );
    assert_eq!(cache.fetch_state(1), FetchState::Failed);
    assert_eq!(cache.failure(), Some((1, &server_error())));
    assert_eq!(cache.loaded_count(), 10);

    assert!(cache.request_page(1).is_some());
    assert_eq!(cache.failure(), None);
}

#[test]
fn unexpected_completion_is_stale() {
    let mut cache = PageCache::new(PAGE_SIZE);
    let forged = PageRequest {
        page_index: 3,
        session: cache.session(),
    };
    assert_eq!(cache.complete(forged, Ok(page(3, 40))), Completion::Stale);
    assert_eq!(cache.fetch_state(3), FetchState::NotRequested);
}

// ---- pagination -------------------------------------------------------------------------

fn progress(loaded: usize, total: u64, in_flight: bool) -> Progress {
    Progress {
        loaded,
        total: Some(total),
        in_flight,
        next_page: loaded / PAGE_SIZE,
    }
}

#[test]
fn pagination_grows_only_near_the_loaded_end() {
    let mut p = Pagination::new();
    assert_eq!(p.on_near_end(7, progress(10, 25, false)), None);
    assert_eq!(p.state(), PaginationState::Idle);

    assert_eq!(p.on_near_end(9, progress(10, 25, false)), Some(1));
    assert_eq!(p.state(), PaginationState::Growing { page: 1 });

    // Single flight: nothing else while growing.
    assert_eq!(p.on_near_end(10, progress(10, 25, false)), None);

    p.on_resolved(1, 10, progress(20, 25, false));
    assert_eq!(p.state(), PaginationState::Idle);
}

#[test]
fn pagination_waits_for_in_flight_fetches_and_a_known_total() {
    let mut p = Pagination::new();
    assert_eq!(p.on_near_end(9, progress(10, 25, true)), None);
    let unknown = Progress {
        loaded: 0,
        total: None,
        in_flight: false,
        next_page: 0,
    };
    assert_eq!(p.on_near_end(0, unknown), None);
    assert_eq!(p.state(), PaginationState::Idle);
}

#[test]
fn pagination_exhausts_on_full_count_or_empty_page() {
    let mut p = Pagination::new();
    p.begin(2);
    p.on_resolved(2, 5, progress(25, 25, false));
    assert!(p.is_exhausted());
    assert_eq!(p.on_near_end(24, progress(25, 25, false)), None);

    let mut p = Pagination::new();
    p.begin(1);
    p.on_resolved(1, 0, progress(10, 25, false));
    assert!(p.is_exhausted());
}

#[test]
fn pagination_error_needs_a_retry() {
    let mut p = Pagination::new();
    p.begin(1);
    p.on_failed(1);
    assert_eq!(p.state(), PaginationState::Error { page: 1 });
    assert_eq!(p.on_near_end(9, progress(10, 25, false)), None);

    assert_eq!(p.retry(), Some(1));
    assert_eq!(p.state(), PaginationState::Growing { page: 1 });
    assert_eq!(p.retry(), None);

    p.on_failed(1);
    p.dismiss();
    assert_eq!(p.state(), PaginationState::Idle);
}

// ---- feed scenarios ---------------------------------------------------------------------

#[test]
fn total_of_25_loads_in_three_pages() {
    let mut feed = small_feed();
    assert_eq!(feed.phase(), Phase::Loading);

    let r0 = feed.start().unwrap();
    assert_eq!(r0.page_index, 0);
    assert_eq!(feed.complete(r0, Ok(page(0, 25))), None);

    assert_eq!(feed.phase(), Phase::Ready);
    assert_eq!(feed.loaded_count(), 10);
    assert_eq!(feed.header(), "Showing 10 of 25 users");
    assert!(feed.has_more());
    assert_eq!(feed.item_count(), 11);
    assert_eq!(feed.window().count(), 11);

    // Scrolling to item 9 brings the end of the loaded data into view.
    let r1 = feed.scroll_to_index(9, Align::End).unwrap();
    assert_eq!(r1.page_index, 1);
    assert!(feed.is_loading_more());
    assert_eq!(feed.complete(r1, Ok(page(1, 25))), None);
    assert_eq!(feed.loaded_count(), 20);
    assert_eq!(feed.header(), "Showing 20 of 25 users");

    let r2 = feed.scroll_to_index(19, Align::End).unwrap();
    assert_eq!(r2.page_index, 2);
    assert_eq!(feed.complete(r2, Ok(page(2, 25))), None);

    assert_eq!(feed.loaded_count(), 25);
    assert_eq!(feed.header(), "Showing 25 of 25 users");
    assert!(!feed.has_more());
    assert_eq!(feed.item_count(), 25);
    assert_eq!(feed.window().loaded(), 25);
    assert_eq!(feed.pagination_state(), PaginationState::Exhausted);
    assert_eq!(ids(&feed), (1..=25).collect::<Vec<_>>());
}

#[test]
fn exhausted_feed_never_fetches_again() {
    let mut feed = small_feed();
    let r0 = feed.start().unwrap();
    feed.complete(r0, Ok(page(0, 10)));

    assert_eq!(feed.pagination_state(), PaginationState::Exhausted);
    assert_eq!(feed.item_count(), 10);
    assert_eq!(feed.scroll_to_end(), None);
    assert_eq!(feed.scroll_by(-1), None);
    assert_eq!(feed.scroll_by(1), None);
    assert_eq!(feed.fetch_state(1), FetchState::NotRequested);
}

#[test]
fn first_page_server_error_shows_full_panel_and_refresh_reissues_page_zero() {
    let mut feed = small_feed();
    let r0 = feed.start().unwrap();
    assert_eq!(feed.complete(r0, Err(server_error())), None);

    assert_eq!(feed.phase(), Phase::Failed(server_error()));
    assert_eq!(
        server_error().to_string(),
        "Failed to fetch: 500 Internal Server Error"
    );
    assert_eq!(feed.inline_error(), None);
    assert_eq!(feed.scroll_by(5), None);

    let again = feed.refresh().unwrap();
    assert_eq!(again.page_index, 0);
    assert_eq!(again.session, r0.session + 1);
    assert_eq!(feed.phase(), Phase::Loading);
    assert_eq!(feed.fetch_state(1), FetchState::NotRequested);

    feed.complete(again, Ok(page(0, 25)));
    assert_eq!(feed.phase(), Phase::Ready);
}

#[test]
fn empty_directory_shows_empty_state_without_pagination() {
    let mut feed = small_feed();
    let r0 = feed.start().unwrap();
    assert_eq!(feed.complete(r0, Ok(page(0, 0))), None);

    assert_eq!(feed.phase(), Phase::Empty);
    assert_eq!(feed.item_count(), 0);
    assert_eq!(feed.header(), "Showing 0 of 0 users");
    assert_eq!(feed.scroll_to_end(), None);
    assert_eq!(feed.pagination_state(), PaginationState::Exhausted);
}

#[test]
fn later_page_failure_keeps_loaded_pages_and_retry_refetches_only_that_page() {
    let mut feed = small_feed();
    let r0 = feed.start().unwrap();
    feed.complete(r0, Ok(page(0, 25)));
    let r1 = feed.scroll_to_index(9, Align::End).unwrap();
    feed.complete(r1, Ok(page(1, 25)));
    let r2 = feed.scroll_to_index(19, Align::End).unwrap();

    assert_eq!(feed.complete(r2, Err(server_error())), None);
    assert_eq!(feed.phase(), Phase::Ready);
    assert_eq!(feed.inline_error(), Some(&server_error()));
    assert_eq!(ids(&feed), (1..=20).collect::<Vec<_>>());
    assert!(feed.has_more());
    assert_eq!(feed.pagination_state(), PaginationState::Error { page: 2 });

    // Scrolling does not retry on its own.
    assert_eq!(feed.scroll_by(-1), None);
    assert_eq!(feed.scroll_by(1), None);

    let retry = feed.retry().unwrap();
    assert_eq!(retry.page_index, 2);
    assert_eq!(feed.inline_error(), None);
    assert_eq!(feed.fetch_state(0), FetchState::Resolved);
    assert_eq!(feed.fetch_state(1), FetchState::Resolved);

    feed.complete(retry, Ok(page(2, 25)));
    assert_eq!(feed.loaded_count(), 25);
    assert!(!feed.has_more());
}

#[test]
fn dismissed_error_lets_the_next_scroll_request_the_page() {
    let mut feed = small_feed();
    let r0 = feed.start().unwrap();
    feed.complete(r0, Ok(page(0, 25)));
    let r1 = feed.scroll_to_index(9, Align::End).unwrap();
    feed.complete(r1, Err(server_error()));

    feed.dismiss_error();
    assert_eq!(feed.inline_error(), None);
    assert_eq!(feed.fetch_state(1), FetchState::Failed);
    assert_eq!(feed.pagination_state(), PaginationState::Idle);

    assert_eq!(feed.scroll_by(-2), None);
    let again = feed.scroll_by(2).unwrap();
    assert_eq!(again.page_index, 1);
}

#[test]
fn tall_viewport_keeps_growing_until_filled() {
    let mut feed = Feed::new(options());
    feed.set_viewport_height(30);

    let r0 = feed.start().unwrap();
    let r1 = feed.complete(r0, Ok(page(0, 25))).unwrap();
    assert_eq!(r1.page_index, 1);
    let r2 = feed.complete(r1, Ok(page(1, 25))).unwrap();
    assert_eq!(r2.page_index, 2);
    assert_eq!(feed.complete(r2, Ok(page(2, 25))), None);
    assert_eq!(feed.loaded_count(), 25);
}

#[test]
fn refresh_discards_late_results_and_returns_to_the_top() {
    let mut feed = small_feed();
    let r0 = feed.start().unwrap();
    feed.complete(r0, Ok(page(0, 25)));
    let r1 = feed.scroll_to_index(9, Align::End).unwrap();
    assert!(feed.window().scroll_offset() > 0);

    let fresh = feed.refresh().unwrap();
    assert_eq!(feed.window().scroll_offset(), 0);
    assert_eq!(feed.window().count(), 0);

    // Page 1 of the old session arrives late.
    assert_eq!(feed.complete(r1, Ok(page(1, 25))), None);
    assert_eq!(feed.loaded_count(), 0);
    assert_eq!(feed.phase(), Phase::Loading);

    feed.complete(fresh, Ok(page(0, 25)));
    assert_eq!(ids(&feed), (1..=10).collect::<Vec<_>>());
}

#[test]
fn start_is_idempotent() {
    let mut feed = small_feed();
    assert!(feed.start().is_some());
    assert_eq!(feed.start(), None);
    assert_eq!(feed.retry(), None);
}

#[test]
fn on_change_fires_once_per_operation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut feed = small_feed();
    feed.set_on_change(Some({
        let calls = Arc::clone(&calls);
        move |_: &Feed| {
            calls.fetch_add(1, Ordering::Relaxed);
        }
    }));

    let r0 = feed.start().unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    feed.complete(r0, Ok(page(0, 25)));
    assert_eq!(calls.load(Ordering::Relaxed), 2);
    feed.scroll_to_index(9, Align::End);
    assert_eq!(calls.load(Ordering::Relaxed), 3);
}

// ---- driver -----------------------------------------------------------------------------

#[tokio::test]
async fn driver_deduplicates_requests_for_a_pending_page() {
    let mut driver = Driver::new(ScriptedFetcher::new(25));
    let mut feed = small_feed();

    driver.dispatch_opt(feed.start());
    driver.dispatch_opt(feed.start());
    driver.dispatch_opt(feed.retry());
    assert_eq!(driver.in_flight(), 1);

    let outcome = driver.next().await.unwrap();
    assert_eq!(outcome.request.page_index, 0);
    assert_eq!(feed.apply(outcome), None);
    assert_eq!(driver.in_flight(), 0);
    assert_eq!(driver.try_next().map(|o| o.request), None);
    assert_eq!(driver.fetcher().calls(), vec![0]);
    assert_eq!(feed.loaded_count(), 10);
}

#[tokio::test]
async fn driver_loads_the_whole_directory_through_the_feed() {
    let fetcher = ScriptedFetcher::new(25).failing_once(1, server_error());
    let mut driver = Driver::new(fetcher);
    let mut feed = Feed::new(options());
    feed.set_viewport_height(30);

    driver.dispatch_opt(feed.start());
    while let Some(outcome) = driver.next().await {
        driver.dispatch_opt(feed.apply(outcome));
        if driver.in_flight() == 0 {
            if feed.inline_error().is_some() {
                driver.dispatch_opt(feed.retry());
            } else {
                break;
            }
        }
    }

    assert_eq!(feed.loaded_count(), 25);
    assert_eq!(driver.fetcher().calls(), vec![0, 1, 1, 2]);
}

// ---- wire model -------------------------------------------------------------------------

#[test]
fn envelope_decodes_camel_case_users() {
    let body = r#"{
        "users": [{
            "id": 7,
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "phone": "+44 20 7946 0000",
            "image": "https://example.com/ada.png",
            "university": "University of London",
            "company": { "title": "Analyst" }
        }],
        "total": 1,
        "skip": 0,
        "limit": 10
    }"#;
    let envelope: PageEnvelope = serde_json::from_str(body).unwrap();
    let page = Page::from_envelope(0, envelope);
    assert_eq!(page.total, 1);
    let ada = &page.users[0];
    assert_eq!(ada.full_name(), "Ada Lovelace");
    assert_eq!(ada.initials(), "AL");
    assert_eq!(ada.company.title, "Analyst");
}

#[test]
fn malformed_envelope_is_a_parse_error() {
    let err: FetchError = serde_json::from_str::<PageEnvelope>(r#"{"users": 3}"#)
        .unwrap_err()
        .into();
    assert!(matches!(err, FetchError::Parse(_)));
}

#[test]
fn page_url_uses_take_and_skip() {
    assert_eq!(
        page_url("https://api.example.com/users/", 10, 0),
        "https://api.example.com/users/GetUsersList?take=10&skip=0"
    );
    assert_eq!(
        page_url("https://api.example.com/users", 10, 3),
        "https://api.example.com/users/GetUsersList?take=10&skip=30"
    );
}

#[test]
fn initials_tolerate_empty_names() {
    let mut u = user(1);
    u.first_name.clear();
    u.last_name = "doe".to_string();
    assert_eq!(u.initials(), "D");
}
