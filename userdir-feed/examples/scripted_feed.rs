// Example: drive a feed against an in-memory directory of 25 users.
use userdir_feed::{
    Company, Driver, Feed, FeedOptions, FetchError, Fetcher, Page, UserRecord, page_skip,
    userdir_window::Align,
};

const PAGE_SIZE: usize = 10;

struct InMemory {
    total: u64,
}

impl Fetcher for InMemory {
    async fn fetch(&self, page_index: usize) -> Result<Page, FetchError> {
        let skip = page_skip(page_index, PAGE_SIZE);
        let end = (skip + PAGE_SIZE as u64).min(self.total);
        let users = (skip..end.max(skip))
            .map(|i| UserRecord {
                id: i + 1,
                first_name: format!("User{}", i + 1),
                last_name: "Example".to_string(),
                email: format!("user{}@example.com", i + 1),
                phone: String::new(),
                image: String::new(),
                university: String::new(),
                company: Company::default(),
            })
            .collect();
        Ok(Page {
            index: page_index,
            users,
            skip,
            limit: PAGE_SIZE as u64,
            total: self.total,
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mut driver = Driver::new(InMemory { total: 25 });
    let mut feed = Feed::new(FeedOptions {
        page_size: PAGE_SIZE,
        item_height: 1,
        ..FeedOptions::default()
    });
    feed.set_viewport_height(5);
    driver.dispatch_opt(feed.start());

    while driver.in_flight() > 0 {
        let Some(outcome) = driver.next().await else {
            break;
        };
        driver.dispatch_opt(feed.apply(outcome));
        println!("{}", feed.header());

        // Jump to the last loaded user, as a reader flicking to the bottom would.
        let last = feed.loaded_count().saturating_sub(1);
        driver.dispatch_opt(feed.scroll_to_index(last, Align::End));
    }

    println!("state={:?} has_more={}", feed.pagination_state(), feed.has_more());
}
