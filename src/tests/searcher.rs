use chrono::{DateTime, TimeZone, Utc};

use crate::links::{CollectionKind, Link, LinkCreate, LinkStore, MemoryStore, Pagination};
use crate::search_query::{ParseError, Query, Token, TokenKind};
use crate::searcher::{LinkFilter, LinksSearcher, SearchError};

fn date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
}

fn add(
    store: &MemoryStore,
    user: &str,
    title: &str,
    url: &str,
    tags: &[&str],
    collections: &[CollectionKind],
    day: u32,
) -> Link {
    store
        .create(LinkCreate {
            user_id: user.to_string(),
            url: url.to_string(),
            title: Some(title.to_string()),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            collections: collections.to_vec(),
            published_at: Some(date(day)),
        })
        .unwrap()
}

fn query(input: &str) -> Query {
    input.parse().unwrap()
}

fn titles(links: &[Link]) -> Vec<&str> {
    links.iter().map(|l| l.title.as_str()).collect()
}

// --- LinkFilter::compile ---

#[test]
fn test_compile_full_query() {
    let filter = LinkFilter::compile(&query(
        "\"My Title\" url:flus.fr #news -#discard other url:blog",
    ));
    assert_eq!(
        filter,
        LinkFilter {
            text: Some("My Title other".to_string()),
            url_contains: vec!["flus.fr".to_string(), "blog".to_string()],
            required_tags: vec!["news".to_string()],
            excluded_tags: vec!["discard".to_string()],
            exclude_never_only: true,
        }
    );
}

#[test]
fn test_compile_without_text() {
    let filter = LinkFilter::compile(&query("#news"));
    assert_eq!(filter.text, None);
    assert!(filter.exclude_never_only);

    let filter = LinkFilter::compile(&Query::default());
    assert_eq!(filter.text, None);
    assert!(filter.exclude_never_only);
}

// --- get_links / count_links ---

#[test]
fn test_search_by_exact_title() {
    let store = MemoryStore::default();
    let link = add(&store, "alix", "Rust Weekly", "https://this-week-in-rust.org", &[], &[CollectionKind::Bookmarks], 1);
    add(&store, "alix", "Other", "https://example.com", &[], &[CollectionKind::Bookmarks], 2);

    let searcher = LinksSearcher::new(&store);
    let links = searcher
        .get_links("alix", &query("Rust Weekly"), Pagination::default())
        .unwrap();
    assert_eq!(links, vec![link]);
    assert_eq!(searcher.count_links("alix", &query("Rust Weekly")).unwrap(), 1);
}

#[test]
fn test_search_by_tag() {
    let store = MemoryStore::default();
    add(&store, "alix", "Tagged", "https://a.com", &["News"], &[CollectionKind::Bookmarks], 1);
    add(&store, "alix", "Untagged", "https://b.com", &[], &[CollectionKind::Bookmarks], 2);

    let searcher = LinksSearcher::new(&store);

    let links = searcher
        .get_links("alix", &query("#news"), Pagination::default())
        .unwrap();
    assert_eq!(titles(&links), vec!["Tagged"]);

    let links = searcher
        .get_links("alix", &query("-#news"), Pagination::default())
        .unwrap();
    assert_eq!(titles(&links), vec!["Untagged"]);
}

#[test]
fn test_search_by_url_qualifiers() {
    let store = MemoryStore::default();
    add(&store, "alix", "Flus blog", "https://flus.fr/carnet", &[], &[CollectionKind::News], 1);
    add(&store, "alix", "Flus app", "https://app.flus.fr", &[], &[CollectionKind::News], 2);
    add(&store, "alix", "Elsewhere", "https://example.com", &[], &[CollectionKind::News], 3);

    let searcher = LinksSearcher::new(&store);

    let links = searcher
        .get_links("alix", &query("url:FLUS.fr"), Pagination::default())
        .unwrap();
    assert_eq!(titles(&links), vec!["Flus app", "Flus blog"]);

    // every url qualifier has to match
    let links = searcher
        .get_links("alix", &query("url:flus.fr url:carnet"), Pagination::default())
        .unwrap();
    assert_eq!(titles(&links), vec!["Flus blog"]);
}

#[test]
fn test_search_combines_conditions() {
    let store = MemoryStore::default();
    add(&store, "alix", "Rust news", "https://a.com", &["rust", "news"], &[CollectionKind::Bookmarks], 1);
    add(&store, "alix", "Rust old", "https://a.com/old", &["rust", "discard"], &[CollectionKind::Bookmarks], 2);
    add(&store, "alix", "Go news", "https://b.com", &["news"], &[CollectionKind::Bookmarks], 3);

    let searcher = LinksSearcher::new(&store);
    let q = query("rust url:a.com #rust -#discard");
    let links = searcher.get_links("alix", &q, Pagination::default()).unwrap();
    assert_eq!(titles(&links), vec!["Rust news"]);
    assert_eq!(searcher.count_links("alix", &q).unwrap(), 1);
}

#[test]
fn test_never_only_links_are_excluded() {
    let store = MemoryStore::default();
    add(&store, "alix", "Hidden", "https://hidden.com", &["tag"], &[CollectionKind::Never], 1);
    add(&store, "alix", "Hidden too", "https://hidden.com/2", &["tag"], &[CollectionKind::Never, CollectionKind::Bookmarks], 2);
    add(&store, "alix", "No collection", "https://hidden.com/3", &["tag"], &[], 3);

    let searcher = LinksSearcher::new(&store);
    for input in ["Hidden", "#tag", "url:hidden", ""] {
        let q = query(input);
        let links = searcher.get_links("alix", &q, Pagination::default()).unwrap();
        assert!(links.iter().all(|l| l.title != "Hidden"), "query {input:?}");
        assert_eq!(searcher.count_links("alix", &q).unwrap(), links.len());
    }

    let links = searcher
        .get_links("alix", &query("#tag"), Pagination::default())
        .unwrap();
    assert_eq!(titles(&links), vec!["No collection", "Hidden too"]);
}

#[test]
fn test_search_is_scoped_to_owner() {
    let store = MemoryStore::default();
    add(&store, "alix", "Shared title", "https://a.com", &[], &[CollectionKind::Bookmarks], 1);
    add(&store, "dominique", "Shared title", "https://b.com", &[], &[CollectionKind::Bookmarks], 2);

    let searcher = LinksSearcher::new(&store);
    let links = searcher
        .get_links("alix", &query("shared"), Pagination::default())
        .unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].user_id, "alix");
    assert_eq!(searcher.count_links("nobody", &query("shared")).unwrap(), 0);
}

#[test]
fn test_search_order_and_pagination() {
    let store = MemoryStore::default();
    add(&store, "alix", "a", "https://a.com", &[], &[CollectionKind::News], 1);
    add(&store, "alix", "b", "https://b.com", &[], &[CollectionKind::News], 3);
    add(&store, "alix", "c", "https://c.com", &[], &[CollectionKind::News], 2);
    add(&store, "alix", "d", "https://d.com", &[], &[CollectionKind::News], 3);

    let searcher = LinksSearcher::new(&store);
    let all = searcher
        .get_links("alix", &Query::default(), Pagination::default())
        .unwrap();
    // newest first, ids break ties
    assert_eq!(titles(&all), vec!["b", "d", "c", "a"]);

    let page = searcher
        .get_links(
            "alix",
            &Query::default(),
            Pagination {
                offset: 1,
                limit: Some(2),
            },
        )
        .unwrap();
    assert_eq!(titles(&page), vec!["d", "c"]);

    let page = searcher
        .get_links(
            "alix",
            &Query::default(),
            Pagination {
                offset: 10,
                limit: None,
            },
        )
        .unwrap();
    assert!(page.is_empty());

    // count ignores pagination
    assert_eq!(searcher.count_links("alix", &Query::default()).unwrap(), 4);
}

#[test]
fn test_string_entry_points() {
    let store = MemoryStore::default();
    add(&store, "alix", "Flus", "https://flus.fr", &["news"], &[CollectionKind::Bookmarks], 1);

    let searcher = LinksSearcher::new(&store);
    let links = searcher
        .get_links_str("alix", "url: flus #news", Pagination::default())
        .unwrap();
    assert_eq!(titles(&links), vec!["Flus"]);
    assert_eq!(searcher.count_links_str("alix", "-#news").unwrap(), 0);
}

struct FailingStore;

impl LinkStore for FailingStore {
    fn search(&self, _: &str, _: &LinkFilter, _: Pagination) -> anyhow::Result<Vec<Link>> {
        anyhow::bail!("database is down")
    }

    fn count(&self, _: &str, _: &LinkFilter) -> anyhow::Result<usize> {
        anyhow::bail!("database is down")
    }
}

#[test]
fn test_store_errors_propagate() {
    let searcher = LinksSearcher::new(&FailingStore);
    let err = searcher
        .get_links("alix", &Query::default(), Pagination::default())
        .unwrap_err();
    assert!(matches!(err, SearchError::Store(_)));
    assert!(matches!(
        searcher.count_links("alix", &Query::default()),
        Err(SearchError::Store(_))
    ));
}

struct RecordingStore {
    filters: std::sync::Mutex<Vec<LinkFilter>>,
}

impl LinkStore for RecordingStore {
    fn search(&self, _: &str, filter: &LinkFilter, _: Pagination) -> anyhow::Result<Vec<Link>> {
        self.filters.lock().unwrap().push(filter.clone());
        Ok(vec![])
    }

    fn count(&self, _: &str, filter: &LinkFilter) -> anyhow::Result<usize> {
        self.filters.lock().unwrap().push(filter.clone());
        Ok(0)
    }
}

#[test]
fn test_literal_fallback_keeps_valid_queries() {
    let store = RecordingStore {
        filters: Default::default(),
    };

    let searcher = LinksSearcher::new(&store).with_literal_fallback(true);
    searcher.count_links_str("alix", "foo #bar").unwrap();

    let filters = store.filters.lock().unwrap();
    assert_eq!(filters[0].text.as_deref(), Some("foo"));
    assert_eq!(filters[0].required_tags, vec!["bar".to_string()]);
}

fn dangling_not() -> Vec<Token> {
    vec![
        Token::new(TokenKind::Not, 0),
        Token::new(TokenKind::EndOfQuery, 2),
    ]
}

#[test]
fn test_literal_fallback_on_unparsable_tokens() {
    let store = MemoryStore::default();
    let searcher = LinksSearcher::new(&store).with_literal_fallback(true);

    let query = searcher.parse_tokens("  - rust ", &dangling_not()).unwrap();
    assert_eq!(query, Query::literal("- rust"));
}

#[test]
fn test_unparsable_tokens_without_fallback() {
    let store = MemoryStore::default();
    let searcher = LinksSearcher::new(&store);

    let err = searcher.parse_tokens("-", &dangling_not()).unwrap_err();
    assert!(matches!(
        err,
        SearchError::Query(ParseError::UnexpectedToken { position: 2, .. })
    ));
}
