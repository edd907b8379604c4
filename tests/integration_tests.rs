use std::sync::Arc;

use news_reader::controller::{FeedController, FeedKind, FeedPhase, LoadMoreOutcome, SearchController};
use news_reader::news::client::NewsClient;
use news_reader::news::Article;
use news_reader::storage::{
    ArticleStore, FileArticleStore, MemoryArticleStore, NewsRepository, Repository,
    CATEGORY_TOP_HEADLINES,
};
use news_reader::Error;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use test_data::*;

/// End-to-end tests running the real HTTP client, repository and stores
/// against a mock news service.

fn client_for(server: &MockServer) -> Arc<NewsClient> {
    Arc::new(
        NewsClient::new(server.uri())
            .unwrap()
            .with_api_key("test-key"),
    )
}

fn file_repository(server: &MockServer, cache_dir: &TempDir) -> Repository {
    let store = FileArticleStore::open(cache_dir.path()).unwrap();
    Repository::new(client_for(server), Arc::new(store))
}

async fn mount_headlines(server: &MockServer, page: u32, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

async fn mount_outage(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_json(error_body("unexpectedError", "Service unavailable")))
        .mount(server)
        .await;
}

fn titles(articles: &[Article]) -> Vec<String> {
    articles.iter().map(|a| a.title.clone()).collect()
}

#[tokio::test]
async fn test_page_one_is_cached_and_served_during_outage() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    let repo = file_repository(&server, &cache_dir);

    mount_headlines(&server, 1, ok_body("top", 20)).await;
    let online = repo.get_top_headlines("us", 1, 20).await.unwrap();
    assert_eq!(online.len(), 20);

    mount_outage(&server).await;
    let offline = repo.get_top_headlines("us", 1, 20).await.unwrap();

    assert_eq!(titles(&offline), titles(&online));
    assert_eq!(repo.stats().fallbacks_served, 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_cache_survives_restart() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();

    {
        let repo = file_repository(&server, &cache_dir);
        mount_headlines(&server, 1, ok_body("top", 20)).await;
        repo.get_top_headlines("us", 1, 20).await.unwrap();
    }

    // A fresh process with the service unreachable
    let client = NewsClient::new("http://127.0.0.1:9").unwrap();
    let store = FileArticleStore::open(cache_dir.path()).unwrap();
    let repo = Arc::new(Repository::new(Arc::new(client), Arc::new(store)));

    let feed = FeedController::new(repo, FeedKind::headlines("us"), 20);
    let state = feed.load().await;

    assert!(state.last_error.is_none());
    assert_eq!(state.items.len(), 20);
    assert_eq!(state.items[0].title, "top 0");
    assert_eq!(state.phase, FeedPhase::Loaded);
}

#[tokio::test]
async fn test_newer_page_one_replaces_cache() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    let repo = file_repository(&server, &cache_dir);

    mount_headlines(&server, 1, ok_body("morning", 20)).await;
    repo.get_top_headlines("us", 1, 20).await.unwrap();
    mount_headlines(&server, 1, ok_body("evening", 3)).await;
    repo.get_top_headlines("us", 1, 20).await.unwrap();

    let cached = repo.cached_top_headlines().await.unwrap();
    assert_eq!(titles(&cached), vec!["evening 0", "evening 1", "evening 2"]);
}

#[tokio::test]
async fn test_outage_without_cache_is_an_error() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    let repo = file_repository(&server, &cache_dir);

    mount_outage(&server).await;
    let result = repo.get_top_headlines("us", 1, 20).await;

    match result {
        Err(Error::Network(message)) => {
            assert!(message.contains("503"));
            assert!(message.contains("Service unavailable"));
        }
        other => panic!("expected network error, got {:?}", other),
    }
    assert_eq!(repo.stats().fallback_misses, 1);
}

#[tokio::test]
async fn test_later_pages_never_fall_back() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    let repo = file_repository(&server, &cache_dir);

    mount_headlines(&server, 1, ok_body("top", 20)).await;
    repo.get_top_headlines("us", 1, 20).await.unwrap();

    mount_outage(&server).await;
    assert!(repo.get_top_headlines("us", 2, 20).await.is_err());

    // Page 2 never touches the cache
    let cached = repo.cached_top_headlines().await.unwrap();
    assert_eq!(cached.len(), 20);
    assert_eq!(cached[0].title, "top 0");
}

#[tokio::test]
async fn test_search_is_not_cached() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryArticleStore::default());
    let repo = Repository::new(client_for(&server), store.clone());

    Mock::given(method("GET"))
        .and(path("/everything"))
        .and(query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("rust", 4)))
        .mount(&server)
        .await;

    let request = news_reader::news::SearchRequest::new("rust");
    assert_eq!(repo.search_news(&request).await.unwrap().len(), 4);
    assert!(store.categories().await.unwrap().is_empty());
    assert!(store.read_category(CATEGORY_TOP_HEADLINES).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_headlines_feed_paginates_then_recycles() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    let repo = Arc::new(file_repository(&server, &cache_dir));

    mount_headlines(&server, 1, ok_body("first", 20)).await;
    mount_headlines(&server, 2, ok_body("second", 5)).await;

    let feed = FeedController::new(repo, FeedKind::headlines("us"), 20);

    let state = feed.load().await;
    assert_eq!(state.items.len(), 20);
    assert!(state.has_more);

    assert_eq!(feed.load_more().await, LoadMoreOutcome::Appended(5));
    let state = feed.state();
    assert_eq!(state.items.len(), 25);
    assert_eq!(state.current_page, 2);
    assert!(!state.has_more);

    assert_eq!(feed.load_more().await, LoadMoreOutcome::Recycled(20));
    let state = feed.state();
    assert_eq!(state.items.len(), 45);
    assert_eq!(state.items[25].title, "first 0");

    // Recycling is local
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_feed_requests_carry_expected_parameters() {
    let server = MockServer::start().await;
    let repo = Arc::new(Repository::with_memory_store(client_for(&server)));

    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .and(query_param("country", "gb"))
        .and(query_param("pageSize", "10"))
        .and(header("X-Api-Key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("uk", 10)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/everything"))
        .and(query_param("q", "Indonesia"))
        .and(query_param("sortBy", "publishedAt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("jakarta", 7)))
        .expect(1)
        .mount(&server)
        .await;

    let headlines = FeedController::new(Arc::clone(&repo), FeedKind::headlines("gb"), 10);
    let regional = FeedController::new(repo, FeedKind::regional("Indonesia"), 10);

    assert_eq!(headlines.load().await.items.len(), 10);
    let regional_state = regional.load().await;
    assert_eq!(regional_state.items.len(), 7);
    assert!(!regional_state.has_more);

    server.verify().await;
}

#[tokio::test]
async fn test_failed_load_more_keeps_items() {
    let server = MockServer::start().await;
    let repo = Arc::new(Repository::with_memory_store(client_for(&server)));

    mount_headlines(&server, 1, ok_body("top", 20)).await;
    let feed = FeedController::new(repo, FeedKind::headlines("us"), 20);
    feed.load().await;

    mount_outage(&server).await;
    assert_eq!(feed.load_more().await, LoadMoreOutcome::Failed);

    let state = feed.state();
    assert_eq!(state.items.len(), 20);
    assert_eq!(state.current_page, 1);
    assert!(!state.is_loading_more);
    assert!(state.last_error.is_none());
}

#[tokio::test]
async fn test_search_controller_against_service() {
    let server = MockServer::start().await;
    let repo = Arc::new(Repository::with_memory_store(client_for(&server)));

    Mock::given(method("GET"))
        .and(path("/everything"))
        .and(query_param("q", "climate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("climate", 20)))
        .mount(&server)
        .await;

    let search = SearchController::new(repo, 20);
    let state = search.search("climate").await.unwrap();
    assert_eq!(state.items.len(), 20);
    assert!(state.has_more);

    search.clear();
    assert!(!search.is_active());
    assert!(search.query().is_empty());
}

#[tokio::test]
async fn test_api_error_status_is_reported() {
    let server = MockServer::start().await;
    let repo = Repository::with_memory_store(client_for(&server));

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(error_body("apiKeyInvalid", "Your API key is invalid")))
        .mount(&server)
        .await;

    match repo.get_top_headlines("us", 1, 20).await {
        Err(Error::Api { code, message }) => {
            assert_eq!(code, "apiKeyInvalid");
            assert_eq!(message, "Your API key is invalid");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_fields_become_empty_strings() {
    let server = MockServer::start().await;
    let repo = Repository::with_memory_store(client_for(&server));

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(SPARSE_ARTICLE_BODY)
                .insert_header("content-type", "application/json"),
        )
        .mount(&server)
        .await;

    let articles = repo.get_top_headlines("us", 1, 20).await.unwrap();
    assert_eq!(articles.len(), 1);

    let article = &articles[0];
    assert_eq!(article.title, "Only a title");
    assert_eq!(article.source_id, "");
    assert_eq!(article.source_name, "");
    assert_eq!(article.url, "");
    assert_eq!(article.published_at, "");
}
