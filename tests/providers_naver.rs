// tests/providers_naver.rs
use keyword_newsbot::ingest::providers::naver_api::NaverNewsProvider;
use keyword_newsbot::ingest::providers::FallbackSearch;
use keyword_newsbot::SearchProvider;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> NaverNewsProvider {
    NaverNewsProvider::new("id-123".into(), "secret-456".into())
        .with_endpoint(format!("{}/v1/search/news.json", server.uri()))
        .with_min_interval(Duration::ZERO)
}

fn body() -> serde_json::Value {
    json!({
        "lastBuildDate": "Sat, 06 Sep 2025 18:00:00 +0900",
        "total": 2,
        "start": 1,
        "display": 2,
        "items": [
            {
                "title": "<b>한국투자증권</b>, 해외주식 수수료 인하",
                "originallink": "https://press.example/1",
                "link": "https://n.news.naver.com/mnews/article/001/1",
                "description": "&quot;고객 혜택&quot; 확대",
                "pubDate": "Sat, 06 Sep 2025 17:40:00 +0900"
            },
            {
                "title": "두 번째",
                "originallink": "",
                "link": "https://n.news.naver.com/mnews/article/001/2",
                "description": "",
                "pubDate": "Sat, 06 Sep 2025 17:10:00 +0900"
            }
        ]
    })
}

#[tokio::test]
async fn sends_credentials_and_caps_display() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search/news.json"))
        .and(header("X-Naver-Client-Id", "id-123"))
        .and(header("X-Naver-Client-Secret", "secret-456"))
        .and(query_param("query", "한국투자증권"))
        .and(query_param("display", "100"))
        .and(query_param("sort", "date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body()))
        .expect(1)
        .mount(&server)
        .await;

    let items = provider(&server)
        .search("한국투자증권", 250)
        .await
        .expect("search ok");

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].identity, "https://press.example/1");
    assert_eq!(items[0].title, "한국투자증권, 해외주식 수수료 인하");
    assert_eq!(items[0].description, r#""고객 혜택" 확대"#);
    assert_eq!(
        items[0].published_at.unwrap().to_rfc3339(),
        "2025-09-06T08:40:00+00:00"
    );
    assert_eq!(items[1].identity, "https://n.news.naver.com/mnews/article/001/2");
}

#[tokio::test]
async fn auth_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errorMessage": "Authentication failed",
            "errorCode": "024"
        })))
        .mount(&server)
        .await;

    assert!(provider(&server).search("x", 10).await.is_err());
}

#[tokio::test]
async fn fallback_used_when_primary_fails() {
    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken)
        .await;
    let healthy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body()))
        .mount(&healthy)
        .await;

    let search = FallbackSearch::new(Box::new(provider(&broken)), Box::new(provider(&healthy)));
    let items = search.search("한국투자증권", 20).await.expect("fallback ok");

    assert_eq!(items.len(), 2);
}
