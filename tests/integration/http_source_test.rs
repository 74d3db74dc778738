// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{item_names, items_table};
use metacrawl::domain::models::entity_type::EntityType;
use metacrawl::engines::fallback_chain::SourceFallbackChain;
use metacrawl::engines::http_source::HttpSource;
use metacrawl::engines::source_profile::{SourceCatalog, SourceDefinition};
use metacrawl::engines::traits::{ExtractionError, ExtractionSource};
use metacrawl::utils::retry_policy::RetryPolicy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, Respond, ResponseTemplate};

/// 不带查询参数的请求
struct NoQuery;

impl Match for NoQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query().is_none()
    }
}

/// 前 `failures` 次返回 503，之后返回固定页面
struct Flaky {
    failures: usize,
    calls: Arc<AtomicUsize>,
    body: String,
}

impl Respond for Flaky {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            ResponseTemplate::new(503)
        } else {
            ResponseTemplate::new(200).set_body_string(self.body.clone())
        }
    }
}

fn definition(base: &str, route: &str, paginated: bool) -> SourceDefinition {
    let pagination = if paginated {
        "    pagination: { page_param: page, max_pages: 5 }\n"
    } else {
        ""
    };
    let yaml = format!(
        r#"
sources:
  - name: mirror-items
    kind: http
    entity: items
    url: {base}{route}
{pagination}    schema:
      row: "table.items tbody tr"
      fields:
        name: "td.name"
        icon_url: {{ selector: "td.name img", attr: src }}
        avg_placement: "td.avg"
"#
    );
    let catalog = SourceCatalog::from_yaml_str(&yaml).unwrap();
    catalog.for_entity(EntityType::Items)[0].clone()
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(10))
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(body)
}

#[tokio::test]
async fn test_http_source_follows_page_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(NoQuery)
        .respond_with(html(items_table(item_names(0..5))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "2"))
        .respond_with(html(items_table(item_names(5..9))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "3"))
        .respond_with(html(items_table(Vec::new())))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpSource::new(
        definition(&server.uri(), "/items", true),
        fast_retry(),
        Duration::from_secs(5),
    )
    .unwrap();
    let records = source.fetch(EntityType::Items).await.unwrap();

    assert_eq!(records.len(), 9);
    assert_eq!(records[0].text("name"), Some("Item0"));
    assert_eq!(records[8].text("name"), Some("Item8"));
    assert_eq!(
        records[0].text("icon_url"),
        Some(format!("{}/icons/Item0.png", server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_http_source_retries_server_errors() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicUsize::new(0));
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(Flaky {
            failures: 2,
            calls: calls.clone(),
            body: items_table(item_names(0..12)),
        })
        .mount(&server)
        .await;

    let source = HttpSource::new(
        definition(&server.uri(), "/items", false),
        fast_retry(),
        Duration::from_secs(5),
    )
    .unwrap();
    let records = source.fetch(EntityType::Items).await.unwrap();

    assert_eq!(records.len(), 12);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_http_source_gives_up_after_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let source = HttpSource::new(
        definition(&server.uri(), "/items", false),
        fast_retry(),
        Duration::from_secs(5),
    )
    .unwrap();
    let error = source.fetch(EntityType::Items).await.unwrap_err();

    assert!(matches!(error, ExtractionError::Http(_)));
}

#[tokio::test]
async fn test_chain_reports_every_failed_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/primary"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mirror"))
        .respond_with(html(items_table(Vec::new())))
        .mount(&server)
        .await;

    let mut primary = definition(&server.uri(), "/primary", false);
    primary.name = "primary-items".to_string();
    let mut mirror = definition(&server.uri(), "/mirror", false);
    mirror.priority = 5;

    let source = |definition| {
        Arc::new(HttpSource::new(definition, RetryPolicy::none(), Duration::from_secs(5)).unwrap())
            as Arc<dyn ExtractionSource>
    };
    let chain = SourceFallbackChain::new(
        EntityType::Items,
        vec![source(primary), source(mirror)],
        10,
    );

    match chain.run().await {
        Err(ExtractionError::AllSourcesFailed { entity, failures }) => {
            assert_eq!(entity, EntityType::Items);
            assert_eq!(failures.len(), 2);
            assert!(failures[0].starts_with("primary-items"));
            assert!(failures[1].starts_with("mirror-items"));
        }
        other => panic!("expected AllSourcesFailed, got {:?}", other.map(|r| r.records.len())),
    }
}
