use serde_json::{Value, json};
use std::time::Duration;

use scout::paginator::search_pages;
use scout::{
    ClientConfig, EntityType, Paginator, ProductType, SearchClient, SearchError, SearchRequest,
};

mod test_helpers {
    use super::*;
    use axum::extract::{RawQuery, State};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Router, serve};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    type Reply = dyn Fn(usize, &Value) -> (StatusCode, String) + Send + Sync;

    /// In-process stand-in for the gateway that records what it was sent.
    #[derive(Clone)]
    pub struct FakeGateway {
        hits: Arc<AtomicUsize>,
        bodies: Arc<Mutex<Vec<Value>>>,
        query_strings: Arc<Mutex<Vec<Option<String>>>>,
        delay: Duration,
        reply: Arc<Reply>,
    }

    impl FakeGateway {
        pub fn new<F>(reply: F) -> Self
        where
            F: Fn(usize, &Value) -> (StatusCode, String) + Send + Sync + 'static,
        {
            FakeGateway {
                hits: Arc::new(AtomicUsize::new(0)),
                bodies: Arc::new(Mutex::new(Vec::new())),
                query_strings: Arc::new(Mutex::new(Vec::new())),
                delay: Duration::ZERO,
                reply: Arc::new(reply),
            }
        }

        /// Always answers 200 with the given JSON.
        pub fn json(body: Value) -> Self {
            Self::new(move |_, _| (StatusCode::OK, body.to_string()))
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }

        pub fn body(&self, call: usize) -> Value {
            self.bodies.lock().unwrap()[call].clone()
        }

        pub fn query_string(&self, call: usize) -> Option<String> {
            self.query_strings.lock().unwrap()[call].clone()
        }

        /// Wire cursor of the first request in the given call.
        pub fn sent_cursor(&self, call: usize) -> Value {
            self.body(call)[0]["variables"]["requests"][0]["cursor"].clone()
        }

        /// Serves on an ephemeral port and returns a client pointed at it.
        pub async fn start(&self, timeout: Duration) -> SearchClient {
            let app = Router::new()
                .route("/graphql-gateway", post(handle))
                .with_state(self.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                serve(listener, app).await.unwrap();
            });

            let config = ClientConfig::default()
                .with_endpoint(format!("http://{addr}/graphql-gateway"))
                .with_timeout(timeout);
            SearchClient::new(config).unwrap()
        }
    }

    async fn handle(
        State(gateway): State<FakeGateway>,
        RawQuery(query): RawQuery,
        body: String,
    ) -> (StatusCode, String) {
        let call = gateway.hits.fetch_add(1, Ordering::SeqCst);
        let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        gateway.bodies.lock().unwrap().push(parsed.clone());
        gateway.query_strings.lock().unwrap().push(query);
        if !gateway.delay.is_zero() {
            tokio::time::sleep(gateway.delay).await;
        }
        (gateway.reply)(call, &parsed)
    }

    pub fn product_hit(id: &str, name: &str) -> Value {
        json!({
            "__typename": "Search_ProductHit",
            "id": id,
            "name": name,
            "productType": "COURSE",
            "isCourseFree": true,
            "isPartOfCourseraPlus": true,
            "skills": ["Python Programming"],
            "partners": ["University of Michigan"],
            "avgProductRating": 4.8,
            "numProductRatings": 229341,
            "url": "/learn/python"
        })
    }

    pub fn result(elements: Vec<Value>, cursor: Option<&str>, index: &str) -> Value {
        json!({
            "elements": elements,
            "facets": [{
                "name": "language",
                "nameDisplay": "Language",
                "valuesAndCounts": [{"value": "English", "count": 812, "valueDisplay": "English"}]
            }],
            "pagination": {"cursor": cursor, "totalElements": 812},
            "totalPages": 82,
            "source": {"indexName": index, "recommender": null}
        })
    }

    pub fn envelope(results: Vec<Value>) -> Value {
        json!([{"data": {"SearchResult": {"search": results}}}])
    }

    pub const PRODUCTS_INDEX: &str = "prod_all_launched_products_term_optimization";
    pub const SUGGESTIONS_INDEX: &str = "test_suggestions";
    pub const TIMEOUT: Duration = Duration::from_secs(5);
}

use test_helpers::*;

#[tokio::test]
async fn python_search_end_to_end() {
    let gateway = FakeGateway::json(envelope(vec![result(
        vec![product_hit("abc", "Python for Everybody")],
        Some("10"),
        PRODUCTS_INDEX,
    )]));
    let client = gateway.start(TIMEOUT).await;

    let outcomes = client
        .search(&[SearchRequest::products("python", 10)])
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    let response = outcomes[0].as_ref().unwrap();
    let hit = response.products().next().unwrap();
    assert_eq!(hit.id, "abc");
    assert_eq!(hit.name, "Python for Everybody");
    assert_eq!(hit.product_type, ProductType::Course);
    assert!(hit.is_course_free);
    assert_eq!(response.source, PRODUCTS_INDEX);
    assert_eq!(response.facets[0].values[0].count, 812);

    assert_eq!(gateway.hits(), 1);
    assert_eq!(gateway.query_string(0).as_deref(), Some("opname=Search"));
    let body = gateway.body(0);
    assert_eq!(body[0]["operationName"], "Search");
    assert_eq!(body[0]["query"], scout::query::SEARCH_DOCUMENT);
    assert_eq!(
        body[0]["variables"]["requests"][0],
        json!({
            "entityType": "PRODUCTS",
            "limit": 10,
            "disableRecommender": true,
            "maxValuesPerFacet": 1000,
            "facetFilters": [],
            "cursor": "0",
            "query": "python"
        })
    );
}

#[tokio::test]
async fn batch_keeps_length_and_entity_order() {
    let gateway = FakeGateway::json(envelope(vec![
        result(vec![product_hit("abc", "Python for Everybody")], Some("10"), PRODUCTS_INDEX),
        result(
            vec![json!({"__typename": "Search_SuggestionHit", "id": "s1", "name": "python", "score": 12.5})],
            None,
            SUGGESTIONS_INDEX,
        ),
    ]));
    let client = gateway.start(TIMEOUT).await;

    let requests = [
        SearchRequest::products("python", 10),
        SearchRequest::suggestions("python", 7),
    ];
    let outcomes = client.search(&requests).await.unwrap();

    assert_eq!(outcomes.len(), requests.len());
    let kinds: Vec<EntityType> = outcomes
        .iter()
        .map(|o| o.as_ref().unwrap().entity_type)
        .collect();
    assert_eq!(kinds, vec![EntityType::Products, EntityType::Suggestions]);
    assert_eq!(outcomes[1].as_ref().unwrap().suggestions().next().unwrap().name, "python");

    let sent = &gateway.body(0)[0]["variables"]["requests"];
    assert_eq!(sent[0]["entityType"], "PRODUCTS");
    assert_eq!(sent[1]["entityType"], "SUGGESTIONS");
    assert_eq!(sent[1]["limit"], 7);
}

#[tokio::test]
async fn graphql_errors_surface_every_message() {
    let gateway = FakeGateway::json(json!([{
        "errors": [
            {"message": "Cannot query field \"searchV3\" on type \"Query\".", "locations": [{"line": 3, "column": 11}]},
            {"message": "Unknown type \"Search_Request\"."}
        ]
    }]));
    let client = gateway.start(TIMEOUT).await;

    let err = client
        .search(&[SearchRequest::products("python", 10)])
        .await
        .unwrap_err();
    match err {
        SearchError::GraphQL(errors) => {
            let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
            assert_eq!(
                messages,
                vec![
                    "Cannot query field \"searchV3\" on type \"Query\".",
                    "Unknown type \"Search_Request\"."
                ]
            );
            assert_eq!(errors[0].locations[0].line, 3);
        }
        other => panic!("expected GraphQL error, got {other:?}"),
    }
    assert_eq!(gateway.hits(), 1);
}

#[tokio::test]
async fn server_error_is_transport_without_retry() {
    let gateway = FakeGateway::new(|_, _| {
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "upstream connect error".to_string(),
        )
    });
    let client = gateway.start(TIMEOUT).await;

    let err = client
        .search(&[SearchRequest::products("python", 10)])
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Transport { status: Some(500), .. }), "{err:?}");
    assert_eq!(gateway.hits(), 1);
}

#[tokio::test]
async fn timeout_is_transport_without_retry() {
    let gateway = FakeGateway::json(envelope(vec![])).with_delay(Duration::from_secs(3));
    let client = gateway.start(Duration::from_millis(200)).await;

    let err = client
        .search(&[SearchRequest::products("python", 10)])
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "{err:?}");
    assert!(matches!(err, SearchError::Transport { .. }));
    assert_eq!(gateway.hits(), 1);
}

#[tokio::test]
async fn unreachable_gateway_is_transport() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = SearchClient::new(
        ClientConfig::default()
            .with_endpoint(format!("http://{addr}/graphql-gateway"))
            .with_timeout(TIMEOUT),
    )
    .unwrap();
    let err = client
        .search(&[SearchRequest::products("python", 10)])
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Transport { status: None, .. }), "{err:?}");
}

#[tokio::test]
async fn validation_happens_before_any_call() {
    let gateway = FakeGateway::json(envelope(vec![]));
    let client = gateway.start(TIMEOUT).await;

    let err = client.search(&[]).await.unwrap_err();
    assert!(matches!(err, SearchError::Validation(_)));
    let err = client
        .search(&[SearchRequest::products("python", 0)])
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Validation(_)));
    assert_eq!(gateway.hits(), 0);
}

#[tokio::test]
async fn malformed_result_does_not_drop_its_neighbour() {
    let mut broken = result(vec![], None, SUGGESTIONS_INDEX);
    broken.as_object_mut().unwrap().remove("elements");
    let gateway = FakeGateway::json(envelope(vec![
        result(vec![product_hit("abc", "Python for Everybody")], Some("10"), PRODUCTS_INDEX),
        broken,
    ]));
    let client = gateway.start(TIMEOUT).await;

    let outcomes = client
        .search(&[
            SearchRequest::products("python", 10),
            SearchRequest::suggestions("python", 7),
        ])
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    let products: Vec<_> = outcomes[0].as_ref().unwrap().products().collect();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, "abc");
    assert_eq!(outcomes[1].as_ref().unwrap_err().index, 1);
}

#[tokio::test]
async fn next_page_sends_returned_cursor_verbatim() {
    let gateway = FakeGateway::new(|call, _| {
        let cursor = if call == 0 { Some("10") } else { None };
        (
            axum::http::StatusCode::OK,
            envelope(vec![result(
                vec![product_hit(&format!("p{call}"), "Python")],
                cursor,
                PRODUCTS_INDEX,
            )])
            .to_string(),
        )
    });
    let client = gateway.start(TIMEOUT).await;

    let first = SearchRequest::products("python", 10);
    let outcomes = client.search(std::slice::from_ref(&first)).await.unwrap();
    let page = outcomes[0].as_ref().unwrap();
    assert_eq!(page.pagination.cursor.as_deref(), Some("10"));
    assert!(page.has_more());

    let second = page.next_request(&first).unwrap();
    client.search(&[second]).await.unwrap();

    assert_eq!(gateway.sent_cursor(0), json!("0"));
    assert_eq!(gateway.sent_cursor(1), json!("10"));
}

#[tokio::test]
async fn paginator_stops_when_cursor_is_echoed() {
    // Answers every page with the same cursor, as the gateway does when it
    // starts returning empty pages.
    let gateway = FakeGateway::new(|_, _| {
        (
            axum::http::StatusCode::OK,
            envelope(vec![result(vec![], Some("10"), PRODUCTS_INDEX)]).to_string(),
        )
    });
    let client = gateway.start(TIMEOUT).await;

    let pages = Paginator::new(&client, SearchRequest::products("python", 10), 50)
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert_eq!(pages.len(), 2);
    assert!(!pages[1].has_more());
    assert_eq!(gateway.hits(), 2);
}

#[tokio::test]
async fn paginator_respects_page_cap() {
    let gateway = FakeGateway::new(|call, _| {
        let next = ((call + 1) * 10).to_string();
        (
            axum::http::StatusCode::OK,
            envelope(vec![result(
                vec![product_hit(&format!("p{call}"), "Python")],
                Some(next.as_str()),
                PRODUCTS_INDEX,
            )])
            .to_string(),
        )
    });
    let client = gateway.start(TIMEOUT).await;

    let mut paginator = Paginator::new(&client, SearchRequest::products("python", 10), 3).unwrap();
    let mut ids = Vec::new();
    while let Some(page) = paginator.next_page().await.unwrap() {
        ids.extend(page.products().map(|p| p.id.clone()));
    }

    assert_eq!(ids, vec!["p0", "p1", "p2"]);
    assert_eq!(paginator.pages_fetched(), 3);
    assert_eq!(gateway.hits(), 3);
    assert_eq!(gateway.sent_cursor(0), json!("0"));
    assert_eq!(gateway.sent_cursor(1), json!("10"));
    assert_eq!(gateway.sent_cursor(2), json!("20"));
}

#[tokio::test]
async fn paginator_surfaces_decode_failure() {
    let gateway = FakeGateway::json(envelope(vec![json!({"facets": []})]));
    let client = gateway.start(TIMEOUT).await;

    let mut paginator = Paginator::new(&client, SearchRequest::products("python", 10), 5).unwrap();
    let err = paginator.next_page().await.unwrap_err();
    assert!(matches!(err, SearchError::Decode(ref d) if d.index == 0), "{err:?}");
}

#[tokio::test]
async fn paginator_retries_same_cursor_after_failure() {
    let gateway = FakeGateway::new(|call, _| match call {
        0 => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "upstream overloaded".to_string(),
        ),
        _ => (
            axum::http::StatusCode::OK,
            envelope(vec![result(
                vec![product_hit("abc", "Python for Everybody")],
                None,
                PRODUCTS_INDEX,
            )])
            .to_string(),
        ),
    });
    let client = gateway.start(TIMEOUT).await;

    let mut paginator = Paginator::new(&client, SearchRequest::products("python", 10), 5).unwrap();
    let err = paginator.next_page().await.unwrap_err();
    assert!(matches!(err, SearchError::Transport { status: Some(503), .. }), "{err:?}");
    assert_eq!(paginator.pages_fetched(), 0);

    let page = paginator
        .next_page()
        .await
        .unwrap()
        .expect("retry should fetch the page, not end pagination");
    assert_eq!(page.products().next().unwrap().id, "abc");
    assert_eq!(gateway.hits(), 2);
    assert_eq!(gateway.sent_cursor(0), json!("0"));
    assert_eq!(gateway.sent_cursor(1), json!("0"));

    assert!(paginator.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn suggestions_ride_along_with_first_page_only() {
    let gateway = FakeGateway::new(|call, body| {
        let sent = body[0]["variables"]["requests"].as_array().map_or(0, Vec::len);
        let next = ((call + 1) * 10).to_string();
        let mut results = vec![result(
            vec![product_hit(&format!("p{call}"), "Python")],
            Some(next.as_str()),
            PRODUCTS_INDEX,
        )];
        if sent > 1 {
            results.push(result(
                vec![json!({"__typename": "Search_SuggestionHit", "id": "s1", "name": "python"})],
                None,
                SUGGESTIONS_INDEX,
            ));
        }
        (axum::http::StatusCode::OK, envelope(results).to_string())
    });
    let client = gateway.start(TIMEOUT).await;

    let requests = [
        SearchRequest::products("python", 10),
        SearchRequest::suggestions("python", 7),
    ];
    let outcomes = search_pages(&client, &requests, 3).await.unwrap();

    let kinds: Vec<EntityType> = outcomes
        .iter()
        .map(|o| o.as_ref().unwrap().entity_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            EntityType::Products,
            EntityType::Products,
            EntityType::Products,
            EntityType::Suggestions
        ]
    );
    let ids: Vec<String> = outcomes[..3]
        .iter()
        .flat_map(|o| o.as_ref().unwrap().products().map(|p| p.id.clone()))
        .collect();
    assert_eq!(ids, vec!["p0", "p1", "p2"]);

    assert_eq!(gateway.hits(), 3);
    assert_eq!(gateway.body(0)[0]["variables"]["requests"].as_array().unwrap().len(), 2);
    assert_eq!(gateway.body(1)[0]["variables"]["requests"].as_array().unwrap().len(), 1);
    assert_eq!(gateway.sent_cursor(1), json!("10"));
    assert_eq!(gateway.sent_cursor(2), json!("20"));
}

#[tokio::test]
async fn single_page_search_makes_one_call() {
    let gateway = FakeGateway::json(envelope(vec![result(
        vec![product_hit("abc", "Python for Everybody")],
        Some("10"),
        PRODUCTS_INDEX,
    )]));
    let client = gateway.start(TIMEOUT).await;

    let outcomes = search_pages(&client, &[SearchRequest::products("python", 10)], 1)
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(gateway.hits(), 1);
}
