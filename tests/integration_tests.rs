//! Integration tests exercising the HTTP store, the navigator, and the
//! transfer engine together against a mock index server.

use litfetch::models::SearchQuery;
use litfetch::store::RecordStore;
use litfetch::transfer::TransferEngine;
use litfetch::{HttpStore, Navigator};

/// JSON body of one search response page
fn page_body(page_index: u32, page_count: u32, titles: &[&str]) -> String {
    let records: Vec<serde_json::Value> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            serde_json::json!({
                "instance": format!("cjfd:P{}R{}", page_index, i),
                "rdfType": "literature",
                "data": [
                    {"rdfProperty": "dc:title", "lang": "zh", "colName": "题名", "value": title},
                    {"rdfProperty": "dc:creator", "lang": "zh", "colName": "作者", "value": "Zhang San"}
                ]
            })
        })
        .collect();

    serde_json::json!({
        "store": records,
        "pageSize": titles.len(),
        "pageIndex": page_index,
        "pageCount": page_count,
        "recordCount": 12
    })
    .to_string()
}

#[tokio::test]
async fn test_navigation_over_http_caches_pages() {
    let mut server = mockito::Server::new_async().await;

    // Page 1 requests carry no page parameter, so their query string ends
    // with the order field; page 2 requests end with "page=2".
    let page1 = server
        .mock("GET", "/data/literatures")
        .match_header("authorization", "Bearer test-token")
        .match_query(mockito::Matcher::Regex("desc$".into()))
        .with_status(200)
        .with_body(page_body(1, 2, &["first title", "second title"]))
        .expect(1)
        .create_async()
        .await;
    let page2 = server
        .mock("GET", "/data/literatures")
        .match_query(mockito::Matcher::Regex("page=2$".into()))
        .with_status(200)
        .with_body(page_body(2, 2, &["third title"]))
        .expect(1)
        .create_async()
        .await;

    let store = HttpStore::new(server.url(), "test-token").unwrap();
    let mut navigator = Navigator::new(store);

    let first = navigator
        .start_search(SearchQuery::new("retrieval"))
        .await
        .unwrap();
    assert_eq!(first.page_index, 1);
    assert_eq!(first.records.len(), 2);
    assert_eq!(first.records[0].fields.title, "first title");

    let second = navigator.advance(2).await.unwrap();
    assert_eq!(second.page_index, 2);
    assert_eq!(second.records[0].fields.title, "third title");

    // Going back and forward again is served from the cache.
    assert_eq!(navigator.retreat().unwrap().page_index, 1);
    assert_eq!(navigator.advance(2).await.unwrap().page_index, 2);

    page1.assert_async().await;
    page2.assert_async().await;
}

#[tokio::test]
async fn test_resolve_artifact_and_segmented_download() {
    let mut server = mockito::Server::new_async().await;
    let host = server
        .url()
        .strip_prefix("http://")
        .expect("mock server URL is plain http")
        .to_string();

    // Step 1: the download endpoint echoes a quoted info URL using the
    // index's private scheme.
    server
        .mock("GET", "/file/cjfd/ABC123/download")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body(format!("\"cnki://{}/artifact/info\"", host))
        .create_async()
        .await;

    // Step 2: the info URL serves the XML location descriptor.
    let descriptor = format!(
        r#"<result>
  <server><cluster><url>cnki://{}/files/ABC123</url></cluster></server>
  <document><docInfo>journal article</docInfo><filename>ABC123.caj</filename><length>40</length></document>
</result>"#,
        host
    );
    server
        .mock("GET", "/artifact/info")
        .match_header("request-action", "FileInfo")
        .with_status(200)
        .with_body(descriptor)
        .create_async()
        .await;

    // The artifact itself, served as four byte ranges.
    let payload: Vec<u8> = (0u8..40).collect();
    for (start, end) in [(0u64, 9u64), (10, 19), (20, 29), (30, 39)] {
        server
            .mock("GET", "/files/ABC123")
            .match_header("range", format!("bytes={}-{}", start, end).as_str())
            .with_status(206)
            .with_body(payload[start as usize..=end as usize].to_vec())
            .create_async()
            .await;
    }

    let store = HttpStore::new(server.url(), "test-token").unwrap();
    let location = store.resolve_artifact("cjfd:ABC123").await.unwrap();

    assert_eq!(location.declared_size, 40);
    assert_eq!(location.suggested_filename, "ABC123.caj");
    let url = location.urls.first().unwrap();
    assert!(url.starts_with("http://"), "scheme must be rewritten: {}", url);

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("ABC123.caj");

    let engine = TransferEngine::new(store.client().clone())
        .with_token("test-token")
        .with_workers(4);
    let path = engine
        .transfer(url, &dest, location.declared_size)
        .await
        .unwrap();

    assert_eq!(std::fs::read(path).unwrap(), payload);
}

#[tokio::test]
async fn test_failed_search_surfaces_api_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/data/literatures")
        .match_query(mockito::Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let store = HttpStore::new(server.url(), "test-token").unwrap();
    let mut navigator = Navigator::new(store);

    let err = navigator
        .start_search(SearchQuery::new("anything"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("503"));
    assert!(!navigator.has_session());
}
