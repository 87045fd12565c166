//! Paginated listings: search and trashcan.

mod common;

use futures::TryStreamExt;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};
use tekdrive::models::SearchQuery;
use tekdrive::{DriveError, Parsed};

fn file_json(id: &str) -> Value {
    json!({"id": id, "type": "FILE", "name": format!("{id}.txt")})
}

fn page(page: u64, limit: u64, ids: &[&str]) -> String {
    let results: Vec<Value> = ids.iter().map(|id| file_json(id)).collect();
    json!({"meta": {"page": page, "limit": limit}, "results": results}).to_string()
}

async fn mock_page(server: &mut ServerGuard, query: Matcher, body: String, hits: usize) -> Mock {
    server
        .mock("GET", "/search")
        .match_query(query)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

fn page_param(n: u64) -> Matcher {
    Matcher::UrlEncoded("page".into(), n.to_string())
}

fn ids(items: &[Parsed]) -> Vec<String> {
    items
        .iter()
        .map(|item| match item {
            Parsed::File(file) => file.id().to_string(),
            other => panic!("unexpected item: {other:?}"),
        })
        .collect()
}

mod search {
    use super::*;

    #[tokio::test]
    async fn test_full_page_requests_next() {
        let mut server = Server::new_async().await;
        let first = mock_page(
            &mut server,
            Matcher::AllOf(vec![
                Matcher::UrlEncoded("name".into(), "report".into()),
                Matcher::UrlEncoded("limit".into(), "100".into()),
            ]),
            page(1, 2, &["a", "b"]),
            1,
        )
        .await;
        let second = mock_page(&mut server, page_param(2), page(2, 2, &["c"]), 1).await;

        let (client, sleeper) = common::client(&server.url());
        let query = SearchQuery::new().name("report").limit(None);
        let items = client.search().query(&query).unwrap().all().await.unwrap();

        assert_eq!(ids(&items), vec!["a", "b", "c"]);
        first.assert_async().await;
        second.assert_async().await;
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_limit_stops_before_next_page() {
        let mut server = Server::new_async().await;
        let first = mock_page(
            &mut server,
            Matcher::UrlEncoded("limit".into(), "3".into()),
            page(1, 2, &["a", "b"]),
            1,
        )
        .await;
        let second = mock_page(&mut server, page_param(2), page(2, 2, &["c", "d"]), 1).await;
        let third = mock_page(&mut server, page_param(3), page(3, 2, &["e"]), 0).await;

        let (client, _) = common::client(&server.url());
        let query = SearchQuery::new().name("report").limit(Some(3));
        let mut results = client.search().query(&query).unwrap();

        let mut seen = Vec::new();
        while let Some(item) = results.next().await.unwrap() {
            seen.push(item);
        }
        assert_eq!(ids(&seen), vec!["a", "b", "c"]);
        assert_eq!(results.yielded(), 3);
        assert!(results.next().await.unwrap().is_none());

        first.assert_async().await;
        second.assert_async().await;
        third.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_page_ends_sequence() {
        let mut server = Server::new_async().await;
        let only = mock_page(&mut server, Matcher::Any, page(1, 100, &[]), 1).await;

        let (client, _) = common::client(&server.url());
        let query = SearchQuery::new().file_type("WFM");
        let mut results = client.search().query(&query).unwrap();

        assert!(results.next().await.unwrap().is_none());
        assert!(results.next().await.unwrap().is_none());
        only.assert_async().await;
    }

    #[tokio::test]
    async fn test_short_page_ends_sequence() {
        let mut server = Server::new_async().await;
        let only = mock_page(&mut server, Matcher::Any, page(1, 5, &["a", "b"]), 1).await;

        let (client, _) = common::client(&server.url());
        let query = SearchQuery::new().name("x").limit(Some(5));
        let items: Vec<Parsed> = client
            .search()
            .query(&query)
            .unwrap()
            .into_stream()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(ids(&items), vec!["a", "b"]);
        only.assert_async().await;
    }

    #[test]
    fn test_query_requires_criteria() {
        let (client, _) = common::client("http://127.0.0.1:1");
        let err = client
            .search()
            .query(&SearchQuery::new().silo("SHARES"))
            .err()
            .expect("query should be rejected");
        assert!(
            matches!(err, DriveError::Client(ref msg) if msg == "Must supply `name`, `file_type`, or `upload_state`."),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_non_page_response_is_unexpected_model() {
        let mut server = Server::new_async().await;
        let _mock = mock_page(&mut server, Matcher::Any, file_json("a").to_string(), 1).await;

        let (client, _) = common::client(&server.url());
        let mut results = client.search().query(&SearchQuery::new().name("a")).unwrap();
        let err = results.next().await.unwrap_err();
        assert!(matches!(err, DriveError::UnexpectedModel { found: "File", .. }));
    }
}

mod trashcan {
    use super::*;

    #[tokio::test]
    async fn test_trash_entries() {
        let mut server = Server::new_async().await;
        let body = json!({
            "meta": {"page": 1, "limit": 10},
            "trash": [
                {"trasher": {"id": "u1", "username": "me@example.com"}, "totalBytes": 10, "item": file_json("a")},
                {"trasher": {"id": "u1", "username": "me@example.com"}, "totalBytes": "20",
                 "item": {"id": "d", "type": "FOLDER", "name": "old"}}
            ]
        });
        let mock = server
            .mock("GET", "/trash")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("orderBy".into(), "createdAt".into()),
                Matcher::UrlEncoded("limit".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body(body.to_string())
            .expect(1)
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        let items = client
            .trashcan()
            .get(Some("createdAt"), Some(10))
            .all()
            .await
            .unwrap();
        mock.assert_async().await;

        let trash: Vec<_> = items
            .into_iter()
            .map(|item| item.into_trash().unwrap())
            .collect();
        assert_eq!(trash[0].id(), "trash_a");
        assert_eq!(trash[1].id(), "trash_d");
        assert_eq!(trash[1].total_bytes().await.unwrap(), 20);
        assert!(trash[1].item().await.unwrap().is_folder());
    }

    #[tokio::test]
    async fn test_empty_trashcan() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/trash")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let (client, _) = common::client(&server.url());
        client.trashcan().empty().await.unwrap();
        mock.assert_async().await;
    }
}
