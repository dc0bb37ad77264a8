//! End-to-end scenarios against a live engine.

use assert2::check;
use serde_json::{Value, json};
use sift::{EngineConfig, Language, SearchEngine, SearchError, SearchParams};

fn book_schema() -> Value {
    json!({ "title": "text", "year": "number", "inStock": "boolean" })
}

fn term(term: &str) -> SearchParams {
    SearchParams {
        term: term.into(),
        ..SearchParams::default()
    }
}

fn hit_ids(result: &sift::SearchResult) -> Vec<String> {
    result.hits.iter().map(|hit| hit.id.clone()).collect()
}

/// Engine over `schema`, with tracing installed for the test process so
/// `SIFT_LOG=sift=debug` exposes writer and planner activity on failures.
fn new_engine(schema: Value) -> SearchEngine {
    sift::tracing::init();
    SearchEngine::create(EngineConfig::new(schema)).unwrap()
}

/// Engine with the two Lyra books applied; returns their ids.
async fn engine_with_books() -> (SearchEngine, String, String) {
    let engine = new_engine(book_schema());
    let a = engine
        .insert(
            json!({ "title": "The Lyra Book", "year": 2022, "inStock": true }),
            None,
        )
        .await
        .unwrap();
    let b = engine
        .insert(
            json!({ "title": "Lyra Cookbook", "year": 2019, "inStock": false }),
            None,
        )
        .await
        .unwrap();
    engine.flush().await.unwrap();
    (engine, a, b)
}

#[tokio::test]
async fn term_search_finds_every_matching_document() {
    let (engine, a, b) = engine_with_books().await;
    let result = engine.search(term("lyra"), None).await.unwrap();
    check!(result.count == 2);
    check!(hit_ids(&result) == vec![a, b]);
    check!(!result.elapsed.is_empty());
}

#[tokio::test]
async fn tolerant_search_matches_within_one_edit() {
    let (engine, a, b) = engine_with_books().await;
    let result = engine
        .search(
            SearchParams {
                tolerance: 1,
                ..term("lira")
            },
            None,
        )
        .await
        .unwrap();
    check!(result.count == 2);
    check!(hit_ids(&result) == vec![a, b]);
}

#[tokio::test]
async fn numeric_filter_narrows_hits() {
    let (engine, a, _) = engine_with_books().await;
    let result = engine
        .search(
            SearchParams {
                where_filter: Some(json!({ "year": { ">=": 2020 } })),
                ..term("lyra")
            },
            None,
        )
        .await
        .unwrap();
    check!(result.count == 1);
    check!(hit_ids(&result) == vec![a]);
}

#[tokio::test]
async fn boolean_filter_narrows_hits() {
    let (engine, a, _) = engine_with_books().await;
    let result = engine
        .search(
            SearchParams {
                where_filter: Some(json!({ "inStock": true })),
                ..term("lyra")
            },
            None,
        )
        .await
        .unwrap();
    check!(result.count == 1);
    check!(hit_ids(&result) == vec![a]);
}

#[tokio::test]
async fn paging_returns_the_next_window() {
    let (engine, _, _) = engine_with_books().await;
    let first = engine
        .search(
            SearchParams {
                limit: 1,
                ..term("lyra")
            },
            None,
        )
        .await
        .unwrap();
    let second = engine
        .search(
            SearchParams {
                limit: 1,
                offset: 1,
                ..term("lyra")
            },
            None,
        )
        .await
        .unwrap();
    check!(first.hits.len() == 1);
    check!(second.hits.len() == 1);
    check!(first.hits[0].id != second.hits[0].id);
    check!(second.count == 2);
}

#[tokio::test]
async fn deleted_documents_stop_matching() {
    let (engine, a, b) = engine_with_books().await;
    check!(engine.delete(&a).await.unwrap());
    let result = engine.search(term("lyra"), None).await.unwrap();
    check!(result.count == 1);
    check!(hit_ids(&result) == vec![b]);
    check!(engine.len().await == 1);
}

#[tokio::test]
async fn delete_of_unknown_id_fails() {
    let (engine, a, _) = engine_with_books().await;
    check!(engine.delete(&a).await.unwrap());
    let err = engine.delete(&a).await.unwrap_err();
    check!(err == SearchError::DocIdDoesNotExist { id: a });
}

#[tokio::test]
async fn mistyped_document_is_rejected_synchronously() {
    let engine = new_engine(book_schema());
    let err = engine.insert(json!({ "title": 42 }), None).await.unwrap_err();
    check!(matches!(err, SearchError::InvalidDocSchema { .. }));
    check!(engine.is_empty().await);
}

#[tokio::test]
async fn double_operator_filter_is_rejected() {
    let (engine, _, _) = engine_with_books().await;
    let err = engine
        .search(
            SearchParams {
                where_filter: Some(json!({ "year": { "<": 2020, ">": 2000 } })),
                ..term("lyra")
            },
            None,
        )
        .await
        .unwrap_err();
    check!(matches!(err, SearchError::InvalidQueryParams { .. }));
}

#[tokio::test]
async fn unknown_search_property_is_rejected() {
    let (engine, _, _) = engine_with_books().await;
    let err = engine
        .search(
            SearchParams {
                properties: Some(vec!["publisher".into()]),
                ..term("lyra")
            },
            None,
        )
        .await
        .unwrap_err();
    check!(matches!(err, SearchError::InvalidProperty { .. }));
}

#[tokio::test]
async fn invalid_schema_fails_at_construction() {
    sift::tracing::init();
    let err = SearchEngine::create(EngineConfig::new(json!({ "title": "blob" }))).unwrap_err();
    check!(matches!(err, SearchError::InvalidSchemaType { .. }));
}

#[tokio::test]
async fn nested_schema_uses_flat_paths() {
    let engine = new_engine(json!({
        "title": "text",
        "author": { "name": "text" },
    }));
    let id = engine
        .insert(
            json!({ "title": "Something", "author": { "name": "Daniele" } }),
            None,
        )
        .await
        .unwrap();
    engine.flush().await.unwrap();

    let scoped = engine
        .search(
            SearchParams {
                properties: Some(vec!["author.name".into()]),
                ..term("daniele")
            },
            None,
        )
        .await
        .unwrap();
    check!(scoped.count == 1);
    check!(hit_ids(&scoped) == vec![id]);
}

#[tokio::test]
async fn per_call_language_override_applies_to_both_sides() {
    let engine = new_engine(json!({ "title": "text" }));
    engine
        .insert(json!({ "title": "les livres" }), Some(Language::French))
        .await
        .unwrap();
    engine.flush().await.unwrap();

    // French stemming folds "livre" and "livres" together.
    let result = engine
        .search(term("livre"), Some(Language::French))
        .await
        .unwrap();
    check!(result.count == 1);
}

#[tokio::test]
async fn concurrent_inserts_serialize_in_acceptance_order() {
    let engine = new_engine(book_schema());
    let mut handles = Vec::new();
    for i in 0..20 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .insert(
                    json!({ "title": format!("lyra volume {i}"), "year": 2000 + i }),
                    None,
                )
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    engine.flush().await.unwrap();

    check!(engine.len().await == 20);
    let result = engine
        .search(
            SearchParams {
                limit: 50,
                ..term("lyra")
            },
            None,
        )
        .await
        .unwrap();
    check!(result.count == 20);
    // No id ever appears twice in one result.
    let mut ids = hit_ids(&result);
    ids.sort();
    ids.dedup();
    check!(ids.len() == 20);
}

#[tokio::test]
async fn flush_is_a_read_your_writes_barrier() {
    let engine = new_engine(book_schema());
    for i in 0..100 {
        engine
            .insert(json!({ "title": "lyra", "year": i }), None)
            .await
            .unwrap();
    }
    engine.flush().await.unwrap();
    check!(engine.len().await == 100);
}

#[tokio::test]
async fn hits_project_the_stored_document() {
    let (engine, a, _) = engine_with_books().await;
    let result = engine
        .search(
            SearchParams {
                where_filter: Some(json!({ "inStock": true })),
                ..term("lyra")
            },
            None,
        )
        .await
        .unwrap();
    let hit = &result.hits[0];
    check!(hit.id == a);
    check!(hit.document == json!({ "title": "The Lyra Book", "year": 2022, "inStock": true }));
}
