mod common;

use assert2::check;
use common::{IsolatedSite, isolated_site};
use docsearch_mcp::index::Category;
use docsearch_mcp::tools::search::{SearchRequest, handle_search};
use rstest::rstest;

fn request(query: &str) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        index: None,
        category: None,
        page: None,
        limit: Some(5),
    }
}

/// Test: an exact symbol name ranks its own entry first.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_ranks_exact_symbol_first(isolated_site: IsolatedSite) {
    let result = handle_search(&isolated_site.state, request("WaterSpillageVariable")).await;
    check!(result.is_ok(), "Search should succeed: {:?}", result);

    let output = result.unwrap();
    check!(
        output.contains("1. `HydroPowerSimulations.WaterSpillageVariable` (type)"),
        "WaterSpillageVariable should rank first: {}",
        output
    );
    check!(output.contains("api/public/#HydroPowerSimulations.WaterSpillageVariable"));
}

/// Test: method names with a bang are found through the title boost.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_finds_bang_method(isolated_site: IsolatedSite) {
    let output = handle_search(&isolated_site.state, request("construct_device!"))
        .await
        .unwrap();

    check!(
        output.contains("1. `PowerSimulations.construct_device!` (method)"),
        "Should find construct_device!: {}",
        output
    );
}

/// Test: stemming matches plural query terms against singular text.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_uses_stemming(isolated_site: IsolatedSite) {
    let output = handle_search(&isolated_site.state, request("spillages"))
        .await
        .unwrap();

    check!(
        output.contains("WaterSpillageVariable"),
        "Stemmed query should match: {}",
        output
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_respects_category_filter(isolated_site: IsolatedSite) {
    let mut req = request("hydro");
    req.category = Some(vec![Category::Type]);
    req.limit = Some(20);

    let output = handle_search(&isolated_site.state, req).await.unwrap();

    check!(output.contains(" (type) - relevance"), "Should have type results: {}", output);
    check!(!output.contains(" (method) - relevance"));
    check!(!output.contains(" (page) - relevance"));
    check!(!output.contains(" (section) - relevance"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_respects_page_filter(isolated_site: IsolatedSite) {
    let mut req = request("reservoir");
    req.page = Some("public api reference".to_string());
    req.limit = Some(20);

    let output = handle_search(&isolated_site.state, req).await.unwrap();

    check!(output.contains("Public API Reference ›"));
    check!(!output.contains("Internal API Reference ›"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_limits_results(isolated_site: IsolatedSite) {
    let mut req = request("constraints");
    req.limit = Some(2);

    let output = handle_search(&isolated_site.state, req).await.unwrap();

    let hits = output.lines().filter(|l| l.contains(" - relevance: ")).count();
    check!(hits == 2, "Expected two results: {}", output);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_reports_no_results(isolated_site: IsolatedSite) {
    let output = handle_search(&isolated_site.state, request("qwxzyvk"))
        .await
        .unwrap();

    check!(output.contains("No results found for 'qwxzyvk' in index 'hydro'"));
    check!(output.contains("Search tips"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_unknown_index_fails(isolated_site: IsolatedSite) {
    let mut req = request("hydro");
    req.index = Some("psi".to_string());

    let result = handle_search(&isolated_site.state, req).await;
    check!(result.is_err());
    check!(
        result
            .unwrap_err()
            .to_string()
            .contains("No search index named 'psi'")
    );
}
