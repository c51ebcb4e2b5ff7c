mod common;

use assert2::check;
use common::{IsolatedSite, fixture_source, isolated_site};
use docsearch_mcp::format::DetailLevel;
use docsearch_mcp::tools::{
    InspectEntryRequest, ListPagesRequest, LoadIndexRequest, SearchRequest, handle_inspect_entry,
    handle_list_pages, handle_load_index, handle_search,
};
use rstest::rstest;

fn inspect(target: &str, detail_level: DetailLevel) -> InspectEntryRequest {
    InspectEntryRequest {
        target: target.to_string(),
        index: None,
        detail_level,
    }
}

// --- inspect_entry ---

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inspect_by_location(isolated_site: IsolatedSite) {
    let output = handle_inspect_entry(
        &isolated_site.state,
        inspect(
            "api/public/#HydroPowerSimulations.HydroEnergyOutput",
            DetailLevel::High,
        ),
    )
    .await
    .unwrap();

    check!(output.contains("HydroPowerSimulations.HydroEnergyOutput (type)"));
    check!(output.contains("anchor: HydroPowerSimulations.HydroEnergyOutput"));
    check!(output.contains("Auxiliary Variable for Hydro Models"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inspect_by_symbol_name_returns_every_method(isolated_site: IsolatedSite) {
    let output = handle_inspect_entry(
        &isolated_site.state,
        inspect("construct_device!", DetailLevel::Low),
    )
    .await
    .unwrap();

    check!(
        output.contains("13 entries match 'construct_device!'"),
        "All signatures should be listed: {}",
        output
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inspect_section_with_empty_text(isolated_site: IsolatedSite) {
    let output = handle_inspect_entry(
        &isolated_site.state,
        inspect("quick_start_guide/#Quick-Start-Guide", DetailLevel::Medium),
    )
    .await
    .unwrap();

    check!(output.contains("Quick Start Guide (section)"));
    check!(!output.contains("<no documentation>"));
    check!(!output.contains("entries match"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inspect_misspelled_suggests(isolated_site: IsolatedSite) {
    let output = handle_inspect_entry(
        &isolated_site.state,
        inspect("WaterSpilageVariable", DetailLevel::Medium),
    )
    .await
    .unwrap();

    check!(output.contains("No entry 'WaterSpilageVariable'"));
    check!(output.contains("Did you mean"));
    check!(output.contains("`HydroPowerSimulations.WaterSpillageVariable` (type)"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inspect_unrelated_points_to_search(isolated_site: IsolatedSite) {
    let output = handle_inspect_entry(&isolated_site.state, inspect("qqqq", DetailLevel::Low))
        .await
        .unwrap();

    check!(output.contains("Use the search tool"));
    check!(!output.contains("Did you mean"));
}

// --- list_pages ---

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_pages_summarizes_fixture(isolated_site: IsolatedSite) {
    let output = handle_list_pages(
        &isolated_site.state,
        ListPagesRequest {
            index: None,
            detail_level: DetailLevel::Medium,
        },
    )
    .await
    .unwrap();

    check!(output.contains("Index 'hydro'"));
    check!(output.contains("63 entries"));
    check!(output.contains("page: 7, section: 5, type: 21, method: 30"));
    check!(output.contains("Pages (4):"));
    check!(output.contains("• Welcome Page [/] - 6 entries"));
    check!(output.contains("• Internal API Reference [api/internal/] - 38 entries (36 API symbols)"));
    check!(output.contains("Validation: no issues"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_pages_low_detail_skips_pages(isolated_site: IsolatedSite) {
    let output = handle_list_pages(
        &isolated_site.state,
        ListPagesRequest {
            index: Some("hydro".to_string()),
            detail_level: DetailLevel::Low,
        },
    )
    .await
    .unwrap();

    check!(output.contains("63 entries"));
    check!(!output.contains("Pages ("));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_pages_reports_violations(isolated_site: IsolatedSite) {
    let broken = fixture_source().replace(
        r#""text":"Parameter to define energy limit\n\n\n\n\n\n""#,
        r#""text":"""#,
    );
    let path = isolated_site.write("broken/search_index.js", &broken);

    handle_load_index(
        &isolated_site.state,
        LoadIndexRequest {
            path: path.display().to_string(),
            name: Some("broken".to_string()),
        },
    )
    .await
    .unwrap();

    let output = handle_list_pages(
        &isolated_site.state,
        ListPagesRequest {
            index: Some("broken".to_string()),
            detail_level: DetailLevel::High,
        },
    )
    .await
    .unwrap();

    check!(output.contains("Validation: 1 issues"), "{}", output);
    check!(output.contains("`HydroPowerSimulations.ReservoirLimitParameter`: API entry has no text"));
}

// --- load_index ---

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_index_discovers_directory(isolated_site: IsolatedSite) {
    isolated_site.write("psi/docs/build/search_index.js", &fixture_source());
    isolated_site.write("psi/docs/src/index.md", "# PowerSimulations");

    let output = handle_load_index(
        &isolated_site.state,
        LoadIndexRequest {
            path: isolated_site.root().join("psi").display().to_string(),
            name: None,
        },
    )
    .await
    .unwrap();

    check!(output.contains("Loaded 'build'"), "{}", output);
    check!(output.contains("63 entries across 4 pages"));
    check!(output.contains("Default index: 'hydro'"));

    let names: Vec<_> = isolated_site
        .state
        .sources()
        .await
        .into_iter()
        .map(|s| s.name)
        .collect();
    check!(names == vec!["hydro", "build"]);

    let search = handle_search(
        &isolated_site.state,
        SearchRequest {
            query: "HydroEnergyOutput".to_string(),
            index: Some("build".to_string()),
            category: None,
            page: None,
            limit: Some(1),
        },
    )
    .await
    .unwrap();
    check!(search.contains("in 'build'"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_index_twice_is_idempotent(isolated_site: IsolatedSite) {
    let request = || LoadIndexRequest {
        path: isolated_site.payload_path.display().to_string(),
        name: Some("hydro".to_string()),
    };

    let output = handle_load_index(&isolated_site.state, request()).await.unwrap();
    check!(output.contains("Already registered 'hydro'"), "{}", output);
    check!(isolated_site.state.sources().await.len() == 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_index_missing_path_fails(isolated_site: IsolatedSite) {
    let result = handle_load_index(
        &isolated_site.state,
        LoadIndexRequest {
            path: isolated_site.root().join("nope").display().to_string(),
            name: None,
        },
    )
    .await;

    check!(result.is_err());
}
