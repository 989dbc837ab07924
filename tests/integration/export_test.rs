//! End-to-end export tests against the seeded SQLite store.

use db_export::export::{ExportDispatcher, ExportRequest, ExportResponse, ResponseKind};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as JsonValue};

use super::common;

async fn export(query: &str) -> ExportResponse {
    let config = common::config();
    let catalog = common::catalog(&config);
    let store = common::seeded_store().await;
    ExportDispatcher::new(&catalog, &store, &config)
        .dispatch(&ExportRequest::from_query_string(query))
        .await
}

fn body_json(response: &ExportResponse) -> JsonValue {
    serde_json::from_slice(&response.body).expect("response body is JSON")
}

#[tokio::test]
async fn test_empty_results_are_well_formed() {
    for (format, expected) in [
        ("json", json!([])),
        ("fullcalendar", json!([])),
        ("timeline", json!({ "events": [] })),
        ("nvd3chart", json!([])),
    ] {
        let response = export(&format!(
            "tables=events&fields=name,began&where=name+%3D+%27Nobody%27&format={format}"
        ))
        .await;

        assert_eq!(response.kind, ResponseKind::Data, "format {format}");
        assert_eq!(body_json(&response), expected, "format {format}");
    }

    let csv = export("tables=events&fields=name,began&where=name+%3D+%27Nobody%27&format=csv").await;
    assert_eq!(csv.body_text(), "name,began,began__precision\n");
}

#[tokio::test]
async fn test_calendar_applies_date_window_before_execution() {
    let response = export(
        "tables=events&fields=_pageName,name,began,ended,color&order_by=began\
         &format=fullcalendar&start=2020-01-01&end=2020-12-31&color=blue",
    )
    .await;

    assert_eq!(
        body_json(&response),
        json!([
            {
                "title": "Summit",
                "start": "2020-01-01",
                "end": null,
                "color": null,
                "textColor": null,
                "description": null,
                "url": "/index.php?title=Summit",
                "allDay": true
            },
            {
                "title": "Launch",
                "start": "2020-03-05 14:30:00",
                "end": "2020-03-06",
                "color": "red",
                "textColor": null,
                "description": null,
                "url": "/index.php?title=Launch_Party"
            }
        ])
    );
}

#[tokio::test]
async fn test_calendar_uses_per_query_color_default() {
    let response = export(
        "tables=events&fields=name,began&where=name+%3D+%27Gala%27\
         &format=fullcalendar&color=blue&text_color=white",
    )
    .await;

    let events = body_json(&response);
    assert_eq!(events[0]["color"], json!("blue"));
    assert_eq!(events[0]["textColor"], json!("white"));
    assert_eq!(events[0]["allDay"], json!(true));
}

#[tokio::test]
async fn test_timeline_is_sorted_across_queries() {
    let response = export(
        "tables[0]=films&fields[0]=title,released&order_by[0]=released+DESC\
         &tables[1]=books&fields[1]=title,published,author,_pageName&format=timeline",
    )
    .await;

    let timeline = body_json(&response);
    let titles: Vec<&str> = timeline["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Emma", "Dune", "Ubik", "Alien", "Brazil"]);
    assert_eq!(
        timeline["events"][1]["description"],
        json!("<strong>author:</strong> Frank Herbert<br />\n<strong>_pageName:</strong> Dune<br />\n")
    );
    assert_eq!(
        timeline["events"][1]["link"],
        json!("http://localhost/index.php?title=Dune")
    );
}

#[tokio::test]
async fn test_csv_header_is_union_of_queries() {
    let response = export(
        "tables[0]=books&fields[0]=_pageName=page,title&order_by[0]=title\
         &tables[1]=films&fields[1]=title,_pageID=id&order_by[1]=title&format=csv",
    )
    .await;

    assert_eq!(response.content_type, "text/csv");
    assert_eq!(
        response.body_text(),
        "page,title,id\nDune,Dune,\nEmma,Emma,\nUbik,Ubik,\n,Alien,30\n,Brazil,31\n"
    );
}

#[tokio::test]
async fn test_csv_tab_delimiter_and_list_cells() {
    let response = export(
        "tables=books&fields=title,genres&where=title+%3D+%27Dune%27&format=csv&delimiter=%5Ct",
    )
    .await;

    assert_eq!(response.body_text(), "title\tgenres\nDune\tsci-fi;classic\n");
}

#[tokio::test]
async fn test_json_splits_lists_and_unpacks_coordinates() {
    let response = export(
        "tables=books&fields=title,genres,location&where=pages+%3E+300&order_by=title&format=json",
    )
    .await;

    assert_eq!(
        body_json(&response),
        json!([
            {
                "title": "Dune",
                "genres": ["sci-fi", "classic"],
                "location": { "lat": 40.5, "lon": -3.25 }
            },
            { "title": "Emma", "genres": ["romance"], "location": null }
        ])
    );
}

#[tokio::test]
async fn test_chart_renders_partial_dates_as_text() {
    let response = export("tables=books&fields=title,published,pages&order_by=title&format=nvd3chart").await;

    let series = body_json(&response);
    assert_eq!(series[0]["key"], json!("published"));
    assert_eq!(series[0]["color"], json!("#60BD68"));
    assert_eq!(
        series[0]["values"],
        json!([
            { "label": "Dune", "value": "August 1, 1965 " },
            { "label": "Emma", "value": "1815 " },
            { "label": "Ubik", "value": "May 1969 " }
        ])
    );
    assert_eq!(series[1]["key"], json!("pages"));
    assert_eq!(series[1]["values"][0]["value"], json!(412));
}

#[tokio::test]
async fn test_spreadsheet_uses_first_query_only() {
    let response = export(
        "tables[0]=books&fields[0]=title,pages&order_by[0]=title\
         &tables[1]=films&fields[1]=title&format=excel&filename=books.xls",
    )
    .await;

    let body = response.body_text();
    assert_eq!(
        response.content_disposition.as_deref(),
        Some("attachment; filename=books.xls")
    );
    assert!(body.contains("<Cell><Data ss:Type=\"String\">Dune</Data></Cell>"));
    assert!(body.contains("<Cell><Data ss:Type=\"Number\">412</Data></Cell>"));
    assert!(!body.contains("Alien"));
}

#[tokio::test]
async fn test_unknown_format_yields_message() {
    let response = export("tables=books&fields=title&format=yaml").await;

    assert_eq!(response.kind, ResponseKind::Message);
    assert_eq!(
        response.body_text(),
        "No valid format was specified for this query."
    );
    assert_eq!(response.content_disposition, None);
}

#[tokio::test]
async fn test_missing_table_in_store_is_reported() {
    let config = common::config();
    let catalog = common::catalog(&config);
    let store = common::seeded_store().await;
    store
        .execute_script("DROP TABLE cargo__films;")
        .await
        .unwrap();

    let response = ExportDispatcher::new(&catalog, &store, &config)
        .dispatch(&ExportRequest::from_query_string(
            "tables=films&fields=title&format=json",
        ))
        .await;

    assert_eq!(response.kind, ResponseKind::Message);
    assert!(response.body_text().starts_with("Error: "));
}

#[tokio::test]
async fn test_repeated_exports_are_byte_identical() {
    for format in ["json", "csv"] {
        let query = format!(
            "tables=books&fields=title,genres,published&order_by=title&format={format}"
        );
        let first = export(&query).await;
        let second = export(&query).await;
        assert_eq!(first.body, second.body, "format {format}");
    }
}
