//! Page values against the seeded SQLite store.

use db_export::page_values::{PageRef, PageValues};
use pretty_assertions::assert_eq;

use super::common;

#[tokio::test]
async fn test_page_values_for_stored_page() {
    let config = common::config();
    let catalog = common::catalog(&config);
    let store = common::seeded_store().await;
    let values = PageValues::new(&catalog, &store, &config);

    let report = values.collect(&PageRef::new(10, "Dune")).await;

    // "retired" is listed for the page but no longer declared.
    let tables: Vec<&str> = report.tables.iter().map(|t| t.table.as_str()).collect();
    assert_eq!(tables, vec!["_pageData", "books"]);

    assert_eq!(
        report.tables[0].rows,
        vec![vec![
            ("_creationDate".to_string(), "April 2, 2021 9:15:00".to_string()),
            ("_categories".to_string(), "Novels \u{2022} Classics".to_string()),
        ]]
    );

    let book = &report.tables[1].rows[0];
    let fields: Vec<&str> = book.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        fields,
        vec!["title", "author", "genres", "published", "pages", "in_print", "location"]
    );
    assert_eq!(book[1].1, "<a href=\"/index.php?title=Frank_Herbert\">Frank Herbert</a>");
    assert_eq!(book[3].1, "August 1, 1965");
    assert_eq!(book[5].1, "Yes");
}

#[tokio::test]
async fn test_page_values_html() {
    let config = common::config();
    let catalog = common::catalog(&config);
    let store = common::seeded_store().await;
    let values = PageValues::new(&catalog, &store, &config);

    let html = values.collect(&PageRef::new(10, "Dune")).await.render_html();

    assert!(html.starts_with("<h1>Page values for &quot;Dune&quot;</h1>\n"));
    assert!(html.contains("<h2>Values for table &quot;books&quot;</h2>\n"));
    assert!(html.contains(
        "<tr><td style=\"vertical-align: top;\">genres</td><td>sci-fi \u{2022} classic</td></tr>"
    ));
    assert!(!html.contains("secret"));
}

#[tokio::test]
async fn test_page_without_rows_has_only_page_data() {
    let config = common::config();
    let catalog = common::catalog(&config);
    let store = common::seeded_store().await;
    let values = PageValues::new(&catalog, &store, &config);

    let report = values.collect(&PageRef::new(99, "Nowhere")).await;

    assert_eq!(report.tables.len(), 1);
    assert!(report.tables[0].rows.is_empty());
}
