//! Shared fixtures: an in-memory SQLite store laid out the way stored
//! tables are, plus the matching schema catalog and config.

use db_export::config::{Config, PageDataConfig, TableDeclaration};
use db_export::db::SqliteStore;
use db_export::schema::SchemaCatalog;

const SEED: &str = r#"
CREATE TABLE cargo__books (
    _ID INTEGER, _pageName TEXT, _pageTitle TEXT, _pageNamespace INTEGER, _pageID INTEGER,
    title TEXT, author TEXT, genres__full TEXT, published TEXT, published__precision INTEGER,
    pages INTEGER, in_print INTEGER, location__full TEXT, notes TEXT
);
INSERT INTO cargo__books VALUES
    (1, 'Dune', 'Dune', 0, 10, 'Dune', 'Frank Herbert', 'sci-fi;classic', '1965-08-01', 1, 412, 1, '40.5, -3.25', 'secret'),
    (2, 'Emma', 'Emma', 0, 11, 'Emma', 'Jane Austen', 'romance', '1815-01-01', 3, 474, 0, NULL, NULL),
    (3, 'Ubik', 'Ubik', 0, 12, 'Ubik', 'Philip K. Dick', '', '1969-05-01', 2, 202, 1, NULL, NULL);

CREATE TABLE cargo__films (
    _ID INTEGER, _pageName TEXT, _pageTitle TEXT, _pageNamespace INTEGER, _pageID INTEGER,
    title TEXT, released TEXT, released__precision INTEGER
);
INSERT INTO cargo__films VALUES
    (1, 'Alien', 'Alien', 0, 30, 'Alien', '1979-05-25', 1),
    (2, 'Brazil', 'Brazil', 0, 31, 'Brazil', '1985-02-20', 1);

CREATE TABLE cargo__events (
    _ID INTEGER, _pageName TEXT, _pageTitle TEXT, _pageNamespace INTEGER, _pageID INTEGER,
    name TEXT, began TEXT, began__precision INTEGER, ended TEXT, ended__precision INTEGER, color TEXT
);
INSERT INTO cargo__events VALUES
    (1, 'Launch Party', 'Launch Party', 0, 20, 'Launch', '2020-03-05 14:30:00', 0, '2020-03-06', 1, 'red'),
    (2, 'Retro', 'Retro', 0, 21, 'Retro', '2019-11-01', 1, NULL, NULL, NULL),
    (3, 'Summit', 'Summit', 0, 22, 'Summit', '2020-01-01', 3, NULL, NULL, NULL),
    (4, 'Gala', 'Gala', 0, 23, 'Gala', '2021-06-01', 1, '2021-06-02', 1, NULL);

CREATE TABLE cargo___pageData (
    _ID INTEGER, _pageName TEXT, _pageTitle TEXT, _pageNamespace INTEGER, _pageID INTEGER,
    _creationDate TEXT, _creationDate__precision INTEGER, _categories__full TEXT
);
INSERT INTO cargo___pageData VALUES
    (1, 'Dune', 'Dune', 0, 10, '2021-04-02 09:15:00', 0, 'Novels|Classics');

CREATE TABLE cargo_pages (page_id INTEGER, table_name TEXT);
INSERT INTO cargo_pages VALUES (10, 'books'), (10, 'retired');
"#;

/// Opens an in-memory store holding the fixture tables.
pub async fn seeded_store() -> SqliteStore {
    let store = SqliteStore::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory SQLite store");
    store.execute_script(SEED).await.expect("seed fixtures");
    store
}

fn declaration(name: &str, fields: &[&str]) -> TableDeclaration {
    TableDeclaration {
        name: name.to_string(),
        fields: fields.iter().map(|f| f.to_string()).collect(),
    }
}

/// Config declaring the fixture tables, with page data enabled.
pub fn config() -> Config {
    Config {
        page_data: PageDataConfig {
            page_data_columns: vec!["creationDate".to_string(), "categories".to_string()],
            file_data_columns: Vec::new(),
        },
        tables: vec![
            declaration(
                "books",
                &[
                    "title=String",
                    "author=Page",
                    "genres=List (;) of String",
                    "published=Date",
                    "pages=Integer",
                    "in_print=Boolean",
                    "location=Coordinates",
                    "notes=Text (hidden)",
                ],
            ),
            declaration("films", &["title=String", "released=Date"]),
            declaration(
                "events",
                &["name=String", "began=Datetime", "ended=Date", "color=String"],
            ),
        ],
        ..Config::default()
    }
}

pub fn catalog(config: &Config) -> SchemaCatalog {
    SchemaCatalog::from_declarations(&config.tables).expect("fixture declarations")
}
