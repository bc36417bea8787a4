use std::time::Duration;

use dlens::config::{Config, EngineConfig};
use dlens::introspect;
use dlens::models::browse::{BrowseIntent, SortDirection};
use dlens::models::query::CellValue;
use dlens::sql::{browse, update::CellEdit};
use dlens::{DbError, Explorer, Session};

async fn session_with(statements: &[&str]) -> Session {
    let mut session = Session::new(EngineConfig::default());
    session.load(&[]).await.unwrap();
    for statement in statements {
        session.execute(statement).await.unwrap();
    }
    session
}

async fn image_with(statements: &[&str]) -> Vec<u8> {
    let session = session_with(statements).await;
    session.export().await.unwrap().expect("database is loaded")
}

async fn explorer_with(statements: &[&str], page_size: u32) -> Explorer {
    let image = image_with(statements).await;
    let config = Config {
        page_size,
        ..Config::default()
    };
    let mut explorer = Explorer::new(&config);
    explorer.load(&image).await.unwrap();
    explorer
}

const USERS_AND_ORDERS: &[&str] = &[
    "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
    "CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users(id), total REAL)",
    "INSERT INTO users (id, name) VALUES (1, 'O''Brien'), (2, 'Bob')",
    "INSERT INTO orders (user_id, total) VALUES (1, 9.5)",
];

#[tokio::test]
async fn test_list_tables() {
    let session = session_with(USERS_AND_ORDERS).await;
    let tables = introspect::list_tables(&session).await.unwrap();

    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["orders", "users"]);

    let orders = &tables[0];
    assert_eq!(orders.row_count, 1);
    assert!(orders.schema.starts_with("CREATE TABLE orders"));
    assert_eq!(orders.columns.len(), 3);
    assert_eq!(orders.columns[1].name, "user_id");
    assert_eq!(orders.columns[1].data_type, "INTEGER");
    assert_eq!(orders.foreign_keys.len(), 1);
    assert_eq!(orders.foreign_keys[0].from, "user_id");
    assert_eq!(orders.foreign_keys[0].to_table, "users");
    assert_eq!(orders.foreign_keys[0].to_column, "id");

    let users = &tables[1];
    assert_eq!(users.row_count, 2);
    assert!(users.columns[0].primary_key);
    assert!(!users.columns[1].primary_key);
}

#[tokio::test]
async fn test_get_columns_for_missing_table() {
    let session = session_with(USERS_AND_ORDERS).await;
    assert!(introspect::get_columns(&session, "ghosts").await.is_empty());
}

#[tokio::test]
async fn test_invalid_image_fails_to_load() {
    let mut session = Session::default();
    let err = session.load(&vec![0x42u8; 4096]).await.unwrap_err();
    assert!(matches!(err, DbError::Load(_)));
    assert!(!session.is_loaded());
}

#[tokio::test]
async fn test_export_then_reload_is_identical() {
    let session = session_with(USERS_AND_ORDERS).await;
    let before = introspect::list_tables(&session).await.unwrap();

    let image = session.export().await.unwrap().unwrap();
    let mut reloaded = Session::default();
    reloaded.load(&image).await.unwrap();
    let after = introspect::list_tables(&reloaded).await.unwrap();

    assert_eq!(before, after);
}

#[tokio::test]
async fn test_cells_keep_their_type() {
    let session = session_with(&[]).await;
    let result = session
        .execute("SELECT 1 AS i, 2.5 AS r, 'x' AS t, NULL AS n, X'0102' AS b")
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["i", "r", "t", "n", "b"]);
    assert_eq!(
        result.values,
        vec![vec![
            CellValue::Integer(1),
            CellValue::Real(2.5),
            CellValue::Text("x".into()),
            CellValue::Null,
            CellValue::Blob(vec![1, 2]),
        ]]
    );
    assert!(result.execution_time.is_some());
}

#[tokio::test]
async fn test_empty_result_still_names_columns() {
    let session = session_with(USERS_AND_ORDERS).await;
    let result = session
        .execute("SELECT id, name FROM users WHERE id < 0")
        .await
        .unwrap();
    assert!(result.values.is_empty());
    assert_eq!(result.columns, vec!["id", "name"]);
}

#[tokio::test]
async fn test_engine_error_is_verbatim() {
    let session = session_with(&[]).await;
    let err = session.execute("SELECT * FROM nope").await.unwrap_err();
    assert_eq!(err.to_string(), "no such table: nope");
}

#[tokio::test]
async fn test_search_matches_special_characters_literally() {
    let session = session_with(&[
        "CREATE TABLE products (sku TEXT, note TEXT)",
        "INSERT INTO products VALUES ('50%_off', 'promo')",
        "INSERT INTO products VALUES ('500 off', 'bulk')",
        "INSERT INTO products VALUES ('x1', 'back\\slash')",
        "INSERT INTO products VALUES ('x2', 'it''s here')",
    ])
    .await;

    let count_for = |term: &'static str| {
        let session = &session;
        async move {
            let intent = BrowseIntent::new("products", 50).with_search(term);
            browse::fetch(session, &intent).await.unwrap()
        }
    };

    let page = count_for("50%_off").await;
    assert_eq!(page.total_rows, 1);
    assert_eq!(page.result.values[0][0], CellValue::Text("50%_off".into()));

    assert_eq!(count_for("%").await.total_rows, 1);
    assert_eq!(count_for("_").await.total_rows, 1);
    assert_eq!(count_for("\\").await.total_rows, 1);
    assert_eq!(count_for("'").await.total_rows, 1);
    assert_eq!(count_for("off").await.total_rows, 2);
    assert_eq!(count_for("nothing like this").await.total_rows, 0);
}

#[tokio::test]
async fn test_search_covers_numeric_columns() {
    let session = session_with(USERS_AND_ORDERS).await;
    let intent = BrowseIntent::new("orders", 50).with_search("9.5");
    let page = browse::fetch(&session, &intent).await.unwrap();
    assert_eq!(page.total_rows, 1);
}

#[tokio::test]
async fn test_sorted_window() {
    let session = session_with(USERS_AND_ORDERS).await;
    let intent = BrowseIntent::new("users", 1)
        .with_sort("name", SortDirection::Desc)
        .with_page(2);
    let page = browse::fetch(&session, &intent).await.unwrap();
    assert_eq!(page.total_rows, 2);
    assert_eq!(page.result.values.len(), 1);
    assert_eq!(page.result.values[0][1], CellValue::Text("Bob".into()));
}

#[tokio::test]
async fn test_load_selects_first_table() {
    let explorer = explorer_with(USERS_AND_ORDERS, 50).await;
    assert_eq!(explorer.tables().len(), 2);

    let view = explorer.view().unwrap();
    assert_eq!(view.table, "orders");
    assert_eq!(view.page, 1);
    assert_eq!(view.total_rows, 1);
    assert_eq!(view.columns.len(), 3);
}

#[tokio::test]
async fn test_edit_by_primary_key() {
    let mut explorer = explorer_with(USERS_AND_ORDERS, 50).await;
    explorer.select_table("users").await.unwrap();
    explorer.sort("id").await.unwrap();

    let statement = explorer
        .edit_displayed_cell(0, "name", CellValue::Null)
        .await
        .unwrap();
    assert_eq!(
        statement,
        "UPDATE \"users\" SET \"name\" = NULL WHERE \"id\" = '1';"
    );
    assert_eq!(explorer.edit_log().all(), &[statement]);

    // The view was refetched with the same sort.
    let view = explorer.view().unwrap();
    assert_eq!(view.sort.as_ref().unwrap().column, "id");
    let rows = &view.result.as_ref().unwrap().values;
    assert_eq!(rows[0], vec![CellValue::Integer(1), CellValue::Null]);
    assert_eq!(rows[1][1], CellValue::Text("Bob".into()));
}

#[tokio::test]
async fn test_edit_without_primary_key_matches_nulls() {
    let mut explorer = explorer_with(
        &[
            "CREATE TABLE notes (at TEXT, body TEXT)",
            "INSERT INTO notes VALUES ('mon', NULL)",
            "INSERT INTO notes VALUES ('tue', 'gym')",
        ],
        50,
    )
    .await;

    let edit = CellEdit {
        table: "notes".into(),
        column: "body".into(),
        new_value: CellValue::Text("read".into()),
        row: vec![CellValue::Text("mon".into()), CellValue::Null],
        row_columns: vec!["at".into(), "body".into()],
    };
    let statement = explorer.edit_cell(&edit).await.unwrap();
    assert_eq!(
        statement,
        "UPDATE \"notes\" SET \"body\" = 'read' WHERE \"at\" = 'mon' AND \"body\" IS NULL;"
    );

    let check = explorer
        .run_query("SELECT body FROM notes ORDER BY at")
        .await
        .unwrap();
    assert_eq!(
        check.values,
        vec![
            vec![CellValue::Text("read".into())],
            vec![CellValue::Text("gym".into())],
        ]
    );
}

#[tokio::test]
async fn test_failed_edit_changes_nothing() {
    let mut explorer = explorer_with(
        &[
            "CREATE TABLE strict (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
            "INSERT INTO strict VALUES (1, 'kept')",
        ],
        50,
    )
    .await;
    let before = explorer.view().cloned();

    let err = explorer
        .edit_displayed_cell(0, "name", CellValue::Null)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Edit(_)));
    assert_eq!(err.to_string(), "NOT NULL constraint failed: strict.name");

    assert!(explorer.edit_log().is_empty());
    assert_eq!(explorer.view().cloned(), before);
}

#[tokio::test]
async fn test_paging_sorting_and_search_reset() {
    let mut statements = vec!["CREATE TABLE items (n INTEGER, label TEXT)".to_string()];
    for n in 1..=120 {
        statements.push(format!("INSERT INTO items VALUES ({}, 'item {}')", n, n));
    }
    let statements: Vec<&str> = statements.iter().map(String::as_str).collect();
    let mut explorer = explorer_with(&statements, 50).await;

    assert_eq!(explorer.view().unwrap().total_pages(), 3);

    explorer.next_page().await.unwrap();
    explorer.next_page().await.unwrap();
    let view = explorer.view().unwrap();
    assert_eq!(view.page, 3);
    assert_eq!(view.result.as_ref().unwrap().values.len(), 20);

    explorer.goto_page(99).await.unwrap();
    assert_eq!(explorer.view().unwrap().page, 3);

    explorer.sort("n").await.unwrap();
    assert_eq!(explorer.view().unwrap().page, 1);
    explorer.goto_page(2).await.unwrap();
    explorer.sort("n").await.unwrap();
    let view = explorer.view().unwrap();
    assert_eq!(view.page, 1);
    assert_eq!(view.sort.as_ref().unwrap().direction, SortDirection::Desc);
    assert_eq!(view.result.as_ref().unwrap().values[0][0], CellValue::Integer(120));

    explorer.goto_page(2).await.unwrap();
    explorer.search("item 1").await.unwrap();
    let view = explorer.view().unwrap();
    assert_eq!(view.page, 1);
    // "item 1", "item 10".."item 19", "item 100".."item 120"
    assert_eq!(view.total_rows, 32);
    assert_eq!(view.sort.as_ref().unwrap().direction, SortDirection::Desc);

    explorer.prev_page().await.unwrap();
    assert_eq!(explorer.view().unwrap().page, 1);
}

#[tokio::test]
async fn test_loading_replaces_everything() {
    let mut explorer = explorer_with(USERS_AND_ORDERS, 50).await;
    explorer.select_table("users").await.unwrap();
    explorer
        .edit_displayed_cell(1, "name", CellValue::Text("Robert".into()))
        .await
        .unwrap();
    assert_eq!(explorer.edit_log().len(), 1);

    let other = image_with(&["CREATE TABLE things (id INTEGER PRIMARY KEY)"]).await;
    explorer.load(&other).await.unwrap();

    assert_eq!(explorer.tables().len(), 1);
    assert_eq!(explorer.tables()[0].name, "things");
    assert_eq!(explorer.view().unwrap().table, "things");
    assert!(explorer.edit_log().is_empty());
}

#[tokio::test]
async fn test_schema_script_and_table_csv() {
    let explorer = explorer_with(USERS_AND_ORDERS, 50).await;

    let script = explorer.schema_script().await.unwrap();
    assert!(script.starts_with("CREATE TABLE orders"));
    assert!(script.contains(";\nCREATE TABLE users"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.csv");
    dlens::export::export_table_csv(explorer.session(), "users", &path)
        .await
        .unwrap();
    let csv = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(csv, "id,name\n1,O'Brien\n2,Bob\n");
}

#[tokio::test]
async fn test_debounced_search_applies_latest_term() {
    let config = Config {
        search_debounce_ms: 30,
        ..Config::default()
    };
    let mut explorer = Explorer::new(&config);
    explorer.load(&image_with(USERS_AND_ORDERS).await).await.unwrap();
    explorer.select_table("users").await.unwrap();

    let (mut debouncer, mut terms) = explorer.search_debouncer();
    debouncer.push("B".to_string());
    debouncer.push("Bo".to_string());
    debouncer.push("O'B".to_string());

    let term = tokio::time::timeout(Duration::from_secs(2), terms.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(term, "O'B");
    explorer.search(&term).await.unwrap();

    let view = explorer.view().unwrap();
    assert_eq!(view.total_rows, 1);
    assert!(terms.try_recv().is_err());
}

#[tokio::test]
async fn test_invalid_utf8_text_is_still_browsable() {
    let explorer = explorer_with(
        &[
            "CREATE TABLE t (id INTEGER PRIMARY KEY, label TEXT)",
            "INSERT INTO t VALUES (1, CAST(X'FF' AS TEXT))",
            "INSERT INTO t VALUES (2, 'fine')",
        ],
        50,
    )
    .await;

    let view = explorer.view().unwrap();
    assert_eq!(view.table, "t");
    assert_eq!(view.total_rows, 2);
    let rows = &view.result.as_ref().unwrap().values;
    assert_eq!(rows[0][1], CellValue::Text("\u{FFFD}".into()));
    assert_eq!(rows[1][1], CellValue::Text("fine".into()));
}

#[tokio::test]
async fn test_row_json_follows_column_order() {
    let explorer = explorer_with(
        &[
            "CREATE TABLE t (zeta TEXT, alpha INTEGER PRIMARY KEY)",
            "INSERT INTO t VALUES ('z', 1)",
        ],
        50,
    )
    .await;

    let json = explorer.row_as_json(0).unwrap();
    assert_eq!(json, "{\n  \"zeta\": \"z\",\n  \"alpha\": 1\n}");
}
