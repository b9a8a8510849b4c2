use serde_json::json;
use tabledb::executor::QueryResult;
use tabledb::storage::{Row, Value};
use tabledb::{Engine, EngineConfig, Error, ErrorType, Response};
use tempfile::TempDir;

fn open(dir: &TempDir) -> Engine {
    Engine::open(EngineConfig::new().data_dir(dir.path())).unwrap()
}

fn select(engine: &mut Engine, sql: &str) -> Vec<Row> {
    match engine.execute(sql).unwrap().1 {
        QueryResult::Rows(rows) => rows,
        other => panic!("expected rows, got {:?}", other),
    }
}

fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter().filter_map(|r| r["id"].as_i64()).collect()
}

#[test]
fn test_duplicate_primary_key_scenario() {
    let dir = TempDir::new().unwrap();
    let mut engine = open(&dir);

    assert!(engine
        .execute_sql("CREATE TABLE t (id INT PRIMARY, n TEXT);")
        .is_ok());
    assert!(engine.execute_sql("INSERT INTO t VALUES (1, 'a');").is_ok());

    let response = engine.execute_sql("INSERT INTO t VALUES (1, 'b');");
    match response {
        Response::Error {
            error_type,
            message,
        } => {
            assert_eq!(error_type, ErrorType::Execution);
            assert!(message.contains("id"), "{}", message);
        }
        other => panic!("expected uniqueness failure, got {:?}", other),
    }

    let response = engine.execute_sql("SELECT * FROM t;");
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"status": "ok", "command": "SELECT", "result": [{"id": 1, "n": "a"}]})
    );
}

#[test]
fn test_primary_key_is_always_unique() {
    let dir = TempDir::new().unwrap();
    let mut engine = open(&dir);

    engine
        .execute("CREATE TABLE t (code TEXT, id INT PRIMARY KEY)")
        .unwrap();
    let schema = engine.catalog().get_table("t").unwrap();
    assert!(schema.is_unique("id"));
    assert!(!schema.is_unique("code"));
}

#[test]
fn test_create_table_failures() {
    let dir = TempDir::new().unwrap();
    let mut engine = open(&dir);
    engine.execute("CREATE TABLE t (id INT PRIMARY)").unwrap();

    assert!(matches!(
        engine.execute("CREATE TABLE t (id INT PRIMARY)"),
        Err(Error::TableAlreadyExists(_))
    ));
    assert!(matches!(
        engine.execute("CREATE TABLE u (id INT PRIMARY, id TEXT)"),
        Err(Error::Schema(_))
    ));
    assert!(matches!(
        engine.execute("CREATE TABLE v (id DECIMAL PRIMARY)"),
        Err(Error::Schema(_))
    ));
    assert_eq!(engine.catalog().list_tables(), vec!["t"]);
}

#[test]
fn test_rejected_inserts_leave_extent_unchanged() {
    let dir = TempDir::new().unwrap();
    let mut engine = open(&dir);
    engine
        .execute("CREATE TABLE users (id INT PRIMARY, email TEXT UNIQUE)")
        .unwrap();
    engine
        .execute("INSERT INTO users VALUES (1, 'a@x')")
        .unwrap();

    for sql in [
        "INSERT INTO users VALUES (2)",
        "INSERT INTO users VALUES (2, 'b@x', TRUE)",
        "INSERT INTO users VALUES (2, 'a@x')",
        "INSERT INTO users VALUES ('2', 'b@x')",
    ] {
        assert!(engine.execute(sql).is_err(), "{}", sql);
        assert_eq!(select(&mut engine, "SELECT * FROM users").len(), 1);
    }
}

#[test]
fn test_select_returns_rows_in_insertion_order() {
    let dir = TempDir::new().unwrap();
    let mut engine = open(&dir);
    engine.execute("CREATE TABLE t (id INT PRIMARY)").unwrap();

    let inserted: [i64; 5] = [5, 3, 9, 1, 7];
    for id in inserted {
        engine
            .execute(&format!("INSERT INTO t VALUES ({})", id))
            .unwrap();
    }

    assert_eq!(ids(&select(&mut engine, "SELECT * FROM t")), inserted);
}

#[test]
fn test_update_unique_column() {
    let dir = TempDir::new().unwrap();
    let mut engine = open(&dir);
    engine
        .execute("CREATE TABLE t (id INT PRIMARY, name TEXT UNIQUE)")
        .unwrap();
    engine.execute("INSERT INTO t VALUES (1, 'a')").unwrap();
    engine.execute("INSERT INTO t VALUES (2, 'b')").unwrap();

    let err = engine
        .execute("UPDATE t SET name = 'a' WHERE id = 2")
        .unwrap_err();
    assert!(matches!(err, Error::UniqueViolation(_)));

    let rows = select(&mut engine, "SELECT name FROM t");
    let names: Vec<_> = rows.iter().map(|r| r["name"].clone()).collect();
    assert_eq!(names, vec![Value::from("a"), Value::from("b")]);

    // Same value on the same row is not a conflict
    let (_, result) = engine
        .execute("UPDATE t SET name = 'b' WHERE id = 2")
        .unwrap();
    assert_eq!(result.rows_affected(), Some(1));
}

#[test]
fn test_delete_preserves_remaining_order() {
    let dir = TempDir::new().unwrap();
    let mut engine = open(&dir);
    engine
        .execute("CREATE TABLE t (id INT PRIMARY, tag TEXT)")
        .unwrap();
    for (id, tag) in [(1, "x"), (2, "y"), (3, "x"), (4, "z"), (5, "y")] {
        engine
            .execute(&format!("INSERT INTO t VALUES ({}, '{}')", id, tag))
            .unwrap();
    }

    let (_, result) = engine.execute("DELETE FROM t WHERE tag = 'y'").unwrap();
    assert_eq!(result.rows_affected(), Some(2));
    assert_eq!(ids(&select(&mut engine, "SELECT * FROM t")), vec![1i64, 3, 4]);
}

#[test]
fn test_drop_then_select() {
    let dir = TempDir::new().unwrap();
    let mut engine = open(&dir);
    engine.execute("CREATE TABLE t (id INT PRIMARY)").unwrap();
    engine.execute("DROP TABLE t").unwrap();

    assert!(matches!(
        engine.execute("SELECT * FROM t"),
        Err(Error::TableNotFound(_))
    ));
    assert!(!dir.path().join("tables").join("t.json").exists());
}

#[test]
fn test_reopen_round_trip() {
    let dir = TempDir::new().unwrap();
    let before = {
        let mut engine = open(&dir);
        engine
            .execute("CREATE TABLE t (id INT PRIMARY, name TEXT, ok BOOLEAN)")
            .unwrap();
        engine.execute("INSERT INTO t VALUES (2, 'b', TRUE)").unwrap();
        engine.execute("INSERT INTO t VALUES (1, 'a', FALSE)").unwrap();
        select(&mut engine, "SELECT * FROM t")
    };

    let mut engine = open(&dir);
    assert_eq!(select(&mut engine, "SELECT * FROM t"), before);
    // Constraints survive the reload too
    assert!(matches!(
        engine.execute("INSERT INTO t VALUES (1, 'c', TRUE)"),
        Err(Error::UniqueViolation(_))
    ));
}

#[test]
fn test_where_clause_is_single_equality() {
    let dir = TempDir::new().unwrap();
    let mut engine = open(&dir);
    engine
        .execute("CREATE TABLE t (id INT PRIMARY, n TEXT)")
        .unwrap();

    for sql in [
        "SELECT * FROM t WHERE id = 1 AND n = 'a'",
        "SELECT * FROM t WHERE id > 1",
        "DELETE FROM t WHERE id = 1 OR id = 2",
        "UPDATE t SET n = 'b' WHERE id <> 1",
    ] {
        let response = engine.execute_sql(sql);
        assert!(
            matches!(
                response,
                Response::Error {
                    error_type: ErrorType::Parse,
                    ..
                }
            ),
            "{}: {:?}",
            sql,
            response
        );
    }
}

#[test]
fn test_boolean_and_integer_do_not_compare_equal() {
    let dir = TempDir::new().unwrap();
    let mut engine = open(&dir);
    engine
        .execute("CREATE TABLE t (id INT PRIMARY, flag BOOL)")
        .unwrap();
    engine.execute("INSERT INTO t VALUES (1, TRUE)").unwrap();

    assert!(matches!(
        engine.execute("INSERT INTO t VALUES (TRUE, FALSE)"),
        Err(Error::TypeMismatch { .. })
    ));
    assert!(select(&mut engine, "SELECT * FROM t WHERE flag = 1").is_empty());
    assert_eq!(select(&mut engine, "SELECT * FROM t WHERE flag = TRUE").len(), 1);
}
