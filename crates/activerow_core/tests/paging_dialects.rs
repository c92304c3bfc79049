use activerow_core::db::open_db_in_memory;
use activerow_core::{Dialect, Entity, EntityConfig, EntityError, FindOptions};
use rusqlite::Connection;

fn setup() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );",
    )
    .unwrap();
    for index in 0..7 {
        conn.execute("INSERT INTO items (name) VALUES (?1);", [format!("n{index}")])
            .unwrap();
    }
    conn
}

fn items(conn: &Connection, dialect: Option<Dialect>) -> Entity<'_> {
    let mut config = EntityConfig::new("items").fields(["name"]);
    if let Some(dialect) = dialect {
        config = config.dialect(dialect);
    }
    Entity::new(conn, config).unwrap()
}

fn names(entity: &Entity<'_>) -> Vec<String> {
    entity
        .records()
        .iter()
        .map(|record| record.get("name").unwrap().to_string())
        .collect()
}

fn window(all: &[String], start: u32, limit: u32) -> Vec<String> {
    let start = (start as usize).min(all.len());
    let end = (start + limit as usize).min(all.len());
    all[start..end].to_vec()
}

#[test]
fn sqlite_detects_offset_limit() {
    let conn = setup();
    let entity = items(&conn, None);
    assert_eq!(entity.dialect(), Dialect::OffsetLimit);
}

#[test]
fn paged_reads_match_slices_of_unpaged_read() {
    let conn = setup();
    for dialect in [Dialect::OffsetLimit, Dialect::RowNumber] {
        let mut entity = items(&conn, Some(dialect));
        entity.find(&FindOptions::new()).unwrap();
        let all = names(&entity);
        assert_eq!(all.len(), 7);

        for (start, limit) in [(0, 3), (2, 2), (5, 5), (6, 1), (7, 3), (0, 10)] {
            entity
                .find(&FindOptions::new().range(start, limit))
                .unwrap();
            assert_eq!(
                names(&entity),
                window(&all, start, limit),
                "dialect={dialect} start={start} limit={limit}"
            );
        }
    }
}

#[test]
fn paging_respects_filter_binding_and_order() {
    let conn = setup();
    for dialect in [Dialect::OffsetLimit, Dialect::RowNumber] {
        let mut entity = items(&conn, Some(dialect));
        let base = FindOptions::new()
            .filter("`name` <> :skip")
            .order_by("`name` DESC")
            .bind("skip", "n3");

        entity.find(&base).unwrap();
        let all = names(&entity);
        assert_eq!(all, vec!["n6", "n5", "n4", "n2", "n1", "n0"]);

        entity.find(&base.clone().range(1, 3)).unwrap();
        assert_eq!(names(&entity), vec!["n5", "n4", "n2"], "dialect={dialect}");
    }
}

#[test]
fn zero_limit_reads_everything() {
    let conn = setup();
    let mut entity = items(&conn, None);
    entity.find(&FindOptions::new().range(4, 0)).unwrap();
    assert_eq!(entity.count(), 7);
}

#[test]
fn first_skip_dialect_fails_only_for_paged_reads_on_sqlite() {
    let conn = setup();
    let mut entity = items(&conn, Some(Dialect::FirstSkip));

    assert!(entity.find(&FindOptions::new()).unwrap());
    assert_eq!(entity.count(), 7);

    let err = entity.find(&FindOptions::new().range(0, 2)).unwrap_err();
    assert!(matches!(err, EntityError::Db(_)));
    assert_eq!(entity.count(), 7);
}

#[test]
fn statement_cache_rebuilds_only_on_shape_change() {
    let conn = setup();
    let mut entity = items(&conn, None);
    let initial = entity.statements().rebuild_count();

    entity.find(&FindOptions::new()).unwrap();
    entity.find(&FindOptions::new()).unwrap();
    assert_eq!(entity.statements().rebuild_count(), initial);

    let paged = FindOptions::new().range(0, 2);
    entity.find(&paged).unwrap();
    let after_paged = entity.statements().rebuild_count();
    assert_eq!(after_paged, initial + 1);

    entity.find(&paged).unwrap();
    assert_eq!(entity.statements().rebuild_count(), after_paged);

    entity.find(&FindOptions::new().range(2, 2)).unwrap();
    assert_eq!(entity.statements().rebuild_count(), after_paged + 1);
}
