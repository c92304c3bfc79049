use activerow_core::db::open_db_in_memory;
use activerow_core::{Entity, EntityConfig, EventKind, FieldValue, FindOptions, Record};
use rusqlite::Connection;
use std::cell::Cell;
use std::rc::Rc;

fn setup() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE people (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT
        );
        INSERT INTO people (name) VALUES ('a'), ('b'), ('c');",
    )
    .unwrap();
    conn
}

fn people(conn: &Connection) -> Entity<'_> {
    Entity::new(conn, EntityConfig::new("people").fields(["name"]).writable(true)).unwrap()
}

#[test]
fn invert_then_first_lands_on_last_fetched_row() {
    let conn = setup();
    let mut entity = people(&conn);
    assert!(entity.find(&FindOptions::new()).unwrap());

    entity.invert();
    assert_eq!(entity.position(), -1);
    assert!(entity.first());
    assert_eq!(entity.text("name").unwrap(), "c");
}

#[test]
fn prev_from_unset_wraps_to_last() {
    let conn = setup();
    let mut entity = people(&conn);
    entity.find(&FindOptions::new()).unwrap();

    assert!(entity.prev());
    assert_eq!(entity.position(), 2);
    assert_eq!(entity.text("name").unwrap(), "c");
}

#[test]
fn moving_out_of_bounds_clears_then_restarts() {
    let conn = setup();
    let mut entity = people(&conn);
    entity.find(&FindOptions::new()).unwrap();

    assert!(entity.last());
    assert!(!entity.next());
    assert_eq!(entity.position(), -1);
    assert!(!entity.is_available());
    assert!(entity.record().id().is_empty());

    assert!(entity.next());
    assert_eq!(entity.position(), 0);
    assert!(!entity.get(7));
    assert!(!entity.get(-2));
    assert!(entity.get(1));
    assert_eq!(entity.text("name").unwrap(), "b");
}

#[test]
fn find_ids_with_empty_list_resets_without_querying() {
    let conn = setup();
    let mut entity = people(&conn);
    let finds = Rc::new(Cell::new(0));
    let counter = Rc::clone(&finds);
    entity.subscribe(EventKind::Find, move |_| counter.set(counter.get() + 1));

    entity.find(&FindOptions::new()).unwrap();
    assert_eq!(finds.get(), 1);

    assert!(!entity.find_ids(Vec::<i64>::new()).unwrap());
    assert_eq!(finds.get(), 1);
    assert!(!entity.has_records());
    assert_eq!(entity.count(), 0);
    assert_eq!(entity.position(), -1);
}

#[test]
fn find_ids_fetches_each_listed_key() {
    let conn = setup();
    let mut entity = people(&conn);

    assert!(entity.find_ids([1, 3]).unwrap());
    let names: Vec<String> = entity
        .records()
        .iter()
        .map(|record| record.get("name").unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["a", "c"]);
}

#[test]
fn reset_drops_rows_and_position() {
    let conn = setup();
    let mut entity = people(&conn);
    entity.find(&FindOptions::new()).unwrap();
    entity.first();

    assert!(entity.reset());
    assert!(!entity.has_records());
    assert_eq!(entity.count(), 0);
    assert_eq!(entity.position(), -1);
    assert!(!entity.first());
}

#[test]
fn empty_result_still_counts_as_fetched() {
    let conn = setup();
    let mut entity = people(&conn);

    assert!(entity
        .find(&FindOptions::new().filter("`name` = :name").bind("name", "zzz"))
        .unwrap());
    assert!(entity.has_records());
    assert_eq!(entity.count(), 0);
    assert!(!entity.first());
    assert_eq!(entity.position(), -1);
}

#[test]
fn blank_where_skips_query_and_keeps_rows() {
    let conn = setup();
    let mut entity = people(&conn);
    entity.find(&FindOptions::new()).unwrap();

    assert!(!entity.find(&FindOptions::new().filter("   ")).unwrap());
    assert_eq!(entity.count(), 3);
}

#[test]
fn locked_entity_ignores_find_moves_and_reset() {
    let conn = setup();
    let mut entity = people(&conn);
    entity.find(&FindOptions::new()).unwrap();
    entity.first();
    entity.lock_record();

    assert!(entity.is_locked());
    assert!(!entity.find(&FindOptions::new().filter("`id` = 3")).unwrap());
    assert!(!entity.next());
    assert!(!entity.last());
    assert!(!entity.reset());
    assert!(!entity.remove());
    assert_eq!(entity.position(), 0);
    assert_eq!(entity.count(), 3);
    assert_eq!(entity.text("name").unwrap(), "a");
}

#[test]
fn each_visits_rows_in_order_and_may_save() {
    let conn = setup();
    let mut entity = people(&conn);
    entity.find(&FindOptions::new()).unwrap();

    let mut seen = Vec::new();
    entity.each(|row| {
        let name = row.text("name").unwrap();
        seen.push(name.clone());
        row.set("name", name.to_uppercase());
        row.save().unwrap();
    });

    assert_eq!(seen, vec!["a", "b", "c"]);
    assert_eq!(entity.count(), 3);
    assert_eq!(entity.position(), -1);

    let stored: Vec<String> = conn
        .prepare("SELECT name FROM people ORDER BY id;")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(stored, vec!["A", "B", "C"]);
}

#[test]
fn remove_evicts_row_and_steps_back() {
    let conn = setup();
    let mut entity = people(&conn);
    entity.find(&FindOptions::new()).unwrap();
    entity.get(1);

    assert!(entity.remove());
    assert_eq!(entity.count(), 2);
    assert_eq!(entity.position(), 0);
    assert_eq!(entity.text("name").unwrap(), "a");

    entity.clear();
    assert!(!entity.remove());
    assert_eq!(entity.count(), 2);
}

#[test]
fn locked_entity_keeps_order_and_cursor_through_writes() {
    let conn = setup();
    let mut entity = people(&conn);
    entity.find(&FindOptions::new()).unwrap();
    entity.first();
    entity.lock_record();

    assert!(!entity.invert());
    assert!(!entity.clear());
    assert_eq!(entity.position(), 0);
    assert_eq!(entity.text("name").unwrap(), "a");

    entity.set("name", "a2");
    assert!(!entity.save().unwrap());
    assert_eq!(entity.position(), 0);
    assert_eq!(entity.count(), 3);
    assert_eq!(
        entity.records()[0].get("name"),
        Some(&FieldValue::from("a2"))
    );

    let mut fresh = Record::new("id");
    fresh.set("name", "d");
    entity.set_record(&fresh);
    assert!(entity.save().unwrap());
    assert_eq!(entity.position(), 0);
    assert_eq!(entity.count(), 4);
    let first_names: Vec<String> = entity
        .records()
        .iter()
        .map(|record| record.get("name").unwrap().to_string())
        .collect();
    assert_eq!(first_names, vec!["a2", "b", "c", "d"]);

    let stored: i64 = conn
        .query_row("SELECT COUNT(*) FROM people;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(stored, 4);
}

#[test]
fn caller_binds_named_start_and_limit_win_over_defaults() {
    let conn = setup();
    let mut entity = people(&conn);

    entity
        .find(
            &FindOptions::new()
                .filter("`id` > :start AND `id` <= :limit")
                .bind("start", 1)
                .bind("limit", 3),
        )
        .unwrap();
    let names: Vec<String> = entity
        .records()
        .iter()
        .map(|record| record.get("name").unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["b", "c"]);
}
