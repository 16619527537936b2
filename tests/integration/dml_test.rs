use anyhow::Result;

use bayundb_exec::query::ast::{
    Comparator, DeleteStatement, FilterSet, SelectColumn, Statement, UpdateStatement,
};
use bayundb_exec::storage::StorageError;
use bayundb_exec::{ExecutionEngine, QueryError, Session, Value};

#[path = "../common/mod.rs"]
mod common;
use common::*;

fn update_stmt(column: &str, value: Value, filter: FilterSet) -> Statement {
    Statement::Update(UpdateStatement {
        table_name: "users".into(),
        column: column.into(),
        value,
        filter,
    })
}

fn delete_stmt(filter: FilterSet) -> Statement {
    Statement::Delete(DeleteStatement { table_name: "users".into(), filter })
}

fn names_and(engine: &ExecutionEngine, session: &mut Session, column: &str) -> Vec<String> {
    let select = select_stmt(
        &["users"],
        vec![SelectColumn::named("name"), SelectColumn::named(column)],
        FilterSet::default(),
    );
    body_lines(&exec_ok(engine, session, Statement::Select(select)))
}

#[test]
fn test_insert_validation() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let cases = vec![
        vec![Value::Integer(9), Value::text("zed")],
        vec![Value::text("9"), Value::text("zed"), Value::Integer(20), Value::Float(1.0)],
        vec![Value::Integer(9), Value::text("a name far too long"), Value::Integer(20), Value::Float(1.0)],
        vec![Value::Integer(9), Value::text("zed"), Value::Float(20.5), Value::Float(1.0)],
    ];
    for values in cases {
        let response = engine.execute(&mut session, &insert_stmt("users", values));
        assert_eq!(response.text, "FAILURE\n");
        assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));
    }
    assert_eq!(engine.storage().record_count("users")?, 5);

    let response = engine.execute(&mut session, &insert_stmt("ghosts", vec![Value::Integer(1)]));
    assert!(matches!(response.error, Some(QueryError::SchemaNotFound(_))));
    Ok(())
}

#[test]
fn test_insert_widens_and_normalises() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);
    setup_orders(&engine, &mut session);

    exec_ok(
        &engine,
        &mut session,
        insert_stmt("orders", vec![Value::Integer(104), Value::Integer(2), Value::Integer(7), Value::text("2023-4-9")]),
    );
    let select = select_stmt(
        &["orders"],
        vec![SelectColumn::named("amount"), SelectColumn::named("placed")],
        FilterSet::new(vec![field_cond("id", Comparator::Equal, Value::Integer(104))]),
    );
    let response = exec_ok(&engine, &mut session, Statement::Select(select));
    assert_eq!(body_lines(&response), vec!["7 | 2023-04-09"]);

    let bad_date = insert_stmt(
        "orders",
        vec![Value::Integer(105), Value::Integer(2), Value::Float(1.0), Value::text("2023-02-30")],
    );
    let response = engine.execute(&mut session, &bad_date);
    assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));
    Ok(())
}

#[test]
fn test_update_matching_rows() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let filter = FilterSet::new(vec![field_cond("age", Comparator::Equal, Value::Integer(25))]);
    let response = exec_ok(&engine, &mut session, update_stmt("score", Value::Integer(100), filter));
    assert_eq!(response.text, "SUCCESS\n");

    assert_eq!(
        names_and(&engine, &mut session, "score"),
        vec!["alice | 88.5", "bob | 100", "carol | 91.25", "dave | 100", "erin | 79.75"]
    );
    Ok(())
}

#[test]
fn test_update_of_filtered_column_applies_once() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let filter = FilterSet::new(vec![field_cond("age", Comparator::Less, Value::Integer(40))]);
    exec_ok(&engine, &mut session, update_stmt("age", Value::Integer(40), filter));
    assert_eq!(
        names_and(&engine, &mut session, "age"),
        vec!["alice | 40", "bob | 40", "carol | 40", "dave | 40", "erin | 41"]
    );
    Ok(())
}

#[test]
fn test_update_rejections() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let response = engine.execute(&mut session, &update_stmt("height", Value::Integer(1), FilterSet::default()));
    assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));

    let response = engine.execute(&mut session, &update_stmt("age", Value::text("old"), FilterSet::default()));
    assert_eq!(response.text, "FAILURE\n");
    assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));

    let bad_filter = FilterSet::new(vec![field_cond("height", Comparator::Equal, Value::Integer(1))]);
    let response = engine.execute(&mut session, &update_stmt("age", Value::Integer(1), bad_filter));
    assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));

    assert_eq!(
        names_and(&engine, &mut session, "age"),
        vec!["alice | 30", "bob | 25", "carol | 35", "dave | 25", "erin | 41"]
    );
    Ok(())
}

#[test]
fn test_update_stops_at_first_storage_error() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);
    exec_ok(&engine, &mut session, create_index_stmt("users_id", "users", "id", true));

    let filter = FilterSet::new(vec![field_cond("age", Comparator::Equal, Value::Integer(25))]);
    let response = engine.execute(&mut session, &update_stmt("id", Value::Integer(9), filter));
    assert_eq!(response.text, "FAILURE\n");
    assert!(matches!(
        response.error,
        Some(QueryError::Storage(StorageError::DuplicateKey { .. }))
    ));

    // bob was updated before dave collided with him
    assert_eq!(
        names_and(&engine, &mut session, "id"),
        vec!["alice | 1", "bob | 9", "carol | 3", "dave | 4", "erin | 5"]
    );
    Ok(())
}

#[test]
fn test_delete_with_and_without_filter() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let filter = FilterSet::new(vec![field_cond("score", Comparator::Less, Value::Integer(80))]);
    exec_ok(&engine, &mut session, delete_stmt(filter));
    assert_eq!(names_and(&engine, &mut session, "id"), vec!["alice | 1", "carol | 3"]);

    exec_ok(&engine, &mut session, delete_stmt(FilterSet::default()));
    assert!(names_and(&engine, &mut session, "id").is_empty());
    assert_eq!(engine.storage().record_count("users")?, 0);

    let response = engine.execute(
        &mut session,
        &Statement::Delete(DeleteStatement { table_name: "ghosts".into(), filter: FilterSet::default() }),
    );
    assert!(matches!(response.error, Some(QueryError::SchemaNotFound(_))));
    Ok(())
}
