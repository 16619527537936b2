use anyhow::Result;

use bayundb_exec::catalog::DataType;
use bayundb_exec::query::ast::{
    AggregationSpec, ColumnReference, Comparator, FilterSet, SelectColumn, Statement,
};
use bayundb_exec::{ExecutionEngine, QueryError, Session, Value};

#[path = "../common/mod.rs"]
mod common;
use common::*;

fn setup() -> (ExecutionEngine, Session) {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);
    setup_orders(&engine, &mut session);
    (engine, session)
}

fn users_orders_join() -> FilterSet {
    FilterSet::new(vec![join_cond(("users", "id"), Comparator::Equal, ("orders", "user_id"))])
}

#[test]
fn test_equi_join() -> Result<()> {
    let (engine, mut session) = setup();
    let select = select_stmt(
        &["users", "orders"],
        vec![SelectColumn::qualified("users", "name"), SelectColumn::named("amount")],
        users_orders_join(),
    );
    let response = exec_ok(&engine, &mut session, Statement::Select(select));
    assert_eq!(
        response.lines(),
        vec!["users.name | orders.amount", "alice | 12.5", "alice | 7.25", "carol | 30", "erin | 4"]
    );
    Ok(())
}

#[test]
fn test_cross_product_without_filter() -> Result<()> {
    let (engine, mut session) = setup();
    let select = select_stmt(&["users", "orders"], vec![SelectColumn::star()], FilterSet::default());
    let response = exec_ok(&engine, &mut session, Statement::Select(select));

    let lines = response.lines();
    assert_eq!(
        lines[0],
        "users.id | users.name | users.age | users.score | orders.id | orders.user_id | orders.amount | orders.placed"
    );
    assert_eq!(lines.len(), 1 + 5 * 4);
    // the last FROM table varies fastest
    assert_eq!(lines[1], "1 | alice | 30 | 88.5 | 100 | 1 | 12.5 | 2023-01-05");
    assert_eq!(lines[2], "1 | alice | 30 | 88.5 | 101 | 1 | 7.25 | 2023-02-11");
    assert_eq!(lines[5], "2 | bob | 25 | 72 | 100 | 1 | 12.5 | 2023-01-05");
    Ok(())
}

#[test]
fn test_local_conditions_with_join() -> Result<()> {
    let (engine, mut session) = setup();
    let mut filter = users_orders_join();
    filter.conditions.push(field_cond("users.age", Comparator::Greater, Value::Integer(30)));
    filter.conditions.push(field_cond("amount", Comparator::GreaterEqual, Value::Float(4.0)));

    let select = select_stmt(
        &["users", "orders"],
        vec![
            SelectColumn::named("name"),
            SelectColumn::Column {
                column: ColumnReference::qualified("orders", "id"),
                alias: Some("order".into()),
            },
        ],
        filter,
    );
    let response = exec_ok(&engine, &mut session, Statement::Select(select));
    assert_eq!(response.lines(), vec!["users.name | order", "carol | 102", "erin | 103"]);
    Ok(())
}

#[test]
fn test_table_wildcard_in_join() -> Result<()> {
    let (engine, mut session) = setup();
    let select = select_stmt(
        &["users", "orders"],
        vec![SelectColumn::Wildcard { table: Some("orders".into()) }],
        FilterSet::new(vec![
            join_cond(("users", "id"), Comparator::Equal, ("orders", "user_id")),
            field_cond("users.name", Comparator::Equal, Value::text("carol")),
        ]),
    );
    let response = exec_ok(&engine, &mut session, Statement::Select(select));
    assert_eq!(
        response.lines(),
        vec!["orders.id | orders.user_id | orders.amount | orders.placed", "102 | 3 | 30 | 2023-02-20"]
    );
    Ok(())
}

#[test]
fn test_join_with_empty_table() -> Result<()> {
    let (engine, mut session) = setup();
    exec_ok(&engine, &mut session, create_table_stmt("tags", &[("label", DataType::Text, Some(8))]));

    let select = select_stmt(&["users", "tags"], vec![SelectColumn::named("label")], FilterSet::default());
    let response = exec_ok(&engine, &mut session, Statement::Select(select));
    assert_eq!(response.text, "tags.label\n");
    Ok(())
}

#[test]
fn test_join_rejections() -> Result<()> {
    let (engine, mut session) = setup();

    let ambiguous = select_stmt(&["users", "orders"], vec![SelectColumn::named("id")], FilterSet::default());
    let response = engine.execute(&mut session, &Statement::Select(ambiguous));
    assert_eq!(response.text, "FAILURE\n");
    assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));

    let twice = select_stmt(&["users", "users"], vec![SelectColumn::star()], FilterSet::default());
    let response = engine.execute(&mut session, &Statement::Select(twice));
    assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));

    let mut aggregated = select_stmt(&["users", "orders"], vec![], users_orders_join());
    aggregated.aggregations = vec![AggregationSpec::count_star()];
    let response = engine.execute(&mut session, &Statement::Select(aggregated));
    assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));
    Ok(())
}
