use anyhow::Result;

use bayundb_exec::query::ast::{
    ArithmeticOp, ColumnReference, Comparator, Condition, Expression, FilterSet, SelectColumn,
    Statement,
};
use bayundb_exec::{EngineConfig, ExecutionEngine, QueryError, Session, Value};

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[test]
fn test_select_star_renders_every_row() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let select = select_stmt(&["users"], vec![SelectColumn::star()], FilterSet::default());
    let response = exec_ok(&engine, &mut session, Statement::Select(select));

    assert_eq!(
        response.text,
        "id | name | age | score\n\
         1 | alice | 30 | 88.5\n\
         2 | bob | 25 | 72\n\
         3 | carol | 35 | 91.25\n\
         4 | dave | 25 | 60\n\
         5 | erin | 41 | 79.75\n"
    );
    Ok(())
}

#[test]
fn test_projection_order_and_alias() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let columns = vec![
        SelectColumn::named("name"),
        SelectColumn::Column { column: ColumnReference::new("id"), alias: Some("uid".into()) },
    ];
    let filter = FilterSet::new(vec![field_cond("age", Comparator::Equal, Value::Integer(25))]);
    let response = exec_ok(&engine, &mut session, Statement::Select(select_stmt(&["users"], columns, filter)));

    assert_eq!(response.lines(), vec!["name | uid", "bob | 2", "dave | 4"]);
    Ok(())
}

#[test]
fn test_empty_result_keeps_header() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let filter = FilterSet::new(vec![field_cond("age", Comparator::Greater, Value::Integer(100))]);
    let select = select_stmt(&["users"], vec![SelectColumn::named("id")], filter);
    let response = exec_ok(&engine, &mut session, Statement::Select(select));
    assert_eq!(response.text, "id\n");
    Ok(())
}

#[test]
fn test_conjunctive_filter() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let filter = FilterSet::new(vec![
        field_cond("age", Comparator::GreaterEqual, Value::Integer(30)),
        field_cond("name", Comparator::NotEqual, Value::text("carol")),
    ]);
    let select = select_stmt(&["users"], vec![SelectColumn::named("name")], filter);
    let response = exec_ok(&engine, &mut session, Statement::Select(select));
    assert_eq!(body_lines(&response), vec!["alice", "erin"]);
    Ok(())
}

#[test]
fn test_computed_expressions() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let mut select = select_stmt(
        &["users"],
        vec![SelectColumn::named("name")],
        FilterSet::new(vec![field_cond("id", Comparator::LessEqual, Value::Integer(2))]),
    );
    select.expressions = vec![
        Expression::binary(Expression::column("score"), ArithmeticOp::Multiply, Expression::literal(Value::Integer(2))),
        Expression::binary(Expression::column("age"), ArithmeticOp::Divide, Expression::literal(Value::Integer(2))),
        Expression::negate(Expression::grouped(Expression::binary(
            Expression::column("age"),
            ArithmeticOp::Add,
            Expression::column("id"),
        ))),
    ];
    let response = exec_ok(&engine, &mut session, Statement::Select(select));

    assert_eq!(
        response.lines(),
        vec!["name | score * 2 | age / 2 | -(age + id)", "alice | 177 | 15 | -31", "bob | 144 | 12.5 | -27"]
    );
    Ok(())
}

#[test]
fn test_expression_in_filter() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let cond = Condition::new(
        Expression::binary(Expression::column("age"), ArithmeticOp::Add, Expression::literal(Value::Integer(5))),
        Comparator::Greater,
        Expression::literal(Value::Integer(35)),
    );
    let select = select_stmt(&["users"], vec![SelectColumn::named("id")], FilterSet::new(vec![cond]));
    let response = exec_ok(&engine, &mut session, Statement::Select(select));
    assert_eq!(body_lines(&response), vec!["3", "5"]);
    Ok(())
}

#[test]
fn test_float_precision_setting() -> Result<()> {
    let seventh = Expression::binary(Expression::column("age"), ArithmeticOp::Divide, Expression::literal(Value::Integer(7)));
    let filter = FilterSet::new(vec![field_cond("id", Comparator::Equal, Value::Integer(1))]);

    for (config, expected) in [
        (EngineConfig::default(), "4.29"),
        (EngineConfig::default().with_float_precision(4), "4.2857"),
    ] {
        let (engine, mut session) = test_engine_with(config);
        setup_users(&engine, &mut session);
        let mut select = select_stmt(&["users"], vec![], filter.clone());
        select.expressions = vec![seventh.clone()];
        let response = exec_ok(&engine, &mut session, Statement::Select(select));
        assert_eq!(body_lines(&response), vec![expected]);
    }
    Ok(())
}

#[test]
fn test_unresolved_references_fail_before_execution() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let missing_table = select_stmt(&["nope"], vec![SelectColumn::star()], FilterSet::default());
    let response = engine.execute(&mut session, &Statement::Select(missing_table));
    assert_eq!(response.text, "FAILURE\n");
    assert!(matches!(response.error, Some(QueryError::SchemaNotFound(_))));

    let missing_field = select_stmt(&["users"], vec![SelectColumn::named("email")], FilterSet::default());
    let response = engine.execute(&mut session, &Statement::Select(missing_field));
    assert_eq!(response.text, "FAILURE\n");
    assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));

    let bad_filter = select_stmt(
        &["users"],
        vec![SelectColumn::star()],
        FilterSet::new(vec![field_cond("orders.id", Comparator::Equal, Value::Integer(1))]),
    );
    let response = engine.execute(&mut session, &Statement::Select(bad_filter));
    assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));
    Ok(())
}

#[test]
fn test_evaluation_errors_keep_partial_output() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let mut select = select_stmt(&["users"], vec![SelectColumn::named("id")], FilterSet::default());
    select.expressions = vec![Expression::binary(
        Expression::column("age"),
        ArithmeticOp::Divide,
        Expression::literal(Value::Integer(0)),
    )];
    let response = engine.execute(&mut session, &Statement::Select(select));
    assert_eq!(response.text, "id | age / 0\n");
    assert_eq!(response.error, Some(QueryError::DivisionByZero));

    let mismatched = select_stmt(
        &["users"],
        vec![SelectColumn::named("id")],
        FilterSet::new(vec![field_cond("name", Comparator::Equal, Value::Integer(5))]),
    );
    let response = engine.execute(&mut session, &Statement::Select(mismatched));
    assert!(matches!(response.error, Some(QueryError::TypeError(_))));
    Ok(())
}

#[test]
fn test_select_without_tables_is_generic_error() {
    let (engine, mut session) = test_engine();
    let select = select_stmt(&[], vec![SelectColumn::star()], FilterSet::default());
    let response = engine.execute(&mut session, &Statement::Select(select));
    assert!(matches!(response.error, Some(QueryError::Generic(_))));
}

#[test]
fn test_dates_render_canonically() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_orders(&engine, &mut session);

    let filter = FilterSet::new(vec![field_cond("placed", Comparator::GreaterEqual, Value::text("2023-02-20"))]);
    let select = select_stmt(&["orders"], vec![SelectColumn::named("id"), SelectColumn::named("placed")], filter);
    let response = exec_ok(&engine, &mut session, Statement::Select(select));
    assert_eq!(response.lines(), vec!["id | placed", "102 | 2023-02-20", "103 | 2023-03-01"]);
    Ok(())
}

fn placed_ids(engine: &ExecutionEngine, session: &mut Session, comparator: Comparator, date: &str) -> Vec<String> {
    let filter = FilterSet::new(vec![field_cond("placed", comparator, Value::text(date))]);
    let select = select_stmt(&["orders"], vec![SelectColumn::named("id")], filter);
    body_lines(&exec_ok(engine, session, Statement::Select(select)))
}

#[test]
fn test_non_canonical_date_literals_in_filters() -> Result<()> {
    for indexed in [false, true] {
        let (engine, mut session) = test_engine();
        setup_orders(&engine, &mut session);
        exec_ok(
            &engine,
            &mut session,
            insert_stmt("orders", vec![Value::Integer(200), Value::Integer(2), Value::Float(5.0), Value::text("2023-2-20")]),
        );
        if indexed {
            exec_ok(&engine, &mut session, create_index_stmt("orders_placed", "orders", "placed", false));
        }

        assert_eq!(
            placed_ids(&engine, &mut session, Comparator::Equal, "2023-2-20"),
            vec!["102", "200"],
            "indexed: {indexed}"
        );
        assert_eq!(
            placed_ids(&engine, &mut session, Comparator::Less, "2023-3-1"),
            vec!["100", "101", "102", "200"],
            "indexed: {indexed}"
        );

        let filter = FilterSet::new(vec![field_cond("placed", Comparator::Equal, Value::text("2023-02-30"))]);
        let select = select_stmt(&["orders"], vec![SelectColumn::named("id")], filter);
        let response = engine.execute(&mut session, &Statement::Select(select));
        assert_eq!(response.text, "FAILURE\n");
        assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));
    }
    Ok(())
}
