use anyhow::Result;

use bayundb_exec::query::ast::{
    AggregateKind, AggregateTarget, AggregationSpec, Comparator, FilterSet, SelectColumn,
    SelectStatement, Statement,
};
use bayundb_exec::{QueryError, Value};

#[path = "../common/mod.rs"]
mod common;
use common::*;

fn aggregate_stmt(table: &str, specs: Vec<AggregationSpec>, filter: FilterSet) -> Statement {
    Statement::Select(SelectStatement {
        tables: vec![table.to_string()],
        aggregations: specs,
        filter,
        ..Default::default()
    })
}

#[test]
fn test_summary_over_whole_table() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let specs = vec![
        AggregationSpec::count_star(),
        AggregationSpec::over(AggregateKind::Min, "age"),
        AggregationSpec::over(AggregateKind::Max, "age"),
        AggregationSpec::over(AggregateKind::Avg, "score"),
    ];
    let response = exec_ok(&engine, &mut session, aggregate_stmt("users", specs, FilterSet::default()));
    assert_eq!(response.lines(), vec!["COUNT(*) | MIN(AGE) | MAX(AGE) | AVG(SCORE)", "5 | 25 | 41 | 78.3"]);
    Ok(())
}

#[test]
fn test_filtered_summary() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let specs = vec![AggregationSpec::count_star(), AggregationSpec::over(AggregateKind::Avg, "score")];
    let filter = FilterSet::new(vec![field_cond("age", Comparator::Equal, Value::Integer(25))]);
    let response = exec_ok(&engine, &mut session, aggregate_stmt("users", specs, filter));
    assert_eq!(body_lines(&response), vec!["2 | 66"]);
    Ok(())
}

#[test]
fn test_text_and_date_extremes() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);
    setup_orders(&engine, &mut session);

    let specs = vec![
        AggregationSpec::over(AggregateKind::Min, "name"),
        AggregationSpec::over(AggregateKind::Max, "name"),
    ];
    let response = exec_ok(&engine, &mut session, aggregate_stmt("users", specs, FilterSet::default()));
    assert_eq!(body_lines(&response), vec!["alice | erin"]);

    let specs = vec![
        AggregationSpec::over(AggregateKind::Min, "placed"),
        AggregationSpec::over(AggregateKind::Max, "placed"),
        AggregationSpec::over(AggregateKind::Count, "amount"),
    ];
    let response = exec_ok(&engine, &mut session, aggregate_stmt("orders", specs, FilterSet::default()));
    assert_eq!(
        response.lines(),
        vec!["MIN(PLACED) | MAX(PLACED) | COUNT(AMOUNT)", "2023-01-05 | 2023-03-01 | 4"]
    );
    Ok(())
}

#[test]
fn test_empty_input_summary() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let specs = vec![
        AggregationSpec::count_star(),
        AggregationSpec::over(AggregateKind::Avg, "score"),
        AggregationSpec::over(AggregateKind::Min, "name"),
    ];
    let filter = FilterSet::new(vec![field_cond("age", Comparator::Greater, Value::Integer(99))]);
    let response = exec_ok(&engine, &mut session, aggregate_stmt("users", specs, filter));
    assert_eq!(response.text, "COUNT(*) | AVG(SCORE) | MIN(NAME)\n0 | 0 | \n");
    Ok(())
}

#[test]
fn test_summary_through_index() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);
    exec_ok(&engine, &mut session, create_index_stmt("users_age", "users", "age", false));

    let filter = FilterSet::new(vec![field_cond("age", Comparator::GreaterEqual, Value::Integer(30))]);
    let specs = vec![AggregationSpec::count_star(), AggregationSpec::over(AggregateKind::Max, "score")];
    let response = exec_ok(&engine, &mut session, aggregate_stmt("users", specs, filter));
    assert_eq!(body_lines(&response), vec!["3 | 91.25"]);
    Ok(())
}

#[test]
fn test_invalid_aggregations() -> Result<()> {
    let (engine, mut session) = test_engine();
    setup_users(&engine, &mut session);

    let mut mixed = SelectStatement {
        tables: vec!["users".into()],
        columns: vec![SelectColumn::named("name")],
        aggregations: vec![AggregationSpec::count_star()],
        ..Default::default()
    };
    let response = engine.execute(&mut session, &Statement::Select(mixed.clone()));
    assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));

    mixed.columns.clear();
    mixed.aggregations = vec![AggregationSpec::new(AggregateKind::Max, AggregateTarget::Star)];
    let response = engine.execute(&mut session, &Statement::Select(mixed));
    assert_eq!(response.text, "FAILURE\n");
    assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));

    let unknown = aggregate_stmt(
        "users",
        vec![AggregationSpec::over(AggregateKind::Min, "height")],
        FilterSet::default(),
    );
    let response = engine.execute(&mut session, &unknown);
    assert!(matches!(response.error, Some(QueryError::InvalidArgument(_))));

    let text_avg = aggregate_stmt(
        "users",
        vec![AggregationSpec::over(AggregateKind::Avg, "name")],
        FilterSet::default(),
    );
    let response = engine.execute(&mut session, &text_avg);
    assert!(matches!(response.error, Some(QueryError::TypeError(_))));
    Ok(())
}
