// Query Execution Engine Implementation
//
// This module dispatches statements to their handlers, assembles operator
// trees for queries and DML, and renders every outcome as a response.

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::catalog::{Catalog, Column, DataType, IndexMeta, Table, DATE_LENGTH};
use crate::config::EngineConfig;
use crate::query::ast::{
    CreateIndexStatement, CreateTableStatement, DeleteStatement, FilterSet, InsertStatement,
    SelectStatement, Statement, StatementKind, UpdateStatement,
};
use crate::query::executor::access_path::select_access_path;
use crate::query::executor::binder::Binder;
use crate::query::executor::operators::{
    Advance, Aggregate, BoxedOperator, Delete, IndexScan, MultiJoin, Operator, Predicate, Project,
    TableScan, Update,
};
use crate::query::executor::response::{Response, TableWriter, UNSUPPORTED};
use crate::query::executor::result::{QueryError, QueryResult};
use crate::storage::StorageEngine;

const HELP_TEXT: &str = "show tables;
desc `table name`;
create table `table name` (`column name` `column type`, ...);
create [unique] index `index name` on `table` (`column`);
drop table `table name`;
insert into `table` values(`value1`,`value2`);
update `table` set column=value [where `column`=`value`];
delete from `table` [where `column`=`value`];
select [ * | `columns` ] from `table` [where ...];
begin; commit; rollback; sync; help;
";

/// Per-connection state carried across statements
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Session {
    multi_operation_mode: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an explicit transaction is open
    pub fn multi_operation_mode(&self) -> bool {
        self.multi_operation_mode
    }
}

type Handler = fn(&ExecutionEngine, &mut Session, &Statement) -> Response;

/// Handlers in `StatementKind` declaration order
static HANDLERS: [(StatementKind, Handler); 15] = [
    (StatementKind::Select, ExecutionEngine::handle_select),
    (StatementKind::Insert, ExecutionEngine::handle_insert),
    (StatementKind::Update, ExecutionEngine::handle_update),
    (StatementKind::Delete, ExecutionEngine::handle_delete),
    (StatementKind::CreateTable, ExecutionEngine::handle_create_table),
    (StatementKind::DropTable, ExecutionEngine::handle_drop_table),
    (StatementKind::CreateIndex, ExecutionEngine::handle_create_index),
    (StatementKind::ShowTables, ExecutionEngine::handle_show_tables),
    (StatementKind::DescTable, ExecutionEngine::handle_desc_table),
    (StatementKind::Help, ExecutionEngine::handle_help),
    (StatementKind::Sync, ExecutionEngine::handle_sync),
    (StatementKind::Begin, ExecutionEngine::handle_begin),
    (StatementKind::Commit, ExecutionEngine::handle_end_transaction),
    (StatementKind::Rollback, ExecutionEngine::handle_end_transaction),
    (StatementKind::Exit, ExecutionEngine::handle_exit),
];

fn unexpected(kind: &str, statement: &Statement) -> Response {
    Response::failure(QueryError::Generic(format!("{} handler got {}", kind, statement)))
}

/// Status line for a DML/DDL outcome
fn status(result: QueryResult<()>) -> Response {
    match result {
        Ok(()) => Response::success(),
        Err(e) => {
            warn!("Statement failed: {}", e);
            Response::failure(e)
        }
    }
}

pub struct ExecutionEngine {
    catalog: Arc<Catalog>,
    storage: Arc<StorageEngine>,
    config: EngineConfig,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(Arc::new(Catalog::new()), Arc::new(StorageEngine::new()), EngineConfig::default())
    }
}

impl ExecutionEngine {
    pub fn new(catalog: Arc<Catalog>, storage: Arc<StorageEngine>, config: EngineConfig) -> Self {
        ExecutionEngine { catalog, storage, config }
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::new(Arc::new(Catalog::new()), Arc::new(StorageEngine::new()), config)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute one statement and render its response
    pub fn execute(&self, session: &mut Session, statement: &Statement) -> Response {
        let kind = statement.kind();
        debug!("Executing {}", statement);
        match HANDLERS.get(kind as usize) {
            Some((registered, handler)) if *registered == kind => handler(self, session, statement),
            _ => Response::failure(QueryError::Generic(format!("no handler for {:?}", kind))),
        }
    }

    // ---- queries ----------------------------------------------------------

    fn handle_select(&self, _session: &mut Session, statement: &Statement) -> Response {
        let Statement::Select(select) = statement else {
            return unexpected("select", statement);
        };
        match self.plan_select(select) {
            Ok(SelectPlan::Rows(root)) => self.render_rows(root),
            Ok(SelectPlan::Aggregate(aggregate)) => self.render_aggregate(aggregate),
            Err(e) => {
                warn!("Failed to plan select: {}", e);
                Response::failure(e)
            }
        }
    }

    fn lookup_tables(&self, names: &[String]) -> QueryResult<Vec<Table>> {
        if names.is_empty() {
            return Err(QueryError::Generic("select without a FROM table".to_string()));
        }
        let mut tables: Vec<Table> = Vec::with_capacity(names.len());
        for name in names {
            if tables.iter().any(|t| t.name() == name) {
                return Err(QueryError::InvalidArgument(format!("table {} listed twice", name)));
            }
            tables.push(self.catalog.table(name)?);
        }
        Ok(tables)
    }

    /// Validate a select and assemble its operator tree
    fn plan_select(&self, select: &SelectStatement) -> QueryResult<SelectPlan> {
        let tables = self.lookup_tables(&select.tables)?;
        let binder = Binder::new(&tables);

        let columns = binder.expand_columns(&select.columns)?;
        for expr in &select.expressions {
            binder.check_expression(expr)?;
        }
        let filter = binder.bind_filter(&select.filter)?;
        for spec in &select.aggregations {
            binder.check_aggregation(spec)?;
        }

        if !select.aggregations.is_empty() {
            if !columns.is_empty() || !select.expressions.is_empty() {
                return Err(QueryError::InvalidArgument(
                    "aggregations cannot be mixed with plain fields".to_string(),
                ));
            }
            if binder.is_multi_table() {
                return Err(QueryError::InvalidArgument(
                    "aggregations over several tables are not supported".to_string(),
                ));
            }
            let source = self.build_access_path(&tables[0], &filter);
            let filtered = Box::new(Predicate::new(source, filter));
            return Ok(SelectPlan::Aggregate(Aggregate::new(filtered, select.aggregations.clone())));
        }

        let input: BoxedOperator = if binder.is_multi_table() {
            let mut children: Vec<BoxedOperator> = Vec::with_capacity(tables.len());
            for (idx, table) in tables.iter().enumerate() {
                let scan = Box::new(TableScan::new(self.storage.clone(), table));
                let local = binder.filter_for_table(&filter, idx)?;
                children.push(Box::new(Predicate::new(scan, local)));
            }
            let join = Box::new(MultiJoin::new(children));
            Box::new(Predicate::new(join, filter))
        } else {
            let source = self.build_access_path(&tables[0], &filter);
            Box::new(Predicate::new(source, filter))
        };

        let mut project = Project::new(input);
        for (bound, label) in columns {
            project.add_projection(bound.reference(), label);
        }
        for expr in &select.expressions {
            project.add_expression(expr.clone());
        }
        Ok(SelectPlan::Rows(Box::new(project)))
    }

    /// Index scan when the filter allows one, full scan otherwise
    fn build_access_path(&self, table: &Table, filter: &FilterSet) -> BoxedOperator {
        if self.config.enable_index_scan {
            if let Some(plan) = select_access_path(filter, table) {
                info!("use index for scan: {} in table {}", plan.index.name, table.name());
                return Box::new(IndexScan::new(self.storage.clone(), table, plan.index, plan.range));
            }
        }
        Box::new(TableScan::new(self.storage.clone(), table))
    }

    /// Open, drain and close `root`, rendering every row
    fn render_rows(&self, mut root: BoxedOperator) -> Response {
        if let Err(e) = root.open() {
            warn!("Failed to open {}: {}", root.name(), e);
            if let Err(close_err) = root.close() {
                warn!("Failed to close {} after open error: {}", root.name(), close_err);
            }
            return Response::failure(e);
        }

        let mut writer = TableWriter::new(self.config.float_precision);
        writer.header(&root.schema().labels());
        let mut error = None;
        loop {
            match root.next() {
                Ok(Advance::Row) => match root.current_row() {
                    Some(row) => writer.row(row),
                    None => {
                        error!("{} reported a row but produced none", root.name());
                        error = Some(QueryError::Internal(format!(
                            "{} reported a row but produced none",
                            root.name()
                        )));
                        break;
                    }
                },
                Ok(Advance::Eof) => break,
                Err(e) => {
                    warn!("Query stopped mid-stream: {}", e);
                    error = Some(e);
                    break;
                }
            }
        }
        if let Err(e) = root.close() {
            error.get_or_insert(e);
        }
        writer.finish(error)
    }

    fn render_aggregate(&self, mut aggregate: Aggregate) -> Response {
        if let Err(e) = aggregate.open() {
            warn!("Failed to open aggregate: {}", e);
            if let Err(close_err) = aggregate.close() {
                warn!("Failed to close aggregate after open error: {}", close_err);
            }
            return Response::failure(e);
        }

        let mut writer = TableWriter::new(self.config.float_precision);
        writer.header(&aggregate.schema().labels());
        let mut error = None;
        loop {
            match aggregate.next() {
                Ok(Advance::Row) => continue,
                Ok(Advance::Eof) => {
                    if let Some(row) = aggregate.result_row() {
                        writer.row(row);
                    }
                    break;
                }
                Err(e) => {
                    warn!("Aggregation stopped mid-stream: {}", e);
                    error = Some(e);
                    break;
                }
            }
        }
        if let Err(e) = aggregate.close() {
            error.get_or_insert(e);
        }
        writer.finish(error)
    }

    // ---- DML --------------------------------------------------------------

    fn handle_insert(&self, _session: &mut Session, statement: &Statement) -> Response {
        let Statement::Insert(insert) = statement else {
            return unexpected("insert", statement);
        };
        status(self.insert(insert))
    }

    fn insert(&self, insert: &InsertStatement) -> QueryResult<()> {
        let table = self.catalog.table(&insert.table_name)?;
        let columns = table.columns();
        if insert.values.len() != columns.len() {
            return Err(QueryError::InvalidArgument(format!(
                "table {} has {} columns, got {} values",
                table.name(),
                columns.len(),
                insert.values.len()
            )));
        }
        let values = insert
            .values
            .iter()
            .zip(columns)
            .map(|(value, column)| value.clone().coerce_to(column))
            .collect::<QueryResult<Vec<_>>>()?;
        let rid = self.storage.insert_record(table.name(), values)?;
        debug!("Inserted record {} into {}", rid, table.name());
        Ok(())
    }

    /// Table scan filtered by `filter`, checked against `table` first
    fn filtered_scan(&self, table: &Table, filter: &FilterSet) -> QueryResult<BoxedOperator> {
        let filter = Binder::new(std::slice::from_ref(table)).bind_filter(filter)?;
        let scan = Box::new(TableScan::new(self.storage.clone(), table));
        Ok(Box::new(Predicate::new(scan, filter)))
    }

    fn handle_update(&self, _session: &mut Session, statement: &Statement) -> Response {
        let Statement::Update(update) = statement else {
            return unexpected("update", statement);
        };
        status(self.update(update))
    }

    fn update(&self, update: &UpdateStatement) -> QueryResult<()> {
        let table = self.catalog.table(&update.table_name)?;
        let child = self.filtered_scan(&table, &update.filter)?;
        let mut op = Update::new(self.storage.clone(), child, &table, &update.column, update.value.clone())?;
        let result = op.open();
        let closed = op.close();
        result?;
        closed?;
        debug!("Updated {} rows of {}", op.affected_rows(), table.name());
        Ok(())
    }

    fn handle_delete(&self, _session: &mut Session, statement: &Statement) -> Response {
        let Statement::Delete(delete) = statement else {
            return unexpected("delete", statement);
        };
        status(self.delete(delete))
    }

    fn delete(&self, delete: &DeleteStatement) -> QueryResult<()> {
        let table = self.catalog.table(&delete.table_name)?;
        let child = self.filtered_scan(&table, &delete.filter)?;
        let mut op = Delete::new(self.storage.clone(), child, table.name());
        let result = op.open();
        let closed = op.close();
        result?;
        closed?;
        debug!("Deleted {} rows of {}", op.affected_rows(), table.name());
        Ok(())
    }

    // ---- DDL --------------------------------------------------------------

    fn handle_create_table(&self, _session: &mut Session, statement: &Statement) -> Response {
        let Statement::CreateTable(create) = statement else {
            return unexpected("create table", statement);
        };
        status(self.create_table(create))
    }

    fn create_table(&self, create: &CreateTableStatement) -> QueryResult<()> {
        if create.columns.is_empty() {
            return Err(QueryError::InvalidArgument(format!("table {} has no columns", create.table_name)));
        }
        let mut columns: Vec<Column> = Vec::with_capacity(create.columns.len());
        for def in &create.columns {
            if columns.iter().any(|c| c.name() == def.name) {
                return Err(QueryError::InvalidArgument(format!("duplicate column {}", def.name)));
            }
            let length = match def.data_type {
                DataType::Date => DATE_LENGTH,
                other => def.length.unwrap_or_else(|| other.default_length()),
            };
            columns.push(Column::new(def.name.clone(), def.data_type, length));
        }

        let table = self.catalog.create_table(Table::new(create.table_name.clone(), columns))?;
        if let Err(e) = self.storage.create_table(table.name()) {
            if let Err(rollback_err) = self.catalog.drop_table(table.name()) {
                warn!("Failed to roll back catalog entry {}: {}", table.name(), rollback_err);
            }
            return Err(e.into());
        }
        info!("Created table {}", table.name());
        Ok(())
    }

    fn handle_drop_table(&self, _session: &mut Session, statement: &Statement) -> Response {
        let Statement::DropTable { table_name } = statement else {
            return unexpected("drop table", statement);
        };
        let result = self.catalog.drop_table(table_name).and_then(|_| {
            self.storage.drop_table(table_name)?;
            Ok(())
        });
        status(result)
    }

    fn handle_create_index(&self, _session: &mut Session, statement: &Statement) -> Response {
        let Statement::CreateIndex(create) = statement else {
            return unexpected("create index", statement);
        };
        status(self.create_index(create))
    }

    fn create_index(&self, create: &CreateIndexStatement) -> QueryResult<()> {
        let table = self.catalog.table(&create.table_name)?;
        if table.find_index(&create.index_name).is_some() {
            return Err(QueryError::SchemaExists(create.index_name.clone()));
        }
        let position = table.column_index(&create.column).ok_or_else(|| {
            QueryError::InvalidArgument(format!("field not found: {}.{}", table.name(), create.column))
        })?;

        self.storage
            .create_index(table.name(), &create.index_name, position, create.unique)?;
        self.catalog.add_index(
            table.name(),
            IndexMeta {
                name: create.index_name.clone(),
                column: create.column.clone(),
                unique: create.unique,
            },
        )?;
        info!("Created index {} on {}({})", create.index_name, table.name(), create.column);
        Ok(())
    }

    fn handle_show_tables(&self, _session: &mut Session, _statement: &Statement) -> Response {
        let names = self.catalog.table_names();
        if names.is_empty() {
            return Response::text("No table\n");
        }
        let mut text = String::new();
        for name in names {
            text.push_str(&name);
            text.push('\n');
        }
        Response::text(text)
    }

    fn handle_desc_table(&self, _session: &mut Session, statement: &Statement) -> Response {
        let Statement::DescTable { table_name } = statement else {
            return unexpected("desc table", statement);
        };
        match self.catalog.table(table_name) {
            Ok(table) => Response::text(table.describe()),
            Err(e) => Response {
                text: format!("No such table: {}\n", table_name),
                error: Some(e),
            },
        }
    }

    // ---- session ----------------------------------------------------------

    fn handle_help(&self, _session: &mut Session, _statement: &Statement) -> Response {
        Response::text(HELP_TEXT)
    }

    fn handle_sync(&self, _session: &mut Session, _statement: &Statement) -> Response {
        Response::success()
    }

    fn handle_begin(&self, session: &mut Session, _statement: &Statement) -> Response {
        session.multi_operation_mode = true;
        Response::success()
    }

    fn handle_end_transaction(&self, session: &mut Session, _statement: &Statement) -> Response {
        session.multi_operation_mode = false;
        Response::success()
    }

    fn handle_exit(&self, _session: &mut Session, _statement: &Statement) -> Response {
        Response::text(UNSUPPORTED)
    }
}

/// Operator tree of a select, by execution shape
enum SelectPlan {
    Rows(BoxedOperator),
    Aggregate(Aggregate),
}
