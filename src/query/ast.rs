// Statement Tree Definitions
//
// This module defines the already-parsed statement and expression trees the
// execution engine consumes. Every node derives serde so statements can be
// supplied as JSON documents.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::DataType;
use crate::common::Value;

/// Column reference (could be qualified with table name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnReference {
    #[serde(default)]
    pub table: Option<String>,
    pub name: String,
}

impl ColumnReference {
    pub fn new(name: impl Into<String>) -> Self {
        ColumnReference { table: None, name: name.into() }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        ColumnReference { table: Some(table.into()), name: name.into() }
    }
}

impl fmt::Display for ColumnReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
        }
    }
}

/// Unary sign operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignOp {
    Plus,
    Minus,
}

/// Arithmetic expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Column reference
    Column(ColumnReference),
    /// Literal value
    Literal(Value),
    /// Binary arithmetic (e.g., a + b)
    Binary {
        left: Box<Expression>,
        op: ArithmeticOp,
        right: Box<Expression>,
    },
    /// Unary sign (e.g., -a)
    Unary { op: SignOp, operand: Box<Expression> },
    /// Parenthesised sub-expression
    Grouping(Box<Expression>),
}

impl Expression {
    pub fn column(name: impl Into<String>) -> Self {
        Expression::Column(ColumnReference::new(name))
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expression::Column(ColumnReference::qualified(table, name))
    }

    pub fn literal(value: Value) -> Self {
        Expression::Literal(value)
    }

    pub fn binary(left: Expression, op: ArithmeticOp, right: Expression) -> Self {
        Expression::Binary { left: Box::new(left), op, right: Box::new(right) }
    }

    pub fn negate(operand: Expression) -> Self {
        Expression::Unary { op: SignOp::Minus, operand: Box::new(operand) }
    }

    pub fn grouped(inner: Expression) -> Self {
        Expression::Grouping(Box::new(inner))
    }

    /// Every column referenced anywhere in the tree, left to right
    pub fn columns(&self) -> Vec<&ColumnReference> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnReference>) {
        match self {
            Expression::Column(col) => out.push(col),
            Expression::Literal(_) => {}
            Expression::Binary { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expression::Unary { operand, .. } => operand.collect_columns(out),
            Expression::Grouping(inner) => inner.collect_columns(out),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Column(col) => write!(f, "{}", col),
            Expression::Literal(Value::Text(s)) | Expression::Literal(Value::Date(s)) => {
                write!(f, "'{}'", s)
            }
            Expression::Literal(v) => write!(f, "{}", v),
            Expression::Binary { left, op, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            Expression::Unary { op: SignOp::Minus, operand } => write!(f, "-{}", operand),
            Expression::Unary { op: SignOp::Plus, operand } => write!(f, "+{}", operand),
            Expression::Grouping(inner) => write!(f, "({})", inner),
        }
    }
}

/// Comparison operators of filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    Equal,
    LessEqual,
    NotEqual,
    Less,
    GreaterEqual,
    Greater,
}

/// Comparator to use once a `(value, field)` pair is rewritten as
/// `(field, value)`. `LessEqual` and `GreaterEqual` map to the strict
/// comparators, which drops rows sitting exactly on the bound.
static SWAPPED_COMPARATORS: [(Comparator, Comparator); 6] = [
    (Comparator::Equal, Comparator::Equal),
    (Comparator::LessEqual, Comparator::Greater),
    (Comparator::NotEqual, Comparator::NotEqual),
    (Comparator::Less, Comparator::GreaterEqual),
    (Comparator::GreaterEqual, Comparator::Less),
    (Comparator::Greater, Comparator::LessEqual),
];

static COMPARATOR_SYMBOLS: [(Comparator, &str); 6] = [
    (Comparator::Equal, "="),
    (Comparator::LessEqual, "<="),
    (Comparator::NotEqual, "<>"),
    (Comparator::Less, "<"),
    (Comparator::GreaterEqual, ">="),
    (Comparator::Greater, ">"),
];

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        COMPARATOR_SYMBOLS[*self as usize].1
    }

    /// Comparator after swapping the operands of a condition
    pub fn swapped(&self) -> Comparator {
        SWAPPED_COMPARATORS[*self as usize].1
    }

    /// Whether `left ⊙ right` holds given `left.cmp(right)`
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Comparator::Equal => ordering == Ordering::Equal,
            Comparator::NotEqual => ordering != Ordering::Equal,
            Comparator::Less => ordering == Ordering::Less,
            Comparator::LessEqual => ordering != Ordering::Greater,
            Comparator::Greater => ordering == Ordering::Greater,
            Comparator::GreaterEqual => ordering != Ordering::Less,
        }
    }
}

/// A comparison between two expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub left: Expression,
    pub comparator: Comparator,
    pub right: Expression,
}

impl Condition {
    pub fn new(left: Expression, comparator: Comparator, right: Expression) -> Self {
        Condition { left, comparator, right }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.comparator.symbol(), self.right)
    }
}

/// Conjunction of conditions; empty means always true
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    pub conditions: Vec<Condition>,
}

impl FilterSet {
    pub fn new(conditions: Vec<Condition>) -> Self {
        FilterSet { conditions }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Condition> {
        self.conditions.iter()
    }
}

/// Aggregation functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateKind {
    Count,
    Max,
    Min,
    Avg,
}

static AGGREGATE_LABELS: [&str; 4] = ["COUNT", "MAX", "MIN", "AVG"];

impl AggregateKind {
    pub fn label(&self) -> &'static str {
        AGGREGATE_LABELS[*self as usize]
    }
}

/// What an aggregation is computed over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AggregateTarget {
    Star,
    Column(ColumnReference),
}

impl fmt::Display for AggregateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateTarget::Star => f.write_str("*"),
            AggregateTarget::Column(col) => write!(f, "{}", col),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSpec {
    pub kind: AggregateKind,
    pub target: AggregateTarget,
}

impl AggregationSpec {
    pub fn new(kind: AggregateKind, target: AggregateTarget) -> Self {
        AggregationSpec { kind, target }
    }

    pub fn count_star() -> Self {
        Self::new(AggregateKind::Count, AggregateTarget::Star)
    }

    pub fn over(kind: AggregateKind, column: impl Into<String>) -> Self {
        Self::new(kind, AggregateTarget::Column(ColumnReference::new(column)))
    }

    /// Header label, e.g. `AVG(PRICE)`
    pub fn label(&self) -> String {
        format!("{}({})", self.kind.label(), self.target).to_uppercase()
    }
}

/// Column in a SELECT statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectColumn {
    /// All columns (`*`), or all columns of one table (`t.*`)
    Wildcard {
        #[serde(default)]
        table: Option<String>,
    },
    /// Regular column reference with optional alias
    Column {
        column: ColumnReference,
        #[serde(default)]
        alias: Option<String>,
    },
}

impl SelectColumn {
    pub fn star() -> Self {
        SelectColumn::Wildcard { table: None }
    }

    pub fn named(name: impl Into<String>) -> Self {
        SelectColumn::Column { column: ColumnReference::new(name), alias: None }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        SelectColumn::Column { column: ColumnReference::qualified(table, name), alias: None }
    }
}

/// SELECT statement representation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    /// FROM clause table names, in declared order
    pub tables: Vec<String>,
    /// Plain projected columns
    #[serde(default)]
    pub columns: Vec<SelectColumn>,
    /// Computed expressions, appended after the plain columns
    #[serde(default)]
    pub expressions: Vec<Expression>,
    #[serde(default)]
    pub aggregations: Vec<AggregationSpec>,
    /// WHERE clause
    #[serde(default)]
    pub filter: FilterSet,
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertStatement {
    pub table_name: String,
    pub values: Vec<Value>,
}

/// UPDATE statement, assigning one literal to one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatement {
    pub table_name: String,
    pub column: String,
    pub value: Value,
    #[serde(default)]
    pub filter: FilterSet,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStatement {
    pub table_name: String,
    #[serde(default)]
    pub filter: FilterSet,
}

/// Column definition for CREATE TABLE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    /// Declared length; the type's default when absent
    #[serde(default)]
    pub length: Option<usize>,
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTableStatement {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
}

/// CREATE [UNIQUE] INDEX statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndexStatement {
    pub index_name: String,
    pub table_name: String,
    pub column: String,
    #[serde(default)]
    pub unique: bool,
}

/// Represents a parsed statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    CreateTable(CreateTableStatement),
    DropTable { table_name: String },
    CreateIndex(CreateIndexStatement),
    ShowTables,
    DescTable { table_name: String },
    Help,
    Sync,
    Begin,
    Commit,
    Rollback,
    Exit,
}

/// Closed set of statement kinds, used to key the dispatcher's handler table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    CreateTable,
    DropTable,
    CreateIndex,
    ShowTables,
    DescTable,
    Help,
    Sync,
    Begin,
    Commit,
    Rollback,
    Exit,
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::Select(_) => StatementKind::Select,
            Statement::Insert(_) => StatementKind::Insert,
            Statement::Update(_) => StatementKind::Update,
            Statement::Delete(_) => StatementKind::Delete,
            Statement::CreateTable(_) => StatementKind::CreateTable,
            Statement::DropTable { .. } => StatementKind::DropTable,
            Statement::CreateIndex(_) => StatementKind::CreateIndex,
            Statement::ShowTables => StatementKind::ShowTables,
            Statement::DescTable { .. } => StatementKind::DescTable,
            Statement::Help => StatementKind::Help,
            Statement::Sync => StatementKind::Sync,
            Statement::Begin => StatementKind::Begin,
            Statement::Commit => StatementKind::Commit,
            Statement::Rollback => StatementKind::Rollback,
            Statement::Exit => StatementKind::Exit,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} statement", self.kind())
    }
}
