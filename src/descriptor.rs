//! Query descriptor types
//!
//! A `QueryDescriptor` is the parsed, structured representation of a single
//! request's select/filter/order/pagination intent. It is built fresh for
//! every request (server side) or builder chain (client side), consumed once,
//! and never retained.

/// Comparison operator in the filter grammar (`column=op.value`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    In,
    Is,
}

impl FilterOp {
    /// Parse an operator prefix from the grammar. Returns `None` for
    /// unrecognized prefixes; callers drop those filters instead of erroring,
    /// which keeps the grammar forward compatible.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "eq" => Some(Self::Eq),
            "neq" => Some(Self::Neq),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "like" => Some(Self::Like),
            "ilike" => Some(Self::Ilike),
            "in" => Some(Self::In),
            "is" => Some(Self::Is),
            _ => None,
        }
    }

    /// Whether this operator compares a single bound value (`In` and `Is`
    /// have dedicated clause forms instead)
    pub fn is_comparison(&self) -> bool {
        !matches!(self, Self::In | Self::Is)
    }

    /// The query-string prefix for this operator
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::Ilike => "ilike",
            Self::In => "in",
            Self::Is => "is",
        }
    }
}

/// Payload of a parsed filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// A single value, always bound as a query parameter
    Text(String),
    /// A set of values for `in.(...)`; may be empty, which matches nothing
    Set(Vec<String>),
    /// `is.null` — emits `IS NULL`, no bound parameter
    Null,
    /// `is.not.null` — emits `IS NOT NULL`, no bound parameter
    NotNull,
}

/// One `(column, operator, value)` predicate; predicates are ANDed together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: FilterValue) -> Self {
        Self {
            column: column.into(),
            op,
            value,
        }
    }
}

/// Sort direction; anything other than literal `desc` parses as ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Parsed representation of one request against one table
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    /// Target relation; validated through the identifier chokepoint before
    /// any SQL is assembled
    pub table: String,
    /// Column projection (`None` means `*`)
    pub select: Option<String>,
    /// Predicates in query-string order (deterministic parameter indexing)
    pub filters: Vec<Filter>,
    /// Optional `(column, direction)` ordering
    pub order: Option<(String, OrderDirection)>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Conflict columns for upsert; only meaningful on insert
    pub on_conflict: Vec<String>,
    /// Echo affected rows back to the caller (`Prefer: return=representation`)
    pub return_representation: bool,
    /// Attach an exact total count (`Prefer: count=exact`)
    pub count_exact: bool,
    /// Count-only mode (`head=true`), no rows returned
    pub head: bool,
}

impl QueryDescriptor {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: None,
            filters: Vec::new(),
            order: None,
            limit: None,
            offset: None,
            on_conflict: Vec::new(),
            return_representation: false,
            count_exact: false,
            head: false,
        }
    }
}
