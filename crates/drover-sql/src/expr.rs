use drover_core::Value;

/// A restricted filter/assignment expression over a single entity type.
///
/// Only the node kinds the compiler understands exist here: binary
/// operations, member access, primitive constants, and conversions (which
/// compile as their operand). Anything richer belongs to the host ORM's
/// query pipeline, not to this layer.
#[derive(Debug, Clone)]
pub enum Expr {
    BinaryOp(ExprBinaryOp),
    Field(ExprField),
    Value(Value),
    Cast(Box<Expr>),
}

#[derive(Debug, Clone)]
pub struct ExprBinaryOp {
    pub lhs: Box<Expr>,
    pub op: BinaryOp,
    pub rhs: Box<Expr>,
}

/// A member access on the entity the expression ranges over.
///
/// Boolean members compile specially (`(ident = TRUE)`); composing boolean
/// equality naively would double-wrap as `(Member = TRUE) = TRUE`.
#[derive(Debug, Clone)]
pub struct ExprField {
    pub path: String,
    pub boolean: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    And,
    Or,
    Lt,
    Gt,
    // Constructible but outside the compiled subset.
    Le,
    Ge,
}

impl Expr {
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(ExprField {
            path: path.into(),
            boolean: false,
        })
    }

    /// A boolean-typed member access.
    pub fn flag(path: impl Into<String>) -> Self {
        Self::Field(ExprField {
            path: path.into(),
            boolean: true,
        })
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn cast(expr: Expr) -> Self {
        Self::Cast(Box::new(expr))
    }

    pub fn eq(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Eq, rhs)
    }

    pub fn ne(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Ne, rhs)
    }

    pub fn lt(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Lt, rhs)
    }

    pub fn gt(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Gt, rhs)
    }

    pub fn le(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Le, rhs)
    }

    pub fn ge(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Ge, rhs)
    }

    pub fn and(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::And, rhs)
    }

    pub fn or(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Or, rhs)
    }

    fn binary(self, op: BinaryOp, rhs: impl IntoExpr) -> Self {
        Self::BinaryOp(ExprBinaryOp {
            lhs: Box::new(self),
            op,
            rhs: Box::new(rhs.into_expr()),
        })
    }
}

/// Builds the equality expression tying an update target property to its
/// modifier, used to derive the assignment fragment of an update query.
pub fn combine(property: Expr, modifier: Expr) -> Expr {
    property.eq(modifier)
}

pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl<T> IntoExpr for T
where
    T: Into<Value>,
{
    fn into_expr(self) -> Expr {
        Expr::Value(self.into())
    }
}
