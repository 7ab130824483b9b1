mod compiler;
pub use compiler::compile;

pub use drover_core::Dialect;

mod expr;
pub use expr::{combine, BinaryOp, Expr, ExprBinaryOp, ExprField, IntoExpr};

mod text;
pub use text::{fix_parentheses, temp_table_name, traced_select};
