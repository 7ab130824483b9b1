use drover_core::{Dialect, Error, Result, Value};

use crate::expr::{BinaryOp, Expr};

/// Compiles a restricted expression into a dialect-quoted SQL fragment.
///
/// The supported subset is deliberately small: binary comparisons and
/// logical connectives over member accesses and primitive constants.
/// Anything outside the subset fails with `Error::UnsupportedExpression`
/// so the caller can fall back to per-row execution.
pub fn compile(expr: &Expr, dialect: Dialect) -> Result<String> {
    match expr {
        Expr::BinaryOp(binary) => {
            let lhs = compile(&binary.lhs, dialect)?;
            let rhs = compile(&binary.rhs, dialect)?;
            let op = operator(binary.op)?;
            Ok(format!("({lhs} {op} {rhs})"))
        }
        Expr::Field(field) => {
            let ident = dialect.quote_ident(&field.path);
            if field.boolean {
                // A bare boolean member is an implicit truth test.
                Ok(format!("({ident} = TRUE)"))
            } else {
                Ok(ident)
            }
        }
        Expr::Value(value) => literal(value),
        Expr::Cast(inner) => compile(inner, dialect),
    }
}

fn operator(op: BinaryOp) -> Result<&'static str> {
    match op {
        BinaryOp::Eq => Ok("="),
        BinaryOp::Ne => Ok("<>"),
        BinaryOp::And => Ok("AND"),
        BinaryOp::Or => Ok("OR"),
        BinaryOp::Lt => Ok("<"),
        BinaryOp::Gt => Ok(">"),
        BinaryOp::Le | BinaryOp::Ge => Err(Error::unsupported(
            "<= and >= comparisons are outside the compiled subset",
        )),
    }
}

fn literal(value: &Value) -> Result<String> {
    match value {
        Value::I32(v) => Ok(v.to_string()),
        Value::I64(v) => Ok(v.to_string()),
        // Inlined without escaping. Predicates are trusted caller input,
        // never end-user text.
        Value::Str(v) => Ok(format!("'{v}'")),
        Value::Bool(true) => Ok("TRUE".to_string()),
        Value::Bool(false) => Ok("FALSE".to_string()),
        Value::F64(_) | Value::DateTime(_) | Value::Null => Err(Error::unsupported(format!(
            "constant of type {} cannot be inlined",
            value.type_name()
        ))),
    }
}
