use drover_core::Value;
use tiberius::{ColumnData, IntoSql};

/// Converts an entity field value into the TDS wire representation used by
/// the bulk-load row stream.
pub(crate) fn column_data(value: &Value) -> ColumnData<'static> {
    match value {
        Value::Null => ColumnData::String(None),
        Value::Bool(value) => ColumnData::Bit(Some(*value)),
        Value::I32(value) => ColumnData::I32(Some(*value)),
        Value::I64(value) => ColumnData::I64(Some(*value)),
        Value::F64(value) => ColumnData::F64(Some(*value)),
        Value::Str(value) => ColumnData::String(Some(value.clone().into())),
        Value::DateTime(value) => (*value).into_sql(),
    }
}
