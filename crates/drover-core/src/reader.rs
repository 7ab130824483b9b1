use crate::entity::{accessor_for, Entity};
use crate::schema::ColumnMapping;
use crate::{Error, Result, Value};

use std::any::Any;
use std::fmt;

/// Type-erased row stream handed to providers.
///
/// Rows come out in item order, one `Value` per column in `columns()` order.
/// Batches are consecutive: draining with `read_batch(n)` until empty visits
/// every item exactly once.
pub trait RowReader: Send {
    fn columns(&self) -> &[ColumnMapping];

    /// Number of rows not yet read.
    fn remaining(&self) -> usize;

    /// Reads up to `max` rows. An empty result means the reader is
    /// exhausted.
    fn read_batch(&mut self, max: usize) -> Vec<Vec<Value>>;
}

enum ColumnRead {
    Get(fn(&dyn Any) -> Value),
    Static(String),
}

/// Streams a slice of entities through their accessor table, producing one
/// row of values per item.
pub struct RecordReader<'a, E: Entity> {
    items: &'a [E],
    pos: usize,
    columns: Vec<ColumnMapping>,
    reads: Vec<ColumnRead>,
}

impl<'a, E: Entity> RecordReader<'a, E> {
    /// Resolves an accessor for every column up front. A column naming a
    /// property that does not exist on `E` is a configuration error.
    pub fn new(items: &'a [E], columns: Vec<ColumnMapping>) -> Result<Self> {
        let mut reads = Vec::with_capacity(columns.len());

        for column in &columns {
            if let Some(value) = &column.static_value {
                reads.push(ColumnRead::Static(value.clone()));
                continue;
            }

            let accessor = accessor_for::<E>(&column.name_on_object).ok_or_else(|| {
                Error::configuration(format!(
                    "property `{}` not found on `{}`",
                    column.name_on_object,
                    E::key().name()
                ))
            })?;
            reads.push(ColumnRead::Get(accessor.get));
        }

        Ok(Self {
            items,
            pos: 0,
            columns,
            reads,
        })
    }
}

impl<E: Entity> fmt::Debug for RecordReader<'_, E> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("RecordReader")
            .field("remaining", &self.remaining())
            .field("columns", &self.columns)
            .finish()
    }
}

impl<E: Entity> RowReader for RecordReader<'_, E> {
    fn columns(&self) -> &[ColumnMapping] {
        &self.columns
    }

    fn remaining(&self) -> usize {
        self.items.len() - self.pos
    }

    fn read_batch(&mut self, max: usize) -> Vec<Vec<Value>> {
        let end = self.items.len().min(self.pos + max);
        let mut rows = Vec::with_capacity(end - self.pos);

        for item in &self.items[self.pos..end] {
            let row = self
                .reads
                .iter()
                .map(|read| match read {
                    ColumnRead::Get(get) => get(item.as_any()),
                    ColumnRead::Static(value) => Value::Str(value.clone()),
                })
                .collect();
            rows.push(row);
        }

        self.pos = end;
        rows
    }
}
