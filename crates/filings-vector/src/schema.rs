use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Column layout of the chunk vector table.
pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("chunk_id", DataType::Utf8, false),
        Field::new("company", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("section", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
    ]))
}
