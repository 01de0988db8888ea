/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → Dataset (column types inferred)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset  │  Vec<Column>, equal lengths, unique names
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  numeric range predicate → row indices / filtered copy
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
