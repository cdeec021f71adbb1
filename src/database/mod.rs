//! Connection pool and schema migrations.

pub mod pool;

pub use pool::{connect_lazy, create_pool, run_migrations, Database, DatabaseError};
