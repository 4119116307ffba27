// Local cache adapter
// SQLite tables mirroring the remote entities, UPPER_SNAKE columns

pub mod rows;
pub mod schema;
pub mod sqlite_cache;

pub use sqlite_cache::SqliteLocalCache;
