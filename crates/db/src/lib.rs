//! Persistence layer: sessions, table metadata and the model base operations.

pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod table;

pub use config::DatabaseConfig;
pub use error::{ModelError, SessionError};
pub use model::Model;
pub use session::{MemorySession, MemoryStore, PgSession, Row, Session, SessionFactory};
pub use table::{Column, TableDef};
