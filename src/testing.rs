//! In-memory test backend
//!
//! Lets the engine run end to end without a Firebird server. A
//! [`MemoryConnector`] hands out connections to [`MemoryServer`]s keyed by
//! host name; unknown hosts behave like unreachable servers.

pub mod fixtures;
pub mod memory;
pub mod table;

pub use fixtures::Pair;
pub use memory::{MemoryConnector, MemoryServer};
pub use table::{TestColumn, TestTable};
