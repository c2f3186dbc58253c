pub mod cache;
pub mod memory;
pub mod remote;

pub use cache::{LocalCache, SqliteCache};
pub use memory::{MemoryBackend, MemoryCache};
pub use remote::{RemoteBackend, RestBackend};
