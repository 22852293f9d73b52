// Memory module
// Session-scoped conversational memory for the chat endpoint
// Turns are stored in process memory during a session and dropped on expiry

pub mod session;
pub mod store;

pub use session::{MemoryEntry, Role, SessionConfig, SessionMemory, SessionMetrics};
pub use store::{MemoryStore, MemoryStoreConfig, StoreMetrics};
