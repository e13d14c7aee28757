pub mod portal;
pub mod session;

pub use portal::PortalClient;
pub use session::{FileSessionStore, MemorySessionStore, SessionContext, SessionStore};
