//! FEMS Session Management
//!
//! - A Session is either logged out or holds a token plus a cached profile
//! - Token and profile are written and cleared together, never one at a time
//! - Sessions persist across restarts through `fems-storage`
//! - The backend is the only authority on token validity

mod error;
mod session;
mod store;

pub use error::SessionError;
pub use session::{Profile, Session};
pub use store::SessionStore;

pub type Result<T> = std::result::Result<T, SessionError>;
