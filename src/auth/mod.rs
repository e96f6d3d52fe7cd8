//! Operator accounts, sessions and the login guard.

pub mod csrf;
pub mod middleware;
pub mod password;
pub mod redirect;
pub mod session;
pub mod users;

pub use session::SessionIdentity;
pub use users::User;
