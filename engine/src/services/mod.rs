// Services: the per-connection session state machine and the TCP server that hosts it.
pub mod server;
pub mod session;

pub use server::{serve_connection, Server};
pub use session::{ModelState, Session, SessionConfig};
