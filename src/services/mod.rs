pub mod auth;
pub mod ticket_transport;

pub use auth::{AuthService, NewAccount};
pub use ticket_transport::TicketTransport;
