pub mod role;
pub mod session;
pub mod status;
pub mod ticket;
