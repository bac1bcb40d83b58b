pub mod chat;
pub mod role;
