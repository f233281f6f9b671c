pub mod entity;
pub mod error;
pub mod port;
pub mod request;
