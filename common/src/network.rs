pub mod address;
pub mod host;
pub mod inventory;
pub mod source;
