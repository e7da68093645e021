pub mod client;
pub(crate) mod response;
