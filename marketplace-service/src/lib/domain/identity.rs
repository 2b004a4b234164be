pub mod accounts;
pub mod bootstrap;
pub mod errors;
pub mod models;
pub mod password_reset;
pub mod ports;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;
