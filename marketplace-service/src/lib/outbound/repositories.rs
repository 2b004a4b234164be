pub mod memory;
pub mod postgres;

pub use memory::InMemoryPrincipalStore;
pub use postgres::PostgresPrincipalStore;
