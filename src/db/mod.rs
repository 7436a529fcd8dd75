pub mod memory;
pub mod repository;
pub mod seed;

pub use memory::InMemoryBillStore;
pub use repository::{BillRepository, RepositoryError};
pub use seed::{load_seed, SeedError};
