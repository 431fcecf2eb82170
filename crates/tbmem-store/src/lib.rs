pub mod address;
pub mod store;
pub mod validate;

pub use address::{AddressMapper, split};
pub use store::MemoryStore;
pub use validate::ValidationPolicy;
