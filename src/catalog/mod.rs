pub mod identities;
pub mod pool;
