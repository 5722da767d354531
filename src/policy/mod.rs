pub mod defaults;
pub mod store;

pub use defaults::default_rules;
pub use store::{NewPolicy, PolicyStore};
