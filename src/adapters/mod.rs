// Adapters layer: concrete implementations of the domain ports.

pub mod graphql;
pub mod identity;
pub mod notifier;
