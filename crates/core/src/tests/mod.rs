//! Shared test doubles

mod context;

pub use identity::FakeIdentity;
