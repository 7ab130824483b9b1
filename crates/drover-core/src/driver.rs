mod capability;
pub use capability::Capability;

mod connection;
pub use connection::Connection;

mod provider;
pub use provider::Provider;
