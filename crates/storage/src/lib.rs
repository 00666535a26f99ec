pub mod blob;
pub mod table;
mod transport;


pub use transport::TransportConfig;
