pub mod audit;
pub mod spool;
pub mod transport;
