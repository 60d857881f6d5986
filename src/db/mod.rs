pub mod operators;
pub mod packed_orders;
pub mod pool;
pub mod scan_log;

pub use packed_orders::PackedOrderStore;
pub use pool::create_pool;
pub use scan_log::ScanLogStore;
