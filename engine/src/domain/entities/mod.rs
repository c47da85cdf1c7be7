pub mod inventory;
pub mod server;

pub use inventory::Inventory;
pub use server::ServerRecord;
