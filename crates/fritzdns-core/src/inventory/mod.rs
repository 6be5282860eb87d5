// # Built-in Inventories
//
// Router clients are plugged in from outside; these two backends cover
// embedding, testing and file-fed deployments.

pub mod file;
pub mod memory;

pub use file::{FileInventory, FileInventoryFactory};
pub use memory::StaticInventory;
