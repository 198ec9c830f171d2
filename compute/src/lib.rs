//! Compute-side workflows for private-cloud networking.
//!
//! The task engine, the resource store and the event log belong to the
//! platform; this crate only sees them through the traits in [`taskman`] and
//! [`store`]. What lives here is the route-table logic on top of them and the
//! WinStack guest driver.

pub mod association;
pub mod guest_driver;
pub mod models;
pub mod options;
pub mod store;
pub mod taskman;
pub mod tasks;

#[cfg(test)]
mod test_support;

pub use association::RouteTableAssociationManager;
pub use guest_driver::{GuestDriver, WinStackGuestDriver};
pub use options::ComputeOptions;
pub use taskman::{TaskEngine, TaskHandler, TaskRegistry};
pub use tasks::{register_tasks, TaskDeps};
