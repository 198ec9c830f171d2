//! Provider-neutral building blocks shared by the cloud adapters, the
//! compute tasks and the operator tooling.

pub mod cloudprovider;
pub mod consts;
pub mod errors;
pub mod secrules;
pub mod wait;

pub use errors::{is_not_found, is_not_implemented, is_not_supported, is_timeout, CloudError};
pub use wait::{wait_created, wait_status};
