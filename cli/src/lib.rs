//! Operator shell for a WinStack private cloud, built on the `winstack` adapter.

pub mod argparse;
pub mod commands;
pub mod output;
