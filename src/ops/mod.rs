//! High-level operations.
//!
//! This module contains the implementation of weld commands.

pub mod weld_build;
pub mod weld_clean;
pub mod weld_new;
pub mod weld_tree;

pub use weld_build::{build, BuildReport};
pub use weld_clean::{clean, CleanError};
pub use weld_new::{new_project, NewOptions, ScaffoldKind};
pub use weld_tree::tree;
