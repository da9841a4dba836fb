//! Command modules for the zkvvm CLI.
//!
//! ## Version Management Commands
//!
//! - [`ls`] - List cached zkVyper versions
//! - [`ls_remote`] - List published zkVyper versions
//! - [`install`] - Install a zkVyper version
//! - [`uninstall`] - Remove a cached zkVyper version
//!
//! ## Compilation Commands
//!
//! - [`compile`] - Compile Vyper sources with zkVyper
//! - [`version`] - Display version information

pub mod compile;
pub mod install;
pub mod ls;
pub mod ls_remote;
pub mod uninstall;
pub mod version;
