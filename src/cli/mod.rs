//! CLI module for shiftsync - command-line interface and subcommands.
//!
//! Schedules, employees and notifications each get a subcommand group.

pub mod commands;

pub use commands::Cli;
