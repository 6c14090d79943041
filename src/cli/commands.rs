//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - schedules: list, generate, delete, notify and edit schedules
//! - employees: list employees
//! - notifications: list sent notifications or message one employee

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shiftsync - keep generated shift schedules in sync with the scheduling backend
#[derive(Parser, Debug)]
#[command(name = "shiftsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work with generated schedules
    Schedules {
        #[command(subcommand)]
        command: ScheduleCommands,
    },

    /// Work with employees
    Employees {
        #[command(subcommand)]
        command: EmployeeCommands,
    },

    /// Work with notifications
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },
}

/// Schedule subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ScheduleCommands {
    /// List schedules with employee names
    List,

    /// Generate a schedule for the active facility
    Generate,

    /// Delete a schedule
    Delete {
        /// Schedule ID to delete
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Send every employee on a schedule their shift details
    Notify {
        /// Schedule ID to notify
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Change a shift's start or end time
    Edit {
        /// Schedule ID to edit
        id: String,

        /// Shift ID within the schedule
        #[arg(short, long)]
        shift: String,

        /// New start time (HH:MM)
        #[arg(long)]
        start: Option<String>,

        /// New end time (HH:MM)
        #[arg(long)]
        end: Option<String>,
    },
}

/// Employee subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum EmployeeCommands {
    /// List employees
    List,
}

/// Notification subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum NotificationCommands {
    /// List sent notifications
    List,

    /// Send a free-text message to one employee
    Send {
        /// Recipient employee ID
        employee_id: String,

        /// Message text
        message: String,
    },
}
