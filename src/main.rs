use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use shiftsync::api::HttpApi;
use shiftsync::domain::ShiftField;
use shiftsync::store::EntryState;
use shiftsync::view::{Confirmed, SchedulesView};

mod cli;
mod config;

use cli::Cli;
use cli::commands::{Commands, EmployeeCommands, NotificationCommands, ScheduleCommands};
use config::Config;

/// Filters from the config file, overridden by `RUST_LOG` when set
fn log_builder(config_level: Option<&str>, env_filters: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    if let Some(level) = config_level {
        builder.parse_filters(level);
    }
    if let Some(filters) = env_filters {
        builder.parse_filters(filters);
    }
    builder
}

fn setup_logging(config_level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shiftsync")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("shiftsync.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let env_filters = std::env::var("RUST_LOG").ok();
    log_builder(config_level, env_filters.as_deref())
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Ask a yes/no question on stdin. Anything but y/yes declines.
fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question.yellow());
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let session = config.session()?;
    if !session.is_authenticated() {
        println!(
            "{} set ${} or session.token_file to sign in",
            "No session:".yellow(),
            config.session.token_env
        );
    }

    let api = HttpApi::new(config.http()).context("Failed to build HTTP client")?;
    info!("Using backend at {}", api.base_url());
    let mut view = SchedulesView::new(Arc::new(api), session, config.view());

    match &cli.command {
        Commands::Schedules { command } => handle_schedule_command(command, &mut view).await,
        Commands::Employees { command } => handle_employee_command(command, &view).await,
        Commands::Notifications { command } => handle_notification_command(command, &mut view).await,
    }
}

fn print_schedules(view: &SchedulesView) {
    let cards = view.render();
    if cards.is_empty() {
        println!("{}", "No schedules".dimmed());
        return;
    }

    for card in cards {
        let marker = match card.state {
            EntryState::PendingDelete => " (deleting)".red().to_string(),
            _ if card.editing => " (editing)".yellow().to_string(),
            _ => String::new(),
        };
        println!(
            "{} {} generated {}{}",
            "Schedule".green(),
            card.schedule_id.bold(),
            card.date_generated.format("%Y-%m-%d %H:%M"),
            marker
        );
        for shift in card.shifts {
            println!(
                "  {:<12} {:<24} {} - {}  {}",
                shift.shift_id.dimmed(),
                shift.employee_name,
                shift.start,
                shift.end,
                shift.days
            );
        }
    }
}

async fn handle_schedule_command(command: &ScheduleCommands, view: &mut SchedulesView) -> Result<()> {
    info!("Handling schedule command: {:?}", command);

    match command {
        ScheduleCommands::List => {
            view.activate().await.context("Failed to load schedules")?;
            print_schedules(view);
        }
        ScheduleCommands::Generate => {
            view.activate().await.context("Failed to load schedules")?;
            let schedule = view.generate().await.context("Failed to generate schedule")?;
            println!("{} {}", "Generated:".green(), schedule.id);
            print_schedules(view);
        }
        ScheduleCommands::Delete { id, yes } => {
            view.load_listing().await.context("Failed to load schedules")?;
            view.request_delete(id)?;
            let question = view.pending().map(|p| p.prompt()).unwrap_or_default();
            if !*yes && !confirm(question)? {
                view.cancel_pending();
                println!("{}", "Cancelled".dimmed());
                return Ok(());
            }
            if let Confirmed::Deleted { schedule_id } = view.confirm().await.context("Failed to delete schedule")? {
                println!("{} {}", "Deleted:".red(), schedule_id);
            }
        }
        ScheduleCommands::Notify { id, yes } => {
            view.activate().await.context("Failed to load schedules")?;
            view.request_notify(id)?;
            let question = view.pending().map(|p| p.prompt()).unwrap_or_default();
            if !*yes && !confirm(question)? {
                view.cancel_pending();
                println!("{}", "Cancelled".dimmed());
                return Ok(());
            }
            if let Confirmed::Notified(report) = view.confirm().await.context("Failed to send notifications")? {
                println!(
                    "{} {} of {} shifts",
                    "Notified:".green(),
                    report.sent.len(),
                    report.total()
                );
                for failed in &report.failed {
                    println!(
                        "  {} shift {} ({}): {}",
                        "Failed".red(),
                        failed.shift.shift_id,
                        failed.shift.employee_id,
                        failed.error
                    );
                }
            }
        }
        ScheduleCommands::Edit { id, shift, start, end } => {
            if start.is_none() && end.is_none() {
                eyre::bail!("Nothing to change: pass --start and/or --end");
            }
            // commit re-fetches and resolves names before printing
            view.load_listing().await.context("Failed to load schedules")?;
            view.begin_edit(id)?;
            if let Some(start) = start {
                view.set_shift_field(shift, ShiftField::Start, start)?;
            }
            if let Some(end) = end {
                view.set_shift_field(shift, ShiftField::End, end)?;
            }
            let updated = view.commit_edit().await.context("Failed to save shift changes")?;
            println!("{} {}", "Updated:".green(), updated.id);
            print_schedules(view);
        }
    }
    Ok(())
}

async fn handle_employee_command(command: &EmployeeCommands, view: &SchedulesView) -> Result<()> {
    info!("Handling employee command: {:?}", command);
    match command {
        EmployeeCommands::List => {
            let employees = view.employees().await.context("Failed to list employees")?;
            if employees.is_empty() {
                println!("{}", "No employees".dimmed());
            }
            for employee in employees {
                println!(
                    "{:<12} {:<24} {}",
                    employee.id.dimmed(),
                    employee.name,
                    employee.skill_level.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

async fn handle_notification_command(command: &NotificationCommands, view: &mut SchedulesView) -> Result<()> {
    info!("Handling notification command: {:?}", command);
    match command {
        NotificationCommands::List => {
            let lines = view.notifications().await.context("Failed to list notifications")?;
            if lines.is_empty() {
                println!("{}", "No notifications".dimmed());
            }
            for line in lines {
                let sent_at = line
                    .notification
                    .created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!("{} {} {}", "To".green(), line.employee_name.bold(), sent_at.dimmed());
                for text in line.notification.message.lines() {
                    println!("  {}", text);
                }
            }
        }
        NotificationCommands::Send { employee_id, message } => {
            let sent = view
                .notify_employee(employee_id, message)
                .await
                .context("Failed to send notification")?;
            println!("{} {}", "Sent:".green(), sent.id);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration; it carries the log level
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    if let Err(e) = run_application(&cli, &config).await {
        eprintln!("{} {:#}", "Error:".red(), e);
        std::process::exit(1);
    }

    Ok(())
}
