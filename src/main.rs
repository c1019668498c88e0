use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use dsms::api::plans::PlanFilter;
use dsms::{Config, ConsoleNotifier, DsmsApi, Notifier, SessionStore};

#[derive(Parser, Debug)]
#[command(name = "dsms")]
#[command(about = "Operations CLI for the Drone Services Management System")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/dsms/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Log in and store the session token
  Login { username: String },
  /// Destroy the stored session
  Logout,
  /// List spray plans
  Plans {
    #[arg(long)]
    estate: Option<i64>,
    #[arg(long)]
    status: Option<String>,
  },
  /// Planning calendar for a month (YYYY-MM)
  Calendar {
    month: String,
    /// Only days with unapproved plans
    #[arg(long)]
    new_plans: bool,
  },
  /// Bookings within a date range
  Bookings { from: String, to: String },
  /// Spray teams
  Teams,
  /// Equipment held by a team
  TeamEquipment { team_id: i64 },
  /// Day-end reconciliation tree for a date (YYYY-MM-DD)
  DayEnd { date: String },
  /// Close out a day after reconciliation
  CompleteDayEnd { date: String },
  /// Upload a DJI image for a task
  UploadDjiImage { task_id: i64, file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _log_guard = init_tracing()?;

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;
  let session = SessionStore::open()?;
  let notifier = ConsoleNotifier;
  let api = DsmsApi::new(&config, session)?.with_notifier(Arc::new(notifier));

  match args.command {
    Command::Login { username } => {
      let password = std::env::var("DSMS_PASSWORD")
        .map_err(|_| eyre!("Set the DSMS_PASSWORD environment variable to log in."))?;
      let session = api.login(&username, &password).await?;
      notifier.info(&format!(
        "Logged in as {}",
        session.user_name.as_deref().unwrap_or(&username)
      ));
    }
    Command::Logout => {
      api.logout()?;
      notifier.info("Logged out");
    }
    Command::Plans { estate, status } => {
      let filter = PlanFilter {
        estate_id: estate,
        status,
        ..PlanFilter::default()
      };
      for plan in api.plans(&filter).await? {
        println!(
          "{:>6}  {}  {:<24} {:>8.2} ha  {}",
          plan.id, plan.spray_date, plan.estate, plan.extent, plan.status
        );
      }
    }
    Command::Calendar { month, new_plans } => {
      let days = if new_plans {
        api.new_plan_calendar(&month).await?
      } else {
        api.calendar(&month).await?
      };
      for day in days {
        println!("{}  {} plan(s)", day.date, day.count);
        for entry in day.entries {
          println!(
            "        #{} {}{}",
            entry.plan_id,
            entry.estate,
            entry
              .time_slot
              .map(|s| format!(" [{}]", s))
              .unwrap_or_default()
          );
        }
      }
    }
    Command::Bookings { from, to } => {
      for booking in api.bookings(&from, &to).await? {
        println!(
          "{:>6}  {}  {:<24} {:>8.2} ha  {}",
          booking.id, booking.booking_date, booking.farmer, booking.extent, booking.status
        );
      }
    }
    Command::Teams => {
      for team in api.teams().await? {
        println!(
          "{:>4}  {:<20} {}",
          team.id,
          team.name,
          if team.active { "active" } else { "inactive" }
        );
      }
    }
    Command::TeamEquipment { team_id } => {
      for item in api.team_equipment(team_id).await? {
        let note = item
          .temporary_until
          .map(|d| format!(" (temporary until {})", d))
          .unwrap_or_default();
        println!("{:<16} {}{}", item.equipment_type, item.serial_no, note);
      }
    }
    Command::DayEnd { date } => {
      let summary = api.day_end_summary(&date).await?;
      println!(
        "{}  {}",
        summary.date,
        if summary.reconciled {
          "reconciled"
        } else {
          "pending"
        }
      );
      for estate in summary.estates {
        println!("  {}", estate.estate);
        for field in estate.fields {
          println!(
            "    {:<24} planned {:>7.2} ha  sprayed {:>7.2} ha  {}",
            field.field,
            field.planned_extent,
            field.sprayed_extent,
            if field.matched { "ok" } else { "UNMATCHED" }
          );
        }
      }
    }
    Command::CompleteDayEnd { date } => {
      if !notifier.confirm(&format!("Close out {}? This cannot be undone.", date)) {
        return Ok(());
      }
      api.complete_day_end(&date).await?;
      notifier.info(&format!("Day {} closed", date));
    }
    Command::UploadDjiImage { task_id, file } => {
      let bytes = std::fs::read(&file)
        .map_err(|e| eyre!("Failed to read {}: {}", file.display(), e))?;
      let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.jpg")
        .to_string();
      let image = api.upload_dji_image(task_id, &name, bytes).await?;
      notifier.info(&format!("Uploaded {} as image #{}", name, image.id));
    }
  }

  Ok(())
}

/// File logging under the platform data dir; level via `DSMS_LOG`.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("dsms")
    .join("logs");
  std::fs::create_dir_all(&log_dir)?;

  let appender = tracing_appender::rolling::daily(log_dir, "dsms.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_env("DSMS_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
