mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use acsdesk_config::{ConsoleConfig, TaskOperation};
use acsdesk_drawer::{DeviceSetAnalysis, DownloadChoices, Drawer, DrawerServices, invalid_reason};
use acsdesk_notify::{NotificationCenter, NotificationSink};
use acsdesk_store::{InMemoryFileCatalog, InMemoryTaskStore, WatchRefreshSignal};
use acsdesk_transport::ScriptedTransport;

use session::SessionFile;

/// acsdesk - Task drawer for a CWMP device-management console
#[derive(Parser)]
#[command(name = "acsdesk")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.acsdesk)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Console configuration file (default: <data-dir>/config.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Queue every valid staged task of a session and commit the queue
  Run {
    /// Path to the session file (JSON)
    session_file: PathBuf,

    /// Dismiss all notifications after the commit and wait for their removal
    #[arg(long)]
    dismiss: bool,
  },

  /// Show device-set analysis and download choices for staged tasks
  Describe {
    /// Path to the session file (JSON)
    session_file: PathBuf,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".acsdesk"),
  };
  let config = load_config(cli.config.as_deref(), &data_dir)?;

  match cli.command {
    Some(Commands::Run {
      session_file,
      dismiss,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { run_session(session_file, config, dismiss).await })?;
    }
    Some(Commands::Describe { session_file }) => {
      describe_session(session_file, config)?;
    }
    None => {
      println!("acsdesk - use --help to see available commands");
    }
  }

  Ok(())
}

fn load_config(explicit: Option<&Path>, data_dir: &Path) -> Result<ConsoleConfig> {
  let path = match explicit {
    Some(path) => path.to_path_buf(),
    None => {
      let path = data_dir.join("config.json");
      if !path.exists() {
        return Ok(ConsoleConfig::default());
      }
      path
    }
  };

  let content = std::fs::read_to_string(&path)
    .with_context(|| format!("failed to read config file: {}", path.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse config file: {}", path.display()))
}

fn read_session(session_file: &Path) -> Result<SessionFile> {
  let content = std::fs::read_to_string(session_file)
    .with_context(|| format!("failed to read session file: {}", session_file.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse session file: {}", session_file.display()))
}

async fn run_session(session_file: PathBuf, config: ConsoleConfig, dismiss: bool) -> Result<()> {
  let session = read_session(&session_file)?;

  let store = Arc::new(InMemoryTaskStore::new());
  session::preload_queue(store.as_ref(), session.queue)
    .context("failed to load queued tasks")?;

  let mut transport = ScriptedTransport::new(store.clone()).with_devices(session.devices);
  if let Some(message) = session.reject {
    transport = transport.rejecting(message);
  }

  let center = Arc::new(NotificationCenter::from_config(&config));
  let refresh = Arc::new(WatchRefreshSignal::new());

  let drawer = Drawer::new(
    DrawerServices {
      store: store.clone(),
      catalog: Arc::new(InMemoryFileCatalog::new(session.files)),
      transport: Arc::new(transport),
      notifications: center.clone(),
      refresh: refresh.clone(),
    },
    config,
  );

  for task in session.staging {
    drawer.stage(task);
  }

  for entry in drawer.staging_view() {
    if !entry.queueable {
      warn!(
        task_id = %entry.task.id,
        reason = entry.reason.unwrap_or("invalid"),
        "staged task left in staging"
      );
      continue;
    }
    drawer
      .queue_staged(&entry.task.id)
      .with_context(|| format!("failed to queue staged task {}", entry.task.id))?;
  }

  let summary = drawer.commit().await;
  info!(
    submitted = summary.submitted,
    devices = summary.devices.len(),
    "session committed"
  );

  if dismiss {
    for notification in NotificationSink::notifications(center.as_ref()) {
      center.dismiss(notification.timestamp)?;
    }

    let reaper = center.clone().spawn_reaper();
    while !NotificationSink::notifications(center.as_ref()).is_empty() {
      tokio::time::sleep(Duration::from_millis(50)).await;
    }
    reaper.shutdown().await;
  }

  let output = serde_json::json!({
    "commit": summary,
    "counts": drawer.summary(),
    "queue": drawer.groups(),
    "staging": drawer.staging_view(),
    "notifications": drawer.notifications(),
    "refreshed_at": refresh.last(),
  });
  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

fn describe_session(session_file: PathBuf, config: ConsoleConfig) -> Result<()> {
  let session = read_session(&session_file)?;
  let catalog = InMemoryFileCatalog::new(session.files);

  let tasks: Vec<serde_json::Value> = session
    .staging
    .iter()
    .map(|task| {
      let choices = matches!(task.operation, TaskOperation::Download { .. })
        .then(|| DownloadChoices::build(task, &catalog, &config));
      serde_json::json!({
        "id": task.id,
        "name": task.operation.name(),
        "description": task.operation.to_string(),
        "devices": task.devices,
        "analysis": DeviceSetAnalysis::analyze(&task.devices),
        "queueable": invalid_reason(task).is_none(),
        "reason": invalid_reason(task),
        "download": choices,
      })
    })
    .collect();

  println!("{}", serde_json::to_string_pretty(&tasks)?);
  Ok(())
}
