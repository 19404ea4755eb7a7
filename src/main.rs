use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

use gtasks_sync::auth::{on_token_received, refresh_access_token, CredentialStore, FileCredentialStore};
use gtasks_sync::backend::google::GoogleTasksBackend;
use gtasks_sync::cli::{Cli, Command};
use gtasks_sync::config::Config;
use gtasks_sync::constants::MSG_REAUTHENTICATE;
use gtasks_sync::logger;
use gtasks_sync::storage::LocalStorage;
use gtasks_sync::sync::{SyncService, SyncStatus};
use gtasks_sync::SyncError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command_or_default()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.downcast_ref::<SyncError>().is_some_and(SyncError::is_authorization_expired) {
                eprintln!("{MSG_REAUTHENTICATE}");
            }
            eprintln!("❌ Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: &Command) -> Result<()> {
    let dry_run = match command {
        Command::InitConfig { path } => {
            let path = match path {
                Some(path) => path.clone(),
                None => Config::get_default_config_path()?,
            };
            return Config::generate_default_config(path);
        }
        Command::Refresh => None,
        Command::Sync => Some(false),
        Command::DryRun => Some(true),
    };

    let config = Config::load()?;
    logger::init(&config.logging)?;
    let credential_store = FileCredentialStore::new(&config.google.credentials_path);

    match dry_run {
        None => refresh(&credential_store).await,
        Some(dry_run) => sync(&config, &credential_store, dry_run).await,
    }
}

async fn refresh(store: &FileCredentialStore) -> Result<()> {
    let credentials = store
        .load()?
        .with_context(|| format!("No credentials stored at {}", store.path().display()))?;
    let payload = refresh_access_token(&credentials)
        .await
        .map_err(SyncError::from)?;
    on_token_received(store, payload)?;
    Ok(())
}

async fn sync(config: &Config, store: &FileCredentialStore, dry_run: bool) -> Result<()> {
    let credentials = store.load()?.ok_or_else(|| {
        anyhow::anyhow!(
            "No credentials stored at {}. {}",
            store.path().display(),
            MSG_REAUTHENTICATE
        )
    })?;

    let backend = GoogleTasksBackend::with_api_base(credentials.access_token, config.google.api_base.clone());
    let storage = LocalStorage::open(&config.graph.database_path, config.graph.preferences()?).await?;
    let service =
        SyncService::new(Arc::new(backend), Arc::new(storage)).with_concurrent_fetch(config.sync.concurrent_fetch);

    if dry_run {
        let plan = service.plan().await?;
        for batch in &plan.inserts {
            println!("+ {} new task(s) on '{}'", batch.drafts.len(), batch.page);
        }
        println!(
            "Would create {} | overwrite {} | push {} | leave {} unchanged | skip {}",
            plan.inserts.iter().map(|b| b.drafts.len()).sum::<usize>(),
            plan.overwrites.len(),
            plan.push_backs.len(),
            plan.unchanged,
            plan.skipped
        );
        return Ok(());
    }

    match service.sync().await? {
        SyncStatus::Success(report) => println!("✅ {}", report.summary()),
        SyncStatus::InProgress => println!("⏳ A sync is already running"),
    }
    Ok(())
}
