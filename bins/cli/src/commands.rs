//! Command implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use mmx_core::amount::{AmountInput, AmountInputArgs, Key, NumberFormat};
use mmx_core::currency::CurrencyService;
use mmx_core::storage::{StorageConfig, StorageProvider, StorageService};
use mmx_core::sync::{
    DatabaseMetadata, RecentDatabases, StaticNetwork, SyncAction, SyncEvent, SyncError,
    SyncManager, SyncNotice, SyncOutcome, SyncPreferences, SyncTrigger, SyncWorker,
};
use mmx_shared::AppConfig;
use mmx_shared::{AppError, AppResult};
use mmx_shared::types::{Currency, CurrencyId};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{AmountArgs, Command, EvalArgs, KeysArgs, TransferArgs, WatchArgs};

/// Runs a parsed command.
pub async fn run(command: Command) -> anyhow::Result<()> {
    let source = AppConfig::source()
        .map_err(AppError::from)
        .context("Failed to read configuration")?;
    let config: AppConfig = source
        .clone()
        .try_deserialize()
        .map_err(AppError::from)
        .context("Failed to load configuration")?;

    match command {
        Command::Eval(args) => eval(&config, &source, &args)?,
        Command::Keys(args) => keys(&config, &source, &args)?,
        Command::Sync(args) => transfer(&config, &source, SyncAction::Sync, &args).await?,
        Command::Upload(args) => transfer(&config, &source, SyncAction::Upload, &args).await?,
        Command::Download(args) => {
            transfer(&config, &source, SyncAction::Download, &args).await?;
        }
        Command::Status => status(&config, &source).await?,
        Command::Watch(args) => watch(&config, &source, &args).await?,
    }
    Ok(())
}

fn eval(config: &AppConfig, source: &config::Config, args: &EvalArgs) -> AppResult<()> {
    let mut input = open_input(config, source, &args.amount, None)?;
    let amount = input.set_expression(args.expression.as_str())?;

    println!("{amount}");
    println!("{}", input.top_text());
    Ok(())
}

fn keys(config: &AppConfig, source: &config::Config, args: &KeysArgs) -> AppResult<()> {
    let mut input = open_input(config, source, &args.amount, args.initial.clone())?;
    let locale = locale(config);

    for ch in args.keys.chars().filter(|c| !c.is_whitespace()) {
        let key = Key::from_char(ch, &locale)
            .ok_or_else(|| AppError::Validation(format!("Unknown key '{ch}'")))?;
        let confirmed = input.press(key);

        let marker = if input.is_warning() { " !" } else { "" };
        println!("{ch}  {:<24} {}{marker}", input.expression(), input.top_text());

        if let Some(amount) = confirmed {
            println!("= {amount}");
            return Ok(());
        }
    }
    Ok(())
}

fn open_input(
    config: &AppConfig,
    source: &config::Config,
    args: &AmountArgs,
    initial: Option<String>,
) -> AppResult<AmountInput> {
    let currencies = Arc::new(load_currencies(source)?);
    let input_args = AmountInputArgs {
        currency_id: args.currency_id.map(CurrencyId::from),
        amount: initial,
        round_to_currency: config.input.round_to_currency && !args.no_round,
    };

    let input = AmountInput::new(input_args, currencies, locale(config))?
        .with_default_precision(config.input.default_precision);
    Ok(input)
}

fn locale(config: &AppConfig) -> NumberFormat {
    NumberFormat::from(&config.locale)
}

/// Currencies from the `currencies` config section, or the built-in table.
fn load_currencies(source: &config::Config) -> AppResult<CurrencyService> {
    match source.get::<Vec<Currency>>("currencies") {
        Ok(currencies) => Ok(CurrencyService::with_currencies(currencies)),
        Err(config::ConfigError::NotFound(_)) => Ok(CurrencyService::builtin()),
        Err(err) => Err(err.into()),
    }
}

/// Storage from the `storage` config section. Without one, remote files
/// live in a `remote` folder under the database directory.
fn storage_config(config: &AppConfig, source: &config::Config) -> AppResult<StorageConfig> {
    match source.get::<StorageConfig>("storage") {
        Ok(storage) => Ok(storage),
        Err(config::ConfigError::NotFound(_)) => Ok(StorageConfig::new(StorageProvider::local_fs(
            config.sync.database_dir.join("remote"),
        ))),
        Err(err) => Err(err.into()),
    }
}

struct Session {
    manager: SyncManager,
    storage: StorageService,
    worker: JoinHandle<()>,
}

impl Session {
    async fn open(
        config: &AppConfig,
        source: &config::Config,
        metered: bool,
    ) -> AppResult<Self> {
        let storage = StorageService::from_config(storage_config(config, source)?)?;
        let databases = Arc::new(RwLock::new(
            RecentDatabases::load(&config.sync.databases_file).await?,
        ));
        let preferences = SyncPreferences::load(&config.sync.preferences_file).await?;

        let (handle, worker) = SyncWorker::new(storage.clone(), Arc::clone(&databases)).spawn();
        let network = Arc::new(StaticNetwork::new(true, !metered));
        let manager = SyncManager::new(
            handle,
            network,
            databases,
            preferences,
            config.sync.preferences_file.clone(),
        );

        debug!(provider = storage.provider_name(), "Sync session opened");
        Ok(Self {
            manager,
            storage,
            worker,
        })
    }

    /// Drops the manager and waits for the worker to drain its queue.
    async fn close(self) -> AppResult<()> {
        drop(self.manager);
        self.worker
            .await
            .map_err(|err| AppError::Internal(format!("Sync worker failed: {err}")))
    }
}

async fn transfer(
    config: &AppConfig,
    source: &config::Config,
    action: SyncAction,
    args: &TransferArgs,
) -> AppResult<()> {
    let session = Session::open(config, source, args.metered).await?;
    link_database(&session.manager, &config.sync.database_dir, args).await?;
    let result = run_transfer(&session.manager, action).await;
    session.close().await?;
    result
}

async fn run_transfer(manager: &SyncManager, action: SyncAction) -> AppResult<()> {
    let events = match action {
        SyncAction::Sync => match manager.trigger_synchronization().await? {
            SyncTrigger::Queued(events) => Some(events),
            SyncTrigger::Notice(notice) => return Err(AppError::Validation(notice.to_string())),
            SyncTrigger::Skipped => {
                println!("Synchronization skipped");
                return Ok(());
            }
        },
        SyncAction::Upload => manager.trigger_upload().await?,
        SyncAction::Download => manager.trigger_download().await?,
    };
    let events = events
        .ok_or_else(|| AppError::Validation(SyncNotice::SelectRemoteFile.to_string()))?;

    match wait_for_outcome(events).await? {
        SyncOutcome::Uploaded(version) => {
            println!("Uploaded {} bytes", version.content_length);
        }
        SyncOutcome::Downloaded(version) => {
            if let Some(local) = current_local_path(manager).await {
                manager.use_downloaded_database(&local).await?;
                println!(
                    "Downloaded {} bytes to {}",
                    version.content_length,
                    local.display()
                );
            }
        }
        SyncOutcome::NoChange => println!("Already up to date"),
        SyncOutcome::Conflict => {
            return Err(AppError::Sync(
                "Both the local and the remote database changed since the last sync".to_string(),
            ));
        }
    }
    Ok(())
}

/// Registers `--local`/`--remote` in the recent databases and makes the
/// database current.
async fn link_database(
    manager: &SyncManager,
    database_dir: &Path,
    args: &TransferArgs,
) -> AppResult<()> {
    if args.local.is_none() && args.remote.is_none() {
        return Ok(());
    }

    let mut databases = manager.databases().write().await;
    let local_path = match (&args.local, &args.remote) {
        (Some(local), _) => local.clone(),
        (None, Some(remote)) => match databases.current() {
            Some(db) => db.local_path.clone(),
            None => {
                SyncManager::sync_directory(database_dir, database_dir).join(remote_file_name(remote)?)
            }
        },
        (None, None) => return Ok(()),
    };

    let mut metadata = databases
        .get(&local_path)
        .cloned()
        .unwrap_or_else(|| DatabaseMetadata::new(&local_path, ""));
    if let Some(remote) = &args.remote
        && metadata.remote_path != *remote
    {
        metadata.remote_path.clone_from(remote);
        metadata.remote_version = None;
    }

    info!(local = %local_path.display(), remote = %metadata.remote_path, "Linking database");
    databases.insert(metadata);
    databases.set_current(&local_path);
    databases.save().await?;
    Ok(())
}

fn remote_file_name(remote: &str) -> AppResult<&str> {
    remote
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("Remote path '{remote}' has no file name")))
}

async fn current_local_path(manager: &SyncManager) -> Option<PathBuf> {
    manager
        .databases()
        .read()
        .await
        .current()
        .map(|db| db.local_path.clone())
}

async fn wait_for_outcome(mut events: mpsc::Receiver<SyncEvent>) -> AppResult<SyncOutcome> {
    while let Some(event) = events.recv().await {
        match event {
            SyncEvent::Started(action) => info!(%action, "Sync started"),
            SyncEvent::Finished(outcome) => return Ok(outcome),
            SyncEvent::Failed(message) => return Err(AppError::Sync(message)),
        }
    }
    Err(SyncError::WorkerStopped.into())
}

async fn status(config: &AppConfig, source: &config::Config) -> AppResult<()> {
    let session = Session::open(config, source, false).await?;
    let preferences = session.manager.preferences().await;

    match session.manager.databases().read().await.current() {
        Some(db) => {
            println!("Database:      {}", db.local_path.display());
            let remote = if db.is_linked() { db.remote_path.as_str() } else { "(not linked)" };
            println!("Remote:        {remote}");
            println!("Local changes: {}", if db.is_local_file_changed { "yes" } else { "no" });
            match db.last_synced_at {
                Some(at) => println!("Last sync:     {}", at.to_rfc3339()),
                None => println!("Last sync:     never"),
            }
        }
        None => println!("Database:      (none)"),
    }

    println!(
        "Storage:       {} (max {} bytes)",
        session.storage.provider_name(),
        session.storage.config().max_file_size
    );
    println!("Periodic sync: {}", if preferences.enabled { "on" } else { "off" });
    println!("Interval:      {} min", preferences.sync_interval_minutes);
    println!("Upload delay:  {} s", preferences.upload_delay_secs);
    println!("Wi-Fi only:    {}", if preferences.sync_only_on_wifi { "yes" } else { "no" });
    session.close().await
}

async fn watch(config: &AppConfig, source: &config::Config, args: &WatchArgs) -> AppResult<()> {
    let session = Session::open(config, source, args.metered).await?;
    watch_until_interrupted(&session.manager, args).await?;
    session.close().await
}

async fn watch_until_interrupted(manager: &SyncManager, args: &WatchArgs) -> AppResult<()> {
    if let Some(minutes) = args.interval {
        manager.set_sync_interval(minutes).await?;
    }
    manager.set_sync_enabled(true).await?;
    if !manager.start_heartbeat().await {
        return Err(AppError::Validation(
            "Sync interval must be greater than zero".to_string(),
        ));
    }

    if let SyncTrigger::Notice(notice) = manager.trigger_synchronization().await? {
        println!("{notice}");
    }

    println!("Watching, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    manager.stop_heartbeat().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmx_core::sync::SyncHandle;
    use rstest::rstest;

    #[rstest]
    #[case("Apps/MMEX/money.mmb", "money.mmb")]
    #[case("money.mmb", "money.mmb")]
    #[case("C:\\backup\\Money.mmb", "Money.mmb")]
    fn test_remote_file_name(#[case] remote: &str, #[case] expected: &str) {
        assert_eq!(remote_file_name(remote).unwrap(), expected);
    }

    #[test]
    fn test_remote_file_name_missing() {
        assert!(matches!(
            remote_file_name("Apps/MMEX/"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_builtin_currencies_without_config() {
        let source = config::Config::builder().build().unwrap();
        let currencies = load_currencies(&source).unwrap();
        assert_eq!(currencies.find_by_code("EUR").map(|c| c.scale), Some(2));
    }

    #[test]
    fn test_default_storage_is_local() {
        let source = config::Config::builder().build().unwrap();
        let storage = storage_config(&AppConfig::default(), &source).unwrap();
        assert_eq!(storage.provider.name(), "local");
    }

    fn manager(dir: &Path) -> SyncManager {
        let (handle, _rx) = SyncHandle::channel(4);
        let databases = RecentDatabases::new(dir.join("recent.json"));
        SyncManager::new(
            handle,
            Arc::new(StaticNetwork::wifi()),
            Arc::new(RwLock::new(databases)),
            SyncPreferences::default(),
            dir.join("prefs.json"),
        )
    }

    #[tokio::test]
    async fn test_session_close_waits_for_worker() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageService::from_config(StorageConfig::new(StorageProvider::Memory)).unwrap();
        let databases = Arc::new(RwLock::new(RecentDatabases::new(dir.path().join("recent.json"))));
        let (handle, worker) = SyncWorker::new(storage.clone(), Arc::clone(&databases)).spawn();
        let session = Session {
            manager: SyncManager::new(
                handle,
                Arc::new(StaticNetwork::wifi()),
                databases,
                SyncPreferences::default(),
                dir.path().join("prefs.json"),
            ),
            storage,
            worker,
        };

        assert_eq!(session.storage.config().provider, StorageProvider::Memory);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_link_remote_without_local_uses_sync_directory() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        let args = TransferArgs {
            local: None,
            remote: Some("Apps/MMEX/money.mmb".to_string()),
            metered: false,
        };

        link_database(&manager, dir.path(), &args).await.unwrap();

        let databases = manager.databases().read().await;
        let current = databases.current().unwrap();
        assert_eq!(current.local_path, dir.path().join("sync").join("money.mmb"));
        assert_eq!(current.remote_path, "Apps/MMEX/money.mmb");
    }

    #[tokio::test]
    async fn test_relinking_forgets_remote_version() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        let local = dir.path().join("money.mmb");
        {
            let mut databases = manager.databases().write().await;
            let mut meta = DatabaseMetadata::new(&local, "old/money.mmb");
            meta.remote_version = Some(mmx_core::storage::RemoteVersion {
                content_length: 3,
                last_modified: None,
                etag: None,
            });
            databases.insert(meta);
        }
        let args = TransferArgs {
            local: Some(local.clone()),
            remote: Some("new/money.mmb".to_string()),
            metered: false,
        };

        link_database(&manager, dir.path(), &args).await.unwrap();

        let databases = manager.databases().read().await;
        let current = databases.current().unwrap();
        assert_eq!(current.local_path, local);
        assert_eq!(current.remote_path, "new/money.mmb");
        assert!(current.remote_version.is_none());
    }
}
