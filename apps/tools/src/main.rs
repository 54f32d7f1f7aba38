mod config;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    capture_backup,
    device_store::{STATUS_LABEL, TOTAL_COMPONENTS},
    restore_backup, DeviceContext, FormTarget, SimulatedDevice, SysExTransport,
};
use definitions::BlockRegistry;
use shared::domain::{BackupId, Block, FieldValue, SectionType};
use storage::Storage;
use tracing::info;

use crate::config::{load_settings, prepare_database_url, Settings, DEFAULT_CONFIG_FILE};

const SIMULATED_FIRMWARE: [FieldValue; 3] = [1, 0, 0];

#[derive(Parser, Debug)]
#[command(
    about = "Inspect and configure a MIDI controller over SysEx",
    long_about = "Inspect and configure a MIDI controller over SysEx.\n\n\
        Device commands talk to a simulated device that is seeded with resting values on \
        every run. Writes made by `set` and `backup restore` last only for that run."
)]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the registered blocks.
    Blocks,
    /// Print a block's field definitions as JSON.
    Fields { block: Block },
    /// Connect and print the device status.
    Status,
    /// Read one field.
    Get {
        block: Block,
        key: String,
        #[arg(long)]
        instance: Option<u16>,
    },
    /// Write one field. The simulated device does not keep it after this run.
    Set {
        block: Block,
        key: String,
        value: FieldValue,
        #[arg(long)]
        instance: Option<u16>,
    },
    /// Save, list, restore and delete backups.
    #[command(subcommand)]
    Backup(BackupCommand),
}

#[derive(Subcommand, Debug)]
enum BackupCommand {
    /// Capture the device configuration and store it under `name`.
    Save { name: String },
    /// List stored backups, optionally for one device.
    List {
        #[arg(long)]
        device: Option<String>,
    },
    /// Write a stored backup to the device. The simulated device does not keep it after this run.
    Restore { name: String },
    /// Delete a stored backup by id.
    Delete { backup_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config);
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    match cli.command {
        Command::Blocks => {
            for definition in BlockRegistry::builtin().iter() {
                println!(
                    "{:<12} route={:<22} settings={:<2} values={:<2} count_index={}",
                    definition.block,
                    definition.navigation.route_name,
                    definition.fields_of(SectionType::Setting).count(),
                    definition.fields_of(SectionType::Value).count(),
                    definition
                        .component_count_index
                        .map(|index| index.to_string())
                        .unwrap_or_else(|| "-".into()),
                );
            }
        }
        Command::Fields { block } => {
            let registry = BlockRegistry::builtin();
            let definition = registry
                .get(block)
                .ok_or_else(|| anyhow!("block {block} is not registered"))?;
            println!("{}", serde_json::to_string_pretty(&definition.fields)?);
        }
        Command::Status => {
            let context = connect(&settings).await?;
            let store = context.store();
            println!("{}", store.get_as::<String>(STATUS_LABEL).await?);
            println!("total components: {}", store.get(TOTAL_COMPONENTS).await?);
            for definition in context.registry().iter() {
                let count = context.instance_count(definition.block).await?;
                if count > 0 {
                    println!("  {:<12} {count}", definition.block);
                }
            }
        }
        Command::Get {
            block,
            key,
            instance,
        } => {
            let context = connect(&settings).await?;
            let form = context.open_form(block, target(instance)).await?;
            let value = form
                .state()
                .get(&key)
                .ok_or_else(|| anyhow!("{block} has no field '{key}' in this form"))?;
            let visibility = if form.is_visible(&key)? {
                "visible"
            } else {
                "hidden"
            };
            println!("{block}.{key} = {value} ({visibility})");
        }
        Command::Set {
            block,
            key,
            value,
            instance,
        } => {
            let context = connect(&settings).await?;
            let mut form = context.open_form(block, target(instance)).await?;
            form.update(&key, value).await?;
            println!("{block}.{key} = {value}");
        }
        Command::Backup(command) => {
            let database_url = prepare_database_url(&settings.database_url)?;
            let storage = Storage::new(&database_url).await?;
            run_backup(command, &settings, &storage).await?;
        }
    }

    Ok(())
}

async fn run_backup(command: BackupCommand, settings: &Settings, storage: &Storage) -> Result<()> {
    match command {
        BackupCommand::Save { name } => {
            let context = connect(settings).await?;
            let backup = capture_backup(&context).await?;
            let backup_id = storage.save_backup(&name, &backup).await?;
            println!(
                "saved backup '{name}' id={backup_id} entries={}",
                backup.entries.len()
            );
        }
        BackupCommand::List { device } => {
            let backups = match device {
                Some(device) => storage.list_backups_for_device(&device).await?,
                None => storage.list_backups().await?,
            };
            for summary in backups {
                println!(
                    "{:>4}  {:<20} {:<16} fw {:<8} {:>5} entries  {}",
                    summary.backup_id,
                    summary.name,
                    summary.device_name,
                    summary.firmware_version,
                    summary.entry_count,
                    summary.created_at.to_rfc3339()
                );
            }
        }
        BackupCommand::Restore { name } => {
            let stored = storage
                .load_backup_by_name(&name)
                .await?
                .with_context(|| format!("no backup named '{name}'"))?;
            let context = connect(settings).await?;
            let written = restore_backup(&context, &stored.backup).await?;
            println!("restored backup '{name}': {written} values written");
        }
        BackupCommand::Delete { backup_id } => {
            if !storage.delete_backup(BackupId(backup_id)).await? {
                bail!("no backup with id {backup_id}");
            }
            println!("deleted backup id={backup_id}");
        }
    }
    Ok(())
}

fn target(instance: Option<u16>) -> FormTarget {
    instance.map_or(FormTarget::Settings, FormTarget::Instance)
}

/// Opens a session against the simulated device described by `settings`.
async fn connect(settings: &Settings) -> Result<DeviceContext> {
    let registry = BlockRegistry::builtin();
    let device = SimulatedDevice::new(
        settings.device_name.as_str(),
        SIMULATED_FIRMWARE,
        settings.component_counts.clone(),
    );
    device.seed(&registry).await;

    let transport = SysExTransport::new(device)
        .with_timeout(Duration::from_millis(settings.request_timeout_ms));
    let context = DeviceContext::new(registry, Arc::new(transport))?;
    let identity = context.connect().await?;
    info!(device = %identity.device_name, "session ready");
    Ok(context)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
