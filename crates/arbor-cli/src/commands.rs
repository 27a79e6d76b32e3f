use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use arbor_actor::{ActorRuntime, CallContext};
use arbor_directory::DirectoryVersionClient;
use arbor_refs::ReferenceClient;
use arbor_store::FsStateStore;
use arbor_types::{DirectoryId, DirectoryVersion, Reference, ReferenceId};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::cli::*;
use crate::config::NodeConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = NodeConfig::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let runtime = start_runtime(&config).await?;
    let out = Output { format: cli.format };
    let result = match cli.command {
        Command::Directory(command) => run_directory(&runtime, &out, command).await,
        Command::Reference(command) => run_reference(&runtime, &out, command).await,
    };
    runtime.shutdown().await;
    result
}

/// Open the on-disk store, register every entity type, and re-arm the
/// reminders a previous process left behind.
async fn start_runtime(config: &NodeConfig) -> anyhow::Result<ActorRuntime> {
    let store = FsStateStore::open(&config.data_dir)
        .with_context(|| format!("opening state directory {}", config.data_dir.display()))?;
    let runtime = ActorRuntime::new(Arc::new(store), config.runtime.clone());
    arbor_directory::register(&runtime, config.directory.clone());
    arbor_refs::register(&runtime);

    let resumed = runtime.resume_reminders().await?;
    info!(data_dir = %config.data_dir.display(), resumed, "node started");
    Ok(runtime)
}

async fn run_directory(
    runtime: &ActorRuntime,
    out: &Output,
    command: DirectoryCommand,
) -> anyhow::Result<()> {
    let call = CallContext::generate();
    match command {
        DirectoryCommand::Create(args) => {
            let snapshot: DirectoryVersion = read_json(&args.path)?;
            let id = snapshot.directory_id;
            DirectoryVersionClient::new(runtime, id).create(snapshot, &call).await?;
            out.done(&format!("Created directory version {}", id.to_string().yellow()));
        }
        DirectoryCommand::Show(args) => {
            let dv = directory_client(runtime, &args.id)?.get(&call).await?;
            out.value(&dv, || print_directory(&dv));
        }
        DirectoryCommand::Exists(args) => {
            let exists = directory_client(runtime, &args.id)?.exists(&call).await?;
            out.value(&exists, || {
                if exists {
                    println!("{}", "exists".green());
                } else {
                    println!("{}", "not found".red());
                }
            });
        }
        DirectoryCommand::Size(args) => {
            let size = directory_client(runtime, &args.id)?.get_size_recursive(&call).await?;
            out.value(&size, || println!("{} bytes", size.to_string().bold()));
        }
        DirectoryCommand::List(args) => {
            let entries = directory_client(runtime, &args.id)?
                .get_directory_versions_recursive(args.force, &call)
                .await?;
            out.value(&entries, || {
                for dv in &entries {
                    println!(
                        "{}  {}  {:>10}  {}",
                        dv.directory_id.to_string().yellow(),
                        dv.sha256_hash.short_hex().dimmed(),
                        dv.size,
                        dv.relative_path
                    );
                }
                println!("{} directories", entries.len().to_string().bold());
            });
        }
        DirectoryCommand::Delete(args) => {
            let client = directory_client(runtime, &args.id)?;
            client.delete(&call).await?;
            out.done(&format!("Deleted directory version {}", args.id.yellow()));
        }
    }
    Ok(())
}

async fn run_reference(
    runtime: &ActorRuntime,
    out: &Output,
    command: ReferenceCommand,
) -> anyhow::Result<()> {
    let call = CallContext::generate();
    match command {
        ReferenceCommand::Create(args) => {
            let reference: Reference = read_json(&args.path)?;
            let id = reference.reference_id;
            ReferenceClient::new(runtime, id).create(reference, &call).await?;
            out.done(&format!("Created reference {}", id.to_string().yellow()));
        }
        ReferenceCommand::Show(args) => {
            let reference = reference_client(runtime, &args.id)?.get(&call).await?;
            out.value(&reference, || print_reference(&reference));
        }
        ReferenceCommand::Delete(args) => {
            reference_client(runtime, &args.id)?.delete(&call).await?;
            out.done(&format!("Deleted reference {}", args.id.yellow()));
        }
    }
    Ok(())
}

fn directory_client(runtime: &ActorRuntime, id: &str) -> anyhow::Result<DirectoryVersionClient> {
    let id: DirectoryId = id.parse().with_context(|| format!("invalid directory id {id:?}"))?;
    Ok(DirectoryVersionClient::new(runtime, id))
}

fn reference_client(runtime: &ActorRuntime, id: &str) -> anyhow::Result<ReferenceClient> {
    let id: ReferenceId = id.parse().with_context(|| format!("invalid reference id {id:?}"))?;
    Ok(ReferenceClient::new(runtime, id))
}

/// Parse a JSON document from a file, or from stdin when `path` is `-`.
fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).context("reading stdin")?;
        text
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

struct Output {
    format: OutputFormat,
}

impl Output {
    fn value<T: Serialize>(&self, value: &T, text: impl FnOnce()) {
        match self.format {
            OutputFormat::Text => text(),
            OutputFormat::Json => match serde_json::to_string_pretty(value) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("{} {e}", "error:".red().bold()),
            },
        }
    }

    fn done(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{} {}", "✓".green().bold(), message),
            OutputFormat::Json => println!("{}", serde_json::json!({ "ok": true })),
        }
    }
}

fn print_directory(dv: &DirectoryVersion) {
    println!("Directory {}", dv.directory_id.to_string().yellow().bold());
    println!("  Repository: {}", dv.repository_id);
    println!("  Path:       {}", dv.relative_path);
    println!("  Hash:       {}", dv.sha256_hash.to_hex().cyan());
    println!("  Size:       {} bytes", dv.size);
    match dv.recursive_size {
        Some(total) => println!("  Recursive:  {total} bytes"),
        None => println!("  Recursive:  {}", "not computed".dimmed()),
    }
    if let Some(created_at) = dv.created_at {
        println!("  Created:    {}", created_at.to_rfc3339());
    }
    for file in &dv.files {
        println!("  {} {} ({} bytes)", "file".green(), file.relative_path, file.size);
    }
    for child in &dv.directories {
        println!("  {} {}", "dir ".blue(), child);
    }
}

fn print_reference(reference: &Reference) {
    println!("Reference {}", reference.reference_id.to_string().yellow().bold());
    println!("  Type:       {}", reference.reference_type.to_string().cyan());
    println!("  Repository: {}", reference.repository_id);
    println!("  Branch:     {}", reference.branch_id);
    println!("  Directory:  {}", reference.directory_id);
    println!("  Hash:       {}", reference.sha256_hash.to_hex());
    if let Some(created_at) = reference.created_at {
        println!("  Created:    {}", created_at.to_rfc3339());
    }
    if !reference.reference_text.is_empty() {
        println!("\n    {}", reference.reference_text);
    }
}
