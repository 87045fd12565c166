//! tekdrive CLI - Interact with Drive from the command line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::future::BoxFuture;
use futures::FutureExt;
use glob::glob;
use tracing_subscriber::EnvFilter;

use tekdrive::config::{ClientConfig, ENV_ACCESS_KEY, ENV_BASE_URL};
use tekdrive::models::{format_size, SearchQuery, TreeOptions};
use tekdrive::{DriveClient, Node, Parsed};

/// CLI tool for interacting with Drive.
#[derive(Parser)]
#[command(name = "tekdrive")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Drive access key.
    #[arg(long, env = ENV_ACCESS_KEY, hide_env_values = true)]
    access_key: String,

    /// API base URL.
    #[arg(long, env = ENV_BASE_URL)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the account user.
    Me,

    /// Show storage usage.
    Usage,

    /// Show file details.
    Info {
        /// File ID.
        file: String,
    },

    /// Search files and folders by name.
    Search {
        name: String,

        /// Maximum number of results.
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },

    /// Print a folder tree.
    Tree {
        /// Starting folder ID. Defaults to the root folder.
        #[arg(long)]
        folder: Option<String>,

        /// Nesting levels to return.
        #[arg(long, default_value_t = 1)]
        depth: u32,

        /// Leave files out.
        #[arg(long)]
        folders_only: bool,
    },

    /// List items in the trashcan.
    Trash {
        /// Maximum number of items.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Upload files to a folder.
    Upload {
        /// File patterns to upload (supports glob patterns like *.tar, file_{1,2,3}.txt).
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Destination folder ID.
        #[arg(long, short = 't')]
        to: String,
    },

    /// Download a file to local filesystem.
    Download {
        /// File ID to download.
        file: String,

        /// Local destination path (file or directory).
        #[arg(long, short = 't', default_value = ".")]
        to: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::builder();
    if let Some(base_url) = &cli.base_url {
        config = config.base_url(base_url);
    }
    let config = config.build().context("Invalid client configuration")?;
    let client = DriveClient::with_config(cli.access_key, config).context("Failed to create client")?;

    match cli.command {
        Commands::Me => {
            let user = client.user().me().await.context("Failed to fetch user")?;
            let plan = user.plan().await?;
            println!("ID:       {}", user.id());
            println!("Username: {}", user.username().await?);
            println!("Account:  {}", user.account_id().await?);
            println!("Plan:     {} ({} storage)", plan.name, format_size(plan.storage_limit));
        }

        Commands::Usage => {
            let usage = client.user().usage().await.context("Failed to fetch usage")?;
            println!("Used:      {}", format_size(usage.storage_used()));
            println!("Limit:     {}", format_size(usage.storage_limit()));
            println!("Freeable:  {}", format_size(usage.storage_freeable()));
            let remaining = usage.storage_remaining();
            if remaining < 0 {
                println!("Remaining: over limit by {}", format_size(remaining.unsigned_abs()));
            } else {
                println!("Remaining: {}", format_size(remaining as u64));
            }
        }

        Commands::Info { file } => {
            let file = client.file(file);
            let name = file
                .name()
                .await
                .with_context(|| format!("Failed to fetch file: {}", file))?;
            println!("ID:       {}", file.id());
            println!("Name:     {}", name);
            println!("Size:     {}", format_size(file.bytes().await?));
            println!("Type:     {}", file.file_type().await?.unwrap_or_else(|| "-".to_string()));
            println!("Owner:    {}", file.owner().await?.username);
            println!("Parent:   {}", file.parent_folder_id().await?.unwrap_or_else(|| "-".to_string()));
            println!("Created:  {}", file.created_at().await?);
        }

        Commands::Search { name, limit } => {
            let query = SearchQuery::new().name(&name).limit(Some(limit));
            let mut results = client.search().query(&query)?;
            let mut found = 0;
            while let Some(item) = results.next().await.context("Search failed")? {
                println!("{}", describe(&item).await?);
                found += 1;
            }
            if found == 0 {
                println!("No matches for '{}'.", name);
            }
        }

        Commands::Tree {
            folder,
            depth,
            folders_only,
        } => {
            let options = TreeOptions {
                folder_id: folder,
                depth: Some(depth),
                folders_only,
                ..TreeOptions::default()
            };
            let root = client.tree().get(&options).await.context("Failed to fetch tree")?;
            println!("{}/ ({})", root.name().await?, root.id());
            if let Some(children) = root.children() {
                print_tree(children, 1).await?;
            }
        }

        Commands::Trash { limit } => {
            let mut items = client.trashcan().get(None, limit);
            let mut found = 0;
            while let Some(item) = items.next().await.context("Failed to list trash")? {
                let trash = item.into_trash()?;
                let node = trash.item().await?;
                println!(
                    "{:<40} {:>10} {}",
                    node.id(),
                    format_size(trash.total_bytes().await.unwrap_or(0)),
                    trash.trashed_at().await?
                );
                found += 1;
            }
            if found == 0 {
                println!("Trashcan is empty.");
            }
        }

        Commands::Upload { patterns, to } => {
            let files_to_upload = resolve_patterns(&patterns)?;
            if files_to_upload.is_empty() {
                anyhow::bail!("No files to upload");
            }

            println!("Uploading {} file(s) to {}...", files_to_upload.len(), to);

            let helper = client.files();
            for (idx, file_path) in files_to_upload.iter().enumerate() {
                let filename = file_path.file_name().unwrap_or_default().to_string_lossy();
                print!("[{}/{}] Uploading {}... ", idx + 1, files_to_upload.len(), filename);

                match helper.upload_path(file_path, Some(&to)).await {
                    Ok(file) => {
                        println!("OK ({})", file.id());
                    }
                    Err(e) => {
                        println!("FAILED");
                        eprintln!("  Error: {}", e);
                    }
                }
            }

            println!("Done.");
        }

        Commands::Download { file, to } => {
            let file = client.file(file);

            let target = if to.is_dir() || to.to_string_lossy().ends_with('/') {
                std::fs::create_dir_all(&to)
                    .with_context(|| format!("Failed to create directory: {:?}", to))?;
                let name = file
                    .name()
                    .await
                    .with_context(|| format!("Failed to fetch file: {}", file))?;
                download_target(&to, &name)?
            } else {
                if let Some(parent) = to.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
                    }
                }
                to
            };

            print!("Downloading {}... ", file);

            let written = file
                .download_to(&target)
                .await
                .with_context(|| format!("Failed to download file: {}", file))?;

            println!("OK ({})", format_size(written));
            println!("Saved to: {:?}", target);
        }
    }

    Ok(())
}

async fn describe(item: &Parsed) -> Result<String> {
    Ok(match item {
        Parsed::File(file) => format!("{:<40} FILE    {}", file.id(), file.name().await?),
        Parsed::Folder(folder) => format!("{:<40} FOLDER  {}", folder.id(), folder.name().await?),
        other => format!("{:?}", other),
    })
}

fn print_tree(nodes: Vec<Node>, level: usize) -> BoxFuture<'static, Result<()>> {
    async move {
        let indent = "  ".repeat(level);
        for node in nodes {
            match node {
                Node::File(file) => println!("{}{}", indent, file.name().await?),
                Node::Folder(folder) => {
                    println!("{}{}/", indent, folder.name().await?);
                    if let Some(children) = folder.children() {
                        print_tree(children, level + 1).await?;
                    }
                }
            }
        }
        Ok(())
    }
    .boxed()
}

/// Expand glob and brace patterns into a sorted, deduplicated file list.
/// Place a server-supplied file name inside `dir`, dropping any directory parts.
fn download_target(dir: &Path, name: &str) -> Result<PathBuf> {
    let file_name = Path::new(name)
        .file_name()
        .with_context(|| format!("Refusing to save file with unsafe name: {:?}", name))?;
    Ok(dir.join(file_name))
}

fn resolve_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        for expanded_pattern in expand_braces(pattern) {
            let matches: Vec<PathBuf> = glob(&expanded_pattern)
                .with_context(|| format!("Invalid glob pattern: {}", expanded_pattern))?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file())
                .collect();

            if matches.is_empty() {
                // No glob match: treat as a literal path
                let path = Path::new(&expanded_pattern);
                if path.is_file() {
                    files.push(path.to_path_buf());
                } else {
                    eprintln!("Warning: No files matched pattern: {}", expanded_pattern);
                }
            } else {
                files.extend(matches);
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Expand brace patterns like file_{1,2,3}.txt into multiple patterns.
fn expand_braces(pattern: &str) -> Vec<String> {
    if let Some(start) = pattern.find('{') {
        if let Some(end) = pattern[start..].find('}') {
            let end = start + end;
            let prefix = &pattern[..start];
            let suffix = &pattern[end + 1..];
            let alternatives = &pattern[start + 1..end];

            return alternatives
                .split(',')
                .flat_map(|alt| {
                    let expanded = format!("{}{}{}", prefix, alt.trim(), suffix);
                    expand_braces(&expanded)
                })
                .collect();
        }
    }

    vec![pattern.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_braces_simple() {
        let result = expand_braces("file_{1,2,3}.txt");
        assert_eq!(result, vec!["file_1.txt", "file_2.txt", "file_3.txt"]);
    }

    #[test]
    fn test_expand_braces_no_braces() {
        let result = expand_braces("file.txt");
        assert_eq!(result, vec!["file.txt"]);
    }

    #[test]
    fn test_expand_braces_nested() {
        let result = expand_braces("{a,b}_{1,2}.txt");
        assert_eq!(result, vec!["a_1.txt", "a_2.txt", "b_1.txt", "b_2.txt"]);
    }

    #[test]
    fn test_download_target_strips_directories() {
        let dir = Path::new("/tmp/out");
        assert_eq!(download_target(dir, "a.txt").unwrap(), dir.join("a.txt"));
        assert_eq!(download_target(dir, "../x").unwrap(), dir.join("x"));
        assert_eq!(download_target(dir, "/etc/passwd").unwrap(), dir.join("passwd"));
        assert!(download_target(dir, "..").is_err());
        assert!(download_target(dir, "").is_err());
    }

    #[test]
    fn test_resolve_patterns_dedups_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.tar", "a.tar", "c.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let base = dir.path().display();
        let patterns = vec![format!("{base}/*.tar"), format!("{base}/{{a,c}}.t*")];

        let files = resolve_patterns(&patterns).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.tar", "b.tar", "c.txt"]);
    }
}
