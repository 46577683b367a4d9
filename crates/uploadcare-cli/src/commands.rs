//! Subcommands and their output

use crate::config::Connection;
use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use futures::TryStreamExt;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use uploadcare_client::{
    CdnPathBuilder, StoreMode, UploadSource, UploadcareClient, Uploader, MAX_PAGE_SIZE,
};

#[derive(Parser, Debug)]
#[command(name = "uploadcare")]
#[command(about = "Command line client for Uploadcare")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub connection: Connection,

    /// Enable debug logging
    #[arg(short, long, env = "UPLOADCARE_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Show project name and collaborators
    Project,
    /// List files, one UUID per line
    Files {
        /// Only stored (true) or unstored (false) files
        #[arg(long)]
        stored: Option<bool>,
        /// Only removed (true) or live (false) files
        #[arg(long)]
        removed: Option<bool>,
        /// Stop after this many files
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one file
    File { id: String },
    /// Upload a local file
    Upload {
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = StoreArg::Auto)]
        store: StoreArg,
    },
    /// Upload a file Uploadcare fetches from a URL
    UploadUrl {
        url: String,
        #[arg(long, value_enum, default_value_t = StoreArg::Auto)]
        store: StoreArg,
    },
    /// Store files
    Store {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Delete files
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// List groups, one id per line
    Groups,
    /// Show one group
    Group { id: String },
    /// List webhooks
    Webhooks,
    /// Print a CDN URL for a file
    Cdn {
        id: String,
        /// Resize to WIDTHxHEIGHT; either side may be empty
        #[arg(long, value_parser = parse_size)]
        resize: Option<Size>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreArg {
    Auto,
    Yes,
    No,
}

impl From<StoreArg> for StoreMode {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Auto => StoreMode::Auto,
            StoreArg::Yes => StoreMode::Store,
            StoreArg::No => StoreMode::DoNotStore,
        }
    }
}

/// `WxH`, `Wx` or `xH`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

pub fn parse_size(value: &str) -> Result<Size, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {:?}", value))?;
    let side = |s: &str| -> Result<Option<u32>, String> {
        if s.is_empty() {
            Ok(None)
        } else {
            s.parse()
                .map(Some)
                .map_err(|_| format!("invalid dimension {:?}", s))
        }
    };
    let size = Size {
        width: side(width)?,
        height: side(height)?,
    };
    if size.width.is_none() && size.height.is_none() {
        return Err("at least one dimension is required".to_string());
    }
    Ok(size)
}

/// Run one subcommand, writing its output to `out`
pub async fn run(client: &UploadcareClient, command: Command, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::Project => {
            let project = client.get_project().await?;
            print_json(out, &project)?;
        }
        Command::Files {
            stored,
            removed,
            limit,
        } => {
            let mut query = client.files();
            if let Some(stored) = stored {
                query = query.stored(stored);
            }
            if let Some(removed) = removed {
                query = query.removed(removed);
            }
            if let Some(limit) = limit {
                let page = u32::try_from(limit).unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
                query = query.limit(page);
            }

            let mut files = query.stream();
            let mut count = 0usize;
            loop {
                // Checked before pulling, a full page must not trigger the next fetch
                if limit.is_some_and(|limit| count >= limit) {
                    break;
                }
                let Some(file) = files.try_next().await? else {
                    break;
                };
                writeln!(
                    out,
                    "{}\t{}\t{}",
                    file.uuid,
                    file.size,
                    file.original_filename.as_deref().unwrap_or("-")
                )?;
                count += 1;
            }
        }
        Command::File { id } => {
            let file = client.get_file(&id).await?;
            print_json(out, &file)?;
        }
        Command::Upload { path, store } => {
            info!("Uploading {}", path.display());
            let file = client
                .file_uploader(UploadSource::Path(path.clone()))
                .store(store.into())
                .upload()
                .await
                .with_context(|| format!("uploading {}", path.display()))?;
            writeln!(out, "{}", file.uuid)?;
        }
        Command::UploadUrl { url, store } => {
            info!("Uploading from {}", url);
            let file = client
                .url_uploader(url.as_str())
                .store(store.into())
                .upload()
                .await
                .with_context(|| format!("uploading from {}", url))?;
            writeln!(out, "{}", file.uuid)?;
        }
        Command::Store { ids } => {
            client.store_files(&ids).await?;
            writeln!(out, "stored {} file(s)", ids.len())?;
        }
        Command::Delete { ids } => {
            client.delete_files(&ids).await?;
            writeln!(out, "deleted {} file(s)", ids.len())?;
        }
        Command::Groups => {
            let mut groups = client.groups().stream();
            while let Some(group) = groups.try_next().await? {
                writeln!(out, "{}\t{}", group.id, group.files_count)?;
            }
        }
        Command::Group { id } => {
            let group = client.get_group(&id).await?;
            print_json(out, &group)?;
        }
        Command::Webhooks => {
            for hook in client.list_webhooks().await? {
                let state = if hook.is_active { "active" } else { "inactive" };
                writeln!(out, "{}\t{}\t{}\t{}", hook.id, hook.event, hook.target_url, state)?;
            }
        }
        Command::Cdn { id, resize } => {
            let mut path = CdnPathBuilder::new(&id);
            path = match resize {
                Some(Size {
                    width: Some(w),
                    height: Some(h),
                }) => path.resize(w, h),
                Some(Size {
                    width: Some(w),
                    height: None,
                }) => path.resize_width(w),
                Some(Size {
                    width: None,
                    height: Some(h),
                }) => path.resize_height(h),
                Some(Size {
                    width: None,
                    height: None,
                }) => bail!("at least one dimension is required"),
                None => path,
            };
            writeln!(out, "{}", path.url(client.urls())?)?;
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    // Drop nulls so the output stays readable
    let mut value = serde_json::to_value(value)?;
    strip_nulls(&mut value);
    writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    Ok(())
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use uploadcare_client::ClientConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[rstest]
    #[case("100x200", Some(100), Some(200))]
    #[case("100x", Some(100), None)]
    #[case("x200", None, Some(200))]
    #[case("64X64", Some(64), Some(64))]
    fn test_parse_size(#[case] input: &str, #[case] width: Option<u32>, #[case] height: Option<u32>) {
        assert_eq!(parse_size(input), Ok(Size { width, height }));
    }

    #[rstest]
    #[case("100")]
    #[case("x")]
    #[case("ax10")]
    fn test_parse_size_rejects(#[case] input: &str) {
        assert!(parse_size(input).is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "uploadcare",
            "--public-key",
            "pub",
            "upload",
            "photo.jpg",
            "--store",
            "yes",
        ])
        .unwrap();
        assert_eq!(cli.connection.public_key, "pub");
        assert_eq!(
            cli.command,
            Command::Upload {
                path: PathBuf::from("photo.jpg"),
                store: StoreArg::Yes
            }
        );

        let cli = Cli::try_parse_from(["uploadcare", "files", "--stored", "true", "--limit", "5"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Files {
                stored: Some(true),
                removed: None,
                limit: Some(5)
            }
        );

        assert!(Cli::try_parse_from(["uploadcare", "store"]).is_err());
    }

    #[tokio::test]
    async fn test_cdn_command() {
        let client = UploadcareClient::demo().unwrap();
        let mut out = Vec::new();
        let command = Command::Cdn {
            id: "abc".to_string(),
            resize: Some(Size {
                width: Some(200),
                height: None,
            }),
        };
        run(&client, command, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "https://ucarecdn.com/abc/-/resize/200x/\n");
    }

    #[tokio::test]
    async fn test_cdn_command_rejects_oversize() {
        let client = UploadcareClient::demo().unwrap();
        let command = Command::Cdn {
            id: "abc".to_string(),
            resize: Some(Size {
                width: Some(5000),
                height: None,
            }),
        };
        assert!(run(&client, command, &mut Vec::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_files_command_honours_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "next": format!("{}/files/?limit=2&from=c", server.uri()),
                "results": [
                    {"uuid": "a", "size": 1, "original_filename": "a.txt"},
                    {"uuid": "b", "size": 2},
                    {"uuid": "c", "size": 3}
                ]
            })))
            .mount(&server)
            .await;

        let config = ClientConfig::demo().with_api_base(server.uri());
        let client = UploadcareClient::new(config).unwrap();
        let mut out = Vec::new();
        let command = Command::Files {
            stored: None,
            removed: None,
            limit: Some(2),
        };
        run(&client, command, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a\t1\ta.txt\nb\t2\t-\n");
        // The page behind `next` is never requested
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_project_command_prints_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/project/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "demo",
                "pub_key": "demopublickey",
                "collaborators": []
            })))
            .mount(&server)
            .await;

        let config = ClientConfig::demo().with_api_base(server.uri());
        let client = UploadcareClient::new(config).unwrap();
        let mut out = Vec::new();
        run(&client, Command::Project, &mut out).await.unwrap();

        let printed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed["name"], "demo");
    }
}
