//! Upload a file to the demo project and print its metadata
//!
//! ```text
//! cargo run --example upload_file -- path/to/file.jpg
//! ```

use anyhow::Context;
use uploadcare_client::{StoreMode, UploadSource, UploadcareClient, Uploader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .context("usage: upload_file <path>")?;

    let client = UploadcareClient::demo()?;
    let file = client
        .file_uploader(UploadSource::Path(path.into()))
        .store(StoreMode::Store)
        .progress(|p| eprintln!("part {}/{}: {:.0}%", p.current_part, p.total_parts, p.percentage()))
        .upload()
        .await?;

    println!("{}", serde_json::to_string_pretty(&file)?);
    if file.is_image {
        let preview = file.cdn_path().preview(300, 300).url(client.urls())?;
        println!("Preview: {}", preview);
    }

    Ok(())
}
