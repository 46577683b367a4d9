//! Walk every file of the demo project, page by page
//!
//! ```text
//! cargo run --example files_listing
//! ```

use futures::TryStreamExt;
use uploadcare_client::{Order, UploadcareClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let client = UploadcareClient::demo()?;
    let mut files = client
        .files()
        .ordering(Order::UploadTimeDesc)
        .limit(100)
        .stream();

    let mut index = 0;
    while let Some(file) = files.try_next().await? {
        index += 1;
        let stored = if file.is_stored() { " (stored)" } else { "" };
        println!("{}: {}{}", index, file.uuid, stored);
    }

    Ok(())
}
