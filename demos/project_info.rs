//! Print the demo project's name, public key and collaborators
//!
//! ```text
//! cargo run --example project_info
//! ```

use uploadcare_client::UploadcareClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let client = UploadcareClient::demo()?;
    let project = client.get_project().await?;

    println!("Name: {}", project.name);
    println!("Public key: {}", project.pub_key);

    if !project.collaborators.is_empty() {
        println!("Collaborators:");
        for collaborator in &project.collaborators {
            println!(" - {} <{}>", collaborator.name, collaborator.email);
        }
    }

    Ok(())
}
