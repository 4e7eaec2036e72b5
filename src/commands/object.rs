use crate::{
    browser::{BrowserItem, BrowserState, MediaFilter, ObjectBrowser, format_size},
    client::ConsoleClient,
    commands::bucket::confirm,
    models::object::file_name,
};
use anyhow::{Context, Result, bail};
use bytes::Bytes;
use clap::Parser;
use console::style;
use std::path::PathBuf;

/// Lifetime of links printed by `url`, matching the browser's "copy link".
pub const SHARE_LINK_EXPIRY_SECS: u64 = 86_400;

#[derive(Parser)]
pub struct LsCli {
    pub bucket: String,

    /// Folder to list, e.g. `photos/2025/`
    #[arg(default_value = "")]
    pub prefix: String,

    /// List every image or video in the bucket instead of one folder
    #[arg(long, value_enum, default_value_t = MediaFilter::All)]
    pub media: MediaFilter,

    /// Keep loading pages until the listing is exhausted
    #[arg(short, long)]
    pub all: bool,
}

impl LsCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let mut browser = ObjectBrowser::new(client.clone(), self.bucket.clone());
        if self.media.is_media() {
            browser.set_filter(self.media).await;
        } else {
            browser.navigate(self.prefix.clone()).await;
        }
        if let BrowserState::Error(message) = browser.state() {
            bail!("{message}");
        }
        if self.all {
            while browser.load_more().await {}
        }

        for item in browser.visible_items() {
            print_item(item);
        }

        let total = browser.all_items().len();
        let shown = browser.visible_items().len();
        let (images, videos) = browser.media_counts();
        let mut summary = format!("{total} entries, {images} images, {videos} videos");
        if browser.has_more() {
            summary.push_str(&format!(" ({} more, use --all)", total - shown));
        }
        println!("{}", style(summary).dim());
        Ok(())
    }
}

fn print_item(item: &BrowserItem) {
    match item {
        BrowserItem::Folder { key, .. } => {
            println!("{:>10}  {:<5}  {}", "-", "dir", style(key).blue());
        }
        BrowserItem::File { info, .. } => {
            let kind = item.file_kind().map(|k| k.label()).unwrap_or("file");
            println!("{:>10}  {:<5}  {}", format_size(info.size), kind, info.key);
        }
    }
}

#[derive(Parser)]
pub struct UploadCli {
    pub bucket: String,

    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Folder to upload into, e.g. `photos/`
    #[arg(short, long, default_value = "")]
    pub prefix: String,
}

impl UploadCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let total = self.files.len();
        for (index, path) in self.files.iter().enumerate() {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("{} has no usable file name", path.display()))?;
            let data = tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;

            let receipt = client
                .upload(&self.bucket, &self.prefix, name, Bytes::from(data), None)
                .await?;
            println!(
                "  {} [{}/{}] {} ({}, etag {})",
                style("✓").green(),
                index + 1,
                total,
                receipt.key,
                format_size(receipt.size as i64),
                receipt.etag
            );
        }
        Ok(())
    }
}

#[derive(Parser)]
pub struct DownloadCli {
    pub bucket: String,
    pub key: String,

    /// Destination path (defaults to the object's file name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl DownloadCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(file_name(&self.key)));
        let data = client.download(&self.bucket, &self.key).await?;
        tokio::fs::write(&output, &data)
            .await
            .with_context(|| format!("writing {}", output.display()))?;
        println!(
            "{} {} -> {} ({})",
            style("✓").green(),
            self.key,
            output.display(),
            format_size(data.len() as i64)
        );
        Ok(())
    }
}

#[derive(Parser)]
pub struct RmCli {
    pub bucket: String,

    #[arg(required = true)]
    pub keys: Vec<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl RmCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        if !self.yes && !confirm(&format!("Delete {} object(s)?", self.keys.len()))? {
            return Ok(());
        }

        if let [key] = self.keys.as_slice() {
            let response = client.delete_object(&self.bucket, key).await?;
            println!("{} {}", style("✓").green(), response.message);
            return Ok(());
        }

        let report = client.delete_objects(&self.bucket, &self.keys).await?;
        println!("{} deleted {}", style("✓").green(), report.deleted);
        for (key, message) in &report.failed {
            println!("  {} {}: {}", style("✗").red(), key, message);
        }
        if !report.failed.is_empty() {
            bail!("{} object(s) could not be deleted", report.failed.len());
        }
        Ok(())
    }
}

#[derive(Parser)]
pub struct StatCli {
    pub bucket: String,
    pub key: String,
}

impl StatCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let info = client.stat(&self.bucket, &self.key).await?;
        println!("key:           {}", info.key);
        println!("size:          {} ({} bytes)", format_size(info.size), info.size);
        if let Some(modified) = info.last_modified {
            println!("last modified: {}", modified.to_rfc3339());
        }
        if let Some(etag) = info.etag {
            println!("etag:          {etag}");
        }
        if let Some(content_type) = info.content_type {
            println!("content type:  {content_type}");
        }
        Ok(())
    }
}

#[derive(Parser)]
pub struct UrlCli {
    pub bucket: String,
    pub key: String,

    /// Link lifetime in seconds
    #[arg(short, long, default_value_t = SHARE_LINK_EXPIRY_SECS)]
    pub expiry: u64,
}

impl UrlCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let url = client
            .presigned_url(&self.bucket, &self.key, self.expiry)
            .await?;
        println!("{url}");
        Ok(())
    }
}

#[derive(Parser)]
pub struct MkdirCli {
    pub bucket: String,
    pub name: String,

    /// Parent folder, e.g. `photos/`
    #[arg(short, long, default_value = "")]
    pub prefix: String,
}

impl MkdirCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() {
            bail!("folder name must not be empty");
        }
        let response = client
            .create_folder(&self.bucket, &format!("{}{}", self.prefix, name))
            .await?;
        println!("{} {}", style("✓").green(), response.message);
        Ok(())
    }
}
