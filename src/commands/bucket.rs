use crate::{client::ConsoleClient, models::policy::AccessLevel};
use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use dialoguer::Confirm;
use std::path::PathBuf;

#[derive(Parser)]
pub struct BucketsCli;

impl BucketsCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let buckets = client.list_buckets().await?;
        if buckets.is_empty() {
            println!("{}", style("no buckets").dim());
            return Ok(());
        }
        for bucket in buckets {
            let created = bucket
                .creation_date
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".into());
            println!("{:<17} {}", style(created).dim(), bucket.name);
        }
        Ok(())
    }
}

#[derive(Parser)]
pub struct MakeBucketCli {
    pub name: String,

    /// Region for the new bucket (defaults to us-east-1)
    #[arg(long)]
    pub region: Option<String>,
}

impl MakeBucketCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let response = client
            .create_bucket(&self.name, self.region.as_deref())
            .await?;
        println!("{} {}", style("✓").green(), response.message);
        Ok(())
    }
}

#[derive(Parser)]
pub struct RemoveBucketCli {
    pub name: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl RemoveBucketCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        if !self.yes && !confirm(&format!("Delete bucket {}?", self.name))? {
            return Ok(());
        }
        let response = client.delete_bucket(&self.name).await?;
        println!("{} {}", style("✓").green(), response.message);
        Ok(())
    }
}

#[derive(Parser)]
pub struct PolicyCli {
    pub bucket: String,
}

impl PolicyCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let policy = client.get_policy(&self.bucket).await?;
        println!("access: {}", style(&policy.access).cyan());
        if !policy.policy.is_empty() {
            let pretty = serde_json::from_str::<serde_json::Value>(&policy.policy)
                .and_then(|doc| serde_json::to_string_pretty(&doc))
                .unwrap_or(policy.policy);
            println!("{pretty}");
        }
        Ok(())
    }
}

#[derive(Parser)]
pub struct SetPolicyCli {
    pub bucket: String,

    /// JSON policy document; omit (or pass an empty file) to clear the policy
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

impl SetPolicyCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let document = match &self.file {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?,
            None => String::new(),
        };
        let response = client.set_policy(&self.bucket, document.trim()).await?;
        println!("{} {}", style("✓").green(), response.message);
        Ok(())
    }
}

#[derive(Parser)]
pub struct AccessCli {
    pub bucket: String,

    /// private, public-read or public-read-write
    pub level: String,
}

impl AccessCli {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        let level = AccessLevel::from_canned_name(&self.level)?;
        let response = client.set_access(&self.bucket, &level).await?;
        println!("{} {}", style("✓").green(), response.message);
        Ok(())
    }
}

pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
