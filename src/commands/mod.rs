//! Client subcommands. Each one drives the REST API through a
//! [`ConsoleClient`] and prints the result.

pub mod bucket;
pub mod connection;
pub mod object;

use crate::client::ConsoleClient;
use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ClientCommands {
    /// Connect the console to a storage server
    Connect(connection::ConnectCli),
    /// Drop the active connection
    Disconnect(connection::DisconnectCli),
    /// Show the active connection
    Status(connection::StatusCli),
    /// List buckets
    Buckets(bucket::BucketsCli),
    /// Create a bucket
    Mb(bucket::MakeBucketCli),
    /// Delete an empty bucket
    Rb(bucket::RemoveBucketCli),
    /// Show a bucket's policy and access level
    Policy(bucket::PolicyCli),
    /// Replace or clear a bucket's policy document
    SetPolicy(bucket::SetPolicyCli),
    /// Apply a canned access level to a bucket
    Access(bucket::AccessCli),
    /// Browse a folder, or every image or video in a bucket
    Ls(object::LsCli),
    /// Upload files
    Upload(object::UploadCli),
    /// Download an object
    Download(object::DownloadCli),
    /// Delete objects
    Rm(object::RmCli),
    /// Show object metadata
    Stat(object::StatCli),
    /// Print a presigned GET URL
    Url(object::UrlCli),
    /// Create a folder placeholder
    Mkdir(object::MkdirCli),
}

impl ClientCommands {
    pub async fn handle(&self, client: &ConsoleClient) -> Result<()> {
        match self {
            ClientCommands::Connect(cli) => cli.handle(client).await,
            ClientCommands::Disconnect(cli) => cli.handle(client).await,
            ClientCommands::Status(cli) => cli.handle(client).await,
            ClientCommands::Buckets(cli) => cli.handle(client).await,
            ClientCommands::Mb(cli) => cli.handle(client).await,
            ClientCommands::Rb(cli) => cli.handle(client).await,
            ClientCommands::Policy(cli) => cli.handle(client).await,
            ClientCommands::SetPolicy(cli) => cli.handle(client).await,
            ClientCommands::Access(cli) => cli.handle(client).await,
            ClientCommands::Ls(cli) => cli.handle(client).await,
            ClientCommands::Upload(cli) => cli.handle(client).await,
            ClientCommands::Download(cli) => cli.handle(client).await,
            ClientCommands::Rm(cli) => cli.handle(client).await,
            ClientCommands::Stat(cli) => cli.handle(client).await,
            ClientCommands::Url(cli) => cli.handle(client).await,
            ClientCommands::Mkdir(cli) => cli.handle(client).await,
        }
    }
}
