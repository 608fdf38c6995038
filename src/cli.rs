use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "classreel")]
#[command(author, version, about = "School video platform server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config if not specified)
        config: Option<PathBuf>,
    },

    /// Issue a signed bearer token
    IssueToken {
        /// Token subject; a viewer id for students
        #[arg(long)]
        subject: String,

        /// Role to grant: student or admin
        #[arg(long, default_value = "student")]
        role: String,

        /// Lifetime in hours (defaults to auth.token_ttl_hours)
        #[arg(long)]
        ttl_hours: Option<u64>,
    },

    /// Generate a random secret for auth.token_secret
    GenerateSecret,

    /// Display version information
    Version,
}
