mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use cr_core::config::Config;
use cr_server::middleware::auth::{issue_token, Role};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load_or_default(config_path);

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting classreel server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    cr_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "classreel=trace,cr_server=trace,cr_store=debug,cr_core=debug,tower_http=debug"
                .to_string()
        } else {
            "classreel=info,cr_server=info,cr_store=info,cr_core=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::IssueToken {
            subject,
            role,
            ttl_hours,
        } => print_token(cli.config.as_deref(), &subject, &role, ttl_hours),
        Commands::GenerateSecret => {
            println!("{}", generate_secret());
            Ok(())
        }
        Commands::Version => {
            println!("classreel {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read {}", p.display()))?;
            Config::from_json(&contents)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("✓ Configuration parsed");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Data dir: {}", config.server.data_dir.display());
    println!("  Upload dir: {}", config.server.upload_dir.display());
    println!("  Storage driver: {}", config.storage.driver.as_str());
    println!("  Default grades: {}", config.grades.defaults.join(", "));
    println!(
        "  Grades with access keys: {}",
        config.grades.access_tokens.len()
    );

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("No warnings");
    } else {
        println!("Warnings:");
        for warning in &warnings {
            println!("  - {warning}");
        }
    }
    Ok(())
}

fn print_token(
    config_path: Option<&Path>,
    subject: &str,
    role: &str,
    ttl_hours: Option<u64>,
) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let secret = config
        .auth
        .token_secret
        .as_deref()
        .context("auth.token_secret is not set; run `classreel generate-secret` and add it to the config")?;
    let role: Role = role.parse()?;
    let hours = ttl_hours.unwrap_or(config.auth.token_ttl_hours);
    let ttl = i64::try_from(hours)
        .ok()
        .and_then(chrono::Duration::try_hours)
        .context("token lifetime is too large")?;

    let token = issue_token(secret, subject, role, ttl, chrono::Utc::now())?;
    println!("{token}");
    Ok(())
}

fn generate_secret() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
