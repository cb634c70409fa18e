// # zonekitctl - zone management from the command line
//
// A thin front end over `zonekit-core` and `zonekit-cloudflare`. All
// caching, validation and invalidation live in the library; this binary
// only parses arguments and prints results.
//
// ## Configuration
//
// Loaded from `--config <file>` (JSON, flat or `{"common": {"cloudflare": ...}}`)
// or else from environment variables:
//
// - `ZONEKIT_API_URL`: v4 API root (default: https://api.cloudflare.com/client/v4)
// - `ZONEKIT_EMAIL`, `ZONEKIT_API_KEY`: Key authentication
// - `ZONEKIT_API_TOKEN`: Token authentication (wins over email + key)
// - `ZONEKIT_PAGE_SIZE`: Items per listing page
// - `ZONEKIT_TIMEOUT_SECS`: HTTP timeout
// - `ZONEKIT_LOG_LEVEL`: trace, debug, info, warn or error (default: warn)
//
// ## Example
//
// ```bash
// export ZONEKIT_API_TOKEN=your_token
// zonekitctl records example.com
// zonekitctl add-record example.com www.example.com A 192.0.2.1 --ttl 300
// zonekitctl purge example.com --file https://example.com/app.css
// ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;

use zonekit_cloudflare::CloudflareService;
use zonekit_core::{ClientConfig, Credentials, Error, NewRecord, User};

/// Exit codes for different termination scenarios
///
/// - 0: Command succeeded
/// - 1: Configuration error
/// - 2: The command failed
#[derive(Debug, Clone, Copy)]
enum CtlExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<CtlExitCode> for ExitCode {
    fn from(code: CtlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser, Debug)]
#[command(name = "zonekitctl", version, about = "Manage Cloudflare zones")]
struct Cli {
    /// JSON configuration file (default: ZONEKIT_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List zones
    Zones,
    /// List a zone's DNS records grouped by name
    Records { zone: String },
    /// Create a DNS record
    AddRecord {
        zone: String,
        name: String,
        #[arg(value_name = "TYPE")]
        record_type: String,
        content: String,
        #[arg(long)]
        ttl: Option<u32>,
        #[arg(long)]
        proxied: Option<bool>,
        #[arg(long)]
        priority: Option<u16>,
    },
    /// Delete a DNS record by id
    DeleteRecord { zone: String, record_id: String },
    /// Show a zone's settings
    Settings { zone: String },
    /// Write one zone setting (the value is parsed as JSON, else taken as a string)
    SetSetting {
        zone: String,
        name: String,
        value: String,
    },
    /// List a zone's page rules
    PageRules { zone: String },
    /// Purge a zone's cache, entirely unless files or tags are given
    Purge {
        zone: String,
        #[arg(long = "file")]
        files: Vec<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Show SSL verification details
    SslInfo { zone: String },
}

fn load_config(path: Option<&PathBuf>) -> zonekit_core::Result<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn log_level() -> Level {
    match std::env::var("ZONEKIT_LOG_LEVEL")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level())
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CtlExitCode::ConfigError.into();
    }

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return CtlExitCode::ConfigError.into();
        }
    };

    match run(&config, cli.command) {
        Ok(()) => CtlExitCode::Success.into(),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            CtlExitCode::RuntimeError.into()
        }
    }
}

fn connect(config: &ClientConfig) -> Result<User> {
    let service = CloudflareService::from_config(config)?;
    let (email, api_key) = match config.credentials()? {
        Credentials::ApiKey { email, api_key } => (email, api_key),
        Credentials::Token(_) => (config.email.clone().unwrap_or_default(), String::new()),
    };
    Ok(User::builder(email, api_key, Rc::new(service))
        .with_page_size(config.page_size)
        .build())
}

fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

fn run(config: &ClientConfig, command: Command) -> Result<()> {
    let user = connect(config)?;
    let zone = |name: &str| {
        user.get_zone_by_name(name)
            .with_context(|| format!("Looking up zone {}", name))
    };

    match command {
        Command::Zones => {
            for zone in user.zones()?.iter() {
                println!(
                    "{}\t{}\t{}",
                    zone.id(),
                    zone.name(),
                    zone.status().unwrap_or("-")
                );
            }
        }
        Command::Records { zone: name } => {
            for (name, records) in zone(&name)?.records()?.iter() {
                for record in records {
                    println!(
                        "{}\t{}\t{}\t{}",
                        name,
                        record.record_type().as_deref().unwrap_or("-"),
                        record.content().as_deref().unwrap_or("-"),
                        record.id()
                    );
                }
            }
        }
        Command::AddRecord {
            zone: zone_name,
            name,
            record_type,
            content,
            ttl,
            proxied,
            priority,
        } => {
            let mut new = NewRecord::new(name, record_type).with_content(content);
            if let Some(ttl) = ttl {
                new = new.with_ttl(ttl);
            }
            if let Some(proxied) = proxied {
                new = new.with_proxied(proxied);
            }
            if let Some(priority) = priority {
                new = new.with_priority(priority);
            }
            let record = zone(&zone_name)?.create_record(&new)?;
            println!("{}", record.id());
        }
        Command::DeleteRecord {
            zone: zone_name,
            record_id,
        } => {
            let zone = zone(&zone_name)?;
            let record = zone
                .records()?
                .values()
                .flatten()
                .find(|r| r.id() == record_id)
                .cloned()
                .ok_or_else(|| Error::not_found(format!("DNS record {}", record_id)))?;
            record.delete()?;
        }
        Command::Settings { zone: name } => {
            let zone = zone(&name)?;
            let settings = zone.settings();
            for name in settings.names()? {
                let setting = settings.setting(&name)?;
                let marker = if setting.editable { "" } else { " (read-only)" };
                println!("{}\t{}{}", name, setting.value, marker);
            }
        }
        Command::SetSetting {
            zone: zone_name,
            name,
            value,
        } => {
            let zone = zone(&zone_name)?;
            let setting = zone.settings().apply(&name, parse_value(&value))?;
            println!("{}\t{}", setting.id, setting.value);
        }
        Command::PageRules { zone: name } => {
            for rule in zone(&name)?.page_rules()?.iter() {
                println!(
                    "{}\t{}\t{}",
                    rule.id(),
                    rule.priority().unwrap_or_default(),
                    rule.status().as_deref().unwrap_or("-")
                );
            }
        }
        Command::Purge {
            zone: name,
            files,
            tags,
        } => {
            zone(&name)?.purge_cache(Some(files), Some(tags))?;
        }
        Command::SslInfo { zone: name } => {
            let info = zone(&name)?.get_ssl_verification_info()?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn purge_collects_repeated_flags() {
        let cli = Cli::parse_from([
            "zonekitctl",
            "purge",
            "example.com",
            "--file",
            "https://example.com/a.css",
            "--file",
            "https://example.com/b.css",
        ]);
        match cli.command {
            Command::Purge { files, tags, .. } => {
                assert_eq!(files.len(), 2);
                assert!(tags.is_empty());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn setting_values_parse_as_json_or_string() {
        assert_eq!(parse_value("on"), serde_json::json!("on"));
        assert_eq!(parse_value("300"), serde_json::json!(300));
        assert_eq!(
            parse_value(r#"{"css":"on"}"#),
            serde_json::json!({"css": "on"})
        );
    }
}
