use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

use commands::models::{ModelsArgs, ModelsCommands};
use config::{ConfigLoader, ScribeConfig};

#[derive(Parser)]
#[command(name = "scribe", about = "OCR through vision-capable LLM providers")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the user and project configs
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List models and manage provider credentials
    Models(commands::models::ModelsArgs),
    /// Extract text from an image
    Ocr(commands::ocr::OcrArgs),
}

impl Commands {
    /// Credential management never reads the config, so a broken config file
    /// cannot stop a user from storing keys.
    fn needs_config(&self) -> bool {
        !matches!(
            self,
            Commands::Models(ModelsArgs {
                command: Some(ModelsCommands::Auth { .. })
            })
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = if cli.command.needs_config() {
        ConfigLoader::load(cli.config.as_deref())?
    } else {
        ScribeConfig::default()
    };

    match cli.command {
        Commands::Models(args) => commands::models::run(args, &config).await,
        Commands::Ocr(args) => commands::ocr::run(args, &config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn auth_skips_config_loading() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[ocr\ndefault_model = ").unwrap();
        let path = path.to_str().unwrap();
        assert!(ConfigLoader::load(Some(path.as_ref())).is_err());

        for args in [
            ["scribe", "--config", path, "models", "auth", "--list"].as_slice(),
            ["scribe", "--config", path, "models", "auth", "gemini"].as_slice(),
            ["scribe", "models", "auth", "claude", "--delete", "--config", path].as_slice(),
        ] {
            assert!(!parse(args).command.needs_config(), "{args:?}");
        }
    }

    #[test]
    fn listing_and_ocr_load_config() {
        assert!(parse(&["scribe", "models"]).command.needs_config());
        assert!(parse(&["scribe", "models", "list"]).command.needs_config());
        assert!(parse(&["scribe", "ocr", "scan.png"]).command.needs_config());
    }
}
