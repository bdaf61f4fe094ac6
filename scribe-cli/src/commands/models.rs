//! Model listing and credential management commands.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use dialoguer::{Password, theme::ColorfulTheme};
use scribe_models::auth::CredentialSource;
use scribe_models::{AvailableModel, OcrSettings, ProviderKind};

use super::{credential_store, registry};
use crate::config::ScribeConfig;

/// Models arguments.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: Option<ModelsCommands>,
}

/// Models subcommands.
#[derive(Subcommand, Debug)]
pub enum ModelsCommands {
    /// List models of every configured provider (default)
    List {
        /// Only show one provider (claude, chatgpt, gemini)
        #[arg(long)]
        provider: Option<ProviderKind>,
    },
    /// Manage API credentials
    Auth {
        /// Provider to configure (claude, chatgpt, gemini)
        provider: Option<ProviderKind>,

        /// List configured providers
        #[arg(long)]
        list: bool,

        /// Delete stored credentials
        #[arg(long)]
        delete: bool,
    },
}

/// Run models command.
pub async fn run(args: ModelsArgs, config: &ScribeConfig) -> Result<()> {
    match args.command {
        None => list_models(None, config).await,
        Some(ModelsCommands::List { provider }) => list_models(provider, config).await,
        Some(ModelsCommands::Auth {
            provider,
            list,
            delete,
        }) => manage_auth(provider, list, delete),
    }
}

/// List available models, marking the ones the config allows.
async fn list_models(provider_filter: Option<ProviderKind>, config: &ScribeConfig) -> Result<()> {
    let registry = registry();
    registry.initialize().await;

    let models: Vec<AvailableModel> = registry
        .available_models()
        .into_iter()
        .filter(|m| provider_filter.is_none_or(|kind| m.provider == kind))
        .collect();

    if models.is_empty() {
        if provider_filter.is_some() {
            println!("No models match the specified provider.");
        } else {
            println!("No providers configured.");
            println!();
            println!("Set ANTHROPIC_API_KEY, OPENAI_API_KEY or GEMINI_API_KEY,");
            println!("or store a key with: scribe models auth <provider>");
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Provider").fg(Color::Cyan),
        Cell::new("Model").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Enabled").fg(Color::Cyan),
        Cell::new("Description").fg(Color::Cyan),
    ]);

    for model in models {
        table.add_row(vec![
            Cell::new(model.provider.display_name()),
            Cell::new(&model.model),
            Cell::new(&model.display_name),
            Cell::new(enabled_label(&config.ocr, &model.model)),
            Cell::new(model.description.as_deref().unwrap_or("-")),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Manage API credentials for providers.
fn manage_auth(provider: Option<ProviderKind>, list: bool, delete: bool) -> Result<()> {
    let store = credential_store();

    if list {
        let providers = store.list_providers();
        if providers.is_empty() {
            println!("No API credentials configured.");
            println!();
            println!("Configure credentials with: scribe models auth <provider>");
        } else {
            println!("Configured providers:");
            println!();
            for provider in providers {
                let source = match store.credential_source(provider) {
                    Some(CredentialSource::Keyring) => "(keyring)",
                    Some(CredentialSource::Environment) => "(environment)",
                    None => "",
                };
                println!("  {} {}", provider, source);
            }
        }
        return Ok(());
    }

    let Some(provider) = provider else {
        bail!("Provider required. Use --list to see configured providers.");
    };

    if delete {
        match store.delete(provider) {
            Ok(()) => println!("Credentials for '{}' deleted.", provider),
            Err(scribe_models::Error::CredentialsNotFound(_)) => {
                println!("No credentials found for '{}'.", provider);
            }
            Err(e) => bail!("Failed to delete credentials: {}", e),
        }
        return Ok(());
    }

    println!(
        "Enter API key for {} (or set {})",
        provider.display_name(),
        provider.env_key()
    );

    let key = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API key")
        .interact()?;

    if key.trim().is_empty() {
        bail!("API key cannot be empty");
    }

    store.set(provider, &key)?;
    println!("Credentials for '{}' saved to keyring.", provider);

    Ok(())
}

/// Whether the config lets `--model` pick this model.
fn enabled_label(settings: &OcrSettings, model: &str) -> &'static str {
    if model == settings.default_model {
        "default"
    } else if settings.is_enabled(model) {
        "yes"
    } else {
        "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_label_marks_default() {
        let mut settings = OcrSettings::new("gpt-4o");
        settings.enable(["gemini-1.5-pro"]);

        assert_eq!(enabled_label(&settings, "gpt-4o"), "default");
        assert_eq!(enabled_label(&settings, "gemini-1.5-pro"), "yes");
        assert_eq!(enabled_label(&settings, "claude-3-opus-20240229"), "-");
    }

    #[test]
    fn provider_filter_parses_registry_keys() {
        use clap::Parser;

        #[derive(Parser)]
        struct Harness {
            #[command(subcommand)]
            command: ModelsCommands,
        }

        let parsed = Harness::try_parse_from(["models", "list", "--provider", "chatgpt"]).unwrap();
        assert!(matches!(
            parsed.command,
            ModelsCommands::List {
                provider: Some(ProviderKind::ChatGpt)
            }
        ));

        assert!(Harness::try_parse_from(["models", "list", "--provider", "ollama"]).is_err());
    }
}
