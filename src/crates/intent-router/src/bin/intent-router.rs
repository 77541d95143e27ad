//! intent-router CLI
//!
//! Composition root for the routing core: loads the configuration, builds
//! the selector and prints classification decisions as JSON.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use intent_router::config::{ConfigSource, FileConfigSource, CONFIG_PATH_ENV};
use intent_router::{
    ClassifyOptions, ConversationTurn, ReasoningOrchestrator, Role, RouteSelector,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "intent-router")]
#[command(about = "Keyword intent routing with cached classification", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Router configuration file
    #[arg(short, long, env = CONFIG_PATH_ENV, default_value = "config/router.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a message and print the decision
    Classify {
        /// Message to classify
        message: String,
        /// Prior conversation messages as role:content, oldest first
        #[arg(long = "context", value_name = "ROLE:CONTENT")]
        context: Vec<String>,
        /// Override the confidence threshold
        #[arg(long)]
        threshold: Option<f64>,
        /// Override the default route
        #[arg(long)]
        default_route: Option<String>,
    },

    /// List the active routes
    Routes,

    /// Validate the configuration file
    Check,
}

fn parse_turn(raw: &str) -> anyhow::Result<ConversationTurn> {
    let (role, content) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("context entry '{}' is not in role:content form", raw))?;
    let role: Role = role.parse().map_err(|e: String| anyhow!(e))?;
    Ok(ConversationTurn::new(role, content.trim()))
}

fn main() -> anyhow::Result<()> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(rust_log)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let source = Arc::new(FileConfigSource::new(&cli.config));

    match cli.command {
        Commands::Classify {
            message,
            context,
            threshold,
            default_route,
        } => {
            let context = context
                .iter()
                .map(|raw| parse_turn(raw))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let mut options = ClassifyOptions::new();
            options.confidence_threshold = threshold;
            options.default_route = default_route;

            let selector = Arc::new(RouteSelector::new(source));
            let orchestrator = ReasoningOrchestrator::from_selector(Arc::clone(&selector));

            let classification = selector.select_route(&message, &context, &options);
            let strategy = orchestrator.choose_strategy(&classification, &message);

            let output = json!({
                "classification": classification,
                "strategy": strategy,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Commands::Routes => {
            let selector = RouteSelector::new(source);
            let routes = selector.routes();
            println!("{}", serde_json::to_string_pretty(&routes)?);
            Ok(())
        }
        Commands::Check => match source.load() {
            Ok(config) => {
                println!(
                    "✓ {} is valid: {} routes, {} pattern groups",
                    cli.config.display(),
                    config.routes.len(),
                    config.pattern_groups.len()
                );
                Ok(())
            }
            Err(e) => {
                eprintln!(
                    "✗ {} is not usable, the router would start with the minimal configuration",
                    cli.config.display()
                );
                Err(e).with_context(|| format!("checking {}", cli.config.display()))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_turn() {
        let turn = parse_turn("user: plan my week").unwrap();
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "plan my week");

        let turn = parse_turn("assistant:a:b").unwrap();
        assert_eq!(turn.content, "a:b");

        assert!(parse_turn("no separator").is_err());
        assert!(parse_turn("robot: hi").is_err());
    }
}
