use std::time::Duration;

use clap::Parser;
use site_editor::cli::commands::{
    cmd_admin, cmd_catalog_list, cmd_catalog_validate, cmd_edit, cmd_overrides_reset,
    cmd_overrides_show, cmd_render, cmd_watch,
};
use site_editor::cli::config::{
    CatalogAction, Cli, Commands, OverridesAction, load_config, merge_cli,
};
use tracing::Level;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // CLI > config > defaults
    let config = merge_cli(load_config(cli.config.as_deref()), &cli);

    match cli.command {
        Commands::Render { output, filter } => {
            cmd_render(&config, output.as_deref(), filter.as_deref())?;
        }
        Commands::Edit { script, output } => {
            let all_passed = cmd_edit(&config, &script, output.as_deref())?;
            if !all_passed {
                std::process::exit(1);
            }
        }
        Commands::Overrides { action } => match action {
            OverridesAction::Show => cmd_overrides_show(&config)?,
            OverridesAction::Reset => cmd_overrides_reset(&config)?,
        },
        Commands::Catalog { action } => match action {
            CatalogAction::List { filter } => cmd_catalog_list(&config, &filter)?,
            CatalogAction::Validate => {
                if !cmd_catalog_validate(&config)? {
                    std::process::exit(1);
                }
            }
        },
        Commands::Watch {
            output,
            interval,
            max_polls,
        } => {
            cmd_watch(&config, &output, Duration::from_secs(interval), max_polls)?;
        }
        Commands::Admin {
            email,
            password,
            action,
        } => cmd_admin(&config, &email, &password, &action)?,
    }

    Ok(())
}
