//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::BunchResult;
use crate::ui::{self, UiContext};

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager, config: &Config) -> BunchResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => {
            let ctx = UiContext::detect().with_auto_yes(force);
            init_config(&ctx, manager).await?
        }
    }

    Ok(())
}

/// Print the effective configuration with secrets masked
fn show_config(config: &Config) -> BunchResult<()> {
    let mut shown = config.clone();
    for secret in [&mut shown.store.access_key, &mut shown.store.secret_key] {
        if secret.is_some() {
            *secret = Some("********".to_string());
        }
    }
    println!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}

async fn init_config(ctx: &UiContext, manager: &ConfigManager) -> BunchResult<()> {
    let path = manager.path();

    if path.exists() {
        let message = format!("Overwrite {}?", path.display());
        if !ui::confirm(ctx, &message, false).await? {
            ui::step_warn_hint(
                ctx,
                &format!("Config already exists at {}", path.display()),
                "Use --force to overwrite",
            );
            return Ok(());
        }
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(ctx, "Configuration initialized", &path.display().to_string());

    Ok(())
}
