//! Key command - show how a lockfile maps to a remote artifact

use super::target::BundleTarget;
use crate::cache::{ArtifactKey, Locator, Manifest};
use crate::cli::args::{KeyArgs, OutputFormat};
use crate::config::Config;
use crate::error::BunchResult;
use console::style;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct KeyOutput {
    manifest: PathBuf,
    fingerprint: String,
    key: String,
    object_name: String,
    url: Option<String>,
}

/// Execute the key command
///
/// Reads nothing but the manifest. The URL is only shown when a bucket is
/// known.
pub async fn execute(args: KeyArgs, config: &Config) -> BunchResult<()> {
    let target = BundleTarget::resolve(&args.bundle, config)?;
    let manifest = Manifest::read(&target.manifest)?;
    let fingerprint = manifest.fingerprint()?;
    let key = ArtifactKey::new(&target.prefix, &fingerprint, &target.platform)?;

    let bucket = args.s3_bucket.or_else(|| config.store.bucket.clone());
    let url = match bucket.as_deref().filter(|b| !b.is_empty()) {
        Some(bucket) => Some(
            Locator::new(&config.store.endpoint)
                .locate(&target.prefix, &fingerprint, &target.platform, bucket)?
                .remote_url,
        ),
        None => None,
    };

    let output = KeyOutput {
        manifest: manifest.path,
        fingerprint: fingerprint.to_string(),
        object_name: key.object_name(),
        key: key.to_string(),
        url,
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => print_text(&output),
    }

    Ok(())
}

fn print_text(output: &KeyOutput) {
    let row = |label: &str, value: &str| {
        println!("{:<12} {}", style(format!("{}:", label)).dim(), value);
    };

    row("manifest", &output.manifest.display().to_string());
    row("fingerprint", &output.fingerprint);
    row("key", &output.key);
    row("object", &output.object_name);
    if let Some(url) = &output.url {
        row("url", url);
    }
}
