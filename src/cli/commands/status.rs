//! Status command - inspect a bundle directory's cache marker

use super::target::{absolutize, current_dir};
use crate::cache::{detect_manifest, is_cached, read_marker, CacheMarker, MARKER_FILE};
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::error::{BunchError, BunchResult};
use crate::ui::{self, UiContext};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Local state of a bundle directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum LocalState {
    /// Directory does not exist, download can populate it
    Absent,
    /// Files present without a marker
    Unmarked,
    /// Marker present
    Cached,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    path: PathBuf,
    state: LocalState,
    marker: Option<CacheMarker>,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, _config: &Config) -> BunchResult<()> {
    let cwd = current_dir()?;
    let path = match &args.path {
        Some(path) => absolutize(&cwd, path),
        None => {
            let found = detect_manifest(&cwd)
                .ok_or_else(|| BunchError::ManifestNotDetected(cwd.clone()))?;
            cwd.join(found.ecosystem.bundle_dir())
        }
    };

    let output = inspect(&path);
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => print_text(&UiContext::detect(), &output),
    }

    Ok(())
}

fn inspect(path: &Path) -> StatusOutput {
    let state = if is_cached(path) {
        LocalState::Cached
    } else if path.exists() {
        LocalState::Unmarked
    } else {
        LocalState::Absent
    };

    StatusOutput {
        path: path.to_path_buf(),
        state,
        marker: read_marker(path),
    }
}

fn print_text(ctx: &UiContext, output: &StatusOutput) {
    let path = output.path.display().to_string();
    match output.state {
        LocalState::Absent => {
            ui::step_info(ctx, &format!("{} does not exist", path));
            ui::remark(ctx, "Run: bunch download");
        }
        LocalState::Unmarked => {
            ui::step_warn_hint(
                ctx,
                &format!("{} is not a downloaded bundle", path),
                &format!("no {} marker", MARKER_FILE),
            );
        }
        LocalState::Cached => {
            ui::step_ok_detail(ctx, "Downloaded bundle", &path);
            match &output.marker {
                Some(marker) => {
                    ui::key_value(ctx, "key", &marker.key);
                    ui::key_value(ctx, "platform", &marker.platform);
                    ui::key_value(ctx, "source", &marker.source);
                    ui::key_value(ctx, "fetched", &marker.fetched_at.to_rfc3339());
                    ui::key_value(ctx, "version", &marker.version);
                }
                None => ui::remark(ctx, "Marker has no readable provenance"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn inspect_states() {
        let dir = TempDir::new().unwrap();
        let bundle = dir.path().join("node_modules");

        assert_eq!(inspect(&bundle).state, LocalState::Absent);

        fs::create_dir(&bundle).unwrap();
        assert_eq!(inspect(&bundle).state, LocalState::Unmarked);

        fs::write(bundle.join(MARKER_FILE), "not json").unwrap();
        let output = inspect(&bundle);
        assert_eq!(output.state, LocalState::Cached);
        assert!(output.marker.is_none());
    }
}
