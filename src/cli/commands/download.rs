//! Download command - fetch and unpack cached dependencies

use super::target::{blocking, BundleTarget};
use crate::archive::TarGz;
use crate::audit::{AuditLog, ARTIFACT_FETCHED};
use crate::cache::Locator;
use crate::cli::args::DownloadArgs;
use crate::config::{expand_path, Config, StoreOverrides, StoreSettings};
use crate::error::BunchResult;
use crate::orchestrator::{FetchRequest, Orchestrator};
use crate::store::S3Store;
use crate::ui::{self, PhaseProgress, UiContext};
use indicatif::HumanBytes;

/// Execute the download command
///
/// A cache miss surfaces as `ArtifactNotFound`, which `main` maps to exit
/// code 2.
pub async fn execute(args: DownloadArgs, config: &Config) -> BunchResult<()> {
    let ctx = UiContext::detect();
    let target = BundleTarget::resolve(&args.bundle, config)?;
    let settings = StoreSettings::resolve(&StoreOverrides::from(&args.store), &config.store)?;

    let request = FetchRequest {
        prefix: target.prefix,
        manifest_path: target.manifest,
        local_path: target.path.clone(),
        bucket: settings.bucket.clone(),
        platform: target.platform,
    };
    let staging_dir = config.cache.staging_dir.as_deref().map(expand_path);
    let progress = PhaseProgress::new(&ctx, "Downloading");

    let report = blocking("download", move || {
        let store = S3Store::new(settings.credentials, settings.region);
        let archiver = TarGz::default();
        let result = Orchestrator::new(&store, &archiver, Locator::new(&settings.endpoint))
            .with_staging_dir(staging_dir)
            .with_reporter(&progress)
            .fetch(&request);
        progress.finish();
        result
    })
    .await?;

    AuditLog::new(config).record(ARTIFACT_FETCHED, &report).await;

    ui::step_ok_detail(
        &ctx,
        &format!("Downloaded {}", report.location.object_name),
        &HumanBytes(report.bytes).to_string(),
    );
    ui::remark(&ctx, &format!("Unpacked into {}", target.path.display()));

    Ok(())
}
