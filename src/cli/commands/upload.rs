//! Upload command - pack and publish the installed dependencies

use super::target::{blocking, BundleTarget};
use crate::archive::TarGz;
use crate::audit::{AuditLog, ARTIFACT_PUBLISHED};
use crate::cache::Locator;
use crate::cli::args::UploadArgs;
use crate::config::{expand_path, Config, StoreOverrides, StoreSettings};
use crate::error::BunchResult;
use crate::orchestrator::{Orchestrator, PublishRequest};
use crate::store::S3Store;
use crate::ui::{self, PhaseProgress, UiContext};
use indicatif::HumanBytes;

/// Execute the upload command
pub async fn execute(args: UploadArgs, config: &Config) -> BunchResult<()> {
    let ctx = UiContext::detect();
    let target = BundleTarget::resolve(&args.bundle, config)?;
    let settings = StoreSettings::resolve(&StoreOverrides::from(&args.store), &config.store)?;

    let request = PublishRequest {
        prefix: target.prefix,
        path: target.path,
        manifest_path: target.manifest,
        bucket: settings.bucket.clone(),
        platform: target.platform,
        force: args.force,
    };
    let staging_dir = config.cache.staging_dir.as_deref().map(expand_path);
    let progress = PhaseProgress::new(&ctx, "Uploading");

    let report = blocking("upload", move || {
        let store = S3Store::new(settings.credentials, settings.region);
        let archiver = TarGz::default();
        let result = Orchestrator::new(&store, &archiver, Locator::new(&settings.endpoint))
            .with_staging_dir(staging_dir)
            .with_reporter(&progress)
            .publish(&request);
        progress.finish();
        result
    })
    .await?;

    AuditLog::new(config).record(ARTIFACT_PUBLISHED, &report).await;

    ui::step_ok_detail(
        &ctx,
        &format!("Uploaded {}", report.location.object_name),
        &HumanBytes(report.bytes).to_string(),
    );
    ui::remark(&ctx, &report.location.remote_url);

    Ok(())
}
