//! CLI command implementations.

pub mod build;
pub mod clean;
pub mod doctor;
pub mod init;
pub mod platforms;
pub mod regenerate;
pub mod release;
pub mod stamp;
pub mod validate;

use anyhow::{Context, Result};
use fmudist_pipeline::PipelineConfig;
use fmudist_platform::FmiVariant;

/// Parse variant arguments; an empty list means every configured variant.
pub(crate) fn parse_variants(args: &[String], configured: &[FmiVariant]) -> Result<Vec<FmiVariant>> {
    if args.is_empty() {
        return Ok(configured.to_vec());
    }
    args.iter()
        .map(|arg| {
            arg.parse::<FmiVariant>()
                .with_context(|| format!("parsing --variant {arg}"))
        })
        .collect()
}

/// Restrict `config` to the variants named on the command line.
pub(crate) fn select_variants(config: &mut PipelineConfig, args: &[String]) -> Result<()> {
    config.variants = parse_variants(args, &config.variants)?;
    Ok(())
}
