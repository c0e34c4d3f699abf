//! `fmudist platforms`: the declared platform order.

use std::fmt::Write;

use fmudist_pipeline::PipelineConfig;
use fmudist_platform::FmiVariant;

/// Print each declared platform with the binary partition it contributes per variant.
pub fn run(config: &PipelineConfig) {
    print!("{}", render(config));
}

fn render(config: &PipelineConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Platforms ===");
    for (index, platform) in config.platforms.as_slice().iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}. {platform}", index + 1);
        for variant in FmiVariant::ALL {
            let status = match platform.binary_partition(variant) {
                Some(partition) if config.variants.contains(&variant) => {
                    format!("binaries/{partition}")
                }
                Some(partition) => format!("binaries/{partition} (not configured)"),
                None => "-".to_string(),
            };
            let _ = writeln!(out, "  {:<7} {status}", variant.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmudist_platform::parse_platform_list;

    #[test]
    fn lists_partitions_in_declared_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::new(dir.path());
        config.platforms = parse_platform_list(&["x86_64-linux", "aarch64-darwin"]).unwrap();
        config.variants = vec![FmiVariant::Fmi3];

        let out = render(&config);
        let linux = out.find("1. x86_64-linux").unwrap();
        let darwin = out.find("2. aarch64-darwin").unwrap();
        assert!(linux < darwin);
        assert!(out.contains("binaries/linux64 (not configured)"));
        assert!(out.contains("binaries/aarch64-darwin\n"));
    }
}
