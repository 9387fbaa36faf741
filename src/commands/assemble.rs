use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::AssembleArgs;
use crate::fragment;
use crate::render::render_markdown;
use crate::report::{AssembleRequest, assemble_report};
use crate::util::{write_json_pretty, write_text};

pub fn run(args: AssembleArgs) -> Result<()> {
    if !args.fragments_dir.is_dir() {
        bail!(
            "fragments directory not found: {}",
            args.fragments_dir.display()
        );
    }

    let fragment_paths = fragment::discover_fragments(&args.fragments_dir)?;
    if fragment_paths.is_empty() {
        bail!("no .json files found in {}", args.fragments_dir.display());
    }

    let mut warnings = Vec::new();
    let result = assemble_report(
        &AssembleRequest {
            fragments_dir: &args.fragments_dir,
            project_name: &args.project_name,
            spec_path: &args.spec_path,
            impl_path: &args.impl_path,
            previous_report_path: args.previous.as_deref(),
            spec_version: &args.spec_version,
            date: None,
        },
        &mut warnings,
    );

    // Warnings from fragments that loaded are logged even when a later
    // fragment aborts the batch.
    for warning in &warnings {
        warn!(source = %warning.source_name, "{}", warning.message);
    }
    let report = result?;

    write_json_pretty(&args.output, &report)?;
    let markdown_path = args.output.with_extension("md");
    write_text(&markdown_path, &render_markdown(&report))?;

    info!(path = %args.output.display(), "wrote report json");
    info!(path = %markdown_path.display(), "wrote report markdown");
    info!(
        fragments = fragment_paths.len(),
        findings = report.statistics.total_requirements,
        implementation_rate = report.statistics.implementation_rate,
        test_rate = report.statistics.test_rate,
        "report assembled"
    );

    Ok(())
}
