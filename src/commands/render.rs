use anyhow::Result;
use tracing::info;

use crate::cli::RenderArgs;
use crate::render::render_markdown;
use crate::report::load_report;
use crate::util::write_text;

pub fn run(args: RenderArgs) -> Result<()> {
    let report = load_report(&args.report)?;

    let output = args
        .output
        .unwrap_or_else(|| args.report.with_extension("md"));
    write_text(&output, &render_markdown(&report))?;

    info!(
        path = %output.display(),
        findings = report.statistics.total_requirements,
        run = report.metadata.run,
        "wrote report markdown"
    );

    Ok(())
}
