//! Summarize command handler.

use hookwise::config::HookwiseConfig;
use hookwise::services::{SummaryRenderer, Transcript, reconstruct};
use std::path::Path;
use std::process::ExitCode;

/// Summarize command.
///
/// Renders a transcript's summary to stdout. Nothing is written to disk.
pub fn cmd_summarize(
    config: &HookwiseConfig,
    transcript: &Path,
    json: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let transcript = Transcript::read(transcript)?;
    let timeline = reconstruct(&transcript.events())?;

    let renderer = SummaryRenderer::new().with_limits(config.summary);
    let summary = renderer
        .render_now(&timeline)
        .with_message_count(transcript.message_count());

    if json {
        println!("{}", renderer.record(&summary)?);
    } else {
        println!("{}", renderer.report(&summary));
    }
    Ok(ExitCode::SUCCESS)
}
