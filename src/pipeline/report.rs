use super::state::StepTimings;
use crate::types::CitationEntry;

/// Render the final Markdown report.
///
/// ```text
/// # Research Topic: {topic}
///
/// ## Summary
///
/// {summary}
///
/// ### Sources:
/// * {title} : {url}
///
/// ### Timings (s)
/// * {step}: {seconds:.2}s
/// ```
pub fn render_report(
    topic: &str,
    summary: &str,
    citations: &[CitationEntry],
    timings: &StepTimings,
) -> String {
    let sources = citations
        .iter()
        .map(|c| format!("* {} : {}", c.title, c.url))
        .collect::<Vec<_>>()
        .join("\n");

    let mut report = format!(
        "# Research Topic: {}\n\n## Summary\n\n{}\n\n### Sources:\n{}",
        topic, summary, sources
    );

    if !timings.is_empty() {
        let lines = timings
            .iter()
            .map(|t| format!("* {}: {:.2}s", t.step, t.seconds))
            .collect::<Vec<_>>()
            .join("\n");
        report.push_str("\n\n### Timings (s)\n");
        report.push_str(&lines);
    }

    report
}
