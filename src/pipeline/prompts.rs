//! Reasoning-service prompts.

/// System prompt for the first search query of a run.
pub fn query_writer_instructions(topic: &str) -> String {
    format!(
        r#"Your goal is to write one targeted web search query that gathers information about a topic.

<TOPIC>
{topic}
</TOPIC>

<FORMAT>
Respond with a JSON object containing exactly these keys:
   - "query": the search query string
   - "aspect": the aspect of the topic the query focuses on
   - "rationale": a short explanation of why the query is relevant
</FORMAT>

<EXAMPLE>
{{
    "query": "transformer attention mechanism explained",
    "aspect": "model architecture",
    "rationale": "Attention is the core building block of transformer models"
}}
</EXAMPLE>

Respond in JSON:"#
    )
}

/// User message accompanying [`query_writer_instructions`].
pub const QUERY_WRITER_REQUEST: &str = "Generate a query for web search:";

/// System prompt for the summarization step.
pub const SUMMARIZER_INSTRUCTIONS: &str = r#"<GOAL>
Write a concise, high-quality summary organized into exactly four sections:
  1. **Background** (definitions and context from the encyclopedia)
  2. **Academic Findings** (insights from research abstracts)
  3. **Industry Examples** (practical takeaways from web search and videos)
  4. **Recommendations** (actionable next steps)
</GOAL>

<REQUIREMENTS>
When writing a NEW summary:
1. Keep the information most relevant to the user input.
2. Keep the flow coherent.
3. Use the exact headings **Background**, **Academic Findings**, **Industry Examples**, **Recommendations**.

When EXTENDING an existing summary:
1. Read the existing summary and the new material.
2. Merge new information related to existing points into the matching paragraph.
3. Add genuinely new, relevant information as a new paragraph with a smooth transition.
4. Skip anything unrelated to the user input.
5. Make sure the result differs from the existing summary.
</REQUIREMENTS>

<FORMATTING>
Start directly with the summary, without preamble or title. Do not use XML tags in the output.
</FORMATTING>

<TASK>
Consider the provided context carefully, then summarize it to address the user input.
</TASK>"#;

/// Labelled context blocks for one summarization call.
pub struct SummaryContext<'a> {
    pub topic: &'a str,
    pub memory: &'a [String],
    pub existing_summary: &'a str,
    pub encyclopedia: &'a str,
    pub academic: &'a str,
    pub web: &'a str,
    pub video: &'a str,
}

impl SummaryContext<'_> {
    pub fn render(&self) -> String {
        let sections = [
            ("User Input", self.topic.to_string()),
            ("Memory", self.memory.join("\n")),
            ("Existing Summary", self.existing_summary.to_string()),
            ("Background (Wikipedia)", self.encyclopedia.to_string()),
            ("Academic Findings (arXiv)", self.academic.to_string()),
            ("Industry Examples (Web)", self.web.to_string()),
            ("Industry Examples (YouTube)", self.video.to_string()),
        ];

        sections
            .iter()
            .map(|(label, body)| format!("<{label}>\n{body}\n</{label}>"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// System prompt for the reflection step.
pub fn reflection_instructions(topic: &str) -> String {
    format!(
        r#"You are an expert research assistant reviewing a summary about {topic}.

<GOAL>
1. Find knowledge gaps or areas that deserve deeper exploration.
2. Write one follow-up question that would expand the summary.
3. Prefer technical details, implementation specifics, or emerging trends the summary does not cover.
</GOAL>

<REQUIREMENTS>
The follow-up question must be self-contained and carry the context a web search needs.
</REQUIREMENTS>

<FORMAT>
Respond with a JSON object containing exactly these keys:
- knowledge_gap: what information is missing or unclear
- follow_up_query: a specific question that addresses the gap
</FORMAT>

<EXAMPLE>
{{
    "knowledge_gap": "The summary does not mention benchmarks",
    "follow_up_query": "Which benchmarks are used to evaluate [specific technology]?"
}}
</EXAMPLE>

Respond in JSON:"#
    )
}

/// User message for the reflection step.
pub fn reflection_request(summary: &str) -> String {
    format!(
        "Identify a knowledge gap and write a follow-up web search query based on what we know so far: {}",
        summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_embed_topic() {
        assert!(query_writer_instructions("quantum computing").contains("<TOPIC>\nquantum computing\n</TOPIC>"));
        assert!(reflection_instructions("quantum computing").contains("summary about quantum computing."));
        assert!(query_writer_instructions("x").contains("\"query\": \"transformer"));
    }

    #[test]
    fn test_summary_context_renders_labelled_blocks_in_order() {
        let memory = vec!["m1".to_string(), "m2".to_string()];
        let context = SummaryContext {
            topic: "rust",
            memory: &memory,
            existing_summary: "",
            encyclopedia: "wiki",
            academic: "arxiv",
            web: "web",
            video: "yt",
        };
        let rendered = context.render();

        assert!(rendered.starts_with("<User Input>\nrust\n</User Input>"));
        assert!(rendered.contains("<Memory>\nm1\nm2\n</Memory>"));
        assert!(rendered.contains("<Existing Summary>\n\n</Existing Summary>"));
        let wiki = rendered.find("Background (Wikipedia)").unwrap();
        let yt = rendered.find("Industry Examples (YouTube)").unwrap();
        assert!(wiki < yt);
    }
}
