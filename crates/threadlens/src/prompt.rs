//! Prompts for thread analysis
//!
//! The analysis prompt carries the full output schema inline: it names every
//! field and its permitted values and tells the model to answer with only
//! the JSON. That prompt is the sole mechanism keeping model output in the
//! shape [`crate::analysis::AnalysisResult`] expects.

use crate::extractor::NormalizedMessage;

/// System message sent alongside the analysis prompt where the provider
/// supports a system role.
pub const SYSTEM_PROMPT: &str = "You are an expert email analyst. Analyze email threads and extract structured information about outcomes, decisions, action items, and open questions.";

/// Analysis prompt template
///
/// Placeholder: {thread} - the rendered message blocks
pub const ANALYSIS_PROMPT: &str = r#"Please analyze the following email thread and extract key information in a structured format. Focus on:

1. **Outcomes & Decisions**: Any conclusions reached, decisions made, or results achieved
2. **Action Items**: Tasks assigned with assignee and due date (if mentioned)
3. **Open Questions**: Unresolved questions or issues that need follow-up
4. **Key Topics**: Main subjects discussed in the thread

Please format your response as JSON with the following structure:
{
  "summary": "Brief summary of the thread",
  "outcomes": [
    {
      "description": "Description of outcome/decision",
      "context": "Relevant context or reasoning"
    }
  ],
  "actionItems": [
    {
      "task": "Description of the task",
      "assignee": "Person assigned (if mentioned)",
      "dueDate": "Due date (if mentioned)",
      "priority": "high|medium|low",
      "status": "pending|in-progress|completed"
    }
  ],
  "openQuestions": [
    {
      "question": "The unresolved question",
      "context": "Context or background",
      "urgency": "high|medium|low"
    }
  ],
  "keyTopics": [
    {
      "topic": "Topic name",
      "description": "Brief description of what was discussed"
    }
  ]
}

Email Thread:
{thread}

Please provide only the JSON response without any additional text or formatting."#;

/// Render the messages into the analysis prompt.
///
/// Pure and deterministic: the same message sequence always produces the
/// same string, with message order preserved.
pub fn build_analysis_prompt(messages: &[NormalizedMessage]) -> String {
    let thread_text: String = messages
        .iter()
        .map(|message| {
            format!(
                "From: {}\nTime: {}\n\n{}\n\n---\n\n",
                message.sender, message.timestamp, message.body
            )
        })
        .collect();

    ANALYSIS_PROMPT.replace("{thread}", &thread_text)
}
