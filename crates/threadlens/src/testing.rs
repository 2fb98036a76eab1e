//! Test fixtures shared across unit and integration tests
//!
//! HTML snapshots modeled on the mail client's conversation markup, plus a
//! canned analysis document that matches what a well-behaved model returns.

use crate::analysis::AnalysisResult;
use crate::analyzer::Settings;
use crate::extractor::NormalizedMessage;

/// URL of a conversation view carrying an explicit thread token.
pub const THREAD_URL: &str = "https://mail.google.com/mail/u/0/#thread-4a5b6c";

/// URL of an inbox listing, not a conversation.
pub const INBOX_URL: &str = "https://mail.google.com/mail/u/0/#inbox";

/// A two-message conversation. The second message carries a quoted reply and
/// a signature block that extraction must strip. The subject line carries a
/// legacy thread id attribute.
pub const THREAD_PAGE: &str = r#"<html><body>
<div role="main">
  <div class="nH">
    <h2 class="hP" data-legacy-thread-id="18d2fa4e9b7c3a01">Release plan for Friday</h2>
    <div class="adn ads" data-message-id="msg-a1">
      <div class="gE iv gt">
        <span class="go"><span class="gD" name="Alice Anders" email="alice@example.com">Alice Anders</span></span>
        <span class="gH"><span class="g3" title="Mon, Mar 4, 2024, 9:15 AM">9:15 AM</span></span>
      </div>
      <div class="ii gt">
        <div class="a3s aiL" dir="ltr">
          Hi team, can we ship the release on Friday?
          QA signed off this morning.
        </div>
      </div>
    </div>
    <div class="adn ads" data-message-id="msg-a2">
      <div class="gE iv gt">
        <span class="go"><span class="gD" name="Bob Birch" email="bob@example.com">Bob Birch</span></span>
        <span class="gH"><span class="g3" title="Mon, Mar 4, 2024, 10:02 AM">10:02 AM</span></span>
      </div>
      <div class="ii gt">
        <div class="a3s aiL" dir="ltr">
          Agreed, Friday works.
          I'll update the deployment doc by Thursday.
          <div class="gmail_signature" data-smartmail="gmail_signature">--<br>Bob Birch<br>Release Engineering</div>
          <div class="gmail_quote">On Mon, Mar 4, 2024 Alice Anders wrote:<blockquote>Hi team, can we ship the release on Friday?</blockquote></div>
        </div>
      </div>
    </div>
  </div>
</div>
</body></html>"#;

/// A conversation view with no thread id attribute anywhere, forcing the
/// identity chain down to its URL-hash fallback.
pub const UNMARKED_THREAD_PAGE: &str = r#"<html><body>
<div role="main">
  <div class="adn ads">
    <div class="gE iv gt">
      <span class="go"><span class="gD" name="Carol Chen" email="carol@example.com">Carol Chen</span></span>
      <span class="gH"><span class="g3" title="Tue, Mar 5, 2024, 8:30 AM">8:30 AM</span></span>
    </div>
    <div class="ii gt">
      <div class="a3s" dir="ltr">Standup is moving to 9:30 tomorrow, please update your calendars.</div>
    </div>
  </div>
</div>
</body></html>"#;

/// Two message containers where the first body is below the content floor
/// and the second has no sender or timestamp markup at all.
pub const SHORT_BODY_PAGE: &str = r#"<html><body>
<div role="main">
  <div class="adn ads">
    <div class="gE iv gt">
      <span class="go"><span class="gD" name="Dave Diaz" email="dave@example.com">Dave Diaz</span></span>
    </div>
    <div class="ii gt"><div class="a3s" dir="ltr">Thanks!</div></div>
  </div>
  <div class="adn ads">
    <div class="ii gt"><div class="a3s" dir="ltr">Looping in the infra team so they can prepare the rollout window.</div></div>
  </div>
</div>
</body></html>"#;

/// An inbox listing: thread rows, no message containers, no thread ids.
pub const INBOX_PAGE: &str = r#"<html><body>
<div role="main">
  <table class="F cf zt"><tbody>
    <tr role="listitem" class="zA zE">
      <td class="yX xY"><span class="yW">Alice Anders</span></td>
      <td class="xY a4W"><span class="bog">Release plan for Friday</span></td>
    </tr>
    <tr role="listitem" class="zA yO">
      <td class="yX xY"><span class="yW">Build Bot</span></td>
      <td class="xY a4W"><span class="bog">Nightly build passed</span></td>
    </tr>
  </tbody></table>
</div>
</body></html>"#;

/// The analysis document a well-behaved model produces for [`THREAD_PAGE`].
pub fn sample_analysis_json() -> serde_json::Value {
    serde_json::json!({
        "summary": "Release planning for the Friday ship",
        "outcomes": [
            {
                "description": "The team agreed to ship the release on Friday",
                "context": "QA signed off on the release candidate"
            }
        ],
        "actionItems": [
            {
                "task": "Update the deployment doc",
                "assignee": "Bob",
                "dueDate": "Thursday",
                "priority": "high",
                "status": "in-progress"
            }
        ],
        "openQuestions": [
            {
                "question": "Does the infra team need a rollout window?",
                "context": "Not yet confirmed in the thread",
                "urgency": "medium"
            }
        ],
        "keyTopics": [
            {
                "topic": "Release",
                "description": "Friday release timing and readiness"
            }
        ]
    })
}

/// [`sample_analysis_json`] parsed into the typed document.
pub fn sample_analysis() -> AnalysisResult {
    serde_json::from_value(sample_analysis_json()).expect("fixture analysis parses")
}

/// The two-message input used by end-to-end orchestration tests.
pub fn sample_messages() -> Vec<NormalizedMessage> {
    vec![
        NormalizedMessage {
            sender: "a@x.com".to_string(),
            timestamp: "t1".to_string(),
            body: "Let's ship Friday.".to_string(),
            index: 0,
        },
        NormalizedMessage {
            sender: "b@x.com".to_string(),
            timestamp: "t2".to_string(),
            body: "Agreed, I'll update the doc by Thursday.".to_string(),
            index: 1,
        },
    ]
}

/// Request settings with the given provider name and key.
pub fn settings(provider: &str, api_key: &str) -> Settings {
    Settings {
        ai_provider: provider.to_string(),
        api_key: api_key.to_string(),
        selected_model: None,
    }
}
