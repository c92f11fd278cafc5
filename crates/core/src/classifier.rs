use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const FALLBACK_REPLY: &str = "Apologies sir, I couldn't process that request.";

/// What the classifier made of an unrecognized utterance.
///
/// `command` carries a phrase from the fixed trigger vocabulary when the
/// model decided the user meant an action; `reply` is always spoken either
/// way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub command: Option<String>,
    pub reply: String,
}

impl Intent {
    /// The conversational fallback used whenever classification fails.
    pub fn fallback() -> Self {
        Self {
            command: None,
            reply: FALLBACK_REPLY.to_string(),
        }
    }
}

/// Last-resort intent mapping for utterances neither the pattern parser nor
/// the keyword table recognized. Infallible by contract: implementations
/// swallow their own errors and answer with `Intent::fallback()`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, utterance: &str) -> Intent;
}

/// Gemini-backed classifier.
///
/// One generateContent call per utterance, no conversation history. The
/// model is asked for a strict JSON object; anything it wraps around that
/// object (markdown fences, prose) is stripped before parsing.
pub struct GeminiClassifier {
    client: reqwest::Client,
    api_key: String,
    model: String,
    system_prompt: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct IntentWire {
    has_command: bool,
    #[serde(default)]
    command: Option<String>,
    speak_response: String,
}

impl GeminiClassifier {
    pub fn new(api_key: String, model: String, triggers: &[&str]) -> Self {
        let vocabulary = triggers.join(", ");
        let system_prompt = format!(
            "You are Vesper, a concise voice assistant. The user said something \
             that matched none of the assistant's built-in commands. Decide \
             whether they meant one of these trigger phrases:\n{vocabulary}\n\n\
             Respond with ONLY a JSON object, no markdown, of the form \
             {{\"has_command\": bool, \"command\": string or null, \
             \"speak_response\": string}}. \
             If they meant a trigger, set has_command true and command to that \
             exact phrase, and write a short confirmation in speak_response. \
             Otherwise set has_command false, command null, and answer them \
             conversationally in one or two sentences, addressing the user as sir."
        );
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            system_prompt,
        }
    }

    async fn request(&self, utterance: &str) -> anyhow::Result<Intent> {
        let url = format!(
            "{GEMINI_ENDPOINT}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{
                "parts": [{
                    "text": format!("{}\n\nUser said: {utterance}", self.system_prompt)
                }]
            }]
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("gemini returned {status}");
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| anyhow::anyhow!("gemini response had no candidate text"))?;

        extract_intent(text).ok_or_else(|| anyhow::anyhow!("unparseable intent payload"))
    }
}

#[async_trait]
impl IntentClassifier for GeminiClassifier {
    async fn classify(&self, utterance: &str) -> Intent {
        match self.request(utterance).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!(error = %e, "intent classification failed");
                Intent::fallback()
            }
        }
    }
}

/// Pull the intent object out of a model reply, tolerating markdown fences
/// and stray prose around the JSON.
fn extract_intent(text: &str) -> Option<Intent> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    let wire: IntentWire = serde_json::from_str(&text[start..=end]).ok()?;

    let command = if wire.has_command {
        wire.command
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
    } else {
        None
    };
    Some(Intent {
        command,
        reply: wire.speak_response,
    })
}
