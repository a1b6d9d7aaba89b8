//! Match-rationale generation: an LLM-backed path when a provider is
//! configured, and a deterministic template fallback that works offline.
//! The fallback is the contract; the LLM only ever improves on it.

use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::api::{AskAnswer, AskSource, MatchExplanation};
use crate::db::{CourseRecord, UserRecord};
use crate::matching::{ScoredCandidate, normalize_skills};

/// Participates in the explanation cache key. Bump when the prompt or
/// the explanation shape changes, so stale cache entries age out.
pub const PROMPT_VERSION: &str = "v1";

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("llm request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("llm response unusable: {0}")]
    BadResponse(String),
}

#[derive(Debug, Clone)]
pub struct AiRuntimeConfig {
    pub enabled: bool,
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for AiRuntimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            base_url: "https://api.openai.com/v1/chat/completions".into(),
            api_key: String::new(),
            timeout_secs: 20,
        }
    }
}

impl AiRuntimeConfig {
    pub fn from_env() -> Self {
        fn provider_defaults(provider: &str) -> (String, String) {
            match provider.to_ascii_lowercase().as_str() {
                "deepseek" => (
                    "deepseek-chat".into(),
                    "https://api.deepseek.com/chat/completions".into(),
                ),
                "mistral" => (
                    "mistral-small-latest".into(),
                    "https://api.mistral.ai/v1/chat/completions".into(),
                ),
                _ => (
                    "gpt-4o-mini".into(),
                    "https://api.openai.com/v1/chat/completions".into(),
                ),
            }
        }

        fn provider_api_key(provider: &str) -> Option<String> {
            match provider.to_ascii_lowercase().as_str() {
                "deepseek" => std::env::var("DEEPSEEK_API_KEY").ok(),
                "mistral" => std::env::var("MISTRAL_API_KEY").ok(),
                _ => std::env::var("OPENAI_API_KEY").ok(),
            }
        }

        fn parse_bool(key: &str, default: bool) -> bool {
            match std::env::var(key) {
                Ok(val) => matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
                Err(_) => default,
            }
        }

        fn parse_u64(key: &str, default: u64) -> u64 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse::<u64>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(default)
        }

        let provider = std::env::var("PM_AI_PROVIDER").unwrap_or_else(|_| "openai".into());
        let (default_model, default_base_url) = provider_defaults(&provider);

        let api_key = std::env::var("PM_AI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| provider_api_key(&provider))
            .unwrap_or_default();

        Self {
            enabled: parse_bool("PM_AI_ENABLED", true),
            provider,
            model: std::env::var("PM_AI_MODEL").unwrap_or(default_model),
            base_url: std::env::var("PM_AI_BASE_URL").unwrap_or(default_base_url),
            api_key,
            timeout_secs: parse_u64("PM_AI_TIMEOUT_SECONDS", 20),
        }
    }

    /// The LLM path is only taken when enabled and a key resolved.
    pub fn configured(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }
}

/// Deterministic explanation built from the ranker's output for the
/// pair. Produces the same shape as the LLM path, without any network.
pub fn template_explanation(
    viewer: &UserRecord,
    candidate: &UserRecord,
    scored: &ScoredCandidate,
    course_title: &str,
) -> MatchExplanation {
    let headline = match scored.reasons.first() {
        Some(reason) => format!("{}: {reason}", candidate.display_name),
        None => format!("{} could round out your pod", candidate.display_name),
    };

    let mut risks = Vec::new();
    if scored.breakdown.availability <= 0.0 {
        risks.push("no overlapping availability on record".to_string());
    }
    if scored.breakdown.activity <= 3.0 {
        risks.push("hasn't been active in the course recently".to_string());
    }
    if scored.breakdown.diversity_penalty < 0.0 {
        risks.push("your profiles cover very similar ground".to_string());
    }

    let shared_skills = normalize_skills(&viewer.skills);
    let candidate_skills = normalize_skills(&candidate.skills);
    let icebreaker = if let Some(skill) = shared_skills.intersection(&candidate_skills).next() {
        format!("Ask how they've used {skill} in past projects")
    } else if let Some(slot) = viewer
        .availability
        .iter()
        .find(|slot| candidate.availability.contains(slot))
    {
        format!("Suggest a first sync on {slot}")
    } else {
        "Ask what they want to get out of the course project".to_string()
    };

    MatchExplanation {
        headline,
        reasons: scored.reasons.clone(),
        risks,
        icebreaker,
        pod_idea: format!("Scope a small {course_title} project you can demo in two weeks"),
        prompt_version: PROMPT_VERSION.to_string(),
    }
    .clamped()
}

/// Generate an explanation for the pair. Falls back to the template on
/// any LLM failure; callers never see an error from this path.
pub async fn generate_explanation(
    config: &AiRuntimeConfig,
    viewer: &UserRecord,
    candidate: &UserRecord,
    scored: &ScoredCandidate,
    course_title: &str,
) -> MatchExplanation {
    let fallback = template_explanation(viewer, candidate, scored, course_title);
    if !config.configured() {
        return fallback;
    }

    let system = "You write one-paragraph study-group match rationales. \
                  Respond with JSON: {\"headline\", \"reasons\" (max 3), \
                  \"risks\" (max 2), \"icebreaker\", \"podIdea\"}.";
    let user = json!({
        "course": course_title,
        "viewer": { "displayName": viewer.display_name, "rolePrefs": viewer.role_prefs, "skills": viewer.skills },
        "candidate": { "displayName": candidate.display_name, "rolePrefs": candidate.role_prefs, "skills": candidate.skills },
        "rankerReasons": scored.reasons,
        "scoreBreakdown": scored.breakdown,
    });

    match chat_completion(config, system, &user.to_string()).await {
        Ok(content) => match serde_json::from_str::<MatchExplanation>(&content) {
            Ok(mut explanation) => {
                explanation.prompt_version = PROMPT_VERSION.to_string();
                explanation.clamped()
            }
            Err(err) => {
                warn!(error = %err, "llm explanation was not valid JSON; using template");
                fallback
            }
        },
        Err(err) => {
            warn!(error = %err, "llm explanation call failed; using template");
            fallback
        }
    }
}

/// Syllabus Q&A. LLM-backed when configured; otherwise a keyword scan
/// over the course description.
pub async fn answer_question(
    config: &AiRuntimeConfig,
    course: &CourseRecord,
    question: &str,
) -> AskAnswer {
    if config.configured() {
        let system = "You answer questions about a university course using only \
                      the provided description. Answer in at most three sentences.";
        let user = format!(
            "Course {} ({}): {}\n\nQuestion: {question}",
            course.course_code, course.title, course.description
        );

        match chat_completion(config, system, &user).await {
            Ok(answer) if !answer.trim().is_empty() => {
                return AskAnswer {
                    answer: answer.trim().to_string(),
                    source: AskSource::Ai,
                };
            }
            Ok(_) => warn!("llm returned an empty answer; using fallback"),
            Err(err) => warn!(error = %err, "llm ask call failed; using fallback"),
        }
    }

    AskAnswer {
        answer: keyword_answer(course, question),
        source: AskSource::Fallback,
    }
}

fn keyword_answer(course: &CourseRecord, question: &str) -> String {
    let keywords: Vec<String> = question
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() > 3)
        .map(|word| word.to_lowercase())
        .collect();

    let matched: Vec<&str> = course
        .description
        .split('.')
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            keywords.iter().any(|word| lower.contains(word.as_str()))
        })
        .take(2)
        .collect();

    if matched.is_empty() {
        format!(
            "I couldn't find that in the {} syllabus. Course summary: {}",
            course.course_code, course.description
        )
    } else {
        format!("{}.", matched.join(". "))
    }
}

async fn chat_completion(
    config: &AiRuntimeConfig,
    system: &str,
    user: &str,
) -> Result<String, ExplainError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = json!({
        "model": config.model,
        "messages": [
            { "role": "system", "content": system },
            { "role": "user", "content": user },
        ],
        "temperature": 0.4,
    });

    let response = client
        .post(&config.base_url)
        .bearer_auth(&config.api_key)
        .json(&body)
        .send()
        .await?
        .error_for_status()?;

    let payload: serde_json::Value = response.json().await?;
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.to_string())
        .ok_or_else(|| ExplainError::BadResponse("missing choices[0].message.content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::ScoreBreakdown;
    use chrono::Utc;

    fn user(name: &str, skills: &[&str], availability: &[&str]) -> UserRecord {
        UserRecord {
            user_id: name.to_lowercase(),
            display_name: name.to_string(),
            role_prefs: vec!["Backend".into()],
            skills: skills.iter().map(|s| s.to_string()).collect(),
            availability: availability.iter().map(|s| s.to_string()).collect(),
            course_codes: vec!["CS471".into()],
            created_at: Utc::now(),
        }
    }

    fn scored(reasons: &[&str], breakdown: ScoreBreakdown) -> ScoredCandidate {
        ScoredCandidate {
            user_id: "noah".into(),
            score: 50.0,
            reasons: reasons.iter().map(|s| s.to_string()).collect(),
            breakdown,
        }
    }

    #[test]
    fn template_leads_with_the_top_reason() {
        let viewer = user("Ava", &["Python"], &["Mon evening"]);
        let candidate = user("Noah", &["python", "react"], &[]);
        let scored = scored(
            &["fills missing Frontend role"],
            ScoreBreakdown {
                availability: 8.0,
                activity: 10.0,
                ..ScoreBreakdown::default()
            },
        );

        let explanation = template_explanation(&viewer, &candidate, &scored, "Software Studio");
        assert_eq!(explanation.headline, "Noah: fills missing Frontend role");
        assert_eq!(explanation.prompt_version, PROMPT_VERSION);
        assert!(explanation.icebreaker.contains("python"));
        assert!(explanation.risks.is_empty());
    }

    #[test]
    fn template_flags_low_signals_as_risks() {
        let viewer = user("Ava", &[], &[]);
        let candidate = user("Noah", &[], &[]);
        let scored = scored(
            &[],
            ScoreBreakdown {
                availability: 0.0,
                activity: 3.0,
                diversity_penalty: -7.5,
                ..ScoreBreakdown::default()
            },
        );

        let explanation = template_explanation(&viewer, &candidate, &scored, "Software Studio");
        // Three risks qualify but the shape caps at two.
        assert_eq!(explanation.risks.len(), 2);
        assert!(explanation.headline.contains("could round out your pod"));
    }

    #[test]
    fn template_is_deterministic() {
        let viewer = user("Ava", &["docker"], &["Tue morning"]);
        let candidate = user("Noah", &["aws"], &["Tue morning"]);
        let scored = scored(&["complementary stack: docker + aws"], ScoreBreakdown::default());

        let first = template_explanation(&viewer, &candidate, &scored, "Software Studio");
        let second = template_explanation(&viewer, &candidate, &scored, "Software Studio");
        assert_eq!(first, second);
    }

    #[test]
    fn keyword_fallback_quotes_matching_sentences() {
        let course = CourseRecord {
            course_code: "CS471".into(),
            title: "Software Engineering Studio".into(),
            description: "Teams build a product across the term. Grading is based on \
                          milestones and a final demo. No exams."
                .into(),
        };

        let answer = keyword_answer(&course, "How does grading work?");
        assert!(answer.contains("Grading is based on milestones"));

        let miss = keyword_answer(&course, "zzzz?");
        assert!(miss.contains("couldn't find"));
    }

    #[tokio::test]
    async fn unconfigured_ai_uses_the_fallback_paths() {
        let config = AiRuntimeConfig {
            api_key: String::new(),
            ..AiRuntimeConfig::default()
        };
        assert!(!config.configured());

        let course = CourseRecord {
            course_code: "CS471".into(),
            title: "Software Engineering Studio".into(),
            description: "Teams build a product.".into(),
        };
        let answer = answer_question(&config, &course, "what do teams do").await;
        assert_eq!(answer.source, AskSource::Fallback);

        let viewer = user("Ava", &[], &[]);
        let candidate = user("Noah", &[], &[]);
        let scored = scored(&["role unspecified"], ScoreBreakdown::default());
        let explanation =
            generate_explanation(&config, &viewer, &candidate, &scored, "Studio").await;
        assert_eq!(explanation.prompt_version, PROMPT_VERSION);
    }
}
