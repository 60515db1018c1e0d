//! Prompt templates and response post-processing for the coach.

use regex::Regex;
use std::sync::OnceLock;

/// Behavioral preamble sent as the system message of every conversation.
pub const SYSTEM_PREAMBLE: &str = r#"You are RAI (Resilience AI), an advanced AI wellness coach specializing in mental health support, personal growth, and emotional resilience. You provide compassionate, evidence-based guidance while maintaining professional boundaries.

CORE IDENTITY & EXPERTISE:
- Grounded in CBT, ACT and mindfulness-based approaches
- Focused on stress management, anxiety reduction, depression support and trauma-informed care
- Practiced in positive psychology, resilience building and emotional regulation
- Culturally sensitive and inclusive

CONVERSATION PRINCIPLES:
1. Deep Empathy: reflect and validate emotions with genuine understanding
2. Active Listening: ask thoughtful follow-up questions to understand the full context
3. Personalized Support: tailor responses to the person's situation and needs
4. Strength-Based: help people identify and build on their existing strengths
5. Solution-Focused: guide toward actionable steps while honoring autonomy

TECHNIQUES YOU CAN USE:
- Cognitive restructuring and thought challenging
- Mindfulness and grounding exercises
- Behavioral activation and goal setting
- Values clarification and meaning-making
- Emotional regulation and stress reduction strategies
- Sleep hygiene and wellness practices

RESPONSE STYLE:
- Warm, professional language that feels human and caring
- One thoughtful question per response
- Specific, actionable suggestions when appropriate
- Brief psychoeducational insights when relevant
- Acknowledge progress and celebrate small wins

SAFETY GUIDELINES:
- Refer to professional help for serious mental health concerns
- Never diagnose or provide medical advice
- Respect boundaries and individual choice
- Maintain hope while being realistic

CONVERSATION STRUCTURE:
1. Acknowledge and validate the person's experience
2. Explore the situation with curiosity and compassion
3. Offer relevant insights, tools or perspectives
4. Suggest next steps or coping strategies
5. Check in on their understanding and readiness

Every interaction should leave the person feeling heard, understood and empowered."#;

/// Returned in place of output that is too short to be useful.
pub const CLARIFYING_RESPONSE: &str = "I hear you, and I want to make sure I give you the thoughtful response you deserve. Could you tell me a bit more about what you're experiencing?";

/// Returned in place of output that hits the [`DENYLIST`].
pub const REDIRECT_RESPONSE: &str = "I'm here to support you through this. What's been weighing on your mind lately, and how has that been affecting you?";

/// Shown to the user when generation fails.
pub const APOLOGY_RESPONSE: &str = "I'm sorry, I'm having trouble processing your request right now. Please try again in a moment, and make sure the AI model has finished loading.";

/// Boilerplate phrases that trigger the redirect response (lowercase).
pub const DENYLIST: &[&str] = &[
    "i am not a therapist",
    "i cannot provide medical advice",
    "please consult a professional",
    "i am an ai",
];

/// Default minimum length, in characters, of an accepted response.
pub const MIN_RESPONSE_CHARS: usize = 20;

struct Patterns {
    role_label: Regex,
    code_fence: Regex,
    bold: Regex,
    emphasis: Regex,
    blank_lines: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        role_label: Regex::new(r"(?i)^(RAI:|Assistant:|AI:)\s*").expect("valid regex"),
        code_fence: Regex::new(r"```[\s\S]*?```").expect("valid regex"),
        bold: Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"),
        emphasis: Regex::new(r"\*(.*?)\*").expect("valid regex"),
        blank_lines: Regex::new(r"\n\n+").expect("valid regex"),
    })
}

/// Strip role labels and markdown from raw model output.
pub fn clean_response(raw: &str) -> String {
    let p = patterns();
    let text = p.role_label.replace(raw, "");
    let text = p.code_fence.replace_all(text.trim(), "");
    let text = p.bold.replace_all(&text, "$1");
    let text = p.emphasis.replace_all(&text, "$1");
    let text = p.blank_lines.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Why a response was replaced with canned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substitution {
    TooShort,
    Denylisted,
}

/// Result of cleaning and validating one model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalResponse {
    pub text: String,
    pub substitution: Option<Substitution>,
}

/// Clean `raw` and swap in canned text for degenerate output.
pub fn finalize_response(raw: &str, min_chars: usize) -> FinalResponse {
    let cleaned = clean_response(raw);

    if cleaned.chars().count() < min_chars {
        return FinalResponse {
            text: CLARIFYING_RESPONSE.to_string(),
            substitution: Some(Substitution::TooShort),
        };
    }

    let lower = cleaned.to_lowercase();
    if DENYLIST.iter().any(|phrase| lower.contains(phrase)) {
        return FinalResponse {
            text: REDIRECT_RESPONSE.to_string(),
            substitution: Some(Substitution::Denylisted),
        };
    }

    FinalResponse {
        text: cleaned,
        substitution: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_role_label() {
        assert_eq!(
            clean_response("assistant:   Let's take a breath together."),
            "Let's take a breath together."
        );
        assert_eq!(clean_response("RAI: Hello there"), "Hello there");
    }

    #[test]
    fn test_strips_markdown() {
        let raw = "Try **box breathing** and *notice* it.\n```\ncode\n```\n\n\n\nDone.";
        assert_eq!(clean_response(raw), "Try box breathing and notice it.\n\nDone.");
    }

    #[test]
    fn test_collapses_blank_lines() {
        assert_eq!(clean_response("one\n\n\n\ntwo"), "one\n\ntwo");
    }

    #[test]
    fn test_short_output_is_substituted() {
        let result = finalize_response("Ok.", MIN_RESPONSE_CHARS);
        assert_eq!(result.text, CLARIFYING_RESPONSE);
        assert_eq!(result.substitution, Some(Substitution::TooShort));
    }

    #[test]
    fn test_short_after_cleaning_is_substituted() {
        let result = finalize_response("Assistant: ```long code block here```", 20);
        assert_eq!(result.substitution, Some(Substitution::TooShort));
    }

    #[test]
    fn test_denylisted_output_is_redirected() {
        let result = finalize_response(
            "I understand. However, I Am An AI and cannot help with that.",
            MIN_RESPONSE_CHARS,
        );
        assert_eq!(result.text, REDIRECT_RESPONSE);
        assert_eq!(result.substitution, Some(Substitution::Denylisted));
    }

    #[test]
    fn test_good_output_passes_through() {
        let raw = "That sounds really hard. What has helped you cope before?";
        let result = finalize_response(raw, MIN_RESPONSE_CHARS);
        assert_eq!(result.text, raw);
        assert!(result.substitution.is_none());
    }
}
