//! Prompt construction and response extraction for the router endpoints.

use serde_json::Value;

/// System instruction for the narrative classifier.
pub fn build_classify_system_prompt() -> String {
    "You are an AI assistant analyzing dispute descriptions from users in Singapore. \
     Classify the issue ONLY as \"Scam\" or \"Fraud\" and return one valid JSON object \
     with these fields:\n\n\
     - \"claim_type\": \"Scam\" or \"Fraud\"\n\
     - \"summary\": one-sentence summary\n\
     - \"key_entities\": optional array of names, numbers, platforms"
        .to_string()
}

/// User prompt for the classifier. `narrative` must already be redacted.
pub fn build_classify_user_prompt(narrative: &str) -> String {
    format!("User Description:\n\"\"\"\n{narrative}\n\"\"\"\n\nJSON Output:")
}

/// Prompt for the clarifying-question generator. `classification` must
/// already be redacted.
pub fn build_questions_prompt(classification: &Value) -> String {
    let classification_json =
        serde_json::to_string_pretty(classification).unwrap_or_else(|_| "{}".to_string());

    format!(
        "You are an intake assistant for GuideBuoy AI (Singapore consumer disputes and scam \
         complaints). We no longer gate users for FIDReC — ask practical, lightweight questions \
         that help us move them to the right path.\n\n\
         Based on this dispute classification:\n\
         {classification_json}\n\n\
         Generate 5-7 clarifying questions to understand the case. Focus on:\n\
         1. Who/what they dealt with (institution or party)\n\
         2. Rough claim amount or loss\n\
         3. When it happened\n\
         4. What they already tried (e.g., contacted institution/police)\n\
         5. Evidence availability (receipts, screenshots, reference numbers)\n\
         6. Urgency or harm (money lost, account access, harassment)\n\n\
         Return a JSON object with a \"questions\" array. Each question should have:\n\
         - key: unique identifier (snake_case)\n\
         - question: the question text\n\
         - type: \"radio\", \"text\", \"number\", or \"date\"\n\
         - options: array of options (for radio type)\n\
         - required: boolean\n\n\
         Keep wording plain and friendly. Do not include legal disclaimers.\n\n\
         JSON Output:"
    )
}

/// Prompt for the eligibility assessor. Both inputs must already be redacted.
pub fn build_assess_prompt(classification: &Value, responses: &Value) -> String {
    let classification_json =
        serde_json::to_string_pretty(classification).unwrap_or_else(|_| "{}".to_string());
    let responses_json =
        serde_json::to_string_pretty(responses).unwrap_or_else(|_| "{}".to_string());

    format!(
        "You are an intake assistant for GuideBuoy AI (Singapore consumer disputes and scam \
         complaints). Do NOT gate users behind strict FIDReC criteria - we want everyone to keep \
         moving, with a recommended path that fits what they shared.\n\n\
         Context to consider (not blockers): institution type, claim size, timing, whether they \
         already contacted the institution, and what evidence they have. Use this to choose a \
         helpful path, not to reject.\n\n\
         Dispute Classification:\n\
         {classification_json}\n\n\
         User Responses:\n\
         {responses_json}\n\n\
         Decide the best support path and provide:\n\
         1. is_fidrec_eligible: boolean (true when a formal escalation or ombuds-style path \
         seems viable; otherwise false)\n\
         2. eligibility_score: 0-100 (overall confidence in the case/story strength for any path)\n\
         3. recommended_path: one of\n\
            - \"fidrec_eligible\": move ahead with a hands-on case build / escalation\n\
            - \"waitlist\": we need to loop them into our launch or specialist queue\n\
            - \"self_service\": give DIY guidance/resources now\n\
            - \"not_eligible\": only for clearly out-of-scope or abusive content; prefer \
         self_service otherwise\n\
         4. reasoning: Array of key points explaining the assessment\n\
         5. missing_info: Array of any critical missing information\n\
         6. next_steps: Array of 3-5 recommended actions the user can take now\n\
         7. estimated_timeline: String describing expected timeline\n\
         8. success_probability: \"high\" | \"medium\" | \"low\"\n\n\
         Be generous: never block the user just because details are missing; still pick the \
         best available path and surface missing_info.\n\n\
         Return ONLY valid JSON, no other text.\n\n\
         JSON Output:"
    )
}

/// Extract a JSON object from an LLM response that may be wrapped in
/// markdown fences or surrounding prose.
pub fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    // Already a JSON object
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    // Wrapped in markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    // Try to find object bounds
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && start < end
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}
