//! Prompt templates for the pipeline stages.
//!
//! Pure functions producing the instruction text each stage sends to the
//! model. No state, no I/O.

/// System prompt for the feature analyzer stage.
#[must_use]
pub fn analyzer_system() -> &'static str {
    "You are a senior QA analyst. From requirement text, extract actionable modules, \
user roles, inputs/outputs, constraints, and edge cases. Be concise but structured \
for test design. Prefer bullet lists grouped by feature.

Focus on:
- Identifying distinct functional modules/features
- Listing user roles and actors
- Documenting main user flows and processes
- Highlighting edge cases and constraints
- Extracting any explicit requirement IDs

Format your response as structured text with clear sections."
}

/// User prompt for the feature analyzer stage.
#[must_use]
pub fn analyzer_user(chunk: &str) -> String {
    format!(
        "Analyze the following chunk and list:

**Modules/Features:**
- [List distinct functional areas]

**Actors:**
- [List user roles and system actors]

**Main Flows:**
- [List primary user workflows]

**Edge Cases:**
- [List boundary conditions and edge cases]

**Constraints:**
- [List business rules and limitations]

**Requirement IDs:**
- [List any explicit requirement identifiers found]

Text:
{chunk}"
    )
}

/// System prompt for the test-case generator stage.
#[must_use]
pub fn generator_system() -> &'static str {
    "You are a QA test designer. Generate thorough but deduplicated test cases. \
Output JSON ONLY as a list of objects matching the schema fields: id, title, \
requirement_ids[], preconditions[], steps[], expected_result, \
priority(High|Medium|Low), type(Functional|Negative|Edge|Security|Performance). \
Keep steps actionable and clear.

Requirements:
- Use IDs like TC-001, TC-002, etc.
- Ensure traceability to requirement IDs when present
- Cover positive, negative, edge, and security scenarios
- Make steps specific and actionable
- Avoid duplicate test cases"
}

/// User prompt for the test-case generator stage.
#[must_use]
pub fn generator_user(features_summary: &str, max_cases: u32) -> String {
    format!(
        "Create {max_cases} test cases from this feature summary, covering positive, \
negative, edge, and basic security cases where applicable. Use IDs like TC-001..N. \
Ensure traceability to requirement IDs when present.

Feature summary:
{features_summary}

Return ONLY valid JSON array of test case objects."
    )
}

/// System prompt for the JSON repair step.
#[must_use]
pub fn repair_system() -> &'static str {
    "You strictly repair invalid JSON to match the required fields. Return JSON only. \
No prose or markdown.

Required schema fields:
- id: string (format: TC-XXX)
- title: string
- requirement_ids: array of strings
- preconditions: array of strings
- steps: array of strings (non-empty)
- expected_result: string
- priority: \"High\" | \"Medium\" | \"Low\"
- type: \"Functional\" | \"Negative\" | \"Edge\" | \"Security\" | \"Performance\"

Return ONLY the corrected JSON array."
}

/// User prompt for the JSON repair step.
#[must_use]
pub fn repair_user(bad_json: &str) -> String {
    format!(
        "Schema fields: id, title, requirement_ids(list), preconditions(list), \
steps(list), expected_result, priority(High|Medium|Low), type.
Repair the following into a valid JSON array of objects matching the schema:
{bad_json}"
    )
}

/// System prompt for the coverage auditor stage.
#[must_use]
pub fn auditor_system() -> &'static str {
    "You evaluate test coverage. Identify which modules/flows from the features \
summary are not adequately covered by the test case set. Output a concise list of gaps.

Focus on:
- Missing functional areas
- Uncovered user flows
- Missing edge cases
- Uncovered security scenarios
- Uncovered negative test scenarios

Format as a simple list of coverage gaps."
}

/// User prompt for the coverage auditor stage.
#[must_use]
pub fn auditor_user(features_summary: &str, test_cases_json: &str) -> String {
    format!(
        "Given:

Features summary:
{features_summary}

Current test cases (JSON):
{test_cases_json}

List missing or under-covered flows concisely."
    )
}

/// System prompt for the gap-fill generator stage.
#[must_use]
pub fn gap_system() -> &'static str {
    "You generate only the missing test cases to cover the identified gaps. \
Output JSON ONLY following the schema.

Requirements:
- Use new IDs continuing from the highest existing TC number
- Focus only on the identified gaps
- Follow the same schema as other test cases
- Return ONLY valid JSON array"
}

/// User prompt for the gap-fill generator stage.
#[must_use]
pub fn gap_user(gaps: &str, highest_case_number: u32) -> String {
    format!(
        "Create additional test cases only for the following gaps:
{gaps}

Use new IDs starting from TC-{:03}.
Return a JSON array. Use new IDs continuing from the highest existing TC number.",
        highest_case_number + 1
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzer_user_embeds_chunk() {
        let prompt = analyzer_user("The system shall allow login.");
        assert!(prompt.contains("The system shall allow login."));
        assert!(prompt.contains("**Modules/Features:**"));
    }

    #[test]
    fn test_generator_user_embeds_limit() {
        let prompt = generator_user("summary", 25);
        assert!(prompt.contains("Create 25 test cases"));
        assert!(prompt.contains("summary"));
    }

    #[test]
    fn test_gap_user_zero_pads_next_id() {
        let prompt = gap_user("Missing logout flow", 3);
        assert!(prompt.contains("TC-004"));

        let prompt = gap_user("Missing logout flow", 99);
        assert!(prompt.contains("TC-100"));
    }

    #[test]
    fn test_repair_prompts_mention_schema() {
        assert!(repair_system().contains("expected_result"));
        assert!(repair_user("{broken").contains("{broken"));
    }
}
