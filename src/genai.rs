use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::catalog::Question;
use crate::config::Config;

const COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The fixed set of languages a solution is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    JavaScript,
    Java,
    Cpp,
    Go,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Python,
        Language::JavaScript,
        Language::Java,
        Language::Cpp,
        Language::Go,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::Java => "Java",
            Language::Cpp => "C++",
            Language::Go => "Go",
        }
    }

    /// Markdown fence tag for code blocks in this language.
    pub fn syntax(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::Go => "go",
        }
    }

    pub fn comment(self) -> &'static str {
        match self {
            Language::Python => "#",
            _ => "//",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A generated solution for one target language.
#[derive(Debug, Clone)]
pub struct Solution {
    pub language: Language,
    pub code: String,
    pub explanation: String,
    pub time_complexity: String,
    pub space_complexity: String,
}

/// Client for the hosted completion endpoint that writes the solutions.
pub struct SolutionClient {
    api_key: Option<String>,
    model: String,
}

impl SolutionClient {
    pub fn new(config: &Config) -> Self {
        if config.groq_api_key.is_none() {
            log::warn!("GROQ_API_KEY not set; solution generation will be declined.");
        }
        Self {
            api_key: config.groq_api_key.clone(),
            model: config.groq_model.clone(),
        }
    }

    /// Generates a solution with explanation and complexity analysis for
    /// one language. Each call is a full round-trip to the completion
    /// endpoint and can take tens of seconds.
    pub async fn generate(&self, question: &Question, language: Language) -> Result<Solution> {
        let api_key = self
            .api_key
            .as_deref()
            .context("Solution generator is not configured (GROQ_API_KEY missing).")?;

        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a helpful coding assistant specializing in LeetCode \
                                problems. Provide clean, optimal solutions with clear explanations."
                },
                {
                    "role": "user",
                    "content": build_prompt(question, language)
                }
            ],
            "temperature": 0.3,
            "max_tokens": 2000
        });

        let response = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?
            .post(COMPLETIONS_URL)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("[generate] Completion API error: {status} - {body}");
            return Err(anyhow!("Completion API returned {status}"));
        }

        let data = response.json::<Value>().await?;
        let content = data
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .context("No completion content in the response.")?;

        Ok(parse_response(content, language))
    }

    /// Generates a solution for every supported language, sequentially.
    /// Fails as a whole if any single language fails, so the caller never
    /// posts a partial set.
    pub async fn generate_all(&self, question: &Question) -> Result<Vec<Solution>> {
        let mut solutions = Vec::with_capacity(Language::ALL.len());
        for language in Language::ALL {
            log::info!("Generating {language} solution for '{}'...", question.title);
            solutions.push(self.generate(question, language).await?);
        }
        Ok(solutions)
    }
}

fn build_prompt(question: &Question, language: Language) -> String {
    let hints = if question.hints.is_empty() {
        String::from("No hints provided")
    } else {
        question
            .hints
            .iter()
            .map(|hint| format!("- {hint}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are a LeetCode expert. Provide a complete solution for this problem in {name}.\n\n\
         **Problem:** {title}\n\
         **Difficulty:** {difficulty}\n\
         **Description:** {description}\n\
         **Hints:**\n{hints}\n\n\
         Please provide:\n\
         1. A clean, working {name} solution with comments\n\
         2. A clear explanation of the approach (language-agnostic)\n\
         3. Time complexity analysis\n\
         4. Space complexity analysis\n\n\
         Format your response EXACTLY like this:\n\n\
         ```{syntax}\n\
         {comment} Your solution code here with comments\n\
         ```\n\n\
         **Explanation:**\n\
         [Your detailed explanation here]\n\n\
         **Time Complexity:** O(...)\n\
         **Space Complexity:** O(...)\n\n\
         Be concise but thorough. Focus on the optimal solution. Use proper {name} syntax \
         and conventions.",
        name = language.name(),
        syntax = language.syntax(),
        comment = language.comment(),
        title = question.title,
        difficulty = question.difficulty,
        description = question.description,
    )
}

/// Pulls the structured pieces out of the model's markdown reply. Falls
/// back to treating the whole reply as the explanation when the expected
/// markers are missing.
fn parse_response(content: &str, language: Language) -> Solution {
    let mut solution = Solution {
        language,
        code: String::new(),
        explanation: String::new(),
        time_complexity: String::from("N/A"),
        space_complexity: String::from("N/A"),
    };

    let fence = format!("```{}", language.syntax());
    let code_start = content
        .find(&fence)
        .map(|at| at + fence.len())
        .or_else(|| content.find("```").map(|at| at + 3));
    if let Some(start) = code_start {
        if let Some(len) = content[start..].find("```") {
            solution.code = content[start..start + len].trim().to_string();
        }
    }

    const EXPLANATION: &str = "**Explanation:**";
    const TIME: &str = "**Time Complexity:**";
    const SPACE: &str = "**Space Complexity:**";

    if let Some(at) = content.find(EXPLANATION) {
        let start = at + EXPLANATION.len();
        let end = content[start..]
            .find(TIME)
            .map(|len| start + len)
            .unwrap_or(content.len());
        solution.explanation = content[start..end].trim().to_string();
    } else {
        solution.explanation = content.trim().to_string();
    }

    if let Some(at) = content.find(TIME) {
        let start = at + TIME.len();
        let end = content[start..]
            .find('\n')
            .map(|len| start + len)
            .unwrap_or(content.len());
        solution.time_complexity = content[start..end].trim().to_string();
    }

    if let Some(at) = content.find(SPACE) {
        solution.space_complexity = content[at + SPACE.len()..].trim().to_string();
    }

    solution
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_reply() {
        let reply = "\
```python
# two pointers
def solve(nums):
    return nums
```

**Explanation:**
Walk the array from both ends.

**Time Complexity:** O(n)
**Space Complexity:** O(1)";

        let solution = parse_response(reply, Language::Python);
        assert!(solution.code.starts_with("# two pointers"));
        assert_eq!(solution.explanation, "Walk the array from both ends.");
        assert_eq!(solution.time_complexity, "O(n)");
        assert_eq!(solution.space_complexity, "O(1)");
    }

    #[test]
    fn falls_back_to_plain_fence() {
        let reply = "```\nint main() {}\n```\n**Explanation:**\nTrivial.";
        let solution = parse_response(reply, Language::Cpp);
        assert_eq!(solution.code, "int main() {}");
        assert_eq!(solution.explanation, "Trivial.");
        assert_eq!(solution.time_complexity, "N/A");
    }

    #[test]
    fn unstructured_reply_becomes_explanation() {
        let solution = parse_response("I couldn't solve this one.", Language::Go);
        assert!(solution.code.is_empty());
        assert_eq!(solution.explanation, "I couldn't solve this one.");
    }

    #[test]
    fn every_language_has_distinct_fence_tags() {
        let tags: std::collections::HashSet<_> =
            Language::ALL.iter().map(|l| l.syntax()).collect();
        assert_eq!(tags.len(), Language::ALL.len());
    }
}
