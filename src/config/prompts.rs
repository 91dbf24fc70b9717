//! Prompt templates for Casebook.
//!
//! The answer template can be replaced by placing a `rag.toml` file in the
//! custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Phrase the model is told to use when the context does not hold the answer.
pub const FALLBACK_ANSWER: &str = "I do not have that information in the provided case studies.";

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for grounded answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// Single user message wrapping `{{context}}` and `{{question}}`.
    pub answer: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            answer: format!(
                r#"You are a medical case study assistant.
Answer the user's question based *only* on the following context.
If the answer is not found, say "{}"
--- CONTEXT ---
{{{{context}}}}
--- END OF CONTEXT ---
USER'S QUESTION: {{{{question}}}}"#,
                FALLBACK_ANSWER
            ),
        }
    }
}

impl Prompts {
    /// Load prompts, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single left-to-right pass, so placeholder-looking
    /// text inside a substituted value is never expanded again. Unknown
    /// placeholders are left as-is.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];
            match after_open.find("}}") {
                Some(close) => {
                    let key = &after_open[..close];
                    match vars.get(key.trim()) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after_open[close + 2..];
                }
                None => {
                    result.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Build the grounded answer prompt for a question and its context block.
    pub fn answer_prompt(&self, context: &str, question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        self.render_with_custom(&self.rag.answer, &vars)
    }
}
