//! Prompt templates for question answering

use std::collections::HashMap;

use crate::errors::DocQaError;
use crate::errors::Result;

/// Prompt wrapping the retrieved context and the raw question
pub const DEFAULT_QA_TEMPLATE: &str = "Context: {{context}}\n\nQuestion: {{question}}\n\nAnswer:";

/// Template with `{{name}}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Template used to ask a question over retrieved context
    ///
    /// # Errors
    /// - `ConfigError` if the template lacks `{{context}}` or `{{question}}`
    pub fn question_answering(template: &str) -> Result<Self> {
        let template = Self::new(template);
        for required in ["context", "question"] {
            if !template.variables.iter().any(|v| v == required) {
                return Err(DocQaError::ConfigError(format!(
                    "prompt template must contain {{{{{required}}}}}"
                )));
            }
        }
        Ok(template)
    }

    /// Fill in the template in a single pass
    ///
    /// Substituted values are never re-scanned for placeholders. Unknown
    /// placeholders are left as written.
    #[must_use]
    pub fn render(&self, values: &HashMap<&str, &str>) -> String {
        let mut result = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];
            match after_open.find("}}") {
                Some(close) => {
                    let name = &after_open[..close];
                    match values.get(name) {
                        Some(value) => result.push_str(value),
                        None => result.push_str(&rest[open..open + 2 + close + 2]),
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

    /// Render the question-answering prompt
    #[must_use]
    pub fn render_qa(&self, context: &str, question: &str) -> String {
        let values = HashMap::from([("context", context), ("question", question)]);
        self.render(&values)
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_QA_TEMPLATE)
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        let name = &after_open[..close];
        if !name.is_empty() && !variables.iter().any(|v| v == name) {
            variables.push(name.to_string());
        }
        rest = &after_open[close + 2..];
    }

    variables
}
