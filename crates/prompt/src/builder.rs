//! Prompt builder for rendering templates and injecting context.

use crate::types::{BuiltPrompt, PromptDefinition};
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Variable name the retrieved passages are bound to.
const KNOWLEDGE_CONTEXT_VAR: &str = "knowledgeContext";

/// Build a prompt from a definition and input variables.
///
/// This function:
/// 1. Injects knowledge base context if enabled
/// 2. Renders the system and user templates with Handlebars
/// 3. Returns a `BuiltPrompt` ready for LLM execution
///
/// # Arguments
/// * `definition` - Prompt definition loaded from YAML
/// * `variables` - Template variables (e.g., "prompt" -> user input)
/// * `knowledge_context` - Formatted retrieved passages
///
/// # Example
/// ```no_run
/// use docqa_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("prompt".to_string(), "What is Rust?".to_string());
///
/// let built = build_prompt(&def, vars, Some("[notes.txt]\nRust is a language.".to_string()))?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    mut variables: HashMap<String, String>,
    knowledge_context: Option<String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    // Inject knowledge context if enabled
    let knowledge_context_included = if definition.context.include_knowledge_base {
        match knowledge_context {
            Some(ctx) => {
                variables.insert(KNOWLEDGE_CONTEXT_VAR.to_string(), ctx);
                tracing::debug!("Injected knowledge base context");
                true
            }
            None => {
                tracing::warn!("Knowledge base context requested but not provided");
                variables.insert(KNOWLEDGE_CONTEXT_VAR.to_string(), String::new());
                false
            }
        }
    } else {
        false
    };

    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(template, &variables))
        .transpose()?;
    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        knowledge_context_included,
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    // Register template
    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    // Render
    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{builtin_prompt, QA_ARTICLE_ID};
    use crate::types::{PromptBehavior, PromptContextConfig, PromptInputSpec, PromptOutputSpec};

    fn create_test_definition(include_kb: bool) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            behavior: PromptBehavior {
                tone: "professional".to_string(),
                style: "concise".to_string(),
            },
            context: PromptContextConfig {
                include_knowledge_base: include_kb,
            },
            input: PromptInputSpec::default(),
            system: Some("Context: {{knowledgeContext}}".to_string()),
            template: "Question: {{prompt}}".to_string(),
            output: PromptOutputSpec {
                format: "markdown".to_string(),
            },
        }
    }

    fn question(q: &str) -> HashMap<String, String> {
        HashMap::from([("prompt".to_string(), q.to_string())])
    }

    #[test]
    fn test_render_simple_template() {
        let result = render_template("Question: {{prompt}}", &question("Hello, world!"));
        assert_eq!(result.unwrap(), "Question: Hello, world!");
    }

    #[test]
    fn test_render_does_not_escape_markup() {
        let result = render_template("{{prompt}}", &question("<b>a & b</b>"));
        assert_eq!(result.unwrap(), "<b>a & b</b>");
    }

    #[test]
    fn test_build_prompt_without_context() {
        let def = create_test_definition(false);
        let built = build_prompt(&def, question("Test question"), None).unwrap();

        assert_eq!(built.user, "Question: Test question");
        assert_eq!(built.system.as_deref(), Some("Context: "));
        assert!(!built.metadata.knowledge_context_included);
    }

    #[test]
    fn test_build_prompt_with_knowledge_context() {
        let def = create_test_definition(true);
        let kb_context = "[rust.txt]\nRust is a systems programming language.".to_string();
        let built = build_prompt(&def, question("Test question"), Some(kb_context)).unwrap();

        assert!(built.metadata.knowledge_context_included);
        assert_eq!(
            built.system.as_deref(),
            Some("Context: [rust.txt]\nRust is a systems programming language.")
        );
    }

    #[test]
    fn test_qa_article_places_context_between_backticks() {
        let def = builtin_prompt(QA_ARTICLE_ID).unwrap().unwrap();
        let built = build_prompt(
            &def,
            question("Who wrote it?"),
            Some("[https://example.com]\nWritten by Ada.".to_string()),
        )
        .unwrap();

        let system = built.system.unwrap();
        let open = system.find("```").unwrap();
        let close = system.rfind("```").unwrap();
        let ctx = system.find("Written by Ada.").unwrap();
        assert!(open < ctx && ctx < close);
        assert_eq!(built.user, "Who wrote it?");
    }

    #[test]
    fn test_render_template_missing_variable() {
        let vars = HashMap::new();
        let result = render_template("Question: {{missing}}", &vars);
        // Handlebars renders missing variables as empty string
        assert!(result.is_ok());
    }
}
