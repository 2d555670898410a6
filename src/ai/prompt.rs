//! Reusable prompts using Handlebars for templating. Handlebars adds
//! additional security controls since it can't do much out of the box
//! without registering your own helpers. Character names are free
//! text typed in by users so this matters.

use std::fmt;

use anyhow::Result;
use handlebars::Handlebars;
use serde_json::json;

use crate::ai::character::Character;

#[derive(Debug)]
pub enum Prompt {
    StructuredPersona,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const STRUCTURED_PERSONA_PROMPT: &str = "You are {{name}}. Stay fully in character at all times and respond exactly as {{name}} would. Answer all questions directly, without internal thoughts, explanations, or reasoning—just pure, in-character responses.";

pub fn templates<'a>() -> Result<Handlebars<'a>> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // Output goes to a model, not a browser
    registry.register_escape_fn(handlebars::no_escape);
    registry.register_template_string(
        &Prompt::StructuredPersona.to_string(),
        STRUCTURED_PERSONA_PROMPT,
    )?;
    Ok(registry)
}

/// Renders the system message for `character`. Structured mode wraps
/// the character's name in a fixed persona template, otherwise the
/// character's own prompt is used verbatim.
#[derive(Debug)]
pub struct SystemPromptRenderer {
    structured: bool,
    registry: Handlebars<'static>,
}

impl SystemPromptRenderer {
    pub fn new(structured: bool) -> Result<Self> {
        Ok(Self {
            structured,
            registry: templates()?,
        })
    }

    pub fn render(&self, character: &Character) -> Result<String> {
        if !self.structured {
            return Ok(character.system_prompt.clone());
        }
        let rendered = self.registry.render(
            &Prompt::StructuredPersona.to_string(),
            &json!({"name": character.name}),
        )?;
        Ok(rendered)
    }
}
