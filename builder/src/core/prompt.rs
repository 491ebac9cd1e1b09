//! Prompt composition for the model gateway.
//!
//! [`compose`] is a pure function: it deterministically renders the fixed
//! behavior template with the three state documents. The project description
//! is embedded verbatim, rules in stable order, the full `completed` list as
//! context, and an explicit directive naming `progress.next` as the only task
//! to perform. Prior steps are never presented as to-do items.

use minijinja::{Environment, context};

use crate::core::progress::ProgressRecord;
use crate::core::types::RuleSet;

const BUILDER_TEMPLATE: &str = include_str!("prompts/builder.md");

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("builder", BUILDER_TEMPLATE)
            .expect("builder template should be valid");
        Self { env }
    }

    fn render(&self, project: &str, rules: &RuleSet, progress: &ProgressRecord) -> String {
        let template = self
            .env
            .get_template("builder")
            .expect("builder template is registered");
        template
            .render(context! {
                project => project.trim_end(),
                rules => rules.render_lines(),
                completed => progress.completed,
                next => progress.next,
            })
            .expect("builder template rendering should not fail")
    }
}

/// Render the single instruction payload for one invocation.
pub fn compose(project: &str, rules: &RuleSet, progress: &ProgressRecord) -> String {
    PromptEngine::new().render(project, rules, progress)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn sample_rules() -> RuleSet {
        let mut map = BTreeMap::new();
        map.insert("style".to_string(), "plain css, no frameworks".to_string());
        map.insert("html".to_string(), "semantic tags only".to_string());
        RuleSet::Map(map)
    }

    fn sample_progress() -> ProgressRecord {
        ProgressRecord {
            completed: vec!["init".to_string(), "add-basic-layout".to_string()],
            next: "style".to_string(),
        }
    }

    #[test]
    fn embeds_project_description_verbatim() {
        let prompt = compose("A landing page for a bakery.", &sample_rules(), &sample_progress());
        assert!(prompt.contains("A landing page for a bakery."));
    }

    #[test]
    fn names_next_as_the_only_task() {
        let prompt = compose("p", &sample_rules(), &sample_progress());
        assert!(prompt.contains("Perform ONLY this step now: style"));
    }

    #[test]
    fn lists_completed_steps_for_context_not_as_tasks() {
        let prompt = compose("p", &sample_rules(), &sample_progress());
        let completed_section = prompt
            .split("<completed>")
            .nth(1)
            .and_then(|rest| rest.split("</completed>").next())
            .expect("completed section");
        assert!(completed_section.contains("- init"));
        assert!(completed_section.contains("- add-basic-layout"));
        // Prior steps must not appear in the task directive.
        let task_section = prompt.split("<task>").nth(1).expect("task section");
        assert!(!task_section.contains("add-basic-layout"));
    }

    #[test]
    fn rules_render_in_stable_sorted_order() {
        let prompt = compose("p", &sample_rules(), &sample_progress());
        let html_pos = prompt.find("html: semantic tags only").expect("html rule");
        let style_pos = prompt
            .find("style: plain css, no frameworks")
            .expect("style rule");
        assert!(html_pos < style_pos, "map rules sorted by key");
    }

    #[test]
    fn composition_is_deterministic() {
        let a = compose("p", &sample_rules(), &sample_progress());
        let b = compose("p", &sample_rules(), &sample_progress());
        assert_eq!(a, b);
    }

    #[test]
    fn states_the_reply_contract() {
        let prompt = compose("p", &sample_rules(), &sample_progress());
        assert!(prompt.contains("--- file: <path> ---"));
        assert!(prompt.contains("{\"next\": \"done\"}"));
    }
}
