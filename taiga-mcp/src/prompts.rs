//! Parameterised prompt templates for common workflows
//!
//! Prompts are pure functions from typed parameters to text; they perform
//! no I/O.

use std::collections::HashMap;
use std::sync::Arc;

use taiga_client::{TaigaError, TaigaResult};

use crate::error::McpResult;
use crate::protocol::{PromptArgument, PromptDescriptor};
use crate::registry::{PromptHandler, PromptRegistry, RegisteredPrompt};

struct SprintPlanningPrompt;

impl PromptHandler for SprintPlanningPrompt {
    fn render(&self, args: &HashMap<String, String>) -> TaigaResult<String> {
        let project = required(args, "project")?;
        let sprint = args.get("sprint_name").map(String::as_str).unwrap_or("the next sprint");

        Ok(format!(
            "You are helping plan {sprint} for the Taiga project \"{project}\".\n\
             \n\
             1. Call taiga_get_project_stats to understand current velocity and open work.\n\
             2. Call taiga_list_user_stories with the project id and no milestone to see the backlog.\n\
             3. Propose a sprint scope: pick stories whose combined points fit the recent velocity, \
             and explain the reasoning per story.\n\
             4. After confirmation, create the sprint with taiga_create_milestone and move the \
             selected stories into it with taiga_bulk_update_user_story_milestone.\n\
             \n\
             Prefer small, vertical slices over large stories, and call out any story that is \
             missing points or acceptance criteria."
        ))
    }
}

struct IssueTriagePrompt;

impl PromptHandler for IssueTriagePrompt {
    fn render(&self, args: &HashMap<String, String>) -> TaigaResult<String> {
        let project = required(args, "project")?;

        Ok(format!(
            "You are triaging the issue backlog of the Taiga project \"{project}\".\n\
             \n\
             1. Call taiga_list_issues for the project, sorted by severity.\n\
             2. Call taiga_get_issue_filters to learn the available statuses, priorities, \
             severities and types.\n\
             3. For each unassigned issue, propose a priority, severity and type, flag likely \
             duplicates, and suggest an assignee from taiga_list_memberships.\n\
             4. Apply agreed changes with taiga_update_issue, one issue at a time.\n\
             \n\
             Summarise the triage as a table when done."
        ))
    }
}

struct RetrospectivePrompt;

impl PromptHandler for RetrospectivePrompt {
    fn render(&self, args: &HashMap<String, String>) -> TaigaResult<String> {
        let project = required(args, "project")?;
        let sprint = required(args, "sprint_name")?;

        Ok(format!(
            "You are facilitating a retrospective for sprint \"{sprint}\" of the Taiga project \
             \"{project}\".\n\
             \n\
             1. Call taiga_list_milestones to find the sprint, then taiga_get_milestone_stats \
             for its burndown.\n\
             2. Call taiga_list_user_stories and taiga_list_tasks for the sprint to see what \
             finished and what slipped.\n\
             3. Summarise: what went well, what did not, completed vs committed points, and \
             stories that moved between sprints.\n\
             4. Propose at most three concrete process changes, each tied to an observation \
             from the data."
        ))
    }
}

fn required<'a>(args: &'a HashMap<String, String>, name: &str) -> TaigaResult<&'a str> {
    args.get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TaigaError::invalid_input(name, "required prompt argument is missing"))
}

/// Register the prompt set
pub fn register_prompts(registry: &mut PromptRegistry) -> McpResult<()> {
    registry.register(RegisteredPrompt {
        descriptor: PromptDescriptor {
            name: "sprint_planning".to_string(),
            description: Some("Plan the next sprint from backlog and velocity".to_string()),
            arguments: vec![
                PromptArgument {
                    name: "project".to_string(),
                    description: Some("Project name or slug".to_string()),
                    required: true,
                },
                PromptArgument {
                    name: "sprint_name".to_string(),
                    description: Some("Name of the sprint being planned".to_string()),
                    required: false,
                },
            ],
        },
        handler: Arc::new(SprintPlanningPrompt),
    })?;

    registry.register(RegisteredPrompt {
        descriptor: PromptDescriptor {
            name: "issue_triage".to_string(),
            description: Some("Triage untriaged issues of a project".to_string()),
            arguments: vec![PromptArgument {
                name: "project".to_string(),
                description: Some("Project name or slug".to_string()),
                required: true,
            }],
        },
        handler: Arc::new(IssueTriagePrompt),
    })?;

    registry.register(RegisteredPrompt {
        descriptor: PromptDescriptor {
            name: "retrospective".to_string(),
            description: Some("Run a data-driven sprint retrospective".to_string()),
            arguments: vec![
                PromptArgument {
                    name: "project".to_string(),
                    description: Some("Project name or slug".to_string()),
                    required: true,
                },
                PromptArgument {
                    name: "sprint_name".to_string(),
                    description: Some("Sprint to review".to_string()),
                    required: true,
                },
            ],
        },
        handler: Arc::new(RetrospectivePrompt),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_registration() {
        let mut registry = PromptRegistry::new();
        register_prompts(&mut registry).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.get("sprint_planning").is_some());
        assert!(registry.get("issue_triage").is_some());
        assert!(registry.get("retrospective").is_some());
    }

    #[test]
    fn test_sprint_planning_renders_parameters() {
        let mut registry = PromptRegistry::new();
        register_prompts(&mut registry).unwrap();

        let prompt = registry.get("sprint_planning").unwrap();
        let text = prompt
            .handler
            .render(&args(&[("project", "backend"), ("sprint_name", "Sprint 12")]))
            .unwrap();

        assert!(text.contains("backend"));
        assert!(text.contains("Sprint 12"));
        assert!(text.contains("taiga_create_milestone"));
    }

    #[test]
    fn test_missing_required_argument_fails() {
        let mut registry = PromptRegistry::new();
        register_prompts(&mut registry).unwrap();

        let prompt = registry.get("retrospective").unwrap();
        let result = prompt.handler.render(&args(&[("project", "backend")]));
        assert!(matches!(result, Err(TaigaError::InvalidInput { .. })));
    }

    #[test]
    fn test_optional_argument_defaults() {
        let mut registry = PromptRegistry::new();
        register_prompts(&mut registry).unwrap();

        let prompt = registry.get("sprint_planning").unwrap();
        let text = prompt.handler.render(&args(&[("project", "backend")])).unwrap();
        assert!(text.contains("the next sprint"));
    }
}
