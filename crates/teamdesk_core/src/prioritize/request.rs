//! Prioritization request builder.
//!
//! # Responsibility
//! - Turn task and employee lists into the generation request payload.
//! - Render the natural-language prompt and the expected output schema.
//!
//! # Invariants
//! - Tasks in terminal status are excluded; every other task appears exactly
//!   once, in input order.
//! - Rendering is a pure function of the request: identical input produces a
//!   byte-identical prompt.

use crate::model::record::RecordId;
use crate::model::task::Task;
use crate::model::user::{User, UserRole};
use serde::Serialize;
use serde_json::{json, Value};

const PROMPT_PREAMBLE: &str = "You are an expert project manager. \
Your goal is to optimize team productivity by prioritizing tasks effectively.
Analyze the following lists of tasks and employees.";

/// Business policy handed to the generation service.
pub const PRIORITIZATION_INSTRUCTIONS: &str = "\
1. Re-evaluate the priority of each task based on its deadline (dueDate), its original priority, and the role of the assigned employee.
2. A task with a closer deadline should generally have a higher priority.
3. Tasks blocking other team members must be marked as \"critical\".
4. Consider the roles of the employees. A task assigned to a senior or lead role (admin, manager) is more foundational than others.
5. Generate a new prioritized list of these tasks.
6. For each task, provide a brief, non-empty justification for its new priority level.
7. Return ONLY the JSON object containing the prioritized tasks, with every original task field unchanged. Do not write anything outside that JSON object.";

/// Employee projection sent to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeBrief {
    pub id: RecordId,
    pub name: String,
    pub role: UserRole,
    pub reporting_manager_id: Option<RecordId>,
}

impl From<&User> for EmployeeBrief {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name().to_string(),
            role: user.role,
            reporting_manager_id: user.reporting_manager_id.clone(),
        }
    }
}

/// Payload for one prioritization call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizationRequest {
    pub instructions: String,
    /// Non-terminal tasks only.
    pub tasks: Vec<Task>,
    pub employees: Vec<EmployeeBrief>,
    /// Caller-supplied "now" (epoch milliseconds) for deadline proximity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_time: Option<i64>,
}

impl PrioritizationRequest {
    /// Builds a request from the current task and employee lists.
    ///
    /// Empty lists are allowed and produce a trivial request.
    pub fn build(tasks: &[Task], employees: &[User]) -> Self {
        Self {
            instructions: PRIORITIZATION_INSTRUCTIONS.to_string(),
            tasks: tasks.iter().filter(|task| task.is_open()).cloned().collect(),
            employees: employees.iter().map(EmployeeBrief::from).collect(),
            reference_time: None,
        }
    }

    pub fn with_reference_time(mut self, epoch_ms: i64) -> Self {
        self.reference_time = Some(epoch_ms);
        self
    }

    /// Whether no task survived filtering.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Renders the full prompt text.
    pub fn render_prompt(&self) -> serde_json::Result<String> {
        let employees = serde_json::to_string_pretty(&self.employees)?;
        let tasks = serde_json::to_string_pretty(&self.tasks)?;
        let schema = serde_json::to_string_pretty(&response_schema())?;

        let mut prompt = String::with_capacity(
            PROMPT_PREAMBLE.len() + employees.len() + tasks.len() + schema.len() + 1024,
        );
        prompt.push_str(PROMPT_PREAMBLE);
        prompt.push_str("\n\n");
        if let Some(reference_time) = self.reference_time {
            prompt.push_str(&format!(
                "Current time (epoch milliseconds): {reference_time}\n\n"
            ));
        }
        prompt.push_str("Employees:\n");
        prompt.push_str(&employees);
        prompt.push_str("\n\nTasks to prioritize (tasks with status \"done\" are excluded):\n");
        prompt.push_str(&tasks);
        prompt.push_str("\n\nInstructions:\n");
        prompt.push_str(&self.instructions);
        prompt.push_str("\n\nOutput JSON schema:\n");
        prompt.push_str(&schema);
        prompt.push('\n');
        Ok(prompt)
    }
}

/// JSON Schema of the expected `{ prioritizedTasks: [...] }` response.
pub fn response_schema() -> Value {
    let nullable_string = json!({ "type": ["string", "null"] });
    let nullable_integer = json!({ "type": ["integer", "null"] });

    json!({
        "type": "object",
        "required": ["prioritizedTasks"],
        "properties": {
            "prioritizedTasks": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": [
                        "id", "title", "description", "projectId", "reporterId",
                        "status", "priority", "createdAt", "updatedAt",
                        "justification", "newPriority"
                    ],
                    "properties": {
                        "id": { "type": "string" },
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "projectId": { "type": "string" },
                        "assigneeId": nullable_string,
                        "reporterId": { "type": "string" },
                        "status": { "enum": ["todo", "in-progress", "review", "done"] },
                        "priority": { "enum": ["low", "medium", "high"] },
                        "dueDate": nullable_integer,
                        "createdAt": { "type": "integer" },
                        "updatedAt": { "type": "integer" },
                        "justification": {
                            "type": "string",
                            "minLength": 1,
                            "description": "Reasoning for the assigned priority."
                        },
                        "newPriority": {
                            "enum": ["low", "medium", "high", "critical"],
                            "description": "The newly evaluated priority."
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{response_schema, PrioritizationRequest, PRIORITIZATION_INSTRUCTIONS};
    use crate::model::task::{Task, TaskStatus};
    use crate::model::user::{User, UserRole};

    fn task(id: &str, status: TaskStatus) -> Task {
        let mut task = Task::with_id(id, format!("Task {id}"), "P1", "E1");
        task.status = status;
        task
    }

    #[test]
    fn build_drops_done_tasks_and_keeps_order() {
        let tasks = vec![
            task("T1", TaskStatus::Todo),
            task("T2", TaskStatus::Done),
            task("T3", TaskStatus::Review),
            task("T4", TaskStatus::InProgress),
        ];
        let request = PrioritizationRequest::build(&tasks, &[]);
        let ids: Vec<&str> = request.tasks.iter().map(|task| task.id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T3", "T4"]);
    }

    #[test]
    fn employee_brief_uses_display_name_fallback() {
        let mut lead = User::with_id("E1", "lead@example.com", UserRole::Manager);
        lead.display_name = Some("Bob Williams".to_string());
        let dev = User::with_id("E2", "dev@example.com", UserRole::Employee);

        let request = PrioritizationRequest::build(&[], &[lead, dev]);
        assert_eq!(request.employees[0].name, "Bob Williams");
        assert_eq!(request.employees[1].name, "dev@example.com");
        assert!(request.is_empty());
    }

    #[test]
    fn prompt_contains_policy_and_schema() {
        let request = PrioritizationRequest::build(&[task("T1", TaskStatus::Todo)], &[]);
        let prompt = request.render_prompt().unwrap();
        assert!(prompt.contains(PRIORITIZATION_INSTRUCTIONS));
        assert!(prompt.contains("\"id\": \"T1\""));
        assert!(prompt.contains("\"newPriority\""));
        assert!(!prompt.contains("Current time"));
    }

    #[test]
    fn reference_time_is_rendered_when_set() {
        let request = PrioritizationRequest::build(&[], &[]).with_reference_time(1_700_000_000_000);
        let prompt = request.render_prompt().unwrap();
        assert!(prompt.contains("Current time (epoch milliseconds): 1700000000000"));
    }

    #[test]
    fn schema_enumerates_new_priorities() {
        let schema = response_schema();
        let allowed = &schema["properties"]["prioritizedTasks"]["items"]["properties"]
            ["newPriority"]["enum"];
        assert_eq!(allowed.as_array().unwrap().len(), 4);
    }
}
