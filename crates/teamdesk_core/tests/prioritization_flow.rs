use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use teamdesk_core::model::prioritized::NewPriority;
use teamdesk_core::model::task::{Task, TaskPriority, TaskStatus};
use teamdesk_core::model::user::{User, UserRole};
use teamdesk_core::prioritize::{
    GenerationError, GenerationResult, GenerationService, InvalidResponseError,
    PrioritizationRequest, PrioritizeError, Prioritizer,
};

const DAY_MS: i64 = 86_400_000;
const NOW_MS: i64 = 1_700_000_000_000;

type Reply = dyn Fn(&PrioritizationRequest) -> GenerationResult<String> + Send + Sync;

/// Generation service double that records calls and replies from a script.
struct ScriptedGenerator {
    reply: Box<Reply>,
    calls: AtomicUsize,
    last_request: Mutex<Option<PrioritizationRequest>>,
}

impl ScriptedGenerator {
    fn new(
        reply: impl Fn(&PrioritizationRequest) -> GenerationResult<String> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(reply),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &PrioritizationRequest) -> GenerationResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        (self.reply)(request)
    }
}

/// Echoes every submitted task with the given priority.
fn echo_all(
    new_priority: &'static str,
) -> impl Fn(&PrioritizationRequest) -> GenerationResult<String> + Send + Sync + 'static {
    move |request| {
        let elements: Vec<Value> = request
            .tasks
            .iter()
            .map(|task| {
                let mut element = serde_json::to_value(task).unwrap();
                element["justification"] = json!("Deadline is close and the work is blocking.");
                element["newPriority"] = json!(new_priority);
                element
            })
            .collect();
        Ok(json!({ "prioritizedTasks": elements }).to_string())
    }
}

fn open_task_inputs() -> (Vec<Task>, Vec<User>) {
    let mut task = Task::with_id("T1", "Ship onboarding flow", "P1", "E1");
    task.status = TaskStatus::Todo;
    task.priority = TaskPriority::High;
    task.assignee_id = Some("E1".to_string());
    task.due_date = Some(NOW_MS + 2 * DAY_MS);
    task.created_at = NOW_MS - DAY_MS;
    task.updated_at = NOW_MS - DAY_MS;
    let manager = User::with_id("E1", "manager@example.com", UserRole::Manager);
    (vec![task], vec![manager])
}

#[tokio::test]
async fn critical_suggestion_for_open_task_is_accepted() {
    let (tasks, employees) = open_task_inputs();
    let generator = ScriptedGenerator::new(echo_all("critical"));
    let prioritizer = Prioritizer::new(generator.clone());

    let result = prioritizer
        .prioritize_at(&tasks, &employees, NOW_MS)
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].task, tasks[0]);
    assert_eq!(result[0].new_priority, NewPriority::Critical);
    assert!(!result[0].justification.trim().is_empty());
    assert_eq!(result[0].new_priority.to_task_priority(), TaskPriority::High);

    let request = generator.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.tasks, tasks);
    assert_eq!(request.reference_time, Some(NOW_MS));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn only_done_tasks_never_reach_the_service() {
    let mut done = Task::with_id("T2", "Archive logs", "P1", "E1");
    done.status = TaskStatus::Done;

    let generator = ScriptedGenerator::new(echo_all("low"));
    let prioritizer = Prioritizer::new(generator.clone());
    let result = prioritizer.prioritize(&[done], &[]).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn unknown_priority_rejects_whole_response() {
    let (mut tasks, employees) = open_task_inputs();
    tasks.push(Task::with_id("T3", "Write docs", "P1", "E1"));

    let generator = ScriptedGenerator::new(echo_all("urgent"));
    let prioritizer = Prioritizer::new(generator);
    let err = prioritizer.prioritize(&tasks, &employees).await.unwrap_err();

    assert_eq!(
        err,
        PrioritizeError::InvalidResponse(InvalidResponseError::InvalidPriority {
            index: 0,
            value: "urgent".to_string(),
        })
    );
}

#[tokio::test]
async fn service_failure_surfaces_generation_error() {
    let (tasks, employees) = open_task_inputs();
    let generator = ScriptedGenerator::new(|_| {
        Err(GenerationError::Timeout {
            message: "deadline elapsed".to_string(),
        })
    });
    let prioritizer = Prioritizer::new(generator.clone());
    let err = prioritizer.prioritize(&tasks, &employees).await.unwrap_err();

    assert!(matches!(
        err,
        PrioritizeError::Generation(GenerationError::Timeout { .. })
    ));
    assert!(err.to_string().contains("timed out"));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn done_tasks_are_filtered_and_cannot_be_echoed_back() {
    let (mut tasks, employees) = open_task_inputs();
    let mut done = Task::with_id("T9", "Old work", "P1", "E1");
    done.status = TaskStatus::Done;
    tasks.push(done.clone());

    let sneaky = move |request: &PrioritizationRequest| -> GenerationResult<String> {
        let mut elements: Vec<Value> = Vec::new();
        for task in request.tasks.iter().chain(std::iter::once(&done)) {
            let mut element = serde_json::to_value(task).unwrap();
            element["justification"] = json!("Reason");
            element["newPriority"] = json!("low");
            elements.push(element);
        }
        Ok(json!({ "prioritizedTasks": elements }).to_string())
    };
    let prioritizer = Prioritizer::new(ScriptedGenerator::new(sneaky));
    let err = prioritizer.prioritize(&tasks, &employees).await.unwrap_err();

    assert!(matches!(
        err,
        PrioritizeError::InvalidResponse(InvalidResponseError::UnknownTask { index: 1, .. })
    ));
}

#[tokio::test]
async fn altered_task_fields_are_rejected() {
    let (tasks, employees) = open_task_inputs();
    let rewrite_title = |request: &PrioritizationRequest| -> GenerationResult<String> {
        let mut element = serde_json::to_value(&request.tasks[0]).unwrap();
        element["title"] = json!("Something else");
        element["justification"] = json!("Reason");
        element["newPriority"] = json!("high");
        Ok(json!({ "prioritizedTasks": [element] }).to_string())
    };
    let prioritizer = Prioritizer::new(ScriptedGenerator::new(rewrite_title));
    let err = prioritizer.prioritize(&tasks, &employees).await.unwrap_err();

    assert!(matches!(
        err,
        PrioritizeError::InvalidResponse(InvalidResponseError::AlteredTask { .. })
    ));
}

#[test]
fn identical_input_renders_identical_prompt() {
    let (tasks, employees) = open_task_inputs();
    let first = PrioritizationRequest::build(&tasks, &employees)
        .with_reference_time(NOW_MS)
        .render_prompt()
        .unwrap();
    let second = PrioritizationRequest::build(&tasks, &employees)
        .with_reference_time(NOW_MS)
        .render_prompt()
        .unwrap();
    assert_eq!(first, second);
}
