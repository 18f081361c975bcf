//! Process-local tools: TodoWrite and AskUser.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::params::Params;
use crate::error::{ToolError, ToolOutcome};
use crate::permissions::SharedInput;
use crate::types::ToolResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub content: String,
    pub status: TodoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// The executor's todo list. Replaced wholesale on every write.
#[derive(Debug, Default)]
pub struct TodoList {
    items: Mutex<Vec<TodoItem>>,
}

impl TodoList {
    /// Returns a copy of the current list.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TodoItem> {
        self.items.lock().map(|items| items.clone()).unwrap_or_default()
    }

    fn replace(&self, todos: Vec<TodoItem>) -> ToolOutcome<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| ToolError::internal("todo list lock poisoned"))?;
        *items = todos;
        Ok(())
    }
}

pub fn todo_write(list: &TodoList, params: Params<'_>) -> ToolOutcome<ToolResult> {
    let raw = params.raw("todos").ok_or_else(|| ToolError::missing("todos"))?;
    let todos: Vec<TodoItem> =
        serde_json::from_value(raw.clone()).map_err(|e| ToolError::invalid("todos", e.to_string()))?;

    let count = |status| todos.iter().filter(|t| t.status == status).count();
    let payload = json!({
        "todos": todos,
        "total": todos.len(),
        "pending": count(TodoStatus::Pending),
        "in_progress": count(TodoStatus::InProgress),
        "completed": count(TodoStatus::Completed),
    });

    list.replace(todos)?;
    ToolResult::success(payload)
}

/// Maps a numeric answer in `1..=options.len()` to its option.
#[must_use]
pub fn resolve_answer(answer: &str, options: &[String]) -> (String, Option<usize>) {
    let trimmed = answer.trim();
    match trimmed.parse::<usize>() {
        Ok(n) if (1..=options.len()).contains(&n) => (options[n - 1].clone(), Some(n - 1)),
        _ => (trimmed.to_string(), None),
    }
}

pub async fn ask_user(input: &SharedInput, params: Params<'_>) -> ToolOutcome<ToolResult> {
    let question = params.str("question")?;
    let options = params.opt_str_list("options")?.unwrap_or_default();

    let mut message = question.to_string();
    for (i, option) in options.iter().enumerate() {
        message.push_str(&format!("\n  {}. {option}", i + 1));
    }

    let answer = input
        .ask(Some(message), "> ".to_string())
        .await
        .map_err(|e| ToolError::internal(format!("failed to read answer: {e}")))?;

    let Some(answer) = answer else {
        return Ok(ToolResult::failure("No answer received (end of input)"));
    };

    let (resolved, index) = resolve_answer(&answer, &options);
    ToolResult::success(json!({
        "question": question,
        "answer": resolved,
        "option_index": index,
    }))
}
