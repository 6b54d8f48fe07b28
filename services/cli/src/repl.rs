//! The interactive loop: read a line, resolve it against the suggestions on
//! screen, ask the tutor, render the answer.

use crate::{
    api_client::TutorApi,
    display::{self, Spinner},
    error::ClientError,
    input::{self, Action},
};
use anyhow::Result;
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::{debug, warn};
use tutor_core::lesson::StructuredResponse;

const PROMPT: &str = ">>> Your question: ";

/// Whether the loop should keep going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Client-side conversation state: the follow-up questions currently on
/// screen. Replaced after every successful answer, untouched on failure.
pub struct TutorSession<A> {
    api: A,
    follow_ups: Vec<String>,
}

impl<A: TutorApi> TutorSession<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            follow_ups: Vec::new(),
        }
    }

    pub fn follow_ups(&self) -> &[String] {
        &self.follow_ups
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Handles one line of input. Errors are rendered here and never end
    /// the loop.
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        let message = match input::resolve(line, &self.follow_ups) {
            Action::Exit => return Flow::Exit,
            Action::Skip => return Flow::Continue,
            Action::InvalidSelection => {
                display::print_invalid_option();
                return Flow::Continue;
            }
            Action::SelectFollowUp { index, question } => {
                debug!(index, "Follow-up question selected");
                display::print_selected(&question);
                question
            }
            Action::Ask(message) => message,
        };

        match self.ask(&message).await {
            Ok(response) => {
                display::print_response(&response);
                self.follow_ups = response.verification.follow_up_questions;
            }
            Err(err) if err.is_connectivity() => {
                warn!(error = %err, "Tutor API unreachable");
                display::print_connectivity_error(self.api.url());
            }
            Err(err) => {
                warn!(error = %err, "Tutor API request failed");
                display::print_error(&err.to_string());
            }
        }
        Flow::Continue
    }

    async fn ask(&self, message: &str) -> Result<StructuredResponse, ClientError> {
        let spinner = Spinner::start("Generating the explanation... please wait.");
        let result = self.api.ask(message).await;
        spinner.stop();
        result
    }
}

/// Runs the loop until an exit keyword, end of input or Ctrl-C.
pub async fn run<A: TutorApi>(api: A) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut session = TutorSession::new(api);

    display::print_banner();

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                display::print_farewell();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        let flow = tokio::select! {
            flow = session.handle_line(&line) => flow,
            _ = tokio::signal::ctrl_c() => Flow::Exit,
        };
        if flow == Flow::Exit {
            display::print_farewell();
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tutor_core::lesson::{ExplanationSection, Verification};

    /// Records every message and answers from a queue of canned results.
    struct FakeApi {
        sent: Mutex<Vec<String>>,
        replies: Mutex<VecDeque<Result<StructuredResponse, ClientError>>>,
    }

    impl FakeApi {
        fn new(replies: Vec<Result<StructuredResponse, ClientError>>) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                replies: Mutex::new(replies.into()),
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TutorApi for FakeApi {
        async fn ask(&self, message: &str) -> Result<StructuredResponse, ClientError> {
            self.sent.lock().unwrap().push(message.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Request("no reply scripted".to_string())))
        }

        fn url(&self) -> &str {
            "http://127.0.0.1:8000/chat"
        }
    }

    fn lesson(sections: usize, follow_ups: &[&str]) -> StructuredResponse {
        StructuredResponse {
            explanation: (0..sections)
                .map(|i| ExplanationSection {
                    title: format!("Section {i}"),
                    content: format!("Content {i}"),
                })
                .collect(),
            verification: Verification {
                summary_prompt: "Summarize what you learned.".to_string(),
                follow_up_questions: follow_ups.iter().map(|q| q.to_string()).collect(),
            },
        }
    }

    const FOLLOW_UPS: [&str; 3] = [
        "What is an object?",
        "What does a constructor do?",
        "How does inheritance work?",
    ];

    #[tokio::test]
    async fn test_question_then_numeric_selection() {
        let api = FakeApi::new(vec![Ok(lesson(6, &FOLLOW_UPS)), Ok(lesson(6, &[]))]);
        let mut session = TutorSession::new(api);

        assert_eq!(session.handle_line("What is a class?").await, Flow::Continue);
        assert_eq!(session.follow_ups(), FOLLOW_UPS);

        assert_eq!(session.handle_line("2").await, Flow::Continue);
        assert_eq!(
            session.api().sent(),
            vec!["What is a class?", "What does a constructor do?"]
        );
        assert!(session.follow_ups().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_selection_makes_no_call() {
        let api = FakeApi::new(vec![Ok(lesson(2, &FOLLOW_UPS))]);
        let mut session = TutorSession::new(api);
        session.handle_line("What is a class?").await;

        assert_eq!(session.handle_line("4").await, Flow::Continue);
        assert_eq!(session.handle_line("0").await, Flow::Continue);

        assert_eq!(session.api().sent().len(), 1);
        assert_eq!(session.follow_ups(), FOLLOW_UPS);
    }

    #[tokio::test]
    async fn test_exit_keywords_end_loop_without_calls() {
        for word in ["sair", "EXIT", "Quit"] {
            let mut session = TutorSession::new(FakeApi::new(vec![]));

            assert_eq!(session.handle_line(word).await, Flow::Exit);
            assert!(session.api().sent().is_empty());
        }
    }

    #[tokio::test]
    async fn test_connectivity_failure_keeps_follow_ups() {
        let api = FakeApi::new(vec![
            Ok(lesson(1, &FOLLOW_UPS)),
            Err(ClientError::Connectivity {
                url: "http://127.0.0.1:8000/chat".to_string(),
                reason: "connection refused".to_string(),
            }),
        ]);
        let mut session = TutorSession::new(api);
        session.handle_line("What is a class?").await;

        assert_eq!(session.handle_line("1").await, Flow::Continue);

        assert_eq!(session.follow_ups(), FOLLOW_UPS);
        assert_eq!(session.api().sent()[1], "What is an object?");
    }

    #[tokio::test]
    async fn test_service_error_keeps_state_and_continues() {
        let api = FakeApi::new(vec![
            Ok(lesson(1, &FOLLOW_UPS)),
            Err(ClientError::Service {
                status: StatusCode::BAD_GATEWAY,
                detail: "The model's reply was not valid JSON.".to_string(),
            }),
            Ok(lesson(1, &["Next?"])),
        ]);
        let mut session = TutorSession::new(api);
        session.handle_line("What is a class?").await;

        assert_eq!(session.handle_line("Tell me a joke").await, Flow::Continue);
        assert_eq!(session.follow_ups(), FOLLOW_UPS);

        session.handle_line("What is a record?").await;
        assert_eq!(session.follow_ups(), ["Next?"]);
    }

    #[tokio::test]
    async fn test_blank_line_is_ignored() {
        let mut session = TutorSession::new(FakeApi::new(vec![]));

        assert_eq!(session.handle_line("   ").await, Flow::Continue);
        assert!(session.api().sent().is_empty());
    }

    #[tokio::test]
    async fn test_numbers_are_plain_messages_before_any_answer() {
        let api = FakeApi::new(vec![Ok(lesson(1, &[]))]);
        let mut session = TutorSession::new(api);

        session.handle_line("42").await;

        assert_eq!(session.api().sent(), vec!["42"]);
    }
}
