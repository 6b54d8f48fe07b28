pub mod history;
pub mod lesson;
pub mod llm_client;
pub mod prompt;
pub mod reply;
pub mod tutor;
