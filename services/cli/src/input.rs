/// Words that end the session, compared case-insensitively.
pub const EXIT_KEYWORDS: [&str; 3] = ["sair", "exit", "quit"];

/// What one line of user input asks the client to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Exit,
    /// Blank line; prompt again.
    Skip,
    /// Send this message to the tutor.
    Ask(String),
    /// Send a previously suggested follow-up question, chosen by its 1-based number.
    SelectFollowUp { index: usize, question: String },
    /// A number that does not match any displayed follow-up question.
    InvalidSelection,
}

/// Decides what to do with `line` given the follow-up questions on screen.
///
/// Numbers are only treated as selections while suggestions are displayed;
/// otherwise they are sent as ordinary messages.
/// Surrounding whitespace is dropped from whatever is sent.
pub fn resolve(line: &str, follow_ups: &[String]) -> Action {
    let input = line.trim();
    if input.is_empty() {
        return Action::Skip;
    }
    if EXIT_KEYWORDS
        .iter()
        .any(|keyword| input.eq_ignore_ascii_case(keyword))
    {
        return Action::Exit;
    }

    let numeric = input.chars().all(|c| c.is_ascii_digit());
    if numeric && !follow_ups.is_empty() {
        return match input.parse::<usize>() {
            Ok(index) if (1..=follow_ups.len()).contains(&index) => Action::SelectFollowUp {
                index,
                question: follow_ups[index - 1].clone(),
            },
            _ => Action::InvalidSelection,
        };
    }

    Action::Ask(input.to_string())
}
