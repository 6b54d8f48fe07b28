use console::{Color, Style, Term, measure_text_width, style};
use std::time::Duration;
use tokio::task::JoinHandle;
use tutor_core::lesson::{ExplanationSection, StructuredResponse, Verification};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Panel width for the current terminal, clamped to a readable range.
pub fn panel_width() -> usize {
    let term = Term::stdout();
    let terminal_width = term.size().1 as usize;
    std::cmp::min(terminal_width.saturating_sub(4), 100).max(50)
}

/// Splits a word wider than `max` columns into pieces that fit.
fn split_long_word(word: &str, max: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        let mut buf = [0u8; 4];
        let ch_width = measure_text_width(ch.encode_utf8(&mut buf));
        if !current.is_empty() && measure_text_width(&current) + ch_width > max {
            pieces.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Shortens `title` to at most `max` columns, ending it with an ellipsis when cut.
fn fit_title(title: &str, max: usize) -> String {
    if measure_text_width(title) <= max {
        return title.to_string();
    }
    let mut fitted = String::new();
    for ch in title.chars() {
        let mut buf = [0u8; 4];
        let ch_width = measure_text_width(ch.encode_utf8(&mut buf));
        if measure_text_width(&fitted) + ch_width + 1 > max {
            break;
        }
        fitted.push(ch);
    }
    if max > 0 {
        fitted.push('…');
    }
    fitted
}

/// Wraps text to `width` columns at word boundaries.
///
/// Blank lines are kept and each line's indentation is repeated on its
/// continuation lines, so code samples keep their shape.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim_end().replace('\t', "    ");
        if line.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let indent_len = line.len() - line.trim_start().len();
        let indent = if measure_text_width(&line[..indent_len]) * 2 < width {
            line[..indent_len].to_string()
        } else {
            String::new()
        };
        let available = width.saturating_sub(measure_text_width(&indent)).max(1);

        let mut current = indent.clone();
        let mut has_word = false;
        for word in line.split_whitespace() {
            for piece in split_long_word(word, available) {
                let needed = measure_text_width(&piece) + usize::from(has_word);
                if has_word && measure_text_width(&current) + needed > width {
                    lines.push(std::mem::replace(&mut current, indent.clone()));
                    has_word = false;
                }
                if has_word {
                    current.push(' ');
                }
                current.push_str(&piece);
                has_word = true;
            }
        }
        lines.push(current);
    }

    lines
}

/// Draws a bordered box of `width` columns with the title in the top border.
pub fn render_panel(title: &str, body: &str, width: usize, border: Color, body_style: &Style) -> String {
    let border_style = Style::new().fg(border);
    let inner = width.saturating_sub(4);

    // "┌─ " + title + " " + "┐" must fit, so the title gets at most width - 5 columns.
    let title = fit_title(title, width.saturating_sub(5));
    let title_width = measure_text_width(&title);
    let top = format!(
        "{}{}{}",
        border_style.apply_to("┌─ "),
        style(&title).bold(),
        border_style.apply_to(format!(
            " {}┐",
            "─".repeat(width.saturating_sub(title_width + 5))
        )),
    );
    let bottom = border_style.apply_to(format!("└{}┘", "─".repeat(width.saturating_sub(2))));

    let mut out = vec![top];
    for line in wrap_text(body, inner) {
        let padding = inner.saturating_sub(measure_text_width(&line));
        out.push(format!(
            "{} {}{} {}",
            border_style.apply_to("│"),
            body_style.apply_to(&line),
            " ".repeat(padding),
            border_style.apply_to("│"),
        ));
    }
    out.push(bottom.to_string());
    out.join("\n")
}

/// One panel per explanation section, in order, alternating border colours.
pub fn render_sections(sections: &[ExplanationSection], width: usize) -> Vec<String> {
    sections
        .iter()
        .enumerate()
        .map(|(i, section)| {
            let border = if i % 2 == 0 { Color::Blue } else { Color::Magenta };
            render_panel(
                &section.title.to_uppercase(),
                &section.content,
                width,
                border,
                &Style::new(),
            )
        })
        .collect()
}

pub fn render_verification(verification: &Verification, width: usize) -> String {
    render_panel(
        "LEARNING CHECK",
        &verification.summary_prompt,
        width,
        Color::Yellow,
        &Style::new().italic(),
    )
}

/// Numbered suggestions, starting at 1.
pub fn render_follow_ups(questions: &[String]) -> Vec<String> {
    questions
        .iter()
        .enumerate()
        .map(|(i, question)| format!("{}. {}", i + 1, question))
        .collect()
}

pub fn print_response(response: &StructuredResponse) {
    let width = panel_width();
    for panel in render_sections(&response.explanation, width) {
        println!("{}", panel);
    }
    println!("{}", render_verification(&response.verification, width));

    let suggestions = render_follow_ups(&response.verification.follow_up_questions);
    if !suggestions.is_empty() {
        println!(
            "\n{}",
            style("Suggestions to continue the conversation:").bold().green()
        );
        for line in suggestions {
            println!("{}", line);
        }
    }
}

pub fn print_banner() {
    let body = "Type your question, or 'exit' to quit.\n\
                When suggestions are shown, type a suggestion's number to ask it.";
    println!(
        "{}",
        render_panel(
            "TEACHING ASSISTANT",
            body,
            panel_width(),
            Color::Green,
            &Style::new(),
        )
    );
}

pub fn print_selected(question: &str) {
    println!("\n{}", style(format!("You selected: '{}'", question)).italic());
}

pub fn print_invalid_option() {
    println!(
        "\n{}",
        style("Invalid option. Please type a new question.").yellow()
    );
}

pub fn print_connectivity_error(url: &str) {
    println!(
        "\n{} Could not connect to the API server at {}.",
        style("Connection error:").bold().red(),
        url
    );
    println!("Please make sure the API server is running in another terminal.");
}

pub fn print_error(message: &str) {
    println!(
        "\n{} {}",
        style("An unexpected error occurred:").bold().red(),
        message
    );
}

pub fn print_farewell() {
    println!("\n{} 👋", style("See you next time!").bold());
}

/// A busy indicator on stderr, animated only when stderr is a terminal.
pub struct Spinner {
    term: Term,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    pub fn start(message: &str) -> Self {
        let term = Term::stderr();
        if !term.is_term() {
            return Self { term, handle: None };
        }

        let message = style(message.to_string()).bold().green().to_string();
        let out = term.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(80));
            for frame in SPINNER_FRAMES.iter().cycle() {
                ticker.tick().await;
                let _ = out.clear_line();
                let _ = out.write_str(&format!("{} {}", frame, message));
            }
        });
        Self {
            term,
            handle: Some(handle),
        }
    }

    pub fn stop(mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = self.term.clear_line();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.clear();
    }
}
