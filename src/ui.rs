//! Terminal output helpers. Everything here goes to stderr so stdout only
//! carries the model's answer.

use colored::*;

use crate::agent::Usage;
use crate::tools::ToolExecutionResult;

/// Longest tool output echoed to the terminal.
const MAX_TOOL_OUTPUT_CHARS: usize = 2000;

pub fn print_tool_result(result: &ToolExecutionResult) {
    let marker = if result.success {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    eprintln!("  {} {} {}", marker, result.tool_name.cyan(), result.id.dimmed());

    let content = truncate(&result.content(), MAX_TOOL_OUTPUT_CHARS);
    for line in content.lines() {
        eprintln!("    {}", line.dimmed());
    }
}

pub fn print_usage(model_calls: usize, usage: &Usage) {
    let info = format!(
        "{} model calls • {} prompt + {} completion = {} tokens",
        model_calls, usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    );
    eprintln!("  {} {}", "∴".magenta(), info.dimmed());
}

pub fn print_warning(msg: &str) {
    eprintln!("  {} {}", "⚠️ ".yellow().bold(), msg.yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("  {} {}", "❌".red().bold(), msg.red());
}

/// Cut `text` to at most `max` characters, marking the cut.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}… [truncated]", &text[..idx]),
        None => text.to_string(),
    }
}
