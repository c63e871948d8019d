//! Terminal rendering for turns, events and saved threads

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use wayfarer_core::orchestration::{Conversation, Message};
use wayfarer_core::session::{AgentEvent, AgentOutput};

/// Spinner shown while a turn runs
pub fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message("Planning your trip...");
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Reflect one agent event on the spinner
pub fn event(bar: &ProgressBar, event: AgentEvent) {
    match event {
        AgentEvent::ModelCall { iteration } => {
            if iteration == 1 {
                bar.set_message("Thinking...");
            } else {
                bar.set_message("Reviewing results...");
            }
        }
        AgentEvent::ToolStarted { name, .. } => {
            bar.set_message(format!("Running {}...", name));
        }
        AgentEvent::ToolFinished { name, success, .. } => {
            if success {
                bar.println(format!("  {} {}", style("✓").green(), style(format!("{} completed", name)).dim()));
            } else {
                bar.println(format!("  {} {}", style("✗").red(), style(format!("{} failed", name)).dim()));
            }
        }
        AgentEvent::FallbackTriggered { failed_tools, failures } => {
            bar.println(format!(
                "  {} {}",
                style("!").yellow().bold(),
                style(format!(
                    "Tools failed {} times ({}), writing a best-effort plan",
                    failures,
                    failed_tools.join(", ")
                ))
                .yellow()
            ));
            bar.set_message("Writing fallback plan...");
        }
        AgentEvent::FinalAnswer { .. } => {}
    }
}

/// Print the final answer of a turn, with a warning when tools degraded it
pub fn answer(output: &AgentOutput) {
    println!();
    println!("{}", style("Wayfarer").bold().green());
    println!("{}", output.final_text());
    println!();

    if !output.degraded_tools().is_empty() {
        println!(
            "{}",
            style("⚠ Some information could not be retrieved. The plan includes alternative suggestions.").yellow()
        );
        println!();
    }
}

/// One-line summary of a saved thread
pub fn thread_summary(conversation: &Conversation) {
    let request = conversation.first_human_content().unwrap_or("(empty)");
    println!(
        "  {} {:<38} {} {}",
        style("•").cyan(),
        style(&conversation.thread_id).bold(),
        style(conversation.updated_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")).dim(),
        style(format!("{} messages", conversation.len())).dim()
    );
    println!("    {}", preview(request, 90));
}

/// Print a thread's full history
pub fn transcript(conversation: &Conversation) {
    for message in conversation.messages() {
        match message {
            Message::System { content } => {
                println!("{}: {}", style("System").bold().dim(), content);
            }
            Message::Human { content } => {
                println!("{}: {}", style("You").bold().cyan(), content);
            }
            Message::Assistant { content, tool_calls } => {
                for call in tool_calls {
                    let args = serde_json::to_string(&call.arguments).unwrap_or_default();
                    println!("  {} {}({})", style("[Tool call]").dim(), style(&call.name).yellow(), preview(&args, 80));
                }
                if !content.is_empty() {
                    println!("{}: {}", style("Wayfarer").bold().green(), content);
                }
            }
            Message::ToolResult { name, content, .. } => {
                println!("  {} {}", style(format!("[{} result]", name)).dim(), style(preview(content, 80)).dim());
            }
        }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > max_chars || text.lines().nth(1).is_some() {
        let cut: String = line.chars().take(max_chars).collect();
        format!("{}…", cut)
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_and_multiline_text() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdefghij", 4), "abcd…");
        assert_eq!(preview("first\nsecond", 20), "first…");
    }
}
