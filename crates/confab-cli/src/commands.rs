//! Slash commands for interactive mode

use confab_chat::Session;
use confab_gateway::Provider;

/// Result of executing a slash command
pub enum CommandResult {
    /// Show a message to the user (not sent to the gateway)
    Message(String),
    /// Clear the conversation
    Clear,
    /// Switch to a provider
    ChangeProvider(Provider),
    /// Open the provider selector popup (TUI only)
    OpenProviderSelector,
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(input: &str, session: &Session) -> Option<CommandResult> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = input[1..].splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "clear" | "c" => CommandResult::Clear,

        "quit" | "exit" | "q" => CommandResult::Exit,

        "provider" | "p" => provider_command(args, session),

        "session" | "s" => CommandResult::Message(session_info(session)),

        _ => CommandResult::Unknown(command),
    })
}

fn provider_command(args: &str, session: &Session) -> CommandResult {
    if args.is_empty() {
        return CommandResult::OpenProviderSelector;
    }

    let needle = args.to_lowercase();
    let matched = Provider::ALL
        .iter()
        .copied()
        .find(|p| p.id() == needle || p.label().to_lowercase().contains(&needle));

    match matched {
        Some(provider) if provider == session.provider() => {
            CommandResult::Message(format!("Already using {}", provider.label()))
        }
        Some(provider) => CommandResult::ChangeProvider(provider),
        None => CommandResult::Message(format!(
            "No provider matching '{}'.\n\n{}",
            args,
            list_providers(session)
        )),
    }
}

fn list_providers(session: &Session) -> String {
    let mut out = String::from("Available providers:\n");
    for provider in Provider::ALL {
        let marker = if provider == session.provider() {
            "*"
        } else {
            " "
        };
        out.push_str(&format!(
            "  {} {:<8} {}\n",
            marker,
            provider.id(),
            provider.label()
        ));
    }
    out.push_str("\nSwitching providers clears the conversation.");
    out
}

fn session_info(session: &Session) -> String {
    let transcript = session.transcript();
    format!(
        "Provider: {}\nTurns: {}\nContinuation token: {}\nStarted: {}",
        session.provider().label(),
        transcript.len(),
        if session.last_message_id().is_some() {
            "captured"
        } else {
            "none"
        },
        session.created_at().format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /provider, /p [id]   Open the provider selector, or switch directly
  /session, /s         Show session info
  /clear, /c           Clear conversation history
  /quit, /exit, /q     Exit confab

Examples:
  /provider            Pick a provider (also Ctrl+P)
  /provider bai        Switch to BAI (clears the conversation)
  /clear               Start fresh with the same provider"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_switch_by_id() {
        let session = Session::new(Provider::DeepAi);
        let result = execute_command("/provider bai", &session);
        assert!(matches!(
            result,
            Some(CommandResult::ChangeProvider(Provider::Bai))
        ));
    }

    #[test]
    fn test_provider_without_args_opens_selector() {
        let session = Session::new(Provider::DeepAi);
        assert!(matches!(
            execute_command("/provider", &session),
            Some(CommandResult::OpenProviderSelector)
        ));
    }

    #[test]
    fn test_non_command_passes_through() {
        let session = Session::new(Provider::DeepAi);
        assert!(execute_command("hello there", &session).is_none());
    }

    #[test]
    fn test_unknown_command() {
        let session = Session::new(Provider::DeepAi);
        assert!(matches!(
            execute_command("/frobnicate", &session),
            Some(CommandResult::Unknown(cmd)) if cmd == "frobnicate"
        ));
    }
}
