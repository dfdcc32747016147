use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, NO_ARG_COMMANDS, SINGLE_PATH_COMMANDS, VALUE_ARG_COMMANDS,
    VARIANT_SHORTCUT_COMMANDS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub question: Option<String>,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            question: None,
            command_args: BTreeMap::new(),
        }
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.command_args
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_single_path_arg(arg: &str) -> String {
    if arg.trim().is_empty() {
        return String::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect::<Vec<String>>()
            .join(" "),
        Err(_) => arg.trim().to_string(),
    }
}

/// Classifies one line of REPL input.
///
/// Slash commands map to actions; anything else is a chat question
/// (`ask`). Blank input is `noop`.
pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop");
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(action) = find_action(&command, VALUE_ARG_COMMANDS) {
                let mut intent = Intent::new(action);
                intent
                    .command_args
                    .insert("value".to_string(), Value::String(arg.to_string()));
                return intent;
            }

            if VARIANT_SHORTCUT_COMMANDS
                .iter()
                .any(|value| *value == command)
            {
                let mut intent = Intent::new("set_variant");
                intent
                    .command_args
                    .insert("value".to_string(), Value::String(command));
                return intent;
            }

            if let Some(action) = find_action(&command, SINGLE_PATH_COMMANDS) {
                let mut intent = Intent::new(action);
                intent.command_args.insert(
                    "path".to_string(),
                    Value::String(parse_single_path_arg(arg)),
                );
                return intent;
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return Intent::new(action);
            }

            let mut intent = Intent::new("unknown");
            intent
                .command_args
                .insert("command".to_string(), Value::String(command));
            intent
                .command_args
                .insert("arg".to_string(), Value::String(arg.to_string()));
            return intent;
        }
    }

    let mut intent = Intent::new("ask");
    intent.question = Some(raw_trimmed.to_string());
    intent
}
