mod command_registry;
mod intent_parser;
mod log;

pub use command_registry::CHAT_HELP_COMMANDS;
pub use intent_parser::{parse_intent, Intent};
pub use log::{format_transcript, ChatLog, ChatMessage, ChatRole};
