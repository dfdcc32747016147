#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const VALUE_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "threshold",
        action: "set_threshold",
    },
    CommandSpec {
        command: "variant",
        action: "set_variant",
    },
    CommandSpec {
        command: "key",
        action: "set_key",
    },
];

pub(crate) const VARIANT_SHORTCUT_COMMANDS: &[&str] = &["fast", "deep"];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "media",
        action: "set_media",
    },
    CommandSpec {
        command: "export",
        action: "export",
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "analyze",
        action: "analyze",
    },
    CommandSpec {
        command: "timeline",
        action: "timeline",
    },
    CommandSpec {
        command: "context",
        action: "context",
    },
    CommandSpec {
        command: "forget_key",
        action: "forget_key",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/media <path>",
    "/analyze",
    "/timeline",
    "/context",
    "/threshold <0..1>",
    "/variant fast|deep",
    "/fast",
    "/deep",
    "/key <credential>",
    "/forget_key",
    "/export <path>",
    "/help",
    "/quit",
];
