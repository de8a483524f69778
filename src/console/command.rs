//! Command metadata rendered by the text descriptor.

/// A positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub default: Option<String>,
}

impl InputArgument {
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, description)
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// `<name>` or `[<name>]`.
    pub fn synopsis(&self) -> String {
        if self.required {
            format!("<{}>", self.name)
        } else {
            format!("[<{}>]", self.name)
        }
    }
}

/// A `--long` option with an optional one-letter shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputOption {
    /// Long name without the leading dashes.
    pub name: String,
    pub shortcut: Option<char>,
    pub description: String,
    /// Whether the option takes a value.
    pub accepts_value: bool,
    pub default: Option<String>,
}

impl InputOption {
    /// A boolean flag.
    pub fn flag(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shortcut: None,
            description: description.into(),
            accepts_value: false,
            default: None,
        }
    }

    /// An option taking a value.
    pub fn value(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            accepts_value: true,
            ..Self::flag(name, description)
        }
    }

    pub fn with_shortcut(mut self, shortcut: char) -> Self {
        self.shortcut = Some(shortcut);
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    fn value_placeholder(&self) -> String {
        self.name.to_uppercase().replace('-', "_")
    }

    /// Column text in option listings, e.g. `-p, --page=PAGE`.
    pub fn display_name(&self) -> String {
        let shortcut = match self.shortcut {
            Some(c) => format!("-{}, ", c),
            None => "    ".to_string(),
        };
        let value = if self.accepts_value {
            format!("={}", self.value_placeholder())
        } else {
            String::new()
        };
        format!("{}--{}{}", shortcut, self.name, value)
    }

    /// Usage-line form, e.g. `[-p|--page PAGE]`.
    pub fn synopsis(&self) -> String {
        let shortcut = self
            .shortcut
            .map(|c| format!("-{}|", c))
            .unwrap_or_default();
        let value = if self.accepts_value {
            format!(" {}", self.value_placeholder())
        } else {
            String::new()
        };
        format!("[{}--{}{}]", shortcut, self.name, value)
    }
}

/// Arguments and options a command (or the application) accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputDefinition {
    pub arguments: Vec<InputArgument>,
    pub options: Vec<InputOption>,
}

impl InputDefinition {
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty() && self.options.is_empty()
    }

    /// Only the options of this definition.
    pub fn options_only(&self) -> Self {
        Self {
            arguments: Vec::new(),
            options: self.options.clone(),
        }
    }
}

/// Description of one console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    /// Full name, optionally namespaced as `namespace:name`.
    pub name: String,
    pub aliases: Vec<String>,
    pub description: String,
    /// Long help; `%command.name%` is replaced by the command name.
    pub help: String,
    pub definition: InputDefinition,
    pub hidden: bool,
}

impl CommandInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: description.into(),
            help: String::new(),
            definition: InputDefinition::default(),
            hidden: false,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn with_argument(mut self, argument: InputArgument) -> Self {
        self.definition.arguments.push(argument);
        self
    }

    pub fn with_option(mut self, option: InputOption) -> Self {
        self.definition.options.push(option);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Namespace part of the name (before the first `:`).
    pub fn namespace(&self) -> Option<&str> {
        namespace_of(&self.name)
    }

    /// Usage line. The short form collapses options into `[options]`.
    pub fn synopsis(&self, short: bool) -> String {
        let mut parts = vec![self.name.clone()];

        if short {
            if !self.definition.options.is_empty() {
                parts.push("[options]".to_string());
            }
        } else {
            parts.extend(self.definition.options.iter().map(InputOption::synopsis));
        }
        parts.extend(self.definition.arguments.iter().map(InputArgument::synopsis));

        parts.join(" ")
    }

    /// Help text with placeholders substituted.
    pub fn processed_help(&self) -> String {
        let help = if self.help.is_empty() {
            &self.description
        } else {
            &self.help
        };
        help.replace("%command.name%", &self.name)
    }

    fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| alias == name)
    }
}

/// An application: its global options and commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationInfo {
    pub name: String,
    pub version: String,
    pub definition: InputDefinition,
    pub commands: Vec<CommandInfo>,
}

impl ApplicationInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_option(mut self, option: InputOption) -> Self {
        self.definition.options.push(option);
        self
    }

    pub fn with_command(mut self, command: CommandInfo) -> Self {
        self.commands.push(command);
        self
    }

    /// `name <info>version</info>`, or empty when the application is unnamed.
    pub fn long_version(&self) -> String {
        match (self.name.is_empty(), self.version.is_empty()) {
            (true, _) => String::new(),
            (false, true) => self.name.clone(),
            (false, false) => format!("{} <info>{}</info>", self.name, self.version),
        }
    }

    /// Look up a command by name or alias.
    pub fn find(&self, name: &str) -> Option<&CommandInfo> {
        self.commands.iter().find(|command| command.answers_to(name))
    }
}

pub(crate) fn namespace_of(name: &str) -> Option<&str> {
    name.split_once(':').map(|(namespace, _)| namespace)
}
