//! Plain-text rendering of applications and commands.

use std::io;

use super::command::{ApplicationInfo, CommandInfo, InputArgument, InputDefinition, InputOption};
use super::description::{ApplicationDescription, GLOBAL_NAMESPACE};
use super::output::{strip_tags, OutputSink};

/// Rendering options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorOptions {
    /// Only list commands of this namespace.
    pub namespace: Option<String>,
    /// Strip style tags before writing.
    pub raw_text: bool,
    /// Ask the sink not to decorate.
    pub raw_output: bool,
}

/// Width of the name column for `commands`: the longest name or alias
/// plus two, or zero when there is nothing to list.
pub fn column_width<'a, I>(commands: I) -> usize
where
    I: IntoIterator<Item = &'a CommandInfo>,
{
    commands
        .into_iter()
        .flat_map(|command| std::iter::once(&command.name).chain(command.aliases.iter()))
        .map(|name| name.chars().count() + 2)
        .max()
        .unwrap_or(0)
}

/// Text descriptor writing to an [`OutputSink`].
pub struct TextDescriptor<'a> {
    output: &'a mut dyn OutputSink,
    options: DescriptorOptions,
}

impl<'a> TextDescriptor<'a> {
    pub fn new(output: &'a mut dyn OutputSink, options: DescriptorOptions) -> Self {
        Self { output, options }
    }

    /// Render the command listing of `app`.
    pub fn describe_application(&mut self, app: &ApplicationInfo) -> io::Result<()> {
        let namespace = self.options.namespace.clone();
        let description = ApplicationDescription::new(app, namespace.as_deref());

        let long_version = app.long_version();
        if !long_version.is_empty() {
            self.write_text(&long_version)?;
            self.write_text("\n\n")?;
        }

        self.write_text("<comment>Usage:</comment>\n")?;
        self.write_text("  command [options] [arguments]\n\n")?;
        self.describe_input_definition(&app.definition.options_only())?;
        self.write_text("\n\n")?;

        // Rows are real command names, plus aliases when a namespace is
        // being described.
        let rows: Vec<(&str, &CommandInfo)> = description
            .namespaces()
            .iter()
            .flat_map(|ns| ns.commands.iter())
            .filter_map(|name| {
                let command = description.command(name)?;
                (namespace.is_some() || description.commands().contains_key(name))
                    .then_some((name.as_str(), command))
            })
            .collect();
        let width = column_width(rows.iter().map(|(_, command)| *command));

        match &namespace {
            Some(ns) => self.write_text(&format!(
                "<comment>Available commands for the \"{}\" namespace:</comment>",
                ns
            ))?,
            None => self.write_text("<comment>Available commands:</comment>")?,
        }

        for ns in description.namespaces() {
            let listed: Vec<&(&str, &CommandInfo)> = rows
                .iter()
                .filter(|(name, _)| ns.commands.iter().any(|c| c == name))
                .collect();
            if listed.is_empty() {
                continue;
            }

            if namespace.is_none() && ns.id != GLOBAL_NAMESPACE {
                self.write_text("\n")?;
                self.write_text(&format!(" <comment>{}</comment>", ns.id))?;
            }

            for (name, command) in listed {
                let padding = width.saturating_sub(name.chars().count());
                let aliases = if *name == command.name {
                    aliases_text(command)
                } else {
                    String::new()
                };
                self.write_text("\n")?;
                self.write_text(&format!(
                    "  <info>{}</info>{}{}{}",
                    name,
                    " ".repeat(padding),
                    aliases,
                    command.description
                ))?;
            }
        }

        self.write_text("\n")
    }

    /// Render usage and help of one command.
    pub fn describe_command(&mut self, command: &CommandInfo) -> io::Result<()> {
        self.write_text("<comment>Usage:</comment>")?;
        let usages = std::iter::once(command.synopsis(true)).chain(command.aliases.iter().cloned());
        for usage in usages {
            self.write_text("\n")?;
            self.write_text(&format!("  {}", usage))?;
        }
        self.write_text("\n")?;

        if !command.definition.is_empty() {
            self.write_text("\n")?;
            self.describe_input_definition(&command.definition)?;
            self.write_text("\n")?;
        }

        let help = command.processed_help();
        if !help.is_empty() {
            self.write_text("\n")?;
            self.write_text("<comment>Help:</comment>")?;
            self.write_text("\n")?;
            self.write_text(&format!("  {}", help.replace('\n', "\n  ")))?;
            self.write_text("\n")?;
        }

        Ok(())
    }

    fn describe_input_definition(&mut self, definition: &InputDefinition) -> io::Result<()> {
        let total_width = definition
            .options
            .iter()
            .map(|option| option.display_name().chars().count())
            .chain(definition.arguments.iter().map(|a| a.name.chars().count()))
            .max()
            .unwrap_or(0);

        if !definition.arguments.is_empty() {
            self.write_text("<comment>Arguments:</comment>")?;
            self.write_text("\n")?;
            for argument in &definition.arguments {
                self.describe_argument(argument, total_width)?;
                self.write_text("\n")?;
            }
        }

        if !definition.arguments.is_empty() && !definition.options.is_empty() {
            self.write_text("\n")?;
        }

        if !definition.options.is_empty() {
            self.write_text("<comment>Options:</comment>")?;
            for option in &definition.options {
                self.write_text("\n")?;
                self.describe_option(option, total_width)?;
            }
        }

        Ok(())
    }

    fn describe_argument(
        &mut self,
        argument: &InputArgument,
        total_width: usize,
    ) -> io::Result<()> {
        let padding = total_width.saturating_sub(argument.name.chars().count());
        let default = match &argument.default {
            Some(value) if !argument.required => {
                format!(" <comment>[default: \"{}\"]</comment>", value)
            }
            _ => String::new(),
        };
        self.write_text(&format!(
            "  <info>{}</info>  {}{}{}",
            argument.name,
            " ".repeat(padding),
            indent_continuation(&argument.description, total_width + 4),
            default
        ))
    }

    fn describe_option(&mut self, option: &InputOption, total_width: usize) -> io::Result<()> {
        let name = option.display_name();
        let padding = total_width.saturating_sub(name.chars().count());
        let default = match &option.default {
            Some(value) if option.accepts_value => {
                format!(" <comment>[default: \"{}\"]</comment>", value)
            }
            _ => String::new(),
        };
        self.write_text(&format!(
            "  <info>{}</info>  {}{}{}",
            name,
            " ".repeat(padding),
            indent_continuation(&option.description, total_width + 4),
            default
        ))
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        let decorated = !self.options.raw_output;
        if self.options.raw_text {
            self.output.write(&strip_tags(text), decorated)
        } else {
            self.output.write(text, decorated)
        }
    }
}

/// `[a|b] ` for a command with aliases, empty otherwise.
fn aliases_text(command: &CommandInfo) -> String {
    if command.aliases.is_empty() {
        String::new()
    } else {
        format!("[{}] ", command.aliases.join("|"))
    }
}

fn indent_continuation(text: &str, indent: usize) -> String {
    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(&format!("\n{}", " ".repeat(indent)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::output::BufferedOutput;

    fn render_app(app: &ApplicationInfo, options: DescriptorOptions) -> String {
        let mut output = BufferedOutput::new();
        TextDescriptor::new(&mut output, options)
            .describe_application(app)
            .unwrap();
        output.into_string()
    }

    #[test]
    fn test_column_width() {
        let commands = [
            CommandInfo::new("init", ""),
            CommandInfo::new("install", ""),
            CommandInfo::new("ls", ""),
        ];
        assert_eq!(column_width(&commands), 9);
        assert_eq!(column_width(&[] as &[CommandInfo]), 0);
    }

    #[test]
    fn test_column_width_counts_aliases() {
        let commands = [CommandInfo::new("gc", "").with_alias("collect-garbage")];
        assert_eq!(column_width(&commands), 17);
    }

    #[test]
    fn test_application_listing() {
        let app = ApplicationInfo::new("tool", "1.0")
            .with_option(InputOption::flag("help", "Display help").with_shortcut('h'))
            .with_command(CommandInfo::new("list", "List commands"))
            .with_command(CommandInfo::new("session:gc", "Collect garbage").with_alias("gc"));

        let text = render_app(&app, DescriptorOptions::default());
        let expected = "tool <info>1.0</info>\n\n\
            <comment>Usage:</comment>\n  command [options] [arguments]\n\n\
            <comment>Options:</comment>\n  <info>-h, --help</info>  Display help\n\n\
            <comment>Available commands:</comment>\n  \
            <info>list</info>        List commands\n \
            <comment>session</comment>\n  \
            <info>session:gc</info>  [gc] Collect garbage\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_namespace_listing_includes_aliases() {
        let app = ApplicationInfo::new("", "")
            .with_command(CommandInfo::new("list", "List commands"))
            .with_command(CommandInfo::new("session:show", "Show").with_alias("session:view"));

        let options = DescriptorOptions {
            namespace: Some("session".to_string()),
            ..Default::default()
        };
        let text = render_app(&app, options);

        assert!(text.contains("Available commands for the \"session\" namespace:"));
        assert!(text.contains("  <info>session:show</info>  [session:view] Show"));
        assert!(text.contains("  <info>session:view</info>  Show"));
        assert!(!text.contains("list"));
        assert!(!text.contains(" <comment>session</comment>"));
    }

    #[test]
    fn test_hidden_command_not_listed() {
        let app = ApplicationInfo::new("", "")
            .with_command(CommandInfo::new("list", "List commands"))
            .with_command(CommandInfo::new("internal", "Secret").hidden());
        let text = render_app(&app, DescriptorOptions::default());
        assert!(!text.contains("internal"));
    }

    #[test]
    fn test_raw_text_strips_markup() {
        let app =
            ApplicationInfo::new("tool", "1.0").with_command(CommandInfo::new("list", "List"));
        let options = DescriptorOptions {
            raw_text: true,
            ..Default::default()
        };
        let text = render_app(&app, options);
        assert!(!text.contains("<info>"));
        assert!(text.starts_with("tool 1.0\n\nUsage:\n"));
    }

    #[test]
    fn test_command_description() {
        let command = CommandInfo::new("session:show", "Show a session")
            .with_alias("show")
            .with_argument(InputArgument::required("id", "Session id"))
            .with_option(InputOption::flag("raw", "Raw output"))
            .with_help("Prints the attributes.\nUse <info>%command.name% ID</info>.");

        let mut output = BufferedOutput::new();
        TextDescriptor::new(&mut output, DescriptorOptions::default())
            .describe_command(&command)
            .unwrap();

        let expected = "<comment>Usage:</comment>\n  \
            session:show [options] <id>\n  show\n\n\
            <comment>Arguments:</comment>\n  <info>id</info>         Session id\n\n\
            <comment>Options:</comment>\n  <info>    --raw</info>  Raw output\n\n\
            <comment>Help:</comment>\n  Prints the attributes.\n  \
            Use <info>session:show ID</info>.\n";
        assert_eq!(output.contents(), expected);
    }

    #[test]
    fn test_option_default_shown() {
        let command = CommandInfo::new("session:list", "")
            .with_option(InputOption::value("limit", "Rows per page").with_default("20"));

        let mut output = BufferedOutput::new();
        TextDescriptor::new(&mut output, DescriptorOptions::default())
            .describe_command(&command)
            .unwrap();
        assert!(output
            .contents()
            .contains("Rows per page <comment>[default: \"20\"]</comment>"));
    }
}
