//! Console commands for inspecting and maintaining stored sessions.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::Args;
use crate::config::Config;
use crate::console::{
    ApplicationInfo, CommandInfo, DescriptorOptions, InputArgument, InputOption, OutputSink,
    TextDescriptor,
};
use crate::error::SessionError;
use crate::online::OnlineReport;
use crate::pagination::Pagination;
use crate::session::{Clock, RequestContext, Session, SessionHandler, SessionId};
use crate::Result;

/// Binary name shown in listings.
pub const APP_NAME: &str = "session-keeper";

/// Rows per page for `session:list` when `--limit` is not given.
pub const DEFAULT_LIMIT: usize = 20;

/// Registry of every command the binary understands.
pub fn application() -> ApplicationInfo {
    let mut app = ApplicationInfo::new(APP_NAME, env!("CARGO_PKG_VERSION"));
    app.definition.options = global_options();
    app.with_command(list_command())
        .with_command(help_command())
        .with_command(
            CommandInfo::new("session:list", "List stored sessions")
                .with_alias("sessions")
                .with_option(
                    InputOption::value("page", "Page to show")
                        .with_shortcut('p')
                        .with_default("1"),
                )
                .with_option(
                    InputOption::value("limit", "Rows per page, 0 for all")
                        .with_default(DEFAULT_LIMIT.to_string()),
                )
                .with_help(
                    "The <info>%command.name%</info> command lists live sessions \
                     with their idle time.",
                ),
        )
        .with_command(
            CommandInfo::new("session:show", "Show the attributes of a session")
                .with_argument(InputArgument::required("id", "Session id"))
                .with_help(
                    "The <info>%command.name%</info> command prints a session's \
                     attributes as JSON.",
                ),
        )
        .with_command(
            CommandInfo::new("session:destroy", "Destroy a session")
                .with_argument(InputArgument::required("id", "Session id"))
                .with_help(
                    "The <info>%command.name%</info> command deletes a stored session.\n\
                     The visitor starts over with a fresh session on the next request.",
                ),
        )
        .with_command(
            CommandInfo::new("session:gc", "Delete expired sessions").with_help(
                "The <info>%command.name%</info> command removes sessions idle \
                 longer than the configured lifetime.",
            ),
        )
        .with_command(
            CommandInfo::new("whosonline", "Report guests and users online")
                .with_option(
                    InputOption::value("mode", "Report mode (count, names, both)")
                        .with_shortcut('m'),
                )
                .with_help(
                    "The <info>%command.name%</info> command counts live sessions.\n\
                     Sessions carrying a user id count as users, all others as guests.",
                ),
        )
}

fn global_options() -> Vec<InputOption> {
    vec![
        InputOption::flag("help", "Display help for the given command").with_shortcut('h'),
        InputOption::flag("version", "Display this application version").with_shortcut('V'),
        InputOption::value("config", "Configuration file (JSON)").with_shortcut('c'),
        InputOption::value("handler", "Session storage driver (memory, file)"),
        InputOption::value("path", "Session directory for the file driver").with_shortcut('d'),
        InputOption::value("lifetime", "Session lifetime in seconds"),
        InputOption::value("log-level", "Log level or filter directive").with_shortcut('l'),
        InputOption::flag("raw", "Write output without markup"),
    ]
}

fn list_command() -> CommandInfo {
    CommandInfo::new("list", "List commands")
        .with_argument(InputArgument::optional(
            "namespace",
            "Only list commands of this namespace",
        ))
        .with_help(
            "The <info>%command.name%</info> command lists all commands.\n\
             Pass a namespace to narrow the list: <info>%command.name% session</info>",
        )
}

fn help_command() -> CommandInfo {
    CommandInfo::new("help", "Display help for a command")
        .with_argument(
            InputArgument::optional("command_name", "The command name").with_default("help"),
        )
        .with_help(
            "The <info>%command.name%</info> command displays help for a given command.",
        )
}

/// Runs commands against one storage driver.
#[derive(Debug)]
pub struct Console {
    app: ApplicationInfo,
    config: Config,
    handler: Arc<dyn SessionHandler>,
    clock: Arc<dyn Clock>,
}

impl Console {
    /// Build a console on the driver selected by `config`.
    pub fn new(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let handler = config.build_handler(clock.clone())?;
        Ok(Self::with_handler(config, handler, clock))
    }

    /// Build a console on an existing driver.
    pub fn with_handler(
        config: Config,
        handler: Arc<dyn SessionHandler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            app: application(),
            config,
            handler,
            clock,
        }
    }

    pub fn application(&self) -> &ApplicationInfo {
        &self.app
    }

    /// Run the command named in `args`, writing to `out`.
    ///
    /// No command lists the available ones; `--help` describes the named
    /// command instead of running it.
    pub fn execute(&self, args: &Args, out: &mut dyn OutputSink) -> Result<()> {
        let name = args.command.as_deref().unwrap_or("list");
        let command = self.find(name)?;

        if args.help {
            if args.command.is_none() {
                return self.describe_application(None, args, out);
            }
            return self.describe_command(command, args, out);
        }

        debug!(command = %command.name, "running command");
        match command.name.as_str() {
            "list" => self.describe_application(args.positional(0), args, out),
            "help" => {
                let target = self.find(args.positional(0).unwrap_or("help"))?;
                self.describe_command(target, args, out)
            }
            "session:list" => self.list_sessions(args, out),
            "session:show" => self.show_session(args, out),
            "session:destroy" => self.destroy_session(args, out),
            "session:gc" => self.collect_garbage(out),
            "whosonline" => self.whos_online(args, out),
            other => Err(SessionError::Command(format!(
                "command \"{}\" is not defined",
                other
            ))),
        }
    }

    fn find(&self, name: &str) -> Result<&CommandInfo> {
        self.app
            .find(name)
            .ok_or_else(|| SessionError::Command(format!("command \"{}\" is not defined", name)))
    }

    fn descriptor_options(args: &Args, namespace: Option<&str>) -> DescriptorOptions {
        DescriptorOptions {
            namespace: namespace.map(str::to_string),
            raw_text: args.raw,
            raw_output: false,
        }
    }

    fn describe_application(
        &self,
        namespace: Option<&str>,
        args: &Args,
        out: &mut dyn OutputSink,
    ) -> Result<()> {
        if let Some(ns) = namespace {
            if !self.app.commands.iter().any(|c| c.namespace() == Some(ns)) {
                return Err(SessionError::Command(format!(
                    "there are no commands defined in the \"{}\" namespace",
                    ns
                )));
            }
        }
        TextDescriptor::new(out, Self::descriptor_options(args, namespace))
            .describe_application(&self.app)?;
        Ok(())
    }

    fn describe_command(
        &self,
        command: &CommandInfo,
        args: &Args,
        out: &mut dyn OutputSink,
    ) -> Result<()> {
        TextDescriptor::new(out, Self::descriptor_options(args, None)).describe_command(command)?;
        Ok(())
    }

    fn write(&self, args: &Args, out: &mut dyn OutputSink, text: &str) -> Result<()> {
        if args.raw {
            out.write(&crate::console::strip_tags(text), false)?;
        } else {
            out.write(text, true)?;
        }
        Ok(())
    }

    fn list_sessions(&self, args: &Args, out: &mut dyn OutputSink) -> Result<()> {
        let mut records = self.handler.records()?;
        records.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));

        if records.is_empty() {
            return self.write(args, out, "No sessions stored.\n");
        }

        let limit = args.limit.unwrap_or(DEFAULT_LIMIT);
        let page = args.page.unwrap_or(1);
        let start = page.saturating_sub(1).saturating_mul(limit);
        let pagination = Pagination::new(records.len(), start, limit);
        let now = self.clock.now();

        for (id, record) in &records[pagination.range()] {
            let line = format!(
                "  <info>{}</info>  {} attribute(s), idle {}s\n",
                id,
                record.attributes.len(),
                record.idle_secs(now)
            );
            self.write(args, out, &line)?;
        }

        if pagination.pages_total() > 1 {
            let line = format!(
                "<comment>Page {} of {} ({} sessions)</comment>\n",
                pagination.current_page(),
                pagination.pages_total(),
                records.len()
            );
            self.write(args, out, &line)?;
        }
        Ok(())
    }

    fn required_id(args: &Args) -> Result<SessionId> {
        args.positional(0)
            .ok_or_else(|| {
                SessionError::Command("not enough arguments (missing: \"id\")".to_string())
            })?
            .parse()
    }

    fn show_session(&self, args: &Args, out: &mut dyn OutputSink) -> Result<()> {
        let id = Self::required_id(args)?;
        let record = self
            .handler
            .load(&id)?
            .ok_or_else(|| SessionError::SessionNotFound(id.to_string()))?;

        let sorted: BTreeMap<_, _> = record.attributes.iter().collect();
        let json = serde_json::to_string_pretty(&sorted)?;
        out.write(&json, false)?;
        out.write("\n", false)?;
        Ok(())
    }

    fn destroy_session(&self, args: &Args, out: &mut dyn OutputSink) -> Result<()> {
        let id = Self::required_id(args)?;

        let mut session = Session::new(self.handler.clone(), self.config.session_config());
        session.set_id(id.clone())?;
        session.start(&RequestContext::new())?;

        if session.is_new() {
            // Nothing was stored under `id`; drop the session start created.
            session.destroy();
            return Err(SessionError::SessionNotFound(id.to_string()));
        }

        if !session.destroy() {
            return Err(SessionError::storage(format!("failed to delete session {}", id)));
        }

        info!(session = %id, "session destroyed from console");
        self.write(args, out, &format!("Session <info>{}</info> destroyed.\n", id))
    }

    fn collect_garbage(&self, out: &mut dyn OutputSink) -> Result<()> {
        let session = Session::new(self.handler.clone(), self.config.session_config());
        let deleted = session.gc()?;
        out.write(&format!("Removed {} expired session(s).\n", deleted), false)?;
        Ok(())
    }

    fn whos_online(&self, args: &Args, out: &mut dyn OutputSink) -> Result<()> {
        let mut reporter = self.config.whos_online();
        if let Some(mode) = args.mode {
            reporter = reporter.with_mode(mode);
        }

        match reporter.report(self.handler.as_ref())? {
            OnlineReport::Disabled => {
                self.write(args, out, "<comment>Session metadata tracking is disabled.</comment>\n")
            }
            OnlineReport::Online { count, names } => {
                if let Some(count) = count {
                    let text = format!(
                        "Guests online: <info>{}</info>\nUsers online: <info>{}</info>\n",
                        count.guests, count.users
                    );
                    self.write(args, out, &text)?;
                }
                if let Some(names) = names {
                    self.write(args, out, "<comment>Users:</comment>\n")?;
                    for name in names {
                        self.write(args, out, &format!("  {}\n", name))?;
                    }
                }
                Ok(())
            }
        }
    }
}
