//! Namespace grouping of an application's commands.

use std::collections::BTreeMap;

use super::command::{namespace_of, ApplicationInfo, CommandInfo};

/// Namespace id for commands without a `namespace:` prefix.
pub const GLOBAL_NAMESPACE: &str = "_global";

/// Command names (aliases included) sharing a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub id: String,
    pub commands: Vec<String>,
}

/// Commands of an application grouped by namespace.
///
/// Hidden commands are left out. The global namespace comes first, the
/// rest are sorted by id; names inside a namespace are sorted too.
#[derive(Debug)]
pub struct ApplicationDescription<'a> {
    commands: BTreeMap<String, &'a CommandInfo>,
    aliases: BTreeMap<String, &'a CommandInfo>,
    namespaces: Vec<Namespace>,
}

impl<'a> ApplicationDescription<'a> {
    /// Describe `app`, optionally restricted to one namespace.
    pub fn new(app: &'a ApplicationInfo, namespace: Option<&str>) -> Self {
        let mut commands = BTreeMap::new();
        let mut aliases = BTreeMap::new();
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for command in app.commands.iter().filter(|c| !c.hidden) {
            let entries = std::iter::once(&command.name).chain(command.aliases.iter());
            for name in entries {
                let entry_namespace = namespace_of(name);
                if namespace.is_some() && entry_namespace != namespace {
                    continue;
                }

                if *name == command.name {
                    commands.insert(name.clone(), command);
                } else {
                    aliases.insert(name.clone(), command);
                }

                grouped
                    .entry(entry_namespace.unwrap_or(GLOBAL_NAMESPACE).to_string())
                    .or_default()
                    .push(name.clone());
            }
        }

        let mut namespaces: Vec<Namespace> = grouped
            .into_iter()
            .map(|(id, mut names)| {
                names.sort();
                names.dedup();
                Namespace { id, commands: names }
            })
            .collect();
        namespaces.sort_by_key(|ns| (ns.id != GLOBAL_NAMESPACE, ns.id.clone()));

        Self {
            commands,
            aliases,
            namespaces,
        }
    }

    /// Commands keyed by their real name.
    pub fn commands(&self) -> &BTreeMap<String, &'a CommandInfo> {
        &self.commands
    }

    /// Namespaces in display order.
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Resolve a listed name or alias.
    pub fn command(&self, name: &str) -> Option<&'a CommandInfo> {
        self.commands
            .get(name)
            .or_else(|| self.aliases.get(name))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> ApplicationInfo {
        ApplicationInfo::new("tool", "1.0")
            .with_command(CommandInfo::new("session:show", "Show").with_alias("show"))
            .with_command(CommandInfo::new("session:gc", "Collect"))
            .with_command(CommandInfo::new("cache:clear", "Clear"))
            .with_command(CommandInfo::new("list", "List"))
            .with_command(CommandInfo::new("debug:dump", "Dump").hidden())
    }

    #[test]
    fn test_grouping_and_order() {
        let app = app();
        let description = ApplicationDescription::new(&app, None);
        let ids: Vec<&str> = description
            .namespaces()
            .iter()
            .map(|ns| ns.id.as_str())
            .collect();

        assert_eq!(ids, vec![GLOBAL_NAMESPACE, "cache", "session"]);
        assert_eq!(description.namespaces()[0].commands, vec!["list", "show"]);
        assert_eq!(
            description.namespaces()[2].commands,
            vec!["session:gc", "session:show"]
        );
    }

    #[test]
    fn test_hidden_commands_skipped() {
        let app = app();
        let description = ApplicationDescription::new(&app, None);
        assert!(description.command("debug:dump").is_none());
        assert!(description.namespaces().iter().all(|ns| ns.id != "debug"));
    }

    #[test]
    fn test_aliases_resolve_but_are_not_commands() {
        let app = app();
        let description = ApplicationDescription::new(&app, None);

        assert!(!description.commands().contains_key("show"));
        assert_eq!(description.command("show").unwrap().name, "session:show");
    }

    #[test]
    fn test_namespace_filter() {
        let app = app();
        let description = ApplicationDescription::new(&app, Some("session"));

        assert_eq!(description.namespaces().len(), 1);
        assert_eq!(description.namespaces()[0].id, "session");
        assert_eq!(description.commands().len(), 2);
    }
}
