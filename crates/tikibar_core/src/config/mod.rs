//! Two-phase configuration: declare directives now, apply them at commit.
//!
//! # Responsibility
//! - Resolve directive targets and queue registry mutations as actions.
//! - Detect conflicting declarations before any action runs.
//! - Apply queued actions in declaration order and record introspection.
//!
//! # Invariants
//! - The registry is only mutated inside [`Configurator::commit`].
//! - A committed action is never applied a second time.
//! - Directive names are unique within one configurator.

pub mod action;
pub mod introspect;

use crate::directive::registry::TikibarRegistry;
use crate::model::content_type::{FormField, FormFieldError};
use crate::resolve::{Reference, ReferenceTable, Resolve, ResolutionError};
use action::{ActionKey, Discriminator, PendingAction};
use introspect::{Introspectable, Introspector};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ConfigResult<T> = Result<T, ConfigError>;

/// By-name directive entry point.
pub type Directive = fn(&mut Configurator, DirectiveCall) -> ConfigResult<()>;

/// Arguments for a by-name directive invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DirectiveCall {
    /// Dotted reference to the directive target.
    pub target: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub form_fields: Option<Vec<FormField>>,
}

impl DirectiveCall {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_form_fields(mut self, fields: Vec<FormField>) -> Self {
        self.form_fields = Some(fields);
        self
    }
}

/// How identical action keys are treated at commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Apply every action in order; the last one wins.
    #[default]
    Override,
    /// Fail the commit when two pending actions share a key.
    Reject,
}

/// Configurator options a host can load from its settings source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfiguratorSettings {
    /// Anchor package for relative references such as `.widgets.clock`.
    pub package: Option<String>,
    pub conflict_policy: ConflictPolicy,
}

/// Registry populated by committed actions.
#[derive(Debug, Clone, Default)]
pub struct AppRegistry {
    pub tikibar: Option<TikibarRegistry>,
}

impl AppRegistry {
    pub fn tikibar_mut(&mut self) -> ConfigResult<&mut TikibarRegistry> {
        self.tikibar.as_mut().ok_or(ConfigError::NotInstalled)
    }
}

/// Result of a finished configuration pass, handed to the rendering layer.
#[derive(Debug, Clone)]
pub struct Configured {
    pub registry: AppRegistry,
    pub introspector: Introspector,
}

impl Configured {
    pub fn tikibar(&self) -> Option<&TikibarRegistry> {
        self.registry.tikibar.as_ref()
    }
}

/// Configuration-time state for one pass.
pub struct Configurator {
    resolver: ReferenceTable,
    settings: ConfiguratorSettings,
    registry: AppRegistry,
    actions: Vec<PendingAction>,
    directives: BTreeMap<String, Directive>,
    introspector: Introspector,
}

impl Configurator {
    pub fn new(resolver: ReferenceTable) -> Self {
        Self::with_settings(resolver, ConfiguratorSettings::default())
    }

    pub fn with_settings(resolver: ReferenceTable, settings: ConfiguratorSettings) -> Self {
        Self {
            resolver,
            settings,
            registry: AppRegistry::default(),
            actions: Vec::new(),
            directives: BTreeMap::new(),
            introspector: Introspector::new(),
        }
    }

    pub fn settings(&self) -> &ConfiguratorSettings {
        &self.settings
    }

    /// Committed registry state. Pending actions are not visible here.
    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AppRegistry {
        &mut self.registry
    }

    pub fn introspector(&self) -> &Introspector {
        &self.introspector
    }

    /// Resolves an object-or-dotted reference.
    pub fn maybe_dotted<T: Resolve>(&self, reference: Reference<T>) -> Result<T, ResolutionError> {
        match reference {
            Reference::Object(value) => Ok(value),
            Reference::Dotted(path) => self
                .resolver
                .resolve(&path, self.settings.package.as_deref()),
        }
    }

    pub fn object_description<T: Resolve>(&self, value: &T) -> String {
        value.describe()
    }

    pub fn object_identity<T: Resolve>(&self, value: &T) -> usize {
        value.identity()
    }

    pub fn introspectable(
        &self,
        category: &str,
        discriminator: Discriminator,
        title: String,
        type_name: &str,
    ) -> Introspectable {
        Introspectable::new(category, discriminator, title, type_name)
    }

    /// Queues one registry mutation for the next commit.
    pub fn action<F>(
        &mut self,
        key: Option<ActionKey>,
        callable: F,
        introspectables: Vec<Introspectable>,
    ) where
        F: Fn(&mut AppRegistry) -> ConfigResult<()> + 'static,
    {
        self.actions.push(PendingAction {
            key,
            callable: Box::new(callable),
            introspectables,
        });
    }

    pub fn pending_actions(&self) -> usize {
        self.actions.len()
    }

    pub fn add_directive(&mut self, name: &str, directive: Directive) -> ConfigResult<()> {
        if self.directives.contains_key(name) {
            return Err(ConfigError::DuplicateDirective(name.to_string()));
        }
        self.directives.insert(name.to_string(), directive);
        Ok(())
    }

    pub fn has_directive(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    /// Invokes a directive previously added with [`Configurator::add_directive`].
    pub fn invoke(&mut self, name: &str, call: DirectiveCall) -> ConfigResult<()> {
        let directive = *self
            .directives
            .get(name)
            .ok_or_else(|| ConfigError::UnknownDirective(name.to_string()))?;
        directive(self, call)
    }

    /// Applies all pending actions in declaration order.
    ///
    /// Conflicts are checked before any action runs. An action error stops the
    /// commit; the failed action and every later one stay queued, so a retry
    /// after fixing the cause resumes where this commit stopped.
    pub fn commit(&mut self) -> ConfigResult<()> {
        if self.actions.is_empty() {
            return Ok(());
        }
        if self.settings.conflict_policy == ConflictPolicy::Reject {
            self.check_conflicts()?;
        }

        let mut actions = std::mem::take(&mut self.actions).into_iter();
        let mut applied = 0usize;
        while let Some(action) = actions.next() {
            if let Err(err) = action.run(&mut self.registry) {
                warn!(
                    "event=config_commit module=config status=error applied={applied} error={err}"
                );
                self.actions = std::iter::once(action).chain(actions).collect();
                return Err(err);
            }
            applied += 1;
            if let Some(key) = &action.key {
                debug!(
                    "event=action_applied module=config discriminator={} target={}",
                    key.discriminator, key.target
                );
            }
            for introspectable in action.introspectables {
                self.introspector.add(introspectable);
            }
        }
        info!("event=config_commit module=config status=ok actions={applied}");
        Ok(())
    }

    /// Commits and returns the configured registry.
    pub fn finish(mut self) -> ConfigResult<Configured> {
        self.commit()?;
        Ok(Configured {
            registry: self.registry,
            introspector: self.introspector,
        })
    }

    fn check_conflicts(&self) -> ConfigResult<()> {
        let mut seen = BTreeSet::new();
        for key in self.actions.iter().filter_map(|action| action.key.as_ref()) {
            if !seen.insert(key) {
                warn!(
                    "event=config_conflict module=config status=error discriminator={} target={}",
                    key.discriminator, key.target
                );
                return Err(ConfigError::Conflict {
                    discriminator: key.discriminator.clone(),
                    target: key.target.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Configuration pass errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Resolution(ResolutionError),
    UnknownDirective(String),
    DuplicateDirective(String),
    InvalidDirectiveCall {
        directive: &'static str,
        reason: String,
    },
    InvalidName(String),
    InvalidFormField(FormFieldError),
    Conflict {
        discriminator: Discriminator,
        target: String,
    },
    NotInstalled,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolution(err) => write!(f, "{err}"),
            Self::UnknownDirective(name) => write!(f, "unknown directive: {name}"),
            Self::DuplicateDirective(name) => write!(f, "directive already added: {name}"),
            Self::InvalidDirectiveCall { directive, reason } => {
                write!(f, "invalid call to {directive}: {reason}")
            }
            Self::InvalidName(value) => write!(f, "registration name is invalid: `{value}`"),
            Self::InvalidFormField(err) => write!(f, "{err}"),
            Self::Conflict {
                discriminator,
                target,
            } => write!(f, "conflicting declarations for {discriminator}: {target}"),
            Self::NotInstalled => write!(f, "tikibar registry is not installed"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Resolution(err) => Some(err),
            Self::InvalidFormField(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResolutionError> for ConfigError {
    fn from(value: ResolutionError) -> Self {
        Self::Resolution(value)
    }
}

impl From<FormFieldError> for ConfigError {
    fn from(value: FormFieldError) -> Self {
        Self::InvalidFormField(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ActionKey, AppRegistry, ConfigError, ConflictPolicy, Configurator, ConfiguratorSettings,
        DirectiveCall, Discriminator,
    };
    use crate::directive::registry::TikibarRegistry;
    use crate::resolve::ReferenceTable;
    use std::cell::Cell;
    use std::rc::Rc;

    fn install_empty(registry: &mut AppRegistry) -> Result<(), ConfigError> {
        registry.tikibar = Some(TikibarRegistry::default());
        Ok(())
    }

    #[test]
    fn actions_run_only_on_commit() {
        let mut config = Configurator::new(ReferenceTable::new());
        config.action(None, install_empty, vec![]);

        assert_eq!(config.pending_actions(), 1);
        assert!(config.registry().tikibar.is_none());

        config.commit().expect("commit");
        assert_eq!(config.pending_actions(), 0);
        assert!(config.registry().tikibar.is_some());
    }

    #[test]
    fn committed_actions_are_not_reapplied() {
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let mut config = Configurator::new(ReferenceTable::new());
        config.action(
            None,
            move |_| {
                counter.set(counter.get() + 1);
                Ok(())
            },
            vec![],
        );

        config.commit().expect("first commit");
        config.commit().expect("second commit");
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn failed_commit_keeps_unapplied_actions_queued() {
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let mut config = Configurator::new(ReferenceTable::new());
        config.action(
            None,
            move |_| {
                counter.set(counter.get() + 1);
                Ok(())
            },
            vec![],
        );
        config.action(
            None,
            |registry| registry.tikibar_mut().map(|_| ()),
            vec![],
        );
        config.action(None, install_empty, vec![]);

        let err = config.commit().expect_err("second action fails");
        assert_eq!(err, ConfigError::NotInstalled);
        assert_eq!(runs.get(), 1);
        assert_eq!(config.pending_actions(), 2);

        install_empty(config.registry_mut()).expect("install registry");
        config.commit().expect("retry commit");
        assert_eq!(runs.get(), 1);
        assert_eq!(config.pending_actions(), 0);
    }

    #[test]
    fn reject_policy_fails_on_identical_keys() {
        let settings = ConfiguratorSettings {
            package: None,
            conflict_policy: ConflictPolicy::Reject,
        };
        let mut config = Configurator::with_settings(ReferenceTable::new(), settings);
        let discriminator = Discriminator::new("tikibar.widget", "clock");
        let key = ActionKey::new(discriminator, 7, "widget clock");
        config.action(Some(key.clone()), install_empty, vec![]);
        config.action(Some(key), install_empty, vec![]);

        let err = config.commit().expect_err("conflict must fail");
        assert!(matches!(err, ConfigError::Conflict { .. }));
        assert!(config.registry().tikibar.is_none());
    }

    #[test]
    fn override_policy_applies_identical_keys() {
        let mut config = Configurator::new(ReferenceTable::new());
        let discriminator = Discriminator::new("tikibar.widget", "clock");
        let key = ActionKey::new(discriminator, 7, "widget clock");
        config.action(Some(key.clone()), install_empty, vec![]);
        config.action(Some(key), install_empty, vec![]);
        config.commit().expect("override commit");
        assert!(config.registry().tikibar.is_some());
    }

    #[test]
    fn unknown_and_duplicate_directives_fail() {
        fn noop(_: &mut Configurator, _: DirectiveCall) -> Result<(), ConfigError> {
            Ok(())
        }

        let mut config = Configurator::new(ReferenceTable::new());
        let err = config
            .invoke("add_thing", DirectiveCall::new("myapp.thing"))
            .expect_err("unknown directive");
        assert_eq!(err, ConfigError::UnknownDirective("add_thing".to_string()));

        config.add_directive("add_thing", noop).expect("add directive");
        assert!(config.has_directive("add_thing"));
        let err = config
            .add_directive("add_thing", noop)
            .expect_err("duplicate directive");
        assert_eq!(err, ConfigError::DuplicateDirective("add_thing".to_string()));
        config
            .invoke("add_thing", DirectiveCall::new("myapp.thing"))
            .expect("invoke directive");
    }

    #[test]
    fn settings_deserialize_from_snake_case() {
        let settings: ConfiguratorSettings =
            serde_json::from_str(r#"{"package":"myapp","conflict_policy":"reject"}"#)
                .expect("parse settings");
        assert_eq!(settings.package.as_deref(), Some("myapp"));
        assert_eq!(settings.conflict_policy, ConflictPolicy::Reject);

        let defaults: ConfiguratorSettings = serde_json::from_str("{}").expect("parse defaults");
        assert_eq!(defaults, ConfiguratorSettings::default());
    }
}
