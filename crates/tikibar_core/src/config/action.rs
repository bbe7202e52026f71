//! Deferred configuration actions and their identity keys.

use crate::config::introspect::Introspectable;
use crate::config::{AppRegistry, ConfigError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Identity of one declaration: `(kind, name)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Discriminator {
    pub kind: String,
    pub name: String,
}

impl Discriminator {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl Display for Discriminator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.kind, self.name)
    }
}

/// Conflict-detection key for one pending action.
///
/// Keys compare by discriminator and target identity, so two different
/// objects declared under one name never collide even when they describe the
/// same way. `target` is the description used in logs and errors.
#[derive(Debug, Clone)]
pub struct ActionKey {
    pub discriminator: Discriminator,
    pub target_id: usize,
    pub target: String,
}

impl ActionKey {
    pub fn new(discriminator: Discriminator, target_id: usize, target: impl Into<String>) -> Self {
        Self {
            discriminator,
            target_id,
            target: target.into(),
        }
    }

    fn identity(&self) -> (&Discriminator, usize) {
        (&self.discriminator, self.target_id)
    }
}

impl PartialEq for ActionKey {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for ActionKey {}

impl PartialOrd for ActionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ActionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

impl Hash for ActionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

/// Registry mutation applied at commit.
pub type ActionFn = dyn Fn(&mut AppRegistry) -> Result<(), ConfigError>;

/// One queued action with the metadata recorded once it runs.
pub(crate) struct PendingAction {
    pub key: Option<ActionKey>,
    pub callable: Box<ActionFn>,
    pub introspectables: Vec<Introspectable>,
}

impl PendingAction {
    pub fn run(&self, registry: &mut AppRegistry) -> Result<(), ConfigError> {
        (self.callable)(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionKey, Discriminator};

    #[test]
    fn discriminator_displays_as_tuple() {
        let discriminator = Discriminator::new("tikibar.widget", "clock");
        assert_eq!(discriminator.to_string(), "(tikibar.widget, clock)");
    }

    #[test]
    fn keys_compare_by_target_identity_not_description() {
        let discriminator = Discriminator::new("tikibar.widget", "clock");
        let first = ActionKey::new(discriminator.clone(), 1, "widget clock");
        let second = ActionKey::new(discriminator.clone(), 2, "widget clock");
        assert_ne!(first, second);

        let renamed = ActionKey::new(discriminator, 1, "widget myapp.clock");
        assert_eq!(first, renamed);
    }
}
