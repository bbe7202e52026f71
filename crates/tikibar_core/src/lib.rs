//! Registration directives for the tikibar debug toolbar.
//! Widgets and content types are declared at configuration time and land in a
//! typed registry when the configuration commits.

pub mod config;
pub mod directive;
pub mod logging;
pub mod model;
pub mod resolve;

pub use config::action::{ActionKey, Discriminator};
pub use config::introspect::{Introspectable, Introspector};
pub use config::{
    AppRegistry, ConfigError, ConfigResult, ConfiguratorSettings, Configured, Configurator,
    ConflictPolicy, DirectiveCall,
};
pub use directive::registry::TikibarRegistry;
pub use directive::{add_tikibar_content_type, add_tikibar_widget, install, TikibarDirectives};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::content_type::{
    ContentFactory, ContentForm, ContentItem, ContentTypeRecord, FieldKind, FormField,
    FormFieldError,
};
pub use model::widget::{Widget, WidgetContext, WidgetRequest};
pub use resolve::{Reference, ReferenceTable, ResolutionError};

/// Minimal health-check API for integration smoke tests.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
