//! Toolbar registration directives.
//!
//! # Responsibility
//! - Install the empty toolbar registry and expose the directives by name.
//! - Resolve widget/content-type targets and queue their registration.
//!
//! # Invariants
//! - Resolution and validation errors surface at call time, before anything is
//!   queued.
//! - Widgets use last-write-wins; content types merge into one record per name.
//!
//! # See also
//! - [`crate::config::Configurator::commit`]

pub mod registry;

use crate::config::action::{ActionKey, Discriminator};
use crate::config::{ConfigError, ConfigResult, Configurator, DirectiveCall};
use crate::model::content_type::{validate_form_fields, ContentFactory, FormField};
use crate::model::is_valid_registration_name;
use crate::model::widget::Widget;
use crate::resolve::Reference;
use log::debug;
use registry::TikibarRegistry;

/// Discriminator kind for content-type declarations.
pub const CONTENT_TYPE_KIND: &str = "tikibar.content_type";
/// Discriminator kind for widget declarations.
pub const WIDGET_KIND: &str = "tikibar.widget";

/// Introspection category for content types.
pub const CONTENT_TYPE_CATEGORY: &str = "tikibar content types";
/// Introspection category for widgets.
pub const WIDGET_CATEGORY: &str = "tikibar widgets";

/// Directive name for [`add_tikibar_content_type`].
pub const ADD_CONTENT_TYPE_DIRECTIVE: &str = "add_tikibar_content_type";
/// Directive name for [`add_tikibar_widget`].
pub const ADD_WIDGET_DIRECTIVE: &str = "add_tikibar_widget";

/// Installs an empty toolbar registry and adds both directives.
///
/// # Errors
/// - Returns [`ConfigError::DuplicateDirective`] when installed twice on the
///   same configurator.
pub fn install(config: &mut Configurator) -> ConfigResult<()> {
    config.add_directive(ADD_CONTENT_TYPE_DIRECTIVE, invoke_add_content_type)?;
    config.add_directive(ADD_WIDGET_DIRECTIVE, invoke_add_widget)?;
    config.registry_mut().tikibar = Some(TikibarRegistry::default());
    debug!("event=tikibar_install module=directive status=ok");
    Ok(())
}

/// Declares a content type.
///
/// `name` defaults to the factory's type name. `form_fields` replaces the
/// fields recorded for `name`; `None` keeps them.
///
/// # Errors
/// - [`ConfigError::Resolution`] when `content_type` cannot be resolved.
/// - [`ConfigError::InvalidName`] / [`ConfigError::InvalidFormField`] on bad
///   input.
pub fn add_tikibar_content_type(
    config: &mut Configurator,
    content_type: impl Into<Reference<ContentFactory>>,
    name: Option<&str>,
    form_fields: Option<Vec<FormField>>,
) -> ConfigResult<()> {
    let reference: Reference<ContentFactory> = content_type.into();
    let factory = config.maybe_dotted(reference)?;
    let name = registration_name(name, factory.type_name())?;
    if let Some(fields) = &form_fields {
        validate_form_fields(fields)?;
    }

    let discriminator = Discriminator::new(CONTENT_TYPE_KIND, name.as_str());
    let description = config.object_description(&factory);
    let target_id = config.object_identity(&factory);
    let mut introspectable = config.introspectable(
        CONTENT_TYPE_CATEGORY,
        discriminator.clone(),
        description.clone(),
        "tikibar content type",
    );
    introspectable.set("name", name.as_str());

    debug!(
        "event=directive_call module=directive directive={} name={} target={}",
        ADD_CONTENT_TYPE_DIRECTIVE, name, description
    );
    config.action(
        Some(ActionKey::new(discriminator, target_id, description)),
        move |registry| {
            registry
                .tikibar_mut()?
                .merge_content_type(&name, &factory, form_fields.as_deref());
            Ok(())
        },
        vec![introspectable],
    );
    Ok(())
}

/// Declares a toolbar widget.
///
/// `name` defaults to the widget's intrinsic name. Declaring another widget
/// under the same name overrides it.
///
/// # Errors
/// - [`ConfigError::Resolution`] when `widget` cannot be resolved.
/// - [`ConfigError::InvalidName`] on a name containing whitespace.
pub fn add_tikibar_widget(
    config: &mut Configurator,
    widget: impl Into<Reference<Widget>>,
    name: Option<&str>,
) -> ConfigResult<()> {
    let reference: Reference<Widget> = widget.into();
    let widget = config.maybe_dotted(reference)?;
    let name = registration_name(name, widget.name())?;

    let discriminator = Discriminator::new(WIDGET_KIND, name.as_str());
    let description = config.object_description(&widget);
    let target_id = config.object_identity(&widget);
    let mut introspectable = config.introspectable(
        WIDGET_CATEGORY,
        discriminator.clone(),
        description.clone(),
        "tikibar widget",
    );
    introspectable.set("name", name.as_str());

    debug!(
        "event=directive_call module=directive directive={} name={} target={}",
        ADD_WIDGET_DIRECTIVE, name, description
    );
    config.action(
        Some(ActionKey::new(discriminator, target_id, description)),
        move |registry| {
            registry.tikibar_mut()?.set_widget(&name, &widget);
            Ok(())
        },
        vec![introspectable],
    );
    Ok(())
}

/// Method-style access to the toolbar directives.
pub trait TikibarDirectives {
    fn add_tikibar_content_type(
        &mut self,
        content_type: impl Into<Reference<ContentFactory>>,
        name: Option<&str>,
        form_fields: Option<Vec<FormField>>,
    ) -> ConfigResult<()>;

    fn add_tikibar_widget(
        &mut self,
        widget: impl Into<Reference<Widget>>,
        name: Option<&str>,
    ) -> ConfigResult<()>;
}

impl TikibarDirectives for Configurator {
    fn add_tikibar_content_type(
        &mut self,
        content_type: impl Into<Reference<ContentFactory>>,
        name: Option<&str>,
        form_fields: Option<Vec<FormField>>,
    ) -> ConfigResult<()> {
        add_tikibar_content_type(self, content_type, name, form_fields)
    }

    fn add_tikibar_widget(
        &mut self,
        widget: impl Into<Reference<Widget>>,
        name: Option<&str>,
    ) -> ConfigResult<()> {
        add_tikibar_widget(self, widget, name)
    }
}

fn invoke_add_content_type(config: &mut Configurator, call: DirectiveCall) -> ConfigResult<()> {
    add_tikibar_content_type(config, call.target, call.name.as_deref(), call.form_fields)
}

fn invoke_add_widget(config: &mut Configurator, call: DirectiveCall) -> ConfigResult<()> {
    if call.form_fields.is_some() {
        return Err(ConfigError::InvalidDirectiveCall {
            directive: ADD_WIDGET_DIRECTIVE,
            reason: "widgets do not take form_fields".to_string(),
        });
    }
    add_tikibar_widget(config, call.target, call.name.as_deref())
}

// Empty names fall back to the intrinsic name.
fn registration_name(explicit: Option<&str>, intrinsic: &str) -> ConfigResult<String> {
    let name = match explicit {
        Some(value) if !value.is_empty() => value,
        _ => intrinsic,
    };
    if !is_valid_registration_name(name) {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::{install, registration_name, ADD_WIDGET_DIRECTIVE};
    use crate::config::{ConfigError, Configurator, DirectiveCall};
    use crate::model::content_type::FormField;
    use crate::resolve::ReferenceTable;

    #[test]
    fn registration_name_defaults_to_intrinsic() {
        assert_eq!(registration_name(None, "clock").unwrap(), "clock");
        assert_eq!(registration_name(Some(""), "clock").unwrap(), "clock");
        assert_eq!(registration_name(Some("timer"), "clock").unwrap(), "timer");
        assert_eq!(
            registration_name(Some("request timer"), "clock"),
            Err(ConfigError::InvalidName("request timer".to_string()))
        );
    }

    #[test]
    fn install_twice_is_rejected() {
        let mut config = Configurator::new(ReferenceTable::new());
        install(&mut config).expect("first install");
        let err = install(&mut config).expect_err("second install");
        assert!(matches!(err, ConfigError::DuplicateDirective(_)));
    }

    #[test]
    fn widget_directive_rejects_form_fields() {
        let mut config = Configurator::new(ReferenceTable::new());
        install(&mut config).expect("install");
        let call = DirectiveCall::new("myapp.widgets.clock")
            .with_form_fields(vec![FormField::text("title")]);
        let err = config
            .invoke(ADD_WIDGET_DIRECTIVE, call)
            .expect_err("form fields on widget");
        assert!(matches!(err, ConfigError::InvalidDirectiveCall { .. }));
        assert_eq!(config.pending_actions(), 0);
    }
}
