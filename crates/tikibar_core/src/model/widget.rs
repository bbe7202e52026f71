//! Toolbar widget callables.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Render signature shared by all widgets.
pub type RenderFn = dyn Fn(&WidgetContext, &WidgetRequest) -> String + Send + Sync;

/// Resource the toolbar is rendered against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetContext {
    /// Traversal path of the current resource, e.g. `/blog/first-post`.
    pub resource_path: String,
}

/// Request metadata available to widgets at render time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetRequest {
    pub method: String,
    pub path: String,
}

/// A named widget callable.
///
/// Clones share the same callable, so a registry entry can be compared back to
/// the value that was registered with [`Widget::same_callable`].
#[derive(Clone)]
pub struct Widget {
    name: String,
    module: Option<String>,
    render: Arc<RenderFn>,
}

impl Widget {
    /// Creates a widget whose intrinsic name is `name`.
    pub fn new<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&WidgetContext, &WidgetRequest) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            module: None,
            render: Arc::new(render),
        }
    }

    /// Attaches the module path the widget is defined in.
    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Module-qualified name, or the bare name when no module is known.
    pub fn qualified_name(&self) -> String {
        match &self.module {
            Some(module) => format!("{module}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Renders toolbar markup for one request.
    pub fn render(&self, context: &WidgetContext, request: &WidgetRequest) -> String {
        (self.render)(context, request)
    }

    /// Returns true when both values wrap the same callable.
    pub fn same_callable(&self, other: &Widget) -> bool {
        Arc::ptr_eq(&self.render, &other.render)
    }

    /// Address of the shared callable; equal exactly when `same_callable` holds.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.render) as *const () as usize
    }
}

impl Debug for Widget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("name", &self.name)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{Widget, WidgetContext, WidgetRequest};

    fn clock() -> Widget {
        Widget::new("clock", |_, request| format!("<span>{}</span>", request.path))
    }

    #[test]
    fn renders_with_request_metadata() {
        let request = WidgetRequest {
            method: "GET".to_string(),
            path: "/about".to_string(),
        };
        let html = clock().render(&WidgetContext::default(), &request);
        assert_eq!(html, "<span>/about</span>");
    }

    #[test]
    fn clones_share_the_callable() {
        let widget = clock();
        let copy = widget.clone();
        assert!(widget.same_callable(&copy));
        assert_eq!(widget.identity(), copy.identity());
        let other = clock();
        assert!(!widget.same_callable(&other));
        assert_ne!(widget.identity(), other.identity());
    }

    #[test]
    fn qualified_name_includes_module() {
        let widget = clock().in_module("myapp.widgets");
        assert_eq!(widget.qualified_name(), "myapp.widgets.clock");
        assert_eq!(clock().qualified_name(), "clock");
    }
}
