//! Committed toolbar registry read by the rendering layer.

use crate::model::content_type::{ContentFactory, ContentTypeRecord, FormField};
use crate::model::widget::{Widget, WidgetContext, WidgetRequest};
use std::collections::BTreeMap;

/// Widgets and content types declared for the toolbar.
#[derive(Debug, Clone, Default)]
pub struct TikibarRegistry {
    pub widgets: BTreeMap<String, Widget>,
    pub content_types: BTreeMap<String, ContentTypeRecord>,
}

impl TikibarRegistry {
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty() && self.content_types.is_empty()
    }

    pub fn widget(&self, name: &str) -> Option<&Widget> {
        self.widgets.get(name)
    }

    pub fn content_type(&self, name: &str) -> Option<&ContentTypeRecord> {
        self.content_types.get(name)
    }

    /// Sets the widget for `name`, replacing any earlier one.
    pub fn set_widget(&mut self, name: &str, widget: &Widget) {
        self.widgets.insert(name.to_string(), widget.clone());
    }

    /// Gets or creates the record for `name` and merges a registration into it.
    ///
    /// Applying the same registration twice leaves the record unchanged.
    pub fn merge_content_type(
        &mut self,
        name: &str,
        factory: &ContentFactory,
        fields: Option<&[FormField]>,
    ) {
        match self.content_types.get_mut(name) {
            Some(record) => record.update(factory, fields),
            None => {
                self.content_types.insert(
                    name.to_string(),
                    ContentTypeRecord::new(name, factory, fields),
                );
            }
        }
    }

    /// Renders every widget in name order.
    pub fn render_all(
        &self,
        context: &WidgetContext,
        request: &WidgetRequest,
    ) -> Vec<(String, String)> {
        self.widgets
            .iter()
            .map(|(name, widget)| (name.clone(), widget.render(context, request)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::TikibarRegistry;
    use crate::model::content_type::{ContentFactory, FormField};
    use crate::model::widget::{Widget, WidgetContext, WidgetRequest};

    #[test]
    fn merge_is_idempotent() {
        let factory = ContentFactory::simple("Page", "myapp.content");
        let fields = vec![FormField::text("title")];
        let mut registry = TikibarRegistry::default();

        registry.merge_content_type("Page", &factory, Some(fields.as_slice()));
        let first = registry.content_type("Page").expect("page").form.clone();
        registry.merge_content_type("Page", &factory, Some(fields.as_slice()));

        assert_eq!(registry.content_types.len(), 1);
        assert_eq!(registry.content_type("Page").expect("page").form, first);
    }

    #[test]
    fn renders_widgets_in_name_order() {
        let mut registry = TikibarRegistry::default();
        registry.set_widget("timer", &Widget::new("timer", |_, _| "12ms".to_string()));
        registry.set_widget(
            "clock",
            &Widget::new("clock", |_, request| request.method.clone()),
        );

        let request = WidgetRequest {
            method: "POST".to_string(),
            path: "/".to_string(),
        };
        let rendered = registry.render_all(&WidgetContext::default(), &request);
        assert_eq!(
            rendered,
            vec![
                ("clock".to_string(), "POST".to_string()),
                ("timer".to_string(), "12ms".to_string()),
            ]
        );
    }
}
