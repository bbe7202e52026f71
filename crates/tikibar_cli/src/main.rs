//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `tikibar_core` linkage and run one demo configuration pass.
//! - Print the committed introspection as JSON for quick inspection.

use log::{error, info};
use std::process::ExitCode;
use tikibar_core::{
    default_log_level, init_logging, install, ConfigError, Configured, Configurator,
    ContentFactory, FormField, ReferenceTable, TikibarDirectives, Widget, WidgetContext,
    WidgetRequest,
};

const LOG_DIR_NAME: &str = "tikibar-cli-logs";

fn demo_resolver() -> Result<ReferenceTable, ConfigError> {
    let mut table = ReferenceTable::new();
    table.register_widget(
        "tikibar.widgets.request_path",
        Widget::new("request_path", |_, request| {
            format!("<code>{} {}</code>", request.method, request.path)
        })
        .in_module("tikibar.widgets"),
    )?;
    table.register_content_type(
        "tikibar.content.Note",
        ContentFactory::simple("Note", "tikibar.content"),
    )?;
    Ok(table)
}

fn configure() -> Result<Configured, ConfigError> {
    let mut config = Configurator::new(demo_resolver()?);
    install(&mut config)?;
    config.add_tikibar_widget("tikibar.widgets.request_path", None)?;
    config.add_tikibar_widget(
        Widget::new("resource", |context, _| {
            format!("<code>{}</code>", context.resource_path)
        }),
        None,
    )?;
    config.add_tikibar_content_type(
        "tikibar.content.Note",
        None,
        Some(vec![
            FormField::text("title").required(),
            FormField::text("body"),
        ]),
    )?;
    config.finish()
}

fn main() -> ExitCode {
    let log_dir = std::env::temp_dir().join(LOG_DIR_NAME);
    match init_logging(default_log_level(), &log_dir) {
        Ok(()) => println!("tikibar_core log_dir={}", log_dir.display()),
        Err(err) => eprintln!("logging disabled: {err}"),
    }

    let code = run();
    log::logger().flush();
    code
}

fn run() -> ExitCode {
    println!("tikibar_core ping={}", tikibar_core::ping());
    println!("tikibar_core version={}", tikibar_core::core_version());

    let configured = match configure() {
        Ok(configured) => configured,
        Err(err) => {
            error!("event=demo_config module=cli status=error error={err}");
            eprintln!("configuration failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        "event=demo_config module=cli status=ok introspectables={}",
        configured.introspector.len()
    );
    if let Some(tikibar) = configured.tikibar() {
        let context = WidgetContext {
            resource_path: "/".to_string(),
        };
        let request = WidgetRequest {
            method: "GET".to_string(),
            path: "/".to_string(),
        };
        for (name, html) in tikibar.render_all(&context, &request) {
            println!("widget {name}: {html}");
        }
    }

    match serde_json::to_string_pretty(&configured.introspector) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to serialize introspection: {err}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
