//! The plugin host.
//!
//! Plugins are data: a name plus a registration function invoked exactly
//! once, at load time, with write access to the registry builder and read
//! access to the theme tables. Loading happens in configuration-declared
//! order before any scanning begins, so the registry's append-only ranks
//! reflect the declared order deterministically. A plugin that fails to
//! load aborts the whole run; there is no partial registration.

use tracing::debug;

use crate::error::{EngineError, PluginError};
use crate::registry::{exact, value, Registration, RegistryBuilder, ValueKind};
use crate::theme::Theme;

/// A loadable plugin. `register` receives the builder and the shared
/// theme; everything it contributes lands in one [`Registration`].
#[derive(Debug, Clone, Copy)]
pub struct Plugin {
    pub name: &'static str,
    pub register: fn(&Theme) -> Result<Registration, PluginError>,
}

/// Look up a plugin in the built-in catalog.
pub fn builtin(id: &str) -> Option<Plugin> {
    match id {
        "forms" => Some(Plugin {
            name: "forms",
            register: register_forms,
        }),
        "typography" => Some(Plugin {
            name: "typography",
            register: register_typography,
        }),
        "aspect-ratio" => Some(Plugin {
            name: "aspect-ratio",
            register: register_aspect_ratio,
        }),
        _ => None,
    }
}

/// Load catalog plugins by id, then any programmatically supplied extras,
/// in order. Must complete before the registry freezes; a failure names
/// the offending plugin and aborts the run.
pub fn load_all(
    ids: &[String],
    extras: &[Plugin],
    builder: &mut RegistryBuilder,
    theme: &Theme,
) -> Result<(), EngineError> {
    for id in ids {
        let plugin = builtin(id).ok_or_else(|| EngineError::Plugin {
            plugin: id.clone(),
            source: PluginError::Unknown,
        })?;
        load_one(plugin, builder, theme)?;
    }
    for plugin in extras {
        load_one(*plugin, builder, theme)?;
    }
    Ok(())
}

fn load_one(
    plugin: Plugin,
    builder: &mut RegistryBuilder,
    theme: &Theme,
) -> Result<(), EngineError> {
    let registration = (plugin.register)(theme).map_err(|source| EngineError::Plugin {
        plugin: plugin.name.to_string(),
        source,
    })?;
    debug!("loaded plugin '{}'", plugin.name);
    builder.register(registration);
    Ok(())
}

/// Form-control reset utilities. Border and accent colors come from the
/// shared theme so overrides flow through.
fn register_forms(theme: &Theme) -> Result<Registration, PluginError> {
    let border = theme.color_value("gray-500").unwrap_or("#6b7280").to_string();
    let accent = theme.color_value("blue-600").unwrap_or("#2563eb").to_string();

    let field = format!(
        "appearance:none;background-color:#ffffff;border-color:{};border-width:1px;border-radius:0;padding:0.5rem 0.75rem;font-size:1rem;line-height:1.5",
        border
    );
    let toggle = format!(
        "appearance:none;display:inline-block;vertical-align:middle;flex-shrink:0;user-select:none;height:1rem;width:1rem;color:{};background-color:#ffffff;border-color:{};border-width:1px",
        accent, border
    );

    let mut reg = Registration::named("forms");
    reg.rules = vec![
        exact("form-input", &field),
        exact("form-textarea", &field),
        exact("form-select", &field),
        exact("form-multiselect", &field),
        exact("form-checkbox", &format!("{};border-radius:0.25rem", toggle)),
        exact("form-radio", &format!("{};border-radius:100%", toggle)),
    ];
    Ok(reg)
}

/// Long-form prose styling.
fn register_typography(_theme: &Theme) -> Result<Registration, PluginError> {
    let mut reg = Registration::named("typography");
    reg.rules = vec![
        exact(
            "prose",
            "color:var(--tw-prose-body);max-width:65ch;font-size:1rem;line-height:1.75",
        ),
        exact("prose-sm", "font-size:0.875rem;line-height:1.7142857"),
        exact("prose-lg", "font-size:1.125rem;line-height:1.7777778"),
        exact(
            "prose-invert",
            "--tw-prose-body:var(--tw-prose-invert-body);color:var(--tw-prose-body)",
        ),
    ];
    Ok(reg)
}

/// Aspect ratio utilities, including the arbitrary `aspect-[4/3]` form.
fn register_aspect_ratio(_theme: &Theme) -> Result<Registration, PluginError> {
    let mut reg = Registration::named("aspect-ratio");
    reg.rules = vec![
        exact("aspect-auto", "aspect-ratio:auto"),
        exact("aspect-square", "aspect-ratio:1 / 1"),
        exact("aspect-video", "aspect-ratio:16 / 9"),
        value("aspect", ValueKind::Arbitrary, "aspect-ratio:{value}"),
    ];
    Ok(reg)
}

// Exercised by tests: a plugin wired to fail at registration time.
#[cfg(test)]
fn register_broken(_theme: &Theme) -> Result<Registration, PluginError> {
    Err(PluginError::Registration(
        "malformed plugin spec".to_string(),
    ))
}

#[cfg(test)]
pub(crate) fn broken_plugin() -> Plugin {
    Plugin {
        name: "broken",
        register: register_broken,
    }
}
