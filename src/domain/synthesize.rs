//! Statement synthesis.
//!
//! Renders the injected `log::info!` statement and the logger constant. The
//! macro path is fully qualified so the patched file needs no new `use`
//! items, and parameters are captured as structured values (`:%` Display
//! capture of the live binding), never interpolated into the message.

use crate::domain::classify::ActionClass;
use crate::domain::conventions::{LOGGER_CONST, MARKER};

/// Render the statement injected at the top of an instrumented method.
///
/// Shape:
/// `log::info!(event = "db-write", action = "WRITE", class = Self::LOG_CLASS,
///  method = "create_widget", widget_id:% = widget_id; "LPS");`
pub fn render_log_statement(class: ActionClass, method_name: &str, params: &[String]) -> String {
    let mut stmt = format!(
        "log::info!(event = \"{}\", action = \"{}\", class = Self::{}, method = \"{}\"",
        class.event(),
        class.action(),
        LOGGER_CONST,
        method_name,
    );
    for param in params {
        stmt.push_str(&format!(", {param}:% = {param}"));
    }
    stmt.push_str(&format!("; \"{MARKER}\");"));
    stmt
}

/// Render the associated constant ensured on every target type. The injected
/// statements read it as `Self::LOG_CLASS`.
pub fn render_logger_const(type_name: &str) -> String {
    format!("const {LOGGER_CONST}: &'static str = \"{type_name}\";")
}
