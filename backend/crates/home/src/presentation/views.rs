//! HTML views
//!
//! Templates are compiled into the binary. Placeholders are `{{name}}`,
//! filled in a single pass so substituted values are never re-scanned.
//! Every dynamic value is escaped before it is substituted.

use platform::html::escape;

use crate::domain::error_view_model::ErrorViewModel;

const LAYOUT: &str = include_str!("../../templates/_layout.html");
const INDEX: &str = include_str!("../../templates/index.html");
const PRIVACY: &str = include_str!("../../templates/privacy.html");
const ERROR: &str = include_str!("../../templates/error.html");
const DEVELOPER_ERROR: &str = include_str!("../../templates/developer_error.html");

/// Fill `{{name}}` placeholders from `values`; unknown ones are kept as is
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after.find("}}").and_then(|end| {
            let name = &after[..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });

        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Wrap a page body in the shared layout
pub fn layout(title: &str, body: &str) -> String {
    let title = escape(title);
    render(LAYOUT, &[("title", title.as_ref()), ("body", body)])
}

pub fn index_page() -> String {
    layout("Home Page", INDEX)
}

pub fn privacy_page() -> String {
    layout("Privacy Policy", PRIVACY)
}

pub fn error_page(model: &ErrorViewModel) -> String {
    let request_id = match model.request_id.as_deref() {
        Some(id) if model.show_request_id() => format!(
            "<p>\n    <strong>Request ID:</strong> <code>{}</code>\n</p>",
            escape(id)
        ),
        _ => String::new(),
    };

    layout("Error", &render(ERROR, &[("request_id", request_id.as_str())]))
}

/// Detailed page for an unhandled failure, shown only in Development
pub fn developer_error_page(
    request_id: &str,
    kind: &str,
    message: &str,
    sources: &[String],
) -> String {
    let sources: String = sources
        .iter()
        .map(|source| format!("    <li><pre>{}</pre></li>\n", escape(source)))
        .collect();

    let (kind, message, request_id) = (escape(kind), escape(message), escape(request_id));
    let body = render(
        DEVELOPER_ERROR,
        &[
            ("kind", kind.as_ref()),
            ("message", message.as_ref()),
            ("request_id", request_id.as_ref()),
            ("sources", sources.as_str()),
        ],
    );

    layout("Internal Server Error", &body)
}
