use handlebars::Handlebars;
use serde_json::{Map, Value};

use crate::submission::SubmissionData;
use crate::user::UserContext;

/// Which token namespaces are exposed to a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolateOpts {
    pub user: bool,
    pub value: bool,
}

impl InterpolateOpts {
    pub fn all() -> Self {
        Self {
            user: true,
            value: true,
        }
    }
}

/// Renders `{{user.*}}` and `{{value.*}}` tokens into a template string.
///
/// Runs handlebars in its default non-strict mode so missing tokens render
/// empty. A template that fails to parse is returned unchanged rather than
/// surfaced as an error.
pub fn interpolate(
    template: &str,
    user: &UserContext,
    data: Option<&SubmissionData>,
    opts: InterpolateOpts,
) -> String {
    if !template.contains("{{") {
        return template.to_string();
    }

    let mut ctx = Map::new();
    if opts.user {
        ctx.insert(
            "user".into(),
            serde_json::to_value(user).unwrap_or(Value::Null),
        );
    }
    if opts.value {
        let values = data.cloned().unwrap_or_default();
        ctx.insert("value".into(), Value::Object(values));
    }

    let registry = Handlebars::new();
    match registry.render_template(template, &Value::Object(ctx)) {
        Ok(rendered) => rendered,
        Err(_) => template.to_string(),
    }
}
