use serde_json::json;

use wizard_spec::{InterpolateOpts, SubmissionData, UserContext, interpolate};

fn user() -> UserContext {
    UserContext {
        id: 3,
        username: "marie".into(),
        name: Some("Marie Curie".into()),
        email: None,
        custom: Default::default(),
    }
}

fn submission() -> SubmissionData {
    json!({ "project": "Radium Study" })
        .as_object()
        .cloned()
        .expect("object fixture")
}

#[test]
fn interpolates_user_and_submission_tokens() {
    let data = submission();
    let rendered = interpolate(
        "Welcome {{user.username}}, continuing {{value.project}}.",
        &user(),
        Some(&data),
        InterpolateOpts::all(),
    );
    assert_eq!(rendered, "Welcome marie, continuing Radium Study.");
}

#[test]
fn missing_tokens_render_empty() {
    let rendered = interpolate(
        "Hello {{value.nothing}}{{user.unknown}}!",
        &user(),
        None,
        InterpolateOpts::all(),
    );
    assert_eq!(rendered, "Hello !");
}

#[test]
fn disabled_namespaces_are_not_exposed() {
    let data = submission();
    let rendered = interpolate(
        "{{value.project}}",
        &user(),
        Some(&data),
        InterpolateOpts {
            user: true,
            value: false,
        },
    );
    assert_eq!(rendered, "");
}

#[test]
fn malformed_template_is_returned_unchanged() {
    let raw = "Broken {{#if}} template";
    let rendered = interpolate(raw, &user(), None, InterpolateOpts::all());
    assert_eq!(rendered, raw);
}

#[test]
fn plain_strings_pass_through() {
    let rendered = interpolate("No tokens here", &user(), None, InterpolateOpts::all());
    assert_eq!(rendered, "No tokens here");
}
