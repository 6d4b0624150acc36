use std::sync::Arc;

use serde_json::{Value, json};

use wizard_engine::stubs::{
    BasicFieldValidator, MemorySubmissions, NoAccess, OpenAccess, RecordingExecutor,
    StaticTemplates,
};
use wizard_engine::{BuildOptions, Engine, EngineServices, StepHandlerRegistry, SubmissionStore};
use wizard_spec::{SubmissionData, UserContext, WizardTemplate};

fn template(value: Value) -> WizardTemplate {
    serde_json::from_value(value).expect("deserialize template")
}

fn data(value: Value) -> SubmissionData {
    value.as_object().cloned().expect("object fixture")
}

fn user() -> UserContext {
    UserContext {
        id: 42,
        username: "grace".into(),
        name: Some("Grace Hopper".into()),
        email: None,
        custom: Default::default(),
    }
}

struct Harness {
    engine: Engine,
    submissions: Arc<MemorySubmissions>,
}

fn harness(template: WizardTemplate) -> Harness {
    let submissions = Arc::new(MemorySubmissions::new());
    let engine = Engine::new(
        EngineServices {
            templates: Arc::new(StaticTemplates::with(template)),
            submissions: Arc::clone(&submissions) as Arc<dyn SubmissionStore>,
            access: Arc::new(OpenAccess),
            validator: Arc::new(BasicFieldValidator),
            actions: Arc::new(RecordingExecutor::new()),
        },
        Arc::new(StepHandlerRegistry::new()),
    );
    Harness {
        engine,
        submissions,
    }
}

fn gated_template() -> WizardTemplate {
    template(json!({
        "id": "upgrade",
        "steps": [
            { "id": "intro", "fields": [] },
            {
                "id": "gold_perks",
                "condition": [{
                    "type": "conditional",
                    "pairs": [{
                        "key": { "source": "submission", "key": "tier" },
                        "value": { "source": "literal", "value": "gold" }
                    }]
                }],
                "fields": []
            }
        ]
    }))
}

#[test]
fn disabled_engine_builds_nothing() {
    let harness = harness(gated_template());
    let engine = harness.engine.with_enabled(false);
    let wizard = engine
        .build("upgrade", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build");
    assert!(wizard.is_none());
}

#[test]
fn missing_template_builds_nothing() {
    let harness = harness(gated_template());
    let wizard = harness
        .engine
        .build("unknown", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build");
    assert!(wizard.is_none());
}

#[test]
fn denied_access_returns_wizard_without_steps() {
    let submissions = Arc::new(MemorySubmissions::new());
    let engine = Engine::new(
        EngineServices {
            templates: Arc::new(StaticTemplates::with(gated_template())),
            submissions,
            access: Arc::new(NoAccess),
            validator: Arc::new(BasicFieldValidator),
            actions: Arc::new(RecordingExecutor::new()),
        },
        Arc::new(StepHandlerRegistry::new()),
    );
    let wizard = engine
        .build("upgrade", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    assert!(wizard.steps.is_empty());
}

#[test]
fn failing_step_condition_omits_the_step() {
    let harness = harness(gated_template());
    harness
        .submissions
        .seed("upgrade", 42, data(json!({ "tier": "silver" })));

    let wizard = harness
        .engine
        .build("upgrade", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    assert!(wizard.step("intro").is_some());
    assert!(wizard.step("gold_perks").is_none());
}

#[test]
fn passing_step_condition_keeps_the_step() {
    let harness = harness(gated_template());
    harness
        .submissions
        .seed("upgrade", 42, data(json!({ "tier": "gold" })));

    let wizard = harness
        .engine
        .build("upgrade", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    assert!(wizard.step("gold_perks").is_some());
}

#[test]
fn failing_field_condition_omits_the_field() {
    let harness = harness(template(json!({
        "id": "survey",
        "steps": [{
            "id": "details",
            "fields": [
                { "id": "always", "type": "text" },
                {
                    "id": "gold_only",
                    "type": "text",
                    "condition": [{
                        "type": "conditional",
                        "pairs": [{
                            "key": { "source": "submission", "key": "tier" },
                            "value": { "source": "literal", "value": "gold" }
                        }]
                    }]
                }
            ]
        }]
    })));
    harness
        .submissions
        .seed("survey", 42, data(json!({ "tier": "silver" })));

    let wizard = harness
        .engine
        .build("survey", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    let step = wizard.step("details").expect("step");
    assert!(step.field("always").is_some());
    assert!(step.field("gold_only").is_none());
}

fn prefill_template() -> WizardTemplate {
    template(json!({
        "id": "profile",
        "steps": [{
            "id": "about",
            "fields": [{
                "id": "display_name",
                "type": "text",
                "prefill": [{
                    "type": "assignment",
                    "output": { "source": "user", "attribute": "name" }
                }]
            }]
        }]
    }))
}

#[test]
fn submission_value_overrides_prefill_without_reset() {
    let harness = harness(prefill_template());
    harness
        .submissions
        .seed("profile", 42, data(json!({ "display_name": "Amazing Grace" })));

    let wizard = harness
        .engine
        .build("profile", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    let field = wizard.step("about").unwrap().field("display_name").unwrap();
    assert_eq!(field.value, Some(json!("Amazing Grace")));
}

#[test]
fn reset_prefers_prefill_over_stale_submission() {
    let harness = harness(prefill_template());
    harness
        .submissions
        .seed("profile", 42, data(json!({ "display_name": "Amazing Grace" })));

    let wizard = harness
        .engine
        .build(
            "profile",
            &user(),
            BuildOptions { reset: true },
            &data(json!({})),
        )
        .expect("build")
        .expect("wizard");
    let field = wizard.step("about").unwrap().field("display_name").unwrap();
    assert_eq!(field.value, Some(json!("Grace Hopper")));
}

#[test]
fn restart_on_revisit_forces_reset() {
    let mut revisit = prefill_template();
    revisit.restart_on_revisit = true;
    let harness = harness(revisit);
    harness
        .submissions
        .seed("profile", 42, data(json!({ "display_name": "Amazing Grace" })));

    let wizard = harness
        .engine
        .build("profile", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    let field = wizard.step("about").unwrap().field("display_name").unwrap();
    assert_eq!(field.value, Some(json!("Grace Hopper")));
}

#[test]
fn checkbox_values_normalize_to_booleans() {
    let checkbox = template(json!({
        "id": "consent",
        "steps": [{
            "id": "terms",
            "fields": [{ "id": "agreed", "type": "checkbox" }]
        }]
    }));

    for (seeded, expected) in [
        (json!("true"), true),
        (json!("1"), true),
        (json!(true), true),
        (json!("false"), false),
        (json!("0"), false),
        (json!(false), false),
    ] {
        let harness = harness(checkbox.clone());
        harness
            .submissions
            .seed("consent", 42, data(json!({ "agreed": seeded.clone() })));
        let wizard = harness
            .engine
            .build("consent", &user(), BuildOptions::default(), &data(json!({})))
            .expect("build")
            .expect("wizard");
        let field = wizard.step("terms").unwrap().field("agreed").unwrap();
        assert_eq!(field.value, Some(json!(expected)), "seeded {seeded}");
    }

    // Absent value also normalizes to false.
    let harness = harness(checkbox);
    let wizard = harness
        .engine
        .build("consent", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    let field = wizard.step("terms").unwrap().field("agreed").unwrap();
    assert_eq!(field.value, Some(json!(false)));
}

fn permission_template() -> WizardTemplate {
    template(json!({
        "id": "review",
        "steps": [{
            "id": "approve",
            "required_data": [{
                "pairs": [{
                    "key": "state",
                    "value": { "source": "literal", "value": "submitted" }
                }]
            }],
            "required_data_message": "Submit your draft first.",
            "fields": [{ "id": "verdict", "type": "text" }]
        }]
    }))
}

#[test]
fn failing_required_data_denies_step_and_skips_fields() {
    let harness = harness(permission_template());
    harness
        .submissions
        .seed("review", 42, data(json!({ "state": "draft" })));

    let wizard = harness
        .engine
        .build("review", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    let step = wizard.step("approve").expect("step exists while denied");
    assert!(!step.permitted);
    assert_eq!(
        step.permitted_message.as_deref(),
        Some("Submit your draft first.")
    );
    assert!(step.fields.is_empty());
}

#[test]
fn required_data_without_submission_denies_immediately() {
    let harness = harness(permission_template());
    let wizard = harness
        .engine
        .build("review", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    assert!(!wizard.step("approve").unwrap().permitted);
}

#[test]
fn satisfied_required_data_permits_step() {
    let harness = harness(permission_template());
    harness
        .submissions
        .seed("review", 42, data(json!({ "state": "submitted" })));

    let wizard = harness
        .engine
        .build("review", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    let step = wizard.step("approve").unwrap();
    assert!(step.permitted);
    assert_eq!(step.fields.len(), 1);
}

#[test]
fn permitted_params_are_copied_into_the_submission_and_persisted() {
    let harness = harness(template(json!({
        "id": "import",
        "steps": [{
            "id": "landing",
            "permitted_params": [{
                "pairs": [{ "key": "ref", "value": "referral_code" }]
            }],
            "fields": []
        }]
    })));

    let wizard = harness
        .engine
        .build(
            "import",
            &user(),
            BuildOptions::default(),
            &data(json!({ "ref": "FRIEND-2024" })),
        )
        .expect("build")
        .expect("wizard");

    assert_eq!(
        wizard.submission.as_ref().unwrap()["referral_code"],
        json!("FRIEND-2024")
    );
    let persisted = harness
        .submissions
        .current("import", 42)
        .expect("store")
        .expect("saved");
    assert_eq!(persisted["referral_code"], json!("FRIEND-2024"));
}

#[test]
fn description_interpolates_user_and_submission_tokens() {
    let harness = harness(template(json!({
        "id": "greeting",
        "steps": [{
            "id": "hello",
            "description": "Hello {{user.username}}, project {{value.project}}.",
            "fields": []
        }]
    })));
    harness
        .submissions
        .seed("greeting", 42, data(json!({ "project": "Mark I" })));

    let wizard = harness
        .engine
        .build("greeting", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    assert_eq!(
        wizard.step("hello").unwrap().description.as_deref(),
        Some("Hello grace, project Mark I.")
    );
}

#[test]
fn association_content_maps_to_id_name_pairs() {
    let harness = harness(template(json!({
        "id": "teams",
        "steps": [{
            "id": "pick",
            "fields": [{
                "id": "team",
                "type": "dropdown",
                "content": [{
                    "type": "association",
                    "pairs": [
                        { "key": "eng", "value": "Engineering" },
                        { "key": "ops", "value": "Operations" }
                    ]
                }]
            }]
        }]
    })));

    let wizard = harness
        .engine
        .build("teams", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    let field = wizard.step("pick").unwrap().field("team").unwrap();
    assert_eq!(
        field.content,
        Some(json!([
            { "id": "eng", "name": "Engineering" },
            { "id": "ops", "name": "Operations" }
        ]))
    );
}

#[test]
fn assignment_content_on_dropdown_duplicates_values() {
    let harness = harness(template(json!({
        "id": "colors",
        "steps": [{
            "id": "pick",
            "fields": [{
                "id": "color",
                "type": "dropdown",
                "content": [{
                    "type": "assignment",
                    "output": { "source": "submission", "key": "palette" }
                }]
            }]
        }]
    })));
    harness
        .submissions
        .seed("colors", 42, data(json!({ "palette": ["red", "blue"] })));

    let wizard = harness
        .engine
        .build("colors", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    let field = wizard.step("pick").unwrap().field("color").unwrap();
    assert_eq!(
        field.content,
        Some(json!([
            { "id": "red", "name": "red" },
            { "id": "blue", "name": "blue" }
        ]))
    );
}

#[test]
fn index_expression_coerces_and_absence_sets_none() {
    let harness = harness(template(json!({
        "id": "ordered",
        "steps": [{
            "id": "page",
            "fields": [
                {
                    "id": "second",
                    "type": "text",
                    "index": [{
                        "type": "assignment",
                        "output": { "source": "literal", "value": "1" }
                    }]
                },
                { "id": "first", "type": "text" }
            ]
        }]
    })));

    let wizard = harness
        .engine
        .build("ordered", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    let step = wizard.step("page").unwrap();
    assert_eq!(step.field("second").unwrap().index, Some(1));
    assert_eq!(step.field("first").unwrap().index, None);
    // Explicit index 1 ties with "first"'s position 1; the explicit field
    // sorted stably ahead by template order.
    assert_eq!(step.fields[0].id, "second");
}

#[test]
fn group_field_takes_first_element_and_flags_groups() {
    let harness = harness(template(json!({
        "id": "membership",
        "steps": [{
            "id": "join",
            "fields": [{ "id": "squad", "type": "group" }]
        }]
    })));
    harness
        .submissions
        .seed("membership", 42, data(json!({ "squad": ["alpha", "beta"] })));

    let wizard = harness
        .engine
        .build(
            "membership",
            &user(),
            BuildOptions::default(),
            &data(json!({})),
        )
        .expect("build")
        .expect("wizard");
    assert!(wizard.needs_groups);
    assert!(!wizard.needs_categories);
    let field = wizard.step("join").unwrap().field("squad").unwrap();
    assert_eq!(field.value, Some(json!("alpha")));
}

#[test]
fn category_field_flags_categories_and_carries_parameters() {
    let harness = harness(template(json!({
        "id": "posting",
        "steps": [{
            "id": "where",
            "fields": [{
                "id": "cat",
                "type": "category",
                "limit": 3,
                "property": "slug"
            }]
        }]
    })));

    let wizard = harness
        .engine
        .build("posting", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    assert!(wizard.needs_categories);
    let field = wizard.step("where").unwrap().field("cat").unwrap();
    assert_eq!(field.limit, Some(3));
    assert_eq!(field.property.as_deref(), Some("slug"));
}

#[test]
fn similar_topics_validation_flags_categories() {
    let harness = harness(template(json!({
        "id": "topics",
        "steps": [{
            "id": "compose",
            "fields": [{
                "id": "title",
                "type": "text",
                "validations": {
                    "similar_topics": { "categories": [4, 7] }
                }
            }]
        }]
    })));

    let wizard = harness
        .engine
        .build("topics", &user(), BuildOptions::default(), &data(json!({})))
        .expect("build")
        .expect("wizard");
    assert!(wizard.needs_categories);
}

#[test]
fn steps_sort_by_declared_index_then_renumber() {
    let harness = harness(template(json!({
        "id": "reordered",
        "steps": [
            { "id": "later", "index": 5, "fields": [] },
            { "id": "earlier", "index": 0, "fields": [] }
        ]
    })));

    let wizard = harness
        .engine
        .build(
            "reordered",
            &user(),
            BuildOptions::default(),
            &data(json!({})),
        )
        .expect("build")
        .expect("wizard");
    assert_eq!(wizard.steps[0].id, "earlier");
    assert_eq!(wizard.steps[0].index, Some(0));
    assert_eq!(wizard.steps[1].id, "later");
    assert_eq!(wizard.steps[1].index, Some(1));
}

#[test]
fn upload_and_date_fields_carry_type_specific_parameters() {
    let harness = harness(template(json!({
        "id": "attachments",
        "steps": [{
            "id": "extra",
            "fields": [
                { "id": "proof", "type": "upload", "file_types": ".pdf,.png" },
                { "id": "deadline", "type": "date", "format": "YYYY-MM-DD" }
            ]
        }]
    })));

    let wizard = harness
        .engine
        .build(
            "attachments",
            &user(),
            BuildOptions::default(),
            &data(json!({})),
        )
        .expect("build")
        .expect("wizard");
    let step = wizard.step("extra").unwrap();
    assert_eq!(
        step.field("proof").unwrap().file_types.as_deref(),
        Some(".pdf,.png")
    );
    assert_eq!(
        step.field("deadline").unwrap().format.as_deref(),
        Some("YYYY-MM-DD")
    );
}
