use serde_json::json;

use wizard_spec::{FieldKind, WizardTemplate};

fn fixture() -> WizardTemplate {
    serde_json::from_str(include_str!("fixtures/onboarding_wizard.json")).expect("deserialize")
}

#[test]
fn template_round_trips_from_fixture() {
    let template = fixture();
    assert_eq!(template.id, "onboarding");
    assert_eq!(template.steps.len(), 2);
    assert!(!template.restart_on_revisit);

    let welcome = template.step("welcome").expect("welcome step");
    assert_eq!(welcome.fields.len(), 2);
    assert_eq!(welcome.fields[0].kind, FieldKind::Text);
    assert!(welcome.fields[0].required);
    assert_eq!(welcome.fields[1].kind, FieldKind::Checkbox);

    let team = template.step("team").expect("team step");
    assert_eq!(team.condition.len(), 1);
    assert_eq!(team.required_data.len(), 1);
    assert_eq!(
        team.required_data_message.as_deref(),
        Some("Tell us your name first.")
    );
}

#[test]
fn actions_filter_by_run_after() {
    let template = fixture();
    let after_team: Vec<_> = template.actions_after("team").collect();
    assert_eq!(after_team.len(), 1);
    assert_eq!(after_team[0].kind, "send_message");
    assert_eq!(after_team[0].params["target"], json!("team_lead"));

    assert_eq!(template.actions_after("welcome").count(), 0);
}

#[test]
fn required_data_pairs_report_usability() {
    let template = fixture();
    let team = template.step("team").expect("team step");
    assert!(team.required_data[0].pairs[0].is_usable());
}

#[test]
fn unknown_step_is_absent() {
    assert!(fixture().step("does-not-exist").is_none());
}
