use log::debug;
use serde_json::Value;

use wizard_spec::{
    FieldKind, FieldTemplate, InputKind, InterpolateOpts, Mapper, ResolvedPair, StepTemplate,
    SubmissionData, UserContext, normalize_boolean,
};

use crate::engine::{BuildOptions, Engine};
use crate::errors::EngineError;
use crate::wizard::{Field, Step, Wizard};

/// Capability flags collected as a side effect of field construction.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BuildFlags {
    pub needs_categories: bool,
    pub needs_groups: bool,
}

impl Engine {
    /// Materializes a wizard for one user from its template plus the user's
    /// accumulated submission.
    ///
    /// Returns `Ok(None)` when the engine is disabled or no template
    /// resolves, and a wizard with zero steps when the user lacks access.
    /// Steps whose condition fails are omitted; steps whose required data
    /// fails are present but denied, with no fields built.
    pub fn build(
        &self,
        wizard_id: &str,
        user: &UserContext,
        opts: BuildOptions,
        params: &SubmissionData,
    ) -> Result<Option<Wizard>, EngineError> {
        if !self.enabled {
            debug!("wizard engine disabled, skipping build of '{wizard_id}'");
            return Ok(None);
        }
        let Some(template) = self.services.templates.resolve(wizard_id)? else {
            debug!("no template for wizard '{wizard_id}'");
            return Ok(None);
        };

        let mut submission = self.services.submissions.current(wizard_id, user.id)?;
        let mut wizard = Wizard::new(&template, user.clone());

        if !self.services.access.can_access(user, &template) {
            debug!("user {} denied access to wizard '{wizard_id}'", user.id);
            wizard.submission = submission;
            return Ok(Some(wizard));
        }

        let reset = opts.reset || template.restart_on_revisit;
        let mut flags = BuildFlags::default();

        for step_template in &template.steps {
            if !Mapper::new(user, submission.as_ref()).check(&step_template.condition) {
                continue;
            }

            let mut step = Step::new(&step_template.id);
            check_permitted(&mut step, step_template, user, submission.as_ref());

            if step.permitted {
                self.save_permitted_params(
                    wizard_id,
                    user,
                    step_template,
                    params,
                    &mut submission,
                )?;
                apply_step_attributes(&mut step, step_template, user, submission.as_ref());
                build_fields(
                    &mut step,
                    step_template,
                    user,
                    submission.as_ref(),
                    reset,
                    &mut flags,
                );
            }

            wizard.steps.push(step);
        }

        wizard.needs_categories = flags.needs_categories;
        wizard.needs_groups = flags.needs_groups;
        fix_step_order(&mut wizard);
        wizard.submission = submission;
        Ok(Some(wizard))
    }

    /// Copies declared request parameters straight into the submission and
    /// persists, before any field of the step is built.
    fn save_permitted_params(
        &self,
        wizard_id: &str,
        user: &UserContext,
        step_template: &StepTemplate,
        params: &SubmissionData,
        submission: &mut Option<SubmissionData>,
    ) -> Result<(), EngineError> {
        if step_template.permitted_params.is_empty() {
            return Ok(());
        }

        let mut data = submission.take().unwrap_or_default();
        for permitted in &step_template.permitted_params {
            let Some(pair) = permitted.mapping() else {
                continue;
            };
            if pair.key.is_empty() || pair.value.is_empty() {
                continue;
            }
            if let Some(value) = params.get(&pair.key) {
                data.insert(pair.value.clone(), value.clone());
            }
        }

        self.services.submissions.save(wizard_id, user.id, &data)?;
        *submission = Some(data);
        Ok(())
    }
}

/// Required-data gate. Rules evaluate in order and short-circuit on the
/// first failure; a rule with usable pairs but no submission denies
/// immediately.
pub(crate) fn check_permitted(
    step: &mut Step,
    step_template: &StepTemplate,
    user: &UserContext,
    submission: Option<&SubmissionData>,
) {
    step.permitted = true;

    for required in &step_template.required_data {
        let pairs: Vec<_> = required
            .pairs
            .iter()
            .filter(|pair| pair.is_usable())
            .collect();
        if pairs.is_empty() {
            continue;
        }
        if submission.is_none() {
            step.permitted = false;
            break;
        }

        let resolved: Vec<ResolvedPair> = pairs
            .iter()
            .map(|pair| ResolvedPair {
                key: submission.and_then(|data| data.get(&pair.key)).cloned(),
                connector: pair.connector,
                value: pair.value.clone(),
            })
            .collect();

        if !Mapper::new(user, submission).validate_pairs(&resolved) {
            step.permitted = false;
            break;
        }
    }

    if !step.permitted {
        step.permitted_message = step_template.required_data_message.clone();
    }
}

fn apply_step_attributes(
    step: &mut Step,
    step_template: &StepTemplate,
    user: &UserContext,
    submission: Option<&SubmissionData>,
) {
    step.index = step_template.index;
    step.title = step_template.title.clone();
    step.banner = step_template.banner.clone();
    step.key = step_template.key.clone();
    step.force_final = step_template.force_final;

    if let Some(description) = &step_template.description {
        step.description = Some(
            Mapper::new(user, submission).interpolate(description, InterpolateOpts::all()),
        );
    }
}

/// Builds the step's fields in template order, skipping fields whose own
/// condition fails, then fixes display order.
pub(crate) fn build_fields(
    step: &mut Step,
    step_template: &StepTemplate,
    user: &UserContext,
    submission: Option<&SubmissionData>,
    reset: bool,
    flags: &mut BuildFlags,
) {
    for field_template in &step_template.fields {
        let mapper = Mapper::new(user, submission);
        if !mapper.check(&field_template.condition) {
            continue;
        }
        step.fields
            .push(build_field(field_template, &mapper, submission, reset, flags));
    }
    fix_field_order(step);
}

fn build_field(
    field_template: &FieldTemplate,
    mapper: &Mapper<'_>,
    submission: Option<&SubmissionData>,
    reset: bool,
    flags: &mut BuildFlags,
) -> Field {
    let mut field = Field {
        id: field_template.id.clone(),
        kind: field_template.kind,
        required: field_template.required,
        label: field_template.label.clone(),
        description: field_template.description.clone(),
        image: field_template.image.clone(),
        key: field_template.key.clone(),
        validations: field_template.validations.clone(),
        min_length: field_template.min_length,
        max_length: field_template.max_length,
        char_counter: field_template.char_counter,
        value: None,
        content: None,
        index: None,
        file_types: None,
        format: None,
        limit: None,
        property: None,
    };

    if !field_template.prefill.is_empty() {
        field.value = mapper.perform(&field_template.prefill);
    }
    // Reset means "ignore prior submission value", not "ignore prefill".
    if !reset
        && let Some(data) = submission
        && let Some(value) = data.get(&field_template.id)
    {
        field.value = Some(value.clone());
    }

    match field_template.kind {
        FieldKind::Group => {
            if let Some(Value::Array(items)) = &field.value
                && let Some(first) = items.first()
            {
                field.value = Some(first.clone());
            }
        }
        FieldKind::Checkbox => {
            field.value = Some(Value::Bool(normalize_boolean(field.value.as_ref())));
        }
        FieldKind::Upload => {
            field.file_types = field_template.file_types.clone();
        }
        FieldKind::Category | FieldKind::Tag => {
            field.limit = field_template.limit;
            if field_template.kind == FieldKind::Category {
                field.property = field_template.property.clone();
            }
        }
        kind if kind.is_date_like() => {
            field.format = field_template.format.clone();
        }
        _ => {}
    }

    if field_template.kind == FieldKind::Category || field_template.wants_category_data() {
        flags.needs_categories = true;
    }
    if field_template.kind == FieldKind::Group {
        flags.needs_groups = true;
    }

    if !field_template.content.is_empty()
        && let Some(output) = mapper.perform_with_type(&field_template.content)
        && content_present(&output.value)
    {
        field.content = Some(match output.kind {
            InputKind::Association => association_content(output.value),
            InputKind::Assignment if field_template.kind == FieldKind::Dropdown => {
                assignment_content(output.value)
            }
            _ => output.value,
        });
    }

    if !field_template.index.is_empty()
        && let Some(index) = mapper.perform(&field_template.index)
    {
        field.index = Some(integer_form(&index));
    }

    field
}

/// Association results become `{id, name}` entries from each item's
/// key/value pair.
fn association_content(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| {
                    let id = item.get("key").cloned().unwrap_or(Value::Null);
                    let name = item.get("value").cloned().unwrap_or(Value::Null);
                    serde_json::json!({ "id": id, "name": name })
                })
                .collect(),
        ),
        other => other,
    }
}

/// Assignment results feeding a dropdown duplicate each raw value as both
/// id and name.
fn assignment_content(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| serde_json::json!({ "id": item, "name": item }))
                .collect(),
        ),
        other => other,
    }
}

fn content_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

fn integer_form(value: &Value) -> i64 {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|num| num as i64))
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .unwrap_or(0)
}

/// Stable sort by explicit index where set, template position otherwise,
/// then reassign sequential indexes.
fn fix_step_order(wizard: &mut Wizard) {
    let mut keyed: Vec<(i64, Step)> = wizard
        .steps
        .drain(..)
        .enumerate()
        .map(|(position, step)| (step.index.unwrap_or(position as i64), step))
        .collect();
    keyed.sort_by_key(|(key, _)| *key);
    wizard.steps = keyed
        .into_iter()
        .enumerate()
        .map(|(position, (_, mut step))| {
            step.index = Some(position as i64);
            step
        })
        .collect();
}

fn fix_field_order(step: &mut Step) {
    let mut keyed: Vec<(i64, Field)> = step
        .fields
        .drain(..)
        .enumerate()
        .map(|(position, field)| (field.index.unwrap_or(position as i64), field))
        .collect();
    keyed.sort_by_key(|(key, _)| *key);
    step.fields = keyed.into_iter().map(|(_, field)| field).collect();
}
