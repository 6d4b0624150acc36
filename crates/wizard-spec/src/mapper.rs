use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::interpolate::{self, InterpolateOpts};
use crate::submission::SubmissionData;
use crate::user::UserContext;

/// One side of a mapper comparison or the product of a value lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Operand {
    Literal { value: Value },
    Submission { key: String },
    User { attribute: String },
}

impl Operand {
    /// Whether the operand carries anything worth evaluating. Blank literals
    /// count as absent, matching how templates are authored.
    pub fn is_present(&self) -> bool {
        match self {
            Operand::Literal { value } => match value {
                Value::Null => false,
                Value::String(text) => !text.trim().is_empty(),
                _ => true,
            },
            Operand::Submission { key } => !key.trim().is_empty(),
            Operand::User { attribute } => !attribute.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    #[default]
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    Matches,
}

/// Joins an input (or a pair list) with the running condition result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Connector {
    #[default]
    And,
    Or,
}

/// A single comparison clause inside a conditional input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConditionPair {
    pub key: Operand,
    #[serde(default)]
    pub connector: Comparison,
    pub value: Operand,
}

/// A literal key/value entry produced by association content lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AssociationPair {
    pub key: Value,
    pub value: Value,
}

/// One clause of a mapper expression. Expressions are ordered lists of
/// inputs; conditions fold left to right through each input's `connector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapperInput {
    /// Comparison clauses guarding an optional output value.
    Conditional {
        pairs: Vec<ConditionPair>,
        #[serde(default)]
        pair_connector: Connector,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Operand>,
        #[serde(default)]
        connector: Connector,
    },
    /// Unconditional value production.
    Assignment { output: Operand },
    /// A fixed list of key/value pairs, e.g. dropdown content.
    Association { pairs: Vec<AssociationPair> },
}

/// Which production rule fired during `perform_with_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Conditional,
    Assignment,
    Association,
}

/// Typed result of a value lookup, consumed by field content resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct MapperOutput {
    pub kind: InputKind,
    pub value: Value,
}

/// A required-data pair whose key the caller already resolved against the
/// submission. `key: None` means the submission had no such entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPair {
    pub key: Option<Value>,
    pub connector: Comparison,
    pub value: Operand,
}

/// Evaluates mapper expressions against one user identity and one submission
/// snapshot. Pure: no side effects, no knowledge of steps.
#[derive(Debug, Clone, Copy)]
pub struct Mapper<'a> {
    user: &'a UserContext,
    data: Option<&'a SubmissionData>,
}

impl<'a> Mapper<'a> {
    pub fn new(user: &'a UserContext, data: Option<&'a SubmissionData>) -> Self {
        Self { user, data }
    }

    /// Condition semantics: an empty expression is always true. Inputs that
    /// cannot resolve evaluate false rather than failing.
    pub fn check(&self, inputs: &[MapperInput]) -> bool {
        let mut result: Option<bool> = None;
        for input in inputs {
            let MapperInput::Conditional {
                pairs,
                pair_connector,
                connector,
                ..
            } = input
            else {
                continue;
            };
            let holds = self.pairs_hold(pairs, *pair_connector);
            result = Some(match (result, connector) {
                (None, _) => holds,
                (Some(acc), Connector::And) => acc && holds,
                (Some(acc), Connector::Or) => acc || holds,
            });
        }
        result.unwrap_or(true)
    }

    /// Value production: the first input that yields something wins. A
    /// passing conditional with no output produces `true`.
    pub fn perform(&self, inputs: &[MapperInput]) -> Option<Value> {
        self.perform_with_type(inputs).map(|output| output.value)
    }

    /// As `perform`, additionally reporting which rule fired. Callers that
    /// post-process association vs assignment results need the discriminant.
    pub fn perform_with_type(&self, inputs: &[MapperInput]) -> Option<MapperOutput> {
        for input in inputs {
            match input {
                MapperInput::Conditional {
                    pairs,
                    pair_connector,
                    output,
                    ..
                } => {
                    if !self.pairs_hold(pairs, *pair_connector) {
                        continue;
                    }
                    let value = match output {
                        Some(operand) => self.resolve(operand)?,
                        None => Value::Bool(true),
                    };
                    return Some(MapperOutput {
                        kind: InputKind::Conditional,
                        value,
                    });
                }
                MapperInput::Assignment { output } => {
                    let value = self.resolve(output)?;
                    return Some(MapperOutput {
                        kind: InputKind::Assignment,
                        value,
                    });
                }
                MapperInput::Association { pairs } => {
                    let items = pairs
                        .iter()
                        .map(|pair| {
                            let mut entry = Map::new();
                            entry.insert("key".into(), pair.key.clone());
                            entry.insert("value".into(), pair.value.clone());
                            Value::Object(entry)
                        })
                        .collect();
                    return Some(MapperOutput {
                        kind: InputKind::Association,
                        value: Value::Array(items),
                    });
                }
            }
        }
        None
    }

    /// Gate check for step permission: every pair must hold. Pairs whose key
    /// never resolved fail the whole list.
    pub fn validate_pairs(&self, pairs: &[ResolvedPair]) -> bool {
        pairs.iter().all(|pair| {
            let Some(key) = &pair.key else {
                return false;
            };
            let Some(value) = self.resolve(&pair.value) else {
                return false;
            };
            compare(key, pair.connector, &value)
        })
    }

    /// Substitutes user/submission tokens into a template string. Missing
    /// tokens render empty; a malformed template is returned unchanged.
    pub fn interpolate(&self, template: &str, opts: InterpolateOpts) -> String {
        interpolate::interpolate(template, self.user, self.data, opts)
    }

    fn pairs_hold(&self, pairs: &[ConditionPair], pair_connector: Connector) -> bool {
        match pair_connector {
            Connector::And => pairs.iter().all(|pair| self.pair_holds(pair)),
            Connector::Or => pairs.iter().any(|pair| self.pair_holds(pair)),
        }
    }

    fn pair_holds(&self, pair: &ConditionPair) -> bool {
        let (Some(left), Some(right)) = (self.resolve(&pair.key), self.resolve(&pair.value)) else {
            return false;
        };
        compare(&left, pair.connector, &right)
    }

    fn resolve(&self, operand: &Operand) -> Option<Value> {
        match operand {
            Operand::Literal { value } => Some(value.clone()),
            Operand::Submission { key } => self.data.and_then(|data| data.get(key)).cloned(),
            Operand::User { attribute } => self.user.attribute(attribute),
        }
    }
}

fn compare(left: &Value, comparison: Comparison, right: &Value) -> bool {
    match comparison {
        Comparison::Equal => loose_eq(left, right),
        Comparison::NotEqual => !loose_eq(left, right),
        Comparison::Greater => ordering(left, right).map(|o| o.is_gt()).unwrap_or(false),
        Comparison::Less => ordering(left, right).map(|o| o.is_lt()).unwrap_or(false),
        Comparison::GreaterOrEqual => ordering(left, right).map(|o| o.is_ge()).unwrap_or(false),
        Comparison::LessOrEqual => ordering(left, right).map(|o| o.is_le()).unwrap_or(false),
        Comparison::Matches => match Regex::new(&text_form(right)) {
            Ok(regex) => regex.is_match(&text_form(left)),
            Err(_) => false,
        },
    }
}

/// Equality with string/number/bool loosening, so `"5"` equals `5` and
/// `"true"` equals `true`. Templates rarely control the submitted type.
fn loose_eq(left: &Value, right: &Value) -> bool {
    if left == right {
        return true;
    }
    if let (Some(a), Some(b)) = (number_form(left), number_form(right)) {
        return a == b;
    }
    text_form(left) == text_form(right)
}

fn ordering(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    if let (Some(a), Some(b)) = (number_form(left), number_form(right)) {
        return a.partial_cmp(&b);
    }
    Some(text_form(left).cmp(&text_form(right)))
}

fn number_form(value: &Value) -> Option<f64> {
    match value {
        Value::Number(num) => num.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn text_form(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
