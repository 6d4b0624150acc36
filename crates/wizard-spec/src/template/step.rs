use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::mapper::{Comparison, MapperInput, Operand};

use super::field::FieldTemplate;

/// One page of a wizard definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepTemplate {
    pub id: String,
    /// Visibility gate; an absent condition means the step always appears.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub condition: Vec<MapperInput>,
    /// Submission data the user must already hold before the step unlocks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_data: Vec<RequiredData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_data_message: Option<String>,
    /// Raw request parameters committed straight into the submission when
    /// the step builds, bypassing field construction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permitted_params: Vec<PermittedParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub force_final: bool,
    /// Interpolated with user and submission context at build time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldTemplate>,
}

/// One required-data rule; all of its usable pairs must validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RequiredData {
    pub pairs: Vec<RequiredDataPair>,
}

/// A pair whose `key` names a submission entry to resolve before comparing
/// against `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RequiredDataPair {
    pub key: String,
    #[serde(default)]
    pub connector: Comparison,
    pub value: Operand,
}

impl RequiredDataPair {
    /// Pairs missing either side are ignored by the permission gate.
    pub fn is_usable(&self) -> bool {
        !self.key.trim().is_empty() && self.value.is_present()
    }
}

/// Maps a request parameter (`key`) onto a submission entry (`value`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PermittedParam {
    pub pairs: Vec<ParamPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParamPair {
    pub key: String,
    pub value: String,
}

impl PermittedParam {
    /// Only the first pair of each mapping is honored.
    pub fn mapping(&self) -> Option<&ParamPair> {
        self.pairs.first()
    }
}
