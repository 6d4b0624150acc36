#![allow(missing_docs)]

pub mod interpolate;
pub mod mapper;
pub mod submission;
pub mod template;
pub mod user;

pub use interpolate::{InterpolateOpts, interpolate};
pub use mapper::{
    AssociationPair, Comparison, ConditionPair, Connector, InputKind, Mapper, MapperInput,
    MapperOutput, Operand, ResolvedPair,
};
pub use submission::{SubmissionData, merge_submission, normalize_boolean};
pub use template::{
    ActionTemplate, FieldKind, FieldTemplate, ParamPair, PermittedParam, RequiredData,
    RequiredDataPair, StepTemplate, WizardTemplate,
};
pub use user::UserContext;
