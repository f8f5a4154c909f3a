pub use crate::form::{
    ErrorMap, FieldKey, FormController, FormError, FormModel, FormOptions, FormResult,
    FormSnapshot, FormSubmitEvent, Issue, JsonSchema, PathSegment, Schema, SchemaExt, StateCell,
    SubmitEvent,
};
