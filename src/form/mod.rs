mod cell;
mod controller;
mod json_schema;
mod key;
mod merge;
mod submit;
mod validation;


pub use calmform_derive::FormModel;
pub use cell::{CellWrite, Listener, LocalCell, StateCell, SubscriptionId, Updater};
pub use controller::{
    FormController, FormError, FormOptions, FormResult, FormSnapshot, FormState,
};
pub use json_schema::JsonSchema;
pub use key::{FieldKey, PathSegment};
pub use submit::{BoxedSubmitFuture, FormSubmitEvent, SubmitEvent};
pub use validation::{Chain, ErrorMap, FormModel, Issue, Schema, SchemaExt};
