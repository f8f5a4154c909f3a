use std::fmt::Display;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::cell::{CellWrite, LocalCell, StateCell, SubscriptionId};
use super::key::FieldKey;
use super::merge::{deep_merge, shallow_merge};
use super::validation::{ErrorMap, Schema, project_issues};

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("patch rejected: {0}")]
    InvalidPatch(String),
    #[error("form value could not be serialized: {0}")]
    Serialization(String),
    #[error("schema could not be compiled: {0}")]
    SchemaBuild(String),
    #[error("submit handler failed: {0}")]
    Handler(String),
}

impl FormError {
    pub fn handler(error: impl Display) -> Self {
        Self::Handler(error.to_string())
    }
}

pub type FormResult<T> = Result<T, FormError>;

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    /// Keys whose errors are shown before the first submit.
    pub immediately_validated_keys: Vec<FieldKey>,
}

/// Everything the controller keeps between renders.
#[derive(Clone, Debug, PartialEq)]
pub struct FormState<T> {
    model: T,
    has_submitted: bool,
    immediately_validated_keys: Vec<FieldKey>,
}

impl<T> FormState<T> {
    pub fn new(model: T) -> Self {
        Self::with_options(model, FormOptions::default())
    }

    pub fn with_options(model: T, options: FormOptions) -> Self {
        let mut immediately_validated_keys = Vec::new();
        for key in options.immediately_validated_keys {
            if !immediately_validated_keys.contains(&key) {
                immediately_validated_keys.push(key);
            }
        }
        Self {
            model,
            has_submitted: false,
            immediately_validated_keys,
        }
    }

    pub fn model(&self) -> &T {
        &self.model
    }

    pub fn has_submitted(&self) -> bool {
        self.has_submitted
    }

    pub fn immediately_validated_keys(&self) -> &[FieldKey] {
        &self.immediately_validated_keys
    }

    /// Keys whose errors are currently shown, `None` meaning all of them.
    pub fn visible_keys(&self) -> Option<&[FieldKey]> {
        (!self.has_submitted).then_some(self.immediately_validated_keys.as_slice())
    }

    fn with_model(&self, model: T) -> Self {
        Self {
            model,
            has_submitted: self.has_submitted,
            immediately_validated_keys: self.immediately_validated_keys.clone(),
        }
    }

    fn with_keys(&self, immediately_validated_keys: Vec<FieldKey>) -> Self
    where
        T: Clone,
    {
        Self {
            model: self.model.clone(),
            has_submitted: self.has_submitted,
            immediately_validated_keys,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FormSnapshot<T> {
    pub model: T,
    pub has_submitted: bool,
    pub immediately_validated_keys: Vec<FieldKey>,
    pub errors: Option<ErrorMap>,
    pub is_valid: bool,
}

impl<T> FormSnapshot<T> {
    pub fn error(&self, key: impl AsRef<str>) -> Option<&str> {
        self.errors.as_ref().and_then(|errors| errors.get(key))
    }
}

#[derive(Clone)]
pub struct FormController<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(super) schema: Arc<dyn Schema<T>>,
    pub(super) state: Arc<dyn StateCell<FormState<T>>>,
}

impl<T> FormController<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(schema: impl Schema<T> + 'static, initial: T) -> Self {
        Self::with_options(schema, initial, FormOptions::default())
    }

    pub fn with_options(schema: impl Schema<T> + 'static, initial: T, options: FormOptions) -> Self {
        Self::with_cell(
            schema,
            Arc::new(LocalCell::new(FormState::with_options(initial, options))),
        )
    }

    /// Binds the form to host-owned state, e.g. a UI runtime's signal.
    pub fn with_cell(
        schema: impl Schema<T> + 'static,
        state: Arc<dyn StateCell<FormState<T>>>,
    ) -> Self {
        Self {
            schema: Arc::new(schema),
            state,
        }
    }

    pub fn form_state(&self) -> FormResult<T> {
        Ok(self.state.read()?.model)
    }

    pub fn has_submitted(&self) -> FormResult<bool> {
        Ok(self.state.read()?.has_submitted)
    }

    pub fn immediately_validated_keys(&self) -> FormResult<Vec<FieldKey>> {
        Ok(self.state.read()?.immediately_validated_keys)
    }

    pub fn set_model(&self, next: T) -> FormResult<()> {
        self.state
            .write(CellWrite::update(move |previous: &FormState<T>| {
                Ok(previous.with_model(next))
            }))
    }

    /// Edits a copy of the current value and writes it back.
    ///
    /// `f` runs with no lock held, so it may read the controller.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> FormResult<()> {
        let mut model = self.state.read()?.model;
        f(&mut model);
        self.set_model(model)
    }

    pub fn set_immediately_validated_key(
        &self,
        key: impl Into<FieldKey>,
        enable: bool,
    ) -> FormResult<()> {
        let key = key.into();
        let listed = self.state.read()?.immediately_validated_keys.contains(&key);
        if listed == enable {
            return Ok(());
        }

        debug!(key = %key, enable, "updating immediately validated keys");
        self.state
            .write(CellWrite::update(move |previous: &FormState<T>| {
                let mut keys = previous.immediately_validated_keys.clone();
                let position = keys.iter().position(|listed| *listed == key);
                match (enable, position) {
                    (true, None) => keys.push(key),
                    (false, Some(index)) => {
                        keys.remove(index);
                    }
                    _ => {}
                }
                Ok(previous.with_keys(keys))
            }))
    }

    pub fn immediately_validate(&self, key: impl Into<FieldKey>) -> FormResult<()> {
        self.set_immediately_validated_key(key, true)
    }

    /// Runs the schema against the current value and projects its issues,
    /// keeping only `restrict_to` keys when given.
    pub fn validate_and_get_error_map(
        &self,
        restrict_to: Option<&[FieldKey]>,
    ) -> FormResult<Option<ErrorMap>> {
        let state = self.state.read()?;
        Ok(self.error_map(&state.model, restrict_to))
    }

    /// Errors visible under the current policy: all of them after the first
    /// submit, otherwise only the immediately validated keys.
    pub fn errors(&self) -> FormResult<Option<ErrorMap>> {
        let state = self.state.read()?;
        Ok(self.error_map(&state.model, state.visible_keys()))
    }

    pub fn get_error(&self, key: impl AsRef<str>) -> FormResult<Option<String>> {
        Ok(self
            .errors()?
            .and_then(|errors| errors.get(key).map(str::to_string)))
    }

    pub fn is_valid(&self) -> FormResult<bool> {
        Ok(self.errors()?.is_none())
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot<T>> {
        let state = self.state.read()?;
        let errors = self.error_map(&state.model, state.visible_keys());
        Ok(FormSnapshot {
            is_valid: errors.is_none(),
            errors,
            has_submitted: state.has_submitted,
            immediately_validated_keys: state.immediately_validated_keys,
            model: state.model,
        })
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&FormState<T>) + Send + Sync + 'static,
    ) -> FormResult<SubscriptionId> {
        self.state.subscribe(Arc::new(listener))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> FormResult<bool> {
        self.state.unsubscribe(id)
    }

    pub(super) fn mark_submitted(&self) -> FormResult<()> {
        self.state
            .write(CellWrite::update(|previous: &FormState<T>| {
                let mut next = previous.clone();
                next.has_submitted = true;
                Ok(next)
            }))
    }

    fn error_map(&self, model: &T, restrict_to: Option<&[FieldKey]>) -> Option<ErrorMap> {
        match self.schema.validate(model) {
            Ok(()) => None,
            Err(issues) => project_issues(issues, restrict_to),
        }
    }
}

impl<T> FormController<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Deep-merges `patch` into the value. Nested objects merge key by key;
    /// anything else in the patch, arrays included, replaces what was there.
    ///
    /// The value must come back unchanged from a JSON round-trip. Fields
    /// skipped by serde or non-finite floats fail with
    /// [`FormError::Serialization`] and the value is left as it was.
    pub fn set_form_state(&self, patch: impl Serialize) -> FormResult<()> {
        let patch = patch_object(patch)?;
        self.state
            .write(CellWrite::update(move |previous: &FormState<T>| {
                let mut tree = model_tree(&previous.model)?;
                deep_merge(&mut tree, patch);
                Ok(previous.with_model(model_from_tree(tree)?))
            }))
    }

    /// Replaces each top-level field named in `patch` wholesale.
    ///
    /// Shares the round-trip requirement of [`FormController::set_form_state`].
    pub fn set_values(&self, patch: impl Serialize) -> FormResult<()> {
        let patch = patch_object(patch)?;
        self.state
            .write(CellWrite::update(move |previous: &FormState<T>| {
                let mut tree = model_tree(&previous.model)?;
                shallow_merge(&mut tree, patch);
                Ok(previous.with_model(model_from_tree(tree)?))
            }))
    }
}

fn patch_object(patch: impl Serialize) -> FormResult<Map<String, Value>> {
    match serde_json::to_value(patch) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(FormError::InvalidPatch(format!(
            "expected an object patch, got {}",
            json_kind(&other)
        ))),
        Err(error) => Err(FormError::InvalidPatch(error.to_string())),
    }
}

fn model_tree<T>(model: &T) -> FormResult<Value>
where
    T: PartialEq + Serialize + DeserializeOwned,
{
    let tree =
        serde_json::to_value(model).map_err(|error| FormError::Serialization(error.to_string()))?;
    let restored = serde_json::from_value::<T>(tree.clone()).map_err(|error| {
        FormError::Serialization(format!("form value does not survive JSON: {error}"))
    })?;
    if restored != *model {
        debug!("form value changes across a JSON round-trip");
        return Err(FormError::Serialization(
            "form value changes across a JSON round-trip".into(),
        ));
    }
    Ok(tree)
}

fn model_from_tree<T: DeserializeOwned>(tree: Value) -> FormResult<T> {
    serde_json::from_value(tree).map_err(|error| {
        debug!(%error, "merged form value does not fit the model");
        FormError::InvalidPatch(error.to_string())
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
