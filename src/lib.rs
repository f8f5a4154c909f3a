//! Schema-backed form state for interactive UIs.
//!
//! A [`form::FormController`] owns a form's value and derives what a field
//! should show on each render: which validation errors are live, whether the
//! form is valid, and when a submit attempt has happened. Validation rules
//! are supplied through the [`form::Schema`] capability; the host UI's state
//! container plugs in through [`form::StateCell`].

pub mod form;
pub mod prelude;
