use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use super::controller::{FormController, FormResult};

pub type BoxedSubmitFuture = Pin<Box<dyn Future<Output = FormResult<()>> + Send + 'static>>;

/// The platform event a submit handler is wired to.
pub trait SubmitEvent {
    /// Stops the host from running its default submit action.
    fn prevent_default(&mut self);
}

/// Minimal [`SubmitEvent`] for hosts without a native event type.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FormSubmitEvent {
    default_prevented: bool,
}

impl FormSubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl SubmitEvent for FormSubmitEvent {
    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

// Records the submit attempt when dropped. Async variants create it on
// first poll.
struct SubmittedGuard<T>
where
    T: Clone + Send + Sync + 'static,
{
    controller: FormController<T>,
}

impl<T> Drop for SubmittedGuard<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if let Err(error) = self.controller.mark_submitted() {
            warn!(%error, "failed to record form submission");
        }
    }
}

fn suppress_default(event: Option<&mut dyn SubmitEvent>) {
    if let Some(event) = event {
        event.prevent_default();
    }
}

impl<T> FormController<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wraps `handler` as a submit event handler.
    ///
    /// Each call suppresses the event's default action, validates the whole
    /// value regardless of which keys are visible, passes the outcome to
    /// `handler` and then marks the form submitted. Handler errors are
    /// returned after the form is marked.
    pub fn create_on_submit<F>(
        &self,
        handler: F,
    ) -> impl Fn(Option<&mut dyn SubmitEvent>) -> FormResult<()> + Send + Sync + 'static
    where
        F: Fn(bool) -> FormResult<()> + Send + Sync + 'static,
    {
        let controller = self.clone();
        move |event: Option<&mut dyn SubmitEvent>| {
            suppress_default(event);
            let _submitted = SubmittedGuard {
                controller: controller.clone(),
            };
            let valid = controller.validate_and_get_error_map(None)?.is_none();
            debug!(valid, "submitting form");
            handler(valid)
        }
    }

    /// Future-returning variant of [`FormController::create_on_submit`].
    ///
    /// The default action is suppressed and the handler is started before
    /// the returned future is first polled. The form is marked submitted
    /// once that future has been polled and then settles or is dropped. A
    /// future dropped before its first poll leaves the flag untouched.
    pub fn create_on_submit_async<F, Fut>(
        &self,
        handler: F,
    ) -> impl Fn(Option<&mut dyn SubmitEvent>) -> BoxedSubmitFuture + Send + Sync + 'static
    where
        F: Fn(bool) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FormResult<()>> + Send + 'static,
    {
        let controller = self.clone();
        move |event: Option<&mut dyn SubmitEvent>| -> BoxedSubmitFuture {
            suppress_default(event);
            let pending = controller
                .validate_and_get_error_map(None)
                .map(|errors| {
                    let valid = errors.is_none();
                    debug!(valid, "submitting form");
                    handler(valid)
                });
            let controller = controller.clone();
            Box::pin(async move {
                let _submitted = SubmittedGuard { controller };
                pending?.await
            })
        }
    }

    /// Wraps `handler` as a submit event handler that always runs.
    ///
    /// No validity is passed; callers read [`FormController::is_valid`]
    /// afterwards, which by then reflects the whole value.
    pub fn submit<F>(
        &self,
        handler: F,
    ) -> impl Fn(Option<&mut dyn SubmitEvent>) -> FormResult<()> + Send + Sync + 'static
    where
        F: Fn() -> FormResult<()> + Send + Sync + 'static,
    {
        let controller = self.clone();
        move |event: Option<&mut dyn SubmitEvent>| {
            suppress_default(event);
            let _submitted = SubmittedGuard {
                controller: controller.clone(),
            };
            debug!("submitting form without validity gate");
            handler()
        }
    }

    /// Future-returning variant of [`FormController::submit`], with the
    /// same cancellation rule as [`FormController::create_on_submit_async`].
    pub fn submit_async<F, Fut>(
        &self,
        handler: F,
    ) -> impl Fn(Option<&mut dyn SubmitEvent>) -> BoxedSubmitFuture + Send + Sync + 'static
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FormResult<()>> + Send + 'static,
    {
        let controller = self.clone();
        move |event: Option<&mut dyn SubmitEvent>| -> BoxedSubmitFuture {
            suppress_default(event);
            debug!("submitting form without validity gate");
            let pending = handler();
            let controller = controller.clone();
            Box::pin(async move {
                let _submitted = SubmittedGuard { controller };
                pending.await
            })
        }
    }
}
