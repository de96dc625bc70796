//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect::Future` values,
//! particularly for remote calls whose outcome maps to one of two actions.

/// Create an `Effect::Future` from an async block body
///
/// # Example
///
/// ```
/// use todoboard_core::{async_effect, effect::Effect};
///
/// #[derive(Debug)]
/// enum Action {
///     Ready,
/// }
///
/// let effect: Effect<Action> = async_effect! {
///     Some(Action::Ready)
/// };
/// assert!(matches!(effect, Effect::Future(_)));
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Future` that awaits a fallible call and maps both outcomes
///
/// # Example
///
/// ```rust,ignore
/// use todoboard_core::remote_effect;
///
/// remote_effect! {
///     call: collection.delete(&id),
///     on_success: |()| Some(TodoAction::ItemDeleted { id }),
///     on_error: |error| Some(TodoAction::DeleteFailed { id, error })
/// }
/// ```
#[macro_export]
macro_rules! remote_effect {
    (
        call: $call:expr,
        on_success: |$success_param:pat_param| $success_body:expr,
        on_error: |$error_param:ident| $error_body:expr
    ) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move {
            match $call.await {
                ::std::result::Result::Ok($success_param) => $success_body,
                ::std::result::Result::Err($error_param) => $error_body,
            }
        }))
    };
}
