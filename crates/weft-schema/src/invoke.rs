//! Erased call signatures and the typed-closure adapters that produce them
//!
//! Host code registers ordinary Rust closures. At registration time each one
//! is wrapped into an erased callable that:
//! - downcasts the target to the declaring type
//! - checks arity and converts arguments with [`FromValue`]
//! - catches panics and reports them as [`HostError::Panic`]
//! - boxes the result with [`IntoValue`]

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use weft_sdk::{FromValue, HostError, HostResult, ItemIter, DictionaryItems, ParamType, Value};

/// Erased host object reference
pub type Target<'a> = &'a (dyn Any + Send + Sync);

/// Constructor / static / instance method body
pub type InvokeFn = dyn Fn(Option<Target<'_>>, &[Value]) -> HostResult<Value> + Send + Sync;

/// Property getter body
pub type GetFn = dyn Fn(Target<'_>) -> HostResult<Value> + Send + Sync;

/// Property setter (or event adder) body
pub type SetFn = dyn Fn(Target<'_>, &Value) -> HostResult<()> + Send + Sync;

/// Should-serialize hook body
pub type ShouldSerializeFn = dyn Fn(Target<'_>) -> HostResult<bool> + Send + Sync;

/// Upcast from a derived object to its embedded base
pub type UpcastFn = dyn for<'a> Fn(Target<'a>) -> Option<Target<'a>> + Send + Sync;

/// Projection from an object to one of its capability trait objects
pub type ProjectFn<Tr> = dyn for<'a> Fn(Target<'a>) -> Option<&'a Tr> + Send + Sync;

/// Collection item source
pub type ItemsFn = dyn Fn(Target<'_>) -> HostResult<Option<ItemIter>> + Send + Sync;

/// Dictionary item source
pub type DictItemsFn = dyn Fn(Target<'_>) -> HostResult<Option<DictionaryItems>> + Send + Sync;

pub(crate) fn upcast_fn<F>(f: F) -> Arc<UpcastFn>
where
    F: for<'a> Fn(Target<'a>) -> Option<Target<'a>> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) fn project_fn<Tr: ?Sized + 'static, F>(f: F) -> Arc<ProjectFn<Tr>>
where
    F: for<'a> Fn(Target<'a>) -> Option<&'a Tr> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Run host code, turning a panic into a host failure.
pub fn guarded<R>(f: impl FnOnce() -> HostResult<R>) -> HostResult<R> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(HostError::from_panic(payload)),
    }
}

pub(crate) fn cast_target<'a, T: Any>(target: Target<'a>) -> HostResult<&'a T> {
    target.downcast_ref::<T>().ok_or_else(|| HostError::InvalidCast {
        expected: std::any::type_name::<T>().to_string(),
        got: "object".to_string(),
    })
}

pub(crate) fn arity_error(expected: usize, got: usize) -> HostError {
    HostError::Argument(format!("expected {} arguments, got {}", expected, got))
}

// ============================================================================
// Typed closures
// ============================================================================

/// Free function taking `Args` (constructors, static factories)
pub trait HostFn<Args>: Send + Sync + 'static {
    /// Unboxed result type
    type Output;

    /// Declared parameter types
    fn param_types() -> Vec<ParamType>;

    /// Convert `args` and call
    fn call_with(&self, args: &[Value]) -> HostResult<Self::Output>;
}

/// Instance method on `T` taking `Args`
pub trait HostMethod<T, Args>: Send + Sync + 'static {
    /// Unboxed result type
    type Output;

    /// Declared parameter types (receiver excluded)
    fn param_types() -> Vec<ParamType>;

    /// Convert `args` and call on `target`
    fn call_with(&self, target: &T, args: &[Value]) -> HostResult<Self::Output>;
}

macro_rules! count {
    () => (0usize);
    ($head:ident $($tail:ident)*) => (1usize + count!($($tail)*));
}

macro_rules! impl_host_fn {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> HostFn<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> HostResult<R> + Send + Sync + 'static,
            $($arg: FromValue,)*
        {
            type Output = R;

            fn param_types() -> Vec<ParamType> {
                vec![$($arg::param_type()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn call_with(&self, args: &[Value]) -> HostResult<R> {
                const ARITY: usize = count!($($arg)*);
                if args.len() != ARITY {
                    return Err(arity_error(ARITY, args.len()));
                }
                let mut rest = args.iter();
                $(
                    let $arg = match rest.next() {
                        Some(v) => $arg::from_value(v)?,
                        None => return Err(arity_error(ARITY, args.len())),
                    };
                )*
                (self)($($arg),*)
            }
        }

        impl<F, T, R, $($arg,)*> HostMethod<T, ($($arg,)*)> for F
        where
            F: Fn(&T, $($arg),*) -> HostResult<R> + Send + Sync + 'static,
            T: 'static,
            $($arg: FromValue,)*
        {
            type Output = R;

            fn param_types() -> Vec<ParamType> {
                vec![$($arg::param_type()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn call_with(&self, target: &T, args: &[Value]) -> HostResult<R> {
                const ARITY: usize = count!($($arg)*);
                if args.len() != ARITY {
                    return Err(arity_error(ARITY, args.len()));
                }
                let mut rest = args.iter();
                $(
                    let $arg = match rest.next() {
                        Some(v) => $arg::from_value(v)?,
                        None => return Err(arity_error(ARITY, args.len())),
                    };
                )*
                (self)(target, $($arg),*)
            }
        }
    };
}

impl_host_fn!();
impl_host_fn!(A1);
impl_host_fn!(A1, A2);
impl_host_fn!(A1, A2, A3);
impl_host_fn!(A1, A2, A3, A4);
