//! Shared views of host objects through a registered base type
//!
//! A host type registered with a base keeps the base part inside itself, so
//! a derived object has no `Arc<Base>` of its own. [`Ref<T>`] instead keeps
//! the whole object alive and points at the `T` part of it. Host bodies that
//! take `Ref<T>` accept `T` and every registered subtype of `T`.

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::value::ObjectRef;

/// Shared handle to a host object, viewed as its `T` part
pub struct Ref<T: ?Sized + 'static> {
    owner: ObjectRef,
    part: NonNull<T>,
}

/// Type-erased view, produced by the binder when it upcasts an argument
pub type ObjectView = Ref<dyn Any + Send + Sync>;

// SAFETY: `part` is only ever read through `&T`, and `owner` is itself
// `Send + Sync`
unsafe impl<T: ?Sized + Sync + 'static> Send for Ref<T> {}
unsafe impl<T: ?Sized + Sync + 'static> Sync for Ref<T> {}

impl<T: ?Sized + 'static> Ref<T> {
    /// View `owner` through `project`, which must return a part of the
    /// object it is given
    pub fn map<F>(owner: ObjectRef, project: F) -> Option<Self>
    where
        F: for<'a> FnOnce(&'a (dyn Any + Send + Sync)) -> Option<&'a T>,
    {
        let part = NonNull::from(project(&*owner)?);
        Some(Ref { owner, part })
    }

    /// The whole object this view keeps alive
    pub fn owner(&self) -> &ObjectRef {
        &self.owner
    }

    /// Unwrap into the whole object
    pub fn into_owner(self) -> ObjectRef {
        self.owner
    }

    /// Whether both views look at the same object
    pub fn same_object<U: ?Sized + 'static>(&self, other: &Ref<U>) -> bool {
        Arc::ptr_eq(&self.owner, &other.owner)
    }
}

impl<T: Any + Send + Sync> Ref<T> {
    /// View an object that is exactly a `T`
    pub fn exact(owner: ObjectRef) -> Option<Self> {
        Self::map(owner, |obj| obj.downcast_ref::<T>())
    }
}

impl ObjectView {
    /// Narrow an erased view to `T`, keeping the same owner
    pub fn downcast<T: Any>(&self) -> Option<Ref<T>> {
        let part = NonNull::from((**self).downcast_ref::<T>()?);
        Some(Ref {
            owner: Arc::clone(&self.owner),
            part,
        })
    }
}

impl<T: ?Sized + 'static> Deref for Ref<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: `part` was borrowed from the allocation `owner` points to,
        // which stays alive and is never mutably borrowed while `self` exists
        unsafe { self.part.as_ref() }
    }
}

impl<T: ?Sized + 'static> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Ref {
            owner: Arc::clone(&self.owner),
            part: self.part,
        }
    }
}

impl<T: ?Sized + 'static> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref<{}>", std::any::type_name::<T>())
    }
}
