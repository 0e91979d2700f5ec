//! Identity handles for installable callbacks
//!
//! Strategies, scripts and observers are stored in [`Group`](super::Group)s and
//! removed again by identity, not by value. [`Handle`] wraps an `Rc` and
//! compares by address so any trait object can live in a group.

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// Type-erased access for trait objects that need typed lookup.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Shared pointer compared by address
pub struct Handle<T: ?Sized>(Rc<T>);

impl<T: ?Sized> Handle<T> {
    pub fn from_rc(rc: Rc<T>) -> Self {
        Self(rc)
    }

    pub fn as_rc(&self) -> &Rc<T> {
        &self.0
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized + AsAny> Handle<T> {
    /// Whether the value behind this handle is a `U`
    pub fn is<U: Any>(&self) -> bool {
        AsAny::as_any(&*self.0).is::<U>()
    }

    /// The value behind this handle as a `U`, sharing ownership
    pub fn downcast<U: Any>(&self) -> Option<Rc<U>> {
        AsAny::into_any(Rc::clone(&self.0)).downcast::<U>().ok()
    }
}

impl<T: ?Sized> From<Rc<T>> for Handle<T> {
    fn from(rc: Rc<T>) -> Self {
        Self(rc)
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: ?Sized> Eq for Handle<T> {}

impl<T: ?Sized> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:p})", Rc::as_ptr(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Speaker: AsAny {
        fn word(&self) -> &'static str;
    }

    struct Dog;
    struct Cat;

    impl Speaker for Dog {
        fn word(&self) -> &'static str {
            "woof"
        }
    }

    impl Speaker for Cat {
        fn word(&self) -> &'static str {
            "meow"
        }
    }

    #[test]
    fn test_handles_compare_by_address() {
        let dog: Rc<dyn Speaker> = Rc::new(Dog);
        let a = Handle::from_rc(Rc::clone(&dog));
        let b = a.clone();
        let other: Handle<dyn Speaker> = Handle::from_rc(Rc::new(Dog));

        assert_eq!(a, b);
        assert_ne!(a, other);
        assert_eq!(a.word(), "woof");
    }

    #[test]
    fn test_downcast_to_concrete_type() {
        let cat: Handle<dyn Speaker> = Handle::from_rc(Rc::new(Cat));
        assert!(cat.is::<Cat>());
        assert!(!cat.is::<Dog>());
        assert!(cat.downcast::<Cat>().is_some());
        assert!(cat.downcast::<Dog>().is_none());
    }
}
