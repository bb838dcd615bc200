use crate::core::errors::EngineError;
use std::any::{Any, TypeId};
use std::fmt;

/// Object-safe view of a payload that can be duplicated behind a box
trait Payload: Any + Send + Sync {
    fn clone_box(&self) -> Box<dyn Payload>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Clone + Send + Sync + 'static> Payload for T {
    fn clone_box(&self) -> Box<dyn Payload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Type-erased but type-safe container for exactly one value.
///
/// Cloning a `TypedValue` clones the payload, so two values never alias.
/// Typed access only succeeds for the exact stored type; there is no numeric
/// coercion (`i32` is not readable as `i64`).
pub struct TypedValue {
    data: Box<dyn Payload>,
    type_name: &'static str,
    type_id: TypeId,
}

impl TypedValue {
    /// Create a new typed value
    pub fn new<T: Send + Sync + Clone + 'static>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            data: Box::new(value),
        }
    }

    fn mismatch<T: 'static>(&self) -> EngineError {
        EngineError::TypeMismatch {
            expected: std::any::type_name::<T>(),
            found: self.type_name,
        }
    }

    /// Get a reference to the contained value
    pub fn get<T: 'static>(&self) -> Result<&T, EngineError> {
        if TypeId::of::<T>() != self.type_id {
            return Err(self.mismatch::<T>());
        }
        self.data
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| self.mismatch::<T>())
    }

    /// Get a mutable reference to the contained value
    pub fn get_mut<T: 'static>(&mut self) -> Result<&mut T, EngineError> {
        if TypeId::of::<T>() != self.type_id {
            return Err(self.mismatch::<T>());
        }
        let err = self.mismatch::<T>();
        self.data.as_any_mut().downcast_mut::<T>().ok_or(err)
    }

    /// Get an owned copy of the contained value
    pub fn cloned<T: Clone + 'static>(&self) -> Result<T, EngineError> {
        self.get::<T>().cloned()
    }

    /// Consume the typed value and return the contained value
    pub fn into_inner<T: 'static>(self) -> Result<T, EngineError> {
        if TypeId::of::<T>() != self.type_id {
            return Err(self.mismatch::<T>());
        }
        let err = self.mismatch::<T>();
        self.data
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| err)
    }

    /// Replace the payload, possibly with a value of another type
    pub fn set<T: Send + Sync + Clone + 'static>(&mut self, value: T) {
        *self = TypedValue::new(value);
    }

    /// Get the type name of the contained value
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Get the type ID of the contained value
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Check if the contained value is of type T
    pub fn is_type<T: 'static>(&self) -> bool {
        TypeId::of::<T>() == self.type_id
    }
}

/// The zero value handed out for absent map keys and untyped slots: `0_i32`.
impl Default for TypedValue {
    fn default() -> Self {
        TypedValue::new(0_i32)
    }
}

impl Clone for TypedValue {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone_box(),
            type_name: self.type_name,
            type_id: self.type_id,
        }
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
