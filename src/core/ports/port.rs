use crate::core::sync::{read, write};
use crate::core::values::TypedValue;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

/// Observer run with a port's buffer whenever its component moves data through it
pub type PortCallback = Arc<dyn Fn(&TypedValue) + Send + Sync>;

struct PortInner {
    buffer: RwLock<TypedValue>,
    source: RwLock<Weak<PortInner>>,
    callbacks: RwLock<Vec<PortCallback>>,
}

/// Handle to a single buffered slot.
///
/// Cloning a `Port` clones the handle: every clone reads and writes the same
/// buffer. A port may be pull-bound to one source port. The link is weak, so
/// a port never keeps its source alive, and the source never learns about
/// the ports listening to it.
#[derive(Clone)]
pub struct Port {
    inner: Arc<PortInner>,
}

impl Port {
    /// Create a port whose buffer starts as `buffer`
    pub fn new(buffer: TypedValue) -> Self {
        Self {
            inner: Arc::new(PortInner {
                buffer: RwLock::new(buffer),
                source: RwLock::new(Weak::new()),
                callbacks: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Create a port holding the zero value of `T`
    pub fn typed<T: Default + Send + Sync + Clone + 'static>() -> Self {
        Self::new(TypedValue::new(T::default()))
    }

    /// Copy of the current buffer
    pub fn get_buffer(&self) -> TypedValue {
        read(&self.inner.buffer).clone()
    }

    pub fn set_buffer(&self, value: TypedValue) {
        *write(&self.inner.buffer) = value;
    }

    /// Pull from `source` on every subsequent `sync()`
    pub fn connect(&self, source: &Port) {
        *write(&self.inner.source) = Arc::downgrade(&source.inner);
    }

    pub fn disconnect(&self) {
        *write(&self.inner.source) = Weak::new();
    }

    /// The source port, if one is connected and still alive
    pub fn source(&self) -> Option<Port> {
        read(&self.inner.source)
            .upgrade()
            .map(|inner| Port { inner })
    }

    pub fn is_connected(&self) -> bool {
        self.source().is_some()
    }

    /// Copy the source's buffer into this port's buffer.
    ///
    /// Returns `false` and leaves the buffer untouched when there is no live
    /// source. A dropped source is not an error.
    pub fn sync(&self) -> bool {
        let Some(source) = self.source() else {
            return false;
        };
        // Read then write in two steps so a port bound to itself can't deadlock.
        let value = source.get_buffer();
        self.set_buffer(value);
        true
    }

    /// Add an observer, called with the buffer by [`Port::invoke_callbacks`].
    ///
    /// A component invokes its in-port callbacks after syncing during `input`
    /// and its out-port callbacks after writing during `output`. Callbacks
    /// run on scheduler worker threads.
    pub fn register_callback(&self, callback: impl Fn(&TypedValue) + Send + Sync + 'static) {
        write(&self.inner.callbacks).push(Arc::new(callback));
    }

    pub fn clear_callbacks(&self) {
        write(&self.inner.callbacks).clear();
    }

    pub fn num_callbacks(&self) -> usize {
        read(&self.inner.callbacks).len()
    }

    /// Call every registered callback, in registration order, with the current buffer
    pub fn invoke_callbacks(&self) {
        // Snapshot both so a callback may touch this port without deadlocking
        let callbacks = read(&self.inner.callbacks).clone();
        if callbacks.is_empty() {
            return;
        }
        let buffer = self.get_buffer();
        for callback in &callbacks {
            callback(&buffer);
        }
    }

    /// New, independent port starting from this port's buffer and source.
    ///
    /// Callbacks are not carried over.
    pub fn detached_clone(&self) -> Port {
        let copy = Port::new(self.get_buffer());
        *write(&copy.inner.source) = read(&self.inner.source).clone();
        copy
    }

    /// Whether both handles refer to the same port
    pub fn ptr_eq(&self, other: &Port) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Port {
    fn default() -> Self {
        Self::new(TypedValue::default())
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("buffer", &*read(&self.inner.buffer))
            .field("connected", &self.is_connected())
            .field("callbacks", &self.num_callbacks())
            .finish()
    }
}
