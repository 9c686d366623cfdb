//! Core identifiers, keys and values.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_KEY_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Identifier of one concurrently scheduled unit of work.
///
/// Ids are issued from a process-wide counter and never reused. `0` is reserved
/// for the root context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(u64);

impl UnitId {
    pub const ROOT: UnitId = UnitId(0);

    /// Issue a fresh, process-unique unit id.
    pub fn issue() -> Self {
        UnitId(NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn from_raw(raw: u64) -> Self {
        UnitId(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-unique opaque key.
///
/// Two tokens minted with the same label are still distinct keys; the label
/// only shows up in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyToken {
    id: u64,
    label: &'static str,
}

impl KeyToken {
    pub fn new(label: &'static str) -> Self {
        KeyToken {
            id: NEXT_KEY_TOKEN.fetch_add(1, Ordering::Relaxed),
            label,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

/// Key into a context store: either a plain name or an opaque token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextKey {
    Name(String),
    Token(KeyToken),
}

impl ContextKey {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            ContextKey::Name(name) => Some(name),
            ContextKey::Token(_) => None,
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKey::Name(name) => f.write_str(name),
            ContextKey::Token(token) => write!(f, "token({})#{}", token.label, token.id),
        }
    }
}

impl From<&str> for ContextKey {
    fn from(name: &str) -> Self {
        ContextKey::Name(name.to_string())
    }
}

impl From<String> for ContextKey {
    fn from(name: String) -> Self {
        ContextKey::Name(name)
    }
}

impl From<&String> for ContextKey {
    fn from(name: &String) -> Self {
        ContextKey::Name(name.clone())
    }
}

impl From<KeyToken> for ContextKey {
    fn from(token: KeyToken) -> Self {
        ContextKey::Token(token)
    }
}

impl From<&KeyToken> for ContextKey {
    fn from(token: &KeyToken) -> Self {
        ContextKey::Token(*token)
    }
}

impl From<&ContextKey> for ContextKey {
    fn from(key: &ContextKey) -> Self {
        key.clone()
    }
}

/// Type-erased shared value held in a context store.
#[derive(Clone)]
pub struct ContextValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ContextValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        ContextValue {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True when both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &ContextValue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextValue<{}>", self.type_name)
    }
}
