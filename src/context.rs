//! Per-render binding of slot names to values

use std::collections::HashMap;

use crate::fragment::Fragment;
use crate::slot::{SlotRegistry, SlotValue};

/// Slot values for one render
///
/// A context is bound to the registry that declared its slots; lookups fall
/// back to the registry's declared defaults. The renderer only reads it.
#[derive(Debug, Clone)]
pub struct Context<'r> {
    registry: &'r SlotRegistry,
    values: HashMap<String, SlotValue>,
}

impl<'r> Context<'r> {
    /// Create an empty context over a registry
    pub fn new(registry: &'r SlotRegistry) -> Self {
        Self {
            registry,
            values: HashMap::new(),
        }
    }

    /// Bind a value, replacing any previous one
    pub fn set(&mut self, name: impl Into<String>, value: SlotValue) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn set_scalar(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.set(name, SlotValue::Scalar(value.into()))
    }

    pub fn set_sequence<I, S>(&mut self, name: impl Into<String>, items: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Fragment>,
    {
        self.set(
            name,
            SlotValue::Sequence(items.into_iter().map(Into::into).collect()),
        )
    }

    /// Append fragments to a sequence binding, creating it if absent
    ///
    /// A scalar bound under the same name is replaced.
    pub fn extend_sequence<I, S>(&mut self, name: impl Into<String>, items: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Fragment>,
    {
        let items = items.into_iter().map(Into::into);
        match self.values.entry(name.into()) {
            std::collections::hash_map::Entry::Occupied(mut e) => match e.get_mut() {
                SlotValue::Sequence(v) => v.extend(items),
                other => *other = SlotValue::Sequence(items.collect()),
            },
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(SlotValue::Sequence(items.collect()));
            }
        }
        self
    }

    /// Builder form of [`Context::set_scalar`]
    pub fn with_scalar(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_scalar(name, value);
        self
    }

    /// Builder form of [`Context::set_sequence`]
    pub fn with_sequence<I, S>(mut self, name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Fragment>,
    {
        self.set_sequence(name, items);
        self
    }

    /// The explicitly bound value, ignoring defaults
    pub fn get(&self, name: &str) -> Option<&SlotValue> {
        self.values.get(name)
    }

    /// The bound value, or the registry default when unbound
    pub fn resolve(&self, name: &str) -> Option<&SlotValue> {
        self.values
            .get(name)
            .or_else(|| self.registry.get(name).and_then(|d| d.default.as_ref()))
    }

    pub fn registry(&self) -> &'r SlotRegistry {
        self.registry
    }

    /// Names bound in this context (unordered)
    pub fn bound_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|s| s.as_str())
    }
}
