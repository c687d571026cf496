use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// A model value tracked by the select engine.
///
/// Values are arbitrary JSON owned by the surrounding application; the
/// engine only ever holds shared references. The `Arc` allocation doubles
/// as the value's instance identity: two `OptionValue`s key the same under
/// the identity policy exactly when they share an allocation, regardless of
/// content equality.
#[derive(Debug, Clone)]
pub struct OptionValue(Arc<Value>);

impl OptionValue {
    pub fn new(value: Value) -> Self {
        Self(Arc::new(value))
    }

    pub fn get(&self) -> &Value {
        &self.0
    }

    /// Object-like values take identity tags; everything else keys by its
    /// canonical text.
    pub fn is_composite(&self) -> bool {
        matches!(&*self.0, Value::Object(_) | Value::Array(_))
    }

    pub fn shares_instance(&self, other: &OptionValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl From<Value> for OptionValue {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Stable, comparable identity key derived from a model value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashKey {
    /// Canonical JSON text of a primitive value.
    Scalar(String),
    /// Arena identity tag of a composite value instance.
    Tag(u64),
    /// blake3 digest of a composite field-selector result.
    Digest([u8; 32]),
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(text) => f.write_str(text),
            Self::Tag(tag) => write!(f, "#{tag}"),
            Self::Digest(bytes) => {
                write!(f, "~")?;
                for byte in &bytes[..8] {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Key derivation policy, chosen once when the controller is built.
/// Switching policy mid-lifetime is unsupported; keys from different
/// policies never mix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Reference-identity tagging for composites, canonical text for
    /// primitives. The default.
    Identity,
    /// Dot-separated path into the value (falling back to the optional
    /// scope context) selecting a stable identifier field.
    FieldSelector(String),
}

/// Side table assigning monotonically increasing tags to composite value
/// instances.
///
/// Each tagged instance is pinned with a strong clone so its address is
/// never recycled for the arena's lifetime; a dropped-and-reallocated value
/// could otherwise inherit a stale tag.
#[derive(Debug, Default)]
pub struct IdentityArena {
    next_tag: u64,
    tags: HashMap<usize, u64>,
    pinned: Vec<Arc<Value>>,
}

impl IdentityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(&mut self, value: &OptionValue) -> u64 {
        let addr = value.addr();
        if let Some(tag) = self.tags.get(&addr) {
            return *tag;
        }
        self.next_tag += 1;
        self.tags.insert(addr, self.next_tag);
        self.pinned.push(value.0.clone());
        self.next_tag
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Maps arbitrary model values to [`HashKey`]s under a fixed [`KeyPolicy`].
#[derive(Debug)]
pub struct IdentityHasher {
    policy: KeyPolicy,
    arena: IdentityArena,
}

impl IdentityHasher {
    pub fn new(policy: KeyPolicy) -> Self {
        Self {
            policy,
            arena: IdentityArena::new(),
        }
    }

    pub fn identity() -> Self {
        Self::new(KeyPolicy::Identity)
    }

    pub fn with_field_selector(path: impl Into<String>) -> Self {
        Self::new(KeyPolicy::FieldSelector(path.into()))
    }

    pub fn policy(&self) -> &KeyPolicy {
        &self.policy
    }

    /// Derive the key for `value`. `scope` is consulted only by the
    /// field-selector policy, when the path does not resolve against the
    /// value itself.
    pub fn hash(&mut self, value: &OptionValue, scope: Option<&Value>) -> HashKey {
        match &self.policy {
            KeyPolicy::Identity => {
                if value.is_composite() {
                    HashKey::Tag(self.arena.tag(value))
                } else {
                    scalar_key(value.get())
                }
            }
            KeyPolicy::FieldSelector(path) => {
                let selected = select_path(value.get(), path)
                    .or_else(|| scope.and_then(|scope| select_path(scope, path)));
                match selected {
                    Some(field @ (Value::Object(_) | Value::Array(_))) => {
                        HashKey::Digest(digest(field))
                    }
                    Some(field) => scalar_key(field),
                    // Unresolvable selector keys like a null field; callers
                    // supplying a selector are expected to make it total.
                    None => scalar_key(&Value::Null),
                }
            }
        }
    }
}

fn scalar_key(value: &Value) -> HashKey {
    HashKey::Scalar(value.to_string())
}

fn select_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn digest(value: &Value) -> [u8; 32] {
    *blake3::hash(value.to_string().as_bytes()).as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitive_keys_are_canonical_text() {
        let mut hasher = IdentityHasher::identity();
        let green = OptionValue::new(json!("Green"));
        assert_eq!(
            hasher.hash(&green, None),
            HashKey::Scalar("\"Green\"".to_string())
        );
        // The string "1" and the number 1 stay distinct.
        let text = hasher.hash(&OptionValue::new(json!("1")), None);
        let number = hasher.hash(&OptionValue::new(json!(1)), None);
        assert_ne!(text, number);
    }

    #[test]
    fn same_instance_keeps_its_tag() {
        let mut hasher = IdentityHasher::identity();
        let value = OptionValue::new(json!({ "id": 7 }));
        let first = hasher.hash(&value, None);
        let second = hasher.hash(&value.clone(), None);
        assert_eq!(first, second);
    }

    #[test]
    fn equal_content_distinct_instances_get_distinct_tags() {
        let mut hasher = IdentityHasher::identity();
        let a = hasher.hash(&OptionValue::new(json!({ "id": 7 })), None);
        let b = hasher.hash(&OptionValue::new(json!({ "id": 7 })), None);
        assert_ne!(a, b);
    }

    #[test]
    fn field_selector_matches_across_instances() {
        let mut hasher = IdentityHasher::with_field_selector("id");
        let a = hasher.hash(&OptionValue::new(json!({ "id": 7, "label": "x" })), None);
        let b = hasher.hash(&OptionValue::new(json!({ "id": 7, "label": "y" })), None);
        assert_eq!(a, b);
    }

    #[test]
    fn field_selector_walks_nested_paths() {
        let mut hasher = IdentityHasher::with_field_selector("item.id");
        let key = hasher.hash(&OptionValue::new(json!({ "item": { "id": 3 } })), None);
        assert_eq!(key, HashKey::Scalar("3".to_string()));
    }

    #[test]
    fn field_selector_falls_back_to_scope() {
        let mut hasher = IdentityHasher::with_field_selector("fallback");
        let scope = json!({ "fallback": "s" });
        let key = hasher.hash(&OptionValue::new(json!({ "id": 1 })), Some(&scope));
        assert_eq!(key, HashKey::Scalar("\"s\"".to_string()));
    }

    #[test]
    fn composite_selector_result_is_digested() {
        let mut hasher = IdentityHasher::with_field_selector("ref");
        let a = hasher.hash(&OptionValue::new(json!({ "ref": { "id": 1 } })), None);
        let b = hasher.hash(&OptionValue::new(json!({ "ref": { "id": 1 } })), None);
        assert_eq!(a, b);
        assert!(matches!(a, HashKey::Digest(_)));
    }

    #[test]
    fn arena_pins_instances() {
        let mut arena = IdentityArena::new();
        let tag = {
            let value = OptionValue::new(json!({ "short": "lived" }));
            arena.tag(&value)
        };
        // The allocation is still pinned, so a fresh value cannot reuse it.
        let other = OptionValue::new(json!({ "short": "lived" }));
        assert_ne!(arena.tag(&other), tag);
        assert_eq!(arena.len(), 2);
    }
}
