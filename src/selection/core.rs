use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use indexmap::IndexMap;
use serde_json::{Value, json};

use crate::error::{Result, SelectError};
use crate::hash::{HashKey, IdentityHasher, OptionValue};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::SelectMetrics;

const LOG_TARGET: &str = "floatmenu::selection";

/// Validator key flagged on the binding when a multi-select model value is
/// not sequence-typed.
pub const MULTIPLE_VALIDATOR: &str = "multiple";

/// The externally owned model value, as observed through a [`ModelBinding`].
#[derive(Debug, Clone, Default)]
pub enum BoundValue {
    #[default]
    Unset,
    One(OptionValue),
    Many(Vec<OptionValue>),
}

impl BoundValue {
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    /// JSON rendering of the bound value, mainly for assertions and logs.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Unset => Value::Null,
            Self::One(value) => value.get().clone(),
            Self::Many(values) => Value::Array(values.iter().map(|v| v.get().clone()).collect()),
        }
    }
}

/// Protocol to and from the external model layer.
///
/// The binding owns the model value; the controller reads it on every
/// external-change notification and pushes derived view values back. The
/// controller never assumes it is the only writer.
pub trait ModelBinding: Send {
    fn bound_value(&self) -> BoundValue;
    fn set_view_value(&mut self, value: BoundValue);
    fn set_validity(&mut self, _key: &str, _is_valid: bool) {}
}

/// Shared handle to a model binding.
pub type SharedBinding = Arc<Mutex<dyn ModelBinding>>;

/// In-memory reference binding used by tests and demos.
#[derive(Default)]
pub struct MemoryModel {
    value: BoundValue,
    validity: HashMap<String, bool>,
}

impl MemoryModel {
    pub fn new(value: BoundValue) -> Self {
        Self {
            value,
            validity: HashMap::new(),
        }
    }

    /// External (application-side) write to the model value. The caller is
    /// expected to follow up with `SelectionController::model_changed`.
    pub fn assign(&mut self, value: BoundValue) {
        self.value = value;
    }

    pub fn value(&self) -> &BoundValue {
        &self.value
    }

    pub fn is_valid(&self, key: &str) -> bool {
        self.validity.get(key).copied().unwrap_or(true)
    }
}

impl ModelBinding for MemoryModel {
    fn bound_value(&self) -> BoundValue {
        self.value.clone()
    }

    fn set_view_value(&mut self, value: BoundValue) {
        self.value = value;
    }

    fn set_validity(&mut self, key: &str, is_valid: bool) {
        self.validity.insert(key.to_string(), is_valid);
    }
}

#[derive(Debug)]
struct OptionState {
    value: OptionValue,
    selected: bool,
}

/// A live, mounted option.
///
/// Owned by the rendering layer; the controller keeps non-owning clones
/// keyed by hash. The selected flag is the option's visual state and is
/// only flipped through the controller.
#[derive(Debug)]
pub struct OptionHandle {
    state: RwLock<OptionState>,
}

pub type SharedOption = Arc<OptionHandle>;

impl OptionHandle {
    pub fn new(value: OptionValue) -> SharedOption {
        Arc::new(Self {
            state: RwLock::new(OptionState {
                value,
                selected: false,
            }),
        })
    }

    pub fn value(&self) -> OptionValue {
        self.state.read().expect("option lock poisoned").value.clone()
    }

    pub fn set_value(&self, value: OptionValue) {
        self.state.write().expect("option lock poisoned").value = value;
    }

    pub fn is_selected(&self) -> bool {
        self.state.read().expect("option lock poisoned").selected
    }

    /// Flip the visual flag; returns whether the state actually changed.
    pub fn set_selected(&self, selected: bool) -> bool {
        let mut state = self.state.write().expect("option lock poisoned");
        if state.selected == selected {
            return false;
        }
        state.selected = selected;
        true
    }
}

/// What a click on an option meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Multi-select toggle; `selected` is the new state of the option.
    Toggled { selected: bool },
    /// Single-select choice; the menu should commit and close.
    Committed,
    /// Re-click of the current single selection. Nothing changed.
    Inert,
}

/// Owns the option registry and the selected set, and keeps both in sync
/// with the externally bound value.
///
/// All selection mutation funnels through this type; neither the overlay
/// nor the rendering layer touches the selected mapping directly.
pub struct SelectionController {
    multiple: bool,
    hasher: IdentityHasher,
    options: HashMap<HashKey, SharedOption>,
    selected: IndexMap<HashKey, OptionValue>,
    binding: SharedBinding,
    logger: Option<Logger>,
    metrics: Option<Arc<Mutex<SelectMetrics>>>,
}

impl SelectionController {
    pub fn new(multiple: bool, hasher: IdentityHasher, binding: SharedBinding) -> Self {
        Self {
            multiple,
            hasher,
            options: HashMap::new(),
            selected: IndexMap::new(),
            binding,
            logger: None,
            metrics: None,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Mutex<SelectMetrics>>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Derive the hash key for a value under the controller's policy.
    pub fn hash(&mut self, value: &OptionValue, scope: Option<&Value>) -> HashKey {
        self.hasher.hash(value, scope)
    }

    pub fn is_selected(&self, key: &HashKey) -> bool {
        self.selected.contains_key(key)
    }

    pub fn selected_keys(&self) -> Vec<HashKey> {
        self.selected.keys().cloned().collect()
    }

    pub fn option(&self, key: &HashKey) -> Option<SharedOption> {
        self.options.get(key).cloned()
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Register a mounted option under its hash key.
    ///
    /// A key that is already selected (an orphan from an earlier model
    /// write) promotes the option: it becomes visually selected and the
    /// view value is refreshed with the option's fresher value.
    pub fn add_option(&mut self, key: HashKey, option: SharedOption) -> Result<()> {
        if self.options.contains_key(&key) {
            return Err(SelectError::DuplicateOption(key));
        }

        let promote = self.selected.contains_key(&key);
        self.options.insert(key.clone(), option.clone());

        if promote {
            self.select(key.clone(), option.value());
            self.refresh_view_value();
            if let Some(metrics) = self.metrics.as_ref() {
                if let Ok(mut guard) = metrics.lock() {
                    guard.record_orphan_promotion();
                }
            }
            self.log(
                LogLevel::Debug,
                "orphan_promoted",
                [json_kv("key", json!(key.to_string()))],
            );
        }
        Ok(())
    }

    /// Unregister a mounted option. The selection entry, if any, survives
    /// as an orphan; async-reloaded option lists rely on that.
    pub fn remove_option(&mut self, key: &HashKey, option: &SharedOption) {
        if let Some(existing) = self.options.get(key) {
            // A replacement may already own this key; only remove our own
            // registration.
            if Arc::ptr_eq(existing, option) {
                self.options.remove(key);
            }
        }
    }

    /// Mark `key` selected with snapshot `value`.
    ///
    /// In single-select mode callers deselect the current entry first;
    /// `handle_click` and `model_changed` both do.
    pub fn select(&mut self, key: HashKey, value: OptionValue) {
        if let Some(option) = self.options.get(&key) {
            option.set_selected(true);
        }
        self.selected.insert(key, value);
        if let Some(metrics) = self.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                guard.record_selection();
            }
        }
    }

    pub fn deselect(&mut self, key: &HashKey) {
        if let Some(option) = self.options.get(key) {
            option.set_selected(false);
        }
        if self.selected.shift_remove(key).is_some() {
            if let Some(metrics) = self.metrics.as_ref() {
                if let Ok(mut guard) = metrics.lock() {
                    guard.record_deselection();
                }
            }
        }
    }

    /// Apply the click policy for an option identified by `key`.
    pub fn handle_click(&mut self, key: HashKey, value: OptionValue) -> ClickOutcome {
        let outcome = if self.multiple {
            if self.is_selected(&key) {
                self.deselect(&key);
                ClickOutcome::Toggled { selected: false }
            } else {
                self.select(key, value);
                ClickOutcome::Toggled { selected: true }
            }
        } else if self.is_selected(&key) {
            // Re-clicking the current selection is inert.
            return ClickOutcome::Inert;
        } else {
            if let Some(current) = self.selected.keys().next().cloned() {
                self.deselect(&current);
            }
            self.select(key, value);
            ClickOutcome::Committed
        };

        self.refresh_view_value();
        outcome
    }

    /// Recompute the externally visible value from the selected set and
    /// push it through the binding.
    ///
    /// A live option's current value wins over the stored snapshot, since
    /// the option's underlying value may have been replaced since it was
    /// selected. Orphans contribute their snapshot.
    pub fn refresh_view_value(&mut self) {
        let values: Vec<OptionValue> = self
            .selected
            .iter()
            .map(|(key, snapshot)| match self.options.get(key) {
                Some(option) => option.value(),
                None => snapshot.clone(),
            })
            .collect();

        let view = if self.multiple {
            BoundValue::Many(values)
        } else {
            values
                .into_iter()
                .next()
                .map(BoundValue::One)
                .unwrap_or(BoundValue::Unset)
        };

        let entries = self.selected.len();
        if let Ok(mut binding) = self.binding.lock() {
            binding.set_view_value(view);
        }
        self.log(
            LogLevel::Debug,
            "view_value_refreshed",
            [json_kv("entries", json!(entries))],
        );
    }

    /// External-change notification: re-derive the selected set from the
    /// current bound value.
    ///
    /// Callers must invoke this on every observed change, not only
    /// reference changes, since consumers may mutate a bound sequence in
    /// place.
    pub fn model_changed(&mut self) {
        let value = self
            .binding
            .lock()
            .map(|binding| binding.bound_value())
            .unwrap_or_default();
        if self.multiple {
            self.render_multiple(value);
        } else {
            self.render_single(value);
        }
    }

    fn render_single(&mut self, value: BoundValue) {
        for key in self.selected_keys() {
            self.deselect(&key);
        }
        if let BoundValue::One(value) = value {
            let key = self.hasher.hash(&value, None);
            self.select(key, value);
        }
        // Unset (and a mistyped sequence) leave the selection cleared.
    }

    fn render_multiple(&mut self, value: BoundValue) {
        let values = match value {
            BoundValue::Many(values) => values,
            _ => {
                // Recoverable validity failure: flag it, keep the last
                // known good selection, resume once the value is a
                // sequence again.
                self.set_multiple_validity(false);
                if let Some(metrics) = self.metrics.as_ref() {
                    if let Ok(mut guard) = metrics.lock() {
                        guard.record_validity_failure();
                    }
                }
                self.log(LogLevel::Warn, "model_value_not_sequence", std::iter::empty());
                return;
            }
        };
        self.set_multiple_validity(true);

        let new_keys: Vec<HashKey> = values
            .iter()
            .map(|value| self.hasher.hash(value, None))
            .collect();
        for key in self.selected_keys() {
            if !new_keys.contains(&key) {
                self.deselect(&key);
            }
        }
        // Only genuinely new keys are selected; re-selecting survivors
        // would re-fire the option flag write and the selection counter.
        for (key, value) in new_keys.into_iter().zip(values) {
            if !self.selected.contains_key(&key) {
                self.select(key, value);
            }
        }
    }

    /// Rehash an option whose underlying value changed: move its
    /// registration from `old_key` to the new key and return it.
    pub fn update_option_value(
        &mut self,
        old_key: &HashKey,
        option: &SharedOption,
        new_value: OptionValue,
    ) -> Result<HashKey> {
        let new_key = self.hasher.hash(&new_value, None);
        // Check for a collision before mutating anything, so a duplicate
        // leaves the option registered under its old key and value.
        if new_key != *old_key && self.options.contains_key(&new_key) {
            return Err(SelectError::DuplicateOption(new_key));
        }
        option.set_value(new_value);
        self.remove_option(old_key, option);
        self.add_option(new_key.clone(), option.clone())?;
        Ok(new_key)
    }

    fn set_multiple_validity(&mut self, is_valid: bool) {
        if let Ok(mut binding) = self.binding.lock() {
            binding.set_validity(MULTIPLE_VALIDATOR, is_valid);
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }
}
