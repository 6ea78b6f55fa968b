// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Complex-state detection and normalization
//!
//! The first snapshot a session produces is inspected once. If any field lies
//! outside the primitive set (int, float, bool, string, map), every later
//! snapshot is normalized before it is sent. Normalization is skipped on the
//! common all-primitive path.

use crate::state::{StateSnapshot, StateValue};
use ndarray::{ArrayViewD, Axis};
use std::sync::Arc;
use tracing::{debug, info};

/// Converts one non-primitive leaf into a transmittable value.
///
/// Returns `None` for values it does not know how to convert; those are left
/// untouched.
pub type NormalizeFn = Arc<dyn Fn(&StateValue) -> Option<StateValue> + Send + Sync>;

/// Default conversion for fixed-width numerics and n-dimensional arrays
pub fn default_normalize(value: &StateValue) -> Option<StateValue> {
    match value {
        StateValue::Numeric(scalar) => Some(scalar.item()),
        StateValue::Array(array) => Some(array_to_list(array.view())),
        _ => None,
    }
}

fn array_to_list(view: ArrayViewD<'_, f64>) -> StateValue {
    if view.ndim() == 0 {
        return StateValue::Float(view.iter().next().copied().unwrap_or_default());
    }
    StateValue::List(view.axis_iter(Axis(0)).map(array_to_list).collect())
}

/// True if any field in `snapshot` (recursively) is outside the primitive set
pub fn detect(snapshot: &StateSnapshot) -> bool {
    snapshot.values().any(is_complex)
}

fn is_complex(value: &StateValue) -> bool {
    match value {
        StateValue::Map(inner) => detect(inner),
        other => !other.is_primitive(),
    }
}

/// Decides once whether snapshots need normalizing, then applies it
pub struct StateNormalizer {
    complex: Option<bool>,
    force: bool,
    normalize: NormalizeFn,
}

impl StateNormalizer {
    pub fn new() -> Self {
        Self {
            complex: None,
            force: false,
            normalize: Arc::new(default_normalize),
        }
    }

    /// Treat every snapshot as complex regardless of detection
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Replace the leaf conversion function
    pub fn with_normalize_fn(mut self, normalize: NormalizeFn) -> Self {
        self.normalize = normalize;
        self
    }

    /// Current flag; `None` until the first snapshot has been observed
    pub fn complex_state(&self) -> Option<bool> {
        if self.force {
            Some(true)
        } else {
            self.complex
        }
    }

    /// Run detection on the first snapshot only
    pub fn observe(&mut self, snapshot: &StateSnapshot) -> bool {
        if let Some(flag) = self.complex {
            return flag || self.force;
        }

        let detected = detect(snapshot);
        self.complex = Some(detected);
        if detected {
            info!("[STATE] Complex state fields detected - snapshots will be normalized");
        } else if self.force {
            info!("[STATE] Complex state handling forced by simulator");
        } else {
            debug!("[STATE] State is all primitive - normalization disabled");
        }
        detected || self.force
    }

    /// Observe, then normalize if the flag is set
    pub fn prepare(&mut self, snapshot: StateSnapshot) -> StateSnapshot {
        if self.observe(&snapshot) {
            self.normalize_snapshot(snapshot)
        } else {
            snapshot
        }
    }

    /// Normalize every leaf of `snapshot` unconditionally
    pub fn normalize_snapshot(&self, snapshot: StateSnapshot) -> StateSnapshot {
        snapshot
            .into_iter()
            .map(|(key, value)| (key, self.normalize_value(value)))
            .collect()
    }

    fn normalize_value(&self, value: StateValue) -> StateValue {
        match value {
            StateValue::Map(inner) => StateValue::Map(self.normalize_snapshot(inner)),
            StateValue::List(items) => StateValue::List(
                items
                    .into_iter()
                    .map(|item| self.normalize_value(item))
                    .collect(),
            ),
            leaf if leaf.is_primitive() => leaf,
            leaf => match (self.normalize)(&leaf) {
                // Arrays come back as lists whose elements still need a pass
                Some(converted @ (StateValue::List(_) | StateValue::Map(_))) => {
                    self.normalize_value(converted)
                }
                Some(converted) => converted,
                None => leaf,
            },
        }
    }
}

impl Default for StateNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
