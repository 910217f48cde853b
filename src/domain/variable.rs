use super::value_objects::Domain;
use crate::native::NativeRef;

/// One term of the model, bound to the native environment of its session
///
/// A variable must not be used once its owning session is disposed. Handles
/// from another environment are rejected by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    domain: Domain,
    native: NativeRef,
    name: String,
    precomputed_value: Option<f64>,
    persistence_index: Option<usize>,
}

impl Variable {
    pub(crate) fn new(
        domain: Domain,
        native: NativeRef,
        name: impl Into<String>,
        precomputed_value: Option<f64>,
        persistence_index: Option<usize>,
    ) -> Self {
        Self {
            domain,
            native,
            name: name.into(),
            precomputed_value,
            persistence_index,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn native(&self) -> &NativeRef {
        &self.native
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn precomputed_value(&self) -> Option<f64> {
        self.precomputed_value
    }

    /// Position of the backing column in the native column array, if any
    pub fn persistence_index(&self) -> Option<usize> {
        self.persistence_index
    }

    /// Record a value learnt from an equality; a value is only ever set once.
    pub(crate) fn adopt_value(&mut self, value: f64) -> bool {
        if self.precomputed_value.is_some() {
            return false;
        }
        self.precomputed_value = Some(value);
        true
    }

    pub(crate) fn rebind(&self, native: NativeRef, persistence_index: Option<usize>) -> Self {
        Self {
            native,
            persistence_index,
            ..self.clone()
        }
    }
}
