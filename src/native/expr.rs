use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Affine expression over native columns: `sum(coef * column) + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: BTreeMap<usize, f64>, // column index -> coefficient
    constant: f64,
}

impl LinearExpr {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn column(index: usize) -> Self {
        Self::from_terms([(index, 1.0)], 0.0)
    }

    pub fn constant_value(value: f64) -> Self {
        Self {
            terms: BTreeMap::new(),
            constant: value,
        }
    }

    pub fn from_terms(terms: impl IntoIterator<Item = (usize, f64)>, constant: f64) -> Self {
        let mut expr = Self::constant_value(constant);
        for (index, coef) in terms {
            *expr.terms.entry(index).or_insert(0.0) += coef;
        }
        expr.prune();
        expr
    }

    pub fn terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.terms.iter().map(|(&index, &coef)| (index, coef))
    }

    pub fn coefficient(&self, index: usize) -> f64 {
        self.terms.get(&index).copied().unwrap_or(0.0)
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// No column terms left
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn max_column(&self) -> Option<usize> {
        self.terms.keys().next_back().copied()
    }

    pub fn add(&self, other: &LinearExpr) -> Self {
        let mut out = self.clone();
        out.constant += other.constant;
        for (index, coef) in other.terms() {
            *out.terms.entry(index).or_insert(0.0) += coef;
        }
        out.prune();
        out
    }

    pub fn sub(&self, other: &LinearExpr) -> Self {
        self.add(&other.scale(-1.0))
    }

    pub fn scale(&self, factor: f64) -> Self {
        let mut out = self.clone();
        out.constant *= factor;
        for coef in out.terms.values_mut() {
            *coef *= factor;
        }
        out.prune();
        out
    }

    /// Product of two expressions; `None` when both carry column terms.
    pub fn mul(&self, other: &LinearExpr) -> Option<Self> {
        if self.is_constant() {
            Some(other.scale(self.constant))
        } else if other.is_constant() {
            Some(self.scale(other.constant))
        } else {
            None
        }
    }

    /// Evaluate against column values; `None` if a column has no value.
    pub fn evaluate(&self, values: &[f64]) -> Option<f64> {
        self.terms().try_fold(self.constant, |acc, (index, coef)| {
            values.get(index).map(|value| acc + coef * value)
        })
    }

    /// Rewrite every column index through `map`
    pub fn map_columns<E>(
        &self,
        mut map: impl FnMut(usize) -> Result<usize, E>,
    ) -> Result<Self, E> {
        let mut terms = Vec::with_capacity(self.terms.len());
        for (index, coef) in self.terms() {
            terms.push((map(index)?, coef));
        }
        Ok(Self::from_terms(terms, self.constant))
    }

    pub(crate) fn without_constant(&self) -> Self {
        Self {
            terms: self.terms.clone(),
            constant: 0.0,
        }
    }

    fn prune(&mut self) {
        self.terms.retain(|_, coef| *coef != 0.0);
    }
}

/// Identity of one native environment, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(u64);

impl EnvId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "env#{}", self.0)
    }
}

/// Handle to a native expression, tagged with the environment that issued it
#[derive(Debug, Clone, PartialEq)]
pub struct NativeRef {
    env: EnvId,
    expr: LinearExpr,
}

impl NativeRef {
    pub(crate) fn new(env: EnvId, expr: LinearExpr) -> Self {
        Self { env, expr }
    }

    pub fn env(&self) -> EnvId {
        self.env
    }

    pub fn expr(&self) -> &LinearExpr {
        &self.expr
    }
}
