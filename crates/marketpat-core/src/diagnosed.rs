//! Values that may have been degraded on the way out.
//!
//! Operations that substitute a default instead of failing (field parsing,
//! best-effort listings) return a [`Diagnosed`] so callers can inspect what
//! was substituted, or ignore it.

/// A value together with the diagnostics recorded while producing it.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Diagnosed<T, D> {
    value: T,
    diagnostics: Vec<D>,
}

impl<T, D> Diagnosed<T, D> {
    /// A value produced without any degradation.
    pub fn clean(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    /// A fallback value and the reason it was substituted.
    pub fn with_diagnostic(value: T, diagnostic: D) -> Self {
        Self {
            value,
            diagnostics: vec![diagnostic],
        }
    }

    pub fn push(&mut self, diagnostic: D) {
        self.diagnostics.push(diagnostic);
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn diagnostics(&self) -> &[D] {
        &self.diagnostics
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, Vec<D>) {
        (self.value, self.diagnostics)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Diagnosed<U, D> {
        Diagnosed {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    /// Treat the first diagnostic as a hard failure.
    pub fn into_result(self) -> Result<T, D> {
        match self.diagnostics.into_iter().next() {
            Some(diagnostic) => Err(diagnostic),
            None => Ok(self.value),
        }
    }
}
