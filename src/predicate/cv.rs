//! Collective variables: scalar functions of a configuration

use std::fmt;

/// Scalar order parameter evaluated on a configuration
///
/// Must be pure and cheap: it is evaluated on every trajectory step.
pub trait CollectiveVariable<C: ?Sized>: Send + Sync {
    /// Value of the collective variable for `config`
    fn value(&self, config: &C) -> f64;
}

impl<C: ?Sized, F> CollectiveVariable<C> for F
where
    F: Fn(&C) -> f64 + Send + Sync,
{
    fn value(&self, config: &C) -> f64 {
        self(config)
    }
}

/// A collective variable carrying a human-readable name
pub struct NamedCv<F> {
    name: String,
    f: F,
}

impl<F> NamedCv<F> {
    /// Attach a name to a collective variable function
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Name of the collective variable
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<C: ?Sized, F> CollectiveVariable<C> for NamedCv<F>
where
    F: CollectiveVariable<C>,
{
    fn value(&self, config: &C) -> f64 {
        self.f.value(config)
    }
}

impl<F> fmt::Debug for NamedCv<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedCv").field("name", &self.name).finish()
    }
}
