//! Membership predicates over configurations
//!
//! A predicate is the indicator function of a region of configuration
//! space. States use it for basin membership, interfaces for the volume
//! bounded by the interface surface (inside = `true`).

use std::fmt;

use ndarray::Array1;

use super::cv::CollectiveVariable;

/// Membership test over configurations of type `C`
///
/// Implementations must be pure and cheap; the tracker calls every state
/// predicate and every interface predicate once per observed step.
pub trait Predicate<C: ?Sized>: Send + Sync {
    /// Is `config` inside the region?
    fn test(&self, config: &C) -> bool;
}

impl<C: ?Sized, F> Predicate<C> for F
where
    F: Fn(&C) -> bool + Send + Sync,
{
    fn test(&self, config: &C) -> bool {
        self(config)
    }
}

/// Owned, type-erased predicate
pub type BoxedPredicate<C> = Box<dyn Predicate<C>>;

/// Order-parameter window `λ_min ≤ cv(x) < λ_max`
///
/// Half-open so that adjacent windows sharing a boundary never overlap.
/// A `NaN` collective variable value is outside every window.
#[derive(Debug, Clone)]
pub struct CvRange<V> {
    cv: V,
    lambda_min: f64,
    lambda_max: f64,
}

impl<V> CvRange<V> {
    /// Window `[lambda_min, lambda_max)` over `cv`
    pub fn new(cv: V, lambda_min: f64, lambda_max: f64) -> Self {
        Self { cv, lambda_min, lambda_max }
    }

    /// Everything with `cv(x) < threshold`
    pub fn below(cv: V, threshold: f64) -> Self {
        Self::new(cv, f64::NEG_INFINITY, threshold)
    }

    /// Everything with `cv(x) ≥ threshold`
    pub fn above(cv: V, threshold: f64) -> Self {
        Self::new(cv, threshold, f64::INFINITY)
    }

    /// Lower bound (inclusive)
    pub fn lambda_min(&self) -> f64 {
        self.lambda_min
    }

    /// Upper bound (exclusive)
    pub fn lambda_max(&self) -> f64 {
        self.lambda_max
    }
}

impl<C: ?Sized, V> Predicate<C> for CvRange<V>
where
    V: CollectiveVariable<C>,
{
    fn test(&self, config: &C) -> bool {
        let value = self.cv.value(config);
        value >= self.lambda_min && value < self.lambda_max
    }
}

/// Axis-aligned box over a coordinate projection of the configuration
///
/// Each axis is half-open, `lower[d] ≤ x[d] < upper[d]`. A projection of the
/// wrong dimension is never inside.
pub struct BoxRegion<P> {
    projection: P,
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl<P> BoxRegion<P> {
    /// Box `[lower, upper)` in the coordinates produced by `projection`
    pub fn new(projection: P, lower: Array1<f64>, upper: Array1<f64>) -> Self {
        Self { projection, lower, upper }
    }

    /// Number of projected coordinates the box constrains
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }
}

impl<C: ?Sized, P> Predicate<C> for BoxRegion<P>
where
    P: Fn(&C) -> Array1<f64> + Send + Sync,
{
    fn test(&self, config: &C) -> bool {
        let x = (self.projection)(config);
        if x.len() != self.lower.len() || x.len() != self.upper.len() {
            return false;
        }
        x.iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(&xi, (&lo, &hi))| xi >= lo && xi < hi)
    }
}

impl<P> fmt::Debug for BoxRegion<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxRegion")
            .field("lower", &self.lower)
            .field("upper", &self.upper)
            .finish()
    }
}

/// The whole configuration space
#[derive(Debug, Clone, Copy, Default)]
pub struct Everywhere;

impl<C: ?Sized> Predicate<C> for Everywhere {
    fn test(&self, _config: &C) -> bool {
        true
    }
}

/// The empty region
#[derive(Debug, Clone, Copy, Default)]
pub struct Nowhere;

impl<C: ?Sized> Predicate<C> for Nowhere {
    fn test(&self, _config: &C) -> bool {
        false
    }
}

/// Boolean combination of predicates
pub enum Composite<C: ?Sized> {
    /// Intersection; empty list is everywhere
    All(Vec<BoxedPredicate<C>>),
    /// Union; empty list is nowhere
    Any(Vec<BoxedPredicate<C>>),
    /// Complement
    Not(BoxedPredicate<C>),
}

impl<C: ?Sized> Composite<C> {
    /// Intersection of `parts`
    pub fn all(parts: Vec<BoxedPredicate<C>>) -> Self {
        Self::All(parts)
    }

    /// Union of `parts`
    pub fn any(parts: Vec<BoxedPredicate<C>>) -> Self {
        Self::Any(parts)
    }

    /// Complement of `inner`
    pub fn negate(inner: BoxedPredicate<C>) -> Self {
        Self::Not(inner)
    }
}

impl<C: ?Sized> Predicate<C> for Composite<C> {
    fn test(&self, config: &C) -> bool {
        match self {
            Self::All(parts) => parts.iter().all(|p| p.test(config)),
            Self::Any(parts) => parts.iter().any(|p| p.test(config)),
            Self::Not(inner) => !inner.test(config),
        }
    }
}

impl<C: ?Sized> fmt::Debug for Composite<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All(parts) => write!(f, "All({} parts)", parts.len()),
            Self::Any(parts) => write!(f, "Any({} parts)", parts.len()),
            Self::Not(_) => write!(f, "Not(..)"),
        }
    }
}

/// Combinators for building composite regions
pub trait PredicateExt<C: ?Sized + 'static>: Predicate<C> + Sized + 'static {
    /// Intersection with `other`
    fn and<P: Predicate<C> + 'static>(self, other: P) -> Composite<C> {
        Composite::All(vec![Box::new(self), Box::new(other)])
    }

    /// Union with `other`
    fn or<P: Predicate<C> + 'static>(self, other: P) -> Composite<C> {
        Composite::Any(vec![Box::new(self), Box::new(other)])
    }

    /// Complement
    fn not(self) -> Composite<C> {
        Composite::Not(Box::new(self))
    }

    /// Type-erase
    fn boxed(self) -> BoxedPredicate<C> {
        Box::new(self)
    }
}

impl<C: ?Sized + 'static, P: Predicate<C> + 'static> PredicateExt<C> for P {}
