//! Proximity Query
//!
//! Filters and orders located candidates by their distance to an origin.
//! Candidates without coordinates are dropped from every result.

use crate::domain::entities::{Geocode, LocatedEntity, Location};
use crate::domain::services::DistanceEngine;
use crate::domain::value_objects::{Formula, Point, Units};
use crate::error::DistanceError;

/// Anything that can supply a coordinate pair for proximity search.
pub trait ProximitySearchable {
    /// The candidate's position, or None when it has not been geocoded.
    fn point(&self) -> Option<Point>;
}

impl ProximitySearchable for Point {
    fn point(&self) -> Option<Point> {
        Some(*self)
    }
}

impl ProximitySearchable for Geocode {
    fn point(&self) -> Option<Point> {
        Geocode::point(self)
    }
}

impl ProximitySearchable for Location {
    fn point(&self) -> Option<Point> {
        Location::point(self)
    }
}

impl ProximitySearchable for LocatedEntity {
    fn point(&self) -> Option<Point> {
        self.geocode.point()
    }
}

impl<T: ProximitySearchable + ?Sized> ProximitySearchable for &T {
    fn point(&self) -> Option<Point> {
        (**self).point()
    }
}

/// A candidate annotated with its distance to the query origin.
///
/// The distance is an attribute of the result, not of the candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    pub item: T,
    pub distance: f64,
}

/// Distance-based filter and sort around an origin point.
///
/// # Example
/// ```ignore
/// let spots = ProximityQuery::new(origin)
///     .units(Units::Kilometers)
///     .within(2.0, &vacations)?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProximityQuery {
    origin: Point,
    units: Units,
    formula: Formula,
}

impl ProximityQuery {
    pub fn new(origin: Point) -> Self {
        Self {
            origin,
            units: Units::default(),
            formula: Formula::default(),
        }
    }

    pub fn units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn formula(mut self, formula: Formula) -> Self {
        self.formula = formula;
        self
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Every resolved candidate with its distance, in input order.
    pub fn annotate<T, I>(&self, candidates: I) -> Result<Vec<Located<T>>, DistanceError>
    where
        T: ProximitySearchable,
        I: IntoIterator<Item = T>,
    {
        let mut located = Vec::new();
        for item in candidates {
            let Some(point) = item.point() else {
                continue;
            };
            let distance = DistanceEngine::between(self.origin, point, self.units, self.formula)?;
            located.push(Located { item, distance });
        }
        Ok(located)
    }

    /// Candidates no farther than `radius`, nearest first.
    pub fn within<T, I>(&self, radius: f64, candidates: I) -> Result<Vec<Located<T>>, DistanceError>
    where
        T: ProximitySearchable,
        I: IntoIterator<Item = T>,
    {
        let mut located = self.annotate(candidates)?;
        located.retain(|l| l.distance <= radius);
        sort_ascending(&mut located);
        Ok(located)
    }

    /// Candidates strictly farther than `radius`, nearest first.
    pub fn beyond<T, I>(&self, radius: f64, candidates: I) -> Result<Vec<Located<T>>, DistanceError>
    where
        T: ProximitySearchable,
        I: IntoIterator<Item = T>,
    {
        let mut located = self.annotate(candidates)?;
        located.retain(|l| l.distance > radius);
        sort_ascending(&mut located);
        Ok(located)
    }

    /// All resolved candidates, nearest first.
    pub fn near<T, I>(&self, candidates: I) -> Result<Vec<Located<T>>, DistanceError>
    where
        T: ProximitySearchable,
        I: IntoIterator<Item = T>,
    {
        let mut located = self.annotate(candidates)?;
        sort_ascending(&mut located);
        Ok(located)
    }

    /// All resolved candidates, farthest first.
    pub fn far<T, I>(&self, candidates: I) -> Result<Vec<Located<T>>, DistanceError>
    where
        T: ProximitySearchable,
        I: IntoIterator<Item = T>,
    {
        let mut located = self.annotate(candidates)?;
        located.sort_by(|a, b| b.distance.total_cmp(&a.distance));
        Ok(located)
    }

    /// The closest candidate. On ties the first one wins.
    pub fn nearest<T, I>(&self, candidates: I) -> Result<Option<Located<T>>, DistanceError>
    where
        T: ProximitySearchable,
        I: IntoIterator<Item = T>,
    {
        self.pick(candidates, |candidate, best| candidate < best)
    }

    /// The farthest candidate. On ties the first one wins.
    pub fn farthest<T, I>(&self, candidates: I) -> Result<Option<Located<T>>, DistanceError>
    where
        T: ProximitySearchable,
        I: IntoIterator<Item = T>,
    {
        self.pick(candidates, |candidate, best| candidate > best)
    }

    fn pick<T, I, F>(&self, candidates: I, better: F) -> Result<Option<Located<T>>, DistanceError>
    where
        T: ProximitySearchable,
        I: IntoIterator<Item = T>,
        F: Fn(f64, f64) -> bool,
    {
        let mut best: Option<Located<T>> = None;

        for candidate in self.annotate(candidates)? {
            match &best {
                Some(current) if !better(candidate.distance, current.distance) => {}
                _ => best = Some(candidate),
            }
        }

        Ok(best)
    }
}

fn sort_ascending<T>(located: &mut [Located<T>]) {
    // stable: equal distances keep input order
    located.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}
