#![warn(missing_docs)]
//! The optics bench
//!
//! An [`OpticsBench`] owns the input beam, all optical elements placed along the optical axis and the named fits.
//! Elements are stored in an arena indexed by their [`ElementId`]. A separate index keeps them sorted by position
//! (ties are broken by insertion order) and is updated on every mutation. The input beam always comes first.
//!
//! Every mutation is validated before it is committed: a failing call leaves the bench in its previous state.
//! Elements never overlap: a thick element occupies `[position, position + width]` and no other element may start
//! inside this span.
use crate::{
    elements::{ElementId, InputBeam, OpticalElement, PositionLock},
    error::{BeamError, BeamResult},
    fit::Fit,
    meter, micrometer, nanometer,
};
use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uom::si::f64::Length;

/// Ordered collection of optical elements, the input beam and the fits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpticsBench {
    wavelength: Length,
    ambient_index: f64,
    input_beam: ElementId,
    elements: HashMap<ElementId, OpticalElement>,
    sequence: HashMap<ElementId, u64>,
    order: Vec<ElementId>,
    next_sequence: u64,
    #[serde(default)]
    fits: Vec<Fit>,
}
impl OpticsBench {
    /// Creates a new [`OpticsBench`] containing only the given input beam located at position 0.
    ///
    /// # Errors
    ///
    /// This function will return an error if the wavelength is not strictly positive and finite or the input beam
    /// is invalid.
    pub fn new(wavelength: Length, input_beam: InputBeam) -> BeamResult<Self> {
        check_wavelength(wavelength)?;
        let input = OpticalElement::new("input beam", Length::default(), input_beam.into())?;
        let id = input.id();
        let mut bench = Self {
            wavelength,
            ambient_index: 1.0,
            input_beam: id,
            elements: HashMap::new(),
            sequence: HashMap::new(),
            order: Vec::new(),
            next_sequence: 0,
            fits: Vec::new(),
        };
        bench.insert(input);
        Ok(bench)
    }
    /// Creates a bench with a 100 µm waist at position 0 and a wavelength of 1064 nm.
    ///
    /// # Errors
    ///
    /// This function does not fail for these values but shares the signature of [`OpticsBench::new`].
    pub fn with_default_beam() -> BeamResult<Self> {
        let beam = InputBeam::new(micrometer!(100.0), Length::default())?;
        Self::new(nanometer!(1064.0), beam)
    }
    fn insert(&mut self, element: OpticalElement) {
        let id = element.id();
        self.sequence.insert(id, self.next_sequence);
        self.next_sequence += 1;
        self.elements.insert(id, element);
        self.order.push(id);
        self.sort();
    }
    fn sort(&mut self) {
        let input = self.input_beam;
        let elements = &self.elements;
        let sequence = &self.sequence;
        self.order.sort_by(|a, b| {
            (*b == input).cmp(&(*a == input)).then_with(|| {
                let pa = elements.get(a).map_or(0.0, |e| e.position().value);
                let pb = elements.get(b).map_or(0.0, |e| e.position().value);
                pa.total_cmp(&pb)
                    .then_with(|| sequence.get(a).cmp(&sequence.get(b)))
            })
        });
    }
    /// Vacuum wavelength of the beam.
    #[must_use]
    pub const fn wavelength(&self) -> Length {
        self.wavelength
    }
    /// Sets the vacuum wavelength.
    ///
    /// # Errors
    ///
    /// This function will return an error if the wavelength is not strictly positive and finite.
    pub fn set_wavelength(&mut self, wavelength: Length) -> BeamResult<()> {
        check_wavelength(wavelength)?;
        self.wavelength = wavelength;
        Ok(())
    }
    /// Refractive index of the medium surrounding the input beam.
    #[must_use]
    pub const fn ambient_index(&self) -> f64 {
        self.ambient_index
    }
    /// Sets the refractive index of the medium surrounding the input beam.
    ///
    /// # Errors
    ///
    /// This function will return an error if the index is not strictly positive and finite.
    pub fn set_ambient_index(&mut self, index: f64) -> BeamResult<()> {
        if !index.is_finite() || index <= 0.0 {
            return Err(BeamError::ElementConfiguration(
                "ambient refractive index must be > 0.0 and finite".into(),
            ));
        }
        self.ambient_index = index;
        Ok(())
    }
    /// Identifier of the input beam element.
    #[must_use]
    pub const fn input_beam_id(&self) -> ElementId {
        self.input_beam
    }
    /// The input beam element.
    ///
    /// # Errors
    ///
    /// This function will return an error if the bench is corrupted (e.g. by deserialization of inconsistent data).
    pub fn input_element(&self) -> BeamResult<&OpticalElement> {
        self.element_checked(self.input_beam)
    }
    /// The input beam data.
    ///
    /// # Errors
    ///
    /// This function will return an error if the bench is corrupted (e.g. by deserialization of inconsistent data).
    pub fn input_beam(&self) -> BeamResult<&InputBeam> {
        self.input_element()?
            .input_beam()
            .ok_or_else(|| BeamError::Bench("input beam element has the wrong type".into()))
    }
    /// Replaces the input beam data.
    ///
    /// # Errors
    ///
    /// This function will return an error if the new input beam is invalid.
    pub fn set_input_beam(&mut self, beam: InputBeam) -> BeamResult<()> {
        self.modify_element(self.input_beam, |e| {
            if let Some(input) = e.input_beam_mut() {
                *input = beam;
            }
            Ok(())
        })
    }
    /// Returns the element with the given identifier.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&OpticalElement> {
        self.elements.get(&id)
    }
    fn element_checked(&self, id: ElementId) -> BeamResult<&OpticalElement> {
        self.elements
            .get(&id)
            .ok_or_else(|| BeamError::Bench(format!("no element with id {id}")))
    }
    /// Returns the first element with the given name.
    #[must_use]
    pub fn element_by_name(&self, name: &str) -> Option<&OpticalElement> {
        self.elements().find(|e| e.name() == name)
    }
    /// Iterator over all elements in propagation order (input beam first).
    pub fn elements(&self) -> impl Iterator<Item = &OpticalElement> {
        self.order.iter().filter_map(move |id| self.elements.get(id))
    }
    /// Iterator over all elements except the input beam, in propagation order.
    pub fn optics(&self) -> impl Iterator<Item = &OpticalElement> {
        self.elements().filter(|e| !e.is_input_beam())
    }
    /// Number of elements including the input beam.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.order.len()
    }
    /// Position of the end of the last element (or of the input beam for an empty bench).
    #[must_use]
    pub fn end_position(&self) -> Length {
        meter!(self
            .elements()
            .map(|e| e.end_position().value)
            .fold(f64::NEG_INFINITY, f64::max))
    }
    /// Adds an element to the bench and returns its identifier.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the element is an input beam (a bench has exactly one).
    ///   - an element with the same identifier already exists.
    ///   - the element is invalid or placed before the input beam.
    ///   - the element is locked relative to an unknown element.
    ///   - the element overlaps with another element.
    pub fn add_element(&mut self, element: OpticalElement) -> BeamResult<ElementId> {
        if element.is_input_beam() {
            return Err(BeamError::Bench("a bench has exactly one input beam".into()));
        }
        if self.elements.contains_key(&element.id()) {
            return Err(BeamError::Bench(format!(
                "element with id {} already exists",
                element.id()
            )));
        }
        element.validate()?;
        if let PositionLock::Relative(parent) = element.position_lock() {
            self.element_checked(parent)?;
        }
        self.check_behind_input(element.position())?;
        let mut spans = self.spans(|e| Some(Span::of(e)));
        spans.push(Span::of(&element));
        check_spans(&spans)?;
        let id = element.id();
        info!("adding {} '{}'", element.kind().element().node_type(), element.name());
        self.insert(element);
        Ok(id)
    }
    /// Removes an element from the bench.
    ///
    /// Elements locked relative to the removed element take over its position lock.
    ///
    /// # Errors
    ///
    /// This function will return an error if the element does not exist or is the input beam.
    pub fn remove_element(&mut self, id: ElementId) -> BeamResult<OpticalElement> {
        if id == self.input_beam {
            return Err(BeamError::Bench("the input beam cannot be removed".into()));
        }
        let inherited = self.element_checked(id)?.position_lock();
        for element in self.elements.values_mut() {
            if element.position_lock() == PositionLock::Relative(id) {
                element.set_position_lock(inherited);
            }
        }
        self.order.retain(|e| *e != id);
        self.sequence.remove(&id);
        self.elements
            .remove(&id)
            .ok_or_else(|| BeamError::Bench(format!("no element with id {id}")))
    }
    /// Modifies an element through the given closure.
    ///
    /// The closure works on a copy of the element. The copy is validated and only then replaces the original. The
    /// identifier, the position and the position lock cannot be changed this way.
    ///
    /// # Errors
    ///
    /// This function will return an error if the element does not exist, the closure fails, the modified element
    /// is invalid or its new width makes it overlap with the following element.
    pub fn modify_element<F>(&mut self, id: ElementId, f: F) -> BeamResult<()>
    where
        F: FnOnce(&mut OpticalElement) -> BeamResult<()>,
    {
        let original = self.element_checked(id)?;
        let mut modified = original.clone();
        f(&mut modified)?;
        if modified.id() != id
            || modified.position() != original.position()
            || modified.position_lock() != original.position_lock()
            || modified.is_input_beam() != original.is_input_beam()
        {
            return Err(BeamError::Bench(
                "identity, position, lock or input beam type cannot be modified here".into(),
            ));
        }
        modified.validate()?;
        if !modified.is_input_beam() {
            let mut spans = self.spans(|e| (e.id() != id).then(|| Span::of(e)));
            spans.push(Span::of(&modified));
            check_spans(&spans)?;
        }
        self.elements.insert(id, modified);
        Ok(())
    }
    fn lock_root(&self, id: ElementId) -> BeamResult<ElementId> {
        let mut current = id;
        for _ in 0..=self.elements.len() {
            match self.element_checked(current)?.position_lock() {
                PositionLock::Relative(parent) => current = parent,
                _ => return Ok(current),
            }
        }
        Err(BeamError::Bench("cyclic relative lock detected".into()))
    }
    /// All elements rigidly connected to the given element by relative locks (including the element itself).
    ///
    /// # Errors
    ///
    /// This function will return an error if the element does not exist.
    pub fn lock_group(&self, id: ElementId) -> BeamResult<Vec<ElementId>> {
        let root = self.lock_root(id)?;
        let mut group = Vec::new();
        for candidate in &self.order {
            if self.lock_root(*candidate)? == root {
                group.push(*candidate);
            }
        }
        Ok(group)
    }
    /// Returns `true` if the element can be moved (its lock group root is not locked absolutely).
    ///
    /// # Errors
    ///
    /// This function will return an error if the element does not exist.
    pub fn is_movable(&self, id: ElementId) -> BeamResult<bool> {
        let root = self.lock_root(id)?;
        Ok(self.element_checked(root)?.position_lock() != PositionLock::Absolute)
    }
    /// Sets the position lock of an element.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - one of the elements does not exist.
    ///   - the element would be locked to itself or the lock would create a cycle.
    pub fn set_position_lock(&mut self, id: ElementId, lock: PositionLock) -> BeamResult<()> {
        self.element_checked(id)?;
        if let PositionLock::Relative(parent) = lock {
            self.element_checked(parent)?;
            if parent == id || self.is_ancestor(id, parent)? {
                return Err(BeamError::Bench(
                    "relative lock would create a cycle".into(),
                ));
            }
        }
        if let Some(element) = self.elements.get_mut(&id) {
            element.set_position_lock(lock);
        }
        Ok(())
    }
    /// Returns `true` if `ancestor` is reached when following the relative locks starting at `id`.
    fn is_ancestor(&self, ancestor: ElementId, id: ElementId) -> BeamResult<bool> {
        let mut current = id;
        for _ in 0..=self.elements.len() {
            if current == ancestor {
                return Ok(true);
            }
            match self.element_checked(current)?.position_lock() {
                PositionLock::Relative(parent) => current = parent,
                _ => return Ok(false),
            }
        }
        Ok(true)
    }
    /// Moves an element to a new position. All elements of its lock group are moved by the same distance.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the element does not exist.
    ///   - the lock group is locked absolutely.
    ///   - the new position is not finite.
    ///   - an element would end up before the input beam.
    ///   - an element would overlap with another element.
    pub fn move_element(&mut self, id: ElementId, position: Length) -> BeamResult<()> {
        if !position.is_finite() {
            return Err(BeamError::ElementConfiguration(
                "position must be finite".into(),
            ));
        }
        if !self.is_movable(id)? {
            return Err(BeamError::Bench(format!(
                "element '{}' is locked",
                self.element_checked(id)?.name()
            )));
        }
        let delta = position - self.element_checked(id)?.position();
        let group = self.lock_group(id)?;
        self.displace(&group, delta)
    }
    /// Moves the given elements by `delta` ignoring any locks.
    ///
    /// # Errors
    ///
    /// This function will return an error if an element would end up before the input beam or overlap with another
    /// element.
    pub(crate) fn displace(&mut self, group: &[ElementId], delta: Length) -> BeamResult<()> {
        let mut new_positions = HashMap::new();
        for id in group {
            new_positions.insert(*id, self.element_checked(*id)?.position() + delta);
        }
        let input_position = new_positions
            .get(&self.input_beam)
            .copied()
            .map_or_else(|| self.input_element().map(OpticalElement::position), Ok)?;
        for element in self.optics() {
            let p = new_positions
                .get(&element.id())
                .copied()
                .unwrap_or_else(|| element.position());
            if !p.is_finite() {
                return Err(BeamError::ElementConfiguration(
                    "position must be finite".into(),
                ));
            }
            if p < input_position {
                return Err(BeamError::Bench(format!(
                    "element '{}' would be placed before the input beam",
                    element.name()
                )));
            }
        }
        let spans = self.spans(|e| {
            let start = new_positions.get(&e.id()).copied().unwrap_or_else(|| e.position());
            Some(Span {
                name: e.name(),
                start,
                end: start + e.width(),
            })
        });
        check_spans(&spans)?;
        for (id, p) in new_positions {
            if let Some(element) = self.elements.get_mut(&id) {
                element.set_position(p);
            }
        }
        self.sort();
        Ok(())
    }
    /// Spans of all elements except the input beam, as returned by `span`.
    fn spans<'a, F>(&'a self, span: F) -> Vec<Span<'a>>
    where
        F: Fn(&'a OpticalElement) -> Option<Span<'a>>,
    {
        self.optics().filter_map(span).collect()
    }
    /// Check that no two elements overlap.
    ///
    /// This is always the case for a bench built through its methods but not necessarily for a deserialized one.
    ///
    /// # Errors
    ///
    /// This function will return an error naming the first pair of overlapping elements.
    pub fn check_layout(&self) -> BeamResult<()> {
        check_spans(&self.spans(|e| Some(Span::of(e))))
    }
    fn check_behind_input(&self, position: Length) -> BeamResult<()> {
        if position < self.input_element()?.position() {
            return Err(BeamError::Bench(
                "elements cannot be placed before the input beam".into(),
            ));
        }
        Ok(())
    }
    /// The element located closest before `position` (strictly smaller position).
    #[must_use]
    pub fn element_left_of(&self, position: Length) -> Option<&OpticalElement> {
        self.elements().filter(|e| e.position() < position).last()
    }
    /// The element located closest after `position` (strictly larger position).
    #[must_use]
    pub fn element_right_of(&self, position: Length) -> Option<&OpticalElement> {
        self.optics().find(|e| e.position() > position)
    }
    /// All named fits.
    #[must_use]
    pub fn fits(&self) -> &[Fit] {
        &self.fits
    }
    /// The fit with the given name.
    #[must_use]
    pub fn fit(&self, name: &str) -> Option<&Fit> {
        self.fits.iter().find(|f| f.name() == name)
    }
    /// Mutable access to the fit with the given name.
    pub fn fit_mut(&mut self, name: &str) -> Option<&mut Fit> {
        self.fits.iter_mut().find(|f| f.name() == name)
    }
    /// Next free automatic fit name (`Fit<n>` with `n` above the largest existing suffix).
    ///
    /// If the largest suffix cannot be incremented, the smallest unused suffix is taken.
    #[must_use]
    pub fn next_fit_name(&self) -> String {
        let used: Vec<u64> = self
            .fits
            .iter()
            .filter_map(|f| f.name().strip_prefix("Fit"))
            .filter_map(|n| n.parse::<u64>().ok())
            .collect();
        let next = used.iter().max().map_or(1, |n| n.saturating_add(1));
        let next = if used.contains(&next) {
            (1..u64::MAX).find(|n| !used.contains(n)).unwrap_or(next)
        } else {
            next
        };
        format!("Fit{next}")
    }
    /// Creates a new, automatically named fit and returns its name.
    pub fn create_fit(&mut self) -> String {
        let name = self.next_fit_name();
        self.fits.push(Fit::new(&name));
        name
    }
    /// Adds a fit.
    ///
    /// # Errors
    ///
    /// This function will return an error if a fit with the same name already exists.
    pub fn add_fit(&mut self, fit: Fit) -> BeamResult<()> {
        if self.fit(fit.name()).is_some() {
            return Err(BeamError::Bench(format!(
                "fit '{}' already exists",
                fit.name()
            )));
        }
        self.fits.push(fit);
        Ok(())
    }
    /// Removes a fit.
    ///
    /// # Errors
    ///
    /// This function will return an error if no fit with the given name exists.
    pub fn remove_fit(&mut self, name: &str) -> BeamResult<Fit> {
        let index = self
            .fits
            .iter()
            .position(|f| f.name() == name)
            .ok_or_else(|| BeamError::Bench(format!("no fit named '{name}'")))?;
        Ok(self.fits.remove(index))
    }
    /// Renames a fit.
    ///
    /// # Errors
    ///
    /// This function will return an error if no fit named `old` exists or a fit named `new` already exists.
    pub fn rename_fit(&mut self, old: &str, new: &str) -> BeamResult<()> {
        if old == new {
            return self
                .fit(old)
                .map(|_| ())
                .ok_or_else(|| BeamError::Bench(format!("no fit named '{old}'")));
        }
        if self.fit(new).is_some() {
            return Err(BeamError::Bench(format!("fit '{new}' already exists")));
        }
        let fit = self
            .fit_mut(old)
            .ok_or_else(|| BeamError::Bench(format!("no fit named '{old}'")))?;
        fit.set_name(new);
        Ok(())
    }
    /// Summary of the bench content, one element per line.
    #[must_use]
    pub fn summary(&self) -> String {
        self.elements()
            .map(|e| {
                format!(
                    "{:>12} {:<16} {}",
                    crate::utils::unit_format::format_length(e.position()),
                    e.kind().element().node_type(),
                    e.name()
                )
            })
            .join("\n")
    }
}
/// Distance (in meters) by which neighbouring elements may overlap due to rounding.
const SPAN_TOLERANCE: f64 = 1e-12;

/// Extension of an element on the optical axis.
struct Span<'a> {
    name: &'a str,
    start: Length,
    end: Length,
}
impl<'a> Span<'a> {
    fn of(element: &'a OpticalElement) -> Self {
        Self {
            name: element.name(),
            start: element.position(),
            end: element.end_position(),
        }
    }
    /// Thin elements may share a position. A thin element at the entrance of a thick one would be sorted behind it.
    fn overlaps(&self, other: &Span<'_>) -> bool {
        let tolerance = meter!(SPAN_TOLERANCE);
        let thick = self.end - self.start > tolerance || other.end - other.start > tolerance;
        let same_start = (self.start - other.start).abs() <= tolerance;
        (self.start < other.end - tolerance && other.start < self.end - tolerance)
            || (same_start && thick)
    }
}
fn check_spans(spans: &[Span<'_>]) -> BeamResult<()> {
    for (a, b) in spans.iter().tuple_combinations() {
        if a.overlaps(b) {
            return Err(BeamError::Bench(format!(
                "element '{}' overlaps with element '{}'",
                a.name, b.name
            )));
        }
    }
    Ok(())
}
fn check_wavelength(wavelength: Length) -> BeamResult<()> {
    if !wavelength.is_finite() || wavelength.value <= 0.0 {
        return Err(BeamError::ElementConfiguration(
            "wavelength must be > 0.0 and finite".into(),
        ));
    }
    Ok(())
}
