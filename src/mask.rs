//! Boolean pixel masks and binary morphology.
//!
//! A [`Mask`] marks membership of each pixel in a set (background candidates,
//! dark outlines, content edges, flood-filled regions). All morphology uses
//! the plus-shaped 4-neighbourhood structuring element, and pixels outside
//! the image are treated as unset.

use std::ops::{BitAnd, BitOr, Not};

/// Offsets of the 4-connected neighbourhood.
const NEIGHBORS_4: [(i64, i64); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// A width×height grid of booleans stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    /// Create an empty (all unset) mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, bits: vec![false; width as usize * height as usize] }
    }

    /// Create a mask by evaluating a predicate at every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                bits.push(f(x, y));
            }
        }
        Self { width, height, bits }
    }

    /// Mask width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Whether the pixel at (x, y) is set. Out-of-bounds pixels are unset.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[self.index(x, y)]
    }

    #[inline]
    fn get_signed(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && self.get(x as u32, y as u32)
    }

    /// Set or clear the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        let idx = self.index(x, y);
        self.bits[idx] = value;
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Whether no pixel is set.
    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }

    /// Iterate over the coordinates of set pixels in row-major order.
    pub fn iter_set(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width.max(1);
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(move |(i, _)| ((i as u32) % width, (i as u32) / width))
    }

    /// Pixels of `self` that are not set in `other`.
    pub fn difference(&self, other: &Mask) -> Mask {
        self.zip_with(other, |a, b| a && !b)
    }

    fn zip_with(&self, other: &Mask, f: impl Fn(bool, bool) -> bool) -> Mask {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        Mask {
            width: self.width,
            height: self.height,
            bits: self.bits.iter().zip(other.bits.iter()).map(|(&a, &b)| f(a, b)).collect(),
        }
    }

    /// One erosion pass with the plus-shaped structuring element.
    ///
    /// A pixel survives only if it and all four neighbours are set.
    pub fn erode(&self) -> Mask {
        Mask::from_fn(self.width, self.height, |x, y| {
            self.get(x, y)
                && NEIGHBORS_4
                    .iter()
                    .all(|&(dx, dy)| self.get_signed(x as i64 + dx, y as i64 + dy))
        })
    }

    /// Dilate `iterations` times with the plus-shaped structuring element.
    pub fn dilate(&self, iterations: u32) -> Mask {
        let mut current = self.clone();
        for _ in 0..iterations {
            let prev = current;
            current = Mask::from_fn(prev.width, prev.height, |x, y| {
                prev.get(x, y)
                    || NEIGHBORS_4
                        .iter()
                        .any(|&(dx, dy)| prev.get_signed(x as i64 + dx, y as i64 + dy))
            });
        }
        current
    }

    /// Morphological opening: one erosion followed by one dilation.
    ///
    /// Removes isolated specks and one-pixel spurs while keeping thicker
    /// connected structures.
    pub fn open(&self) -> Mask {
        self.erode().dilate(1)
    }

    /// Copy only the outermost ring (first/last row and column) of this mask.
    pub fn border_ring(&self) -> Mask {
        let (w, h) = (self.width, self.height);
        Mask::from_fn(w, h, |x, y| {
            let on_ring = x == 0 || y == 0 || x + 1 == w || y + 1 == h;
            on_ring && self.get(x, y)
        })
    }

    /// Grow `seed` through 4-connected pixels of `allowed`, never entering `barrier`.
    ///
    /// This is the fixed point of `next = dilate(current) & allowed & !barrier`.
    /// Each iteration only expands the pixels added by the previous one, and
    /// the loop ends when an iteration adds nothing (the mask is unchanged) or
    /// after `max_iterations` iterations. Seed pixels outside `allowed` or
    /// inside `barrier` are dropped.
    pub fn propagate(
        seed: &Mask,
        allowed: &Mask,
        barrier: Option<&Mask>,
        max_iterations: u32,
    ) -> Mask {
        let (w, h) = (allowed.width, allowed.height);
        let passable = |m: &Mask, x: u32, y: u32| {
            allowed.get(x, y) && !barrier.is_some_and(|b| b.get(x, y)) && !m.get(x, y)
        };

        let mut filled = Mask::new(w, h);
        let mut frontier: Vec<(u32, u32)> = Vec::new();
        for (x, y) in seed.iter_set() {
            if passable(&filled, x, y) {
                filled.set(x, y, true);
                frontier.push((x, y));
            }
        }

        let mut iterations = 0;
        while !frontier.is_empty() && iterations < max_iterations {
            let mut next = Vec::new();
            for &(x, y) in &frontier {
                for &(dx, dy) in &NEIGHBORS_4 {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                        continue;
                    }
                    let (nx, ny) = (nx as u32, ny as u32);
                    if passable(&filled, nx, ny) {
                        filled.set(nx, ny, true);
                        next.push((nx, ny));
                    }
                }
            }
            frontier = next;
            iterations += 1;
        }

        filled
    }

    /// Keep only the 4-connected components for which `keep` returns true.
    ///
    /// `keep` receives the pixel coordinates of one component at a time.
    pub fn filter_components(&self, mut keep: impl FnMut(&[(u32, u32)]) -> bool) -> Mask {
        let (w, h) = (self.width, self.height);
        let mut visited = Mask::new(w, h);
        let mut result = Mask::new(w, h);
        let mut stack = Vec::new();

        for (sx, sy) in self.iter_set() {
            if visited.get(sx, sy) {
                continue;
            }
            visited.set(sx, sy, true);
            stack.push((sx, sy));
            let mut component = Vec::new();

            while let Some((x, y)) = stack.pop() {
                component.push((x, y));
                for &(dx, dy) in &NEIGHBORS_4 {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if self.get_signed(nx, ny) && !visited.get(nx as u32, ny as u32) {
                        visited.set(nx as u32, ny as u32, true);
                        stack.push((nx as u32, ny as u32));
                    }
                }
            }

            if keep(&component) {
                for &(x, y) in &component {
                    result.set(x, y, true);
                }
            }
        }

        result
    }
}

impl BitOr for &Mask {
    type Output = Mask;

    fn bitor(self, rhs: &Mask) -> Mask {
        self.zip_with(rhs, |a, b| a || b)
    }
}

impl BitAnd for &Mask {
    type Output = Mask;

    fn bitand(self, rhs: &Mask) -> Mask {
        self.zip_with(rhs, |a, b| a && b)
    }
}

impl Not for &Mask {
    type Output = Mask;

    fn not(self) -> Mask {
        Mask {
            width: self.width,
            height: self.height,
            bits: self.bits.iter().map(|&b| !b).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> Mask {
        Mask::from_fn(w, h, |x, y| x >= x0 && x <= x1 && y >= y0 && y <= y1)
    }

    #[test]
    fn test_erode_removes_isolated_pixel() {
        let mut m = Mask::new(5, 5);
        m.set(2, 2, true);
        assert!(m.erode().is_empty());
    }

    #[test]
    fn test_erode_keeps_center_of_plus() {
        let m = Mask::from_fn(5, 5, |x, y| (x == 2 && y >= 1 && y <= 3) || (y == 2 && x >= 1 && x <= 3));
        let eroded = m.erode();
        assert_eq!(eroded.count(), 1);
        assert!(eroded.get(2, 2));
    }

    #[test]
    fn test_erode_treats_outside_as_unset() {
        let full = Mask::from_fn(4, 4, |_, _| true);
        let eroded = full.erode();
        // Only the 2x2 interior survives
        assert_eq!(eroded.count(), 4);
        assert!(!eroded.get(0, 0));
        assert!(eroded.get(1, 1));
    }

    #[test]
    fn test_dilate_grows_plus_shape() {
        let mut m = Mask::new(5, 5);
        m.set(2, 2, true);
        let d = m.dilate(1);
        assert_eq!(d.count(), 5);
        assert!(d.get(2, 1) && d.get(1, 2) && d.get(3, 2) && d.get(2, 3));
        assert!(!d.get(1, 1));

        let d2 = m.dilate(2);
        assert_eq!(d2.count(), 13);
    }

    #[test]
    fn test_open_keeps_thick_line_drops_speck() {
        let mut m = rect(12, 12, 2, 2, 9, 4);
        m.set(11, 11, true);
        let opened = m.open();
        assert!(!opened.get(11, 11));
        assert!(opened.get(5, 3));
        assert!(opened.get(2, 3));
    }

    #[test]
    fn test_border_ring() {
        let full = Mask::from_fn(4, 3, |_, _| true);
        let ring = full.border_ring();
        assert_eq!(ring.count(), 10);
        assert!(!ring.get(1, 1));
    }

    #[test]
    fn test_set_algebra() {
        let a = rect(4, 4, 0, 0, 1, 3);
        let b = rect(4, 4, 1, 0, 2, 3);
        assert_eq!((&a | &b).count(), 12);
        assert_eq!((&a & &b).count(), 4);
        assert_eq!(a.difference(&b).count(), 4);
        assert_eq!((!&a).count(), 8);
    }

    #[test]
    fn test_propagate_fills_connected_region() {
        // Two rooms separated by a wall at x == 3
        let allowed = Mask::from_fn(7, 3, |x, _| x != 3);
        let mut seed = Mask::new(7, 3);
        seed.set(0, 0, true);

        let filled = Mask::propagate(&seed, &allowed, None, 100);
        assert_eq!(filled.count(), 9);
        assert!(filled.get(2, 2));
        assert!(!filled.get(4, 0));
    }

    #[test]
    fn test_propagate_respects_barrier() {
        let allowed = Mask::from_fn(5, 1, |_, _| true);
        let barrier = Mask::from_fn(5, 1, |x, _| x == 2);
        let mut seed = Mask::new(5, 1);
        seed.set(0, 0, true);

        let filled = Mask::propagate(&seed, &allowed, Some(&barrier), 100);
        assert_eq!(filled.count(), 2);
    }

    #[test]
    fn test_propagate_iteration_cap() {
        let allowed = Mask::from_fn(10, 1, |_, _| true);
        let mut seed = Mask::new(10, 1);
        seed.set(0, 0, true);

        let filled = Mask::propagate(&seed, &allowed, None, 3);
        // Seed plus three dilation steps
        assert_eq!(filled.count(), 4);
    }

    #[test]
    fn test_propagate_matches_iterated_dilation() {
        let allowed = Mask::from_fn(9, 9, |x, y| (x + y) % 4 != 3 || x == 0);
        let mut seed = Mask::new(9, 9);
        seed.set(0, 0, true);

        let mut reference = seed.clone();
        loop {
            let next = &reference.dilate(1) & &allowed;
            if next == reference {
                break;
            }
            reference = next;
        }

        assert_eq!(Mask::propagate(&seed, &allowed, None, 1000), reference);
    }

    #[test]
    fn test_filter_components_by_size() {
        // A 6-pixel line and a 2-pixel speck
        let m = Mask::from_fn(10, 4, |x, y| (y == 0 && x < 6) || (y == 3 && (x == 8 || x == 9)));
        let kept = m.filter_components(|c| c.len() >= 3);
        assert_eq!(kept.count(), 6);
        assert!(kept.get(5, 0));
        assert!(!kept.get(8, 3));
    }

    #[test]
    fn test_filter_components_diagonal_not_connected() {
        let m = Mask::from_fn(3, 3, |x, y| x == y);
        let mut sizes = Vec::new();
        m.filter_components(|c| {
            sizes.push(c.len());
            true
        });
        assert_eq!(sizes, vec![1, 1, 1]);
    }

    #[test]
    fn test_iter_set_coordinates() {
        let mut m = Mask::new(3, 2);
        m.set(2, 1, true);
        m.set(0, 1, true);
        assert_eq!(m.iter_set().collect::<Vec<_>>(), vec![(0, 1), (2, 1)]);
    }
}
