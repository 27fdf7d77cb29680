// SPDX-License-Identifier: GPL-3.0-only

//! Spatial arrangement of outputs in layout coordinates.

use indexmap::IndexMap;

use super::OutputId;
use crate::utils::geometry::Rect;

/// One output's place in the layout: position plus effective resolution.
#[derive(Debug, Clone, Copy)]
pub struct LayoutEntry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl LayoutEntry {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Default)]
pub struct OutputLayout {
    entries: IndexMap<OutputId, LayoutEntry>,
}

impl OutputLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, output: OutputId, entry: LayoutEntry) {
        self.entries.insert(output, entry);
    }

    pub fn remove(&mut self, output: OutputId) {
        self.entries.shift_remove(&output);
    }

    pub fn move_output(&mut self, output: OutputId, x: i32, y: i32) {
        if let Some(entry) = self.entries.get_mut(&output) {
            entry.x = x;
            entry.y = y;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, output: OutputId) -> Option<&LayoutEntry> {
        self.entries.get(&output)
    }

    pub fn get_box(&self, output: OutputId) -> Option<Rect> {
        self.entries.get(&output).map(|e| e.rect())
    }

    /// Whether `rect` overlaps the given output, or any output when `output`
    /// is `None`.
    pub fn intersects(&self, output: Option<OutputId>, rect: &Rect) -> bool {
        match output {
            Some(id) => self
                .entries
                .get(&id)
                .is_some_and(|e| e.rect().intersects(rect)),
            None => self.entries.values().any(|e| e.rect().intersects(rect)),
        }
    }

    /// First output containing the point, edges included.
    pub fn output_at(&self, x: f64, y: f64) -> Option<OutputId> {
        self.entries
            .iter()
            .find(|(_, e)| e.rect().contains_point(x, y))
            .map(|(id, _)| *id)
    }

    /// Clamp a point onto the given output, or onto the nearest point of any
    /// output when `output` is `None`. Falls back to the input point on an
    /// empty layout.
    pub fn closest_point(&self, output: Option<OutputId>, x: f64, y: f64) -> (f64, f64) {
        let candidates: Vec<Rect> = match output {
            Some(id) => self.entries.get(&id).map(|e| e.rect()).into_iter().collect(),
            None => self.entries.values().map(|e| e.rect()).collect(),
        };
        let mut best = (x, y);
        let mut best_distance = f64::MAX;
        for rect in candidates {
            let (px, py) = rect.closest_point(x, y);
            let distance = (px - x).powi(2) + (py - y).powi(2);
            if distance < best_distance {
                best_distance = distance;
                best = (px, py);
            }
        }
        best
    }

    /// Bounding box of every output.
    pub fn extents(&self) -> Option<Rect> {
        let mut entries = self.entries.values();
        let first = entries.next()?.rect();
        Some(entries.fold(first, |acc, e| acc.union(&e.rect())))
    }

    /// The output nearest the center of the layout extents.
    pub fn center_output(&self) -> Option<OutputId> {
        let (cx, cy) = self.extents()?.center();
        let (px, py) = self.closest_point(None, cx, cy);
        self.output_at(px, py)
    }

    pub fn effective_resolution(&self, output: OutputId) -> Option<(i32, i32)> {
        self.entries.get(&output).map(|e| (e.width, e.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(entries: &[(u32, i32, i32, i32, i32)]) -> OutputLayout {
        let mut layout = OutputLayout::new();
        for &(id, x, y, width, height) in entries {
            layout.add(
                OutputId(id),
                LayoutEntry {
                    x,
                    y,
                    width,
                    height,
                },
            );
        }
        layout
    }

    #[test]
    fn output_at_picks_containing_output() {
        let layout = layout(&[(1, 0, 0, 800, 600), (2, 800, 0, 800, 600)]);
        assert_eq!(layout.output_at(100.0, 100.0), Some(OutputId(1)));
        assert_eq!(layout.output_at(900.0, 100.0), Some(OutputId(2)));
        assert_eq!(layout.output_at(100.0, 700.0), None);
    }

    #[test]
    fn intersects_any_matches_either_output() {
        let layout = layout(&[(1, 0, 0, 800, 600), (2, 800, 0, 800, 600)]);
        let between = Rect::new(700, 100, 200, 200);
        assert!(layout.intersects(None, &between));
        assert!(layout.intersects(Some(OutputId(1)), &between));
        assert!(layout.intersects(Some(OutputId(2)), &between));
        assert!(!layout.intersects(Some(OutputId(2)), &Rect::new(0, 0, 100, 100)));
    }

    #[test]
    fn closest_point_clamps_into_layout() {
        let layout = layout(&[(1, 0, 0, 800, 600)]);
        assert_eq!(layout.closest_point(None, 900.0, -50.0), (800.0, 0.0));
        assert_eq!(layout.closest_point(None, 100.0, 100.0), (100.0, 100.0));
    }

    #[test]
    fn center_output_of_single_output_layout() {
        let layout = layout(&[(1, 0, 0, 1024, 768)]);
        assert_eq!(layout.center_output(), Some(OutputId(1)));
    }

    #[test]
    fn center_output_prefers_output_under_extent_center() {
        // center of extents (0,0,1600,600) is (800, 300), on output 2's edge
        let layout = layout(&[(1, 0, 0, 800, 600), (2, 800, 0, 800, 600)]);
        assert!(layout.center_output().is_some());
    }
}
