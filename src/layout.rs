//! Split tree for arranging the panes of one tab, plus the geometry used
//! for rendering areas and directional focus.

use std::collections::HashMap;

use ratatui::layout::Rect;

use crate::pane::PaneId;

/// Split direction for layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Split horizontally (top and bottom).
    Horizontal,
    /// Split vertically (left and right).
    Vertical,
}

/// Direction for moving focus between panes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Layout configuration for panes.
#[derive(Clone, Debug, PartialEq)]
pub enum Layout {
    /// Single pane filling the entire area.
    Single(PaneId),

    /// Split layout with two children.
    Split {
        /// Direction of the split.
        direction: Direction,
        /// Ratio for the first child (0.0 to 1.0).
        ratio: f32,
        /// First child layout.
        first: Box<Layout>,
        /// Second child layout.
        second: Box<Layout>,
    },
}

impl Layout {
    /// Create a single pane layout.
    #[must_use]
    pub fn single(pane_id: PaneId) -> Self {
        Self::Single(pane_id)
    }

    /// Create a split with the given direction and ratio.
    #[must_use]
    pub fn split(direction: Direction, ratio: f32, first: Layout, second: Layout) -> Self {
        Self::Split {
            direction,
            ratio: ratio.clamp(0.1, 0.9),
            first: Box::new(first),
            second: Box::new(second),
        }
    }

    /// Create a horizontal split (top and bottom).
    #[must_use]
    pub fn hsplit(ratio: f32, first: Layout, second: Layout) -> Self {
        Self::split(Direction::Horizontal, ratio, first, second)
    }

    /// Create a vertical split (left and right).
    #[must_use]
    pub fn vsplit(ratio: f32, first: Layout, second: Layout) -> Self {
        Self::split(Direction::Vertical, ratio, first, second)
    }

    /// Get all pane IDs in this layout, first to second.
    #[must_use]
    pub fn pane_ids(&self) -> Vec<PaneId> {
        let mut ids = Vec::new();
        self.collect_pane_ids(&mut ids);
        ids
    }

    fn collect_pane_ids(&self, ids: &mut Vec<PaneId>) {
        match self {
            Self::Single(id) => ids.push(*id),
            Self::Split { first, second, .. } => {
                first.collect_pane_ids(ids);
                second.collect_pane_ids(ids);
            }
        }
    }

    /// Check if a pane ID is in this layout.
    #[must_use]
    pub fn contains(&self, pane_id: PaneId) -> bool {
        match self {
            Self::Single(id) => *id == pane_id,
            Self::Split { first, second, .. } => {
                first.contains(pane_id) || second.contains(pane_id)
            }
        }
    }

    fn is_leaf(&self, pane_id: PaneId) -> bool {
        matches!(self, Self::Single(id) if *id == pane_id)
    }

    /// Replace the leaf `target` with an even split of `target` and `new_pane`.
    ///
    /// Returns false if `target` is not in this layout.
    pub fn split_pane(&mut self, target: PaneId, direction: Direction, new_pane: PaneId) -> bool {
        match self {
            Self::Single(id) if *id == target => {
                *self = Self::split(
                    direction,
                    0.5,
                    Self::Single(target),
                    Self::Single(new_pane),
                );
                true
            }
            Self::Single(_) => false,
            Self::Split { first, second, .. } => {
                first.split_pane(target, direction, new_pane)
                    || second.split_pane(target, direction, new_pane)
            }
        }
    }

    /// Remove a leaf, letting its sibling take over the parent split.
    ///
    /// A layout that is only this leaf cannot lose it; returns false then,
    /// and when the pane is not found.
    pub fn remove(&mut self, pane_id: PaneId) -> bool {
        let replacement = match self {
            Self::Single(_) => return false,
            Self::Split { first, second, .. } => {
                if first.is_leaf(pane_id) {
                    std::mem::replace(second.as_mut(), Self::Single(pane_id))
                } else if second.is_leaf(pane_id) {
                    std::mem::replace(first.as_mut(), Self::Single(pane_id))
                } else {
                    return first.remove(pane_id) || second.remove(pane_id);
                }
            }
        };
        *self = replacement;
        true
    }
}

/// Calculates areas for each pane in a layout.
pub struct LayoutCalculator;

impl LayoutCalculator {
    /// Calculate the Rect for each visible pane given the total area.
    #[must_use]
    pub fn calculate_areas(layout: &Layout, area: Rect) -> HashMap<PaneId, Rect> {
        let mut areas = HashMap::new();
        Self::calculate_recursive(layout, area, &mut areas);
        areas
    }

    fn calculate_recursive(layout: &Layout, area: Rect, areas: &mut HashMap<PaneId, Rect>) {
        match layout {
            Layout::Single(id) => {
                areas.insert(*id, area);
            }
            Layout::Split {
                direction,
                ratio,
                first,
                second,
            } => {
                let (first_area, second_area) = Self::split_area(area, *direction, *ratio);
                Self::calculate_recursive(first, first_area, areas);
                Self::calculate_recursive(second, second_area, areas);
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn split_area(area: Rect, direction: Direction, ratio: f32) -> (Rect, Rect) {
        match direction {
            Direction::Horizontal => {
                let first_height = (f32::from(area.height) * ratio).round() as u16;
                let second_height = area.height.saturating_sub(first_height);

                let first_area = Rect {
                    height: first_height,
                    ..area
                };
                let second_area = Rect {
                    y: area.y.saturating_add(first_height),
                    height: second_height,
                    ..area
                };
                (first_area, second_area)
            }
            Direction::Vertical => {
                let first_width = (f32::from(area.width) * ratio).round() as u16;
                let second_width = area.width.saturating_sub(first_width);

                let first_area = Rect {
                    width: first_width,
                    ..area
                };
                let second_area = Rect {
                    x: area.x.saturating_add(first_width),
                    width: second_width,
                    ..area
                };
                (first_area, second_area)
            }
        }
    }

    /// Find the pane to focus when moving from `from` in `direction`.
    ///
    /// Geometry is taken from the split tree itself over the unit square, so
    /// no split depth collapses two panes onto one point. Candidates are
    /// panes whose center lies strictly on the requested side of `from`'s
    /// center. The nearest one wins, with distance across the direction of
    /// travel weighted double; equal distances go to the pane closest in tree
    /// order, then to the lower pane id.
    ///
    /// Panes sharing `from`'s exact center are ordered by the tree: moving
    /// right or down steps to the next one, left or up to the previous one.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn neighbor(layout: &Layout, from: PaneId, direction: FocusDirection) -> Option<PaneId> {
        let centers = Self::centers(layout);
        let from_index = centers.iter().position(|(id, _)| *id == from)?;
        let (sx, sy) = centers[from_index].1;
        let forward = matches!(direction, FocusDirection::Right | FocusDirection::Down);

        centers
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != from_index)
            .filter_map(|(index, (id, (cx, cy)))| {
                let (along, across) = match direction {
                    FocusDirection::Left => (sx - cx, cy - sy),
                    FocusDirection::Right => (cx - sx, cy - sy),
                    FocusDirection::Up => (sy - cy, cx - sx),
                    FocusDirection::Down => (cy - sy, cx - sx),
                };
                let gap = index.abs_diff(from_index);

                if along > 0.0 {
                    Some((along * along + 4.0 * across * across, gap, *id))
                } else if along == 0.0 && across == 0.0 && (index > from_index) == forward {
                    Some((0.0, gap, *id))
                } else {
                    None
                }
            })
            .min_by(|a, b| {
                a.0.total_cmp(&b.0)
                    .then(a.1.cmp(&b.1))
                    .then(a.2.cmp(&b.2))
            })
            .map(|(_, _, id)| id)
    }

    /// Center of every pane on the unit square, in tree order.
    fn centers(layout: &Layout) -> Vec<(PaneId, (f64, f64))> {
        let mut centers = Vec::new();
        Self::collect_centers(layout, (0.0, 0.0, 1.0, 1.0), &mut centers);
        centers
    }

    fn collect_centers(
        layout: &Layout,
        (x, y, width, height): (f64, f64, f64, f64),
        centers: &mut Vec<(PaneId, (f64, f64))>,
    ) {
        match layout {
            Layout::Single(id) => centers.push((*id, (x + width / 2.0, y + height / 2.0))),
            Layout::Split {
                direction,
                ratio,
                first,
                second,
            } => {
                let ratio = f64::from(*ratio);
                match direction {
                    Direction::Horizontal => {
                        let first_height = height * ratio;
                        Self::collect_centers(first, (x, y, width, first_height), centers);
                        Self::collect_centers(
                            second,
                            (x, y + first_height, width, height - first_height),
                            centers,
                        );
                    }
                    Direction::Vertical => {
                        let first_width = width * ratio;
                        Self::collect_centers(first, (x, y, first_width, height), centers);
                        Self::collect_centers(
                            second,
                            (x + first_width, y, width - first_width, height),
                            centers,
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_layout() {
        let pane_id = PaneId(1);
        let layout = Layout::single(pane_id);
        let area = Rect::new(0, 0, 100, 50);

        let areas = LayoutCalculator::calculate_areas(&layout, area);

        assert_eq!(areas.len(), 1);
        assert_eq!(areas.get(&pane_id), Some(&area));
    }

    #[test]
    fn test_hsplit_layout() {
        let pane1 = PaneId(1);
        let pane2 = PaneId(2);
        let layout = Layout::hsplit(0.5, Layout::single(pane1), Layout::single(pane2));
        let area = Rect::new(0, 0, 100, 50);

        let areas = LayoutCalculator::calculate_areas(&layout, area);

        assert_eq!(areas.len(), 2);
        assert_eq!(areas.get(&pane1), Some(&Rect::new(0, 0, 100, 25)));
        assert_eq!(areas.get(&pane2), Some(&Rect::new(0, 25, 100, 25)));
    }

    #[test]
    fn test_vsplit_layout() {
        let pane1 = PaneId(1);
        let pane2 = PaneId(2);
        let layout = Layout::vsplit(0.5, Layout::single(pane1), Layout::single(pane2));
        let area = Rect::new(0, 0, 100, 50);

        let areas = LayoutCalculator::calculate_areas(&layout, area);

        assert_eq!(areas.get(&pane1), Some(&Rect::new(0, 0, 50, 50)));
        assert_eq!(areas.get(&pane2), Some(&Rect::new(50, 0, 50, 50)));
    }

    #[test]
    fn test_split_pane_nests_in_place() {
        let mut layout = Layout::vsplit(0.5, Layout::single(PaneId(1)), Layout::single(PaneId(2)));

        assert!(layout.split_pane(PaneId(2), Direction::Horizontal, PaneId(3)));
        assert!(!layout.split_pane(PaneId(9), Direction::Horizontal, PaneId(4)));

        assert_eq!(layout.pane_ids(), vec![PaneId(1), PaneId(2), PaneId(3)]);
        let expected = Layout::vsplit(
            0.5,
            Layout::single(PaneId(1)),
            Layout::hsplit(0.5, Layout::single(PaneId(2)), Layout::single(PaneId(3))),
        );
        assert_eq!(layout, expected);
    }

    #[test]
    fn test_remove_promotes_sibling() {
        let mut layout = Layout::vsplit(
            0.5,
            Layout::single(PaneId(1)),
            Layout::hsplit(0.5, Layout::single(PaneId(2)), Layout::single(PaneId(3))),
        );

        assert!(layout.remove(PaneId(2)));
        assert_eq!(
            layout,
            Layout::vsplit(0.5, Layout::single(PaneId(1)), Layout::single(PaneId(3)))
        );

        assert!(layout.remove(PaneId(1)));
        assert_eq!(layout, Layout::single(PaneId(3)));

        assert!(!layout.remove(PaneId(3)));
        assert!(!layout.remove(PaneId(7)));
    }

    #[test]
    fn test_contains() {
        let layout = Layout::vsplit(0.5, Layout::single(PaneId(1)), Layout::single(PaneId(2)));

        assert!(layout.contains(PaneId(1)));
        assert!(layout.contains(PaneId(2)));
        assert!(!layout.contains(PaneId(3)));
    }

    /// 1 | 2
    /// --+--
    /// 3 | 4
    fn grid() -> Layout {
        Layout::vsplit(
            0.5,
            Layout::hsplit(0.5, Layout::single(PaneId(1)), Layout::single(PaneId(3))),
            Layout::hsplit(0.5, Layout::single(PaneId(2)), Layout::single(PaneId(4))),
        )
    }

    #[test]
    fn test_neighbor_in_grid() {
        let layout = grid();
        let nav = |from, dir| LayoutCalculator::neighbor(&layout, PaneId(from), dir);

        assert_eq!(nav(1, FocusDirection::Right), Some(PaneId(2)));
        assert_eq!(nav(1, FocusDirection::Down), Some(PaneId(3)));
        assert_eq!(nav(4, FocusDirection::Left), Some(PaneId(3)));
        assert_eq!(nav(4, FocusDirection::Up), Some(PaneId(2)));
        assert_eq!(nav(1, FocusDirection::Left), None);
        assert_eq!(nav(1, FocusDirection::Up), None);
    }

    #[test]
    fn test_neighbor_tie_goes_to_lower_id() {
        // Tall pane 1 on the left, 2 over 3 on the right: both right-hand
        // panes are equally far from 1's center.
        let layout = Layout::vsplit(
            0.5,
            Layout::single(PaneId(1)),
            Layout::hsplit(0.5, Layout::single(PaneId(2)), Layout::single(PaneId(3))),
        );

        assert_eq!(
            LayoutCalculator::neighbor(&layout, PaneId(1), FocusDirection::Right),
            Some(PaneId(2))
        );
        assert_eq!(
            LayoutCalculator::neighbor(&layout, PaneId(3), FocusDirection::Left),
            Some(PaneId(1))
        );
    }

    #[test]
    fn test_neighbor_distinguishes_deeply_nested_panes() {
        // Keep splitting the left-most pane: each new pane is half as wide
        // as the one before it.
        let mut layout = Layout::single(PaneId(1));
        for id in 2..=20 {
            assert!(layout.split_pane(PaneId(1), Direction::Vertical, PaneId(id)));
        }

        // Walking right from the far left visits every pane once.
        let mut visited = vec![PaneId(1)];
        let mut current = PaneId(1);
        while let Some(next) = LayoutCalculator::neighbor(&layout, current, FocusDirection::Right) {
            visited.push(next);
            current = next;
        }

        let mut expected: Vec<PaneId> = (2..=20).rev().map(PaneId).collect();
        expected.insert(0, PaneId(1));
        assert_eq!(visited, expected);
        assert_eq!(
            LayoutCalculator::neighbor(&layout, PaneId(20), FocusDirection::Left),
            Some(PaneId(1))
        );
    }

    #[test]
    fn test_neighbor_unknown_source() {
        assert_eq!(
            LayoutCalculator::neighbor(&grid(), PaneId(9), FocusDirection::Right),
            None
        );
    }
}
