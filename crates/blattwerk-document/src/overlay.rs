// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay geometry — the primary content Box and its drag/resize gestures.
//
// Gesture state machine: Idle -> Dragging | Resizing -> Idle. Every pointer
// update is recomputed from the snapshot taken at gesture start, so updates
// may arrive out of order or be skipped without drift.

use blattwerk_core::{FrameBox, MinSize, Point};
use tracing::{debug, trace};

/// What an active pointer gesture does to the Box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Drag,
    Resize,
}

/// An in-progress gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    pub kind: GestureKind,
    pub origin: Point,
    pub snapshot: FrameBox,
}

/// Owns the primary Box for one document.
#[derive(Debug, Clone)]
pub struct OverlayGeometry {
    frame: FrameBox,
    min: MinSize,
    gesture: Option<Gesture>,
    enabled: bool,
}

impl OverlayGeometry {
    pub fn new(initial: FrameBox, min: MinSize) -> Self {
        Self {
            frame: initial.clamped(min),
            min,
            gesture: None,
            enabled: true,
        }
    }

    pub fn frame(&self) -> FrameBox {
        self.frame
    }

    pub fn min_size(&self) -> MinSize {
        self.min
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn active_gesture(&self) -> Option<&Gesture> {
        self.gesture.as_ref()
    }

    /// Replace the Box outright (explicit geometry override), clamped to the floor.
    ///
    /// Ignored while disabled; the current Box is returned unchanged.
    pub fn set_frame(&mut self, frame: FrameBox) -> FrameBox {
        if self.enabled {
            self.frame = frame.clamped(self.min);
        } else {
            debug!("Frame override refused while geometry is disabled");
        }
        self.frame
    }

    // -- Gestures -------------------------------------------------------------

    /// Capture the start of a gesture. Does not move the Box.
    ///
    /// Returns `false` (and stays idle) while geometry is disabled.
    pub fn begin_gesture(&mut self, kind: GestureKind, origin: Point, snapshot: FrameBox) -> bool {
        if !self.enabled {
            debug!(?kind, "Gesture refused while geometry is disabled");
            return false;
        }
        self.gesture = Some(Gesture {
            kind,
            origin,
            snapshot,
        });
        true
    }

    /// Apply the pointer position relative to the gesture origin.
    ///
    /// Returns the new Box, or `None` when no gesture is active or geometry
    /// is disabled; in both cases the Box is left as it was.
    pub fn update_gesture(&mut self, current: Point) -> Option<FrameBox> {
        if !self.enabled {
            return None;
        }
        let gesture = self.gesture?;
        let dx = current.x - gesture.origin.x;
        let dy = current.y - gesture.origin.y;
        let snap = gesture.snapshot;

        let next = match gesture.kind {
            GestureKind::Drag => FrameBox::new(snap.x + dx, snap.y + dy, snap.width, snap.height),
            GestureKind::Resize => FrameBox::new(
                snap.x,
                snap.y,
                (snap.width + dx).max(self.min.width),
                (snap.height + dy).max(self.min.height),
            ),
        };

        trace!(dx, dy, ?next, "Gesture update");
        self.frame = next;
        Some(next)
    }

    /// Finish the gesture; the last computed Box stays.
    pub fn end_gesture(&mut self) {
        self.gesture = None;
    }

    // -- Commands -------------------------------------------------------------

    /// Centre the Box in a `frame_width` x `frame_height` area, keeping its size.
    ///
    /// Ignored while disabled; the current Box is returned unchanged.
    pub fn center(&mut self, frame_width: f32, frame_height: f32) -> FrameBox {
        if self.enabled {
            self.frame.x = (frame_width - self.frame.width) / 2.0;
            self.frame.y = (frame_height - self.frame.height) / 2.0;
            debug!(x = self.frame.x, y = self.frame.y, "Box centred");
        }
        self.frame
    }

    /// Gate geometry mutation. Never touches the stored coordinates.
    ///
    /// Disabling also drops any active gesture so a later update cannot land
    /// after the gate reopens.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.gesture = None;
        }
    }
}

impl Default for OverlayGeometry {
    fn default() -> Self {
        Self::new(FrameBox::default(), MinSize::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> OverlayGeometry {
        OverlayGeometry::default()
    }

    #[test]
    fn drag_moves_without_resizing() {
        let mut geo = geometry();
        let start = geo.frame();
        geo.begin_gesture(GestureKind::Drag, Point::new(100.0, 100.0), start);
        let moved = geo.update_gesture(Point::new(130.0, 80.0)).expect("active");

        assert_eq!(moved, FrameBox::new(90.0, 40.0, 670.0, 1000.0));
        assert!(moved.same_size(&start));
    }

    #[test]
    fn updates_replay_from_snapshot_without_drift() {
        let mut geo = geometry();
        let start = geo.frame();
        geo.begin_gesture(GestureKind::Drag, Point::new(0.0, 0.0), start);
        for p in [(5.0, 5.0), (50.0, -20.0), (3.0, 2.0), (10.0, 10.0)] {
            geo.update_gesture(Point::new(p.0, p.1));
        }
        geo.end_gesture();

        assert_eq!(geo.frame(), FrameBox::new(70.0, 70.0, 670.0, 1000.0));
    }

    #[test]
    fn resize_is_anchored_and_floored() {
        let mut geo = geometry();
        let start = geo.frame();
        geo.begin_gesture(GestureKind::Resize, Point::new(0.0, 0.0), start);

        let grown = geo.update_gesture(Point::new(30.0, 40.0)).expect("active");
        assert_eq!(grown, FrameBox::new(60.0, 60.0, 700.0, 1040.0));

        let crushed = geo
            .update_gesture(Point::new(-10_000.0, -10_000.0))
            .expect("active");
        assert_eq!((crushed.x, crushed.y), (60.0, 60.0));
        assert_eq!((crushed.width, crushed.height), (100.0, 100.0));
    }

    #[test]
    fn floor_holds_across_any_resize_sequence() {
        let mut geo = geometry();
        let deltas = [-900.0, 15.0, -3.5, -20_000.0, 640.0, -99.0, 0.0];
        for (i, d) in deltas.iter().enumerate() {
            let snapshot = geo.frame();
            geo.begin_gesture(GestureKind::Resize, Point::new(0.0, 0.0), snapshot);
            geo.update_gesture(Point::new(*d, deltas[deltas.len() - 1 - i]));
            geo.end_gesture();
            assert!(geo.frame().width >= 100.0);
            assert!(geo.frame().height >= 100.0);
        }
    }

    #[test]
    fn updates_outside_a_gesture_are_ignored() {
        let mut geo = geometry();
        let before = geo.frame();
        assert!(geo.update_gesture(Point::new(500.0, 500.0)).is_none());

        geo.begin_gesture(GestureKind::Drag, Point::new(0.0, 0.0), before);
        geo.update_gesture(Point::new(10.0, 0.0));
        geo.end_gesture();
        let after_end = geo.frame();
        assert!(geo.update_gesture(Point::new(999.0, 999.0)).is_none());
        assert_eq!(geo.frame(), after_end);
    }

    #[test]
    fn centering_matches_reference_values() {
        let mut geo = geometry();
        let centred = geo.center(794.0, 1123.0);
        assert_eq!(centred.x, 62.0);
        assert_eq!(centred.y, 61.5);
        assert_eq!((centred.width, centred.height), (670.0, 1000.0));
    }

    #[test]
    fn disabling_preserves_coordinates_and_blocks_mutation() {
        let mut geo = geometry();
        let start = geo.frame();
        geo.begin_gesture(GestureKind::Drag, Point::new(0.0, 0.0), start);
        geo.set_enabled(false);

        assert_eq!(geo.frame(), start);
        assert!(geo.update_gesture(Point::new(40.0, 40.0)).is_none());
        assert_eq!(geo.center(794.0, 1123.0), start);
        assert!(!geo.begin_gesture(GestureKind::Resize, Point::new(0.0, 0.0), start));

        geo.set_enabled(true);
        assert_eq!(geo.frame(), start);
        assert!(geo.active_gesture().is_none());
    }

    #[test]
    fn explicit_frames_are_clamped() {
        let mut geo = geometry();
        let set = geo.set_frame(FrameBox::new(5.0, 6.0, 20.0, 500.0));
        assert_eq!(set, FrameBox::new(5.0, 6.0, 100.0, 500.0));
    }

    #[test]
    fn explicit_frames_are_refused_while_disabled() {
        let mut geo = geometry();
        let before = geo.frame();
        geo.set_enabled(false);

        let after = geo.set_frame(FrameBox::new(0.0, 0.0, 300.0, 300.0));
        assert_eq!(after, before);
        assert_eq!(geo.frame(), before);

        geo.set_enabled(true);
        assert_eq!(
            geo.set_frame(FrameBox::new(0.0, 0.0, 300.0, 300.0)),
            FrameBox::new(0.0, 0.0, 300.0, 300.0)
        );
    }
}
