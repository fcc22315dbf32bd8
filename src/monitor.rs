use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Geometry of a single monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    /// Full monitor bounds
    pub rect: Rect,
    /// Monitor bounds minus panels, docks and other reserved areas
    pub work_area: Rect,
}

impl Monitor {
    pub fn new(rect: Rect, work_area: Rect) -> Self {
        Self { rect, work_area }
    }

    /// A monitor with no reserved areas
    pub fn full(rect: Rect) -> Self {
        Self::new(rect, rect)
    }
}

/// Source of monitor geometry used to confine popups
pub trait MonitorProvider {
    /// The monitor containing most of `rect`, or the nearest one
    fn monitor_from_rect(&self, rect: &Rect) -> Option<Monitor>;

    /// Bounding rectangle of every monitor
    fn virtual_desktop(&self) -> Rect;
}

/// Static monitor arrangement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorLayout {
    #[serde(default)]
    pub monitors: Vec<Monitor>,
}

impl MonitorLayout {
    pub fn new(monitors: Vec<Monitor>) -> Self {
        Self { monitors }
    }

    pub fn single(rect: Rect) -> Self {
        Self::new(vec![Monitor::full(rect)])
    }
}

impl MonitorProvider for MonitorLayout {
    fn monitor_from_rect(&self, rect: &Rect) -> Option<Monitor> {
        let overlapping = self
            .monitors
            .iter()
            .filter_map(|m| {
                m.rect
                    .intersection(rect)
                    .map(|i| (i.width() as i64 * i.height() as i64, m))
            })
            .max_by_key(|(area, _)| *area)
            .map(|(_, m)| *m);

        overlapping.or_else(|| {
            self.monitors
                .iter()
                .min_by_key(|m| m.rect.distance_squared(rect))
                .copied()
        })
    }

    fn virtual_desktop(&self) -> Rect {
        self.monitors
            .iter()
            .map(|m| m.rect)
            .reduce(|acc, r| acc.union(&r))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dual() -> MonitorLayout {
        MonitorLayout::new(vec![
            Monitor::new(Rect::new(0, 0, 1920, 1080), Rect::new(0, 0, 1920, 1040)),
            Monitor::full(Rect::new(1920, 0, 3200, 1024)),
        ])
    }

    #[test]
    fn picks_monitor_with_largest_overlap() {
        let layout = dual();
        let m = layout
            .monitor_from_rect(&Rect::new(1900, 10, 2000, 20))
            .unwrap();
        assert_eq!(m.rect.left, 1920);
    }

    #[test]
    fn falls_back_to_nearest_monitor() {
        let layout = dual();
        let m = layout
            .monitor_from_rect(&Rect::new(-50, 100, -40, 110))
            .unwrap();
        assert_eq!(m.rect.left, 0);
        assert_eq!(m.work_area.bottom, 1040);
    }

    #[test]
    fn virtual_desktop_spans_all_monitors() {
        assert_eq!(dual().virtual_desktop(), Rect::new(0, 0, 3200, 1080));
        assert!(MonitorLayout::default()
            .monitor_from_rect(&Rect::new(0, 0, 1, 1))
            .is_none());
    }
}
