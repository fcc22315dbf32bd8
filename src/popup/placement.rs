use crate::config::PopupSettings;
use crate::error::PopupError;
use crate::geometry::Rect;
use crate::monitor::MonitorProvider;

/// Where a popup lands on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    /// Direction the popup ended up growing in
    pub expand_left: bool,
}

/// Rectangle a popup anchored at `anchor` must stay inside
pub fn confinement<M: MonitorProvider + ?Sized>(
    settings: &PopupSettings,
    anchor: &Rect,
    monitors: &M,
) -> Result<Rect, PopupError> {
    if settings.confine_to_work_area || settings.confine_to_monitor {
        let monitor = monitors
            .monitor_from_rect(anchor)
            .ok_or(PopupError::NoMonitor(*anchor))?;
        return Ok(if settings.confine_to_work_area {
            monitor.work_area
        } else {
            monitor.rect
        });
    }

    let desktop = monitors.virtual_desktop();
    if desktop.is_empty() {
        return Err(PopupError::NoMonitor(*anchor));
    }
    Ok(desktop)
}

/// Position a `size` popup next to `anchor` inside `limits`
///
/// The popup grows in its preferred direction and flips when that side has
/// no room. When neither side has room, a nested popup keeps the flipped
/// position next to its owner while a root popup is pushed against the
/// confinement edge.
pub fn place(
    anchor: &Rect,
    size: (i32, i32),
    limits: &Rect,
    expand_left: bool,
    nested: bool,
) -> Placement {
    let (width, height) = size;
    let right_x = anchor.right;
    let left_x = anchor.left - width;
    let fits_right = right_x + width <= limits.right;
    let fits_left = left_x >= limits.left;

    let (x, expand_left) = match (expand_left, fits_left, fits_right) {
        (true, true, _) => (left_x, true),
        (true, false, true) => (right_x, false),
        (false, _, true) => (right_x, false),
        (false, true, false) => (left_x, true),
        (true, false, false) if nested => (right_x, false),
        (false, false, false) if nested => (left_x, true),
        (true, false, false) => (limits.left, false),
        (false, false, false) => (limits.right - width, true),
    };

    let y = anchor.top.min(limits.bottom - height).max(limits.top);

    Placement { x, y, expand_left }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::monitor::{Monitor, MonitorLayout};

    fn screen() -> Rect {
        Rect::new(0, 0, 1920, 1080)
    }

    #[test]
    fn expands_right_by_default() {
        let anchor = Rect::around(Point::new(100, 100));
        let p = place(&anchor, (200, 74), &screen(), false, false);
        assert_eq!(p, Placement { x: 101, y: 99, expand_left: false });
    }

    #[test]
    fn flips_left_near_right_edge() {
        let anchor = Rect::new(1800, 300, 1850, 320);
        let p = place(&anchor, (200, 74), &screen(), false, false);
        assert!(p.expand_left);
        assert_eq!(p.x, anchor.left - 200);
    }

    #[test]
    fn flips_right_near_left_edge() {
        let anchor = Rect::new(50, 300, 150, 320);
        let p = place(&anchor, (200, 74), &screen(), true, true);
        assert!(!p.expand_left);
        assert_eq!(p.x, 150);
    }

    #[test]
    fn no_room_either_side() {
        let limits = Rect::new(0, 0, 500, 500);
        let anchor = Rect::new(100, 10, 400, 30);

        let root = place(&anchor, (300, 50), &limits, false, false);
        assert_eq!(root.x, 200);
        assert!(root.expand_left);

        let nested = place(&anchor, (300, 50), &limits, false, true);
        assert_eq!(nested.x, 100 - 300);
        assert!(nested.expand_left);

        let root_left = place(&anchor, (300, 50), &limits, true, false);
        assert_eq!(root_left.x, 0);
        assert!(!root_left.expand_left);
    }

    #[test]
    fn clamps_vertically() {
        let near_bottom = Rect::new(10, 1050, 12, 1052);
        assert_eq!(place(&near_bottom, (200, 100), &screen(), false, false).y, 980);

        let above = Rect::new(10, -40, 12, -38);
        assert_eq!(place(&above, (200, 100), &screen(), false, false).y, 0);
    }

    #[test]
    fn confinement_prefers_work_area() {
        let monitors = MonitorLayout::new(vec![
            Monitor::new(Rect::new(0, 0, 1920, 1080), Rect::new(0, 32, 1920, 1080)),
            Monitor::full(Rect::new(1920, 0, 3840, 1080)),
        ]);
        let anchor = Rect::around(Point::new(500, 500));

        let mut settings = PopupSettings::default();
        assert_eq!(
            confinement(&settings, &anchor, &monitors),
            Ok(Rect::new(0, 0, 3840, 1080))
        );

        settings.confine_to_monitor = true;
        assert_eq!(
            confinement(&settings, &anchor, &monitors),
            Ok(Rect::new(0, 0, 1920, 1080))
        );

        settings.confine_to_work_area = true;
        assert_eq!(
            confinement(&settings, &anchor, &monitors),
            Ok(Rect::new(0, 32, 1920, 1080))
        );
    }

    #[test]
    fn confinement_without_monitors_fails() {
        let anchor = Rect::around(Point::new(5, 5));
        assert_eq!(
            confinement(&PopupSettings::default(), &anchor, &MonitorLayout::default()),
            Err(PopupError::NoMonitor(anchor))
        );
    }
}
