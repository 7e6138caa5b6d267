use crate::models::SideChannels;

use super::Bounds;

/// Snap bounds outward to enclosing dialog spans
///
/// A clip that starts or ends inside a back-and-forth exchange would cut one
/// side of it off, so each boundary that falls inside a dialog interval is
/// moved to that interval's edge.
pub fn snap_to_dialog(sides: &SideChannels, bounds: Bounds) -> Option<Bounds> {
    if sides.dialog.is_empty() {
        return None;
    }

    let end = sides
        .dialog_containing(bounds.end)
        .map(|d| d.end)
        .unwrap_or(bounds.end);
    let start = sides
        .dialog_containing(bounds.start)
        .map(|d| d.start)
        .unwrap_or(bounds.start);

    let snapped = Bounds::new(start, end);
    (snapped != bounds).then_some(snapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Interval;

    #[test]
    fn test_snaps_both_edges() {
        let sides = SideChannels::new(
            vec![],
            vec![Interval::new(0.0, 5.0), Interval::new(10.0, 15.0)],
            vec![],
        );
        assert_eq!(
            snap_to_dialog(&sides, Bounds::new(2.0, 12.0)),
            Some(Bounds::new(0.0, 15.0))
        );
    }

    #[test]
    fn test_outside_dialog_is_unchanged() {
        let sides = SideChannels::new(vec![], vec![Interval::new(0.0, 5.0)], vec![]);
        assert_eq!(snap_to_dialog(&sides, Bounds::new(6.0, 9.0)), None);
    }
}
