use crate::models::SideChannels;

use super::Bounds;

/// Extend bounds outward into the surrounding silences
///
/// The start moves back into the last silence that begins at or before it,
/// keeping `lead_in` seconds of quiet before speech resumes. The end moves
/// forward into the first silence that ends at or after it, keeping `tail`
/// seconds after speech stops. Bounds only ever move outward.
pub fn snap_to_silence(sides: &SideChannels, bounds: Bounds, lead_in: f64, tail: f64) -> Option<Bounds> {
    if sides.silences.is_empty() {
        return None;
    }

    let start = sides
        .silence_before(bounds.start)
        .map(|s| bounds.start.min(s.start.max(s.end - lead_in)))
        .unwrap_or(bounds.start);

    let end = sides
        .silence_after(bounds.end)
        .map(|s| bounds.end.max(s.end.min(s.start + tail)))
        .unwrap_or(bounds.end);

    let snapped = Bounds::new(start, end);
    (snapped != bounds).then_some(snapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Interval;

    fn sides() -> SideChannels {
        SideChannels::new(
            vec![
                Interval::new(0.0, 2.0),
                Interval::new(10.0, 10.2),
                Interval::new(20.0, 22.0),
            ],
            vec![],
            vec![],
        )
    }

    #[test]
    fn test_pads_into_surrounding_silence() {
        let snapped = snap_to_silence(&sides(), Bounds::new(3.0, 18.0), 0.25, 0.45).unwrap();
        assert!((snapped.start - 1.75).abs() < 1e-9);
        assert!((snapped.end - 20.45).abs() < 1e-9);
    }

    #[test]
    fn test_short_silence_caps_padding() {
        // Silence [10.0, 10.2] is shorter than the lead-in
        let snapped = snap_to_silence(&sides(), Bounds::new(12.0, 15.0), 0.25, 0.45).unwrap();
        assert!((snapped.start - 10.0).abs() < 1e-9);
        assert!((snapped.end - 20.45).abs() < 1e-9);
    }

    #[test]
    fn test_never_moves_inward() {
        let snapped = snap_to_silence(&sides(), Bounds::new(0.5, 21.9), 0.25, 0.45);
        // Start is inside the first silence, end inside the last: both already outward
        assert_eq!(snapped, None);
    }

    #[test]
    fn test_no_silences_no_change() {
        assert_eq!(
            snap_to_silence(&SideChannels::default(), Bounds::new(1.0, 2.0), 0.25, 0.45),
            None
        );
    }
}
