use crate::models::SideChannels;

use super::Bounds;

/// Clamp bounds to the first and last word overlapping them
pub fn snap_to_words(sides: &SideChannels, bounds: Bounds) -> Option<Bounds> {
    let mut overlapping = sides.words_overlapping(bounds.start, bounds.end);
    let first = overlapping.next()?;
    let last = overlapping.last().unwrap_or(first);

    let snapped = Bounds::new(first.start, last.end);
    (snapped != bounds).then_some(snapped)
}
