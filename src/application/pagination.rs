//! Numbered pagination windows with ellipsis collapsing.

use serde::Serialize;

pub const DEFAULT_END_SIZE: u32 = 2;
pub const DEFAULT_MID_SIZE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageLabel {
    Page { number: u32, is_current: bool },
    Ellipsis,
}

impl PageLabel {
    pub fn number(&self) -> Option<u32> {
        match self {
            PageLabel::Page { number, .. } => Some(*number),
            PageLabel::Ellipsis => None,
        }
    }

    pub fn is_current(&self) -> bool {
        matches!(self, PageLabel::Page { is_current: true, .. })
    }
}

/// Sizes of the fixed edges and of the sliding window around the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub end_size: u32,
    pub mid_size: u32,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            end_size: DEFAULT_END_SIZE,
            mid_size: DEFAULT_MID_SIZE,
        }
    }
}

impl PageWindow {
    pub fn new(end_size: u32, mid_size: u32) -> Self {
        Self { end_size, mid_size }
    }

    pub fn plan(&self, total_pages: u32, current_page: u32) -> Vec<PageLabel> {
        plan(total_pages, current_page, self.end_size, self.mid_size)
    }
}

/// Plan the page labels for a listing.
///
/// Three ordered segments are emitted: the leading `end_size` pages, the
/// pages within `mid_size` of the current page, and the trailing `end_size`
/// pages. Each segment starts after the last page already emitted, so no page
/// appears twice, and a single ellipsis marks any gap between segments.
/// Nothing is emitted when there is at most one page. The first and last
/// pages are always shown: an `end_size` of zero is treated as one.
pub fn plan(total_pages: u32, current_page: u32, end_size: u32, mid_size: u32) -> Vec<PageLabel> {
    if total_pages <= 1 {
        return Vec::new();
    }

    let total = i64::from(total_pages);
    let current = i64::from(current_page);
    let end = i64::from(end_size.max(1));
    let mid = i64::from(mid_size);

    let mut labels = Vec::new();
    let mut last = 0_i64;

    let mut emit = |from: i64, to: i64, labels: &mut Vec<PageLabel>| {
        let from = from.max(last + 1).max(1);
        let to = to.min(total);
        if from > to {
            return;
        }
        if last > 0 && from > last + 1 {
            labels.push(PageLabel::Ellipsis);
        }
        for number in from..=to {
            labels.push(PageLabel::Page {
                number: number as u32,
                is_current: number == current,
            });
        }
        last = to;
    };

    emit(1, end, &mut labels);
    emit(current - mid, current + mid, &mut labels);
    emit(total - end + 1, total, &mut labels);

    labels
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn render(labels: &[PageLabel]) -> String {
        labels
            .iter()
            .map(|label| match label {
                PageLabel::Page {
                    number,
                    is_current: true,
                } => format!("[{number}]"),
                PageLabel::Page { number, .. } => number.to_string(),
                PageLabel::Ellipsis => "…".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn window_in_the_middle_has_two_ellipses() {
        let labels = plan(20, 10, 2, 2);
        assert_eq!(render(&labels), "1 2 … 8 9 [10] 11 12 … 19 20");
    }

    #[test]
    fn overlapping_segments_collapse_without_ellipsis() {
        assert_eq!(render(&plan(3, 1, 2, 2)), "[1] 2 3");
        assert_eq!(render(&plan(5, 3, 2, 2)), "1 2 [3] 4 5");
    }

    #[test]
    fn zero_end_size_still_anchors_first_and_last_page() {
        assert_eq!(render(&plan(20, 10, 0, 2)), "1 … 8 9 [10] 11 12 … 20");
        assert_eq!(plan(20, 10, 0, 2), plan(20, 10, 1, 2));
    }

    #[test]
    fn single_page_renders_nothing() {
        assert!(plan(1, 1, 2, 2).is_empty());
        assert!(plan(0, 1, 2, 2).is_empty());
    }

    #[test]
    fn edges_near_the_start_and_end() {
        assert_eq!(render(&plan(20, 1, 2, 2)), "[1] 2 3 … 19 20");
        assert_eq!(render(&plan(20, 18, 2, 2)), "1 2 … 16 17 [18] 19 20");
        assert_eq!(render(&plan(20, 20, 2, 2)), "1 2 … 18 19 [20]");
    }

    #[test]
    fn adjacent_segments_do_not_get_an_ellipsis() {
        assert_eq!(render(&plan(10, 5, 2, 2)), "1 2 3 4 [5] 6 7 … 9 10");
        assert_eq!(render(&plan(9, 5, 2, 2)), "1 2 3 4 [5] 6 7 8 9");
    }

    #[test]
    fn no_page_is_emitted_twice() {
        for total in 0..30 {
            for current in 1..=total.max(1) {
                for end in 0..4 {
                    for mid in 0..4 {
                        let labels = plan(total, current, end, mid);
                        let numbers: Vec<u32> =
                            labels.iter().filter_map(PageLabel::number).collect();
                        let unique: HashSet<u32> = numbers.iter().copied().collect();
                        assert_eq!(unique.len(), numbers.len(), "{total}/{current}/{end}/{mid}");
                        assert!(numbers.windows(2).all(|pair| pair[0] < pair[1]));
                        assert!(
                            labels
                                .windows(2)
                                .all(|pair| pair[0] != PageLabel::Ellipsis
                                    || pair[1] != PageLabel::Ellipsis)
                        );
                        if total > 1 {
                            assert!(numbers.contains(&current));
                            assert_eq!(labels.iter().filter(|label| label.is_current()).count(), 1);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn page_window_defaults() {
        let window = PageWindow::default();
        assert_eq!(window.plan(20, 10), plan(20, 10, 2, 2));
    }
}
