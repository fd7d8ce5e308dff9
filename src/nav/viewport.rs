//! Scrolling arithmetic for every scrollable view.
//!
//! Everything here is a pure function of its inputs so the invariants can be
//! checked without a terminal.

/// Lines reserved for chrome around the body: header, top and bottom border,
/// status bar.
pub const CHROME_LINES: u16 = 4;

/// Visible sub-window of a longer sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub offset: usize,
    pub visible: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: 0,
            visible: 1,
        }
    }
}

impl Viewport {
    /// Move the window so `cursor` is visible within `displayed` items.
    pub fn follow(&mut self, cursor: Option<usize>, displayed: usize) {
        self.offset = match cursor {
            Some(c) => reclamp(c, displayed, self.visible, self.offset),
            None => clamp_offset(self.offset, displayed, self.visible),
        };
    }

    /// Half-open range of item indices currently on screen.
    pub fn window(&self, displayed: usize) -> std::ops::Range<usize> {
        let start = self.offset.min(displayed);
        let end = (self.offset + self.visible).min(displayed);
        start..end
    }

    /// Largest valid offset for `displayed` items.
    pub fn max_offset(&self, displayed: usize) -> usize {
        displayed.saturating_sub(self.visible)
    }
}

/// Number of body lines for a terminal `height`, never less than one.
pub fn visible_count(height: u16, chrome: u16) -> usize {
    height.saturating_sub(chrome).max(1) as usize
}

/// Compute the offset that keeps `cursor` on screen.
///
/// Stateless: the result depends only on the four inputs.
pub fn reclamp(cursor: usize, displayed: usize, visible: usize, offset: usize) -> usize {
    let visible = visible.max(1);
    let next = if cursor < offset {
        cursor
    } else if cursor >= offset + visible {
        cursor + 1 - visible
    } else {
        offset
    };
    clamp_offset(next, displayed, visible)
}

fn clamp_offset(offset: usize, displayed: usize, visible: usize) -> usize {
    offset.min(displayed.saturating_sub(visible.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scrolls_up_to_reveal_cursor() {
        assert_eq!(reclamp(2, 100, 10, 5), 2);
    }

    #[test]
    fn scrolls_down_to_reveal_cursor() {
        assert_eq!(reclamp(20, 100, 10, 5), 11);
    }

    #[test]
    fn keeps_offset_when_cursor_visible() {
        assert_eq!(reclamp(7, 100, 10, 5), 5);
    }

    #[test]
    fn clamps_to_tail_when_list_shrinks() {
        // 12 items, 10 visible: offset can be at most 2.
        assert_eq!(reclamp(11, 12, 10, 8), 2);
    }

    #[test]
    fn short_list_never_scrolls() {
        assert_eq!(reclamp(3, 4, 10, 3), 0);
    }

    #[test]
    fn visible_count_floors_at_one() {
        assert_eq!(visible_count(2, CHROME_LINES), 1);
        assert_eq!(visible_count(0, CHROME_LINES), 1);
        assert_eq!(visible_count(30, CHROME_LINES), 26);
    }

    #[test]
    fn window_is_bounded_by_len() {
        let vp = Viewport {
            offset: 5,
            visible: 10,
        };
        assert_eq!(vp.window(8), 5..8);
        assert_eq!(vp.window(100), 5..15);
    }

    #[test]
    fn follow_without_cursor_only_clamps() {
        let mut vp = Viewport {
            offset: 40,
            visible: 10,
        };
        vp.follow(None, 0);
        assert_eq!(vp.offset, 0);
    }

    proptest! {
        /// Property: after reclamp the cursor is inside the window and the
        /// offset is inside its legal range.
        #[test]
        fn reclamp_reveals_cursor(
            displayed in 1usize..2_000,
            cursor_seed in 0usize..2_000,
            visible in 1usize..200,
            offset in 0usize..4_000,
        ) {
            let cursor = cursor_seed % displayed;
            let next = reclamp(cursor, displayed, visible, offset);
            prop_assert!(next <= cursor);
            prop_assert!(cursor < next + visible);
            prop_assert!(next <= displayed.saturating_sub(visible));
        }

        /// Property: reclamp is idempotent.
        #[test]
        fn reclamp_is_idempotent(
            displayed in 1usize..500,
            cursor_seed in 0usize..500,
            visible in 1usize..60,
            offset in 0usize..1_000,
        ) {
            let cursor = cursor_seed % displayed;
            let once = reclamp(cursor, displayed, visible, offset);
            prop_assert_eq!(reclamp(cursor, displayed, visible, once), once);
        }
    }
}
