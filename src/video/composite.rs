use std::collections::VecDeque;
use std::path::PathBuf;

use crate::error::{CompositorError, Result};
use crate::video::metadata::DEFAULT_VIDEO_TITLE;
use crate::video::model::Video;

/// Ordered children of a composite video
///
/// The composite owns its children outright. Transitions refer to their
/// neighbors by position only, so the tree never holds back-pointers.
#[derive(Debug, Clone)]
pub struct CompositeVideo {
    children: VecDeque<Video>,
    is_root: bool,
}

impl CompositeVideo {
    pub(crate) fn new(is_root: bool) -> Self {
        Self {
            children: VecDeque::new(),
            is_root,
        }
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Children in tree order
    pub fn children(&self) -> std::collections::vec_deque::Iter<'_, Video> {
        self.children.iter()
    }

    pub(crate) fn children_mut(&mut self) -> std::collections::vec_deque::IterMut<'_, Video> {
        self.children.iter_mut()
    }

    pub(crate) fn child_mut(&mut self, index: usize) -> Option<&mut Video> {
        self.children.get_mut(index)
    }

    pub(crate) fn push_back(&mut self, child: Video) {
        self.children.push_back(child);
    }

    pub(crate) fn push_front(&mut self, child: Video) {
        self.children.push_front(child);
    }

    /// Title made of the first and last non-transition child titles
    pub fn derived_title(&self) -> String {
        let titles: Vec<String> = self
            .children
            .iter()
            .filter(|c| !c.is_transition())
            .map(|c| c.title())
            .collect();

        match titles.as_slice() {
            [] => DEFAULT_VIDEO_TITLE.to_string(),
            [first, .., last] if first != last => format!("{}-{}", first, last),
            [first, ..] => first.clone(),
        }
    }

    /// Check the composite can be built
    ///
    /// A composite needs at least one child, and every transition needs a
    /// non-transition video on each side.
    pub fn validate_layout(&self) -> Result<()> {
        if self.children.is_empty() {
            return Err(CompositorError::invalid_argument("composite video has no children"));
        }

        for (index, child) in self.children.iter().enumerate() {
            if !child.is_transition() {
                continue;
            }

            let before = index.checked_sub(1).and_then(|i| self.children.get(i));
            let after = self.children.get(index + 1);
            match (before, after) {
                (Some(b), Some(a)) if !b.is_transition() && !a.is_transition() => {}
                _ => {
                    return Err(CompositorError::invalid_argument(format!(
                        "transition at position {} needs a video on each side",
                        index
                    )));
                }
            }
        }

        Ok(())
    }

    /// Media of the videos around the transition at `index`
    pub(crate) fn transition_neighbors(&self, index: usize) -> Result<(PathBuf, PathBuf)> {
        let media_of = |i: Option<usize>| {
            i.and_then(|i| self.children.get(i))
                .and_then(|c| c.media_url())
                .map(|p| p.to_path_buf())
        };

        match (media_of(index.checked_sub(1)), media_of(Some(index + 1))) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(CompositorError::invalid_argument(format!(
                "neighbors of the transition at position {} have no media",
                index
            ))),
        }
    }

    /// Media of every child in tree order, skipping children that have none
    pub(crate) fn children_media(&self) -> Vec<PathBuf> {
        self.children
            .iter()
            .filter_map(|c| c.media_url().map(|p| p.to_path_buf()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn clip(text: &str) -> Video {
        Video::raw_text(text).unwrap()
    }

    #[test]
    fn test_empty_composite_is_invalid() {
        let err = CompositeVideo::new(true).validate_layout().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_transition_needs_two_neighbors() {
        let mut composite = CompositeVideo::new(true);
        composite.push_back(clip("sunrise over hills"));
        composite.push_back(Video::transition());
        assert!(composite.validate_layout().is_err());

        composite.push_back(clip("sunset over sea"));
        assert!(composite.validate_layout().is_ok());

        composite.push_front(Video::transition());
        assert!(composite.validate_layout().is_err());
    }

    #[test]
    fn test_consecutive_transitions_are_invalid() {
        let mut composite = CompositeVideo::new(true);
        composite.push_back(clip("one"));
        composite.push_back(Video::transition());
        composite.push_back(Video::transition());
        composite.push_back(clip("two"));
        assert!(composite.validate_layout().is_err());
    }

    #[test]
    fn test_derived_title() {
        let mut composite = CompositeVideo::new(true);
        assert_eq!(composite.derived_title(), DEFAULT_VIDEO_TITLE);

        composite.push_back(clip("sunrise over hills"));
        assert_eq!(composite.derived_title(), "sunrise-hills");

        composite.push_back(Video::transition());
        composite.push_back(clip("sunset over sea"));
        assert_eq!(composite.derived_title(), "sunrise-hills-sunset-sea");
    }

    #[test]
    fn test_neighbors_without_media() {
        let mut composite = CompositeVideo::new(true);
        composite.push_back(clip("one"));
        composite.push_back(Video::transition());
        composite.push_back(clip("two"));
        assert!(composite.transition_neighbors(1).is_err());

        if let Some(child) = composite.child_mut(0) {
            child.set_media_url("one.mp4");
        }
        if let Some(child) = composite.child_mut(2) {
            child.set_media_url("two.mp4");
        }
        let (from, to) = composite.transition_neighbors(1).unwrap();
        assert_eq!(from, PathBuf::from("one.mp4"));
        assert_eq!(to, PathBuf::from("two.mp4"));
    }
}
