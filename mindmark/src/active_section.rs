//! Shared active-section value
//!
//! The editor, graph and preview all follow one selected outline node. The
//! value lives in a [`SectionChannel`]; each view holds its own
//! [`Subscription`] and reacts when the channel's generation moves past
//! what it last saw, so views never talk to each other directly.

use crate::outline::OutlineNode;

/// The currently selected outline node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSection {
    /// Outline node id
    pub node_id: String,
    /// Zero-based line of the heading in the editor text
    pub line_number: Option<usize>,
    /// Raw heading text, inline markup included
    pub text: String,
}

impl From<&OutlineNode> for ActiveSection {
    fn from(node: &OutlineNode) -> Self {
        Self {
            node_id: node.id.clone(),
            line_number: node.line_number,
            text: node.text.clone(),
        }
    }
}

/// A view that reacts to active-section changes
pub trait SectionSubscriber {
    /// Called once per change with the new value (`None` when cleared)
    fn on_section_changed(&mut self, section: Option<&ActiveSection>);
}

/// Observable holder of the active section
#[derive(Debug, Default)]
pub struct SectionChannel {
    current: Option<ActiveSection>,
    generation: u64,
}

/// Per-view cursor into a [`SectionChannel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    seen: u64,
}

impl SectionChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value
    pub fn get(&self) -> Option<&ActiveSection> {
        self.current.as_ref()
    }

    /// Replace the value and bump the generation
    ///
    /// Every set counts as a change, even when the same node is selected
    /// twice, so a second click re-scrolls the views.
    pub fn set(&mut self, section: Option<ActiveSection>) {
        self.current = section;
        self.generation += 1;
    }

    /// Select an outline node
    pub fn select(&mut self, node: &OutlineNode) {
        self.set(Some(ActiveSection::from(node)));
    }

    /// Clear the selection (document load or reload)
    pub fn clear(&mut self) {
        self.set(None);
    }

    /// Start following the channel from its current generation
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            seen: self.generation,
        }
    }

    /// Deliver the value to a subscriber if it changed since the cursor last looked
    ///
    /// # Returns
    /// * `true` - The subscriber was notified
    /// * `false` - Nothing new for this subscriber
    pub fn deliver<S>(&self, subscription: &mut Subscription, subscriber: &mut S) -> bool
    where
        S: SectionSubscriber + ?Sized,
    {
        if subscription.seen == self.generation {
            return false;
        }
        subscription.seen = self.generation;
        subscriber.on_section_changed(self.current.as_ref());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::extract_outline;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<Option<String>>,
    }

    impl SectionSubscriber for Recorder {
        fn on_section_changed(&mut self, section: Option<&ActiveSection>) {
            self.seen.push(section.map(|s| s.text.clone()));
        }
    }

    #[test]
    fn test_from_outline_node() {
        let root = extract_outline("# Goals\n## Q1");
        let q1 = root.find("section-1").unwrap();
        let section = ActiveSection::from(q1);
        assert_eq!(section.node_id, "section-1");
        assert_eq!(section.line_number, Some(1));
        assert_eq!(section.text, "Q1");
    }

    #[test]
    fn test_subscribers_are_independent() {
        let root = extract_outline("# A\n# B");
        let mut channel = SectionChannel::new();
        let mut first_sub = channel.subscribe();
        let mut second_sub = channel.subscribe();
        let mut first = Recorder::default();
        let mut second = Recorder::default();

        assert!(!channel.deliver(&mut first_sub, &mut first));

        channel.select(root.find("section-0").unwrap());
        assert!(channel.deliver(&mut first_sub, &mut first));
        assert!(!channel.deliver(&mut first_sub, &mut first));

        channel.select(root.find("section-1").unwrap());
        assert!(channel.deliver(&mut first_sub, &mut first));
        // A late subscriber only sees the latest value
        assert!(channel.deliver(&mut second_sub, &mut second));

        assert_eq!(
            first.seen,
            vec![Some("A".to_string()), Some("B".to_string())]
        );
        assert_eq!(second.seen, vec![Some("B".to_string())]);
    }

    #[test]
    fn test_clear_is_delivered() {
        let root = extract_outline("# A");
        let mut channel = SectionChannel::new();
        let mut sub = channel.subscribe();
        let mut recorder = Recorder::default();

        channel.select(root.find("section-0").unwrap());
        channel.deliver(&mut sub, &mut recorder);
        channel.clear();
        assert!(channel.get().is_none());
        assert!(channel.deliver(&mut sub, &mut recorder));
        assert_eq!(recorder.seen.last(), Some(&None));
    }

    #[test]
    fn test_reselect_same_node_notifies_again() {
        let root = extract_outline("# A");
        let node = root.find("section-0").unwrap();
        let mut channel = SectionChannel::new();
        let mut sub = channel.subscribe();
        let mut recorder = Recorder::default();

        channel.select(node);
        channel.deliver(&mut sub, &mut recorder);
        channel.select(node);
        assert!(channel.deliver(&mut sub, &mut recorder));
        assert_eq!(recorder.seen.len(), 2);
    }
}
