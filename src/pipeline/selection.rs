use std::collections::BTreeSet;

use crate::shared::ChannelId;

/// Channels picked on the rack for batch operations.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    ids: BTreeSet<ChannelId>,
}

impl Selection {
    /// Plain click replaces the selection; additive (ctrl) click toggles membership.
    pub fn select(&mut self, id: ChannelId, additive: bool) {
        if additive {
            if !self.ids.remove(&id) {
                self.ids.insert(id);
            }
        } else {
            self.ids.clear();
            self.ids.insert(id);
        }
    }

    pub fn remove(&mut self, id: ChannelId) {
        self.ids.remove(&id);
    }

    /// Drop anything that no longer exists.
    pub fn retain(&mut self, mut exists: impl FnMut(ChannelId) -> bool) {
        self.ids.retain(|&id| exists(id));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: ChannelId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<ChannelId> {
        self.ids.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_select_replaces() {
        let mut sel = Selection::default();
        sel.select(ChannelId(1), false);
        sel.select(ChannelId(2), false);
        assert_eq!(sel.ids(), [ChannelId(2)]);
    }

    #[test]
    fn additive_select_toggles() {
        let mut sel = Selection::default();
        sel.select(ChannelId(1), true);
        sel.select(ChannelId(3), true);
        assert_eq!(sel.ids(), [ChannelId(1), ChannelId(3)]);
        sel.select(ChannelId(1), true);
        assert_eq!(sel.ids(), [ChannelId(3)]);
    }

    #[test]
    fn retain_prunes_missing() {
        let mut sel = Selection::default();
        for id in 0..4 {
            sel.select(ChannelId(id), true);
        }
        sel.retain(|id| id.0 % 2 == 0);
        assert_eq!(sel.ids(), [ChannelId(0), ChannelId(2)]);
    }
}
