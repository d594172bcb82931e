//! Player store: the canonical record for every session that joined a room.

use crate::utils::sanitize_name;
use log::debug;
use shared::{Player, SessionId, Team, DEFAULT_SKIN};
use std::collections::{BTreeMap, HashMap};

/// The part of a player record that survives a round reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EconomySnapshot {
    pub coins: u32,
    pub owned_skins: Vec<String>,
    pub active_skins: BTreeMap<String, String>,
}

impl EconomySnapshot {
    pub fn of(player: &Player) -> Self {
        Self {
            coins: player.coins,
            owned_skins: player.owned_skins.clone(),
            active_skins: player.active_skins.clone(),
        }
    }

    pub fn restore(self, player: &mut Player) {
        player.coins = self.coins;
        player.owned_skins = self.owned_skins;
        player.active_skins = self.active_skins;
    }
}

#[derive(Debug, Default)]
pub struct PlayerStore {
    players: HashMap<SessionId, Player>,
}

impl PlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or replaces) the record for `id` with spawn defaults.
    pub fn create_player(
        &mut self,
        id: SessionId,
        name: Option<&str>,
        team: Team,
        skin: Option<&str>,
    ) -> &Player {
        let name = sanitize_name(name);
        let skin = skin
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SKIN)
            .to_string();
        debug!("Creating player {} ({}) on team {}", id, name, team.as_str());

        self.players.insert(id, Player::new(id, name, team, skin));
        &self.players[&id]
    }

    pub fn get(&self, id: SessionId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn remove(&mut self, id: SessionId) -> Option<Player> {
        self.players.remove(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn economy_snapshot(&self, id: SessionId) -> Option<EconomySnapshot> {
        self.get(id).map(EconomySnapshot::of)
    }

    /// Restores the persistent subset onto a live record. Returns false if the
    /// player has left.
    pub fn restore_economy(&mut self, id: SessionId, snapshot: EconomySnapshot) -> bool {
        match self.get_mut(id) {
            Some(player) => {
                snapshot.restore(player);
                true
            }
            None => false,
        }
    }

    /// Clones the records for `ids`, keyed by the stringified handle the way
    /// the browser client indexes them.
    pub fn roster<'a, I>(&self, ids: I) -> BTreeMap<String, Player>
    where
        I: IntoIterator<Item = &'a SessionId>,
    {
        ids.into_iter()
            .filter_map(|id| self.get(*id).map(|p| (id.to_string(), p.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{MAX_HP, SPAWN_X_RED};

    #[test]
    fn test_create_player_sanitizes() {
        let mut store = PlayerStore::new();
        let player = store.create_player(1, Some("  shadowstriker99 "), Team::Red, None);
        assert_eq!(player.name, "SHADOWSTRIKE");
        assert_eq!(player.skin, "phantom");
        assert_eq!(player.hp, MAX_HP);
        assert_eq!(player.x, SPAWN_X_RED);
    }

    #[test]
    fn test_create_player_blank_name() {
        let mut store = PlayerStore::new();
        let player = store.create_player(1, Some("   "), Team::Blue, Some("ghost"));
        assert_eq!(player.name, "PLAYER");
        assert_eq!(player.skin, "ghost");
    }

    #[test]
    fn test_get_and_remove() {
        let mut store = PlayerStore::new();
        store.create_player(3, Some("a"), Team::Red, None);
        assert!(store.contains(3));
        assert_eq!(store.get(3).unwrap().name, "A");

        let removed = store.remove(3).unwrap();
        assert_eq!(removed.pid, 3);
        assert!(store.get(3).is_none());
        assert!(store.remove(3).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_economy_snapshot_roundtrip() {
        let mut store = PlayerStore::new();
        store.create_player(1, Some("h"), Team::Red, None);
        {
            let p = store.get_mut(1).unwrap();
            p.coins = 40;
            p.owned_skins.push("skin_smg_void".into());
            p.active_skins.insert("smg".into(), "skin_smg_void".into());
            p.kills = 3;
        }
        let snapshot = store.economy_snapshot(1).unwrap();

        {
            let p = store.get_mut(1).unwrap();
            p.coins = 0;
            p.owned_skins.clear();
            p.active_skins.clear();
        }
        assert!(store.restore_economy(1, snapshot));

        let p = store.get(1).unwrap();
        assert_eq!(p.coins, 40);
        assert_eq!(p.owned_skins, vec!["skin_smg_void".to_string()]);
        assert_eq!(p.active_skins.get("smg").map(String::as_str), Some("skin_smg_void"));
        assert_eq!(p.kills, 3);
    }

    #[test]
    fn test_restore_economy_for_departed_player() {
        let mut store = PlayerStore::new();
        store.create_player(1, None, Team::Red, None);
        let snapshot = store.economy_snapshot(1).unwrap();
        store.remove(1);
        assert!(!store.restore_economy(1, snapshot));
    }

    #[test]
    fn test_roster_skips_missing() {
        let mut store = PlayerStore::new();
        store.create_player(1, Some("one"), Team::Red, None);
        store.create_player(2, Some("two"), Team::Blue, None);
        let roster = store.roster(&[1, 2, 9]);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster["2"].name, "TWO");
    }
}
