//! Inventory and economy: reloads, weapon purchases and weapon skins.

use crate::game::GameState;
use log::info;
use shared::catalog::{self, Category};
use shared::{ServerMessage, SessionId};

impl GameState {
    /// Refills the equipped weapon's magazine.
    pub fn reload(&mut self, id: SessionId) {
        let Some(player) = self.players.get_mut(id) else {
            return;
        };
        player.ammo = catalog::magazine_size(&player.gun);
        player.reloading = false;
        let ammo = player.ammo;
        self.send_to(id, &ServerMessage::Reloaded { ammo });
    }

    /// Buys and equips a weapon from the catalog.
    pub fn buy_gun(&mut self, id: SessionId, gun: &str) {
        let Some(player) = self.players.get_mut(id) else {
            return;
        };
        let item = catalog::lookup(gun).filter(|item| item.category == Category::Weapon);

        let reply = match item {
            Some(item) if player.coins >= item.price => {
                player.coins -= item.price;
                player.gun = item.id.to_string();
                player.ammo = catalog::magazine_size(item.id);
                info!("{} bought {}", player.name, item.id);
                ServerMessage::ShopResult {
                    success: true,
                    gun: Some(item.id.to_string()),
                    ammo: Some(player.ammo),
                    coins: player.coins,
                    msg: format!("Bought {}!", item.name),
                }
            }
            _ => ServerMessage::ShopResult {
                success: false,
                gun: None,
                ammo: None,
                coins: player.coins,
                msg: match item {
                    Some(item) => format!("Need {} coins", item.price),
                    None => "Need ? coins".to_string(),
                },
            },
        };
        self.send_to(id, &reply);
    }

    /// Equips a skin, buying it first unless already owned.
    pub fn buy_skin(&mut self, id: SessionId, skin_id: &str) {
        let Some(player) = self.players.get_mut(id) else {
            return;
        };
        let item = catalog::lookup(skin_id).filter(|item| item.category == Category::Skin);
        let Some((item, weapon)) = item.and_then(|item| item.weapon.map(|w| (item, w))) else {
            let coins = player.coins;
            self.send_to(
                id,
                &ServerMessage::SkinResult {
                    success: false,
                    skin_id: None,
                    weapon: None,
                    color: None,
                    coins,
                    msg: "Unknown skin".to_string(),
                },
            );
            return;
        };

        let msg = if player.owned_skins.iter().any(|s| s == item.id) {
            format!("Equipped {}!", item.name)
        } else if player.coins >= item.price {
            player.coins -= item.price;
            player.owned_skins.push(item.id.to_string());
            info!("{} bought {}", player.name, item.id);
            format!("Bought & equipped {}!", item.name)
        } else {
            let reply = ServerMessage::SkinResult {
                success: false,
                skin_id: None,
                weapon: None,
                color: None,
                coins: player.coins,
                msg: format!("Need {} coins for {}", item.price, item.name),
            };
            self.send_to(id, &reply);
            return;
        };
        player
            .active_skins
            .insert(weapon.to_string(), item.id.to_string());

        let reply = ServerMessage::SkinResult {
            success: true,
            skin_id: Some(item.id.to_string()),
            weapon: Some(weapon),
            color: item.color,
            coins: player.coins,
            msg,
        };
        self.send_to(id, &reply);
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::Harness;
    use shared::SessionId;

    fn shopper(coins: u32) -> (Harness, SessionId) {
        let mut h = Harness::new();
        let id = h.connect();
        h.create_room(id);
        h.state.players.get_mut(id).unwrap().coins = coins;
        h.drain(id);
        (h, id)
    }

    #[test]
    fn test_reload_refills_magazine() {
        let (mut h, id) = shopper(0);
        {
            let p = h.state.players.get_mut(id).unwrap();
            p.gun = "smg".into();
            p.ammo = 2;
            p.reloading = true;
        }
        h.state.reload(id);
        let reply = h.find(id, "reloaded").unwrap();
        assert_eq!(reply["ammo"], 30);
        let p = h.state.players().get(id).unwrap();
        assert_eq!(p.ammo, 30);
        assert!(!p.reloading);
    }

    #[test]
    fn test_reload_sword_has_no_ammo() {
        let (mut h, id) = shopper(0);
        h.state.players.get_mut(id).unwrap().gun = "sword".into();
        h.state.reload(id);
        assert_eq!(h.find(id, "reloaded").unwrap()["ammo"], 0);
    }

    #[test]
    fn test_buy_gun_success() {
        let (mut h, id) = shopper(40);
        h.state.buy_gun(id, "shotgun");

        let reply = h.find(id, "shopResult").unwrap();
        assert_eq!(reply["success"], true);
        assert_eq!(reply["gun"], "shotgun");
        assert_eq!(reply["ammo"], 6);
        assert_eq!(reply["coins"], 20);
        assert_eq!(reply["msg"], "Bought SHOTGUN!");
        assert_eq!(h.state.players().get(id).unwrap().gun, "shotgun");
    }

    #[test]
    fn test_buy_gun_insufficient_coins() {
        let (mut h, id) = shopper(10);
        h.state.buy_gun(id, "sniper");

        let reply = h.find(id, "shopResult").unwrap();
        assert_eq!(reply["success"], false);
        assert_eq!(reply["msg"], "Need 35 coins");
        assert!(reply.get("gun").is_none());
        let p = h.state.players().get(id).unwrap();
        assert_eq!(p.coins, 10);
        assert_eq!(p.gun, "pistol");
    }

    #[test]
    fn test_buy_gun_rejects_skins_and_unknown_ids() {
        let (mut h, id) = shopper(500);
        h.state.buy_gun(id, "skin_smg_neon");
        assert_eq!(h.find(id, "shopResult").unwrap()["msg"], "Need ? coins");
        h.state.buy_gun(id, "railgun");
        assert_eq!(h.find(id, "shopResult").unwrap()["success"], false);
        assert_eq!(h.state.players().get(id).unwrap().coins, 500);
    }

    #[test]
    fn test_buy_skin_then_equip_for_free() {
        let (mut h, id) = shopper(50);
        h.state.buy_skin(id, "skin_smg_void");

        let reply = h.find(id, "skinResult").unwrap();
        assert_eq!(reply["success"], true);
        assert_eq!(reply["weapon"], "smg");
        assert_eq!(reply["color"], "#6A0DAD");
        assert_eq!(reply["coins"], 20);
        assert_eq!(reply["msg"], "Bought & equipped Void SMG!");

        h.state.players.get_mut(id).unwrap().active_skins.clear();
        h.state.buy_skin(id, "skin_smg_void");
        let reply = h.find(id, "skinResult").unwrap();
        assert_eq!(reply["msg"], "Equipped Void SMG!");
        assert_eq!(reply["coins"], 20);

        let p = h.state.players().get(id).unwrap();
        assert_eq!(p.owned_skins, vec!["skin_smg_void".to_string()]);
        assert_eq!(p.active_skins["smg"], "skin_smg_void");
    }

    #[test]
    fn test_buy_skin_failures() {
        let (mut h, id) = shopper(5);
        h.state.buy_skin(id, "skin_sniper_dragon");
        let reply = h.find(id, "skinResult").unwrap();
        assert_eq!(reply["success"], false);
        assert_eq!(reply["msg"], "Need 60 coins for Dragon Sniper");

        h.state.buy_skin(id, "smg");
        let reply = h.find(id, "skinResult").unwrap();
        assert_eq!(reply["msg"], "Unknown skin");
        assert!(h.state.players().get(id).unwrap().owned_skins.is_empty());
    }
}
