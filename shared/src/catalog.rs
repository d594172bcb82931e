//! Static catalog of purchasable weapons and weapon skins.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Magazine size used for weapons the catalog does not list.
pub const DEFAULT_MAGAZINE: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Weapon,
    Skin,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CatalogItem {
    #[serde(skip)]
    pub id: &'static str,
    pub price: u32,
    pub name: &'static str,
    pub category: Category,
    /// Weapon a skin applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weapon: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

const fn weapon(id: &'static str, price: u32, name: &'static str) -> CatalogItem {
    CatalogItem {
        id,
        price,
        name,
        category: Category::Weapon,
        weapon: None,
        color: None,
    }
}

const fn skin(
    id: &'static str,
    price: u32,
    name: &'static str,
    weapon: &'static str,
    color: &'static str,
) -> CatalogItem {
    CatalogItem {
        id,
        price,
        name,
        category: Category::Skin,
        weapon: Some(weapon),
        color: Some(color),
    }
}

pub static CATALOG: &[CatalogItem] = &[
    weapon("smg", 15, "SMG"),
    weapon("shotgun", 20, "SHOTGUN"),
    weapon("assault", 25, "ASSAULT RIFLE"),
    weapon("sniper", 35, "SNIPER RIFLE"),
    weapon("sword", 10, "SWORD"),
    skin("skin_pistol_golden", 20, "Golden Pistol", "pistol", "#FFD700"),
    skin("skin_pistol_ice", 20, "Ice Pistol", "pistol", "#A0E8FF"),
    skin("skin_pistol_inferno", 25, "Inferno Pistol", "pistol", "#FF4500"),
    skin("skin_smg_golden", 25, "Golden SMG", "smg", "#FFD700"),
    skin("skin_smg_neon", 25, "Neon SMG", "smg", "#39FF14"),
    skin("skin_smg_void", 30, "Void SMG", "smg", "#6A0DAD"),
    skin("skin_shotgun_golden", 30, "Golden Shotgun", "shotgun", "#FFD700"),
    skin("skin_shotgun_rusty", 20, "Rusty Shotgun", "shotgun", "#8B4513"),
    skin("skin_shotgun_ice", 30, "Ice Shotgun", "shotgun", "#A0E8FF"),
    skin("skin_assault_golden", 35, "Golden Assault", "assault", "#FFD700"),
    skin("skin_assault_camo", 30, "Camo Assault", "assault", "#4B5320"),
    skin("skin_assault_chrome", 40, "Chrome Assault", "assault", "#C0C0C0"),
    skin("skin_sniper_golden", 50, "Golden Sniper", "sniper", "#FFD700"),
    skin("skin_sniper_void", 45, "Void Sniper", "sniper", "#6A0DAD"),
    skin("skin_sniper_dragon", 60, "Dragon Sniper", "sniper", "#FF6B00"),
    skin("skin_sword_golden", 30, "Golden Sword", "sword", "#FFD700"),
    skin("skin_sword_shadow", 35, "Shadow Blade", "sword", "#1A1A2E"),
    skin("skin_sword_ice", 35, "Frostblade", "sword", "#A0E8FF"),
    skin("skin_sword_inferno", 40, "Inferno Blade", "sword", "#FF4500"),
    skin("skin_sword_electric", 40, "Electric Blade", "sword", "#FFFF00"),
];

pub fn lookup(id: &str) -> Option<&'static CatalogItem> {
    CATALOG.iter().find(|item| item.id == id)
}

/// Rounds loaded after equipping or reloading `gun`. Melee weapons carry none.
pub fn magazine_size(gun: &str) -> u32 {
    match gun {
        "pistol" => 12,
        "smg" => 30,
        "shotgun" => 6,
        "assault" => 20,
        "sniper" => 5,
        "sword" => 0,
        _ => DEFAULT_MAGAZINE,
    }
}

/// Serializes the whole catalog as an `id -> item` object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shop;

impl Serialize for Shop {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CATALOG.len()))?;
        for item in CATALOG {
            map.serialize_entry(item.id, item)?;
        }
        map.end()
    }
}
