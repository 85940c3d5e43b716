//! Static loadout catalogs, one per enemy faction.
//!
//! Catalogs are compile-time constants; picks are independent uniform draws
//! with no state carried between calls.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::payloads::Faction;
use crate::types::Embed;

/// A recommended equipment set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loadout {
    pub armour: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub grenade: &'static str,
    pub stratagems: [&'static str; 4],
}

pub const TERMINID_LOADOUTS: &[Loadout] = &[
    Loadout {
        armour: "SC-34 Infiltrator",
        primary: "SG-225 Breaker",
        secondary: "P-19 Redeemer",
        grenade: "G-16 Impact",
        stratagems: [
            "Eagle Cluster Bomb",
            "Orbital Gatling Barrage",
            "GR-8 Recoilless Rifle",
            "AX/AR-23 \"Guard Dog\"",
        ],
    },
    Loadout {
        armour: "CE-35 Trailblazer Scout",
        primary: "SG-8S Slugger",
        secondary: "P-4 Senator",
        grenade: "G-13 Incendiary Impact",
        stratagems: [
            "FLAM-40 Flamethrower",
            "Eagle 500kg Bomb",
            "Orbital Laser",
            "LIFT-850 Jump Pack",
        ],
    },
    Loadout {
        armour: "FS-05 Marksman",
        primary: "AR-23P Liberator Penetrator",
        secondary: "GP-31 Grenade Pistol",
        grenade: "G-6 Frag",
        stratagems: [
            "EAT-17 Expendable Anti-Tank",
            "Eagle Airstrike",
            "A/MG-43 Machine Gun Sentry",
            "Orbital Precision Strike",
        ],
    },
    Loadout {
        armour: "B-08 Light Gunner",
        primary: "SG-225IE Breaker Incendiary",
        secondary: "P-2 Peacemaker",
        grenade: "G-10 Incendiary",
        stratagems: [
            "MG-43 Machine Gun",
            "Eagle Napalm Airstrike",
            "A/AC-8 Autocannon Sentry",
            "SH-32 Shield Generator Pack",
        ],
    },
    Loadout {
        armour: "CM-09 Bonesnapper",
        primary: "ARC-12 Blitzer",
        secondary: "LAS-7 Dagger",
        grenade: "G-23 Stun",
        stratagems: [
            "RS-422 Railgun",
            "Orbital Napalm Barrage",
            "Eagle Strafing Run",
            "AX/LAS-5 \"Guard Dog\" Rover",
        ],
    },
];

pub const AUTOMATON_LOADOUTS: &[Loadout] = &[
    Loadout {
        armour: "B-01 Tactical",
        primary: "JAR-5 Dominator",
        secondary: "P-19 Redeemer",
        grenade: "G-12 High Explosive",
        stratagems: [
            "AC-8 Autocannon",
            "Eagle 500kg Bomb",
            "Orbital Precision Strike",
            "SH-32 Shield Generator Pack",
        ],
    },
    Loadout {
        armour: "FS-23 Battle Master",
        primary: "R-63 Diligence",
        secondary: "P-4 Senator",
        grenade: "G-16 Impact",
        stratagems: [
            "RS-422 Railgun",
            "Eagle Airstrike",
            "Orbital Laser",
            "A/MG-43 Machine Gun Sentry",
        ],
    },
    Loadout {
        armour: "DP-40 Hero of the Federation",
        primary: "SG-8P Punisher Plasma",
        secondary: "GP-31 Grenade Pistol",
        grenade: "G-6 Frag",
        stratagems: [
            "GR-8 Recoilless Rifle",
            "Orbital Railcannon Strike",
            "Eagle Cluster Bomb",
            "A/M-12 Mortar Sentry",
        ],
    },
    Loadout {
        armour: "CE-74 Breaker",
        primary: "AR-23 Liberator",
        secondary: "P-2 Peacemaker",
        grenade: "G-123 Thermite",
        stratagems: [
            "LAS-99 Quasar Cannon",
            "Orbital 380mm HE Barrage",
            "Eagle Strafing Run",
            "B-1 Supply Pack",
        ],
    },
    Loadout {
        armour: "SA-04 Combat Technician",
        primary: "PLAS-1 Scorcher",
        secondary: "LAS-7 Dagger",
        grenade: "G-23 Stun",
        stratagems: [
            "FAF-14 Spear",
            "Orbital Walking Barrage",
            "Eagle 110mm Rocket Pods",
            "A/ARC-3 Tesla Tower",
        ],
    },
];

/// The catalog for a faction. Only the two enemy fronts carry one.
pub fn catalog(faction: Faction) -> &'static [Loadout] {
    match faction {
        Faction::Terminids => TERMINID_LOADOUTS,
        Faction::Automatons => AUTOMATON_LOADOUTS,
        Faction::Humans | Faction::Illuminate => &[],
    }
}

/// Embed accent color for a faction's loadouts.
pub fn accent_color(faction: Faction) -> u32 {
    match faction {
        Faction::Terminids => 0xFFB800,
        Faction::Automatons => 0xE53935,
        Faction::Humans => 0x1E88E5,
        Faction::Illuminate => 0x8E24AA,
    }
}

/// Draw one loadout uniformly at random.
pub fn pick<R: Rng + ?Sized>(faction: Faction, rng: &mut R) -> Option<&'static Loadout> {
    catalog(faction).choose(rng)
}

/// Render a loadout as an embed with one field per equipment slot.
pub fn loadout_embed(faction: Faction, loadout: &Loadout) -> Embed {
    let title = match faction {
        Faction::Terminids => "🪲 Random Anti-Terminid Loadout",
        Faction::Automatons => "🤖 Random Anti-Automaton Loadout",
        Faction::Humans | Faction::Illuminate => "🎲 Random Loadout",
    };
    Embed::new()
        .title(title)
        .color(accent_color(faction))
        .field("Armour", loadout.armour, true)
        .field("Primary", loadout.primary, true)
        .field("Secondary", loadout.secondary, true)
        .field("Grenades", loadout.grenade, true)
        .field("Stratagems", loadout.stratagems.join(", "), false)
        .footer("For Super Earth!")
}
