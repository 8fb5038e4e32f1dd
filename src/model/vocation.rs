use serde::{Deserialize, Serialize};

/// A character's vocation as shown on the roster.
///
/// Unrecognised names are kept verbatim in `Other` so a new vocation on the
/// game side never breaks parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Vocation {
    None,
    Druid,
    ElderDruid,
    Knight,
    EliteKnight,
    Paladin,
    RoyalPaladin,
    Sorcerer,
    MasterSorcerer,
    Monk,
    ExaltedMonk,
    Other(String),
}

impl Vocation {
    pub fn from_name(s: &str) -> Self {
        match s.trim() {
            "" | "None" => Vocation::None,
            "Druid" => Vocation::Druid,
            "Elder Druid" => Vocation::ElderDruid,
            "Knight" => Vocation::Knight,
            "Elite Knight" => Vocation::EliteKnight,
            "Paladin" => Vocation::Paladin,
            "Royal Paladin" => Vocation::RoyalPaladin,
            "Sorcerer" => Vocation::Sorcerer,
            "Master Sorcerer" => Vocation::MasterSorcerer,
            "Monk" => Vocation::Monk,
            "Exalted Monk" => Vocation::ExaltedMonk,
            other => Vocation::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Vocation::None => "None",
            Vocation::Druid => "Druid",
            Vocation::ElderDruid => "Elder Druid",
            Vocation::Knight => "Knight",
            Vocation::EliteKnight => "Elite Knight",
            Vocation::Paladin => "Paladin",
            Vocation::RoyalPaladin => "Royal Paladin",
            Vocation::Sorcerer => "Sorcerer",
            Vocation::MasterSorcerer => "Master Sorcerer",
            Vocation::Monk => "Monk",
            Vocation::ExaltedMonk => "Exalted Monk",
            Vocation::Other(name) => name,
        }
    }

    pub fn abbreviation(&self) -> &str {
        match self {
            Vocation::None => "N",
            Vocation::Druid => "D",
            Vocation::ElderDruid => "ED",
            Vocation::Knight => "K",
            Vocation::EliteKnight => "EK",
            Vocation::Paladin => "P",
            Vocation::RoyalPaladin => "RP",
            Vocation::Sorcerer => "S",
            Vocation::MasterSorcerer => "MS",
            Vocation::Monk => "M",
            Vocation::ExaltedMonk => "EM",
            Vocation::Other(_) => "",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Vocation::Druid | Vocation::ElderDruid => "\u{2744}\u{fe0f}",
            Vocation::Knight | Vocation::EliteKnight => "\u{1f6e1}",
            Vocation::Paladin | Vocation::RoyalPaladin => "\u{1f3f9}",
            Vocation::Sorcerer | Vocation::MasterSorcerer => "\u{1f525}",
            Vocation::Monk | Vocation::ExaltedMonk => "\u{1f44a}",
            Vocation::None | Vocation::Other(_) => "",
        }
    }
}

impl From<String> for Vocation {
    fn from(s: String) -> Self {
        Vocation::from_name(&s)
    }
}

impl From<Vocation> for String {
    fn from(v: Vocation) -> Self {
        v.name().to_string()
    }
}
