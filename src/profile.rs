/// Weapon and ammunition profiles loaded from range data
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::range_table::{RangeEntry, RangeTable};

/// Range data shipped with the calculator
const BUILTIN_RANGE_DATA: &str = include_str!("../data/range_tables.json");

static BUILTIN_DATABASE: Lazy<Result<Database, DataError>> =
    Lazy::new(|| Database::from_json(BUILTIN_RANGE_DATA));

/// Faction a weapon belongs to, set in the range data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Nato,
    Ussr,
    China,
    #[default]
    Unknown,
}

impl Faction {
    /// Tag shown next to the weapon name; empty when unknown.
    pub fn tag(&self) -> &'static str {
        match self {
            Faction::Nato => "[NATO]",
            Faction::Ussr => "[USSR]",
            Faction::China => "[China]",
            Faction::Unknown => "",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One ammunition type with a range table per charge
#[derive(Debug, Clone, PartialEq)]
pub struct AmmunitionProfile {
    pub name: String,
    /// Keyed by charge (ring count); iteration is in ascending charge order.
    pub charges: BTreeMap<u32, RangeTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeaponProfile {
    pub name: String,
    pub faction: Faction,
    pub ammunition: Vec<AmmunitionProfile>,
}

impl WeaponProfile {
    /// Display name with the faction tag appended when known
    pub fn label(&self) -> String {
        match self.faction {
            Faction::Unknown => self.name.clone(),
            faction => format!("{} {}", self.name, faction.tag()),
        }
    }

    pub fn find_ammunition(&self, name: &str) -> Result<&AmmunitionProfile, DataError> {
        self.ammunition
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| DataError::UnknownAmmunition {
                weapon: self.name.clone(),
                ammunition: name.to_string(),
            })
    }
}

/// All weapons known to the calculator, in menu order
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub weapons: Vec<WeaponProfile>,
}

impl Database {
    /// Range data compiled into the binary, parsed on first use.
    pub fn builtin() -> Result<&'static Database, DataError> {
        Lazy::force(&BUILTIN_DATABASE).as_ref().map_err(Clone::clone)
    }

    /// Parse range data from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let raw: RawDatabase =
            serde_json::from_str(json).map_err(|e| DataError::Parse(e.to_string()))?;
        Ok(raw.into())
    }

    /// Load range data from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn find_weapon(&self, name: &str) -> Result<&WeaponProfile, DataError> {
        self.weapons
            .iter()
            .find(|w| w.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| DataError::UnknownWeapon(name.to_string()))
    }

    /// Resolve a weapon/ammunition pair by name.
    pub fn resolve(
        &self,
        weapon: &str,
        ammunition: &str,
    ) -> Result<(&WeaponProfile, &AmmunitionProfile), DataError> {
        let w = self.find_weapon(weapon)?;
        let a = w.find_ammunition(ammunition)?;
        Ok((w, a))
    }
}

// Serialized shape of the range data

#[derive(Debug, Deserialize)]
struct RawDatabase {
    weapons: Vec<RawWeapon>,
}

#[derive(Debug, Deserialize)]
struct RawWeapon {
    name: String,
    #[serde(default)]
    faction: Faction,
    ammunition: Vec<RawAmmunition>,
}

#[derive(Debug, Deserialize)]
struct RawAmmunition {
    name: String,
    charges: Vec<RawCharge>,
}

#[derive(Debug, Deserialize)]
struct RawCharge {
    charge: u32,
    dispersion: f64,
    /// Rows of (distance, elevation, time, elevation rate)
    ranges: Vec<(u32, f64, f64, f64)>,
}

impl From<RawDatabase> for Database {
    fn from(raw: RawDatabase) -> Self {
        let weapons = raw
            .weapons
            .into_iter()
            .map(|w| WeaponProfile {
                name: w.name,
                faction: w.faction,
                ammunition: w
                    .ammunition
                    .into_iter()
                    .map(|a| AmmunitionProfile {
                        name: a.name,
                        charges: a
                            .charges
                            .into_iter()
                            .map(|c| {
                                let rows: Vec<RangeEntry> =
                                    c.ranges.into_iter().map(RangeEntry::from).collect();
                                (c.charge, RangeTable::new(rows, c.dispersion))
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Database { weapons }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "weapons": [
            {
                "name": "M252",
                "faction": "nato",
                "ammunition": [
                    {
                        "name": "M821 HE",
                        "charges": [
                            { "charge": 1, "dispersion": 13, "ranges": [[200, 1450, 19.8, 7.5], [100, 1540, 20.0, 6.0]] },
                            { "charge": 0, "dispersion": 8, "ranges": [[50, 1540, 15.0, 4.0]] }
                        ]
                    }
                ]
            },
            { "name": "Homemade", "ammunition": [] }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let db = Database::from_json(SAMPLE).unwrap();
        assert_eq!(db.weapons.len(), 2);

        let m252 = &db.weapons[0];
        assert_eq!(m252.faction, Faction::Nato);
        assert_eq!(m252.label(), "M252 [NATO]");

        let he = &m252.ammunition[0];
        let charges: Vec<u32> = he.charges.keys().copied().collect();
        assert_eq!(charges, vec![0, 1]);

        let table = &he.charges[&1];
        assert_eq!(table.min_distance(), Some(100));
        assert_eq!(table.dispersion_m(), 13.0);
    }

    #[test]
    fn test_missing_faction_defaults_to_unknown() {
        let db = Database::from_json(SAMPLE).unwrap();
        let w = &db.weapons[1];
        assert_eq!(w.faction, Faction::Unknown);
        assert_eq!(w.label(), "Homemade");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let db = Database::from_json(SAMPLE).unwrap();
        let (w, a) = db.resolve("m252", "m821 he").unwrap();
        assert_eq!(w.name, "M252");
        assert_eq!(a.name, "M821 HE");

        assert_eq!(
            db.find_weapon("2B14").unwrap_err(),
            DataError::UnknownWeapon("2B14".into())
        );
        assert!(matches!(
            db.resolve("M252", "Smoke"),
            Err(DataError::UnknownAmmunition { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(Database::from_json("{"), Err(DataError::Parse(_))));
        assert!(matches!(
            Database::from_json(r#"{"weapons": [{"name": "X"}]}"#),
            Err(DataError::Parse(_))
        ));
    }

    #[test]
    fn test_builtin_data_loads() {
        let db = Database::builtin().unwrap();
        assert!(!db.weapons.is_empty());
        for weapon in &db.weapons {
            assert!(!weapon.ammunition.is_empty(), "{} has no ammunition", weapon.name);
            for ammo in &weapon.ammunition {
                assert!(!ammo.charges.is_empty());
                for table in ammo.charges.values() {
                    assert!(!table.is_empty());
                    assert!(table.dispersion_m() > 0.0);
                }
            }
        }
        assert_eq!(db.find_weapon("M252").unwrap().faction, Faction::Nato);
        assert_eq!(db.find_weapon("2B14").unwrap().faction, Faction::Ussr);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Database::from_file(Path::new("/nonexistent/ranges.json")).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }
}
