// Terminal presentation for the interactive session
use std::io::{self, Write};

use colored::Colorize;

use crate::calculation::{CalculationOutcome, FireRequest};
use crate::history::{HistoryEntry, HistoryStore};
use crate::profile::{Database, WeaponProfile};

const RULE_WIDTH: usize = 60;

pub fn banner(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "═".repeat(RULE_WIDTH).magenta())?;
    writeln!(out, "{}", format!("{:^RULE_WIDTH$}", "MORTAR CALCULATOR").cyan().bold())?;
    writeln!(out, "{}", format!("{:^RULE_WIDTH$}", "indirect-fire solutions").yellow())?;
    writeln!(out, "{}", "═".repeat(RULE_WIDTH).magenta())
}

pub fn header(out: &mut impl Write, text: &str) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH).green())?;
    writeln!(out, "{}", format!("{text:^RULE_WIDTH$}").green())?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH).green())
}

pub fn subheader(out: &mut impl Write, text: &str) -> io::Result<()> {
    writeln!(out, "\n{}", text.yellow())?;
    writeln!(out, "{}", "-".repeat(50).yellow())
}

pub fn error(out: &mut impl Write, message: &str) -> io::Result<()> {
    writeln!(out, "{}", message.red())
}

pub fn notice(out: &mut impl Write, message: &str) -> io::Result<()> {
    writeln!(out, "{}", message.yellow())
}

pub fn farewell(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "\n{}", "Goodbye! Good shooting!".yellow())
}

pub fn main_menu(out: &mut impl Write) -> io::Result<()> {
    banner(out)?;
    writeln!(out, "\n{}", "Choose an action:".cyan())?;
    writeln!(out, " 1. New calculation")?;
    writeln!(out, " 2. Calculation history")?;
    writeln!(out, " 3. Help")?;
    writeln!(out, "{}", " 0. Exit".red())
}

pub fn weapon_list(out: &mut impl Write, database: &Database) -> io::Result<()> {
    subheader(out, "Available mortars:")?;
    for (i, weapon) in database.weapons.iter().enumerate() {
        writeln!(out, "{:2}. {}", i + 1, weapon.label())?;
    }
    writeln!(out, "{}", "\n 0. Back".red())
}

pub fn ammunition_list(out: &mut impl Write, weapon: &WeaponProfile) -> io::Result<()> {
    header(out, &format!("SELECTED: {}", weapon.label()))?;
    subheader(out, "Available ammunition:")?;
    for (i, ammo) in weapon.ammunition.iter().enumerate() {
        writeln!(out, "{:2}. {}", i + 1, ammo.name)?;
    }
    writeln!(out, "{}", "\n 0. Back".red())
}

fn request_lines(out: &mut impl Write, request: &FireRequest) -> io::Result<()> {
    writeln!(out, "Distance: {} m", request.distance_m)?;
    writeln!(out, "Mortar altitude: {} m", request.firer_altitude_m)?;
    writeln!(out, "Target altitude: {} m", request.target_altitude_m)?;
    writeln!(out, "Altitude difference: {} m", request.altitude_difference_m())
}

pub fn results(
    out: &mut impl Write,
    weapon: &WeaponProfile,
    ammunition: &str,
    request: &FireRequest,
    outcome: &CalculationOutcome,
) -> io::Result<()> {
    header(out, "FIRING SOLUTION")?;
    writeln!(out, "Mortar: {}", weapon.label())?;
    writeln!(out, "Ammunition: {ammunition}")?;
    request_lines(out, request)?;
    if request.has_azimuth() {
        writeln!(out, "Azimuth: {}", request.azimuth)?;
    }
    writeln!(out, "\n{}", "=".repeat(RULE_WIDTH).yellow())?;

    if !outcome.failures.is_empty() {
        writeln!(out, "\n{}", "Calculation problems:".red())?;
        for message in outcome.failure_messages() {
            writeln!(out, "   {}", message.red())?;
        }
        writeln!(out)?;
    }

    if outcome.all_failed() {
        writeln!(out, "{}", "No charge can reach this target".red())?;
        writeln!(out, "{}", "Try another distance or ammunition".yellow())?;
        return Ok(());
    }

    for r in &outcome.results {
        writeln!(out, "\n{}", format!("Charge: {}", r.charge).green())?;
        writeln!(out, "   Dispersion: {} m", r.dispersion_m)?;
        writeln!(out, "   {}", format!("Elevation: {:.0} mils", r.elevation_mils).cyan())?;
        writeln!(out, "   {}", format!("Time of flight: {:.2} s", r.time_s).yellow())?;
        writeln!(
            out,
            "   {}",
            format!("Altitude correction: {:.1} mils", r.altitude_comp_mils).magenta()
        )?;
    }
    Ok(())
}

pub fn result_menu(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "\n{}", "=".repeat(RULE_WIDTH).green())?;
    writeln!(out, "{}", "Choose an action:".cyan())?;
    writeln!(out, " 1. Swap ammunition (same coordinates)")?;
    writeln!(out, " 2. New calculation")?;
    writeln!(out, " 3. Main menu")?;
    writeln!(out, "{}", " 0. Exit".red())
}

pub fn swap_menu(out: &mut impl Write, weapon: &WeaponProfile, request: &FireRequest) -> io::Result<()> {
    header(out, "QUICK AMMUNITION SWAP")?;
    writeln!(out, "Current parameters:")?;
    writeln!(out, "{}", format!("Mortar: {}", weapon.label()).cyan())?;
    request_lines(out, request)?;
    writeln!(out, "Azimuth: {}", request.azimuth)?;
    subheader(out, "Available ammunition:")?;
    for (i, ammo) in weapon.ammunition.iter().enumerate() {
        writeln!(out, "{:2}. {}", i + 1, ammo.name)?;
    }
    writeln!(out, "{}", "\n 0. Main menu".red())
}

pub fn history_list(out: &mut impl Write, history: &HistoryStore) -> io::Result<()> {
    header(out, "CALCULATION HISTORY")?;
    writeln!(out, "{}", "Choose a calculation to reuse, or 0 to go back:".cyan())?;
    for (index, entry) in history.iter_recent() {
        let request = &entry.request;
        writeln!(
            out,
            "\n{}. {} - {} - {}",
            index,
            entry.time_label(),
            entry.weapon,
            entry.ammunition
        )?;
        writeln!(out, "   Distance: {} m", request.distance_m)?;
        writeln!(
            out,
            "   Altitudes: {} m -> {} m (difference {} m)",
            request.firer_altitude_m,
            request.target_altitude_m,
            request.altitude_difference_m()
        )?;
        writeln!(out, "   {}", format!("Azimuth: {}", request.azimuth).yellow())?;
        if let Some(first) = entry.outcome.results.first() {
            writeln!(
                out,
                "   {}",
                format!(
                    "Elevation: {:.0} mils | Time: {:.1} s",
                    first.elevation_mils, first.time_s
                )
                .green()
            )?;
        }
    }
    Ok(())
}

pub fn replay_preview(out: &mut impl Write, entry: &HistoryEntry) -> io::Result<()> {
    writeln!(out, "\n{}", "Using data from history:".green())?;
    writeln!(out, "Mortar: {}", entry.weapon)?;
    writeln!(out, "Ammunition: {}", entry.ammunition)?;
    request_lines(out, &entry.request)?;
    writeln!(out, "Azimuth: {}", entry.request.azimuth)
}

pub fn help(out: &mut impl Write) -> io::Result<()> {
    header(out, "HELP")?;
    let topics = [
        ("Quick ammunition swap", "After a calculation, switch ammunition without re-entering coordinates"),
        ("History", "The last 20 calculations can be replayed from the main menu"),
        ("Azimuth", "Enter the correction in any format: 2-0, 1 5, 05 and so on"),
        ("Altitudes", "The height difference between mortar and target is compensated"),
        ("Navigation", "Type 'back' (or 'назад') at any input to return one step; 0 leaves a menu"),
    ];
    for (title, description) in topics {
        writeln!(out, "\n{}", format!("{title}:").yellow())?;
        writeln!(out, "  {description}")?;
    }
    Ok(())
}

/// Per-charge distance coverage, used by the `info` command
pub fn catalogue(out: &mut impl Write, database: &Database) -> io::Result<()> {
    for weapon in &database.weapons {
        writeln!(out, "{}", weapon.label().green().bold())?;
        for ammo in &weapon.ammunition {
            writeln!(out, "  {}", ammo.name.cyan())?;
            for (charge, table) in &ammo.charges {
                match (table.min_distance(), table.max_distance()) {
                    (Some(min), Some(max)) => writeln!(
                        out,
                        "    charge {charge}: {min}..{max} m, dispersion {} m",
                        table.dispersion_m()
                    )?,
                    _ => writeln!(out, "    charge {charge}: no data")?,
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::{VariantFailure, VariantResult};
    use crate::profile::Faction;

    fn weapon() -> WeaponProfile {
        WeaponProfile {
            name: "M252".into(),
            faction: Faction::Nato,
            ammunition: Vec::new(),
        }
    }

    fn render_results(request: &FireRequest, outcome: &CalculationOutcome) -> String {
        let mut out = Vec::new();
        results(&mut out, &weapon(), "M821 HE", request, outcome).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_results_rounding() {
        let outcome = CalculationOutcome {
            results: vec![VariantResult {
                charge: 2,
                elevation_mils: 1234.6,
                time_s: 19.456,
                dispersion_m: 19.0,
                altitude_comp_mils: 3.25,
            }],
            failures: Vec::new(),
        };
        let text = render_results(&FireRequest::new(900, 40, 10), &outcome);
        assert!(text.contains("Charge: 2"));
        assert!(text.contains("1235 mils"));
        assert!(text.contains("19.46 s"));
        assert!(text.contains("3.2 mils") || text.contains("3.3 mils"));
        assert!(text.contains("Altitude difference: 30 m"));
        assert!(text.contains("M252 [NATO]"));
        assert!(!text.contains("Azimuth"));
    }

    #[test]
    fn test_results_show_azimuth_and_failures() {
        let outcome = CalculationOutcome {
            results: Vec::new(),
            failures: vec![VariantFailure {
                charge: 0,
                reason: "distance too long".into(),
            }],
        };
        let request = FireRequest::new(3000, 0, 0).with_azimuth("2-0");
        let text = render_results(&request, &outcome);
        assert!(text.contains("Azimuth: 2-0"));
        assert!(text.contains("charge 0: distance too long"));
        assert!(text.contains("No charge can reach this target"));
    }
}
