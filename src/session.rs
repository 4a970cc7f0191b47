//! Interactive session: an explicit state machine over navigation stages.
//!
//! The session loop reads one stage at a time, asks the user for what that
//! stage needs, and moves to the next stage. Going back pops a bounded
//! back-stack instead of re-entering the caller, so navigation depth never
//! grows the call stack.

use std::collections::VecDeque;
use std::io::Write;

use log::{debug, warn};

use crate::calculation::{compute, CalculationOutcome, FireRequest};
use crate::constants::{
    BACK_STACK_LIMIT, DEFAULT_ALTITUDE_M, DEFAULT_AZIMUTH, MAX_ALTITUDE_M, MAX_TARGET_DISTANCE_M,
    MIN_ALTITUDE_M, MIN_TARGET_DISTANCE_M,
};
use crate::error::{DataError, SessionError};
use crate::history::{HistoryEntry, HistoryStore};
use crate::input::{is_back_token, Entry, LineSource, NumericField};
use crate::profile::{AmmunitionProfile, Database, WeaponProfile};
use crate::render;

const DISTANCE_FIELD: NumericField =
    NumericField::new("Distance to target (m)", MIN_TARGET_DISTANCE_M, MAX_TARGET_DISTANCE_M);
const FIRER_ALTITUDE_FIELD: NumericField =
    NumericField::new("Mortar altitude (m)", MIN_ALTITUDE_M, MAX_ALTITUDE_M).with_default(DEFAULT_ALTITUDE_M);
const TARGET_ALTITUDE_FIELD: NumericField =
    NumericField::new("Target altitude (m)", MIN_ALTITUDE_M, MAX_ALTITUDE_M).with_default(DEFAULT_ALTITUDE_M);

const AZIMUTH_PROMPT: &str =
    "Azimuth correction, e.g. '2-0', '1 5' or '0' [default: 0] ('back' to return): ";
const CONFIRM_PROMPT: &str = "Use this data? (y/n) [default: y]: ";
const PAUSE_PROMPT: &str = "Press Enter to continue...";

/// Navigation stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    MainMenu,
    SelectWeapon,
    SelectAmmunition,
    InputDistance,
    InputAltitudes,
    InputAzimuth,
    Compute,
    ShowResults,
    SwapAmmunition,
    History,
    Help,
    Exit,
}

impl Stage {
    /// Stages that collect a value typed by the user
    pub fn collects_input(&self) -> bool {
        matches!(
            self,
            Stage::InputDistance | Stage::InputAltitudes | Stage::InputAzimuth
        )
    }
}

/// What a stage handler asks the loop to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// Move on, remembering the current stage for "back"
    Forward(Stage),
    /// Return to the previous stage
    Back,
    /// Jump and forget the navigation path
    Reset(Stage),
    Stay,
}

/// Recently visited stages, oldest dropped past the limit
#[derive(Debug, Clone)]
struct BackStack {
    stages: VecDeque<Stage>,
    limit: usize,
}

impl BackStack {
    fn new(limit: usize) -> Self {
        Self {
            stages: VecDeque::with_capacity(limit),
            limit: limit.max(1),
        }
    }

    fn push(&mut self, stage: Stage) {
        if self.stages.len() == self.limit {
            self.stages.pop_front();
        }
        self.stages.push_back(stage);
    }

    fn pop(&mut self) -> Option<Stage> {
        self.stages.pop_back()
    }

    fn clear(&mut self) {
        self.stages.clear();
    }

    fn len(&self) -> usize {
        self.stages.len()
    }
}

/// Partially collected calculation inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Draft {
    weapon: Option<usize>,
    ammunition: Option<usize>,
    distance_m: Option<u32>,
    firer_altitude_m: Option<i32>,
    target_altitude_m: Option<i32>,
    azimuth: Option<String>,
}

impl Draft {
    fn from_request(weapon: usize, ammunition: usize, request: &FireRequest) -> Self {
        Self {
            weapon: Some(weapon),
            ammunition: Some(ammunition),
            distance_m: Some(request.distance_m),
            firer_altitude_m: Some(request.firer_altitude_m),
            target_altitude_m: Some(request.target_altitude_m),
            azimuth: Some(request.azimuth.clone()),
        }
    }

    fn request(&self) -> Option<FireRequest> {
        Some(
            FireRequest::new(self.distance_m?, self.firer_altitude_m?, self.target_altitude_m?)
                .with_azimuth(self.azimuth.clone().unwrap_or_else(|| DEFAULT_AZIMUTH.to_string())),
        )
    }

    /// Forget the value collected by `stage`
    fn discard(&mut self, stage: Stage) {
        match stage {
            Stage::SelectWeapon => self.weapon = None,
            Stage::SelectAmmunition => self.ammunition = None,
            Stage::InputDistance => self.distance_m = None,
            Stage::InputAltitudes => {
                self.firer_altitude_m = None;
                self.target_altitude_m = None;
            }
            Stage::InputAzimuth => self.azimuth = None,
            _ => {}
        }
    }
}

/// Last computed selection, used for ammunition swaps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub weapon: usize,
    pub ammunition: usize,
    pub request: FireRequest,
}

/// Interactive calculator session
pub struct Session<'db> {
    database: &'db Database,
    history: HistoryStore,
    stage: Stage,
    back_stack: BackStack,
    draft: Draft,
    last: Option<Selection>,
    last_outcome: Option<CalculationOutcome>,
}

impl<'db> Session<'db> {
    pub fn new(database: &'db Database) -> Self {
        Self {
            database,
            history: HistoryStore::new(),
            stage: Stage::MainMenu,
            back_stack: BackStack::new(BACK_STACK_LIMIT),
            draft: Draft::default(),
            last: None,
            last_outcome: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn last_selection(&self) -> Option<&Selection> {
        self.last.as_ref()
    }

    pub fn last_outcome(&self) -> Option<&CalculationOutcome> {
        self.last_outcome.as_ref()
    }

    /// Run until the user exits, input ends, or Ctrl-C is pressed.
    ///
    /// Errors inside a stage are reported and the session returns to the
    /// main menu. Only output failures are returned to the caller.
    pub fn run<I: LineSource, W: Write>(&mut self, input: &mut I, out: &mut W) -> Result<(), SessionError> {
        loop {
            if self.stage == Stage::Exit {
                render::farewell(out)?;
                return Ok(());
            }

            match self.step(input, out) {
                Ok(transition) => self.apply(transition),
                Err(SessionError::Io(e)) => return Err(SessionError::Io(e)),
                Err(e) if e.ends_session() => {
                    debug!("session ended at {:?}: {e}", self.stage);
                    if matches!(e, SessionError::Interrupted) {
                        render::notice(out, "\nInterrupted by user")?;
                    }
                    self.stage = Stage::Exit;
                }
                Err(e) => {
                    warn!("stage {:?} failed: {e}", self.stage);
                    render::error(out, &format!("\nError: {e}"))?;
                    self.apply(Transition::Reset(Stage::MainMenu));
                }
            }
        }
    }

    fn apply(&mut self, transition: Transition) {
        let from = self.stage;
        match transition {
            Transition::Forward(next) => {
                self.back_stack.push(from);
                self.stage = next;
            }
            Transition::Back => {
                self.draft.discard(from);
                self.stage = self.back_stack.pop().unwrap_or(Stage::MainMenu);
            }
            Transition::Reset(next) => {
                self.back_stack.clear();
                self.stage = next;
            }
            Transition::Stay => {}
        }
        if from != self.stage {
            debug!("{from:?} -> {:?} (back-stack {})", self.stage, self.back_stack.len());
        }
    }

    fn step<I: LineSource, W: Write>(&mut self, input: &mut I, out: &mut W) -> Result<Transition, SessionError> {
        match self.stage {
            Stage::MainMenu => self.main_menu(input, out),
            Stage::SelectWeapon => self.select_weapon(input, out),
            Stage::SelectAmmunition => self.select_ammunition(input, out),
            Stage::InputDistance => self.input_distance(input, out),
            Stage::InputAltitudes => self.input_altitudes(input, out),
            Stage::InputAzimuth => self.input_azimuth(input, out),
            Stage::Compute => self.compute(),
            Stage::ShowResults => self.show_results(input, out),
            Stage::SwapAmmunition => self.swap_ammunition(input, out),
            Stage::History => self.browse_history(input, out),
            Stage::Help => self.help(input, out),
            Stage::Exit => Ok(Transition::Stay),
        }
    }

    fn main_menu<I: LineSource, W: Write>(&mut self, input: &mut I, out: &mut W) -> Result<Transition, SessionError> {
        render::main_menu(out)?;
        Ok(match read_menu(input, out, "\nYour choice", 3)? {
            None => Transition::Reset(Stage::Exit),
            Some(1) => {
                self.draft = Draft::default();
                Transition::Forward(Stage::SelectWeapon)
            }
            Some(2) => Transition::Forward(Stage::History),
            Some(_) => Transition::Forward(Stage::Help),
        })
    }

    fn select_weapon<I: LineSource, W: Write>(&mut self, input: &mut I, out: &mut W) -> Result<Transition, SessionError> {
        let count = self.database.weapons.len();
        if count == 0 {
            render::error(out, "No range data loaded")?;
            return Ok(Transition::Back);
        }
        render::weapon_list(out, self.database)?;
        Ok(match read_menu(input, out, "\nSelect mortar", count)? {
            None => Transition::Back,
            Some(choice) => {
                self.draft.weapon = Some(choice - 1);
                self.draft.ammunition = None;
                Transition::Forward(Stage::SelectAmmunition)
            }
        })
    }

    fn select_ammunition<I: LineSource, W: Write>(
        &mut self,
        input: &mut I,
        out: &mut W,
    ) -> Result<Transition, SessionError> {
        let weapon = self.weapon(self.draft.weapon)?;
        render::ammunition_list(out, weapon)?;
        Ok(match read_menu(input, out, "\nSelect ammunition", weapon.ammunition.len())? {
            None => Transition::Back,
            Some(choice) => {
                self.draft.ammunition = Some(choice - 1);
                Transition::Forward(Stage::InputDistance)
            }
        })
    }

    fn input_distance<I: LineSource, W: Write>(&mut self, input: &mut I, out: &mut W) -> Result<Transition, SessionError> {
        render::subheader(out, "Firing parameters")?;
        Ok(match read_number(input, out, &DISTANCE_FIELD)? {
            Entry::Back => Transition::Back,
            Entry::Value(distance) => {
                self.draft.distance_m = Some(to_u32(distance)?);
                Transition::Forward(Stage::InputAltitudes)
            }
        })
    }

    fn input_altitudes<I: LineSource, W: Write>(&mut self, input: &mut I, out: &mut W) -> Result<Transition, SessionError> {
        let firer = match read_number(input, out, &FIRER_ALTITUDE_FIELD)? {
            Entry::Back => return Ok(Transition::Back),
            Entry::Value(v) => to_i32(v)?,
        };
        let target = match read_number(input, out, &TARGET_ALTITUDE_FIELD)? {
            Entry::Back => return Ok(Transition::Back),
            Entry::Value(v) => to_i32(v)?,
        };
        self.draft.firer_altitude_m = Some(firer);
        self.draft.target_altitude_m = Some(target);
        Ok(Transition::Forward(Stage::InputAzimuth))
    }

    fn input_azimuth<I: LineSource, W: Write>(&mut self, input: &mut I, out: &mut W) -> Result<Transition, SessionError> {
        writeln!(out)?;
        let raw = input.read_line(AZIMUTH_PROMPT)?;
        if is_back_token(&raw) {
            return Ok(Transition::Back);
        }
        let azimuth = if raw.trim().is_empty() {
            DEFAULT_AZIMUTH.to_string()
        } else {
            raw
        };
        self.draft.azimuth = Some(azimuth);
        Ok(Transition::Forward(Stage::Compute))
    }

    /// Run the calculation for the drafted request and archive it.
    fn compute(&mut self) -> Result<Transition, SessionError> {
        let (weapon_idx, ammo_idx) = match (self.draft.weapon, self.draft.ammunition) {
            (Some(w), Some(a)) => (w, a),
            _ => return Err(SessionError::Internal("no weapon or ammunition selected".into())),
        };
        let request = self
            .draft
            .request()
            .ok_or_else(|| SessionError::Internal("incomplete fire request".into()))?;

        let weapon = self.weapon(Some(weapon_idx))?;
        let ammunition = ammunition_at(weapon, ammo_idx)?;
        let outcome = compute(ammunition, &request);

        self.history.append(HistoryEntry::new(
            weapon.name.clone(),
            ammunition.name.clone(),
            request.clone(),
            outcome.clone(),
        ));
        self.last = Some(Selection {
            weapon: weapon_idx,
            ammunition: ammo_idx,
            request,
        });
        self.last_outcome = Some(outcome);
        Ok(Transition::Reset(Stage::ShowResults))
    }

    fn show_results<I: LineSource, W: Write>(&mut self, input: &mut I, out: &mut W) -> Result<Transition, SessionError> {
        let (selection, outcome) = match (&self.last, &self.last_outcome) {
            (Some(s), Some(o)) => (s, o),
            _ => return Err(SessionError::Internal("no calculation to show".into())),
        };
        let weapon = self.weapon(Some(selection.weapon))?;
        let ammunition = ammunition_at(weapon, selection.ammunition)?;
        render::results(out, weapon, &ammunition.name, &selection.request, outcome)?;
        render::result_menu(out)?;

        Ok(match read_menu(input, out, "\nYour choice", 3)? {
            None => Transition::Reset(Stage::Exit),
            Some(1) => Transition::Forward(Stage::SwapAmmunition),
            Some(2) => {
                self.draft = Draft::default();
                Transition::Reset(Stage::SelectWeapon)
            }
            Some(_) => Transition::Reset(Stage::MainMenu),
        })
    }

    /// Pick another ammunition for the last request; coordinates are kept.
    fn swap_ammunition<I: LineSource, W: Write>(
        &mut self,
        input: &mut I,
        out: &mut W,
    ) -> Result<Transition, SessionError> {
        let selection = self
            .last
            .clone()
            .ok_or_else(|| SessionError::Internal("nothing to swap".into()))?;
        let weapon = self.weapon(Some(selection.weapon))?;
        render::swap_menu(out, weapon, &selection.request)?;

        Ok(match read_menu(input, out, "\nSelect new ammunition", weapon.ammunition.len())? {
            None => Transition::Reset(Stage::MainMenu),
            Some(choice) => {
                self.draft = Draft::from_request(selection.weapon, choice - 1, &selection.request);
                Transition::Forward(Stage::Compute)
            }
        })
    }

    fn browse_history<I: LineSource, W: Write>(
        &mut self,
        input: &mut I,
        out: &mut W,
    ) -> Result<Transition, SessionError> {
        if self.history.is_empty() {
            render::notice(out, "\nCalculation history is empty")?;
            input.read_line(PAUSE_PROMPT)?;
            return Ok(Transition::Back);
        }

        render::history_list(out, &self.history)?;
        let index = match read_menu(input, out, "\nSelect calculation (0 - back)", self.history.len())? {
            None => return Ok(Transition::Back),
            Some(index) => index,
        };
        let entry = match self.history.get(index) {
            Ok(entry) => entry.clone(),
            Err(e) => {
                render::error(out, &e.to_string())?;
                return Ok(Transition::Stay);
            }
        };

        render::replay_preview(out, &entry)?;
        let answer = input.read_line(CONFIRM_PROMPT)?;
        if !is_confirmation(&answer) {
            render::notice(out, "Preset discarded")?;
            return Ok(Transition::Stay);
        }

        let (weapon_idx, ammo_idx) = self.locate(&entry.weapon, &entry.ammunition)?;
        self.draft = Draft::from_request(weapon_idx, ammo_idx, &entry.request);
        Ok(Transition::Forward(Stage::Compute))
    }

    fn help<I: LineSource, W: Write>(&mut self, input: &mut I, out: &mut W) -> Result<Transition, SessionError> {
        render::help(out)?;
        writeln!(out)?;
        input.read_line(PAUSE_PROMPT)?;
        Ok(Transition::Back)
    }

    fn weapon(&self, index: Option<usize>) -> Result<&'db WeaponProfile, SessionError> {
        index
            .and_then(|i| self.database.weapons.get(i))
            .ok_or_else(|| SessionError::Internal("no weapon selected".into()))
    }

    /// Menu positions of a weapon/ammunition pair stored by name
    fn locate(&self, weapon: &str, ammunition: &str) -> Result<(usize, usize), DataError> {
        let weapon_idx = self
            .database
            .weapons
            .iter()
            .position(|w| w.name == weapon)
            .ok_or_else(|| DataError::UnknownWeapon(weapon.to_string()))?;
        let ammo_idx = self.database.weapons[weapon_idx]
            .ammunition
            .iter()
            .position(|a| a.name == ammunition)
            .ok_or_else(|| DataError::UnknownAmmunition {
                weapon: weapon.to_string(),
                ammunition: ammunition.to_string(),
            })?;
        Ok((weapon_idx, ammo_idx))
    }
}

fn ammunition_at(weapon: &WeaponProfile, index: usize) -> Result<&AmmunitionProfile, SessionError> {
    weapon
        .ammunition
        .get(index)
        .ok_or_else(|| SessionError::Internal(format!("no ammunition #{index} for {}", weapon.name)))
}

/// Numbered menu prompt; `None` for 0 or a back token.
fn read_menu<I: LineSource, W: Write>(
    input: &mut I,
    out: &mut W,
    label: &'static str,
    max: usize,
) -> Result<Option<usize>, SessionError> {
    let field = NumericField::new(label, 0, max as i64);
    match read_number(input, out, &field)? {
        Entry::Back | Entry::Value(0) => Ok(None),
        Entry::Value(choice) => Ok(Some(choice as usize)),
    }
}

/// Prompt until the input is a back token or a valid value for `field`.
fn read_number<I: LineSource, W: Write>(
    input: &mut I,
    out: &mut W,
    field: &NumericField,
) -> Result<Entry<i64>, SessionError> {
    let prompt = field.prompt(false);
    loop {
        let raw = input.read_line(&prompt)?;
        if is_back_token(&raw) {
            return Ok(Entry::Back);
        }
        match field.parse(&raw) {
            Ok(value) => return Ok(Entry::Value(value)),
            Err(e) => {
                debug!("rejected {raw:?} for {}: {e}", field.label);
                render::error(out, &capitalize(&e.to_string()))?;
            }
        }
    }
}

fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn to_u32(value: i64) -> Result<u32, SessionError> {
    u32::try_from(value).map_err(|_| SessionError::Internal(format!("{value} out of range")))
}

fn to_i32(value: i64) -> Result<i32, SessionError> {
    i32::try_from(value).map_err(|_| SessionError::Internal(format!("{value} out of range")))
}
