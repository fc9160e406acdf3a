//! Versioned binary persistence for mid-fight character state
//!
//! Saves capture the mutable combat state of a character: resources,
//! turn counters, timers, and active effects with their parameter bags.
//! Configuration (levels, equipment, content selections) is not part of
//! the stream; the embedder reconstructs characters from content and then
//! decodes state onto them.
//!
//! The format is little-endian with u32-length-prefixed strings. Version
//! history:
//! - v1: resources, counters, flags, timers, active effects
//! - v2: added `buffered_regen` after the resource block
//! - v3: retired the v2 queued-splash count (readers skip 4 bytes)
//!
//! Decoding an older version than [`SAVE_VERSION`] is always supported;
//! newer versions are rejected.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::warn;

use crate::character::{Character, Timer};
use crate::content::ContentRegistry;
use crate::effect::ActiveEffect;
use crate::types::NextAction;

/// Current save stream version
pub const SAVE_VERSION: u16 = 3;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save stream ended early (wanted {wanted} more bytes)")]
    UnexpectedEof { wanted: usize },
    #[error("save stream contains invalid utf-8 in a string field")]
    InvalidUtf8,
    #[error("unsupported save version {0} (current is {SAVE_VERSION})")]
    UnsupportedVersion(u16),
    #[error("save field out of range: {0}")]
    InvalidField(String),
}

/// Little-endian byte sink
#[derive(Debug, Default)]
pub struct SaveWriter {
    buf: Vec<u8>,
}

impl SaveWriter {
    pub fn new() -> Self {
        SaveWriter::default()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    /// u32 byte length, then the utf-8 bytes
    pub fn write_string(&mut self, value: &str) {
        self.write_u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Little-endian byte source over a borrowed slice
#[derive(Debug)]
pub struct SaveReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SaveReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SaveReader { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], SaveError> {
        if self.pos + len > self.data.len() {
            return Err(SaveError::UnexpectedEof {
                wanted: self.pos + len - self.data.len(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Skip `len` bytes (retired fields from older versions)
    pub fn skip(&mut self, len: usize) -> Result<(), SaveError> {
        self.take(len).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, SaveError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, SaveError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, SaveError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f64(&mut self) -> Result<f64, SaveError> {
        let bytes = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(arr))
    }

    pub fn read_bool(&mut self) -> Result<bool, SaveError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_string(&mut self) -> Result<String, SaveError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SaveError::InvalidUtf8)
    }
}

/// Encode a character's combat state, version header included
pub fn encode_character(character: &Character) -> Vec<u8> {
    let mut writer = SaveWriter::new();
    writer.write_u16(SAVE_VERSION);
    character.encode(&mut writer);
    writer.finish()
}

/// Decode combat state onto an already-configured character.
///
/// The character's existing effects are stripped first so group counts and
/// modifier registrations stay balanced.
pub fn decode_character(
    bytes: &[u8],
    character: &mut Character,
    registry: &ContentRegistry,
) -> Result<(), SaveError> {
    let mut reader = SaveReader::new(bytes);
    let version = reader.read_u16()?;
    if version == 0 || version > SAVE_VERSION {
        return Err(SaveError::UnsupportedVersion(version));
    }
    character.decode(&mut reader, version, registry)
}

fn encode_timer(writer: &mut SaveWriter, timer: &Timer) {
    writer.write_f64(timer.interval_ms());
    writer.write_f64(timer.remaining_ms());
    writer.write_bool(timer.is_running());
}

fn decode_timer(reader: &mut SaveReader) -> Result<Timer, SaveError> {
    let interval = reader.read_f64()?;
    let remaining = reader.read_f64()?;
    let running = reader.read_bool()?;
    Ok(Timer::restore(interval, remaining, running))
}

impl Character {
    /// Write this character's combat state (no version header)
    pub fn encode(&self, writer: &mut SaveWriter) {
        // Resources
        writer.write_f64(self.hitpoints);
        writer.write_f64(self.barrier);
        writer.write_f64(self.buffered_regen);

        // Counters and flags
        writer.write_u32(self.attack_count);
        writer.write_u32(self.turns_taken);
        writer.write_bool(self.is_attacking);
        writer.write_bool(self.first_hit);
        writer.write_bool(self.first_miss);
        writer.write_bool(self.attack_interrupted);

        // Queued action
        writer.write_u8(match self.next_action {
            NextAction::Attack => 0,
            NextAction::Nothing => 1,
        });
        match &self.queued_attack_id {
            Some(id) => {
                writer.write_bool(true);
                writer.write_string(id);
            }
            None => writer.write_bool(false),
        }

        // Timers
        encode_timer(writer, &self.act_timer);
        encode_timer(writer, &self.regen_timer);

        // Active effects
        writer.write_u32(self.active_effects.len() as u32);
        for effect in self.active_effects.values() {
            writer.write_string(&effect.effect_id);
            match effect.remaining_ms {
                Some(remaining) => {
                    writer.write_bool(true);
                    writer.write_f64(remaining);
                }
                None => writer.write_bool(false),
            }
            writer.write_u32(effect.stacks);
            writer.write_f64(effect.dot_elapsed_ms);
            writer.write_u32(effect.params.len() as u32);
            for (name, value) in &effect.params {
                writer.write_string(name);
                writer.write_f64(*value);
            }
        }
    }

    /// Read combat state written by [`Character::encode`] at `version`
    pub fn decode(
        &mut self,
        reader: &mut SaveReader,
        version: u16,
        registry: &ContentRegistry,
    ) -> Result<(), SaveError> {
        self.hitpoints = reader.read_f64()?;
        self.barrier = reader.read_f64()?;
        self.buffered_regen = if version >= 2 { reader.read_f64()? } else { 0.0 };
        if version == 2 {
            // v2 stored a queued-splash count here
            reader.skip(4)?;
        }

        self.attack_count = reader.read_u32()?;
        self.turns_taken = reader.read_u32()?;
        self.is_attacking = reader.read_bool()?;
        self.first_hit = reader.read_bool()?;
        self.first_miss = reader.read_bool()?;
        self.attack_interrupted = reader.read_bool()?;

        self.next_action = match reader.read_u8()? {
            0 => NextAction::Attack,
            1 => NextAction::Nothing,
            other => {
                return Err(SaveError::InvalidField(format!(
                    "next_action tag {other}"
                )))
            }
        };
        self.queued_attack_id = if reader.read_bool()? {
            Some(reader.read_string()?)
        } else {
            None
        };
        // Content may have changed since the save; fall back to the style
        // default rather than fail the whole load
        if let Some(id) = &self.queued_attack_id {
            if registry.attack(id).is_none() {
                warn!(character = %self.id, attack = %id, "saved attack no longer exists; using default");
                self.queued_attack_id = registry
                    .default_attack(self.attack_type)
                    .map(|a| a.id.clone());
                self.attack_count = 0;
                self.is_attacking = false;
            }
        }

        self.act_timer = decode_timer(reader)?;
        self.regen_timer = decode_timer(reader)?;

        // Strip current effects so group counts and modifier sources
        // unwind, then restore the saved set without rolls or events
        self.remove_all_effects(registry);
        self.events.clear();
        let effect_count = reader.read_u32()?;
        for _ in 0..effect_count {
            let effect_id = reader.read_string()?;
            let remaining_ms = if reader.read_bool()? {
                Some(reader.read_f64()?)
            } else {
                None
            };
            let stacks = reader.read_u32()?;
            let dot_elapsed_ms = reader.read_f64()?;
            let param_count = reader.read_u32()?;
            let mut params = BTreeMap::new();
            for _ in 0..param_count {
                let name = reader.read_string()?;
                let value = reader.read_f64()?;
                params.insert(name, value);
            }

            let Some(def) = registry.effect(&effect_id) else {
                warn!(character = %self.id, effect = %effect_id, "saved effect no longer exists; dropping it");
                continue;
            };
            let active = ActiveEffect {
                effect_id: effect_id.clone(),
                remaining_ms,
                stacks,
                params,
                dot_elapsed_ms,
            };
            if !def.modifiers.is_empty() {
                self.modifiers
                    .add_source(active.modifier_source_id(), def.modifiers.clone());
            }
            for group_id in &def.groups {
                if self.effect_groups.increment(group_id) {
                    if let Some(group_def) = registry.effect_group(group_id) {
                        if !group_def.modifiers.is_empty() {
                            self.modifiers.add_source(
                                group_def.modifier_source_id(),
                                group_def.modifiers.clone(),
                            );
                        }
                    }
                }
            }
            self.active_effects.insert(effect_id, active);
        }

        self.stats.invalidate();
        self.render = crate::character::RenderFlags::all();
        Ok(())
    }
}
