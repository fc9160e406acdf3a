//! Example Fight - a headless seeded duel demonstrating combat_core
//!
//! Builds two characters from the built-in content set, runs the fight
//! to the death under a fixed seed, and prints every combat event. Run
//! with a seed argument to watch a different fight:
//!
//! ```text
//! cargo run -p example_fight -- 42
//! ```

use combat_core::{
    AttackType, Character, CombatEvent, CombatantSide, ContentRegistry, EquipmentStats, Fight,
    GameConstants, GameRng, SkillLevels, SplashType,
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

const TICK_MS: f64 = 100.0;
const MAX_TICKS: u32 = 200_000;

fn build_warrior() -> Character {
    let mut equipment = EquipmentStats::new();
    equipment.melee_attack_bonus = 40.0;
    equipment.strength_bonus = 60.0;
    equipment.melee_defence_bonus = 30.0;
    equipment.attack_speed_ms = 3000.0;
    Character::new("Warrior")
        .with_levels(SkillLevels::uniform(60))
        .with_equipment(equipment)
        .using_attack_type(AttackType::Melee)
        .with_available_attack("core:melee_attack", 6)
        .with_available_attack("core:double_slash", 3)
        .with_available_attack("core:crushing_blow", 1)
}

fn build_mage() -> Character {
    let mut equipment = EquipmentStats::new();
    equipment.magic_attack_bonus = 45.0;
    equipment.magic_damage_bonus = 15.0;
    equipment.magic_defence_bonus = 25.0;
    equipment.barrier_bonus = 12.0;
    Character::new("Mage")
        .with_levels(SkillLevels::uniform(55))
        .with_equipment(equipment)
        .using_attack_type(AttackType::Magic)
        .with_spell("core:fire_bolt")
        .with_curse("core:weaken")
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let seed: u64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(7);
    println!("=== Example Fight (seed {seed}) ===\n");

    let registry = ContentRegistry::with_defaults();
    let mut fight = Fight::new(build_warrior(), build_mage(), GameConstants::default());
    let mut rng = GameRng(ChaCha8Rng::seed_from_u64(seed));

    fight.start(&registry, &mut rng);
    print_status(&fight);

    let mut elapsed_ms = 0.0;
    let mut ticks = 0u32;
    while !fight.is_over() && ticks < MAX_TICKS {
        fight.tick(TICK_MS, &registry, &mut rng);
        elapsed_ms += TICK_MS;
        ticks += 1;
        for event in fight.drain_events() {
            print_event(&fight, elapsed_ms, &event);
        }
    }

    println!();
    match fight.winner() {
        Some(winner) => {
            println!(
                "{} wins after {:.1}s!",
                fight.character(winner).id,
                elapsed_ms / 1000.0
            );
            print_status(&fight);
        }
        None => println!("No winner after {:.1}s of fighting.", elapsed_ms / 1000.0),
    }
}

fn print_status(fight: &Fight) {
    for side in [CombatantSide::Attacker, CombatantSide::Defender] {
        let character = fight.character(side);
        let stats = character.stats.peek();
        println!(
            "  {:<8} HP {:>6.0}/{:<6.0} barrier {:>4.0} | max hit {:>4.0} | hit chance {:>5.1}%",
            character.id,
            character.hitpoints,
            stats.max_hitpoints,
            character.barrier,
            stats.max_hit,
            stats.hit_chance,
        );
    }
}

fn print_event(fight: &Fight, elapsed_ms: f64, event: &CombatEvent) {
    let name = |side: &CombatantSide| fight.character(*side).id.as_str();
    let stamp = format!("[{:>7.1}s]", elapsed_ms / 1000.0);
    match event {
        CombatEvent::Splash {
            side,
            splash,
            amount,
        } => {
            let label = match splash {
                SplashType::Attack => "hit",
                SplashType::Crit => "CRIT",
                SplashType::Miss => "miss",
                SplashType::Immune => "immune",
                SplashType::Dot => "burn",
                SplashType::Reflect => "reflect",
                SplashType::Heal => "heal",
                SplashType::Regen => "regen",
            };
            println!("{stamp} {:<8} {label} {amount:.0}", name(side));
        }
        CombatEvent::AttackStarted { side, attack_id } => {
            println!("{stamp} {:<8} uses {attack_id}", name(side));
        }
        CombatEvent::EffectApplied {
            side,
            effect_id,
            reapplied,
        } => {
            let verb = if *reapplied { "refreshes" } else { "gains" };
            println!("{stamp} {:<8} {verb} {effect_id}", name(side));
        }
        CombatEvent::EffectRemoved { side, effect_id } => {
            println!("{stamp} {:<8} loses {effect_id}", name(side));
        }
        CombatEvent::BarrierBroken { side } => {
            println!("{stamp} {:<8} barrier breaks!", name(side));
        }
        CombatEvent::AttackInterrupted { side } => {
            println!("{stamp} {:<8} is interrupted", name(side));
        }
        CombatEvent::Died { side } => {
            println!("{stamp} {:<8} falls", name(side));
        }
        // Queue bookkeeping and group transitions are too chatty for the log
        CombatEvent::ActionQueued { .. }
        | CombatEvent::EffectGroupApplied { .. }
        | CombatEvent::EffectGroupRemoved { .. } => {}
    }
}
