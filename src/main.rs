use badguy::audio::{AudioManager, AudioPlugin};
use badguy::components::{EnemyActor, LevelStats};
use badguy::events::{
    GameEventBus, GameEventsPlugin, EFFECT_SPAWNED, ENEMY_KILLED, ENEMY_REMOVED, ENEMY_SPAWNED, SFX,
};
use badguy::level::LevelFile;
use badguy::plugin::EnemyPlugin;
use badguy::scripting::{LevelScripts, ScriptingPlugin};
use bevy::prelude::*;

const DEFAULT_TICKS: u32 = 600;

fn level_path(args: &[String]) -> Option<String> {
    std::env::var("BADGUY_LEVEL")
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| args.iter().skip(1).find(|a| !a.starts_with("--")).cloned())
}

fn load_level(args: &[String]) -> LevelFile {
    if let Some(path) = level_path(args) {
        match LevelFile::load(&path) {
            Ok(level) => {
                println!("[Badguy] Loaded level from {}", path);
                return level;
            }
            Err(e) => eprintln!("[Badguy] Failed to load level {}", e),
        }
    }
    match LevelFile::embedded() {
        Some(Ok(level)) => {
            println!("[Badguy] Using embedded level");
            return level;
        }
        Some(Err(e)) => eprintln!("[Badguy] Embedded level invalid: {}", e),
        None => {}
    }
    println!("[Badguy] Using built-in level");
    LevelFile::builtin()
}

fn tick_count(args: &[String]) -> u32 {
    args.iter()
        .find_map(|a| a.strip_prefix("--ticks="))
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TICKS)
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let ticks = tick_count(&args);
    let level = load_level(&args);

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(bevy::log::LogPlugin::default())
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .add_plugins(GameEventsPlugin)
        .add_plugins(AudioPlugin)
        .add_plugins(ScriptingPlugin)
        .add_plugins(EnemyPlugin);
    app.finish();
    app.cleanup();
    level.install(app.world_mut());

    // Step the fixed schedules directly so the run does not depend on wall time.
    let world = app.world_mut();
    let step = world.resource::<Time<Fixed>>().timestep();
    for _ in 0..ticks {
        world.resource_mut::<Time<Fixed>>().advance_by(step);
        world.run_schedule(FixedPreUpdate);
        world.run_schedule(FixedUpdate);
        world.run_schedule(Update);
    }

    let alive = world.query::<&EnemyActor>().iter(world).count();
    let stats = world.resource::<LevelStats>();
    println!(
        "[Badguy] {} ticks ({:.1}s): {} kills of {} counted enemies, {} enemies left",
        ticks,
        step.mul_f64(ticks as f64).as_secs_f64(),
        stats.kills,
        stats.counted_enemies,
        alive
    );
    let bus = world.resource::<GameEventBus>();
    for name in [ENEMY_SPAWNED, ENEMY_KILLED, ENEMY_REMOVED, EFFECT_SPAWNED, SFX] {
        println!("[Badguy]   {:<15} {}", name, bus.total(name));
    }
    println!(
        "[Badguy]   sounds played   {}",
        world.resource::<AudioManager>().recent_events.len()
    );
    let scripts = world.resource::<LevelScripts>();
    println!(
        "[Badguy]   scripts run     {} ({} errors)",
        scripts.completed_runs,
        scripts.errors.len()
    );
    if let Ok(vars) = serde_json::to_string(&scripts.vars) {
        println!("[Badguy]   script vars     {}", vars);
    }
}
