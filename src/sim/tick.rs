//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Within a tick:
//! turret and emitters act, chains move, sinks consume, projectiles and chains
//! collide, and finally the cascade scan runs. Chains emptied along the way are
//! swept after each pass, never while a pass is walking the collection.

use glam::Vec2;

use super::matching::{self, CascadeAction, ContactOutcome, ShotOutcome};
use super::state::{GameEvent, GamePhase, GameState};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Point the turret at this position (mouse)
    pub aim: Option<Vec2>,
    /// Fire the held token
    pub fire: bool,
    /// Exchange held and reserve tokens
    pub swap: bool,
    /// Pause toggle
    pub pause: bool,
    /// Split the first chain at this index (debug)
    pub split_at: Option<usize>,
    /// Added to the base chain speed (debug)
    pub speed_delta: f32,
    /// Clear the board and start the level over
    pub restart: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    if input.restart {
        state.restart();
        return;
    }

    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            _ => {}
        }
    }

    match state.phase {
        GamePhase::Paused | GamePhase::LevelClear => return,
        _ => {}
    }

    state.time_ticks += 1;

    if input.speed_delta != 0.0 {
        let speed = (state.settings.base_chain_speed + input.speed_delta).max(0.0);
        state.settings.base_chain_speed = speed;
        log::debug!("Base chain speed now {}", speed);
    }

    update_turret(state, input);
    if let Some(index) = input.split_at {
        split_first_chain(state, index);
    }
    emit_chains(state);
    motivate_chains(state);

    // Movement
    for chain in &mut state.chains {
        if let Some(path) = state.paths.get(chain.path_id) {
            chain.update(path);
        }
    }
    advance_projectiles(state);

    consume_at_sinks(state);

    resolve_projectile_hits(state);
    resolve_chain_contacts(state);

    if state.phase == GamePhase::Playing {
        scan_cascades(state);
        check_zooma(state);
        check_level_clear(state);
    }
}

fn update_turret(state: &mut GameState, input: &TickInput) {
    state.turret.update(&mut state.palette);
    if state.phase != GamePhase::Playing {
        return;
    }

    if let Some(aim) = input.aim {
        state.turret.aim_at(aim);
    }
    if input.swap {
        state.turret.swap();
    }
    if input.fire {
        let speed = state.settings.projectile_speed;
        let cooldown = state.settings.shot_cooldown_ticks;
        if let Some(projectile) = state.turret.shoot(speed, cooldown) {
            state.projectiles.push(projectile);
        }
    }
}

/// Developer split: cut the first chain and leave its front part standing
fn split_first_chain(state: &mut GameState, index: usize) {
    let Some(first) = state.chains.first() else {
        return;
    };
    if index >= first.len() {
        return;
    }

    let id = state.ids.next_chain_id();
    let first = &mut state.chains[0];
    if let Some(rear) = first.split(index, id) {
        first.halt();
        state.chains.push(rear);
    }
}

fn emit_chains(state: &mut GameState) {
    if state.phase != GamePhase::Playing {
        return;
    }
    let push_bonus = state.settings.insertion_push_bonus;
    for emitter in &mut state.emitters {
        if emitter.can_emit(&state.chains) {
            let id = state.ids.next_chain_id();
            let chain = emitter.emit(id, &mut state.palette).with_push_bonus(push_bonus);
            state.chains.push(chain);
        }
    }
}

/// The chain farthest from the sink on each path pushes at base speed.
/// After a loss every chain rushes to the sink.
fn motivate_chains(state: &mut GameState) {
    if state.phase == GamePhase::GameOver {
        let speed = state.settings.game_over_speed();
        for chain in &mut state.chains {
            chain.motivate(speed);
        }
        return;
    }

    for (path_id, path) in state.paths.iter().enumerate() {
        let order = matching::chains_by_sink_distance(&state.chains, path_id, path);
        if let Some(&pusher) = order.last() {
            state.chains[pusher].motivate(state.settings.base_chain_speed);
        }
    }
}

fn advance_projectiles(state: &mut GameState) {
    let bounds = state.settings.bounds;
    for projectile in &mut state.projectiles {
        projectile.advance();
    }

    let before = state.projectiles.len();
    state.projectiles.retain(|p| p.in_bounds(&bounds));
    if state.projectiles.len() < before {
        state.scoreboard.reset_streak();
    }
}

fn consume_at_sinks(state: &mut GameState) {
    let mut consumed = Vec::new();
    for sink in &state.sinks {
        for chain in &mut state.chains {
            if sink.reaches(chain) {
                chain.remove(0);
                consumed.push(chain.id);
            }
        }
    }
    state.chains.retain(|c| !c.is_empty());

    if consumed.is_empty() {
        return;
    }
    for chain_id in consumed {
        state.push_event(GameEvent::Consumed { chain_id });
    }
    if state.phase != GamePhase::GameOver {
        enter_game_over(state);
    }
}

fn enter_game_over(state: &mut GameState) {
    state.phase = GamePhase::GameOver;
    for emitter in &mut state.emitters {
        emitter.deactivate();
    }
    state.turret.die();
    state.projectiles.clear();
    state.push_event(GameEvent::GameOver);
    log::info!(
        "Game over at tick {} with score {}",
        state.time_ticks,
        state.scoreboard.score
    );
}

/// Land projectiles on the first chain they touch
fn resolve_projectile_hits(state: &mut GameState) {
    let threshold = state.settings.match_threshold;
    let projectiles = std::mem::take(&mut state.projectiles);

    for projectile in projectiles {
        let hit = state.chains.iter().enumerate().find_map(|(index, chain)| {
            let path = state.paths.get(chain.path_id)?;
            chain
                .get_insertion_point(&projectile.token, path)
                .map(|insertion| (index, insertion))
        });
        let Some((index, insertion)) = hit else {
            state.projectiles.push(projectile);
            continue;
        };

        let chain = &mut state.chains[index];
        let chain_id = chain.id;
        match matching::resolve_shot(chain, projectile.token, insertion, threshold, &mut state.ids) {
            ShotOutcome::Inserted { index } => {
                state.scoreboard.reset_streak();
                state.push_event(GameEvent::Inserted { chain_id, index });
            }
            ShotOutcome::Missed => {}
            ShotOutcome::Matched { match_count, rear } => {
                state.scoreboard.reset_combo();
                let score = state.scoreboard.record_shot_match(match_count);
                log::debug!("Shot match on chain {}: {}", chain_id, score.message());
                state.push_event(GameEvent::Matched { chain_id, score });
                if let Some(rear) = rear {
                    state.chains.push(rear);
                }
            }
        }
    }

    state.chains.retain(|c| !c.is_empty());
}

/// Merge or match every touching pair of chains on a shared path
fn resolve_chain_contacts(state: &mut GameState) {
    let threshold = state.settings.match_threshold;
    let mut events = Vec::new();

    for j in 1..state.chains.len() {
        for i in 0..j {
            let (left, right) = state.chains.split_at_mut(j);
            let (a, b) = (&mut left[i], &mut right[0]);
            if a.path_id != b.path_id || a.is_empty() || b.is_empty() {
                continue;
            }
            let Some(path) = state.paths.get(a.path_id) else {
                continue;
            };

            match matching::resolve_contact(a, b, path, threshold) {
                None => {}
                Some(ContactOutcome::Combo {
                    chain_id,
                    match_count,
                }) => {
                    let score = state.scoreboard.record_combo(match_count);
                    log::debug!("Combo on chain {}: {}", chain_id, score.message());
                    events.push(GameEvent::Combo { chain_id, score });
                }
                Some(ContactOutcome::Merged {
                    kept,
                    absorbed,
                    head_on,
                }) => {
                    if head_on {
                        state.scoreboard.reset_combo();
                    }
                    events.push(GameEvent::Merged { kept, absorbed });
                }
            }
        }
    }

    state.chains.retain(|c| !c.is_empty());
    for event in events {
        state.push_event(event);
    }
}

fn scan_cascades(state: &mut GameState) {
    let reverse_speed = state.settings.reverse_speed();
    let actions = matching::scan_cascades(&mut state.chains, &state.paths, reverse_speed);
    for action in actions {
        state.push_event(match action {
            CascadeAction::Reversed { chain_id } => GameEvent::Reversed { chain_id },
            CascadeAction::Halted { chain_id } => GameEvent::Halted { chain_id },
        });
    }
}

/// Once progress fills, stop the emitters and only offer colours still in play
fn check_zooma(state: &mut GameState) {
    if !state.did_zooma && state.scoreboard.is_progress_full() {
        state.did_zooma = true;
        for emitter in &mut state.emitters {
            emitter.deactivate();
        }
        state.push_event(GameEvent::Zooma);
        log::info!("Zooma! Progress full at score {}", state.scoreboard.score);
    }

    if state.did_zooma {
        let colors = state.colors_in_play();
        state.palette.restrict(colors);
    }
}

fn check_level_clear(state: &mut GameState) {
    if state.did_zooma && state.token_count() == 0 {
        state.phase = GamePhase::LevelClear;
        state.push_event(GameEvent::LevelCleared);
        log::info!("Level cleared with score {}", state.scoreboard.score);
    }
}
