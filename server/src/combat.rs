//! Combat resolution.
//!
//! Hits are resolved entirely inside the game lock, so two hits on the same
//! target always apply one after the other. A lethal hit that also reaches
//! the kill goal ends the round before the lock is released.

use crate::game::GameState;
use crate::scheduler::{Scheduled, ScheduledTask};
use log::{debug, info};
use shared::{
    Phase, ServerMessage, SessionId, DEFAULT_HIT_DAMAGE, KILL_COINS, KILL_SCORE,
    RESPAWN_COUNTDOWN, SWORD, SWORD_DAMAGE,
};

/// Result of one `hit` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Unknown parties, dead target, different rooms or no active round.
    Ignored,
    /// Non-lethal: the target's remaining health and shield.
    Damaged { hp: u32, shield: u32 },
    /// Lethal. `round_over` is set when the kill reached the goal.
    Killed { round_over: bool },
}

/// Result of a sword swing request.
#[derive(Debug, Clone, PartialEq)]
pub enum SwingOutcome {
    Allowed,
    /// Seconds until the next swing is allowed, 0 when the swing was refused
    /// for another reason.
    Denied { remaining: f64 },
    Ignored,
}

/// Rounds to hundredths, the precision shown on the cooldown HUD.
fn round_hundredths(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

impl GameState {
    /// Applies one hit from `attacker` to `target`.
    ///
    /// Shield absorbs the whole hit while it has charge; any excess is not
    /// carried over to health. Returns the outcome plus any delayed work the
    /// caller must schedule (a respawn, or the room reset when the round
    /// ended).
    pub fn apply_hit(
        &mut self,
        attacker: SessionId,
        target: SessionId,
        raw_damage: Option<u32>,
        is_melee: bool,
    ) -> (HitOutcome, Vec<Scheduled>) {
        let damage = if is_melee {
            SWORD_DAMAGE
        } else {
            raw_damage.unwrap_or(DEFAULT_HIT_DAMAGE)
        };

        if attacker == target {
            return (HitOutcome::Ignored, Vec::new());
        }
        let Some(room) = self.rooms.room_of(attacker) else {
            return (HitOutcome::Ignored, Vec::new());
        };
        if room.phase != Phase::Active || !room.members.contains(&target) {
            return (HitOutcome::Ignored, Vec::new());
        }
        let code = room.code.clone();
        let round = room.round;
        let kill_goal = room.kill_goal;
        if !self.players.contains(attacker) {
            return (HitOutcome::Ignored, Vec::new());
        }

        let Some(victim) = self.players.get_mut(target) else {
            return (HitOutcome::Ignored, Vec::new());
        };
        if victim.dead {
            debug!("Hit on session {} ignored: already dead", target);
            return (HitOutcome::Ignored, Vec::new());
        }

        if victim.shield > 0 {
            victim.shield = victim.shield.saturating_sub(damage);
        } else {
            victim.hp = victim.hp.saturating_sub(damage);
        }

        if victim.hp > 0 {
            let (hp, shield) = (victim.hp, victim.shield);
            self.broadcast(
                &ServerMessage::Damaged {
                    pid: target,
                    hp,
                    shield,
                },
                None,
                Some(&code),
            );
            return (HitOutcome::Damaged { hp, shield }, Vec::new());
        }

        victim.dead = true;
        victim.resp_timer = RESPAWN_COUNTDOWN;
        victim.deaths += 1;
        let victim_name = victim.name.clone();
        let victim_deaths = victim.deaths;

        let Some(killer) = self.players.get_mut(attacker) else {
            return (HitOutcome::Ignored, Vec::new());
        };
        killer.kills += 1;
        killer.score += KILL_SCORE;
        killer.coins += KILL_COINS;
        let weapon = killer.gun.clone();
        let kill = ServerMessage::Kill {
            killer_pid: attacker,
            victim_pid: target,
            killer_name: killer.name.clone(),
            victim_name,
            killer_team: killer.team,
            skin_color: killer.skin_color_for(&weapon),
            weapon,
            attacker_kills: killer.kills,
            attacker_score: killer.score,
            attacker_coins: killer.coins,
            victim_deaths,
        };
        let round_over = killer.kills >= kill_goal;
        info!(
            "Session {} killed session {} in room {}",
            attacker, target, code
        );

        self.broadcast(&kill, None, Some(&code));

        let timers = if round_over {
            self.end_round(&code, Some(round), Some(attacker))
        } else {
            vec![Scheduled::after(
                self.config.respawn_delay,
                ScheduledTask::Respawn {
                    pid: target,
                    room: code,
                },
            )]
        };
        (HitOutcome::Killed { round_over }, timers)
    }

    /// Sword swing with a per-player cooldown. Allowed swings are shown to
    /// the whole room; denials only go back to the swinger.
    pub fn sword_swing(
        &mut self,
        id: SessionId,
        x: f32,
        y: f32,
        angle: f32,
        now_ms: u64,
    ) -> SwingOutcome {
        let Some(code) = self.rooms.room_code_of(id).map(str::to_string) else {
            return SwingOutcome::Ignored;
        };
        let cooldown_ms = self.config.sword_cooldown.as_millis() as u64;
        let cooldown = self.config.sword_cooldown.as_secs_f64();
        let Some(player) = self.players.get_mut(id) else {
            return SwingOutcome::Ignored;
        };

        let denial = if player.dead {
            Some((0.0, "You are dead".to_string()))
        } else if player.gun != SWORD {
            Some((0.0, "No sword equipped".to_string()))
        } else if now_ms < player.sword_ready_at {
            let remaining = round_hundredths((player.sword_ready_at - now_ms) as f64 / 1000.0);
            Some((remaining, format!("Sword on cooldown! {}s left", remaining)))
        } else {
            None
        };
        if let Some((remaining, msg)) = denial {
            self.send_to(id, &ServerMessage::SwordDenied { remaining, msg });
            return SwingOutcome::Denied { remaining };
        }

        player.sword_ready_at = now_ms + cooldown_ms;
        let skin_color = player.skin_color_for(SWORD);

        self.broadcast(
            &ServerMessage::SwordSwing {
                pid: id,
                x,
                y,
                angle,
                skin_color,
                cooldown,
            },
            None,
            Some(&code),
        );
        self.send_to(id, &ServerMessage::SwordAllowed { cooldown });
        SwingOutcome::Allowed
    }
}
