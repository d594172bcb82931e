//! Room lifecycle handlers: create, join, start, round end and reset.

use crate::error::RoomError;
use crate::game::GameState;
use crate::player::EconomySnapshot;
use crate::room::normalize_code;
use crate::scheduler::{Scheduled, ScheduledTask};
use crate::utils::{get_timestamp, timestamp_secs};
use log::{debug, info};
use shared::{Player, RoundResult, ServerMessage, SessionId, Shop, Team};

impl GameState {
    /// Opens a lobby with `id` as host. Replies `roomCreated`.
    pub fn create_room(
        &mut self,
        id: SessionId,
        name: Option<&str>,
        team: Option<&str>,
        skin: Option<&str>,
    ) {
        if let Some((code, player)) = self.open_room(id, name, team, skin) {
            let kill_goal = self.config.kill_goal;
            self.send_to(
                id,
                &ServerMessage::RoomCreated {
                    pid: id,
                    code,
                    player,
                    shop: Shop,
                    kill_goal,
                },
            );
        }
    }

    /// Older clients have no lobby screen: `join` opens a fresh room and
    /// replies `welcome`.
    pub fn legacy_join(
        &mut self,
        id: SessionId,
        name: Option<&str>,
        team: Option<&str>,
        skin: Option<&str>,
    ) {
        let Some((code, player)) = self.open_room(id, name, team, skin) else {
            return;
        };
        let players = match self.rooms.get(&code) {
            Some(room) => self.players.roster(&room.members),
            None => return,
        };
        self.send_to(
            id,
            &ServerMessage::Welcome {
                pid: id,
                code: code.clone(),
                players,
                shop: Shop,
            },
        );
        self.broadcast(&ServerMessage::PlayerJoined { player }, Some(id), Some(&code));
    }

    fn open_room(
        &mut self,
        id: SessionId,
        name: Option<&str>,
        team: Option<&str>,
        skin: Option<&str>,
    ) -> Option<(String, Player)> {
        self.leave_room(id);

        let code = match self.rooms.create(id, self.config.kill_goal) {
            Ok(room) => room.code.clone(),
            Err(e) => {
                self.send_to(id, &ServerMessage::Error { msg: e.to_string() });
                return None;
            }
        };
        let player = self
            .players
            .create_player(id, name, Team::from_label(team, Team::Red), skin)
            .clone();
        info!("{} created room {}", player.name, code);
        Some((code, player))
    }

    /// Adds `id` to an existing room. Unknown codes and rooms showing the
    /// scoreboard are refused with `joinError` and leave the caller where it
    /// was.
    pub fn join_room(
        &mut self,
        id: SessionId,
        code: &str,
        name: Option<&str>,
        team: Option<&str>,
        skin: Option<&str>,
    ) {
        let code = normalize_code(code);
        if let Err(e) = self.check_joinable(&code) {
            self.send_to(id, &ServerMessage::JoinError { msg: e.to_string() });
            return;
        }

        if self.rooms.room_code_of(id) != Some(code.as_str()) {
            self.leave_room(id);
            if let Err(e) = self.rooms.join(&code, id) {
                self.send_to(id, &ServerMessage::JoinError { msg: e.to_string() });
                return;
            }
        }

        let player = self
            .players
            .create_player(id, name, Team::from_label(team, Team::Blue), skin)
            .clone();
        let Some(room) = self.rooms.get(&code) else {
            return;
        };
        let state = room.phase;
        let kill_goal = room.kill_goal;
        let players = self.players.roster(&room.members);
        info!("{} joined room {} ({:?})", player.name, code, state);

        self.send_to(
            id,
            &ServerMessage::RoomJoined {
                pid: id,
                code: code.clone(),
                state,
                player: player.clone(),
                players,
                shop: Shop,
                kill_goal,
            },
        );
        self.broadcast(&ServerMessage::PlayerJoined { player }, Some(id), Some(&code));
    }

    fn check_joinable(&self, code: &str) -> Result<(), RoomError> {
        match self.rooms.get(code) {
            None => Err(RoomError::NotFound(code.to_string())),
            Some(room) if room.phase == shared::Phase::Ended => Err(RoomError::RoundEnded),
            Some(_) => Ok(()),
        }
    }

    /// Host-only start. Returns the deadline watcher for the new round.
    pub fn start_game(&mut self, id: SessionId) -> Vec<Scheduled> {
        let round_ms = self.config.round_duration.as_millis() as u64;
        let (code, round, kill_goal, deadline, players) =
            match self.rooms.start(id, get_timestamp(), round_ms) {
                Ok(room) => (
                    room.code.clone(),
                    room.round,
                    room.kill_goal,
                    room.round_deadline.unwrap_or_default(),
                    self.players.roster(&room.members),
                ),
                Err(e) => {
                    self.send_to(id, &ServerMessage::Error { msg: e.to_string() });
                    return Vec::new();
                }
            };

        self.broadcast(
            &ServerMessage::GameStarted {
                kill_goal,
                round_ends: timestamp_secs(deadline),
                players,
            },
            None,
            Some(&code),
        );

        vec![Scheduled::after(
            self.config.round_duration + self.config.deadline_grace,
            ScheduledTask::RoundDeadline { room: code, round },
        )]
    }

    /// `Active -> Ended`. Saves every member's economy, publishes the
    /// scoreboard and returns the timer that brings the room back to its
    /// lobby. With `round` set, does nothing unless the room is still playing
    /// that round.
    pub fn end_round(
        &mut self,
        code: &str,
        round: Option<u64>,
        winner: Option<SessionId>,
    ) -> Vec<Scheduled> {
        let Some(room) = self.rooms.end_round(code, round) else {
            debug!("Round end for room {} skipped", code);
            return Vec::new();
        };

        let mut results = Vec::with_capacity(room.members.len());
        room.saved_economy.clear();
        for id in &room.members {
            if let Some(player) = self.players.get(*id) {
                room.saved_economy.insert(*id, EconomySnapshot::of(player));
                results.push(RoundResult::from(player));
            }
        }
        let round = room.round;
        results.sort_by(|a, b| b.score.cmp(&a.score));

        let winner_name = winner
            .and_then(|id| self.players.get(id))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "?".to_string());
        info!("Round {} ended in room {}, winner: {}", round, code, winner_name);

        self.broadcast(
            &ServerMessage::RoundEnd {
                winner_pid: winner,
                winner_name,
                results,
            },
            None,
            Some(code),
        );

        vec![Scheduled::after(
            self.config.reset_delay,
            ScheduledTask::ResetRoom {
                room: code.to_string(),
                round,
            },
        )]
    }

    /// `Ended -> Lobby`: members get spawn defaults back with the economy
    /// saved at round end.
    pub(crate) fn reset_room(&mut self, code: &str, round: u64) {
        let Some(room) = self.rooms.reset(code, round) else {
            debug!("Reset for room {} round {} skipped", code, round);
            return;
        };

        let mut saved = std::mem::take(&mut room.saved_economy);
        for id in &room.members {
            if let Some(player) = self.players.get_mut(*id) {
                player.reset_for_round();
                if let Some(snapshot) = saved.remove(id) {
                    snapshot.restore(player);
                }
            }
        }
        info!("Room {} reset to lobby", code);

        self.broadcast(
            &ServerMessage::ReturnToLobby {
                room: code.to_string(),
            },
            None,
            Some(code),
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::scheduler::ScheduledTask;
    use crate::testing::Harness;
    use shared::{ClientMessage, Phase};
    use std::time::Duration;

    #[test]
    fn test_create_room_reply() {
        let mut h = Harness::new();
        let id = h.connect();
        h.drain(id);
        h.state.create_room(id, Some(" ace "), Some("blue"), Some("ghost"));

        let reply = h.find(id, "roomCreated").unwrap();
        assert_eq!(reply["pid"], id);
        assert_eq!(reply["kill_goal"], 10);
        assert_eq!(reply["player"]["name"], "ACE");
        assert_eq!(reply["player"]["team"], "blue");
        assert_eq!(reply["player"]["skin"], "ghost");
        assert!(reply["shop"]["smg"].is_object());

        let code = reply["code"].as_str().unwrap();
        let room = h.state.rooms().get(code).unwrap();
        assert_eq!(room.host, id);
        assert_eq!(room.phase, Phase::Lobby);
    }

    #[test]
    fn test_create_room_default_team_is_red() {
        let mut h = Harness::new();
        let id = h.connect();
        h.state.create_room(id, None, Some("purple"), None);
        let player = h.state.players().get(id).unwrap();
        assert_eq!(player.team, shared::Team::Red);
        assert_eq!(player.name, "PLAYER");
    }

    #[test]
    fn test_create_room_leaves_previous_room() {
        let mut h = Harness::new();
        let a = h.connect();
        let first = h.create_room(a);
        let second = h.create_room(a);
        assert_ne!(first, second);
        assert!(h.state.rooms().get(&first).is_none());
        assert_eq!(h.state.rooms().len(), 1);
    }

    #[test]
    fn test_join_room_reply_and_announcement() {
        let mut h = Harness::new();
        let host = h.connect();
        let code = h.create_room(host);
        let guest = h.connect();
        h.drain_all();

        h.state
            .join_room(guest, &code.to_lowercase(), Some("viper"), None, None);

        let reply = h.find(guest, "roomJoined").unwrap();
        assert_eq!(reply["code"], code.as_str());
        assert_eq!(reply["state"], "lobby");
        assert_eq!(reply["player"]["team"], "blue");
        assert_eq!(reply["players"].as_object().unwrap().len(), 2);

        let joined = h.find(host, "playerJoined").unwrap();
        assert_eq!(joined["player"]["name"], "VIPER");
    }

    #[test]
    fn test_join_unknown_room() {
        let mut h = Harness::new();
        let id = h.connect();
        h.drain(id);
        h.state.join_room(id, "nope99", None, None, None);

        let reply = h.find(id, "joinError").unwrap();
        assert_eq!(reply["msg"], "Room 'NOPE99' not found");
        assert!(h.state.players().get(id).is_none());
    }

    #[test]
    fn test_join_rejected_keeps_current_room() {
        let mut h = Harness::new();
        let a = h.connect();
        let code = h.create_room(a);
        h.state.join_room(a, "ZZZZZZ", None, None, None);
        assert_eq!(h.state.rooms().room_code_of(a), Some(code.as_str()));
    }

    #[test]
    fn test_join_ended_room() {
        let mut h = Harness::new();
        let host = h.connect();
        let code = h.create_room(host);
        h.state.start_game(host);
        h.state.end_round(&code, None, Some(host));

        let guest = h.connect();
        h.drain(guest);
        h.state.join_room(guest, &code, None, None, None);
        let reply = h.find(guest, "joinError").unwrap();
        assert_eq!(reply["msg"], "Round just ended, wait a moment");
    }

    #[test]
    fn test_join_active_room() {
        let mut h = Harness::new();
        let host = h.connect();
        let code = h.create_room(host);
        h.state.start_game(host);

        let guest = h.connect();
        h.drain(guest);
        h.state.join_room(guest, &code, None, None, None);
        let reply = h.find(guest, "roomJoined").unwrap();
        assert_eq!(reply["state"], "active");
    }

    #[test]
    fn test_rejoin_own_room_keeps_room() {
        let mut h = Harness::new();
        let host = h.connect();
        let code = h.create_room(host);
        h.drain(host);

        h.state.join_room(host, &code, Some("again"), None, None);
        assert!(h.state.rooms().get(&code).is_some());
        assert_eq!(h.state.players().get(host).unwrap().name, "AGAIN");
        assert!(h.find(host, "roomJoined").is_some());
    }

    #[test]
    fn test_legacy_join() {
        let mut h = Harness::new();
        let id = h.connect();
        h.drain(id);
        h.send(
            id,
            ClientMessage::Join {
                name: Some("old".into()),
                team: None,
                skin: None,
            },
        );
        let reply = h.find(id, "welcome").unwrap();
        assert_eq!(reply["pid"], id);
        assert_eq!(reply["players"][id.to_string()]["name"], "OLD");
        assert!(h.state.rooms().room_code_of(id).is_some());
    }

    #[test]
    fn test_start_game() {
        let mut h = Harness::new();
        let host = h.connect();
        let code = h.create_room(host);
        let guest = h.connect();
        h.join_room(guest, &code);
        h.drain_all();

        let timers = h.state.start_game(host);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].delay, Duration::from_secs(181));
        assert_eq!(
            timers[0].task,
            ScheduledTask::RoundDeadline {
                room: code.clone(),
                round: 1
            }
        );

        let started = h.find(guest, "gameStarted").unwrap();
        assert_eq!(started["kill_goal"], 10);
        assert!(started["round_ends"].as_f64().unwrap() > 0.0);
        assert_eq!(started["players"].as_object().unwrap().len(), 2);
        assert_eq!(h.state.rooms().get(&code).unwrap().phase, Phase::Active);
    }

    #[test]
    fn test_start_game_rejections() {
        let mut h = Harness::new();
        let host = h.connect();
        let code = h.create_room(host);
        let guest = h.connect();
        h.join_room(guest, &code);
        h.drain_all();

        assert!(h.state.start_game(guest).is_empty());
        assert_eq!(
            h.find(guest, "error").unwrap()["msg"],
            "Only the host can start the game"
        );

        h.state.start_game(host);
        assert!(h.state.start_game(host).is_empty());
        assert_eq!(
            h.find(host, "error").unwrap()["msg"],
            "Room is not in the lobby"
        );

        let loner = h.connect();
        assert!(h.state.start_game(loner).is_empty());
        assert_eq!(h.find(loner, "error").unwrap()["msg"], "You are not in a room");
    }

    #[test]
    fn test_end_round_results_sorted_by_score() {
        let mut h = Harness::new();
        let host = h.connect();
        let code = h.create_room(host);
        let guest = h.connect();
        h.join_room(guest, &code);
        h.state.start_game(host);
        h.state.players.get_mut(guest).unwrap().score = 300;
        h.state.players.get_mut(host).unwrap().score = 100;
        h.drain_all();

        let timers = h.state.end_round(&code, Some(1), None);
        assert_eq!(
            timers,
            vec![crate::scheduler::Scheduled::after(
                Duration::from_secs(8),
                ScheduledTask::ResetRoom {
                    room: code.clone(),
                    round: 1
                }
            )]
        );

        let end = h.find(host, "roundEnd").unwrap();
        assert!(end["winner_pid"].is_null());
        assert_eq!(end["winner_name"], "?");
        let results = end["results"].as_array().unwrap();
        assert_eq!(results[0]["pid"], guest);
        assert_eq!(results[1]["pid"], host);

        // A second trigger for the same round is a no-op.
        assert!(h.state.end_round(&code, Some(1), Some(host)).is_empty());
        assert!(h.types(host).is_empty());
    }

    #[test]
    fn test_reset_preserves_economy() {
        let mut h = Harness::new();
        let host = h.connect();
        let code = h.create_room(host);
        h.state.start_game(host);
        {
            let p = h.state.players.get_mut(host).unwrap();
            p.coins = 45;
            p.owned_skins.push("skin_pistol_ice".into());
            p.active_skins.insert("pistol".into(), "skin_pistol_ice".into());
            p.kills = 4;
            p.deaths = 2;
            p.score = 400;
            p.x = 777.0;
            p.gun = "sniper".into();
            p.ammo = 1;
        }
        h.state.end_round(&code, Some(1), Some(host));
        h.drain_all();

        h.state.run_scheduled(ScheduledTask::ResetRoom {
            room: code.clone(),
            round: 1,
        });

        let p = h.state.players().get(host).unwrap();
        assert_eq!(p.coins, 45);
        assert_eq!(p.owned_skins, vec!["skin_pistol_ice".to_string()]);
        assert_eq!(p.active_skins["pistol"], "skin_pistol_ice");
        assert_eq!((p.kills, p.deaths, p.score), (0, 0, 0));
        assert_eq!(p.x, shared::SPAWN_X_RED);
        assert_eq!(p.gun, "pistol");
        assert_eq!(p.ammo, 12);

        assert_eq!(h.state.rooms().get(&code).unwrap().phase, Phase::Lobby);
        let back = h.find(host, "returnToLobby").unwrap();
        assert_eq!(back["room"], code.as_str());
    }
}
