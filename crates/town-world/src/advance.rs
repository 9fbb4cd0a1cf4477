//! The per-tick "advance" phase (spec §4.6): movement integration, collision
//! handling, and conversation-lifecycle transitions, run once per `TICK`-sized
//! sub-step by [`town_engine::run_step`].

use town_core::{PlayerId, Timestamp};
use tracing::warn;

use crate::aitown::AiTown;
use crate::entities::{ConversationEnd, MemberStatus};

pub fn advance(town: &mut AiTown, _dt_ms: u64, now: Timestamp) {
    step_movement(town, now);
    handle_collisions(town, now);
    progress_conversations(town, now);
    // Sample every tracked `Location` field changed this tick (spec §4.2:
    // "on each tick, before flush ... append a sample"), so `AiTown::flush`
    // has a per-tick-granular record to pack even though it only runs once
    // per step (which may span many ticks).
    town.locations.sample_tick(now);
}

/// Advance every active player's position along its current path, recompute
/// `dx`/`dy`/`velocity` from the enclosing segment, and clear a path once it
/// is fully walked (spec §4.1 `path_position`, §4.6).
fn step_movement(town: &mut AiTown, now: Timestamp) {
    let location_ids: Vec<_> =
        town.players.filter(|_| true).into_iter().map(|(_, p)| p.location_id).collect();

    for location_id in location_ids {
        let _ = town.locations.update(location_id, |loc| {
            let Some(path) = loc.path.clone() else { return };
            let pos = town_core::geometry::path_position(&path, now);
            loc.x = pos.position.x;
            loc.y = pos.position.y;
            loc.velocity = pos.velocity;
            if let Some(facing) = pos.facing {
                loc.dx = facing.x;
                loc.dy = facing.y;
            }
            if !town_core::geometry::path_overlaps(&path, now) {
                loc.path = None;
            }
        });
    }
}

/// When a player's next scheduled tile is occupied by another, stationary
/// player, stall the path and schedule a replan attempt after
/// `PATHFINDING_BACKOFF` (spec §4.6, §7 "offending entity is marked for
/// recovery: path cleared, replan scheduled").
fn handle_collisions(town: &mut AiTown, now: Timestamp) {
    let player_ids: Vec<PlayerId> = town.players.filter(|_| true).into_iter().map(|(id, _)| id).collect();

    for player_id in player_ids {
        let Ok(player) = town.players.lookup(player_id).cloned() else { continue };
        if let Some(replan_after) = player.replan_after {
            if now < replan_after {
                continue;
            }
        }
        let Ok(loc) = town.locations.lookup(player.location_id).cloned() else { continue };
        let Some(path) = loc.path.clone() else { continue };
        let Some(next) = path.iter().find(|p| p.t > now) else { continue };

        let blocked = town.players.filter(|_| true).into_iter().filter(|(id, _)| *id != player_id).any(
            |(other_id, _)| {
                let Ok(other) = town.players.lookup(other_id) else { return false };
                let Ok(other_loc) = town.locations.lookup(other.location_id) else { return false };
                other_loc.path.is_none() && other_loc.position().distance(next.position) < town.config.collision_threshold
            },
        );

        if blocked {
            let backoff = now.offset(town.config.pathfinding_backoff_ms);
            let _ = town.locations.update(player.location_id, |l| l.path = None);
            let _ = town.players.update(player_id, |p| p.replan_after = Some(backoff));
            warn!(player_id = %player_id, retry_at = %backoff, "path blocked by another player; stalled for replanning");
        }
    }
}

/// Progress conversation members through invited → walkingOver →
/// participating → left, and mark conversations finished when fewer than two
/// active members remain or the duration cap is exceeded (spec §4.6).
fn progress_conversations(town: &mut AiTown, now: Timestamp) {
    let conversation_ids: Vec<_> =
        town.conversations.filter(|c| !c.is_finished()).into_iter().map(|(id, _)| id).collect();

    for conversation_id in conversation_ids {
        let members: Vec<(PlayerId, MemberStatus)> = town
            .members
            .filter(|m| m.conversation_id == conversation_id)
            .into_iter()
            .map(|(_, m)| (m.player_id, m.status))
            .collect();

        let walking_over: Vec<PlayerId> =
            members.iter().filter(|(_, s)| *s == MemberStatus::WalkingOver).map(|(p, _)| *p).collect();

        if walking_over.len() >= 2 {
            let positions: Vec<town_core::Point> = walking_over
                .iter()
                .filter_map(|pid| {
                    let player = town.players.lookup(*pid).ok()?;
                    town.locations.lookup(player.location_id).ok().map(|l| l.position())
                })
                .collect();

            let all_close = positions.len() == walking_over.len()
                && positions
                    .windows(2)
                    .all(|w| w[0].distance(w[1]) <= town.config.conversation_distance);

            if all_close {
                for pid in &walking_over {
                    if let Ok(member_id) = town.member_id(conversation_id, *pid) {
                        let _ = town.members.update(member_id, |m| {
                            m.status = MemberStatus::Participating;
                            m.status_ts = now;
                        });
                    }
                }
            }
        }

        let active_count =
            town.members.filter(|m| m.conversation_id == conversation_id && m.status != MemberStatus::Left).len();
        let duration_exceeded = town
            .conversations
            .lookup(conversation_id)
            .map(|c| now.since(c.created_ts) > town.config.max_conversation_duration_ms)
            .unwrap_or(false);

        if active_count < 2 || duration_exceeded {
            let _ = town.conversations.update(conversation_id, |c| {
                c.finished.get_or_insert(ConversationEnd { ended_at: now });
            });
        }
    }
}
