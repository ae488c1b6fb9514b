//! The session actor: one Tokio task that owns one session.
//!
//! All mutation of a session's state happens inside its actor, so the
//! single-writer guarantee is structural — two commands for the same
//! session are applied in channel order, never interleaved mid-handler.
//!
//! Every "wait" the lifecycle needs is a deadline field on the actor,
//! polled through a single `sleep_until` branch of the run loop:
//!
//! ```text
//! lobby_deadline   — cancel the lobby if nobody starts in time
//! start_deadline   — the 3-2-1 countdown between "both ready" and play
//! grace[slot]      — disconnect forfeit clock, one per participant
//! next_tick_at     — the maze race's fixed-timestep cadence
//! retire_deadline  — how long a terminal session answers rejoins
//! ```
//!
//! Clearing a field cancels its timer; reaching a terminal phase clears
//! everything at once and arms retirement, so a finished session can
//! never leak a live tick loop.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant, sleep_until};

use gamenight_protocol::{
    GameCommand, GameId, Participant, Phase, Recipient, Slot, UserId,
};

use crate::clock::now_ms;
use crate::event::{EventSender, GameView, ServerEvent};
use crate::rules::GameRules;
use crate::{Reject, SessionConfig};

/// Command channel depth per session actor.
const CHANNEL_SIZE: usize = 64;

// ---------------------------------------------------------------------------
// Commands and handle
// ---------------------------------------------------------------------------

/// A snapshot of session metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub game_id: GameId,
    pub phase: Phase,
    pub participants: [Participant; 2],
    pub winner: Option<UserId>,
}

/// Commands sent to a session actor through its channel.
pub(crate) enum SessionCommand {
    /// Bind a connection to a participant slot (claim or rebind).
    Join {
        user_id: UserId,
        display_name: Option<String>,
        avatar: Option<String>,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), Reject>>,
    },

    /// Mark a participant ready.
    Ready {
        user_id: UserId,
        reply: oneshot::Sender<Result<(), Reject>>,
    },

    /// Route an in-game command into the simulation.
    Game {
        user_id: UserId,
        command: GameCommand,
        reply: oneshot::Sender<Result<(), Reject>>,
    },

    /// Cancel the lobby.
    Cancel {
        user_id: UserId,
        reply: oneshot::Sender<Result<(), Reject>>,
    },

    /// Concede the game immediately.
    Forfeit {
        user_id: UserId,
        reply: oneshot::Sender<Result<(), Reject>>,
    },

    /// Rebind after a transport drop and resend the full view.
    Rejoin {
        user_id: UserId,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), Reject>>,
    },

    /// The transport reports this user's connection is gone.
    /// Fire-and-forget: a dead connection can't receive a rejection.
    Disconnected { user_id: UserId },

    /// Fetch session metadata.
    Info {
        reply: oneshot::Sender<SessionInfo>,
    },

    /// Fetch the per-recipient view (the request/response read path).
    View {
        user_id: UserId,
        reply: oneshot::Sender<Result<GameView, Reject>>,
    },
}

/// Handle to a running session actor. Cheap to clone.
#[derive(Clone)]
pub struct SessionHandle {
    game_id: GameId,
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// `true` once the actor has retired and the channel is closed.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, Reject> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| Reject::Unavailable(self.game_id))?;
        reply_rx
            .await
            .map_err(|_| Reject::Unavailable(self.game_id))
    }

    pub async fn join(
        &self,
        user_id: UserId,
        display_name: Option<String>,
        avatar: Option<String>,
        sender: EventSender,
    ) -> Result<(), Reject> {
        self.request(|reply| SessionCommand::Join {
            user_id,
            display_name,
            avatar,
            sender,
            reply,
        })
        .await?
    }

    pub async fn ready(&self, user_id: UserId) -> Result<(), Reject> {
        self.request(|reply| SessionCommand::Ready { user_id, reply })
            .await?
    }

    pub async fn game(
        &self,
        user_id: UserId,
        command: GameCommand,
    ) -> Result<(), Reject> {
        self.request(|reply| SessionCommand::Game {
            user_id,
            command,
            reply,
        })
        .await?
    }

    pub async fn cancel(&self, user_id: UserId) -> Result<(), Reject> {
        self.request(|reply| SessionCommand::Cancel { user_id, reply })
            .await?
    }

    pub async fn forfeit(&self, user_id: UserId) -> Result<(), Reject> {
        self.request(|reply| SessionCommand::Forfeit { user_id, reply })
            .await?
    }

    pub async fn rejoin(
        &self,
        user_id: UserId,
        sender: EventSender,
    ) -> Result<(), Reject> {
        self.request(|reply| SessionCommand::Rejoin {
            user_id,
            sender,
            reply,
        })
        .await?
    }

    /// Reports a transport disconnect. Fire-and-forget.
    pub async fn disconnected(&self, user_id: UserId) {
        let _ = self
            .tx
            .send(SessionCommand::Disconnected { user_id })
            .await;
    }

    pub async fn info(&self) -> Result<SessionInfo, Reject> {
        self.request(|reply| SessionCommand::Info { reply }).await
    }

    pub async fn view(&self, user_id: UserId) -> Result<GameView, Reject> {
        self.request(|reply| SessionCommand::View { user_id, reply })
            .await?
    }
}

/// Spawns a session actor for `game` and returns its handle.
pub fn spawn_session<G: GameRules>(game: G, config: SessionConfig) -> SessionHandle {
    let game_id = game.core().id;
    let (tx, rx) = mpsc::channel(CHANNEL_SIZE);

    let actor = SessionActor {
        game,
        config,
        senders: HashMap::new(),
        rx,
        lobby_deadline: None,
        start_deadline: None,
        grace_deadlines: [None, None],
        next_tick_at: None,
        retire_deadline: None,
    };
    tokio::spawn(actor.run());

    SessionHandle { game_id, tx }
}

// ---------------------------------------------------------------------------
// The actor
// ---------------------------------------------------------------------------

/// Which deadline fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Tick,
    StartCountdown,
    LobbyExpiry,
    Grace(Slot),
    Retire,
}

enum Wake {
    Command(Option<SessionCommand>),
    Timer(TimerKind),
}

struct SessionActor<G: GameRules> {
    game: G,
    config: SessionConfig,
    /// Outbound channel per bound user.
    senders: HashMap<UserId, EventSender>,
    rx: mpsc::Receiver<SessionCommand>,
    lobby_deadline: Option<Instant>,
    start_deadline: Option<Instant>,
    grace_deadlines: [Option<Instant>; 2],
    next_tick_at: Option<Instant>,
    retire_deadline: Option<Instant>,
}

impl<G: GameRules> SessionActor<G> {
    async fn run(mut self) {
        let game_id = self.game.core().id;
        tracing::info!(%game_id, "session actor started");

        loop {
            // One earliest-deadline timer plus the command channel. The
            // deadline is captured before the select so the branches
            // borrow nothing mutable beyond the receiver.
            let pending = self.next_deadline();
            let sleep_at = pending.map_or_else(Instant::now, |(_, at)| at);

            let wake = tokio::select! {
                cmd = self.rx.recv() => Wake::Command(cmd),
                _ = sleep_until(sleep_at), if pending.is_some() => {
                    Wake::Timer(pending.expect("guarded by is_some").0)
                }
            };

            match wake {
                Wake::Command(None) => break,
                Wake::Command(Some(cmd)) => self.on_command(cmd),
                Wake::Timer(TimerKind::Retire) => {
                    tracing::info!(%game_id, "session retired");
                    break;
                }
                Wake::Timer(kind) => self.on_timer(kind),
            }
        }

        tracing::info!(%game_id, "session actor stopped");
    }

    /// The earliest pending deadline, if any.
    fn next_deadline(&self) -> Option<(TimerKind, Instant)> {
        let candidates = [
            (TimerKind::Tick, self.next_tick_at),
            (TimerKind::StartCountdown, self.start_deadline),
            (TimerKind::LobbyExpiry, self.lobby_deadline),
            (TimerKind::Grace(Slot::P1), self.grace_deadlines[0]),
            (TimerKind::Grace(Slot::P2), self.grace_deadlines[1]),
            (TimerKind::Retire, self.retire_deadline),
        ];
        candidates
            .into_iter()
            .filter_map(|(kind, at)| at.map(|at| (kind, at)))
            .min_by_key(|(_, at)| *at)
    }

    // -- Command handling -------------------------------------------------

    fn on_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Join {
                user_id,
                display_name,
                avatar,
                sender,
                reply,
            } => {
                let result = self.handle_join(user_id, display_name, avatar, sender);
                let _ = reply.send(result);
            }
            SessionCommand::Ready { user_id, reply } => {
                let result = self.handle_ready(user_id);
                let _ = reply.send(result);
            }
            SessionCommand::Game {
                user_id,
                command,
                reply,
            } => {
                let result = self.handle_game(user_id, command);
                let _ = reply.send(result);
            }
            SessionCommand::Cancel { user_id, reply } => {
                let result = self.handle_cancel(user_id);
                let _ = reply.send(result);
            }
            SessionCommand::Forfeit { user_id, reply } => {
                let result = self.handle_forfeit(user_id);
                let _ = reply.send(result);
            }
            SessionCommand::Rejoin {
                user_id,
                sender,
                reply,
            } => {
                let result = self.handle_rejoin(user_id, sender);
                let _ = reply.send(result);
            }
            SessionCommand::Disconnected { user_id } => {
                self.handle_disconnected(user_id);
            }
            SessionCommand::Info { reply } => {
                let core = self.game.core();
                let _ = reply.send(SessionInfo {
                    game_id: core.id,
                    phase: core.phase,
                    participants: core.participants.clone(),
                    winner: core.winner.clone(),
                });
            }
            SessionCommand::View { user_id, reply } => {
                let result = self
                    .game
                    .core()
                    .slot_of(&user_id)
                    .ok_or(Reject::NotParticipant)
                    .map(|slot| self.game.view(slot));
                let _ = reply.send(result);
            }
        }
    }

    /// Binds a user: rebinding an owned slot, or claiming the placeholder.
    fn handle_join(
        &mut self,
        user_id: UserId,
        display_name: Option<String>,
        avatar: Option<String>,
        sender: EventSender,
    ) -> Result<(), Reject> {
        let game_id = self.game.core().id;

        // Rebind: this user already owns a slot (any phase — a lobby
        // refresh and a mid-game reconnect both land here).
        if let Some(slot) = self.game.core().slot_of(&user_id) {
            self.senders.insert(user_id.clone(), sender);
            self.arm_lobby_timer();
            if self.clear_grace(slot) {
                self.dispatch_one(
                    Recipient::AllExcept(user_id.clone()),
                    ServerEvent::OpponentReconnected { game_id },
                );
            }
            tracing::info!(%game_id, user = %user_id, "participant rebound");
            self.broadcast_lobby_update();
            return Ok(());
        }

        // A new user can only claim a slot while the lobby is open.
        if self.game.core().phase != Phase::Lobby {
            return Err(Reject::AlreadyStarted);
        }

        // Claim the unfilled placeholder: prefer a slot whose provisional
        // id already matches, else the first unclaimed slot.
        let core = self.game.core_mut();
        let slot = Slot::BOTH
            .into_iter()
            .find(|s| {
                !core.participant(*s).claimed && core.participant(*s).user_id == user_id
            })
            .or_else(|| {
                Slot::BOTH
                    .into_iter()
                    .find(|s| !core.participant(*s).claimed)
            })
            .ok_or(Reject::GameFull)?;

        let participant = core.participant_mut(slot);
        participant.user_id = user_id.clone();
        if let Some(name) = display_name {
            participant.display_name = name;
        }
        if let Some(avatar) = avatar {
            participant.avatar = Some(avatar);
        }
        participant.claimed = true;

        self.senders.insert(user_id.clone(), sender);
        self.arm_lobby_timer();
        tracing::info!(%game_id, user = %user_id, ?slot, "participant joined");
        self.broadcast_lobby_update();
        Ok(())
    }

    fn handle_ready(&mut self, user_id: UserId) -> Result<(), Reject> {
        let slot = self.require_participant(&user_id)?;
        if self.game.core().phase != Phase::Lobby {
            return Err(Reject::WrongPhase { expected: "lobby" });
        }

        self.game.core_mut().participant_mut(slot).ready = true;
        tracing::info!(game_id = %self.game.core().id, user = %user_id, "participant ready");
        self.broadcast_lobby_update();

        // Both ready: announce the countdown once and arm the start
        // deadline. Further ready commands while counting down are
        // harmless no-ops.
        if self.game.core().both_ready() && self.start_deadline.is_none() {
            self.broadcast(ServerEvent::GameStarting {
                game_id: self.game.core().id,
                countdown: self.config.countdown,
            });
            self.start_deadline = Some(Instant::now() + self.config.start_delay);
        }
        Ok(())
    }

    fn handle_game(&mut self, user_id: UserId, command: GameCommand) -> Result<(), Reject> {
        let slot = self.require_participant(&user_id)?;
        let events = self.game.handle(slot, command)?;
        self.dispatch(events);
        self.sync_terminal();
        Ok(())
    }

    fn handle_cancel(&mut self, user_id: UserId) -> Result<(), Reject> {
        self.require_participant(&user_id)?;
        if self.game.core().phase != Phase::Lobby {
            return Err(Reject::WrongPhase { expected: "lobby" });
        }

        self.game.core_mut().transition(Phase::Cancelled);
        tracing::info!(game_id = %self.game.core().id, by = %user_id, "lobby cancelled");
        self.broadcast(ServerEvent::GameCancelled {
            game_id: self.game.core().id,
            cancelled_by: Some(user_id),
        });
        self.sync_terminal();
        Ok(())
    }

    /// An explicit forfeit: immediate and unconditional, no grace period.
    fn handle_forfeit(&mut self, user_id: UserId) -> Result<(), Reject> {
        let slot = self.require_participant(&user_id)?;
        if self.game.core().phase != Phase::Playing {
            return Err(Reject::WrongPhase { expected: "playing" });
        }

        tracing::info!(game_id = %self.game.core().id, by = %user_id, "explicit forfeit");
        self.finish_by_forfeit(slot.other());
        Ok(())
    }

    fn handle_rejoin(&mut self, user_id: UserId, sender: EventSender) -> Result<(), Reject> {
        let slot = self.require_participant(&user_id)?;
        let game_id = self.game.core().id;

        self.senders.insert(user_id.clone(), sender);
        self.clear_grace(slot);
        self.dispatch_one(
            Recipient::AllExcept(user_id.clone()),
            ServerEvent::OpponentReconnected { game_id },
        );
        self.dispatch_one(
            Recipient::User(user_id.clone()),
            ServerEvent::GameRejoined {
                game_id,
                view: self.game.view(slot),
            },
        );
        tracing::info!(%game_id, user = %user_id, "participant rejoined");
        Ok(())
    }

    fn handle_disconnected(&mut self, user_id: UserId) {
        let Some(slot) = self.game.core().slot_of(&user_id) else {
            return;
        };
        self.senders.remove(&user_id);

        if self.game.core().phase.is_terminal() {
            return;
        }

        let game_id = self.game.core().id;
        tracing::info!(%game_id, user = %user_id, "participant disconnected, grace period started");
        self.dispatch_one(
            Recipient::AllExcept(user_id),
            ServerEvent::OpponentDisconnected {
                game_id,
                wait_secs: self.config.disconnect_grace.as_secs(),
            },
        );
        self.grace_deadlines[slot.index()] =
            Some(Instant::now() + self.config.disconnect_grace);
    }

    // -- Timer handling ---------------------------------------------------

    fn on_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Tick => {
                // Reschedule from the old deadline, not from now, to hold
                // the fixed cadence.
                if let Some(at) = self.next_tick_at {
                    self.next_tick_at = Some(at + self.config.tick_period);
                }
                let events = self.game.tick();
                self.dispatch(events);
                self.sync_terminal();
            }

            TimerKind::StartCountdown => {
                self.start_deadline = None;
                self.start_playing();
            }

            TimerKind::LobbyExpiry => {
                self.lobby_deadline = None;
                if self.game.core().phase == Phase::Lobby {
                    let game_id = self.game.core().id;
                    self.game.core_mut().transition(Phase::Cancelled);
                    tracing::info!(%game_id, "lobby expired");
                    self.broadcast(ServerEvent::LobbyExpired { game_id });
                    self.sync_terminal();
                }
            }

            TimerKind::Grace(slot) => {
                self.grace_deadlines[slot.index()] = None;
                // Forfeit only if the session is actually playing and the
                // user never rebound (a rebind clears this deadline, so
                // reaching here means they are still gone).
                if self.game.core().phase == Phase::Playing {
                    tracing::info!(
                        game_id = %self.game.core().id,
                        gone = %self.game.core().participant(slot).user_id,
                        "grace period elapsed, forfeiting"
                    );
                    self.finish_by_forfeit(slot.other());
                }
            }

            TimerKind::Retire => unreachable!("retire breaks the run loop"),
        }
    }

    /// The countdown elapsed: flip to playing and deal the first views.
    fn start_playing(&mut self) {
        // A cancel or expiry racing the countdown wins; the transition
        // guard makes this a no-op then.
        if !self.game.core_mut().transition(Phase::Playing) {
            return;
        }
        self.lobby_deadline = None;
        self.game.on_start();

        let game_id = self.game.core().id;
        if self.game.uses_ticks() {
            self.next_tick_at = Some(Instant::now() + self.config.tick_period);
        }
        tracing::info!(%game_id, ticks = self.game.uses_ticks(), "game started");

        // Every bound participant gets their own view.
        let views: Vec<(UserId, GameView)> = self
            .senders
            .keys()
            .filter_map(|user| {
                self.game
                    .core()
                    .slot_of(user)
                    .map(|slot| (user.clone(), self.game.view(slot)))
            })
            .collect();
        for (user, view) in views {
            self.dispatch_one(
                Recipient::User(user),
                ServerEvent::GameStarted { game_id, view },
            );
        }
    }

    /// Ends the game by forfeit and broadcasts the result.
    fn finish_by_forfeit(&mut self, winner: Slot) {
        self.game.force_finish(winner);
        let core = self.game.core();
        let Some(winner) = core.winner.clone() else {
            return; // force_finish refused (already terminal)
        };
        self.broadcast(ServerEvent::GameOver {
            game_id: core.id,
            winner,
            forfeit: true,
            state: self.game.over_state(),
        });
        self.sync_terminal();
    }

    // -- Housekeeping -----------------------------------------------------

    fn require_participant(&self, user_id: &UserId) -> Result<Slot, Reject> {
        self.game
            .core()
            .slot_of(user_id)
            .ok_or(Reject::NotParticipant)
    }

    /// Arms the lobby-expiry timer on the first join, converting the
    /// wall-clock expiry stamped at creation into a deadline.
    fn arm_lobby_timer(&mut self) {
        if self.lobby_deadline.is_some() || self.game.core().phase != Phase::Lobby {
            return;
        }
        let remaining =
            self.game.core().lobby_expires_at_ms.saturating_sub(now_ms());
        self.lobby_deadline = Some(Instant::now() + Duration::from_millis(remaining));
    }

    /// When the session reaches a terminal phase: cancel every timer
    /// (tick loop included) exactly once and arm retirement.
    fn sync_terminal(&mut self) {
        if !self.game.core().phase.is_terminal() || self.retire_deadline.is_some() {
            return;
        }
        self.next_tick_at = None;
        self.lobby_deadline = None;
        self.start_deadline = None;
        self.grace_deadlines = [None, None];
        self.retire_deadline = Some(Instant::now() + self.config.retire_linger);
        tracing::info!(
            game_id = %self.game.core().id,
            phase = %self.game.core().phase,
            "session reached terminal phase"
        );
    }

    /// Clears a pending grace deadline. Returns `true` if one was pending.
    fn clear_grace(&mut self, slot: Slot) -> bool {
        self.grace_deadlines[slot.index()].take().is_some()
    }

    // -- Event delivery ---------------------------------------------------

    fn broadcast_lobby_update(&self) {
        self.broadcast(ServerEvent::lobby_update(self.game.core(), now_ms()));
    }

    fn broadcast(&self, event: ServerEvent) {
        self.dispatch_one(Recipient::All, event);
    }

    fn dispatch(&self, events: Vec<(Recipient, ServerEvent)>) {
        for (recipient, event) in events {
            self.dispatch_one(recipient, event);
        }
    }

    /// Sends to the resolved recipients; connections that went away are
    /// silently skipped (the disconnect path handles them).
    fn dispatch_one(&self, recipient: Recipient, event: ServerEvent) {
        match recipient {
            Recipient::All => {
                for sender in self.senders.values() {
                    let _ = sender.send(event.clone());
                }
            }
            Recipient::User(user) => {
                if let Some(sender) = self.senders.get(&user) {
                    let _ = sender.send(event);
                }
            }
            Recipient::AllExcept(excluded) => {
                for (user, sender) in &self.senders {
                    if *user != excluded {
                        let _ = sender.send(event.clone());
                    }
                }
            }
        }
    }
}
