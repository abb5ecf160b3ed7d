//! The shared multiplayer room.
//!
//! [`MultiplayerRoom`] is plain, synchronous state. It never performs I/O:
//! every operation returns the notices to deliver as [`Delivery`] values
//! and leaves sending them to the caller.

use std::fmt;
use std::sync::Arc;

use crate::{GameConfig, Hint, Notice, RoomError, TargetSource};

/// Handle to one room membership.
///
/// Points at a slot in the room's member table. A freed slot is reused
/// with a bumped generation, so a handle kept past `leave` never names
/// the member that took the slot next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId {
    slot: u32,
    generation: u32,
}

impl MemberId {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}.{}", self.slot, self.generation)
    }
}

/// A notice addressed to one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery<A> {
    pub to: MemberId,
    pub address: A,
    pub notice: Notice,
}

/// How a round finished. `target` is the number that was just replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEnd {
    Won {
        winner: MemberId,
        round: u64,
        target: i64,
    },
    Exhausted {
        round: u64,
        target: i64,
    },
}

/// Result of [`MultiplayerRoom::join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joined {
    pub id: MemberId,
    /// The join activated the room.
    pub opened: bool,
    pub round: u64,
    pub roster_size: usize,
}

/// Result of [`MultiplayerRoom::leave`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Left {
    /// The leave emptied the roster and deactivated the room.
    pub closed: bool,
    pub roster_size: usize,
}

/// Result of [`MultiplayerRoom::guess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessResult<A> {
    pub deliveries: Vec<Delivery<A>>,
    pub round_end: Option<RoundEnd>,
}

/// Point-in-time view of the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub active: bool,
    pub target: Option<i64>,
    pub round: u64,
    pub members: Vec<(MemberId, u32)>,
}

#[derive(Debug)]
struct Member<A> {
    address: A,
    remaining: u32,
}

#[derive(Debug)]
struct Slot<A> {
    generation: u32,
    member: Option<Member<A>>,
}

/// The single shared game.
///
/// `A` is whatever the caller needs to reach a member, usually an outbound
/// channel. The room is active exactly when it has members; the target is
/// set exactly when the room is active.
pub struct MultiplayerRoom<A> {
    config: GameConfig,
    targets: Arc<dyn TargetSource>,
    target: Option<i64>,
    round: u64,
    slots: Vec<Slot<A>>,
    free: Vec<u32>,
    len: usize,
}

impl<A: Clone> MultiplayerRoom<A> {
    pub fn new(config: GameConfig, targets: Arc<dyn TargetSource>) -> Self {
        Self {
            config,
            targets,
            target: None,
            round: 0,
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Adds a member with a full set of attempts, activating the room if
    /// it was empty.
    pub fn join(&mut self, address: A) -> Joined {
        let opened = self.target.is_none();
        if opened {
            self.target = Some(self.targets.draw(&self.config));
            self.round += 1;
        }

        let member = Member {
            address,
            remaining: self.config.max_attempts,
        };
        let id = match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                entry.generation = entry.generation.wrapping_add(1);
                entry.member = Some(member);
                MemberId {
                    slot,
                    generation: entry.generation,
                }
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    member: Some(member),
                });
                MemberId {
                    slot,
                    generation: 0,
                }
            }
        };
        self.len += 1;

        Joined {
            id,
            opened,
            round: self.round,
            roster_size: self.len,
        }
    }

    /// Removes a member. The last member out deactivates the room.
    pub fn leave(&mut self, id: MemberId) -> Result<Left, RoomError> {
        let slot = self.slot_mut(id)?;
        slot.member = None;
        self.free.push(id.slot);
        self.len -= 1;

        let closed = self.len == 0;
        if closed {
            self.target = None;
        }
        Ok(Left {
            closed,
            roster_size: self.len,
        })
    }

    /// Plays one guess for `id`.
    ///
    /// A room whose members are all out of attempts is reset before
    /// anything else, and the guess that found it so is not counted.
    pub fn guess(&mut self, id: MemberId, value: i64) -> Result<GuessResult<A>, RoomError> {
        let remaining = self.member(id)?.remaining;
        let target = self
            .target
            .ok_or_else(|| RoomError::InvalidState("active member in inactive room".into()))?;

        if self.all_exhausted() {
            return Ok(self.finish_round(|_| Notice::EveryoneExhausted, None, target));
        }
        if remaining == 0 {
            return Ok(self.reply(id, Notice::Exhausted));
        }
        if !self.config.contains(value) {
            return Ok(self.reply(id, Notice::OutOfRange));
        }

        let remaining = {
            let member = self.member_mut(id)?;
            member.remaining -= 1;
            member.remaining
        };

        let hint = Hint::judge(value, target);
        if hint.is_correct() {
            return Ok(self.finish_round(
                |member| {
                    if member == id {
                        Notice::YouWon
                    } else {
                        Notice::SomeoneWon
                    }
                },
                Some(id),
                target,
            ));
        }
        if self.all_exhausted() {
            return Ok(self.finish_round(|_| Notice::EveryoneExhausted, None, target));
        }
        if remaining == 0 {
            return Ok(self.reply(id, Notice::Exhausted));
        }
        Ok(self.reply(id, Notice::Hint(hint)))
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            active: self.is_active(),
            target: self.target,
            round: self.round,
            members: self
                .members()
                .map(|(id, member)| (id, member.remaining))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    /// Attempts `id` has left this round.
    pub fn remaining(&self, id: MemberId) -> Option<u32> {
        self.member(id).ok().map(|m| m.remaining)
    }

    fn reply(&self, id: MemberId, notice: Notice) -> GuessResult<A> {
        let deliveries = self
            .member(id)
            .map(|member| Delivery {
                to: id,
                address: member.address.clone(),
                notice,
            })
            .into_iter()
            .collect();
        GuessResult {
            deliveries,
            round_end: None,
        }
    }

    /// Redraws the target, refills every member, and tells each of them
    /// what `notice_for` picks.
    fn finish_round(
        &mut self,
        notice_for: impl Fn(MemberId) -> Notice,
        winner: Option<MemberId>,
        target: i64,
    ) -> GuessResult<A> {
        let round = self.round;
        self.target = Some(self.targets.draw(&self.config));
        self.round += 1;

        let max_attempts = self.config.max_attempts;
        for member in self.slots.iter_mut().filter_map(|s| s.member.as_mut()) {
            member.remaining = max_attempts;
        }

        let deliveries = self
            .members()
            .map(|(to, member)| Delivery {
                to,
                address: member.address.clone(),
                notice: notice_for(to),
            })
            .collect();
        let round_end = match winner {
            Some(winner) => RoundEnd::Won {
                winner,
                round,
                target,
            },
            None => RoundEnd::Exhausted { round, target },
        };
        GuessResult {
            deliveries,
            round_end: Some(round_end),
        }
    }

    fn all_exhausted(&self) -> bool {
        self.len > 0 && self.members().all(|(_, m)| m.remaining == 0)
    }

    fn members(&self) -> impl Iterator<Item = (MemberId, &Member<A>)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry.member.as_ref().map(|member| {
                (
                    MemberId {
                        slot: slot as u32,
                        generation: entry.generation,
                    },
                    member,
                )
            })
        })
    }

    fn slot_mut(&mut self, id: MemberId) -> Result<&mut Slot<A>, RoomError> {
        self.slots
            .get_mut(id.slot as usize)
            .filter(|s| s.generation == id.generation && s.member.is_some())
            .ok_or(RoomError::NotInRoom(id))
    }

    fn member(&self, id: MemberId) -> Result<&Member<A>, RoomError> {
        self.slots
            .get(id.slot as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.member.as_ref())
            .ok_or(RoomError::NotInRoom(id))
    }

    fn member_mut(&mut self, id: MemberId) -> Result<&mut Member<A>, RoomError> {
        self.slot_mut(id)?
            .member
            .as_mut()
            .ok_or(RoomError::NotInRoom(id))
    }
}

impl<A> fmt::Debug for MultiplayerRoom<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiplayerRoom")
            .field("config", &self.config)
            .field("active", &self.target.is_some())
            .field("round", &self.round)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}
