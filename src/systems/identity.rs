use std::collections::VecDeque;

use colorsys::{Hsl, Rgb};
use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::{error::TrackingError, geometry_utils::Point};

use super::velocity::VelocityTracker;

pub const DEFAULT_HISTORY_LENGTH: usize = 5;

/// One tracked physical agent, persisting across frames via nearest-neighbour
/// continuity.
#[derive(Debug, Clone)]
pub struct Identity {
    id: usize,
    position: Point,
    /// Most-recent-first, never longer than `history_length`
    position_history: VecDeque<Point>,
    history_length: usize,
    colour: String,
    velocity_tracker: VelocityTracker,
    ticks_unmatched: u32,
}

impl Identity {
    fn new(id: usize, position: Point, colour: String, history_length: usize) -> Self {
        let position_history = VecDeque::from([position]);
        Identity {
            id,
            position,
            position_history,
            history_length,
            colour,
            velocity_tracker: VelocityTracker::new(),
            ticks_unmatched: 0,
        }
    }

    fn append_position(&mut self, position: Point) {
        if self.position_history.len() == self.history_length {
            self.position_history.pop_back();
        }
        self.position_history.push_front(position);
        self.position = position;
        self.ticks_unmatched = 0;
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Most recent first
    pub fn history(&self) -> impl Iterator<Item = Point> + '_ {
        self.position_history.iter().copied()
    }

    pub fn history_len(&self) -> usize {
        self.position_history.len()
    }

    pub fn colour(&self) -> &str {
        &self.colour
    }

    pub fn velocity_tracker(&self) -> &VelocityTracker {
        &self.velocity_tracker
    }

    pub fn velocity_tracker_mut(&mut self) -> &mut VelocityTracker {
        &mut self.velocity_tracker
    }

    /// Consecutive frames in which this identity claimed no candidate
    pub fn ticks_unmatched(&self) -> u32 {
        self.ticks_unmatched
    }
}

/// Registry of all identities for a tracking session. Ids are assigned
/// sequentially from 1 and never reused.
pub struct IdentityRegistry {
    identities: IndexMap<usize, Identity>,
    next_id: usize,
    history_length: usize,
    expire_ticks: Option<u32>,
}

impl IdentityRegistry {
    pub fn new(history_length: usize, expire_ticks: Option<u32>) -> Result<Self, TrackingError> {
        if history_length == 0 {
            return Err(TrackingError::EmptyHistory);
        }
        Ok(IdentityRegistry {
            identities: IndexMap::new(),
            next_id: 1,
            history_length,
            expire_ticks,
        })
    }

    /// Register a new identity. If no colour is given, one is picked so that
    /// neighbouring ids stay visually distinct.
    pub fn create_identity(&mut self, position: Point, colour: Option<&str>) -> &Identity {
        let id = self.next_id;
        self.next_id += 1;

        let colour = match colour {
            Some(c) => String::from(c),
            None => pick_colour(id),
        };
        info!("Created identity #{} at {:?} ({})", id, position, &colour);

        self.identities.insert(
            id,
            Identity::new(id, position, colour, self.history_length),
        );
        &self.identities[&id]
    }

    /// Greedy nearest-neighbour reassignment, in registration order.
    ///
    /// Each identity claims the closest candidate still in the pool, which is
    /// then removed so no detection is claimed twice in one frame. An earlier
    /// identity wins a candidate even when it is a better match for a later
    /// one, so agents whose detections cross closely can swap identities.
    /// Identities left without a candidate keep their position; surplus
    /// candidates are dropped.
    pub fn update_positions(&mut self, candidates: &[Point]) {
        let mut remaining: Vec<Point> = candidates.to_vec();

        for identity in self.identities.values_mut() {
            let nearest = remaining
                .iter()
                .enumerate()
                .map(|(i, p)| (i, p.distance(&identity.position)))
                .min_by(|(_, a), (_, b)| a.total_cmp(b))
                .map(|(i, _)| i);

            match nearest {
                Some(i) => {
                    let claimed = remaining.remove(i);
                    identity.append_position(claimed);
                }
                None => {
                    identity.ticks_unmatched += 1;
                    debug!(
                        "No candidate left for identity #{}; unmatched for {} tick(s)",
                        identity.id, identity.ticks_unmatched
                    );
                }
            }
        }

        if !remaining.is_empty() {
            debug!("{} unclaimed candidate(s) dropped", remaining.len());
        }
    }

    /// Remove identities that have gone unmatched for longer than the configured
    /// expiry, returning their ids. Never removes anything if no expiry is set.
    pub fn expire_stale(&mut self) -> Vec<usize> {
        let Some(limit) = self.expire_ticks else {
            return Vec::new();
        };
        let mut expired = Vec::new();
        self.identities.retain(|id, identity| {
            if identity.ticks_unmatched > limit {
                warn!(
                    "Identity #{} expired after {} unmatched ticks",
                    id, identity.ticks_unmatched
                );
                expired.push(*id);
                false
            } else {
                true
            }
        });
        expired
    }

    /// The first flag (if any) becomes every identity's target flag
    pub fn set_target_flag(&mut self, possible_flags: &[Point]) {
        if let Some(flag) = possible_flags.first() {
            for identity in self.identities.values_mut() {
                identity.velocity_tracker.set_target(*flag);
            }
        }
    }

    pub fn set_vector_starts(&mut self) {
        for identity in self.identities.values_mut() {
            identity.velocity_tracker.set_vector_start(identity.position);
        }
    }

    pub fn set_vector_ends(&mut self) {
        for identity in self.identities.values_mut() {
            identity.velocity_tracker.set_vector_end(identity.position);
        }
    }

    /// Recompute vectors for every identity, returning how many succeeded.
    /// Identities missing a start, end or flag are skipped.
    pub fn update_vectors(&mut self) -> usize {
        let mut updated = 0;
        for identity in self.identities.values_mut() {
            match identity.velocity_tracker.update_vectors() {
                Ok(()) => updated += 1,
                Err(e) => warn!("Skipping vectors for identity #{}: {}", identity.id, e),
            }
        }
        updated
    }

    pub fn get(&self, id: usize) -> Option<&Identity> {
        self.identities.get(&id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Identity> {
        self.identities.get_mut(&id)
    }

    pub fn position(&self, id: usize) -> Result<Point, TrackingError> {
        self.get(id)
            .map(|identity| identity.position)
            .ok_or(TrackingError::UnknownIdentity(id))
    }

    /// Registration order
    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.identities.values()
    }

    pub fn ids(&self) -> Vec<usize> {
        self.identities.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        IdentityRegistry {
            identities: IndexMap::new(),
            next_id: 1,
            history_length: DEFAULT_HISTORY_LENGTH,
            expire_ticks: None,
        }
    }
}

/// Hues spaced by the golden angle, as a hex string
pub fn pick_colour(index: usize) -> String {
    let hue = (index as f64 * 137.508) % 360.0;
    let rgb = Rgb::from(&Hsl::new(hue, 90.0, 55.0, None));
    rgb.to_hex_string()
}
