//! Chains: ordered queues of tokens threaded along a path
//!
//! Record 0 is the head, nearest the sink. Records stay in path order whichever
//! way the chain is moving; only the update order and the meaning of each
//! record's target waypoint flip when the chain is reversed.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::path::Path;
use super::token::Token;
use crate::consts::*;
use crate::to_heading;

/// A token and the waypoint it is walking toward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRecord {
    pub token: Token,
    pub target: usize,
}

/// Where an arriving token enters a chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsertionRecord {
    /// Slot the new record takes; existing records from here on shift back
    pub index: usize,
    /// Waypoint the new token walks toward
    pub target: usize,
    /// Landing point on the path beside the struck token
    pub pos: Vec2,
}

/// Which free ends of two chains touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainContact {
    /// This chain's head touched the other chain's tail
    HeadToTail,
    /// This chain's tail touched the other chain's head
    TailToHead,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub id: u32,
    /// Index of the shared path in the owning state
    pub path_id: usize,
    records: Vec<ChainRecord>,
    /// Speed magnitude (pixels per tick)
    speed: f32,
    /// Retreating toward the source
    reversed: bool,
    /// Local ids of freshly inserted tokens that still press on a neighbour
    pending: Vec<u32>,
    next_local_id: u32,
    /// Extra speed for tokens next to a pending insertion
    pub push_bonus: f32,
}

impl Chain {
    pub fn new(id: u32, path_id: usize) -> Self {
        Self {
            id,
            path_id,
            records: Vec::new(),
            speed: 0.0,
            reversed: false,
            pending: Vec::new(),
            next_local_id: 0,
            push_bonus: INSERTION_PUSH_BONUS,
        }
    }

    pub fn with_push_bonus(mut self, bonus: f32) -> Self {
        self.push_bonus = bonus;
        self
    }

    /// A one-token chain, as emitted at a source
    pub fn single(id: u32, path_id: usize, token: Token, target: usize) -> Self {
        let mut chain = Self::new(id, path_id);
        chain.push_back(token, target);
        chain
    }

    /// Append a token at the tail. Returns its local id.
    pub fn push_back(&mut self, mut token: Token, target: usize) -> u32 {
        let id = self.alloc_local_id();
        token.id = id;
        token.chain_tag = Some(self.id);
        self.records.push(ChainRecord { token, target });
        id
    }

    fn alloc_local_id(&mut self) -> u32 {
        let id = self.next_local_id;
        self.next_local_id += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ChainRecord] {
        &self.records
    }

    pub fn tokens(&self) -> impl DoubleEndedIterator<Item = &Token> {
        self.records.iter().map(|r| &r.token)
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.records.get(index).map(|r| &r.token)
    }

    pub fn head(&self) -> Option<&Token> {
        self.records.first().map(|r| &r.token)
    }

    pub fn tail(&self) -> Option<&Token> {
        self.records.last().map(|r| &r.token)
    }

    /// Signed speed: negative while retreating toward the source
    pub fn move_speed(&self) -> f32 {
        if self.reversed { -self.speed } else { self.speed }
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn has_pending_insertions(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Indices currently carrying a pending-insertion marker
    pub fn pending_indices(&self) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| self.pending.contains(&r.token.id))
            .map(|(i, _)| i)
            .collect()
    }

    /// Move forward toward the sink at `speed`
    pub fn motivate(&mut self, speed: f32) {
        self.face_forward();
        self.speed = speed.max(0.0);
    }

    /// Stop moving. A reversed chain gets its forward targets back.
    pub fn halt(&mut self) {
        self.face_forward();
        self.speed = 0.0;
    }

    /// Retreat toward the source at `speed`.
    ///
    /// Each target drops by one waypoint (not below zero) so every token heads
    /// for the waypoint behind it.
    pub fn reverse(&mut self, speed: f32) {
        if !self.reversed {
            for record in &mut self.records {
                record.target = record.target.saturating_sub(1);
            }
            self.reversed = true;
        }
        self.speed = speed.abs();
        log::debug!("Chain {} reversed at speed {}", self.id, self.speed);
    }

    fn face_forward(&mut self) {
        if self.reversed {
            for record in &mut self.records {
                record.target += 1;
            }
            self.reversed = false;
        }
    }

    /// The record this one must not run into: the one ahead in travel direction
    fn preceding_index(&self, index: usize) -> Option<usize> {
        if self.reversed {
            let next = index + 1;
            (next < self.records.len()).then_some(next)
        } else {
            index.checked_sub(1)
        }
    }

    fn is_marked(&self, index: usize) -> bool {
        self.records
            .get(index)
            .is_some_and(|r| self.pending.contains(&r.token.id))
    }

    fn is_pushed(&self, index: usize) -> bool {
        self.is_marked(index) || self.preceding_index(index).is_some_and(|p| self.is_marked(p))
    }

    fn bonus_speed(&self, path: &Path, index: usize, preceding: Option<usize>) -> f32 {
        let mut bonus = 0.0;
        if let Some(p) = preceding {
            let this = &self.records[index].token;
            let ahead = &self.records[p].token;
            let spacing = match (path.arc_position(this.pos), path.arc_position(ahead.pos)) {
                (Some(a), Some(b)) => (b - a).abs(),
                _ => this.distance_to(ahead),
            };
            let gap = (spacing - (this.radius + ahead.radius)).max(0.0);
            bonus += gap * CATCH_UP_FACTOR;
        }
        if self.is_pushed(index) {
            bonus += self.push_bonus;
        }
        bonus
    }

    /// Advance every token by one tick.
    ///
    /// Forward chains update head to tail, reversed chains tail to head, so the
    /// token ahead is always placed before its follower looks at it.
    pub fn update(&mut self, path: &Path) {
        if path.is_empty() || self.records.is_empty() {
            return;
        }

        if self.reversed {
            for index in (0..self.records.len()).rev() {
                self.update_one(path, index, None);
            }
        } else {
            for index in 0..self.records.len() {
                self.update_one(path, index, None);
            }
        }

        self.settle_pending();
    }

    /// Step one token, spending `speed` (or the chain speed plus bonuses).
    ///
    /// Returns how many movement steps this token took. Leftover budget after
    /// reaching a waypoint is spent immediately, so the count is bounded by the
    /// number of waypoints.
    pub fn update_one(&mut self, path: &Path, index: usize, speed: Option<f32>) -> usize {
        self.step(path, index, speed, 0, 0)
    }

    fn step(
        &mut self,
        path: &Path,
        index: usize,
        speed: Option<f32>,
        budget_depth: usize,
        push_depth: usize,
    ) -> usize {
        if speed.is_some_and(|s| s < SPEED_EPSILON) {
            return 0;
        }
        let Some(last) = path.last_index() else {
            return 0;
        };
        if budget_depth >= path.len() || index >= self.records.len() {
            return 0;
        }

        let preceding = self.preceding_index(index);

        // An insertion just ahead: let it shove forward first, hold this token.
        let mut frozen = false;
        if speed.is_none()
            && push_depth < self.records.len()
            && preceding.is_some_and(|p| self.is_marked(p))
        {
            if let Some(p) = preceding {
                self.step(path, p, None, 0, push_depth + 1);
                frozen = true;
            }
        }

        let move_speed = match speed {
            Some(s) => s,
            None => self.speed + self.bonus_speed(path, index, preceding),
        };

        let target_index = self.records[index].target.min(last);
        let target = path.points()[target_index];
        let pos = self.records[index].token.pos;

        let to_target = target - pos;
        let mut heading = to_heading(to_target);
        let mut movement = if frozen {
            0.0
        } else {
            move_speed.min(to_target.length())
        };

        let mut collided = false;
        let mut limit = None;
        if let Some(p) = preceding {
            let ahead = &self.records[p].token;
            let to_ahead = ahead.pos - pos;
            let gap = to_ahead.length() - (ahead.radius + self.records[index].token.radius);
            if gap < 0.0 {
                // Overlapping: back off along the line of centres to exactly touching.
                // Stacked centres give no line, so back off against the travel heading.
                if to_ahead.length() > TOUCH_EPSILON {
                    heading = to_heading(to_ahead);
                } else if heading == Vec2::ZERO {
                    heading = travel_heading(path, pos, self.reversed);
                }
                movement = gap;
                collided = true;
            } else {
                movement = movement.min(gap);
            }
            limit = Some(self.records[p].target);
        }

        let reversed = self.reversed;
        let record = &mut self.records[index];
        record.token.pos += heading * movement;

        if record.token.pos.distance(target) < ARRIVAL_EPSILON {
            record.target = next_target(target_index, last, limit, reversed);
        }

        let mut steps = 1;
        let remaining = move_speed - movement;
        if !collided && !frozen && remaining > ARRIVAL_EPSILON && movement > ARRIVAL_EPSILON {
            steps += self.step(path, index, Some(remaining), budget_depth + 1, push_depth);
        }
        steps
    }

    /// Drop markers whose token no longer presses on either neighbour
    fn settle_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let records = &self.records;
        let id = self.id;
        self.pending.retain(|local| {
            let Some(index) = records.iter().position(|r| r.token.id == *local) else {
                return false;
            };
            let pressing = |other: usize| {
                records.get(other).is_some_and(|r| {
                    let this = &records[index].token;
                    this.distance_to(&r.token) + TOUCH_EPSILON < this.radius + r.token.radius
                })
            };
            let still = pressing(index + 1) || index.checked_sub(1).is_some_and(pressing);
            if !still {
                log::debug!("Chain {} insertion {} settled", id, local);
            }
            still
        });
    }

    /// First record whose token overlaps `token`
    pub fn check_collision(&self, token: &Token) -> Option<usize> {
        self.records.iter().position(|r| r.token.overlaps(token))
    }

    /// Chains only touch at their free ends
    pub fn check_chain_collision(&self, other: &Chain) -> Option<ChainContact> {
        let (head, tail) = (self.head()?, self.tail()?);
        let (other_head, other_tail) = (other.head()?, other.tail()?);

        if head.overlaps(other_tail) {
            Some(ChainContact::HeadToTail)
        } else if tail.overlaps(other_head) {
            Some(ChainContact::TailToHead)
        } else {
            None
        }
    }

    /// Where `token` would enter this chain, if it touches it at all.
    ///
    /// The side is decided by the impact vector against the path direction at
    /// the struck token: hitting it from behind inserts after it. The token
    /// lands on the path beside the struck token, one radius sum away or
    /// halfway to the neighbour on that side if that is closer.
    pub fn get_insertion_point(&self, token: &Token, path: &Path) -> Option<InsertionRecord> {
        let hit_index = self.check_collision(token)?;
        let hit = &self.records[hit_index].token;

        let direction: Option<Vec2> = path
            .project(hit.pos)
            .and_then(|p| path.segment_vector(p.segment));

        let index = match direction {
            Some(direction) if (hit.pos - token.pos).dot(direction) > 0.0 => hit_index + 1,
            _ => hit_index,
        };

        let (pos, target) = self
            .landing(path, hit_index, index, token.radius)
            .unwrap_or_else(|| (hit.pos, self.inherited_target(index)));

        Some(InsertionRecord { index, target, pos })
    }

    fn inherited_target(&self, index: usize) -> usize {
        let slot = index.min(self.records.len().saturating_sub(1));
        self.records.get(slot).map(|r| r.target).unwrap_or(0)
    }

    /// On-path point and target for a token entering at `index` beside `hit_index`
    fn landing(
        &self,
        path: &Path,
        hit_index: usize,
        index: usize,
        radius: f32,
    ) -> Option<(Vec2, usize)> {
        let hit = &self.records[hit_index].token;
        let hit_arc = path.arc_position(hit.pos)?;

        // Entering at the struck slot puts the token on the sink side of it
        let toward_sink = index == hit_index;
        let neighbour = if toward_sink {
            hit_index.checked_sub(1)
        } else {
            Some(hit_index + 1)
        };

        let mut offset = hit.radius + radius;
        if let Some(arc) = neighbour
            .and_then(|n| self.records.get(n))
            .and_then(|r| path.arc_position(r.token.pos))
        {
            offset = offset.min((arc - hit_arc).abs() / 2.0);
        }

        let arc = if toward_sink {
            hit_arc + offset
        } else {
            hit_arc - offset
        };
        let (pos, segment) = path.point_at(arc)?;
        let last = path.last_index()?;
        let target = if self.reversed {
            segment
        } else {
            (segment + 1).min(last)
        };
        Some((pos, target))
    }

    /// Splice `token` in at `insertion.index`, placed at `insertion.pos`.
    /// Returns the new local id, or `None` if the index is past the tail.
    pub fn insert_token(&mut self, mut token: Token, insertion: InsertionRecord) -> Option<u32> {
        if insertion.index > self.records.len() {
            return None;
        }
        let id = self.alloc_local_id();
        token.id = id;
        token.pos = insertion.pos;
        token.chain_tag = Some(self.id);
        self.records.insert(
            insertion.index,
            ChainRecord {
                token,
                target: insertion.target,
            },
        );
        self.pending.push(id);
        log::debug!(
            "Chain {} inserted token {} at {} (target {})",
            self.id,
            id,
            insertion.index,
            insertion.target
        );
        Some(id)
    }

    pub fn remove(&mut self, index: usize) -> Option<ChainRecord> {
        if index >= self.records.len() {
            return None;
        }
        let record = self.records.remove(index);
        self.pending.retain(|id| *id != record.token.id);
        Some(record)
    }

    /// Move records `[index..]` into a new chain on the same path.
    ///
    /// The new chain keeps this chain's speed and direction; re-motivating the
    /// front part is up to the caller.
    pub fn split(&mut self, index: usize, new_id: u32) -> Option<Chain> {
        if index >= self.records.len() {
            return None;
        }

        let mut records = self.records.split_off(index);
        for record in &mut records {
            record.token.chain_tag = Some(new_id);
        }
        let (moved, kept): (Vec<u32>, Vec<u32>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|id| records.iter().any(|r| r.token.id == *id));
        self.pending = kept;

        log::debug!(
            "Chain {} split at {} -> chain {} ({} tokens)",
            self.id,
            index,
            new_id,
            records.len()
        );

        Some(Chain {
            id: new_id,
            path_id: self.path_id,
            records,
            speed: self.speed,
            reversed: self.reversed,
            pending: moved,
            next_local_id: self.next_local_id,
            push_bonus: self.push_bonus,
        })
    }

    /// Move every record of `other` onto this chain's tail, renumbering ids.
    ///
    /// `other` is left empty; removing it from the collection is the caller's job.
    ///
    /// # Panics
    /// If either chain is empty or they are on different paths.
    pub fn append_chain(&mut self, other: &mut Chain) {
        assert!(
            !self.records.is_empty(),
            "append_chain onto empty chain {}",
            self.id
        );
        assert!(
            !other.records.is_empty(),
            "append_chain from empty chain {}",
            other.id
        );
        assert_eq!(
            self.path_id, other.path_id,
            "append_chain across paths ({} onto {})",
            other.id, self.id
        );

        let pending = std::mem::take(&mut other.pending);
        let flip = other.reversed != self.reversed;
        for mut record in other.records.drain(..) {
            let old_id = record.token.id;
            let id = self.next_local_id;
            self.next_local_id += 1;

            record.token.id = id;
            record.token.chain_tag = Some(self.id);
            if flip {
                record.target = if self.reversed {
                    record.target.saturating_sub(1)
                } else {
                    record.target + 1
                };
            }
            if pending.contains(&old_id) {
                self.pending.push(id);
            }
            self.records.push(record);
        }

        log::debug!(
            "Chain {} absorbed chain {} ({} tokens)",
            self.id,
            other.id,
            self.records.len()
        );
    }
}

/// Unit direction of travel along the segment under `pos`
fn travel_heading(path: &Path, pos: Vec2, reversed: bool) -> Vec2 {
    let along = path
        .project(pos)
        .and_then(|p| path.segment_vector(p.segment))
        .map(to_heading)
        .unwrap_or(Vec2::ZERO);
    if reversed { -along } else { along }
}

/// Advance a target one waypoint in travel direction without passing the
/// target of the token ahead
fn next_target(current: usize, last: usize, limit: Option<usize>, reversed: bool) -> usize {
    if reversed {
        let next = current.saturating_sub(1);
        match limit {
            Some(limit) => next.max(limit.min(current)),
            None => next,
        }
    } else {
        let next = (current + 1).min(last);
        match limit {
            Some(limit) => next.min(limit.max(current)),
            None => next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::token::TokenColor;

    const SPACING: f32 = 50.0;

    /// Straight path along +x, source at 0 and sink at 1000
    fn line_path() -> Path {
        Path::from_points((0..=20).map(|i| Vec2::new(i as f32 * SPACING, 0.0)))
    }

    fn target_ahead(x: f32) -> usize {
        (x / SPACING).floor() as usize + 1
    }

    /// Chain with heads first at the given x positions
    fn chain_at(xs: &[f32], colors: &[u8]) -> Chain {
        let mut chain = Chain::new(1, 0);
        for (x, c) in xs.iter().zip(colors) {
            chain.push_back(
                Token::new(Vec2::new(*x, 0.0), TokenColor(*c)),
                target_ahead(*x),
            );
        }
        chain
    }

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a - b).length() < 0.001, "{a} is not {b}");
    }

    fn assert_resting(chain: &Chain) {
        for pair in chain.records().windows(2) {
            let (a, b) = (&pair[0].token, &pair[1].token);
            let d = a.distance_to(b);
            assert!(
                d >= a.radius + b.radius - 0.01,
                "{} and {} overlap: {d}",
                a.label(),
                b.label()
            );
        }
    }

    #[test]
    fn test_update_moves_head_along_path() {
        let path = line_path();
        let mut chain = chain_at(&[510.0, 470.0], &[0, 1]);
        chain.motivate(0.5);

        chain.update(&path);

        let head = chain.head().unwrap();
        assert!((head.pos.x - 510.5).abs() < 0.001);
        assert!(head.pos.y.abs() < 0.001);
        assert_resting(&chain);
    }

    #[test]
    fn test_update_on_empty_path_is_noop() {
        let mut chain = chain_at(&[510.0], &[0]);
        chain.motivate(5.0);
        chain.update(&Path::new());
        assert_eq!(chain.head().unwrap().pos, Vec2::new(510.0, 0.0));
    }

    #[test]
    fn test_followers_close_gaps_without_overlap() {
        let path = line_path();
        let mut chain = chain_at(&[500.0, 430.0, 300.0], &[0, 1, 2]);
        chain.motivate(2.0);

        for _ in 0..400 {
            chain.update(&path);
            assert_resting(&chain);
        }

        // The head stops at the final waypoint and the rest bunch up behind it
        let head = chain.head().unwrap();
        assert!((head.pos.x - 1000.0).abs() < 0.01);
        let tail = chain.tail().unwrap();
        assert!((head.pos.x - tail.pos.x - 80.0).abs() < 0.1);
    }

    #[test]
    fn test_update_one_spends_budget_across_waypoints() {
        let path = line_path();
        let mut chain = chain_at(&[0.0], &[0]);

        let steps = chain.update_one(&path, 0, Some(10_000.0));

        assert!(steps <= path.len(), "took {steps} steps");
        assert!((chain.head().unwrap().pos.x - 1000.0).abs() < 0.001);
        assert_eq!(chain.records()[0].target, path.len() - 1);
    }

    #[test]
    fn test_update_one_ignores_negligible_speed() {
        let path = line_path();
        let mut chain = chain_at(&[10.0], &[0]);
        assert_eq!(chain.update_one(&path, 0, Some(SPEED_EPSILON / 2.0)), 0);
        assert_eq!(chain.update_one(&path, 5, Some(1.0)), 0);
    }

    #[test]
    fn test_target_never_passes_token_ahead() {
        assert_eq!(next_target(4, 10, Some(4), false), 4);
        assert_eq!(next_target(4, 10, Some(7), false), 5);
        assert_eq!(next_target(10, 10, None, false), 10);
        assert_eq!(next_target(4, 10, Some(4), true), 4);
        assert_eq!(next_target(4, 10, Some(1), true), 3);
        assert_eq!(next_target(0, 10, None, true), 0);
    }

    #[test]
    fn test_reverse_retreats_toward_source() {
        let path = line_path();
        let mut chain = chain_at(&[510.0, 470.0], &[0, 1]);
        chain.motivate(0.5);

        chain.reverse(1.5);
        assert!(chain.move_speed() < 0.0);
        assert_eq!(chain.records()[0].target, 10);
        assert_eq!(chain.records()[1].target, 9);

        for _ in 0..10 {
            chain.update(&path);
            assert_resting(&chain);
        }
        assert!(chain.head().unwrap().pos.x < 510.0);
        assert!(chain.tail().unwrap().pos.x < 470.0 - 10.0);
    }

    #[test]
    fn test_halt_restores_forward_targets() {
        let mut chain = chain_at(&[510.0, 470.0], &[0, 1]);
        chain.reverse(1.0);
        chain.halt();

        assert!(!chain.is_reversed());
        assert_eq!(chain.move_speed(), 0.0);
        assert_eq!(chain.records()[0].target, 11);
        assert_eq!(chain.records()[1].target, 10);
    }

    #[test]
    fn test_check_collision_returns_first_overlap() {
        let chain = chain_at(&[500.0, 460.0, 420.0], &[0, 0, 0]);
        let shot = Token::new(Vec2::new(445.0, 10.0), TokenColor(1));
        assert_eq!(chain.check_collision(&shot), Some(1));

        let miss = Token::new(Vec2::new(445.0, 60.0), TokenColor(1));
        assert_eq!(chain.check_collision(&miss), None);
    }

    #[test]
    fn test_chain_contact_only_at_free_ends() {
        let front = chain_at(&[600.0, 560.0], &[0, 0]);
        let rear = chain_at(&[525.0, 485.0], &[1, 1]);
        assert_eq!(rear.check_chain_collision(&front), Some(ChainContact::HeadToTail));
        assert_eq!(front.check_chain_collision(&rear), Some(ChainContact::TailToHead));

        let far = chain_at(&[300.0], &[1]);
        assert_eq!(front.check_chain_collision(&far), None);
    }

    #[test]
    fn test_insertion_point_side_follows_impact() {
        let path = line_path();
        let chain = chain_at(&[500.0, 460.0, 420.0], &[0, 1, 2]);

        // Struck from behind: goes after the struck token
        let behind = Token::new(Vec2::new(455.0, 30.0), TokenColor(1));
        let rec = chain.get_insertion_point(&behind, &path).unwrap();
        assert_eq!(rec.index, 2);
        assert_eq!(rec.target, chain.records()[2].target);
        assert_close(rec.pos, Vec2::new(440.0, 0.0));

        // Struck from ahead: goes before it
        let ahead = Token::new(Vec2::new(465.0, 30.0), TokenColor(1));
        let rec = chain.get_insertion_point(&ahead, &path).unwrap();
        assert_eq!(rec.index, 1);
        assert_eq!(rec.target, chain.records()[1].target);
        assert_close(rec.pos, Vec2::new(480.0, 0.0));

        // Behind the tail: the slot is past the end, a full radius sum back
        let tail_hit = Token::new(Vec2::new(400.0, 10.0), TokenColor(1));
        let rec = chain.get_insertion_point(&tail_hit, &path).unwrap();
        assert_eq!(rec.index, 3);
        assert_eq!(rec.target, 8);
        assert_close(rec.pos, Vec2::new(380.0, 0.0));

        let miss = Token::new(Vec2::new(100.0, 300.0), TokenColor(1));
        assert!(chain.get_insertion_point(&miss, &path).is_none());
    }

    #[test]
    fn test_insert_marks_pending_until_settled() {
        let path = line_path();
        let mut chain = chain_at(&[500.0, 460.0, 420.0], &[0, 1, 0]);
        chain.motivate(0.5);

        let shot = Token::new(Vec2::new(455.0, 30.0), TokenColor(1));
        let rec = chain.get_insertion_point(&shot, &path).unwrap();
        let id = chain.insert_token(shot, rec).unwrap();

        assert_eq!(id, 3);
        assert_eq!(chain.pending_indices(), vec![2]);
        let colors: Vec<u8> = chain.tokens().map(|t| t.color.0).collect();
        assert_eq!(colors, vec![0, 1, 1, 0]);

        for _ in 0..5 {
            chain.update(&path);
        }
        assert!(!chain.has_pending_insertions());
        assert_resting(&chain);
    }

    #[test]
    fn test_shot_at_head_lands_on_path_ahead_of_it() {
        let path = line_path();
        let mut chain = chain_at(&[500.0, 460.0], &[0, 1]);

        // Off the path and on the sink side of the head
        let shot = Token::new(Vec2::new(520.0, -25.0), TokenColor(2));
        let rec = chain.get_insertion_point(&shot, &path).unwrap();
        assert_eq!(rec.index, 0);
        assert_eq!(rec.target, 11);
        assert_close(rec.pos, Vec2::new(540.0, 0.0));

        chain.insert_token(shot, rec).unwrap();
        let head = chain.head().unwrap();
        assert_close(head.pos, Vec2::new(540.0, 0.0));
        assert!(path.distance_to_sink(head.pos) < path.distance_to_sink(chain.records()[1].token.pos));
    }

    #[test]
    fn test_landing_follows_the_path_round_a_corner() {
        let path = Path::from_points([
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 100.0),
        ]);
        let chain = Chain::single(1, 0, Token::new(Vec2::new(90.0, 0.0), TokenColor(0)), 1);

        let shot = Token::new(Vec2::new(115.0, -20.0), TokenColor(1));
        let rec = chain.get_insertion_point(&shot, &path).unwrap();
        assert_eq!(rec.index, 0);
        assert_eq!(rec.target, 2);
        assert_close(rec.pos, Vec2::new(100.0, 30.0));
    }

    #[test]
    fn test_catch_up_uses_arc_gap_round_a_corner() {
        let path = Path::from_points([
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 100.0),
        ]);
        let mut chain = Chain::new(1, 0);
        chain.push_back(Token::new(Vec2::new(100.0, 30.0), TokenColor(0)), 2);
        chain.push_back(Token::new(Vec2::new(70.0, 0.0), TokenColor(1)), 1);

        // 60 along the track (gap 20) but only 42.4 apart in a straight line
        chain.update_one(&path, 1, None);
        let x = chain.records()[1].token.pos.x;
        assert!((x - 70.02).abs() < 0.0001, "got {x}");
    }

    #[test]
    fn test_push_bonus_speeds_up_pushed_tokens() {
        let path = line_path();
        let head_after_push = |bonus: f32| {
            let mut chain = chain_at(&[500.0, 460.0], &[0, 1]).with_push_bonus(bonus);
            let shot = Token::new(Vec2::new(520.0, -25.0), TokenColor(2));
            let rec = chain.get_insertion_point(&shot, &path).unwrap();
            chain.insert_token(shot, rec).unwrap();
            chain.motivate(0.5);
            chain.update(&path);
            chain.head().unwrap().pos.x
        };

        // The marked head steps itself, then again for its frozen follower
        assert!((head_after_push(1.0) - 543.0).abs() < 0.001);
        assert!((head_after_push(3.0) - 547.0).abs() < 0.001);
    }

    #[test]
    fn test_marked_predecessor_freezes_follower() {
        let path = line_path();
        let mut chain = chain_at(&[600.0, 500.0], &[0, 1]);
        for (index, x) in [(1, 560.0), (2, 520.0)] {
            let rec = InsertionRecord {
                index,
                target: target_ahead(x),
                pos: Vec2::new(x, 0.0),
            };
            chain.insert_token(Token::new(Vec2::ZERO, TokenColor(2)), rec);
        }
        assert_eq!(chain.pending_indices(), vec![1, 2]);
        chain.motivate(0.5);

        chain.update(&path);

        let xs: Vec<f32> = chain.tokens().map(|t| t.pos.x).collect();
        assert!((xs[0] - 600.5).abs() < 0.001);
        assert!((xs[1] - 560.5).abs() < 0.001);
        // Both followers of a marked token hold; the overlapping one backs off
        assert_eq!(xs[2], 520.0);
        assert!((xs[3] - 480.0).abs() < 0.001);
        assert_resting(&chain);
    }

    #[test]
    fn test_push_through_marked_run_is_bounded() {
        let path = line_path();
        let mut chain = chain_at(&[800.0], &[0]);
        for index in 1..12 {
            let x = 800.0 - 40.0 * index as f32;
            let rec = InsertionRecord {
                index,
                target: target_ahead(x),
                pos: Vec2::new(x, 0.0),
            };
            chain.insert_token(Token::new(Vec2::ZERO, TokenColor(1)), rec);
        }
        assert_eq!(chain.pending_indices().len(), 11);
        chain.motivate(0.5);
        let before: Vec<f32> = chain.tokens().map(|t| t.pos.x).collect();

        // The tail re-steps every marked token ahead of it and stays put
        assert_eq!(chain.update_one(&path, 11, None), 1);
        let after: Vec<f32> = chain.tokens().map(|t| t.pos.x).collect();
        assert_eq!(before, after);

        chain.update(&path);
        let xs: Vec<f32> = chain.tokens().map(|t| t.pos.x).collect();
        assert!((xs[0] - 800.5).abs() < 0.001);
        assert!((xs[1] - 760.5).abs() < 0.001);
        for (index, x) in xs.iter().enumerate().skip(2) {
            assert_eq!(*x, before[index], "token {index} moved");
        }
    }

    #[test]
    fn test_insert_past_tail_is_rejected() {
        let mut chain = chain_at(&[500.0], &[0]);
        let token = Token::new(Vec2::ZERO, TokenColor(0));
        let rec = InsertionRecord {
            index: 5,
            target: 0,
            pos: Vec2::ZERO,
        };
        assert!(chain.insert_token(token, rec).is_none());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_split_partitions_records() {
        let mut chain = chain_at(&[500.0, 460.0, 420.0, 380.0], &[0, 1, 2, 3]);
        chain.motivate(0.5);

        assert!(chain.split(4, 9).is_none());

        let rear = chain.split(2, 9).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(rear.len(), 2);
        assert_eq!(rear.id, 9);
        assert_eq!(rear.path_id, chain.path_id);
        assert_eq!(rear.head().unwrap().color, TokenColor(2));
        assert_eq!(rear.head().unwrap().chain_tag, Some(9));
        assert_eq!(rear.move_speed(), 0.5);
    }

    #[test]
    fn test_append_renumbers_ids() {
        let mut front = chain_at(&[600.0, 560.0], &[0, 1]);
        let mut rear = chain_at(&[520.0, 480.0, 440.0], &[2, 3, 4]);
        rear.id = 2;

        front.append_chain(&mut rear);

        assert!(rear.is_empty());
        let ids: Vec<u32> = front.tokens().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        let colors: Vec<u8> = front.tokens().map(|t| t.color.0).collect();
        assert_eq!(colors, vec![0, 1, 2, 3, 4]);
        assert!(front.tokens().all(|t| t.chain_tag == Some(1)));
    }

    #[test]
    fn test_append_converts_reversed_partner_targets() {
        let mut front = chain_at(&[600.0], &[0]);
        let mut rear = chain_at(&[520.0], &[1]);
        rear.reverse(1.0);
        assert_eq!(rear.records()[0].target, 10);

        front.append_chain(&mut rear);
        assert_eq!(front.records()[1].target, 11);
    }

    #[test]
    #[should_panic(expected = "append_chain from empty chain")]
    fn test_append_empty_partner_panics() {
        let mut front = chain_at(&[600.0], &[0]);
        let mut empty = Chain::new(7, 0);
        front.append_chain(&mut empty);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut chain = chain_at(&[500.0, 460.0], &[0, 1]);
        assert!(chain.remove(2).is_none());
        assert_eq!(chain.remove(0).unwrap().token.color, TokenColor(0));
        assert_eq!(chain.len(), 1);
    }
}
