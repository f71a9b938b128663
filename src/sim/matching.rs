//! Colour matching between tokens and chains
//!
//! Three kinds of match exist:
//! - a fired token landing next to tokens of its colour (local run scan)
//! - two chains on one path whose facing ends share a colour, which makes the
//!   chain nearer the sink back up toward the other (cascade scan)
//! - a backing-up chain meeting its partner head-on, which removes the runs on
//!   both sides of the contact or falls back to a plain merge
//!
//! Nothing here removes chains from the collection. Chains emptied by a match
//! or a merge are left empty for the driver to sweep once its scans are done.

use super::chain::{Chain, InsertionRecord};
use super::path::Path;
use super::state::IdAllocator;
use super::token::{Token, TokenColor};

/// What a fired token did to the chain it struck
#[derive(Debug)]
pub enum ShotOutcome {
    /// The token joined the chain at `index`
    Inserted { index: usize },
    /// The insertion slot was past the tail; the token was dropped
    Missed,
    /// A run was removed. `rear` holds the part of the chain behind the gap.
    Matched {
        match_count: usize,
        rear: Option<Chain>,
    },
}

/// What happened when two chains touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Head-on match: runs removed from the backing-up chain and its partner
    Combo { chain_id: u32, match_count: usize },
    /// `absorbed` was appended onto `kept`. `head_on` is set when a backing-up
    /// chain failed to match and merged instead.
    Merged { kept: u32, absorbed: u32, head_on: bool },
}

/// Cascade scan decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeAction {
    Reversed { chain_id: u32 },
    Halted { chain_id: u32 },
}

/// Indices of existing records that would join a run with a `color` token
/// placed at `index`. The placed token itself is not included.
pub fn scan_insertion_run(chain: &Chain, index: usize, color: TokenColor) -> Vec<usize> {
    let matches = |i: usize| chain.get(i).is_some_and(|t| t.color == color);

    let mut run: Vec<usize> = (index..chain.len()).take_while(|&i| matches(i)).collect();
    run.extend((0..index).rev().take_while(|&i| matches(i)));
    run
}

/// Land `token` in `chain` at `insertion`, removing the run it completes.
///
/// On a match the run is removed and the chain is cut where the run started.
/// The front part stops; the rear part keeps moving and is returned. The
/// fired token itself never joins the chain in that case.
pub fn resolve_shot(
    chain: &mut Chain,
    token: Token,
    insertion: InsertionRecord,
    threshold: usize,
    ids: &mut IdAllocator,
) -> ShotOutcome {
    let mut run = scan_insertion_run(chain, insertion.index, token.color);
    let match_count = run.len() + 1;

    if match_count < threshold {
        return match chain.insert_token(token, insertion) {
            Some(_) => ShotOutcome::Inserted {
                index: insertion.index,
            },
            None => {
                log::warn!(
                    "Chain {} has no slot {} for a fired token",
                    chain.id,
                    insertion.index
                );
                ShotOutcome::Missed
            }
        };
    }

    run.sort_unstable_by(|a, b| b.cmp(a));
    for &index in &run {
        chain.remove(index);
    }

    let lowest = run.last().copied().unwrap_or(insertion.index);
    let rear = if lowest < chain.len() {
        chain.split(lowest, ids.next_chain_id())
    } else {
        None
    };
    chain.halt();

    log::debug!(
        "Chain {} matched {} tokens at {} (rear: {:?})",
        chain.id,
        match_count,
        lowest,
        rear.as_ref().map(|c| c.id)
    );

    ShotOutcome::Matched { match_count, rear }
}

/// Do the facing ends of `near` (closer to the sink) and `far` share a colour?
pub fn boundary_colors_match(near: &Chain, far: &Chain) -> bool {
    match (near.tail(), far.head()) {
        (Some(tail), Some(head)) => tail.color == head.color,
        _ => false,
    }
}

/// Arc distance from a chain's head to the sink of its path
pub fn head_distance_to_sink(chain: &Chain, path: &Path) -> f32 {
    chain
        .head()
        .map(|head| path.distance_to_sink(head.pos))
        .unwrap_or(f32::INFINITY)
}

/// Indices into `chains` of the non-empty chains on `path_id`, nearest the sink first
pub fn chains_by_sink_distance(chains: &[Chain], path_id: usize, path: &Path) -> Vec<usize> {
    let mut order: Vec<(usize, f32)> = chains
        .iter()
        .enumerate()
        .filter(|(_, c)| c.path_id == path_id && !c.is_empty())
        .map(|(i, c)| (i, head_distance_to_sink(c, path)))
        .collect();
    order.sort_by(|a, b| a.1.total_cmp(&b.1));
    order.into_iter().map(|(i, _)| i).collect()
}

/// Walk every adjacent pair of chains on each path and start or stop cascades.
///
/// A chain whose tail matches the head of the chain behind it backs up at
/// `reverse_speed`. A backing-up chain whose partner no longer matches stops.
pub fn scan_cascades(chains: &mut [Chain], paths: &[Path], reverse_speed: f32) -> Vec<CascadeAction> {
    let mut actions = Vec::new();

    for (path_id, path) in paths.iter().enumerate() {
        let order = chains_by_sink_distance(chains, path_id, path);
        for pair in order.windows(2) {
            let (near, far) = (pair[0], pair[1]);
            let matched = boundary_colors_match(&chains[near], &chains[far]);
            let chain = &mut chains[near];

            if matched && !chain.is_reversed() {
                chain.reverse(reverse_speed);
                actions.push(CascadeAction::Reversed { chain_id: chain.id });
            } else if !matched && chain.is_reversed() {
                chain.halt();
                log::debug!("Chain {} halted, nothing left to cascade into", chain.id);
                actions.push(CascadeAction::Halted { chain_id: chain.id });
            }
        }
    }

    actions
}

/// Resolve two touching chains on the same path. `None` if they do not touch.
pub fn resolve_contact(
    a: &mut Chain,
    b: &mut Chain,
    path: &Path,
    threshold: usize,
) -> Option<ContactOutcome> {
    a.check_chain_collision(b)?;

    let (near, far) = if head_distance_to_sink(a, path) <= head_distance_to_sink(b, path) {
        (a, b)
    } else {
        (b, a)
    };

    if !near.is_reversed() {
        let (kept, absorbed) = merge_chains(near, far, path);
        return Some(ContactOutcome::Merged {
            kept,
            absorbed,
            head_on: false,
        });
    }

    if boundary_colors_match(near, far) {
        let near_run = tail_run(near);
        let far_run = head_run(far);
        let match_count = near_run + far_run;

        if match_count >= threshold {
            for _ in 0..near_run {
                near.remove(near.len() - 1);
            }
            for _ in 0..far_run {
                far.remove(0);
            }
            log::debug!(
                "Chains {} and {} met head-on, {} tokens removed",
                near.id,
                far.id,
                match_count
            );
            return Some(ContactOutcome::Combo {
                chain_id: near.id,
                match_count,
            });
        }
    }

    let (kept, absorbed) = merge_chains(near, far, path);
    Some(ContactOutcome::Merged {
        kept,
        absorbed,
        head_on: true,
    })
}

/// Length of the single-colour run at a chain's tail
fn tail_run(chain: &Chain) -> usize {
    let Some(color) = chain.tail().map(|t| t.color) else {
        return 0;
    };
    chain.tokens().rev().take_while(|t| t.color == color).count()
}

/// Length of the single-colour run at a chain's head
fn head_run(chain: &Chain) -> usize {
    let Some(color) = chain.head().map(|t| t.color) else {
        return 0;
    };
    chain.tokens().take_while(|t| t.color == color).count()
}

/// Append whichever chain is farther from the sink onto the nearer one.
///
/// The survivor moves at the faster of the two signed speeds. Returns
/// `(kept, absorbed)` chain ids; the absorbed chain is left empty.
pub fn merge_chains(a: &mut Chain, b: &mut Chain, path: &Path) -> (u32, u32) {
    let (near, far) = if head_distance_to_sink(a, path) <= head_distance_to_sink(b, path) {
        (a, b)
    } else {
        (b, a)
    };

    let speed = near.move_speed().max(far.move_speed());
    near.append_chain(far);
    if speed < 0.0 {
        near.reverse(-speed);
    } else {
        near.motivate(speed);
    }

    (near.id, far.id)
}
