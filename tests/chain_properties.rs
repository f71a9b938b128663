//! Property tests for chain structure and movement

use glam::Vec2;
use proptest::prelude::*;

use zooma::sim::{Chain, Path, Token, TokenColor};

const SPACING: f32 = 50.0;
const LAST: usize = 20;

fn line_path() -> Path {
    Path::from_points((0..=LAST).map(|i| Vec2::new(i as f32 * SPACING, 0.0)))
}

fn target_ahead(x: f32) -> usize {
    ((x / SPACING).floor() as usize + 1).min(LAST)
}

/// Chain with heads first at the given x positions on the line path
fn chain_at(id: u32, xs: &[f32], colors: &[u8]) -> Chain {
    let mut chain = Chain::new(id, 0);
    for (x, c) in xs.iter().zip(colors) {
        chain.push_back(Token::new(Vec2::new(*x, 0.0), TokenColor(*c)), target_ahead(*x));
    }
    chain
}

/// Head position followed by non-overlapping gaps, heads first
fn arb_layout(max_len: usize) -> impl Strategy<Value = (Vec<f32>, Vec<u8>)> {
    (1..=max_len).prop_flat_map(|n| {
        (
            600.0f32..950.0,
            prop::collection::vec(40.0f32..100.0, n - 1),
            prop::collection::vec(0u8..4, n),
        )
            .prop_map(|(head, gaps, colors)| {
                let mut xs = vec![head];
                for gap in gaps {
                    let last = xs[xs.len() - 1];
                    xs.push(last - gap);
                }
                (xs, colors)
            })
    })
}

fn snapshot(chain: &Chain) -> Vec<(Vec2, TokenColor)> {
    chain.tokens().map(|t| (t.pos, t.color)).collect()
}

proptest! {
    #[test]
    fn prop_split_then_append_restores_sequence(
        (xs, colors) in arb_layout(10).prop_filter("need two tokens", |(xs, _)| xs.len() >= 2),
        cut in 0.0f64..1.0,
    ) {
        let mut chain = chain_at(1, &xs, &colors);
        let before = snapshot(&chain);
        let k = 1 + ((xs.len() - 1) as f64 * cut) as usize;
        let k = k.min(xs.len() - 1);

        let mut rear = chain.split(k, 2).unwrap();
        prop_assert_eq!(chain.len(), k);
        prop_assert_eq!(rear.len(), xs.len() - k);

        chain.append_chain(&mut rear);
        prop_assert!(rear.is_empty());
        prop_assert_eq!(snapshot(&chain), before);
    }

    #[test]
    fn prop_append_preserves_order_with_increasing_ids(
        (front_xs, front_colors) in arb_layout(6),
        (rear_xs, rear_colors) in arb_layout(6),
    ) {
        let mut front = chain_at(1, &front_xs, &front_colors);
        let mut rear = chain_at(2, &rear_xs, &rear_colors);
        let mut expected = snapshot(&front);
        expected.extend(snapshot(&rear));

        front.append_chain(&mut rear);

        prop_assert_eq!(snapshot(&front), expected);
        let ids: Vec<u32> = front.tokens().map(|t| t.id).collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_insertion_index_within_bounds(
        (xs, colors) in arb_layout(8),
        shot_x in 0.0f32..1000.0,
        shot_y in -60.0f32..60.0,
    ) {
        let path = line_path();
        let chain = chain_at(1, &xs, &colors);
        let shot = Token::new(Vec2::new(shot_x, shot_y), TokenColor(0));

        if let Some(insertion) = chain.get_insertion_point(&shot, &path) {
            prop_assert!(insertion.index <= chain.len());
            let mut grown = chain.clone();
            prop_assert!(grown.insert_token(shot, insertion).is_some());
            prop_assert_eq!(grown.len(), chain.len() + 1);
        }
    }

    #[test]
    fn prop_no_overlap_at_rest(
        (xs, colors) in arb_layout(6),
        speed in 0.1f32..5.0,
    ) {
        let path = line_path();
        let mut chain = chain_at(1, &xs, &colors);
        chain.motivate(speed);

        for _ in 0..200 {
            chain.update(&path);
            if chain.has_pending_insertions() {
                continue;
            }
            for pair in chain.records().windows(2) {
                let (a, b) = (&pair[0].token, &pair[1].token);
                prop_assert!(a.distance_to(b) >= a.radius + b.radius - 0.01);
            }
        }
    }

    #[test]
    fn prop_budget_spending_terminates(
        raw in prop::collection::vec((0.0f32..1000.0, 0.0f32..800.0), 2..30),
        speed in 1.0f32..1.0e6,
    ) {
        let path = Path::from_points(raw.into_iter().map(|(x, y)| Vec2::new(x, y)));
        let start = path.first().unwrap();
        let mut chain = Chain::single(1, 0, Token::new(start, TokenColor(0)), 0);

        let steps = chain.update_one(&path, 0, Some(speed));
        prop_assert!(steps >= 1);
        prop_assert!(steps <= path.len(), "{} steps on {} waypoints", steps, path.len());
    }
}
