//! Seeded colour source shared by emitters and the turret

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::token::{PALETTE, TokenColor};

/// Longest single-colour cluster an emitter produces
pub const MAX_CLUSTER: u8 = 3;

/// The colours currently in play
#[derive(Debug, Clone)]
pub struct Palette {
    size: usize,
    colors: Vec<TokenColor>,
    rng: Pcg32,
}

impl Palette {
    pub fn new(size: usize, seed: u64) -> Self {
        let size = size.clamp(1, PALETTE.len());
        Self {
            size,
            colors: full_palette(size),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn colors(&self) -> &[TokenColor] {
        &self.colors
    }

    pub fn is_valid(&self, color: TokenColor) -> bool {
        self.colors.contains(&color)
    }

    /// Bring back every colour for the configured size
    pub fn reset(&mut self) {
        self.colors = full_palette(self.size);
    }

    /// Narrow the palette to `colors`. An empty set leaves it unchanged.
    pub fn restrict<I>(&mut self, colors: I)
    where
        I: IntoIterator<Item = TokenColor>,
    {
        let mut colors: Vec<TokenColor> = colors.into_iter().collect();
        colors.sort();
        colors.dedup();
        if !colors.is_empty() && colors != self.colors {
            log::debug!("Palette restricted to {:?}", colors);
            self.colors = colors;
        }
    }

    /// Any colour in play
    pub fn pick(&mut self) -> TokenColor {
        self.pick_excluding(None)
    }

    /// A colour other than `avoid`, unless it is the only one left
    pub fn pick_excluding(&mut self, avoid: Option<TokenColor>) -> TokenColor {
        let candidates: Vec<TokenColor> = self
            .colors
            .iter()
            .copied()
            .filter(|c| Some(*c) != avoid)
            .collect();
        let pool = if candidates.is_empty() {
            &self.colors
        } else {
            &candidates
        };
        pool[self.rng.random_range(0..pool.len())]
    }

    /// Length of the next cluster, 1 to `MAX_CLUSTER`
    pub fn cluster_length(&mut self) -> u8 {
        self.rng.random_range(1..=MAX_CLUSTER)
    }
}

fn full_palette(size: usize) -> Vec<TokenColor> {
    (0..size as u8).map(TokenColor).collect()
}

/// Emits runs of one colour, never the same colour twice in a row
#[derive(Debug, Clone, Default)]
pub struct ColorClusters {
    current: Option<TokenColor>,
    remaining: u8,
}

impl ColorClusters {
    pub fn next(&mut self, palette: &mut Palette) -> TokenColor {
        let current = match self.current {
            Some(color) if self.remaining > 0 && palette.is_valid(color) => color,
            previous => {
                let color = palette.pick_excluding(previous);
                self.remaining = palette.cluster_length();
                self.current = Some(color);
                color
            }
        };
        self.remaining -= 1;
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clusters_are_short_and_never_repeat() {
        let mut palette = Palette::new(4, 7);
        let mut clusters = ColorClusters::default();
        let colors: Vec<TokenColor> = (0..500).map(|_| clusters.next(&mut palette)).collect();

        let mut runs: Vec<(TokenColor, usize)> = Vec::new();
        for color in colors {
            match runs.last_mut() {
                Some((c, n)) if *c == color => *n += 1,
                _ => runs.push((color, 1)),
            }
        }
        // Adjacent clusters always differ, so each observed run is one cluster
        assert!(runs.iter().all(|(_, n)| (1..=MAX_CLUSTER as usize).contains(n)));
        assert!(runs.len() > 100);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Palette::new(5, 42);
        let mut b = Palette::new(5, 42);
        for _ in 0..50 {
            assert_eq!(a.pick(), b.pick());
        }
    }

    #[test]
    fn test_restrict_and_reset() {
        let mut palette = Palette::new(5, 1);
        palette.restrict([TokenColor(3), TokenColor(1), TokenColor(3)]);
        assert_eq!(palette.colors(), &[TokenColor(1), TokenColor(3)]);
        assert!(!palette.is_valid(TokenColor(0)));
        for _ in 0..20 {
            assert!(palette.is_valid(palette.clone().pick()));
        }

        palette.restrict(std::iter::empty());
        assert_eq!(palette.colors().len(), 2);

        palette.reset();
        assert_eq!(palette.colors().len(), 5);
    }

    #[test]
    fn test_single_colour_palette_repeats() {
        let mut palette = Palette::new(1, 3);
        let mut clusters = ColorClusters::default();
        for _ in 0..10 {
            assert_eq!(clusters.next(&mut palette), TokenColor(0));
        }
    }

    #[test]
    fn test_cluster_dropped_when_colour_leaves_palette() {
        let mut palette = Palette::new(3, 9);
        let mut clusters = ColorClusters::default();
        let first = clusters.next(&mut palette);
        let others: Vec<TokenColor> = palette.colors().iter().copied().filter(|c| *c != first).collect();
        palette.restrict(others);
        assert_ne!(clusters.next(&mut palette), first);
    }
}
