//! GA configuration.
//!
//! Presets are sized for rosters: the number of genes is employees × days,
//! and the per-gene mutation rate shrinks as rosters grow so that a child
//! differs from its parents in a handful of day cells.

use super::selection::Selection;
use crate::chromosome::CrossoverKind;
use crate::error::ConfigViolation;

/// Expected number of day cells a mutation reassigns per child.
const MUTATED_CELLS_PER_CHILD: f64 = 2.0;

/// Settings of the roster GA.
///
/// The seed is not stored here; every run receives it explicitly.
///
/// ```
/// use u_roster::ga::{GaConfig, Selection};
///
/// // 12 employees over four weeks.
/// let config = GaConfig::for_roster(12, 28)
///     .with_selection(Selection::Tournament(4))
///     .with_elite_count(3);
/// assert_eq!(config.population_size, GaConfig::balanced().population_size);
/// assert!(config.mutation_rate < GaConfig::default().mutation_rate);
/// assert!(config.validate().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GaConfig {
    /// Rosters per generation.
    pub population_size: usize,

    /// Generation budget.
    pub max_generations: usize,

    /// Parent selection.
    pub selection: Selection,

    /// Best rosters copied unchanged into the next generation (at least 1).
    pub elite_count: usize,

    /// Chance that a parent pair is recombined instead of copied.
    pub crossover_rate: f64,

    /// Chance that a single (employee, day) cell is reassigned.
    pub mutation_rate: f64,

    /// Whether children inherit whole days or single cells.
    pub crossover: CrossoverKind,

    /// Share of the first generation built by the greedy staffing heuristic;
    /// the rest is drawn at random.
    pub seeded_ratio: f64,

    /// Generations without a better roster before the run counts as
    /// converged. 0 runs the full budget.
    pub stagnation_limit: usize,

    /// Evaluate each generation on the rayon pool.
    pub parallel: bool,

    /// Wall-clock limit, polled before each generation.
    pub time_limit_ms: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            selection: Selection::default(),
            elite_count: 4,
            crossover_rate: 0.8,
            mutation_rate: 0.02,
            crossover: CrossoverKind::default(),
            seeded_ratio: 0.2,
            stagnation_limit: 50,
            parallel: true,
            time_limit_ms: None,
        }
    }
}

impl GaConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_elite_count(mut self, n: usize) -> Self {
        self.elite_count = n;
        self
    }

    /// Clamped to [0, 1].
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Clamped to [0, 1].
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_crossover(mut self, kind: CrossoverKind) -> Self {
        self.crossover = kind;
        self
    }

    /// Clamped to [0, 1].
    pub fn with_seeded_ratio(mut self, ratio: f64) -> Self {
        self.seeded_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_stagnation_limit(mut self, generations: usize) -> Self {
        self.stagnation_limit = generations;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Small rosters such as one team over a week or two.
    pub fn fast() -> Self {
        Self {
            population_size: 40,
            max_generations: 150,
            elite_count: 2,
            stagnation_limit: 30,
            ..Self::default()
        }
    }

    /// Department-sized rosters over a month.
    pub fn balanced() -> Self {
        Self {
            population_size: 100,
            max_generations: 400,
            stagnation_limit: 60,
            ..Self::default()
        }
    }

    /// Site-wide rosters; keeps more elites and recombines cell by cell.
    pub fn quality() -> Self {
        Self {
            population_size: 200,
            max_generations: 1_000,
            elite_count: 8,
            crossover: CrossoverKind::Uniform,
            stagnation_limit: 150,
            ..Self::default()
        }
    }

    /// Preset for a roster of `problem_size` = employees × days cells.
    ///
    /// The size bands match the factory's engine thresholds: below 150
    /// [`fast`](Self::fast), below 1500 [`balanced`](Self::balanced),
    /// otherwise [`quality`](Self::quality). The mutation rate is scaled so
    /// that about two cells change per child.
    pub fn auto_select(problem_size: usize) -> Self {
        let preset = if problem_size < 150 {
            Self::fast()
        } else if problem_size < 1500 {
            Self::balanced()
        } else {
            Self::quality()
        };
        let rate = MUTATED_CELLS_PER_CHILD / problem_size.max(1) as f64;
        preset.with_mutation_rate(rate.clamp(0.001, 0.05))
    }

    /// [`auto_select`](Self::auto_select) for `employees` over `days`.
    pub fn for_roster(employees: usize, days: usize) -> Self {
        Self::auto_select(employees * days)
    }

    /// Every violated setting, with `ga.`-prefixed field paths.
    pub fn validate(&self) -> Vec<ConfigViolation> {
        let mut violations = Vec::new();
        let mut require = |ok: bool, field: &str, message: String| {
            if !ok {
                violations.push(ConfigViolation::new(field, message));
            }
        };

        require(
            self.population_size >= 2,
            "ga.population_size",
            format!("need at least 2 rosters, got {}", self.population_size),
        );
        require(
            self.max_generations > 0,
            "ga.max_generations",
            "must be at least 1".to_string(),
        );
        require(
            self.elite_count >= 1 && self.elite_count < self.population_size.max(2),
            "ga.elite_count",
            format!(
                "must be in 1..{}, got {}",
                self.population_size.max(2),
                self.elite_count
            ),
        );
        for (field, rate) in [
            ("ga.crossover_rate", self.crossover_rate),
            ("ga.mutation_rate", self.mutation_rate),
            ("ga.seeded_ratio", self.seeded_ratio),
        ] {
            require(
                (0.0..=1.0).contains(&rate),
                field,
                format!("must be within [0, 1], got {rate}"),
            );
        }
        require(
            self.selection != Selection::Tournament(0),
            "ga.selection",
            "tournament needs at least one contestant".to_string(),
        );
        require(
            self.time_limit_ms != Some(0),
            "ga.time_limit_ms",
            "use None for no limit".to_string(),
        );
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(config: &GaConfig) -> Vec<String> {
        config.validate().into_iter().map(|v| v.field).collect()
    }

    #[test]
    fn test_default_is_valid() {
        let config = GaConfig::default();
        assert_eq!(config.selection, Selection::Tournament(3));
        assert_eq!(config.crossover, CrossoverKind::DayColumns);
        assert_eq!(config.elite_count, 4);
        assert!(config.parallel);
        assert!(config.time_limit_ms.is_none());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_rates_are_clamped() {
        let config = GaConfig::default()
            .with_crossover_rate(-0.5)
            .with_mutation_rate(2.0)
            .with_seeded_ratio(3.0);
        assert_eq!(config.crossover_rate, 0.0);
        assert_eq!(config.mutation_rate, 1.0);
        assert_eq!(config.seeded_ratio, 1.0);
    }

    #[test]
    fn test_validate_collects_every_field() {
        let mut config = GaConfig::default()
            .with_population_size(1)
            .with_max_generations(0)
            .with_selection(Selection::Tournament(0))
            .with_time_limit_ms(0);
        config.mutation_rate = 1.5;
        assert_eq!(
            fields(&config),
            [
                "ga.population_size",
                "ga.max_generations",
                "ga.elite_count",
                "ga.mutation_rate",
                "ga.selection",
                "ga.time_limit_ms",
            ]
        );
    }

    #[test]
    fn test_elites_must_leave_room_for_children() {
        let full = GaConfig::default().with_population_size(10).with_elite_count(10);
        assert_eq!(fields(&full), ["ga.elite_count"]);
        let none = GaConfig::default().with_elite_count(0);
        assert_eq!(fields(&none), ["ga.elite_count"]);
    }

    #[test]
    fn test_presets_grow_with_roster_size() {
        let presets = [GaConfig::fast(), GaConfig::balanced(), GaConfig::quality()];
        for config in &presets {
            assert!(config.validate().is_empty());
            assert!(config.time_limit_ms.is_none());
        }
        assert!(presets[0].population_size < presets[1].population_size);
        assert!(presets[1].max_generations < presets[2].max_generations);
    }

    #[test]
    fn test_auto_select_bands() {
        assert_eq!(GaConfig::auto_select(149).population_size, 40);
        assert_eq!(GaConfig::auto_select(150).population_size, 100);
        assert_eq!(GaConfig::auto_select(1499).population_size, 100);
        assert_eq!(GaConfig::auto_select(1500).population_size, 200);
    }

    #[test]
    fn test_mutation_rate_scales_with_cells() {
        // 5 employees x 7 days: capped at 5 %.
        assert_eq!(GaConfig::for_roster(5, 7).mutation_rate, 0.05);
        // 20 x 30 = 600 cells: two cells per child.
        let rate = GaConfig::for_roster(20, 30).mutation_rate;
        assert!((rate * 600.0 - 2.0).abs() < 1e-9);
        // Very large rosters bottom out.
        assert_eq!(GaConfig::auto_select(100_000).mutation_rate, 0.001);
        assert!(GaConfig::auto_select(0).validate().is_empty());
    }
}
