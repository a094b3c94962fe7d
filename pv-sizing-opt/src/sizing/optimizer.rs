use pv_model::Configuration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::sizing::config::{MAX_EXHAUSTIVE_PANELS, OptimizerSettings};

/// Dimension of the search space, one coordinate per panel class
const DIMENSIONS: usize = 3;

type Vector = [f64; DIMENSIONS];

/// Why the search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxGenerations,
    EvaluationBudget,
    /// No improvement for the configured number of generations
    Patience,
    /// The caller's predicate asked to stop
    EarlyStop,
    /// Every candidate of the box was evaluated
    Exhausted,
}

/// State handed to the early-stop predicate after every generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationProgress {
    pub generation: usize,
    pub evaluations: usize,
    pub best: Configuration,
    pub best_fitness: f64,
    pub stalled_generations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub best: Configuration,
    pub best_fitness: f64,
    pub generations: usize,
    pub evaluations: usize,
    pub stop_reason: StopReason,
}

/// Minimizes a fitness over `[0, max_panels]³`.
///
/// Candidates are continuous vectors; the fitness is expected to truncate them to
/// a [`Configuration`] itself. The search never fails, it returns the best point seen.
pub struct Optimizer {
    settings: OptimizerSettings,
    upper_bound: f64,
}

impl Optimizer {
    pub fn new(settings: OptimizerSettings, max_panels: u32) -> Self {
        Self {
            settings,
            upper_bound: max_panels as f64,
        }
    }

    pub fn population_size(&self) -> usize {
        self.settings.population_multiplier * DIMENSIONS
    }

    fn rng(&self) -> StdRng {
        match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn evaluate_all<F>(&self, objective: &F, candidates: &[Vector]) -> Vec<f64>
    where
        F: Fn(&Vector) -> f64 + Sync,
    {
        if self.settings.parallel {
            candidates.par_iter().map(|x| objective(x)).collect()
        } else {
            candidates.iter().map(objective).collect()
        }
    }

    fn clip(&self, value: f64) -> f64 {
        value.clamp(0.0, self.upper_bound)
    }

    /// Differential evolution (best/1/bin) until a stop condition is met
    pub fn minimize<F>(&self, objective: F) -> OptimizationResult
    where
        F: Fn(&Vector) -> f64 + Sync,
    {
        self.minimize_with(objective, |_| false)
    }

    /// Like [`Optimizer::minimize`], additionally stopping once `early_stop` returns true
    pub fn minimize_with<F, S>(&self, objective: F, mut early_stop: S) -> OptimizationResult
    where
        F: Fn(&Vector) -> f64 + Sync,
        S: FnMut(&GenerationProgress) -> bool,
    {
        let settings = &self.settings;
        let budget = settings.max_evaluations.unwrap_or(usize::MAX);
        let mut rng = self.rng();

        let mut population: Vec<Vector> = (0..self.population_size().min(budget).max(1))
            .map(|_| std::array::from_fn(|_| rng.gen_range(0.0..=self.upper_bound)))
            .collect();
        let mut fitness = self.evaluate_all(&objective, &population);
        let mut evaluations = population.len();

        let mut best_index = index_of_min(&fitness);
        let mut generation = 0;
        let mut stalled = 0;

        let stop_reason = loop {
            if evaluations >= budget {
                break StopReason::EvaluationBudget;
            }
            if generation >= settings.max_generations {
                break StopReason::MaxGenerations;
            }
            generation += 1;

            // Dither: one mutation factor per generation
            let mutation = rng.gen_range(settings.mutation_min..=settings.mutation_max);
            let best = population[best_index];
            let trial_count = population.len().min(budget - evaluations);

            let trials: Vec<Vector> = (0..trial_count)
                .map(|i| {
                    let (r1, r2) = pick_two_others(&mut rng, population.len(), i);
                    let forced = rng.gen_range(0..DIMENSIONS);
                    std::array::from_fn(|j| {
                        if j == forced || rng.r#gen::<f64>() < settings.crossover_probability {
                            self.clip(best[j] + mutation * (population[r1][j] - population[r2][j]))
                        } else {
                            population[i][j]
                        }
                    })
                })
                .collect();

            let trial_fitness = self.evaluate_all(&objective, &trials);
            evaluations += trials.len();

            let previous_best = fitness[best_index];
            for (i, (trial, value)) in trials.into_iter().zip(trial_fitness).enumerate() {
                if value <= fitness[i] {
                    population[i] = trial;
                    fitness[i] = value;
                }
            }
            best_index = index_of_min(&fitness);

            if fitness[best_index] < previous_best {
                stalled = 0;
            } else {
                stalled += 1;
            }

            let progress = GenerationProgress {
                generation,
                evaluations,
                best: Configuration::from_continuous(&population[best_index]),
                best_fitness: fitness[best_index],
                stalled_generations: stalled,
            };
            debug!(
                generation,
                evaluations,
                mutation,
                best_fitness = progress.best_fitness,
                best = %progress.best,
                "generation done"
            );

            if settings.patience.is_some_and(|patience| stalled >= patience) {
                break StopReason::Patience;
            }
            if early_stop(&progress) {
                break StopReason::EarlyStop;
            }
        };

        let result = OptimizationResult {
            best: Configuration::from_continuous(&population[best_index]),
            best_fitness: fitness[best_index],
            generations: generation,
            evaluations,
            stop_reason,
        };
        info!(
            best = %result.best,
            fitness = result.best_fitness,
            generations = result.generations,
            evaluations = result.evaluations,
            reason = ?result.stop_reason,
            "differential evolution finished"
        );
        result
    }

    /// Evaluates every integer configuration of the box, lowest fitness wins.
    ///
    /// Ties go to the configuration enumerated first (fewest high-efficiency panels,
    /// then fewest standard, then fewest low-cost). The box is clamped to
    /// `MAX_EXHAUSTIVE_PANELS` per type.
    pub fn exhaustive<F>(&self, objective: F) -> OptimizationResult
    where
        F: Fn(&Vector) -> f64 + Sync,
    {
        let max = (self.upper_bound as u32).min(MAX_EXHAUSTIVE_PANELS);
        if max < self.upper_bound as u32 {
            warn!(
                max_panels = self.upper_bound as u32,
                clamped = max,
                "exhaustive sweep clamped"
            );
        }
        let mut candidates = Vec::with_capacity((max as usize + 1).pow(DIMENSIONS as u32));
        for high_efficiency in 0..=max {
            for standard in 0..=max {
                for low_cost in 0..=max {
                    candidates.push([low_cost as f64, standard as f64, high_efficiency as f64]);
                }
            }
        }

        let fitness = self.evaluate_all(&objective, &candidates);
        let best_index = index_of_min(&fitness);

        let result = OptimizationResult {
            best: Configuration::from_continuous(&candidates[best_index]),
            best_fitness: fitness[best_index],
            generations: 0,
            evaluations: candidates.len(),
            stop_reason: StopReason::Exhausted,
        };
        info!(
            best = %result.best,
            fitness = result.best_fitness,
            evaluations = result.evaluations,
            "exhaustive sweep finished"
        );
        result
    }
}

/// First index of the smallest value; NaN never wins
fn index_of_min(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &value) in values.iter().enumerate() {
        if value < values[best] || values[best].is_nan() {
            best = i;
        }
    }
    best
}

/// Two distinct indices, both different from `exclude`
fn pick_two_others(rng: &mut StdRng, len: usize, exclude: usize) -> (usize, usize) {
    if len < 3 {
        // Too small to mutate; the trial collapses onto the best member
        return (exclude, exclude);
    }
    let mut first = rng.gen_range(0..len);
    while first == exclude {
        first = rng.gen_range(0..len);
    }
    let mut second = rng.gen_range(0..len);
    while second == exclude || second == first {
        second = rng.gen_range(0..len);
    }
    (first, second)
}
