use oxicasper::evaluation::{cross_validate, Equilateral, FitnessEvaluator, Sample, Table};
use oxicasper::genomics::{Dna, DnaConfig, DnaLayout, FieldSpec, Hyperparameters};
use oxicasper::networks::CasperConfig;
use oxiga::logging::{EvolutionLogger, ReportingLevel};
use oxiga::{Genome, Population, PopulationConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use std::num::NonZeroUsize;

/// 20 samples of 20 noisy features, spread evenly
/// over the codebook's classes.
fn synthetic_table(codebook: &Equilateral, rng: &mut ChaCha8Rng) -> Table {
    let samples = (0..20)
        .map(|i| {
            let class = i % codebook.class_count();
            Sample {
                features: (0..20)
                    .map(|f| {
                        let signal = if f % codebook.class_count() == class { 1.0 } else { 0.0 };
                        signal + rng.gen_range(-0.1..0.1)
                    })
                    .collect(),
                targets: codebook.encode(class).unwrap().to_vec(),
            }
        })
        .collect();
    Table::from_samples(20, codebook.code_width(), samples).unwrap()
}

#[test]
fn end_to_end_fold_averages() {
    let mut rng = ChaCha8Rng::seed_from_u64(2021);
    let codebook = Equilateral::new(5, 0.1, 0.9).unwrap();
    let table = synthetic_table(&codebook, &mut rng);
    let hyperparameters = Hyperparameters {
        features: vec![true; 20],
        casper: CasperConfig {
            unit_budget: 3,
            patience: 1.0,
            lr_1: 0.1,
            lr_2: 0.01,
            lr_3: 0.001,
        },
    };

    let averages = cross_validate(&table, &hyperparameters, 5, &codebook, &mut rng).unwrap();
    assert!(averages.train_loss.is_finite());
    assert!(averages.test_loss.is_finite());
    assert!((0.0..=100.0).contains(&averages.train_correctness));
    assert!((0.0..=100.0).contains(&averages.test_correctness));
}

#[test]
fn four_class_fold_averages() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let codebook = Equilateral::new(4, 0.1, 0.9).unwrap();
    let table = synthetic_table(&codebook, &mut rng);
    assert_eq!(table.target_count(), 3);
    let hyperparameters = Hyperparameters {
        features: vec![true; 20],
        casper: CasperConfig {
            unit_budget: 3,
            patience: 1.0,
            lr_1: 0.1,
            lr_2: 0.01,
            lr_3: 0.001,
        },
    };

    let averages = cross_validate(&table, &hyperparameters, 5, &codebook, &mut rng).unwrap();
    assert!(averages.train_loss.is_finite());
    assert!(averages.test_loss.is_finite());
    assert!((0.0..=100.0).contains(&averages.train_correctness));
    assert!((0.0..=100.0).contains(&averages.test_correctness));
}

#[test]
fn genetic_search_over_cross_validated_fitness() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let codebook = Equilateral::new(5, 0.1, 0.9).unwrap();
    let table = synthetic_table(&codebook, &mut rng);
    let layout = DnaLayout {
        unit_budget: FieldSpec::new(2, 1.0, 3.0),
        patience: FieldSpec::new(2, 1.0, 3.0),
        ..DnaLayout::standard()
    };
    let dna_config = DnaConfig {
        length: NonZeroUsize::new(layout.width()).unwrap(),
    };
    let evaluator = FitnessEvaluator::new(table, layout, &dna_config, 5, codebook).unwrap();

    let population_config = PopulationConfig {
        size: NonZeroUsize::new(6).unwrap(),
        crossover_rate: 0.8,
        mutation_rate: 0.01,
    };
    let mut population = Population::<_, Dna>::new(population_config, dna_config.clone(), &mut rng);
    let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);

    let best = population
        .run(3, &mut rng, &mut logger, |dna, rng| evaluator.fitness(dna, rng))
        .unwrap()
        .clone();

    assert!(best.conforms_to(&dna_config));
    assert!((0.0..=100.0).contains(&best.fitness()));
    assert_eq!(logger.iter().count(), 3);
    let best_so_far: Vec<f32> = logger.iter().map(|log| log.best_fitness).collect();
    assert!(best_so_far.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(best_so_far.last().copied(), Some(best.fitness()));

    let decoded = evaluator.layout().decode(&best);
    assert!((1..=3).contains(&decoded.casper.unit_budget));
}
