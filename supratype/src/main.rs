mod config;
mod dataset;

use config::ExperimentConfig;

use oxicasper::evaluation::{Equilateral, FitnessEvaluator};
use oxicasper::genomics::{Dna, DnaConfig};
use oxiga::logging::{EvolutionLogger, ReportingLevel};
use oxiga::{Genome, Population};

use clap::Parser;
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use std::error::Error;
use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "supratype")]
#[command(about = "Search CasPer settings and input features for forest supra-type classification")]
struct Args {
    /// Headerless CSV of 20 feature columns and a 0-based class column
    dataset: PathBuf,

    /// RON experiment configuration (built-in defaults if omitted)
    experiment: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.experiment {
        Some(path) => ron::from_str(&fs::read_to_string(path)?)?,
        None => ExperimentConfig::default(),
    };
    info!("experiment: {}", ron::to_string(&config)?);

    let codebook = Equilateral::new(config.classes, config.code_low, config.code_high)?;
    let table = dataset::load(&args.dataset, &codebook)?;
    info!(
        "loaded {} samples of {} features from {}",
        table.len(),
        table.feature_count(),
        args.dataset.display()
    );

    let dna_config = DnaConfig {
        length: NonZeroUsize::new(config.layout.width()).ok_or("DNA layout has no bits")?,
    };
    let evaluator = FitnessEvaluator::new(
        table,
        config.layout.clone(),
        &dna_config,
        config.folds,
        codebook,
    )?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut population =
        Population::<_, Dna>::new(config.population.clone(), dna_config, &mut rng);
    let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    let best = population
        .run(config.generations, &mut rng, &mut logger, |dna, rng| {
            evaluator.fitness(dna, rng)
        })?
        .clone();

    println!("Best settings: {}", evaluator.layout().decode(&best));
    println!("Fitness: {:.2}%", best.fitness());
    println!("DNA: {}", best);
    println!("{}", ron::to_string(&logger)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experiment_file_is_optional() {
        let args = Args::try_parse_from(["supratype", "forest.csv"]).unwrap();
        assert_eq!(args.dataset, PathBuf::from("forest.csv"));
        assert!(args.experiment.is_none());

        let args = Args::try_parse_from(["supratype", "forest.csv", "run.ron"]).unwrap();
        assert_eq!(args.experiment, Some(PathBuf::from("run.ron")));
    }

    #[test]
    fn help_and_missing_dataset_are_not_paths() {
        let help = Args::try_parse_from(["supratype", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(Args::try_parse_from(["supratype"]).is_err());
    }
}
