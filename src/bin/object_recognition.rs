use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use object_recognition::config::RecognitionConfig;
use object_recognition::data_loader::{FrameSequence, load_library};
use object_recognition::extractor::HarrisExtractor;
use object_recognition::io::{object_from_json, object_to_json};
use object_recognition::recognition::{FrameReport, ObjectRecognizer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a frame sequence for the reference objects, one object per frame
    Run {
        /// Folder of reference images, one object per image
        #[arg(short, long)]
        library: PathBuf,

        /// Folder of frames, or a glob pattern such as "frames/*.png"
        #[arg(short, long)]
        frames: String,

        /// Recognition config JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Folder for cached reference features
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Override the matcher ratio
        #[arg(long)]
        ratio: Option<f32>,

        /// Override the matcher epipolar distance in pixels
        #[arg(long)]
        distance: Option<f64>,

        /// Override the matcher RANSAC confidence
        #[arg(long)]
        confidence: Option<f64>,

        /// Report output
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,
    },
    /// Precompute the descriptor cache of a reference library
    Cache {
        #[arg(short, long)]
        library: PathBuf,

        #[arg(long)]
        cache_dir: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the default config as JSON
    Config {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<RecognitionConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(p) => object_from_json(p)?,
        None => RecognitionConfig::default(),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Commands::Run {
            library,
            frames,
            config,
            cache_dir,
            ratio,
            distance,
            confidence,
            output,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(r) = ratio {
                config.matcher.ratio = r;
            }
            if let Some(d) = distance {
                config.matcher.epipolar_distance = d;
            }
            if let Some(c) = confidence {
                config.matcher.confidence = c;
            }
            let extractor = HarrisExtractor::new(config.extractor);

            let now = Instant::now();
            let library = load_library(&library, &extractor, cache_dir.as_deref())?;
            log::info!(
                "loaded {} objects in {:.3} sec",
                library.len(),
                now.elapsed().as_secs_f64()
            );

            let frame_dir = PathBuf::from(&frames);
            let sequence = if frame_dir.is_dir() {
                FrameSequence::from_dir(&frame_dir)?
            } else {
                FrameSequence::from_glob(&frames)?
            };

            let mut recognizer = ObjectRecognizer::new(library, &config, Box::new(extractor));
            let reports: Vec<FrameReport> = sequence
                .map(|(path, frame)| {
                    log::trace!("{}", path.display());
                    recognizer.run(&frame)
                })
                .collect();
            let found = reports.iter().filter(|r| r.present).count();
            println!("{} of {} frames contained their object", found, reports.len());
            object_to_json(&output, &reports)?;
        }
        Commands::Cache {
            library,
            cache_dir,
            config,
        } => {
            let config = load_config(config.as_ref())?;
            let extractor = HarrisExtractor::new(config.extractor);
            let library = load_library(&library, &extractor, Some(cache_dir.as_path()))?;
            println!("cached {} objects in {}", library.len(), cache_dir.display());
        }
        Commands::Config { output } => {
            let config = RecognitionConfig::default();
            match output {
                Some(p) => object_to_json(&p, &config)?,
                None => println!("{}", serde_json::to_string_pretty(&config)?),
            }
        }
    }

    Ok(())
}
