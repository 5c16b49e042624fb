use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use coco_split::dataset::splitter::{default_output_path, DEFAULT_SEED, DEFAULT_TRAIN_RATIO};
use coco_split::{DatasetSplitter, SplitError, SplitSpec};
use env_logger::Env;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Split COCO annotation files into train/val subsets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the number of images, annotations and categories
    Info {
        /// COCO annotation json
        input: PathBuf,
    },
    /// Split by image into <stem>_train_* and <stem>_val_* files
    Split(SplitArgs),
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// COCO annotation json
    input: PathBuf,

    /// Fraction of images in the train split, in (0, 1]
    #[arg(long, conflicts_with = "count")]
    ratio: Option<f64>,

    /// Exact number of images in the train split
    #[arg(long)]
    count: Option<usize>,

    /// Any integer, negative ones included
    #[arg(long, default_value_t = DEFAULT_SEED, allow_negative_numbers = true)]
    seed: i64,

    #[arg(long, default_value = "outputs")]
    output_dir: PathBuf,

    /// Indent the written json
    #[arg(long)]
    pretty: bool,
}

impl SplitArgs {
    fn spec(&self) -> SplitSpec {
        match (self.ratio, self.count) {
            (_, Some(count)) => SplitSpec::Count(count),
            (ratio, None) => SplitSpec::Ratio(ratio.unwrap_or(DEFAULT_TRAIN_RATIO)),
        }
    }
}

fn file_stem(path: &Path) -> anyhow::Result<&str> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("Could not take a file name from {}", path.display()))
}

fn info(input: &Path) -> anyhow::Result<()> {
    let splitter = DatasetSplitter::from_path(input)?;
    let (images, annotations, categories) = splitter.get_counts();
    println!("Image num : {}", images);
    println!("Ann num : {}", annotations);
    println!("Category num : {}", categories);
    for (category, annotations) in splitter.annotations_per_category() {
        let name = category.name().unwrap_or("?");
        match category.supercategory() {
            Some(supercategory) => println!(
                "  {:>4} {} ({}) : {}",
                category.id, name, supercategory, annotations
            ),
            None => println!("  {:>4} {} : {}", category.id, name, annotations),
        }
    }
    Ok(())
}

fn split(args: &SplitArgs) -> anyhow::Result<()> {
    let splitter = DatasetSplitter::from_path(&args.input)?;
    let spec = args.spec();
    let (train, val) = splitter
        .split(spec, args.seed)
        .with_context(|| format!("Could not split {}", args.input.display()))?;

    let (train_name, val_name) = spec.output_names(file_stem(&args.input)?, splitter.images().len());
    for (name, half) in [(train_name, &train), (val_name, &val)] {
        let path = default_output_path(&args.output_dir, &name);
        let saved = if args.pretty {
            half.save_pretty(&path)
        } else {
            half.save(&path)
        };
        match saved {
            Ok(()) => {
                let (images, annotations, _) = half.get_counts();
                println!("{}: {} images, {} annotations", path.display(), images, annotations);
            }
            // already logged, the other half is still worth writing
            Err(SplitError::FileAlreadyExists(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("coco_split=info")).init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Info { input } => info(input),
        Command::Split(args) => split(args),
    }
}
