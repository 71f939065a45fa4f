use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use game::{BoardConfig, CellCount, Coord, Difficulty};
use sapper_core as game;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

mod play;
mod records;
mod render;

use records::{RecordStore, Records};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// What log level to use
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    /// Where settings and best times are kept
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play in the terminal (the default)
    Play(PlayArgs),
    /// Generate a board and write it as a level file
    Export {
        #[command(flatten)]
        board: BoardArgs,

        /// Output file, stdout if missing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a level file with every cell uncovered
    Show { level: PathBuf },
    /// Print the best times
    Times {
        /// Forget all best times first
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DifficultyArg {
    Beginner,
    Intermediate,
    Expert,
    Custom,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Beginner => Difficulty::Beginner,
            DifficultyArg::Intermediate => Difficulty::Intermediate,
            DifficultyArg::Expert => Difficulty::Expert,
            DifficultyArg::Custom => Difficulty::Custom,
        }
    }
}

#[derive(Args, Debug, Default, Clone)]
struct BoardArgs {
    /// Defaults to the last one played, or custom when a size or mine count is given
    #[arg(short, long, value_enum)]
    difficulty: Option<DifficultyArg>,

    /// Custom board width
    #[arg(long)]
    width: Option<Coord>,

    /// Custom board height
    #[arg(long)]
    height: Option<Coord>,

    /// Custom mine count
    #[arg(long)]
    mines: Option<CellCount>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,
}

impl BoardArgs {
    /// Picks difficulty and board, remembering both in `settings`.
    fn resolve(&self, settings: &mut records::Settings) -> (Difficulty, BoardConfig) {
        let custom_given = self.width.is_some() || self.height.is_some() || self.mines.is_some();
        let difficulty = match self.difficulty {
            Some(arg) => arg.into(),
            None if custom_given => Difficulty::Custom,
            None => settings.difficulty,
        };

        let last = settings.custom;
        let size = (
            self.width.unwrap_or(last.size.0),
            self.height.unwrap_or(last.size.1),
        );
        let config = difficulty.config(size, self.mines.unwrap_or(last.mines));

        settings.difficulty = difficulty;
        if difficulty == Difficulty::Custom {
            settings.custom = config;
        }
        (difficulty, config)
    }
}

#[derive(Args, Debug, Default, Clone)]
struct PlayArgs {
    #[command(flatten)]
    board: BoardArgs,

    /// Replay a level file instead of a random board
    #[arg(short, long)]
    level: Option<PathBuf>,

    /// Disable question marks for this session
    #[arg(long)]
    no_marks: bool,
}

fn init_logging(verbose: &Verbosity<WarnLevel>) {
    use tracing_subscriber::filter::LevelFilter;
    let level = match verbose.log_level_filter() {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn read_level(path: &Path) -> anyhow::Result<game::MineLayout> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Could not read level {}", path.display()))?;
    game::parse_level(&text).with_context(|| format!("Invalid level {}", path.display()))
}

fn play_game<R: BufRead, W: Write>(
    args: PlayArgs,
    input: R,
    out: &mut W,
    records: &mut Records,
) -> anyhow::Result<()> {
    let options = match &args.level {
        Some(path) => {
            let layout = read_level(path)?;
            play::PlayOptions {
                difficulty: Difficulty::Custom,
                config: layout.config(),
                seed: None,
                level: Some(layout),
            }
        }
        None => {
            let (difficulty, config) = args.board.resolve(&mut records.settings);
            play::PlayOptions {
                difficulty,
                config,
                seed: args.board.seed,
                level: None,
            }
        }
    };

    let saved_marks = records.settings.marks;
    if args.no_marks {
        records.settings.marks = false;
    }
    let played = play::run(input, out, &options, records);
    if args.no_marks {
        records.settings.marks = saved_marks;
    }
    played
}

fn export(board: BoardArgs, output: Option<PathBuf>, records: &mut Records) -> anyhow::Result<()> {
    use game::LayoutGenerator;

    let (_, config) = board.resolve(&mut records.settings);
    let seed = board.seed.unwrap_or_else(rand::random);
    log::info!("Seed: {}", seed);
    let layout = game::RandomLayoutGenerator::new(seed).generate(config);
    let text = layout.to_string();

    match output {
        Some(path) => fs::write(&path, text)
            .with_context(|| format!("Could not write level {}", path.display())),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn print_times(records: &Records) {
    for difficulty in Difficulty::PRESETS {
        if let Some(best) = records.best_time(difficulty) {
            println!("{:<14}{:>4}  {}", difficulty.name(), best.seconds, best.name);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.verbose);

    fs::create_dir_all(&cli.data_dir)
        .with_context(|| format!("Could not create {}", cli.data_dir.display()))?;
    let store = RecordStore::new(&cli.data_dir);
    let mut records = Records::default();
    store.load(&mut records);

    let outcome = match cli.command.unwrap_or_else(|| Command::Play(PlayArgs::default())) {
        Command::Play(args) => play_game(args, io::stdin().lock(), &mut io::stdout(), &mut records),
        Command::Export { board, output } => export(board, output, &mut records),
        Command::Show { level } => read_level(&level)
            .map(|layout| print!("{}", render::SolutionView::new(&layout))),
        Command::Times { reset } => {
            if reset {
                records.reset_times();
            }
            print_times(&records);
            Ok(())
        }
    };

    store.save(&records);
    outcome
}
