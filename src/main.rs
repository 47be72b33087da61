use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use shell_normalizer::{GrammarProfile, Lexicon, NormalizedTree, Normalizer, NormalizerOptions};

#[derive(Parser)]
#[command(name = "shell-normalizer")]
#[command(about = "Normalize shell command lines into command trees")]
#[command(version)]
struct Cli {
    /// Command line to normalize (reads one command per stdin line if omitted)
    #[arg()]
    command: Option<String>,

    /// Keep digits in arguments instead of replacing them with a placeholder
    #[arg(long = "keep-digits")]
    keep_digits: bool,

    /// Output the tree as JSON
    #[arg(long = "json")]
    json: bool,

    /// TOML grammar profile overriding the built-in tables
    #[arg(long = "profile")]
    profile: Option<PathBuf>,
}

fn render(tree: &NormalizedTree, json: bool) -> String {
    if json {
        format!("{}\n", serde_json::to_string_pretty(tree).unwrap_or_default())
    } else {
        tree.to_string()
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let lexicon = match cli.profile {
        Some(ref path) => match GrammarProfile::load(path).and_then(|p| Lexicon::from_profile(&p)) {
            Ok(lexicon) => lexicon,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => Lexicon::default(),
    };
    let normalizer = Normalizer::new(
        lexicon,
        NormalizerOptions {
            normalize_digits: !cli.keep_digits,
            ..Default::default()
        },
    );

    if let Some(command) = cli.command {
        match normalizer.try_normalize(&command) {
            Ok(tree) => print!("{}", render(&tree, cli.json)),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Batch mode: inputs without a result are skipped
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Error: Cannot read stdin: {}", e);
                std::process::exit(1);
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        if let Some(tree) = normalizer.normalize(&line) {
            println!("{}", render(&tree, cli.json));
        }
    }
}
