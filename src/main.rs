use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use maestro_wrapper::aggregate::concat_results;
use maestro_wrapper::config::Config;
use maestro_wrapper::launcher::Launcher;
use maestro_wrapper::partition::divide;
use maestro_wrapper::utils::list_files;
use maestro_wrapper::wrapper::{Wrapper, MMGBSA_ALL};
use maestro_wrapper::Result;

#[derive(Parser)]
#[command(version, about = "batch driver for the modeling suite")]
struct Cli {
    /// TOML config file
    #[arg(short, long, default_value = "maestro.toml")]
    config: String,

    /// override the number of workers from the config
    #[arg(short, long)]
    workers: Option<usize>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// prepare every structure in DIR with prepwizard
    Prep {
        dir: PathBuf,
        /// skip writing PDB copies of the prepared structures
        #[arg(long)]
        no_pdb: bool,
    },
    /// combine PROTEIN with every other structure in DIR
    Complex {
        dir: PathBuf,
        #[arg(short, long, default_value = "prep_protein.mae")]
        protein: String,
        #[arg(short, long, default_value = "complex")]
        export_to: String,
    },
    /// estimate binding energies for every complex in DIR
    Mmgbsa {
        dir: PathBuf,
        #[arg(short, long, default_value = "primeMMGBSA")]
        export_to: String,
    },
    /// interaction fingerprints for every structure in DIR
    Fingerprint {
        dir: PathBuf,
        /// build complexes with this protein first
        #[arg(short, long)]
        protein: Option<String>,
    },
    /// combine the result CSVs in DIR into one table
    Concat {
        dir: PathBuf,
        #[arg(short, long, default_value = MMGBSA_ALL)]
        out: String,
    },
    /// print license seat counts
    License,
    /// show how the files in DIR would be split between workers
    Partition { dir: PathBuf },
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(&cli.config)?;
    if let Some(w) = cli.workers {
        config.workers = w;
        config.validate()?;
    }
    match cli.cmd {
        Cmd::Prep { dir, no_pdb } => {
            let mut w = Wrapper::new(config, dir, None)?;
            w.prep_wizard(!no_pdb)?;
            println!(
                "{} prepared structures in {}",
                w.files.len(),
                w.path.display()
            );
        }
        Cmd::Complex {
            dir,
            protein,
            export_to,
        } => {
            let mut w = Wrapper::new(config, dir, None)?;
            let got = w.complex(&protein, &export_to)?;
            println!("{} complexes in {}", got.len(), w.path.display());
        }
        Cmd::Mmgbsa { dir, export_to } => {
            let mut w = Wrapper::new(config, dir, None)?;
            let table = w.prime_mmgbsa(&export_to)?;
            println!(
                "{} results in {}",
                table.len(),
                w.path.join(MMGBSA_ALL).display()
            );
        }
        Cmd::Fingerprint { dir, protein } => {
            let mut w = Wrapper::new(config, dir, None)?;
            for out in w.fingerprint(protein.as_deref())? {
                println!("{}", out.display());
            }
        }
        Cmd::Concat { dir, out } => {
            let table = concat_results(&dir, &out)?;
            println!(
                "{} rows written to {}",
                table.len(),
                dir.join(out).display()
            );
        }
        Cmd::License => {
            let launcher = Launcher::new(&config);
            println!(
                "{:<24}{:>8}{:>8}{:>8}",
                "Feature", "Issued", "In use", "Free"
            );
            for s in launcher.gate.status()? {
                println!("{s}");
            }
        }
        Cmd::Partition { dir } => {
            let files = list_files(&dir)?;
            for (i, batch) in divide(&files, config.workers).iter().enumerate()
            {
                println!("subjob {i}: {} files", batch.len());
                for f in batch {
                    println!("    {f}");
                }
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
