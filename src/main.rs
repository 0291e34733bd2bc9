use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{
    fs,
    path::{Path, PathBuf},
};

use mus2midi::{
    inspect::{format_duration, summarize},
    mus::MUS_MAGIC,
    mus_to_midi,
    wad::Wad,
};

#[derive(Parser, Debug)]
#[command(version, about = "Convert DOOM MUS music to Standard MIDI files")]
struct Opt {
    /// MUS file, or an IWAD/PWAD holding music lumps
    input: PathBuf,
    /// Output .mid path (or directory with --all)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Music lump to convert from a WAD (RUNNIN, D_RUNNIN, E1M1, ...)
    #[arg(short, long)]
    lump: Option<String>,
    /// List the music lumps in a WAD and exit
    #[arg(long)]
    list: bool,
    /// Convert every music lump in a WAD
    #[arg(long, conflicts_with = "lump")]
    all: bool,
    /// Read the MIDI back and print a summary
    #[arg(short, long)]
    summary: bool,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let level = if opt.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let bytes = fs::read(&opt.input).with_context(|| format!("reading {:?}", opt.input))?;

    if bytes.starts_with(MUS_MAGIC) {
        let stem = opt.input.file_stem().and_then(|s| s.to_str()).unwrap_or("out");
        let dest = opt.output.clone().unwrap_or_else(|| PathBuf::from(format!("{stem}.mid")));
        return convert_one(stem, &bytes, &dest, opt.summary);
    }

    if !Wad::sniff(&bytes) {
        bail!("{:?} is neither a MUS score nor a WAD", opt.input);
    }
    let wad = Wad::parse(&bytes).with_context(|| format!("parsing {:?}", opt.input))?;

    if opt.list {
        println!("Music lumps:");
        for l in wad.music_lumps() {
            println!("  {} ({} bytes)", l.name, l.size);
        }
        return Ok(());
    }

    if opt.all {
        let dir = opt.output.clone().unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir).with_context(|| format!("creating {dir:?}"))?;
        let mut failed = 0;
        for l in wad.music_lumps() {
            let lump = wad.read(&l.name)?;
            if !lump.starts_with(MUS_MAGIC) {
                println!("Skipping {}: not MUS", l.name);
                continue;
            }
            let dest = dir.join(format!("{}.mid", l.name));
            if let Err(e) = convert_one(&l.name, lump, &dest, opt.summary) {
                eprintln!("{}: {e:#}", l.name);
                failed += 1;
            }
        }
        if failed > 0 {
            bail!("{failed} lump(s) failed to convert");
        }
        return Ok(());
    }

    let Some(query) = opt.lump.as_deref() else {
        bail!("input is a WAD; pass --lump NAME, --all or --list");
    };
    let Some(lump) = wad.find_song(query) else {
        let q = query.to_ascii_uppercase();
        let hints: Vec<_> = wad.music_lumps().filter(|l| l.name.contains(&q)).take(6).collect();
        for l in hints {
            eprintln!("  did you mean {}?", l.name);
        }
        bail!("no music lump matches {query}");
    };
    let name = lump.name.clone();
    let data = wad.read(&name)?;
    let dest = opt.output.clone().unwrap_or_else(|| PathBuf::from(format!("{name}.mid")));
    convert_one(&name, data, &dest, opt.summary)
}

fn convert_one(name: &str, mus: &[u8], dest: &Path, summary: bool) -> Result<()> {
    let midi = mus_to_midi(mus).with_context(|| format!("converting {name}"))?;
    fs::write(dest, &midi).with_context(|| format!("writing {dest:?}"))?;
    println!("{name}: {} bytes MUS -> {} bytes MIDI ({})", mus.len(), midi.len(), dest.display());

    if summary {
        let s = summarize(&midi)?;
        println!("  PPQ: {}", s.ppq);
        println!(
            "  Tempo: {} µs/qn (~{:.1} BPM)",
            s.us_per_qn,
            60_000_000.0 / s.us_per_qn as f64
        );
        println!("  Events: {}", s.events);
        println!("  Length: {}", format_duration(s.duration_us));
        println!("  Note-ons per MIDI channel: {:?}", s.note_ons);
    }
    Ok(())
}
