// main.rs      gifweave command
//
// Copyright (c) 2025  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use gifweave::{Assembler, DelayPolicy, FrameParts};
use std::error::Error;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &'static str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    match create_app().get_matches().subcommand() {
        ("wrap", Some(matches)) => wrap(&mut out, matches)?,
        ("peek", Some(matches)) => peek(&mut out, matches)?,
        _ => unreachable!(),
    }
    out.reset()?;
    Ok(())
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("gifweave")
        .version(VERSION)
        .setting(AppSettings::GlobalVersion)
        .about("Animated GIF assembler")
        .setting(AppSettings::ArgRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("wrap")
                .about("Wrap single-frame GIFs into an animation")
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .required(true)
                        .help("output file"),
                )
                .arg(
                    Arg::with_name("delay")
                        .short("d")
                        .long("delay")
                        .takes_value(true)
                        .default_value("100")
                        .help("frame delay (ms)"),
                )
                .arg(
                    Arg::with_name("loops")
                        .short("l")
                        .long("loops")
                        .takes_value(true)
                        .default_value("0")
                        .help("loop count (0 = forever)"),
                )
                .arg(
                    Arg::with_name("clamp")
                        .long("clamp")
                        .help("clamp delays over 655.35 s"),
                )
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .min_values(1)
                        .help("input frame file(s)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("peek")
                .about("Show layout of single-frame GIFs")
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .min_values(1)
                        .help("input file(s)"),
                ),
        )
}

/// Handle wrap subcommand
fn wrap(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let output = matches.value_of_os("output").ok_or("no output")?;
    let delay: u64 = matches.value_of("delay").unwrap_or("100").parse()?;
    let delay = Duration::from_millis(delay);
    let loops: u16 = matches.value_of("loops").unwrap_or("0").parse()?;
    let policy = if matches.is_present("clamp") {
        DelayPolicy::Clamp
    } else {
        DelayPolicy::Reject
    };
    let files: Vec<&OsStr> = matches
        .values_of_os("files")
        .ok_or("no input files")?
        .collect();
    let output = Path::new(output);
    let frames = wrap_files(output, &files, delay, loops, policy)?;
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    out.set_color(&bold)?;
    writeln!(out, "{}: {} frames", output.display(), frames)?;
    Ok(())
}

/// Wrap files into an animation through a temporary file.
///
/// The temporary is renamed to `output` on success, or removed on failure.
fn wrap_files(
    output: &Path,
    files: &[&OsStr],
    delay: Duration,
    loops: u16,
    policy: DelayPolicy,
) -> Result<usize, Box<dyn Error>> {
    let tmp = tmp_path(output);
    match write_animation(&tmp, files, delay, loops, policy) {
        Ok(frames) => {
            fs::rename(&tmp, output)?;
            Ok(frames)
        }
        Err(e) => {
            if let Err(rm) = fs::remove_file(&tmp) {
                log::warn!("{}: {}", tmp.display(), rm);
            }
            Err(e)
        }
    }
}

/// Get temporary path for an output file
fn tmp_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write all frames to an animation file
fn write_animation(
    path: &Path,
    files: &[&OsStr],
    delay: Duration,
    loops: u16,
    policy: DelayPolicy,
) -> Result<usize, Box<dyn Error>> {
    let writer = BufWriter::new(File::create(path)?);
    let mut asm = Assembler::new(writer, loops).with_delay_policy(policy);
    for file in files {
        let buf = fs::read(file)
            .map_err(|e| format!("{}: {}", Path::new(file).display(), e))?;
        asm.add_frame(&buf, delay)
            .map_err(|e| format!("{}: {}", Path::new(file).display(), e))?;
    }
    asm.close()?;
    Ok(asm.frame_count())
}

/// Handle peek subcommand
fn peek(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let mut yellow = ColorSpec::new();
    yellow.set_fg(Some(Color::Yellow)).set_intense(true);
    out.set_color(&yellow)?;
    writeln!(out, "  Screen     Frame    X,Y  Delay Clrs   Data  File")?;
    if let Some(values) = matches.values_of_os("files") {
        for path in values {
            peek_file(out, Path::new(path))?;
        }
    }
    Ok(())
}

/// Peek at one single-frame GIF file
fn peek_file(
    out: &mut StandardStream,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut dflt = ColorSpec::new();
    dflt.set_fg(Some(Color::White));
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let mut red = ColorSpec::new();
    red.set_fg(Some(Color::Red)).set_intense(true);
    let mut magenta = ColorSpec::new();
    magenta.set_fg(Some(Color::Magenta));
    let buf = fs::read(path)?;
    let parts = match FrameParts::from_buf(&buf) {
        Ok(parts) => parts,
        Err(defect) => {
            out.set_color(&red)?;
            write!(out, "{:>46}", defect)?;
            out.set_color(&magenta)?;
            writeln!(out, "  {}", path.display())?;
            return Ok(());
        }
    };
    out.set_color(&bold)?;
    let screen = format!("{}x{}", parts.screen_width(), parts.screen_height());
    write!(out, "{:>8}", screen)?;
    let frame = format!("{}x{}", parts.width(), parts.height());
    let same = parts.width() == parts.screen_width()
        && parts.height() == parts.screen_height();
    out.set_color(if same { &dflt } else { &bold })?;
    write!(out, " {:>9}", frame)?;
    let pos = format!("{},{}", parts.left(), parts.top());
    out.set_color(if pos == "0,0" { &dflt } else { &bold })?;
    write!(out, " {:>6}", pos)?;
    let d = parts.delay_time_cs();
    out.set_color(if d == 0 { &dflt } else { &bold })?;
    write!(out, " {:6.2}", d as f32 / 100f32)?;
    out.set_color(&bold)?;
    write!(out, " {:4}", parts.color_table_len())?;
    write!(out, " {:6}", parts.image_data().len())?;
    out.set_color(&magenta)?;
    writeln!(out, "  {}", path.display())?;
    Ok(())
}
