use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use clap::Parser;
use frame_pump::{
    Codec, CompressedUnit, Container, EncodeDriver, EncodeSettings, ElementaryStreamWriter,
    IvfHeader, IvfWriter, PacketSink, RawFileSource, RawFrame, SessionSummary,
};
use tracing_subscriber::EnvFilter;

mod args;

use args::Args;

/// Input rows are laid out with this stride alignment in memory.
const STRIDE_ALIGN: usize = 32;

/// Prints `K` for every keyframe and `.` for every other unit.
struct ProgressSink<S> {
    inner: S,
    quiet: bool,
}

impl<S: PacketSink> PacketSink for ProgressSink<S> {
    fn write_unit(&mut self, unit: &CompressedUnit) -> frame_pump::Result<()> {
        self.inner.write_unit(unit)?;
        if !self.quiet {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(if unit.is_keyframe { b"K" } else { b"." })?;
            stdout.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> frame_pump::Result<()> {
        if !self.quiet {
            println!();
        }
        self.inner.finish()
    }
}

fn load_settings(args: &Args) -> Result<EncodeSettings> {
    let mut settings = match &args.config {
        Some(path) => EncodeSettings::from_json_file(path)
            .with_context(|| format!("Failed to load settings from {}.", path.display()))?,
        None => EncodeSettings::default(),
    };
    args.apply(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn open_sink(
    path: &Path,
    settings: &EncodeSettings,
    codec: Codec,
) -> Result<Box<dyn PacketSink>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to open {} for writing.", path.display()))?;
    let writer = BufWriter::new(file);

    Ok(match settings.container {
        Container::Ivf => {
            let header = IvfHeader {
                fourcc: codec.fourcc(settings.image_format()?),
                width: settings.width as u16,
                height: settings.height as u16,
                time_base: settings.time_base(),
                frame_count: 0,
            };
            Box::new(IvfWriter::new(writer, header)?)
        }
        Container::Raw => Box::new(ElementaryStreamWriter::new(writer)),
    })
}

/// Encodes `input` into `output` as configured by `args`.
///
/// Settings are validated and the encoder configured before either file is
/// opened, so a rejected configuration leaves no output behind.
fn run(input: &Path, output: &Path, args: &Args) -> Result<SessionSummary> {
    let settings = load_settings(args)?;
    let codec = settings.codec()?;
    let params = settings.encode_parameters()?;
    let driver = EncodeDriver::new(codec.open(), &params, settings.driver_config())?;

    let reader = File::open(input)
        .with_context(|| format!("Failed to open {} for reading.", input.display()))?;
    let frame = RawFrame::new(params.format(), params.width(), params.height(), STRIDE_ALIGN)?;
    let mut source = RawFileSource::new(BufReader::new(reader), frame);

    let mut sink = ProgressSink {
        inner: open_sink(output, &settings, codec)?,
        quiet: args.quiet,
    };

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        container = ?settings.container,
        "Encoding {}x{} at {} fps",
        settings.width,
        settings.height,
        settings.fps
    );
    let summary = driver.run(&mut source, &mut sink)?;
    sink.finish()?;
    Ok(summary)
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_filter().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.list_codecs {
        for codec in Codec::all() {
            println!("{:<8} {}", codec.name(), codec.long_name());
        }
        return Ok(());
    }

    let (Some(input), Some(output)) = (&args.input, &args.output) else {
        anyhow::bail!("Both an input and an output file are required.");
    };

    let summary = run(input, output, &args)?;
    println!("Processed {} frames.", summary.frames_submitted);
    Ok(())
}
