//! Resumable phase executor.
//!
//! A run is an ordered list of [`Phase`]s applied to one [`RunState`]. Each
//! phase reads the fields an earlier phase filled and writes its own:
//!
//! | Phase | Reads | Writes |
//! |---|---|---|
//! | `findfiles` | config `input` | `filenames` |
//! | `identify` | `filenames` | `blobs` |
//! | `htmlize` | `blobs` | `html` |
//! | `pixelate` | `html` | `colorrows` |
//! | `blit` | `colorrows` | raw pixels on stdout |
//! | `magick` | `colorrows` | the output image |
//!
//! Phases already recorded in `ran` are skipped, which is what makes a saved
//! state resumable. A skipped phase is not re-verified. When `finish` is set,
//! the run stops right after that phase has executed.
//!
//! Progress is reported as [`PipelineEvent`]s over an optional channel so the
//! caller decides how to display it; the executor itself never prints.

use crate::classify::{Classification, ClassifyError, Classifier};
use crate::config::{ConfigError, RunConfig};
use crate::discover::{self, DiscoverError};
use crate::encode::{self, EncodeError, RasterEncoder};
use crate::highlight::{self, HighlightError, Highlighter};
use crate::languages;
use crate::pixels::{self, PixelError, PixelPacker};
use crate::rasterize::MarkupRasterizer;
use crate::state::{RunState, StateError};
use crate::stylesheet::build_color_table;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unknown phase '{0}' (expected one of: {names})", names = Phase::names().join(", "))]
    UnknownPhase(String),
    #[error("Finish phase '{0}' is not in the requested phases")]
    FinishNotRequested(Phase),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Discover(#[from] DiscoverError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Highlight(#[from] HighlightError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Pixel(#[from] PixelError),
}

/// One step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    FindFiles,
    Identify,
    Htmlize,
    Pixelate,
    Blit,
    Magick,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::FindFiles,
        Phase::Identify,
        Phase::Htmlize,
        Phase::Pixelate,
        Phase::Blit,
        Phase::Magick,
    ];

    /// Phases run when none are requested. `blit` is opt-in.
    pub const DEFAULT: &'static [Phase] = &[
        Phase::FindFiles,
        Phase::Identify,
        Phase::Htmlize,
        Phase::Pixelate,
        Phase::Magick,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::FindFiles => "findfiles",
            Phase::Identify => "identify",
            Phase::Htmlize => "htmlize",
            Phase::Pixelate => "pixelate",
            Phase::Blit => "blit",
            Phase::Magick => "magick",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Phase::FindFiles => "enumerate input paths",
            Phase::Identify => "drop binary, generated and vendored files; detect languages",
            Phase::Htmlize => "run the syntax highlighter on each file",
            Phase::Pixelate => "convert highlighted markup to colour rows",
            Phase::Blit => "write raw pixels to stdout",
            Phase::Magick => "encode the image",
        }
    }

    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|p| p.name()).collect()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Phase {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| PipelineError::UnknownPhase(s.to_string()))
    }
}

/// Parse phase names, failing on the first unknown one.
pub fn parse_phases<S: AsRef<str>>(names: &[S]) -> Result<Vec<Phase>, PipelineError> {
    names.iter().map(|n| n.as_ref().parse()).collect()
}

/// `finish` must name one of the requested phases.
pub fn check_finish(phases: &[Phase], finish: Option<Phase>) -> Result<(), PipelineError> {
    match finish {
        Some(phase) if !phases.contains(&phase) => Err(PipelineError::FinishNotRequested(phase)),
        _ => Ok(()),
    }
}

/// What a completed phase produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    Files(usize),
    Blobs { kept: usize, dropped: usize },
    Html(usize),
    Rows(usize),
    Bytes(u64),
    Image { path: PathBuf, rows: usize },
}

/// Progress reported while a run executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    StateLoaded(PathBuf),
    PhaseStarted(Phase),
    PhaseSkipped(Phase),
    FileDropped { path: PathBuf, reason: &'static str },
    FileHighlighted { index: usize, total: usize, path: PathBuf },
    PhaseFinished { phase: Phase, outcome: PhaseOutcome },
    Stopped(Phase),
    StateSaved(PathBuf),
}

/// Phases executed, skipped, and where the run stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ran: Vec<Phase>,
    pub skipped: Vec<Phase>,
    pub stopped_after: Option<Phase>,
}

/// External tools a run depends on.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub classifier: &'a dyn Classifier,
    pub highlighter: &'a dyn Highlighter,
    pub encoder: &'a dyn RasterEncoder,
}

/// Runs phases against a [`RunState`].
pub struct PipelineExecutor<'a> {
    config: &'a RunConfig,
    tools: Collaborators<'a>,
    blit_out: Box<dyn Write + 'a>,
    events: Option<Sender<PipelineEvent>>,
    packer: PixelPacker,
}

impl<'a> PipelineExecutor<'a> {
    /// Executor writing `blit` output to stdout.
    pub fn new(config: &'a RunConfig, tools: Collaborators<'a>) -> Self {
        Self {
            config,
            tools,
            blit_out: Box::new(BufWriter::new(io::stdout())),
            events: None,
            packer: PixelPacker::new(),
        }
    }

    /// Send `blit` output somewhere other than stdout.
    pub fn with_blit_output(mut self, out: impl Write + 'a) -> Self {
        self.blit_out = Box::new(out);
        self
    }

    pub fn with_events(mut self, events: Sender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run the configured phases, loading and saving state as configured.
    ///
    /// The state is saved only when every phase succeeded.
    pub fn execute(&mut self) -> Result<(RunState, RunSummary), PipelineError> {
        let config = self.config;
        check_finish(&config.phases, config.finish)?;

        let mut state = match &config.state.load {
            Some(path) => {
                let state = RunState::load(path)?;
                log::info!("loaded state from {}", path.display());
                self.emit(PipelineEvent::StateLoaded(path.clone()));
                state
            }
            None => RunState::new(),
        };

        let summary = self.run(&config.phases, &mut state)?;

        if let Some(path) = &config.state.save {
            state.save(path)?;
            log::info!("saved state to {}", path.display());
            self.emit(PipelineEvent::StateSaved(path.clone()));
        }
        Ok((state, summary))
    }

    /// Run `phases` in order against `state`.
    pub fn run(&mut self, phases: &[Phase], state: &mut RunState) -> Result<RunSummary, PipelineError> {
        let finish = self.config.finish;
        check_finish(phases, finish)?;

        let mut summary = RunSummary::default();
        for &phase in phases {
            if state.ran.contains(&phase) {
                log::debug!("already ran {phase}, skipping");
                self.emit(PipelineEvent::PhaseSkipped(phase));
                summary.skipped.push(phase);
                continue;
            }

            log::info!("running {phase} phase");
            self.emit(PipelineEvent::PhaseStarted(phase));
            let outcome = self.run_phase(phase, state)?;
            state.ran.insert(phase);
            self.emit(PipelineEvent::PhaseFinished { phase, outcome });
            summary.ran.push(phase);

            if finish == Some(phase) {
                self.emit(PipelineEvent::Stopped(phase));
                summary.stopped_after = Some(phase);
                break;
            }
        }
        Ok(summary)
    }

    fn run_phase(&mut self, phase: Phase, state: &mut RunState) -> Result<PhaseOutcome, PipelineError> {
        match phase {
            Phase::FindFiles => self.find_files(state),
            Phase::Identify => self.identify(state),
            Phase::Htmlize => self.htmlize(state),
            Phase::Pixelate => self.pixelate(state),
            Phase::Blit => self.blit(state),
            Phase::Magick => self.magick(state),
        }
    }

    fn find_files(&mut self, state: &mut RunState) -> Result<PhaseOutcome, PipelineError> {
        state.filenames = discover::find_files(&self.config.input)?;
        Ok(PhaseOutcome::Files(state.filenames.len()))
    }

    fn identify(&mut self, state: &mut RunState) -> Result<PhaseOutcome, PipelineError> {
        let mut blobs = Vec::new();
        let mut dropped = 0;
        for entry in &state.filenames {
            match self.tools.classifier.classify(entry)? {
                Classification::Keep(blob) => blobs.push(blob),
                other => {
                    log::debug!("dropping {}: {}", entry.path.display(), other.label());
                    self.emit(PipelineEvent::FileDropped {
                        path: entry.path.clone(),
                        reason: other.label(),
                    });
                    dropped += 1;
                }
            }
        }
        let kept = blobs.len();
        state.blobs = blobs;
        Ok(PhaseOutcome::Blobs { kept, dropped })
    }

    fn htmlize(&mut self, state: &mut RunState) -> Result<PhaseOutcome, PipelineError> {
        let total = state.blobs.len();
        let mut html = Vec::with_capacity(total);
        for (index, blob) in state.blobs.iter().enumerate() {
            log::debug!("highlighting {}", blob.entry.path.display());
            html.push(highlight::highlight_blob(self.tools.highlighter, blob)?);
            self.emit(PipelineEvent::FileHighlighted {
                index: index + 1,
                total,
                path: blob.entry.path.clone(),
            });
        }
        state.html = html;
        Ok(PhaseOutcome::Html(state.html.len()))
    }

    fn pixelate(&mut self, state: &mut RunState) -> Result<PhaseOutcome, PipelineError> {
        let render = &self.config.render;
        let theme = match &render.style {
            Some(style) => Some(self.tools.highlighter.style_css(style)?),
            None => None,
        };
        let table = build_color_table(
            theme.as_deref(),
            &languages::all(),
            &render.lang_as,
            &render.bg,
        );
        log::debug!("colour table has {} classes", table.len());
        let rasterizer = MarkupRasterizer::new(&table, render.cols, &render.fg, &render.bg);
        state.colorrows = rasterizer.rasterize(state.html.as_slice());
        Ok(PhaseOutcome::Rows(state.colorrows.len()))
    }

    fn blit(&mut self, state: &mut RunState) -> Result<PhaseOutcome, PipelineError> {
        let rows = pixels::top(&state.colorrows, self.config.output.line_limit);
        let written = pixels::blit(
            rows,
            self.config.render.alpha,
            &mut self.packer,
            &mut *self.blit_out,
        )?;
        Ok(PhaseOutcome::Bytes(written))
    }

    fn magick(&mut self, state: &mut RunState) -> Result<PhaseOutcome, PipelineError> {
        let rows = pixels::top(&state.colorrows, self.config.output.line_limit);
        let params = encode::params_for(self.config, rows.len());
        self.tools.encoder.encode(rows, &params, &mut self.packer)?;
        Ok(PhaseOutcome::Image {
            path: params.out,
            rows: rows.len(),
        })
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            // A closed receiver only means nobody is listening.
            let _ = tx.send(event);
        }
    }
}
