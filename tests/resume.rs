//! Saving a run, resuming it, and stopping part-way through.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use textpixels::classify::{Classification, ClassifyError, Classifier};
use textpixels::config::RunConfig;
use textpixels::encode::{EncodeError, EncodeParams, RasterEncoder};
use textpixels::highlight::{HighlightError, Highlighter};
use textpixels::pipeline::{Collaborators, Phase, PipelineExecutor};
use textpixels::pixels::PixelPacker;
use textpixels::state::RunState;
use textpixels::types::{Blob, FileEntry, Row};

struct KeepAll;

impl Classifier for KeepAll {
    fn classify(&self, entry: &FileEntry) -> Result<Classification, ClassifyError> {
        Ok(Classification::Keep(Blob {
            entry: entry.clone(),
            language: None,
        }))
    }
}

/// Emits one `<span class="k">` token per file and counts calls.
#[derive(Default)]
struct CountingHighlighter {
    calls: RefCell<usize>,
}

impl Highlighter for CountingHighlighter {
    fn highlight(&self, blob: &Blob, css_class: &str) -> Result<String, HighlightError> {
        *self.calls.borrow_mut() += 1;
        Ok(format!(
            "<div class=\"{css_class}\"><pre><span class=\"k\">{}</span>\n</pre></div>\n",
            blob.entry.path.display()
        ))
    }

    fn style_css(&self, _style: &str) -> Result<String, HighlightError> {
        Ok(".k { color: #ff0000 }\n".to_string())
    }
}

#[derive(Default)]
struct RecordingEncoder {
    encoded: RefCell<Vec<Vec<Row>>>,
}

impl RasterEncoder for RecordingEncoder {
    fn encode(
        &self,
        rows: &[Row],
        _params: &EncodeParams,
        _packer: &mut PixelPacker,
    ) -> Result<(), EncodeError> {
        self.encoded.borrow_mut().push(rows.to_vec());
        Ok(())
    }
}

fn config(dir: &Path, files: &[&str]) -> RunConfig {
    let list = dir.join("files.txt");
    fs::write(&list, files.join("\n")).unwrap();
    let mut config = RunConfig::default();
    config.input.files_from = Some(list);
    config.render.cols = 3;
    config.render.style = Some("test".into());
    config
}

#[test]
fn second_run_skips_everything_and_keeps_rows() {
    let tmp = TempDir::new().unwrap();
    let state_path = tmp.path().join("state.json");
    let mut config = config(tmp.path(), &["ab", "c"]);
    config.state.save = Some(state_path.clone());

    let highlighter = CountingHighlighter::default();
    let encoder = RecordingEncoder::default();
    let tools = Collaborators {
        classifier: &KeepAll,
        highlighter: &highlighter,
        encoder: &encoder,
    };

    let (first, summary) = PipelineExecutor::new(&config, tools).execute().unwrap();
    assert_eq!(summary.ran, Phase::DEFAULT.to_vec());
    assert_eq!(*highlighter.calls.borrow(), 2);
    assert_eq!(
        first.colorrows,
        vec![vec!["ff0000", "ff0000", "ffffff"], vec!["ff0000", "ffffff", "ffffff"]]
    );

    config.state.load = Some(state_path.clone());
    let (second, summary) = PipelineExecutor::new(&config, tools).execute().unwrap();
    assert!(summary.ran.is_empty());
    assert_eq!(summary.skipped, Phase::DEFAULT.to_vec());
    assert_eq!(second.colorrows, first.colorrows);
    assert_eq!(*highlighter.calls.borrow(), 2);
    assert_eq!(encoder.encoded.borrow().len(), 1);
}

#[test]
fn finish_then_resume_remaining_phases() {
    let tmp = TempDir::new().unwrap();
    let state_path = tmp.path().join("state.json");
    let mut config = config(tmp.path(), &["abc"]);
    config.finish = Some(Phase::Htmlize);
    config.state.save = Some(state_path.clone());

    let highlighter = CountingHighlighter::default();
    let encoder = RecordingEncoder::default();
    let tools = Collaborators {
        classifier: &KeepAll,
        highlighter: &highlighter,
        encoder: &encoder,
    };

    let (partial, summary) = PipelineExecutor::new(&config, tools).execute().unwrap();
    assert_eq!(summary.stopped_after, Some(Phase::Htmlize));
    assert!(partial.colorrows.is_empty());
    assert!(encoder.encoded.borrow().is_empty());

    // Stopped runs are still saved.
    let saved = RunState::load(&state_path).unwrap();
    assert_eq!(saved, partial);
    assert!(saved.ran.contains(&Phase::Htmlize));

    config.finish = None;
    config.state.load = Some(state_path);
    config.render.cols = 5;
    let (resumed, summary) = PipelineExecutor::new(&config, tools).execute().unwrap();
    assert_eq!(summary.ran, vec![Phase::Pixelate, Phase::Magick]);
    assert_eq!(*highlighter.calls.borrow(), 1);
    assert_eq!(
        resumed.colorrows,
        vec![vec!["ff0000", "ff0000", "ff0000", "ffffff", "ffffff"]]
    );
    assert_eq!(encoder.encoded.borrow().as_slice(), &[resumed.colorrows.clone()]);
}

#[test]
fn unknown_phase_name_is_rejected() {
    let err = textpixels::pipeline::parse_phases(&["findfiles", "nope"]).unwrap_err();
    assert!(err.to_string().contains("nope"));
}
