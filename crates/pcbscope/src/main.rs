// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pcbscope — command-line front end.
//
// Every subcommand reads one board photo (or OCR text) and writes an image
// file or JSON to stdout. Logging goes to stderr, filtered by `RUST_LOG`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pcbscope::{BoardAnalyzer, OcrService};
use pcbscope_core::PipelineConfig;
use pcbscope_core::types::{BoundingBox, OcrToken};
use pcbscope_text::{BoardId, DesignatorMatcher, MatchReport, extract_board_id};
use pcbscope_vision::raster::{encode_jpeg_rgb, encode_png_gray};
use pcbscope_vision::{
    BoardImage, OcrPreprocessor, QualityAnalyzer, TraceEnhancer, capabilities, encode_stages,
};
use serde::Serialize;

/// PCB photo analysis: trace overlays, OCR preparation, designators, quality.
#[derive(Parser, Debug)]
#[command(name = "pcbscope")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON pipeline configuration; omitted fields keep their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the trace overlay as a JPEG
    Enhance {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Dump every diagnostic stage of one branch as JSON
    Stages {
        input: PathBuf,
        #[arg(short, long, value_enum, default_value_t = StageBranch::Trace)]
        branch: StageBranch,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Pixel statistics per trace detection method
    Analyze { input: PathBuf },
    /// Run the trace, OCR and quality branches together
    Board {
        input: PathBuf,
        /// Expected designators for fuzzy matching (comma separated)
        #[arg(long, value_delimiter = ',')]
        candidates: Vec<String>,
    },
    /// Blur, exposure and motion scores
    Quality { input: PathBuf },
    /// Write the OCR-ready binary image as a PNG
    OcrPrep {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Match OCR text against the designator table
    Match {
        /// Recognized text, one token per argument
        #[arg(required = true)]
        tokens: Vec<String>,
        /// Expected designators for fuzzy matching (comma separated)
        #[arg(long, value_delimiter = ',')]
        candidates: Vec<String>,
    },
    /// Describe what this build can do
    Capabilities,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StageBranch {
    Trace,
    Ocr,
}

#[derive(Serialize)]
struct MatchOutput {
    components: MatchReport,
    board_id: Option<BoardId>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Enhance { input, output } => {
            let board = open_board(&input)?;
            let overlay = TraceEnhancer::new(config.trace.clone()).process(&board)?;
            let jpeg = encode_jpeg_rgb(&overlay, config.output.overlay_jpeg_quality)?;
            std::fs::write(&output, jpeg)
                .with_context(|| format!("writing {}", output.display()))?;
            tracing::info!(output = %output.display(), "Overlay written");
        }
        Commands::Stages {
            input,
            branch,
            output,
        } => {
            let board = open_board(&input)?;
            let stages = match branch {
                StageBranch::Trace => {
                    TraceEnhancer::new(config.trace.clone())
                        .process_with_stages(&board)?
                        .stages
                }
                StageBranch::Ocr => {
                    OcrPreprocessor::new(config.ocr_prep.clone())
                        .prepare_with_stages(&board)?
                        .stages
                }
            };
            let payloads = encode_stages(&stages, config.output.stage_jpeg_quality)?;
            let json = serde_json::to_string_pretty(&payloads)?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Commands::Analyze { input } => {
            let board = open_board(&input)?;
            print_json(&TraceEnhancer::new(config.trace.clone()).analyze(&board)?)?;
        }
        Commands::Board { input, candidates } => {
            let board = open_board(&input)?;
            let ocr = OcrService::from_config(&config).with_candidates(&candidates);
            print_json(&BoardAnalyzer::new(&config, ocr).analyze(&board))?;
        }
        Commands::Quality { input } => {
            let board = open_board(&input)?;
            print_json(&QualityAnalyzer::new(config.quality.clone()).analyze(board.gray()))?;
        }
        Commands::OcrPrep { input, output } => {
            let board = open_board(&input)?;
            let binary = OcrPreprocessor::new(config.ocr_prep.clone()).prepare(&board)?;
            std::fs::write(&output, encode_png_gray(binary.as_gray())?)
                .with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::Match { tokens, candidates } => {
            print_json(&match_text(&config, &tokens, &candidates))?;
        }
        Commands::Capabilities => print_json(&capabilities())?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn open_board(path: &Path) -> Result<BoardImage> {
    BoardImage::open(path).with_context(|| format!("opening {}", path.display()))
}

/// Text given on the command line is treated as fully confident OCR output.
fn match_text(config: &PipelineConfig, tokens: &[String], candidates: &[String]) -> MatchOutput {
    let tokens: Vec<OcrToken> = tokens
        .iter()
        .map(|text| OcrToken {
            text: text.clone(),
            confidence: 1.0,
            bounding_box: BoundingBox::default(),
        })
        .collect();
    let matcher = DesignatorMatcher::from_config(&config.text).with_candidates(candidates);
    MatchOutput {
        components: matcher.match_tokens(&tokens),
        board_id: extract_board_id(&tokens),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn candidates_split_on_commas() {
        let cli = Cli::parse_from(["pcbscope", "match", "Rl2O", "--candidates", "R120,C33"]);
        let Commands::Match { tokens, candidates } = cli.command else {
            panic!("expected match subcommand");
        };
        assert_eq!(tokens, ["Rl2O"]);
        assert_eq!(candidates, ["R120", "C33"]);
    }

    #[test]
    fn missing_config_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), PipelineConfig::default());
    }

    #[test]
    fn partial_config_file_is_merged_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{"text": {"fuzzy_threshold": 0.8}}"#).unwrap();
        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.text.fuzzy_threshold, 0.8);
        assert_eq!(config.text.min_token_len, 2);
    }

    #[test]
    fn invalid_config_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{"output": {"overlay_jpeg_quality": 0}}"#).unwrap();
        assert!(load_config(Some(path.as_path())).is_err());
    }

    #[test]
    fn match_text_finds_designators_and_board_id() {
        let out = match_text(
            &PipelineConfig::default(),
            &["R120".into(), "Rl2O".into(), "REV A1".into()],
            &["R120".into()],
        );
        assert_eq!(out.components.direct, 1);
        assert_eq!(out.components.fuzzy, 1);
        assert_eq!(out.board_id.unwrap().id, "REV A1");
    }
}
