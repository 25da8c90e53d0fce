//! Runs one recognition session against the configured server.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use inkwire_protocol::constants::{MATH_WS_SUFFIX, TEXT_WS_SUFFIX};
use inkwire_protocol::{Stroke, frames};
use inkwire_ws_recognizer::{
    BuildContinue, BuildStart, InkModel, RecognitionConfig, SessionState, WsRecognizer,
};

use crate::{Cli, Mode};

fn math_framing() -> (BuildStart, BuildContinue) {
    (
        Box::new(|config, strokes| frames::math_start(&config.math, strokes)),
        Box::new(frames::math_continue),
    )
}

fn text_framing() -> (BuildStart, BuildContinue) {
    (
        Box::new(|config, strokes| frames::text_start(&config.text, strokes)),
        Box::new(frames::text_continue),
    )
}

/// Endpoint suffix and frame builders for a mode.
fn framing(mode: Mode) -> (&'static str, fn() -> (BuildStart, BuildContinue)) {
    match mode {
        Mode::Math => (MATH_WS_SUFFIX, math_framing),
        Mode::Text => (TEXT_WS_SUFFIX, text_framing),
    }
}

fn load_strokes(path: &Path) -> anyhow::Result<Vec<Stroke>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let strokes: Vec<Stroke> = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse strokes in {}", path.display()))?;
    Ok(strokes)
}

/// Splits strokes into per-request batches; `batch == 0` means one request.
fn batches(strokes: Vec<Stroke>, batch: usize) -> Vec<Vec<Stroke>> {
    if batch == 0 || strokes.len() <= batch {
        return vec![strokes];
    }
    strokes.chunks(batch).map(<[Stroke]>::to_vec).collect()
}

pub async fn run(cli: Cli, config: RecognitionConfig) -> anyhow::Result<()> {
    let strokes = load_strokes(&cli.strokes)?;
    tracing::info!(strokes = strokes.len(), mode = ?cli.mode, "strokes loaded");

    let (suffix, build) = framing(cli.mode);
    let recognizer = WsRecognizer::new();
    let mut session = SessionState::new();
    let handshake = recognizer.initialize(suffix, &config, &mut session);
    handshake.await.context("recognition session failed to start")?;

    let model = Arc::new(InkModel::new());
    let mut last: Option<Value> = None;
    for (i, batch) in batches(strokes, cli.batch).into_iter().enumerate() {
        for stroke in batch {
            model.add_stroke(stroke);
        }
        let (build_start, build_continue) = build();
        let result = recognizer.recognize(
            &config,
            &session,
            model.clone(),
            build_start,
            build_continue,
            Box::new(move |outcome| {
                tracing::debug!(request = i, ok = outcome.is_ok(), "result received");
            }),
        )?;
        last = Some(result.await.with_context(|| format!("request {i} failed"))?);
    }

    if let Some(result) = &last {
        println!("{}", serde_json::to_string_pretty(result)?);
    }

    if cli.reset {
        recognizer.reset(&session)?;
    }
    recognizer.close(&mut session);
    Ok(())
}
