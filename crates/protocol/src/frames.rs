//! Start and continue frame builders for the math and text endpoints.
//!
//! The first frame of a session carries the recognition parameters along
//! with the strokes; every later frame carries only the new strokes.

use serde_json::{Value, json};

use crate::constants::{FrameType, TEXT_INPUT_MULTI_LINE};
use crate::types::{Component, MathParameter, Stroke, TextParameter};

fn components(strokes: &[Stroke]) -> Vec<Component> {
    strokes.iter().map(Component::from).collect()
}

fn text_input_units(strokes: &[Stroke]) -> Value {
    json!([{
        "textInputType": TEXT_INPUT_MULTI_LINE,
        "components": components(strokes),
    }])
}

pub fn math_start(parameters: &MathParameter, strokes: &[Stroke]) -> Value {
    json!({
        "type": FrameType::Start,
        "parameters": parameters,
        "components": components(strokes),
    })
}

pub fn math_continue(strokes: &[Stroke]) -> Value {
    json!({
        "type": FrameType::Continue,
        "components": components(strokes),
    })
}

pub fn text_start(parameters: &TextParameter, strokes: &[Stroke]) -> Value {
    json!({
        "type": FrameType::Start,
        "textParameter": parameters,
        "inputUnits": text_input_units(strokes),
    })
}

pub fn text_continue(strokes: &[Stroke]) -> Value {
    json!({
        "type": FrameType::Continue,
        "inputUnits": text_input_units(strokes),
    })
}
