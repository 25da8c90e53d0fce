use serde::{Deserialize, Serialize};

/// A single pen stroke: parallel coordinate and timestamp arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Capture timestamps in milliseconds.
    #[serde(default)]
    pub t: Vec<i64>,
}

impl Stroke {
    /// Creates an empty stroke.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured point.
    pub fn push(&mut self, x: f64, y: f64, t: i64) {
        self.x.push(x);
        self.y.push(y);
        self.t.push(t);
    }

    /// Number of points in the stroke.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Input component as carried in start/continue frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Component {
    #[serde(rename = "stroke")]
    Stroke(Stroke),
}

impl From<&Stroke> for Component {
    fn from(stroke: &Stroke) -> Self {
        Component::Stroke(stroke.clone())
    }
}

/// Math recognition parameters sent with the start frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MathParameter {
    #[serde(default = "default_math_result_types")]
    pub result_types: Vec<String>,
    #[serde(default)]
    pub columnar_operation: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_resources: Vec<String>,
    #[serde(default = "default_scratch_out_sensitivity")]
    pub scratch_out_detection_sensitivity: u32,
}

fn default_math_result_types() -> Vec<String> {
    vec!["LATEX".into(), "MATHML".into()]
}

fn default_scratch_out_sensitivity() -> u32 {
    1
}

impl Default for MathParameter {
    fn default() -> Self {
        Self {
            result_types: default_math_result_types(),
            columnar_operation: false,
            user_resources: Vec::new(),
            scratch_out_detection_sensitivity: default_scratch_out_sensitivity(),
        }
    }
}

/// Text recognition parameters sent with the start frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextParameter {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_text_input_mode")]
    pub text_input_mode: String,
    #[serde(default = "default_result_detail")]
    pub result_detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subset_knowledges: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_lk_words: Vec<String>,
}

fn default_language() -> String {
    "en_US".into()
}

fn default_text_input_mode() -> String {
    "CURSIVE".into()
}

fn default_result_detail() -> String {
    "TEXT".into()
}

impl Default for TextParameter {
    fn default() -> Self {
        Self {
            language: default_language(),
            text_input_mode: default_text_input_mode(),
            result_detail: default_result_detail(),
            content_types: Vec::new(),
            subset_knowledges: Vec::new(),
            user_resources: Vec::new(),
            user_lk_words: Vec::new(),
        }
    }
}
