//! Prediction and outcome events in the tracking wire format.
//!
//! An [`EventQueue`] is owned by the caller. It accumulates events and renders
//! them as the JSON array a tracking endpoint accepts; sending that array is
//! left to the caller.
//!
//! ```
//! use canopy::events::EventQueue;
//! use canopy::input::PredictInputValue;
//!
//! let mut queue = EventQueue::new();
//! queue.enqueue_true_value("model-id", "order-17", PredictInputValue::from("yes"));
//! let json = queue.to_json().unwrap();
//! assert!(json.contains(r#""type":"true_value""#));
//! assert!(json.contains(r#""trueValue":"yes""#));
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::input::{PredictInput, PredictInputValue};
use crate::predict::{PredictOptions, PredictOutput};

/// Caller-chosen key linking a prediction to its later true value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    String(String),
}

impl fmt::Display for NumberOrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::String(string) => f.write_str(string),
        }
    }
}

impl From<f64> for NumberOrString {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for NumberOrString {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<String> for NumberOrString {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for NumberOrString {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    Prediction(PredictionEvent),
    #[serde(alias = "trueValue")]
    TrueValue(TrueValueEvent),
}

impl MonitorEvent {
    pub fn date(&self) -> DateTime<Utc> {
        match self {
            Self::Prediction(event) => event.date,
            Self::TrueValue(event) => event.date,
        }
    }

    pub fn identifier(&self) -> &NumberOrString {
        match self {
            Self::Prediction(event) => &event.identifier,
            Self::TrueValue(event) => &event.identifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEvent {
    #[serde(rename = "modelId", alias = "model_id")]
    pub model_id: String,
    pub date: DateTime<Utc>,
    pub identifier: NumberOrString,
    pub input: PredictInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<PredictOptions>,
    pub output: PredictOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrueValueEvent {
    #[serde(rename = "modelId", alias = "model_id")]
    pub model_id: String,
    pub date: DateTime<Utc>,
    pub identifier: NumberOrString,
    #[serde(rename = "trueValue", alias = "true_value")]
    pub true_value: PredictInputValue,
}

/// Accumulates events until the caller drains or serializes them.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<MonitorEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a prediction, dated now.
    pub fn enqueue_prediction(
        &mut self,
        model_id: impl Into<String>,
        identifier: impl Into<NumberOrString>,
        input: PredictInput,
        options: Option<PredictOptions>,
        output: PredictOutput,
    ) {
        self.push(MonitorEvent::Prediction(PredictionEvent {
            model_id: model_id.into(),
            date: Utc::now(),
            identifier: identifier.into(),
            input,
            options,
            output,
        }));
    }

    /// Record the observed outcome for an earlier prediction, dated now.
    pub fn enqueue_true_value(
        &mut self,
        model_id: impl Into<String>,
        identifier: impl Into<NumberOrString>,
        true_value: PredictInputValue,
    ) {
        self.push(MonitorEvent::TrueValue(TrueValueEvent {
            model_id: model_id.into(),
            date: Utc::now(),
            identifier: identifier.into(),
            true_value,
        }));
    }

    /// Append a fully formed event, e.g. one with a caller-supplied date.
    pub fn push(&mut self, event: MonitorEvent) {
        log::trace!("queued event for identifier {}", event.identifier());
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[MonitorEvent] {
        &self.events
    }

    /// Take all queued events, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<MonitorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Render the queued events as a JSON array without draining them.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.events)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::{json, Value};

    use super::*;
    use crate::predict::RegressionPredictOutput;

    fn regression_output(value: f32) -> PredictOutput {
        PredictOutput::Regression(RegressionPredictOutput {
            value,
            feature_contributions: None,
        })
    }

    #[test]
    fn prediction_wire_format() {
        let mut queue = EventQueue::new();
        queue.push(MonitorEvent::Prediction(PredictionEvent {
            model_id: "m1".into(),
            date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            identifier: 7i64.into(),
            input: PredictInput::new().with("age", 30),
            options: Some(PredictOptions::default()),
            output: regression_output(1.5),
        }));

        let value: Value = serde_json::from_str(&queue.to_json().unwrap()).unwrap();
        let event = &value[0];
        assert_eq!(event["type"], "prediction");
        assert_eq!(event["modelId"], "m1");
        assert_eq!(event["date"], "2024-03-01T12:00:00Z");
        assert_eq!(event["identifier"], json!(7.0));
        assert_eq!(event["input"], json!({ "age": 30.0 }));
        assert_eq!(event["output"]["type"], "regression");
        assert_eq!(event["output"]["value"], json!(1.5));
        assert_eq!(event["options"]["threshold"], json!(0.5));
    }

    #[test]
    fn true_value_wire_format() {
        let mut queue = EventQueue::new();
        queue.enqueue_true_value("m1", "row-3", PredictInputValue::from("yes"));

        let value: Value = serde_json::from_str(&queue.to_json().unwrap()).unwrap();
        let event = &value[0];
        assert_eq!(event["type"], "true_value");
        assert_eq!(event["identifier"], "row-3");
        assert_eq!(event["trueValue"], "yes");
        assert!(event["date"].is_string());
    }

    #[test]
    fn drain_empties_queue_in_order() {
        let mut queue = EventQueue::new();
        assert!(queue.is_empty());
        queue.enqueue_prediction("m", 1i64, PredictInput::new(), None, regression_output(0.0));
        queue.enqueue_true_value("m", 1i64, PredictInputValue::from(2.0));
        assert_eq!(queue.len(), 2);

        let events = queue.drain();
        assert!(queue.is_empty());
        assert!(matches!(events[0], MonitorEvent::Prediction(_)));
        assert!(matches!(events[1], MonitorEvent::TrueValue(_)));
        assert_eq!(queue.to_json().unwrap(), "[]");
    }

    #[test]
    fn events_round_trip_through_json() {
        let mut queue = EventQueue::new();
        queue.enqueue_prediction(
            "m",
            "a",
            PredictInput::new().with("color", "red"),
            None,
            regression_output(2.0),
        );
        let parsed: Vec<MonitorEvent> = serde_json::from_str(&queue.to_json().unwrap()).unwrap();
        assert_eq!(parsed, queue.events());
    }
}
