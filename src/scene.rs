//! Scene snapshots.
//!
//! A scene is a named bag of parameter values by slot index: configuration
//! only, never DSP state. Hosts and the render tool use scenes to set a
//! mixer up reproducibly; applying one just replays `set_parameter`, so all
//! the usual clamping and derived-state refresh applies.

use crate::mixer::FeedbackMixer;
use crate::params::{ChannelParam, GlobalParam, ParamLayout};
use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneValue {
    pub index: usize,
    pub value: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub values: Vec<SceneValue>,
}

impl Scene {
    /// Apply every stored value through `set_parameter`. Stale indices
    /// from a scene saved against a different channel count are ignored by
    /// the mixer, so applying never faults.
    pub fn apply(&self, mixer: &mut FeedbackMixer) {
        for v in &self.values {
            mixer.set_parameter(v.index, v.value);
        }
    }

    /// Snapshot the mixer's current parameter table under a name.
    pub fn capture(name: &str, mixer: &FeedbackMixer) -> Self {
        let values = (0..mixer.layout().len())
            .filter_map(|index| {
                mixer.parameter(index).map(|value| SceneValue { index, value })
            })
            .collect();
        Self {
            name: name.to_string(),
            description: String::new(),
            values,
        }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("failed to parse scene JSON")
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize scene")
    }

    /// Built-in starting points, in the spirit of factory presets.
    pub fn factory(layout: &ParamLayout) -> Vec<Scene> {
        let mut bed = Scene {
            name: "Gentle Bed".into(),
            description: "Mild feedback wash, wide pan, plenty of headroom".into(),
            values: Vec::new(),
        };
        for ch in 0..layout.num_channels() {
            let pan = if ch % 2 == 0 { -60 } else { 60 };
            bed.values.push(SceneValue {
                index: layout.channel_index(ch, ChannelParam::Feedback),
                value: 35,
            });
            bed.values.push(SceneValue {
                index: layout.channel_index(ch, ChannelParam::Pan),
                value: pan,
            });
        }
        bed.values.push(SceneValue {
            index: layout.global_index(GlobalParam::Squash),
            value: 20,
        });

        let mut drone = Scene {
            name: "Runaway Drone".into(),
            description: "Loops driven to the edge, limiter doing the work".into(),
            values: Vec::new(),
        };
        for ch in 0..layout.num_channels() {
            drone.values.push(SceneValue {
                index: layout.channel_index(ch, ChannelParam::Feedback),
                value: 95,
            });
        }
        drone.values.push(SceneValue {
            index: layout.global_index(GlobalParam::Squash),
            value: 80,
        });
        drone.values.push(SceneValue {
            index: layout.global_index(GlobalParam::Saturation),
            value: 1,
        });
        drone.values.push(SceneValue {
            index: layout.global_index(GlobalParam::FeedbackDelay),
            value: 120,
        });

        vec![bed, drone]
    }
}
