//! Sensor specifications and the render backend boundary.

use crate::scene::SceneGraph;
use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};

/// Kind of visual sensor attached to an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Color,
    Depth,
    Semantic,
}

impl SensorType {
    /// Channels per pixel in a rendered frame.
    pub fn channels(&self) -> usize {
        match self {
            SensorType::Color => 4,
            SensorType::Depth | SensorType::Semantic => 1,
        }
    }
}

/// Specification of a sensor mounted on an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSpec {
    /// Name under which readings appear in observations
    pub uuid: String,

    pub sensor_type: SensorType,

    /// Frame size as [height, width]
    pub resolution: [u32; 2],

    /// Mount offset relative to the agent body
    pub position: [f32; 3],
}

impl SensorSpec {
    pub fn new(uuid: &str, sensor_type: SensorType) -> Self {
        Self {
            uuid: uuid.to_string(),
            sensor_type,
            resolution: [480, 640],
            position: [0.0, 1.5, 0.0],
        }
    }
}

/// A rendered sensor frame, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub sensor_type: SensorType,
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub data: Vec<f32>,
}

impl Frame {
    /// Creates a frame with every value set to `fill`.
    pub fn filled(sensor_type: SensorType, height: usize, width: usize, fill: f32) -> Self {
        let channels = sensor_type.channels();
        Self {
            sensor_type,
            height,
            width,
            channels,
            data: vec![fill; height * width * channels],
        }
    }

    /// Value at (row, col, channel).
    pub fn at(&self, row: usize, col: usize, channel: usize) -> Option<f32> {
        if row >= self.height || col >= self.width || channel >= self.channels {
            return None;
        }
        self.data
            .get((row * self.width + col) * self.channels + channel)
            .copied()
    }
}

/// Produces sensor frames for a posed sensor in a scene.
///
/// `scene` is `None` when the session was opened without a stage.
pub trait RenderBackend: Send + Sync {
    fn render(&self, spec: &SensorSpec, pose: &Isometry3<f32>, scene: Option<&SceneGraph>) -> Frame;
}

/// Renderer that returns cleared frames.
///
/// Color frames are opaque black, depth and semantic frames are zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankRenderer;

impl RenderBackend for BlankRenderer {
    fn render(&self, spec: &SensorSpec, _pose: &Isometry3<f32>, _scene: Option<&SceneGraph>) -> Frame {
        let [height, width] = spec.resolution;
        let mut frame = Frame::filled(spec.sensor_type, height as usize, width as usize, 0.0);
        if spec.sensor_type == SensorType::Color {
            // alpha
            for px in frame.data.chunks_mut(4) {
                px[3] = 1.0;
            }
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_depth_frame() {
        let mut spec = SensorSpec::new("depth", SensorType::Depth);
        spec.resolution = [4, 6];

        let frame = BlankRenderer.render(&spec, &Isometry3::identity(), None);
        assert_eq!(frame.channels, 1);
        assert_eq!(frame.data.len(), 24);
        assert!(frame.data.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_blank_color_frame_is_opaque() {
        let mut spec = SensorSpec::new("color", SensorType::Color);
        spec.resolution = [2, 3];

        let frame = BlankRenderer.render(&spec, &Isometry3::identity(), None);
        assert_eq!(frame.data.len(), 2 * 3 * 4);
        assert_eq!(frame.at(1, 2, 3), Some(1.0));
        assert_eq!(frame.at(1, 2, 0), Some(0.0));
        assert_eq!(frame.at(2, 0, 0), None);
    }
}
