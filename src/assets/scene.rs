//! Scene definitions consumed by the scene loader.
//!
//! A scene is the set of entities spawned when it is activated. The cutscene
//! core only cares about cameras, so a scene definition is a named list of
//! camera descriptions.
//!
//! ```json
//! {
//!   "name": "Harbor",
//!   "cameras": [
//!     { "name": "dock_cam", "vcam_id": "dock", "priority": 0 },
//!     { "name": "rig", "vcam_id": "crane", "has_camera": false, "camera_override": "crane_cam" },
//!     { "name": "crane_cam" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// One camera-bearing entity in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraDef {
    /// Entity name, also used to resolve `camera_override` targets.
    pub name: String,
    /// Identifier registered with the camera registry. `None` spawns an untagged camera.
    #[serde(default)]
    pub vcam_id: Option<String>,
    #[serde(default)]
    pub priority: i32,
    /// Whether the entity itself carries a [`VirtualCamera`](crate::components::virtualcamera::VirtualCamera).
    #[serde(default = "default_true")]
    pub has_camera: bool,
    /// Name of another camera in the same scene that this tag resolves to.
    #[serde(default)]
    pub camera_override: Option<String>,
}

impl CameraDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vcam_id: None,
            priority: 0,
            has_camera: true,
            camera_override: None,
        }
    }

    pub fn with_vcam_id(mut self, id: impl Into<String>) -> Self {
        self.vcam_id = Some(id.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Tag-only entity pointing at another camera.
    pub fn with_override(mut self, target: impl Into<String>) -> Self {
        self.has_camera = false;
        self.camera_override = Some(target.into());
        self
    }

    pub fn without_camera(mut self) -> Self {
        self.has_camera = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDef {
    /// Filled from the file name when left blank.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cameras: Vec<CameraDef>,
}

impl SceneDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cameras: Vec::new(),
        }
    }

    pub fn with_camera(mut self, camera: CameraDef) -> Self {
        self.cameras.push(camera);
        self
    }

    /// Shorthand for a tagged camera whose entity name equals its id.
    pub fn with_vcam(self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.with_camera(CameraDef::new(id.clone()).with_vcam_id(id))
    }
}
