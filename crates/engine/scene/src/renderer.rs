//! Scene renderer
//!
//! Turns the content of one item plus the anchor state into a [`RenderFrame`]
//! draw list each frame. One renderer serves both placement paths; the
//! [`AnchorMode`] decides whether the content root follows the full anchor
//! pose (immersive) or is translated in front of a virtual orbit camera
//! (simulated, drawn over the camera feed).
//!
//! Presentation (meshes, textures, media players) is outside this crate:
//! commands name what to draw and where.

use crate::content::{Hotspot, HotspotKind, Primitive, PrimaryVisual, SceneContent, Shape};
use crate::error::Result;
use crate::orbit::{CameraPose, OrbitConfig, OrbitRig};
use crate::persistence::{PendingTransform, PersistenceBridge, SavePayload};
use crate::sway::{CameraSway, SwayConfig};
use glam::Vec3;
use placement::{
    AnchorMachine, AnchorMode, ModelTransform, PreviewStyle, RenderTransform, TransformComposer,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use xr::Pose;

/// Placeholder box color (linear RGBA)
const PLACEHOLDER_COLOR: [f32; 4] = [0.29, 0.56, 0.89, 1.0];

/// Size of the info marker sphere, meters
const INFO_MARKER_RADIUS: f32 = 0.05;

/// One item of the draw list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Lighting {
        ambient: f32,
        direction: Vec3,
        intensity: f32,
    },
    Environment {
        preset: String,
    },
    PrimaryModel {
        url: String,
        transform: RenderTransform,
    },
    Billboard {
        image_url: String,
        transform: RenderTransform,
    },
    PlaceholderBox {
        transform: RenderTransform,
        color: [f32; 4],
    },
    InfoMarker {
        id: String,
        title: Option<String>,
        description: Option<String>,
        radius: f32,
        transform: RenderTransform,
    },
    ImagePanel {
        id: String,
        url: String,
        title: Option<String>,
        transform: RenderTransform,
    },
    VideoPanel {
        id: String,
        url: String,
        transform: RenderTransform,
    },
    AudioPlayer {
        id: String,
        url: String,
        title: Option<String>,
        transform: RenderTransform,
    },
    NestedModel {
        id: String,
        url: String,
        transform: RenderTransform,
    },
    Shape {
        id: String,
        shape: Shape,
        color: [f32; 4],
        transform: RenderTransform,
    },
    Reticle {
        pose: Pose,
    },
    Grid {
        size: f32,
        divisions: u32,
    },
    OrbitControls {
        target: Vec3,
        enable_pan: bool,
        enable_zoom: bool,
    },
    PlacedNotice,
}

impl DrawCommand {
    /// True for the commands standing in for the main item
    pub fn is_primary(&self) -> bool {
        matches!(
            self,
            Self::PrimaryModel { .. } | Self::Billboard { .. } | Self::PlaceholderBox { .. }
        )
    }
}

/// Draw list and camera for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// Virtual camera (simulated) or viewer pose (immersive), when known
    pub camera: Option<CameraPose>,
    pub commands: Vec<DrawCommand>,
}

impl RenderFrame {
    pub fn reticle(&self) -> Option<Pose> {
        self.commands.iter().find_map(|c| match c {
            DrawCommand::Reticle { pose } => Some(*pose),
            _ => None,
        })
    }

    pub fn has_grid(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, DrawCommand::Grid { .. }))
    }

    pub fn has_placed_notice(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, DrawCommand::PlacedNotice))
    }

    pub fn orbit_controls(&self) -> Option<&DrawCommand> {
        self.commands
            .iter()
            .find(|c| matches!(c, DrawCommand::OrbitControls { .. }))
    }

    pub fn primary(&self) -> Option<&DrawCommand> {
        self.commands.iter().find(|c| c.is_primary())
    }
}

/// Per-frame inputs
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Seconds since the scene mounted
    pub time: f32,
    pub now: Instant,
    /// Candidate pose from the active placement source
    pub candidate: Option<Pose>,
    /// Viewer pose reported by the immersive runtime
    pub viewer: Option<Pose>,
}

/// Options fixed at mount
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RendererOptions {
    pub preview: PreviewStyle,
    pub orbit: OrbitConfig,
    pub sway: SwayConfig,
}

/// Scene renderer for one mounted item
#[derive(Debug)]
pub struct SceneRenderer {
    content: SceneContent,
    composer: TransformComposer,
    model_transform: Option<ModelTransform>,
    model_failed: bool,
    orbit: Option<OrbitRig>,
    sway: CameraSway,
    /// Scene time at which the simulated rig was locked to the anchor
    locked_at: Option<f32>,
    pending: Option<PendingTransform>,
}

impl SceneRenderer {
    pub fn new(content: SceneContent, mode: AnchorMode, options: RendererOptions) -> Self {
        let orbit = match mode {
            AnchorMode::Simulated => Some(OrbitRig::new(
                Vec3::ZERO,
                options.preview.preview_position,
                options.orbit,
            )),
            AnchorMode::Immersive => None,
        };
        Self {
            model_transform: content.saved_transform,
            content,
            composer: TransformComposer::new(mode, options.preview),
            model_failed: false,
            orbit,
            sway: CameraSway::new(options.sway),
            locked_at: None,
            pending: None,
        }
    }

    pub fn mode(&self) -> AnchorMode {
        self.composer.mode()
    }

    pub fn content(&self) -> &SceneContent {
        &self.content
    }

    /// Content for editor hotspot updates
    pub fn content_mut(&mut self) -> &mut SceneContent {
        &mut self.content
    }

    pub fn model_transform(&self) -> Option<&ModelTransform> {
        self.model_transform.as_ref()
    }

    /// Editor access; starts from identity when nothing was saved.
    ///
    /// A fetch still in flight is dropped so it cannot overwrite the edit.
    pub fn edit_model_transform(&mut self) -> &mut ModelTransform {
        if self.transform_pending() {
            tracing::debug!(item = %self.content.item_id, "Edited before fetch resolved, dropping fetch");
        }
        self.cancel_fetch();
        self.model_transform.get_or_insert(ModelTransform::IDENTITY)
    }

    /// Apply a transform loaded from the store; invalid ones are ignored
    pub fn apply_model_transform(&mut self, transform: ModelTransform) -> Result<()> {
        transform.validate()?;
        self.model_transform = Some(transform);
        Ok(())
    }

    /// The model asset failed to load; fall back to billboard or placeholder
    pub fn mark_model_failed(&mut self) {
        if !self.model_failed {
            tracing::warn!(item = %self.content.item_id, "Model failed to load, using fallback visual");
        }
        self.model_failed = true;
    }

    pub fn primary_visual(&self) -> PrimaryVisual {
        self.content.primary_visual(self.model_failed)
    }

    pub fn orbit(&self) -> Option<&OrbitRig> {
        self.orbit.as_ref()
    }

    /// Orbit rig for user gestures (simulated mode only)
    pub fn orbit_mut(&mut self) -> Option<&mut OrbitRig> {
        self.orbit.as_mut()
    }

    /// Start fetching the persisted transform
    pub fn request_transform(&mut self, bridge: &PersistenceBridge) {
        self.pending = Some(bridge.request(&self.content.item_id));
    }

    pub fn transform_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(PendingTransform::is_pending)
    }

    /// Drop an in-flight fetch; its result will never be applied
    pub fn cancel_fetch(&mut self) {
        if let Some(mut pending) = self.pending.take() {
            pending.cancel();
        }
    }

    /// Payload for an explicit save
    pub fn save_payload(&self) -> Result<SavePayload> {
        let transform = self.model_transform.unwrap_or(ModelTransform::IDENTITY);
        SavePayload::new(&transform, &self.content)
    }

    fn poll_fetch(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        let Some(result) = pending.poll() else {
            return;
        };
        self.pending = None;

        match result {
            Ok(Some(transform)) => {
                if let Err(err) = self.apply_model_transform(transform) {
                    tracing::warn!(item = %self.content.item_id, error = %err, "Ignoring fetched transform");
                } else {
                    tracing::debug!(item = %self.content.item_id, "Persisted transform applied");
                }
            }
            Ok(None) => {
                tracing::debug!(item = %self.content.item_id, "No persisted transform");
            }
            Err(err) => {
                tracing::warn!(item = %self.content.item_id, error = %err, "Transform fetch failed, using defaults");
            }
        }
    }

    fn update_camera(&mut self, machine: &AnchorMachine, time: f32) {
        let Some(orbit) = self.orbit.as_mut() else {
            return;
        };
        let Some(anchor) = machine.anchor() else {
            return;
        };

        let locked_at = match self.locked_at {
            Some(t) => t,
            None => {
                orbit.lock_to_anchor(anchor.pose.position);
                self.locked_at = Some(time);
                time
            }
        };

        let home = orbit.home();
        orbit.set_position(self.sway.apply(home, time - locked_at));
    }

    /// Produce the draw list for this frame
    pub fn render(&mut self, machine: &AnchorMachine, ctx: &FrameContext) -> RenderFrame {
        self.poll_fetch();
        self.update_camera(machine, ctx.time);

        let state = machine.state();
        let placed = state.is_placed();
        let mut commands = vec![
            DrawCommand::Lighting {
                ambient: 0.5,
                direction: Vec3::new(-0.5, -1.0, -0.3).normalize(),
                intensity: 1.0,
            },
            DrawCommand::Environment {
                preset: "city".to_string(),
            },
        ];

        if !placed {
            if let Some(pose) = ctx.candidate.filter(Pose::is_finite) {
                commands.push(DrawCommand::Reticle { pose });
            }
        }

        // Immersive content appears only once anchored to a surface: unlike
        // the simulated path there is no preview or grid before placement
        let show_content = placed || self.mode() == AnchorMode::Simulated;
        if show_content {
            let primary = self
                .composer
                .primary(state, self.model_transform.as_ref(), ctx.time);
            commands.push(self.primary_command(primary));

            commands.extend(self.content.hotspots.iter().filter_map(|hotspot| {
                let transform = self.composer.offset(
                    state,
                    hotspot.position,
                    hotspot.rotation_quat(),
                    hotspot.scale,
                );
                hotspot_command(hotspot, transform)
            }));

            commands.extend(self.content.primitives.iter().filter_map(|primitive| {
                let transform = self.composer.offset(
                    state,
                    primitive.position,
                    primitive.rotation_quat(),
                    primitive.scale,
                );
                primitive_command(primitive, transform)
            }));
        }

        if let Some(orbit) = &self.orbit {
            if !placed {
                commands.push(DrawCommand::Grid {
                    size: 10.0,
                    divisions: 20,
                });
            }
            commands.push(DrawCommand::OrbitControls {
                target: orbit.target(),
                enable_pan: orbit.enable_pan,
                enable_zoom: orbit.enable_zoom,
            });
        }

        if machine.ack_visible(ctx.now) {
            commands.push(DrawCommand::PlacedNotice);
        }

        let camera = match &self.orbit {
            Some(orbit) => Some(*orbit.camera()),
            None => ctx.viewer.map(|pose| CameraPose {
                position: pose.position,
                rotation: pose.orientation,
                ..CameraPose::default()
            }),
        };

        RenderFrame { camera, commands }
    }

    fn primary_command(&self, transform: RenderTransform) -> DrawCommand {
        match self.primary_visual() {
            PrimaryVisual::Model { url } => DrawCommand::PrimaryModel { url, transform },
            PrimaryVisual::Billboard { image_url } => DrawCommand::Billboard {
                image_url,
                transform,
            },
            PrimaryVisual::Placeholder => DrawCommand::PlaceholderBox {
                transform,
                color: PLACEHOLDER_COLOR,
            },
        }
    }
}

/// Draw command for a hotspot; unknown kinds and media without a URL draw nothing
pub fn hotspot_command(hotspot: &Hotspot, transform: RenderTransform) -> Option<DrawCommand> {
    let id = hotspot.id.clone();
    match &hotspot.kind {
        HotspotKind::Info { title, description } => Some(DrawCommand::InfoMarker {
            id,
            title: title.clone(),
            description: description.clone(),
            radius: INFO_MARKER_RADIUS,
            transform,
        }),
        HotspotKind::Image { url, title } => url.clone().map(|url| DrawCommand::ImagePanel {
            id,
            url,
            title: title.clone(),
            transform,
        }),
        HotspotKind::Video { url } => url
            .clone()
            .map(|url| DrawCommand::VideoPanel { id, url, transform }),
        HotspotKind::Audio { url, title } => url.clone().map(|url| DrawCommand::AudioPlayer {
            id,
            url,
            title: title.clone(),
            transform,
        }),
        HotspotKind::Model { url } => url
            .clone()
            .map(|url| DrawCommand::NestedModel { id, url, transform }),
        HotspotKind::Unknown(_) => None,
    }
}

/// Draw command for a primitive; unknown shapes draw nothing
pub fn primitive_command(primitive: &Primitive, transform: RenderTransform) -> Option<DrawCommand> {
    if let Shape::Unknown(_) = primitive.shape {
        return None;
    }
    Some(DrawCommand::Shape {
        id: primitive.id.clone(),
        shape: primitive.shape.clone(),
        color: primitive.color,
        transform,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use placement::AnchorSource;

    fn at(position: Vec3) -> RenderTransform {
        RenderTransform {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    fn ctx(time: f32, now: Instant) -> FrameContext {
        FrameContext {
            time,
            now,
            candidate: None,
            viewer: None,
        }
    }

    fn renderer(json: &str, mode: AnchorMode) -> SceneRenderer {
        let content = SceneContent::from_json("item", json).unwrap();
        SceneRenderer::new(content, mode, RendererOptions::default())
    }

    #[test]
    fn test_simulated_unplaced_frame() {
        let mut r = renderer(r#"{"model_url": "a.glb"}"#, AnchorMode::Simulated);
        let machine = AnchorMachine::default();
        let frame = r.render(&machine, &ctx(0.0, Instant::now()));

        assert!(frame.has_grid());
        assert!(matches!(frame.primary(), Some(DrawCommand::PrimaryModel { .. })));
        assert_eq!(
            frame.orbit_controls(),
            Some(&DrawCommand::OrbitControls {
                target: Vec3::new(0.0, 0.0, -2.0),
                enable_pan: true,
                enable_zoom: true,
            })
        );
        assert!(frame.camera.is_some());
    }

    #[test]
    fn test_placement_locks_orbit_and_hides_grid() {
        let mut r = renderer("{}", AnchorMode::Simulated);
        let mut machine = AnchorMachine::default();
        let now = Instant::now();
        machine.commit(
            Some(Pose::from_position(Vec3::new(0.0, 0.2, -2.0))),
            AnchorSource::Tap,
            now,
        );

        let frame = r.render(&machine, &ctx(1.0, now));
        assert!(!frame.has_grid());
        assert!(frame.has_placed_notice());
        assert_eq!(
            frame.orbit_controls(),
            Some(&DrawCommand::OrbitControls {
                target: Vec3::new(0.0, 0.2, -2.0),
                enable_pan: false,
                enable_zoom: false,
            })
        );
        // Sway starts from the home position
        assert_eq!(frame.camera.unwrap().position, Vec3::ZERO);

        let later = r.render(&machine, &ctx(3.0, now + std::time::Duration::from_secs(3)));
        assert!(!later.has_placed_notice());
        assert_ne!(later.camera.unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn test_immersive_unplaced_draws_reticle_only() {
        let mut r = renderer(
            r#"{"model_url": "a.glb", "hotspots": [{"id": 1, "type": "info", "position": [0, 1, 0]}]}"#,
            AnchorMode::Immersive,
        );
        let machine = AnchorMachine::default();
        let mut context = ctx(0.0, Instant::now());
        context.candidate = Some(Pose::from_position(Vec3::new(0.0, -1.0, -1.5)));

        let frame = r.render(&machine, &context);
        assert!(frame.reticle().is_some());
        assert!(frame.primary().is_none());
        assert!(!frame.has_grid());
        assert!(frame.orbit_controls().is_none());
    }

    #[test]
    fn test_model_failure_falls_back() {
        let mut r = renderer(
            r#"{"model_url": "a.glb", "image_url": "a.jpg"}"#,
            AnchorMode::Simulated,
        );
        r.mark_model_failed();
        let frame = r.render(&AnchorMachine::default(), &ctx(0.0, Instant::now()));
        assert!(matches!(frame.primary(), Some(DrawCommand::Billboard { .. })));
    }

    #[test]
    fn test_hotspot_dispatch() {
        let content = SceneContent::from_json(
            "item",
            r#"{"hotspots": [
                {"id": "i", "type": "info", "position": [0, 0, 0], "title": "Gate"},
                {"id": "m", "type": "image", "position": [0, 0, 0], "content_url": "x.png"},
                {"id": "v", "type": "video", "position": [0, 0, 0]},
                {"id": "a", "type": "audio", "position": [0, 0, 0], "content_url": "x.mp3"},
                {"id": "n", "type": "3d_model", "position": [0, 0, 0], "content_url": "x.glb"},
                {"id": "u", "type": "portal", "position": [0, 0, 0]}
            ]}"#,
        )
        .unwrap();

        let kinds: Vec<_> = content
            .hotspots
            .iter()
            .map(|h| hotspot_command(h, at(h.position)).map(|c| c.is_primary()))
            .collect();
        assert_eq!(
            kinds,
            vec![Some(false), Some(false), None, Some(false), Some(false), None]
        );
    }

    #[test]
    fn test_draw_command_serializes_with_kind_tag() {
        let json = serde_json::to_value(DrawCommand::PlacedNotice).unwrap();
        assert_eq!(json["kind"], "placed_notice");
    }
}
