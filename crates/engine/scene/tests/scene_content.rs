use glam::Vec3;
use placement::{AnchorMachine, AnchorMode, AnchorSource, ModelTransform, Pose};
use scene::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn frame_context(time: f32) -> FrameContext {
    FrameContext {
        time,
        now: Instant::now(),
        candidate: None,
        viewer: None,
    }
}

fn simulated(json: &str) -> SceneRenderer {
    let content = SceneContent::from_json("castle", json).unwrap();
    SceneRenderer::new(content, AnchorMode::Simulated, RendererOptions::default())
}

#[test]
fn image_without_model_renders_billboard() {
    let mut renderer = simulated(r#"{"image_url": "https://cdn.example/castle.jpg"}"#);
    let frame = renderer.render(&AnchorMachine::default(), &frame_context(0.0));

    let primaries: Vec<_> = frame.commands.iter().filter(|c| c.is_primary()).collect();
    assert_eq!(primaries.len(), 1);
    assert!(matches!(
        primaries[0],
        DrawCommand::Billboard { image_url, .. } if image_url == "https://cdn.example/castle.jpg"
    ));
}

#[test]
fn no_media_renders_spinning_placeholder_only() {
    let mut renderer = simulated("{}");
    let machine = AnchorMachine::default();

    let a = renderer.render(&machine, &frame_context(0.0));
    let b = renderer.render(&machine, &frame_context(1.0));

    let rotation = |frame: &RenderFrame| match frame.primary() {
        Some(DrawCommand::PlaceholderBox { transform, .. }) => transform.rotation,
        other => panic!("expected placeholder, got {other:?}"),
    };
    assert_ne!(rotation(&a), rotation(&b));
    assert_eq!(a.commands.iter().filter(|c| c.is_primary()).count(), 1);
}

#[test]
fn array_and_object_positions_render_identically() {
    let array = simulated(r#"{"hotspots": [{"id": "h", "type": "info", "position": [0.5, 1, -0.25]}]}"#);
    let object = simulated(
        r#"{"hotspots": [{"id": "h", "type": "info", "position": {"x": 0.5, "y": 1, "z": -0.25}}]}"#,
    );
    assert_eq!(array.content().hotspots, object.content().hotspots);
}

#[test]
fn unknown_kinds_render_nothing() {
    let mut renderer = simulated(
        r##"{
            "hotspots": [{"id": "h", "type": "hologram", "position": [0, 0, 0]}],
            "primitives": [
                {"id": "p", "type": "torus", "position": {"x": 0, "y": 0, "z": 0}},
                {"id": "q", "type": "sphere", "position": {"x": 0, "y": 1, "z": 0}, "color": "#ff0000"}
            ]
        }"##,
    );
    let frame = renderer.render(&AnchorMachine::default(), &frame_context(0.0));

    let ids: Vec<_> = frame
        .commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::InfoMarker { id, .. } | DrawCommand::Shape { id, .. } => Some(id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(ids, vec!["q"]);
}

#[test]
fn primitives_follow_the_anchor() {
    let mut renderer = simulated(
        r#"{"primitives": [{"id": "p", "type": "box", "position": {"x": 1, "y": 0, "z": 0}}]}"#,
    );
    let mut machine = AnchorMachine::default();
    machine.commit(
        Some(Pose::from_position(Vec3::new(0.0, 0.2, -2.0))),
        AnchorSource::Tap,
        Instant::now(),
    );

    let frame = renderer.render(&machine, &frame_context(0.0));
    let position = frame
        .commands
        .iter()
        .find_map(|c| match c {
            DrawCommand::Shape { transform, .. } => Some(transform.position),
            _ => None,
        })
        .unwrap();
    assert!(position.abs_diff_eq(Vec3::new(1.0, 0.2, -2.0), 1e-6));
}

#[tokio::test]
async fn fetched_transform_overrides_embedded_one() {
    let store = Arc::new(MemoryTransformStore::new());
    let saved = ModelTransform::new(Vec3::new(0.3, 0.0, 0.0), Vec3::ZERO, Vec3::splat(2.0));
    store
        .save("castle", &SavePayload::new(&saved, &SceneContent::default()).unwrap())
        .await
        .unwrap();

    let mut renderer = simulated(
        r#"{"saved_transform": {
            "position": {"x": 0, "y": 0, "z": 0},
            "rotation": {"x": 0, "y": 0, "z": 0},
            "scale": {"x": 1, "y": 1, "z": 1}
        }}"#,
    );
    assert_eq!(renderer.model_transform(), Some(&ModelTransform::IDENTITY));

    renderer.request_transform(&PersistenceBridge::new(store));
    let machine = AnchorMachine::default();
    for _ in 0..100 {
        renderer.render(&machine, &frame_context(0.0));
        if !renderer.transform_pending() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(renderer.model_transform(), Some(&saved));
}

#[tokio::test]
async fn late_fetch_is_discarded_after_cancel() {
    let store = Arc::new(MemoryTransformStore::with_latency(Duration::from_millis(50)));
    let saved = ModelTransform::new(Vec3::X, Vec3::ZERO, Vec3::ONE);
    store
        .save("castle", &SavePayload::new(&saved, &SceneContent::default()).unwrap())
        .await
        .unwrap();

    let mut renderer = simulated("{}");
    renderer.request_transform(&PersistenceBridge::new(store));
    renderer.render(&AnchorMachine::default(), &frame_context(0.0));
    assert!(renderer.transform_pending());

    renderer.cancel_fetch();
    tokio::time::sleep(Duration::from_millis(150)).await;
    renderer.render(&AnchorMachine::default(), &frame_context(1.0));
    assert_eq!(renderer.model_transform(), None);
}

#[tokio::test]
async fn edit_before_fetch_resolves_is_kept() {
    let store = Arc::new(MemoryTransformStore::with_latency(Duration::from_millis(30)));
    let stored = ModelTransform::new(Vec3::X, Vec3::ZERO, Vec3::ONE);
    store
        .save("castle", &SavePayload::new(&stored, &SceneContent::default()).unwrap())
        .await
        .unwrap();

    let mut renderer = simulated("{}");
    renderer.request_transform(&PersistenceBridge::new(store));
    renderer
        .edit_model_transform()
        .translate(Vec3::new(0.0, 5.0, 0.0));
    assert!(!renderer.transform_pending());

    tokio::time::sleep(Duration::from_millis(100)).await;
    renderer.render(&AnchorMachine::default(), &frame_context(1.0));

    let edited = Vec3::new(0.0, 5.0, 0.0);
    assert_eq!(renderer.model_transform().unwrap().position, edited);
    assert_eq!(renderer.save_payload().unwrap().transform().position, edited);
}

#[tokio::test]
async fn file_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTransformStore::new(dir.path().join("transforms"));
    assert_eq!(store.load_transform("castle").await.unwrap(), None);

    let mut content = SceneContent::from_json(
        "castle",
        r#"{"hotspots": [{"id": 3, "type": "info", "position": [0, 1, 0]}]}"#,
    )
    .unwrap();
    content.update_hotspot("3", Vec3::new(0.0, 1.5, 0.0), None, Some(Vec3::new(0.0, 0.5, 0.0)));

    let mut transform = ModelTransform::IDENTITY;
    transform.translate(Vec3::new(0.1, 0.0, 0.0));
    let payload = SavePayload::new(&transform, &content).unwrap();
    store.save("castle", &payload).await.unwrap();

    assert_eq!(store.load_transform("castle").await.unwrap(), Some(transform));
    let stored = store.load_payload("castle").await.unwrap().unwrap();
    assert_eq!(stored.hotspots.len(), 1);
    assert_eq!(stored.hotspots[0].position.y, 1.5);
    assert!(!store.path_for("castle").with_extension("tmp").exists());
}
