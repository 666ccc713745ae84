//! End-to-end checks across builder, camera, scene and training.

use neural_scene::budget::resolve_budget;
use neural_scene::camera::recommended_distance;
use neural_scene::rng::DEFAULT_SEED;
use neural_scene::scene::{HeadlessScene, SceneController};
use neural_scene::training::{tick, TickSample};
use neural_scene::{
    build_graph, classify_phase, create_generator, sanitize_seed, BuildRequest, LayerSpec,
    ModelFamily, SceneConfig, SeededRandom, TrainingPhase,
};

fn eights() -> Vec<LayerSpec> {
    (0..3).map(|i| LayerSpec::dense(format!("L{}", i), 8)).collect()
}

#[test]
fn test_equal_seeds_equal_sequences() {
    let mut a = create_generator(Some(2024.0));
    let mut b = create_generator(Some(2024.0));
    let xs: Vec<f64> = (0..8).map(|_| a()).collect();
    let ys: Vec<f64> = (0..8).map(|_| b()).collect();
    assert_eq!(xs, ys);
    assert!(xs.iter().all(|v| *v > 0.0 && *v < 1.0));
}

#[test]
fn test_sanitize_seed_defaults() {
    let default = sanitize_seed(None);
    assert_eq!(default, DEFAULT_SEED);
    assert_eq!(sanitize_seed(Some(f64::NAN)), default);
    assert_eq!(sanitize_seed(Some(0.0)), default);
    assert_eq!(sanitize_seed(Some(-100.0)), 100);
}

#[test]
fn test_budget_override_caps_connections() {
    for seed in [1, 7, 42, 1337, 99_999] {
        let request = BuildRequest::new(ModelFamily::FeedForward, eights())
            .with_seed(seed)
            .with_budget(10.0);
        let stats = build_graph(&request).stats();
        assert!(stats.connection_count <= 10, "seed {}", seed);
        assert_eq!(stats.connection_budget, 10);
        assert_eq!(stats.neuron_count, 24);
    }
}

#[test]
fn test_non_finite_budget_falls_back() {
    let request = BuildRequest::new(ModelFamily::Operator, eights()).with_budget(f64::INFINITY);
    assert_eq!(
        build_graph(&request).connection_budget,
        resolve_budget(ModelFamily::Operator, None)
    );
}

#[test]
fn test_heavier_family_farther_camera() {
    let layers: Vec<LayerSpec> = [24, 64, 64, 24]
        .iter()
        .map(|&n| LayerSpec::dense("L", n))
        .collect();
    let light = recommended_distance(&layers, ModelFamily::FeedForward);
    let heavy = recommended_distance(&layers, ModelFamily::Mixture);
    assert!(heavy > light);
    assert_eq!(
        build_graph(&BuildRequest::new(ModelFamily::Mixture, layers.clone())).camera_distance,
        heavy
    );
}

#[test]
fn test_phase_classification() {
    assert_eq!(classify_phase(0.2, 4), TrainingPhase::Forward);
    assert_eq!(classify_phase(4.1, 4), TrainingPhase::Backward);
    assert_eq!(classify_phase(8.2, 4), TrainingPhase::Update);
    assert_eq!(classify_phase(f64::NAN, 4), TrainingPhase::Idle);
    assert_eq!(classify_phase(1.0, 0), TrainingPhase::Idle);
}

#[test]
fn test_tick_deterministic() {
    let mut a = SeededRandom::new(31);
    let mut b = SeededRandom::new(31);
    let x = tick(1.7, 0.4, 0.02, &mut a.as_source());
    let y = tick(1.7, 0.4, 0.02, &mut b.as_source());
    assert_eq!(x.loss.to_bits(), y.loss.to_bits());
    assert_eq!(x.accuracy.to_bits(), y.accuracy.to_bits());
    assert_eq!(x.complete, y.complete);
}

#[test]
fn test_tick_clamps_under_sweep() {
    let mut inputs = SeededRandom::new(123);
    let mut noise = create_generator(Some(456.0));
    for _ in 0..20_000 {
        let prev_loss = inputs.next_f64() * 20.0 - 5.0;
        let prev_accuracy = inputs.next_f64() * 3.0 - 1.0;
        let learning_rate = (inputs.next_f64() - 0.2) * 10f64.powi((inputs.next_f64() * 8.0) as i32);
        let TickSample { loss, accuracy, .. } = tick(prev_loss, prev_accuracy, learning_rate, &mut noise);
        assert!(loss >= 0.001, "loss {}", loss);
        assert!(accuracy <= 0.92, "accuracy {}", accuracy);
    }
}

#[test]
fn test_gan_has_one_generator_and_discriminator() {
    for seed in [1, 2, 3] {
        let graph = build_graph(&BuildRequest::new(ModelFamily::Gan, eights()).with_seed(seed));
        assert_eq!(graph.nodes_tagged("generator").count(), 1);
        assert_eq!(graph.nodes_tagged("discriminator").count(), 1);
    }
}

#[test]
fn test_unknown_family_uses_feed_forward() {
    let family = ModelFamily::parse_lenient("hypernetwork");
    assert_eq!(family, ModelFamily::FeedForward);
    let graph = build_graph(&BuildRequest::new(family, eights()));
    assert!(graph.edges.iter().all(|e| e.to_layer == e.from_layer + 1));
}

#[test]
fn test_headless_rebuild_cycle() {
    let mut scene = HeadlessScene::new();
    let mut controller = SceneController::new();
    for family in ModelFamily::ALL {
        let config = SceneConfig::preset(family);
        let stats = controller.rebuild(Some(&mut scene), &config.build_request());
        assert_eq!(scene.node_count(), stats.neuron_count);
        assert_eq!(scene.edge_count(), stats.connection_count);
        assert!(stats.connection_count <= stats.connection_budget);
    }
    controller.clear(&mut scene);
    assert!(scene.is_empty());
}

#[test]
fn test_graph_serializes_to_json() {
    let graph = build_graph(&BuildRequest::new(ModelFamily::Autoencoder, eights()).with_seed(5));
    let value = serde_json::to_value(&graph).unwrap();
    assert_eq!(value["family"], "autoencoder");
    assert_eq!(value["nodes"].as_array().unwrap().len(), graph.nodes.len());
}
