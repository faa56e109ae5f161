//! Integration tests across saliency, evaluation, plotting and checkpoints.
//!
//! A small TwinRanker on synthetic images stands in for a trained model.

use burn::prelude::*;
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use ndarray::{Array4, Axis};

use twinviz::prelude::*;

type GradBackend = Autodiff<NdArray>;
type InferBackend = NdArray;

const SHAPE: ImageShape = ImageShape::new(6, 5, 3);

/// Pairs of random images in `[0, 1)`, labelled by which image is brighter.
fn create_synthetic_pairs(n: usize) -> ImagePairs {
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let dims = (n, SHAPE.height(), SHAPE.width(), SHAPE.channels());
    let left = Array4::from_shape_simple_fn(dims, || rng.gen::<f32>());
    let right = Array4::from_shape_simple_fn(dims, || rng.gen::<f32>());

    let labels = left
        .axis_iter(Axis(0))
        .zip(right.axis_iter(Axis(0)))
        .map(|(a, b)| if a.sum() > b.sum() { 1.0 } else { 0.0 })
        .collect();

    ImagePairs::new(left, right).unwrap().with_labels(labels).unwrap()
}

fn model<B: Backend>(device: &B::Device) -> TwinRanker<B> {
    TwinRankerConfig::new(SHAPE).with_hidden_size(16).init::<B>(device)
}

#[test]
fn test_saliency_overlay_from_twin_ranker() {
    let device = Default::default();
    let pairs = create_synthetic_pairs(2);
    let model = model::<GradBackend>(&device);

    let image1 = array_to_tensor::<GradBackend>(pairs.left(0), &device);
    let image2 = array_to_tensor::<GradBackend>(pairs.right(0), &device);

    let overlay =
        generate_saliency_map(&model, image1.clone(), image2.clone(), &SaliencyConfig::default())
            .unwrap();
    assert_eq!(overlay.dimensions(), (5, 6));

    let explanation = explain_pair(&model, image1, image2, &SaliencyConfig::default()).unwrap();
    assert_eq!(explanation.saliency.dims(), [6, 5]);
    let max = explanation.saliency.max();
    assert!(max == 1.0 || max == 0.0, "max was {max}");
    assert!(explanation
        .saliency
        .to_vec()
        .unwrap()
        .iter()
        .all(|v| (0.0..=1.0).contains(v)));
    assert_eq!(explanation.overlay, overlay);
}

#[test]
fn test_evaluation_on_synthetic_pairs() {
    let device = Default::default();
    let pairs = create_synthetic_pairs(20);
    let model = model::<InferBackend>(&device);

    let config = EvaluationConfig::default().with_batch_size(6);
    let result = evaluate_pairs::<InferBackend, _>(&model, &pairs, &config, &device).unwrap();

    assert_eq!(result.total, 20);
    assert_eq!(result.scores.len(), 20);
    assert!((0.0..=1.0).contains(&result.accuracy));
    assert!(result.loss.is_finite() && result.loss >= 0.0);
    assert!(result.summary().starts_with("Test Loss: "));
}

#[test]
fn test_plots_written_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let history = TrainingHistory::from_json_str(
        r#"{"loss": [0.9, 0.5, 0.3], "val_loss": [1.0, 0.6, 0.5],
            "accuracy": [0.5, 0.7, 0.9], "val_accuracy": [0.4, 0.6, 0.7]}"#,
    )
    .unwrap();

    plot_loss(&history, dir.path().join("loss_curve.png")).unwrap();
    plot_accuracy(&history, dir.path().join("accuracy_curve.png")).unwrap();

    for name in ["loss_curve.png", "accuracy_curve.png"] {
        let image = image::open(dir.path().join(name)).unwrap();
        assert_eq!((image.width(), image.height()), (640, 480));
    }
}

#[test]
fn test_prediction_and_ranking_grids() {
    let dir = tempfile::tempdir().unwrap();
    let device = Default::default();
    let pairs = create_synthetic_pairs(7);
    let model = model::<InferBackend>(&device);

    let grid = PredictionGridConfig::default().with_subset_size(4).with_tile_size(12);
    let scores = plot_pair_predictions::<InferBackend, _>(
        &model,
        &pairs,
        &grid,
        dir.path().join("pairs.png"),
        &device,
    )
    .unwrap();
    assert_eq!(scores.len(), 4);
    assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));

    let ranking = RankingGridConfig::default().with_columns(3).with_tile_size(12);
    let ranked = plot_ranking_predict::<InferBackend, _>(
        &model,
        pairs.left_batch(),
        dir.path().join("ranking.png"),
        &ranking,
        &device,
    )
    .unwrap();
    assert_eq!(ranked.len(), 7);
    assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(dir.path().join("ranking.png").exists());
}

#[test]
fn test_checkpoint_reused_for_saliency() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ranker");
    let device = Default::default();
    let config = TwinRankerConfig::new(SHAPE).with_hidden_size(16);

    let trained = config.init::<InferBackend>(&device);
    trained.save(&config, &path).unwrap();

    let (_, restored) = TwinRankerConfig::load::<GradBackend>(&path, &device).unwrap();
    let pairs = create_synthetic_pairs(1);
    let overlay = generate_saliency_map(
        &restored,
        array_to_tensor::<GradBackend>(pairs.left(0), &device),
        array_to_tensor::<GradBackend>(pairs.right(0), &device),
        &SaliencyConfig::default(),
    )
    .unwrap();
    assert_eq!(overlay.dimensions(), (5, 6));
}
