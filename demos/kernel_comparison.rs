//! Compare the linear, RBF and sigmoid kernels on synthetic HOG descriptors
//!
//! Cats are drawn as horizontal stripes and dogs as vertical stripes, with a
//! little noise, so the gradient orientation carries the class.

use hogsvm::api::train_classifier;
use hogsvm::config::KernelSpec;
use hogsvm::core::{FeatureVector, Label, OptimizerConfig, CAT, DOG};
use hogsvm::evaluation::{ClassificationReport, ResultTable};
use hogsvm::features::HogDescriptor;
use hogsvm::kernel::KernelKind;
use image::{DynamicImage, GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn striped(rng: &mut StdRng, vertical: bool) -> DynamicImage {
    let period = rng.gen_range(3..9);
    let phase = rng.gen_range(0..period);
    let image = GrayImage::from_fn(72, 72, |x, y| {
        let t = (if vertical { x } else { y }) + phase;
        let base: i32 = if (t / period) % 2 == 0 { 200 } else { 50 };
        let noisy = base + rng.gen_range(-40..=40);
        Luma([noisy.clamp(0, 255) as u8])
    });
    DynamicImage::ImageLuma8(image)
}

fn make_split(
    rng: &mut StdRng,
    descriptor: &HogDescriptor,
    per_class: usize,
) -> Result<(Vec<String>, Vec<FeatureVector>, Vec<Label>), Box<dyn std::error::Error>> {
    let mut names = Vec::new();
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for i in 0..per_class {
        for (label, name) in [(CAT, "cat"), (DOG, "dog")] {
            let image = striped(rng, label == DOG);
            features.push(descriptor.describe(&image)?);
            labels.push(label);
            names.push(format!("{name}.{i}.png"));
        }
    }
    Ok((names, features, labels))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Kernel Comparison on HOG Descriptors ===");

    let mut rng = StdRng::seed_from_u64(2024);
    let descriptor = HogDescriptor::default();

    let (_, train_features, train_labels) = make_split(&mut rng, &descriptor, 20)?;
    let (test_names, test_features, test_labels) = make_split(&mut rng, &descriptor, 10)?;

    println!(
        "Training images: {}, test images: {}, descriptor length: {}",
        train_features.len(),
        test_features.len(),
        train_features[0].len()
    );

    let config = OptimizerConfig::default();
    for spec in KernelSpec::defaults() {
        println!("\n--- {} kernel ---", spec.kind);
        let model = train_classifier(&train_features, &train_labels, &spec, &config)?;
        let predictions: Vec<Label> = test_features
            .iter()
            .map(|f| model.predict_label(f))
            .collect();

        let table = ResultTable::from_predictions(&test_names, &predictions, &test_labels)?;
        let report = ClassificationReport::from_labels(&test_labels, &predictions);

        let info = model.info();
        println!("Support vectors: {}", info.n_support_vectors);
        println!("Bias: {:.4}", info.bias);
        if spec.kind != KernelKind::Linear {
            if let Some(gamma) = model.inner().kernel().gamma() {
                println!("Gamma: {gamma:.4e}");
            }
        }
        println!("Accuracy: {:.2}%", table.accuracy() * 100.0);
        print!("{report}");
    }

    Ok(())
}
