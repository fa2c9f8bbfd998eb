use burn::backend::NdArray;
use divan::Bencher;
use neus_fields::{
    backend::Autodiff,
    field::Tensor,
    RenderingNetworkConfig, SdfNetworkConfig, VarianceNetworkConfig,
};

type B = NdArray<f32>;

fn main() {
    divan::main();
}

mod sdf {
    use super::*;

    #[divan::bench(sample_count = 20, sample_size = 1, args = [256, 1024])]
    fn forward(
        bencher: Bencher,
        n: usize,
    ) {
        let device = Default::default();
        let network = SdfNetworkConfig::new()
            .init::<B>(&device)
            .expect("valid configuration");

        bencher
            .with_inputs(|| data::random_points::<B>(n, &device))
            .bench_local_values(|points| network.forward(points, None));
    }

    #[divan::bench(sample_count = 20, sample_size = 1, args = [256, 1024])]
    fn gradient(
        bencher: Bencher,
        n: usize,
    ) {
        let device = Default::default();
        let network = SdfNetworkConfig::new()
            .init::<B>(&device)
            .expect("valid configuration");

        bencher
            .with_inputs(|| data::random_points::<B>(n, &device))
            .bench_local_values(|points| network.gradient(points, None));
    }

    #[divan::bench(sample_count = 20, sample_size = 1, args = [256])]
    fn gradient_autodiff(
        bencher: Bencher,
        n: usize,
    ) {
        let device = Default::default();
        let network = SdfNetworkConfig::new()
            .init::<Autodiff<B>>(&device)
            .expect("valid configuration");

        bencher
            .with_inputs(|| data::random_points::<Autodiff<B>>(n, &device).require_grad())
            .bench_local_values(|points| network.gradient_autodiff(points, None));
    }

    #[divan::bench(sample_count = 20, sample_size = 1, args = [256])]
    fn fuse_features(
        bencher: Bencher,
        n: usize,
    ) {
        let device = Default::default();
        let config = SdfNetworkConfig::new();
        let network = config.init::<B>(&device).expect("valid configuration");

        bencher
            .with_inputs(|| {
                (
                    data::random_points::<B>(n, &device),
                    Tensor::<B, 2>::ones([n, config.dim_image_feature], &device),
                )
            })
            .bench_local_values(|(points, image_features)| {
                network.fuse_features(points, image_features)
            });
    }
}

mod rendering {
    use super::*;

    #[divan::bench(sample_count = 20, sample_size = 1, args = [256, 1024])]
    fn forward(
        bencher: Bencher,
        n: usize,
    ) {
        let device = Default::default();
        let config = RenderingNetworkConfig::new();
        let network = config.init::<B>(&device).expect("valid configuration");

        bencher
            .with_inputs(|| {
                (
                    data::random_points::<B>(n, &device),
                    Tensor::<B, 2>::ones([n, config.dim_feature], &device),
                    Tensor::<B, 2>::ones([n, config.dim_image_feature], &device),
                )
            })
            .bench_local_values(|(points, features, image_features)| {
                network.forward(
                    points.to_owned(),
                    points.to_owned(),
                    points,
                    features,
                    image_features,
                )
            });
    }
}

mod variance {
    use super::*;

    #[divan::bench(sample_count = 100, sample_size = 10)]
    fn forward(bencher: Bencher) {
        let device = Default::default();
        let network = VarianceNetworkConfig::new().init::<B>(&device);

        bencher
            .with_inputs(|| data::random_points::<B>(4096, &device))
            .bench_local_values(|points| network.forward(points));
    }
}

mod data {
    use burn::tensor::{backend::Backend, Distribution, Tensor};

    pub fn random_points<B: Backend>(
        n: usize,
        device: &B::Device,
    ) -> Tensor<B, 2> {
        Tensor::random([n, 3], Distribution::Uniform(-1.0, 1.0), device)
    }
}
