use gradflow_core::{Context, NdArray};

#[allow(dead_code)]
pub fn array(data: Vec<f64>, shape: Vec<usize>) -> NdArray {
    NdArray::new(data, shape).expect("Test array creation failed")
}

/// Points drawn uniformly from `[-1, 1)²`, labelled by the side of the line
/// `x0 + x1 = 0` they fall on. Points closer than `margin` to the line are
/// dropped.
#[allow(dead_code)]
pub fn separable_points(ctx: &Context, n: usize, margin: f64) -> (NdArray, NdArray) {
    let raw = ctx.rand_uniform(&[n, 2], -1.0, 1.0).expect("uniform draw failed");
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for point in raw.data().chunks_exact(2) {
        let side = point[0] + point[1];
        if side.abs() < margin {
            continue;
        }
        features.extend_from_slice(point);
        labels.push(if side > 0.0 { 1.0 } else { 0.0 });
    }
    let rows = labels.len();
    (array(features, vec![rows, 2]), array(labels, vec![rows, 1]))
}
