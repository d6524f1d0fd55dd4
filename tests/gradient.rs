use approx::assert_relative_eq;
use ndgrad::{gradient_of, gradients, Error, Graph, Param, Tensor};

const EPS: f64 = 1e-4;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn column(values: &[f64]) -> Tensor<f64> {
    Tensor::from_shape_vec(&[values.len(), 1], values.to_vec()).unwrap()
}

/// Central finite difference of a scalar function.
fn finite_diff(f: impl Fn(f64) -> f64, x: f64) -> f64 {
    let h = 1e-6;
    (f(x + h) - f(x - h)) / (2.0 * h)
}

// ── Composite chains ──

#[test]
fn exp_sqrt_sin_chain() {
    init_logger();
    let f = |x: f64| (2.0 * x).sin().sqrt().exp();
    let df = |x: f64| {
        let s = (2.0 * x).sin();
        s.sqrt().exp() * (2.0 * x).cos() / s.sqrt()
    };

    for &x0 in &[std::f64::consts::FRAC_PI_4, 0.3, 0.6] {
        let g = Graph::new();
        let x = g.scalar(x0);
        let y = (2.0 * &x).sin().sqrt().exp();
        assert_relative_eq!(y.value().item().unwrap(), f(x0), epsilon = 1e-12);

        let dy = y.partial_wrt(x.id()).unwrap();
        assert_eq!(dy.shape(), &[1]);
        assert!((dy.item().unwrap() - df(x0)).abs() < EPS);
        assert!((dy.item().unwrap() - finite_diff(f, x0)).abs() < EPS);
    }
}

#[test]
fn sqrt_of_inner_product_wrt_vector() {
    // f(w, v) = sqrt(wᵀ · 2v) / 2, ∂f/∂v = w / (2 sqrt(2 w·v))
    let g = Graph::new();
    let w_val = [1.0, 2.0, 3.0];
    let v_val = [0.5, 0.25, 1.5];
    let w = g.param(column(&w_val));
    let v = g.param(column(&v_val));

    let y = w.t().unwrap().mul(&(&v * 2.0)).unwrap().sqrt() / 2.0;
    assert_eq!(y.shape(), &[1, 1]);

    let wv: f64 = w_val.iter().zip(&v_val).map(|(a, b)| a * b).sum();
    let expected: Vec<f64> = w_val.iter().map(|wi| wi / (2.0 * (2.0 * wv).sqrt())).collect();

    let dv = y.partial_wrt(v.id()).unwrap();
    assert!(dv.approx_eq(&column(&expected), EPS));
}

#[test]
fn sigmoid_of_affine_map_matches_finite_difference() {
    let g = Graph::new();
    let x = g.scalar(0.7_f64);
    let y = (&x * 3.0 - 1.0).sigmoid().ln();
    let f = |x: f64| (1.0 / (1.0 + (-(3.0 * x - 1.0)).exp())).ln();
    let dy = gradient_of(&y, x.id()).unwrap();
    assert_relative_eq!(dy.item().unwrap(), finite_diff(f, 0.7), epsilon = 1e-6);
}

// ── Reconverging paths ──

#[test]
fn multipath_addition_sums_both_uses() {
    let g = Graph::new();
    let x = g.param(Tensor::from_shape_vec(&[3], vec![1.0, -2.0, 0.5]).unwrap());
    let y = x.add(&x).unwrap();
    let dx = y.partial_wrt(x.id()).unwrap();
    assert_eq!(dx, Tensor::full(&[3], 2.0));
}

#[test]
fn multipath_hadamard_gives_two_x() {
    let g = Graph::new();
    let values = vec![1.0, -2.0, 0.5, 4.0];
    let x = g.param(Tensor::from_shape_vec(&[2, 2], values.clone()).unwrap());
    let y = x.hadamard(&x).unwrap();
    let dx = y.partial_wrt(x.id()).unwrap();
    let expected = Tensor::from_shape_vec(&[2, 2], values.iter().map(|v| 2.0 * v).collect()).unwrap();
    assert_eq!(dx, expected);
}

#[test]
fn diamond_through_shared_intermediate() {
    // z = sin(u) + u², u = 3x
    let g = Graph::new();
    let x = g.scalar(0.4_f64);
    let u = &x * 3.0;
    let z = u.sin().add(&u.hadamard(&u).unwrap()).unwrap();
    let u0 = 1.2_f64;
    let expected = 3.0 * (u0.cos() + 2.0 * u0);
    let dz = z.partial_wrt(x.id()).unwrap();
    assert_relative_eq!(dz.item().unwrap(), expected, epsilon = 1e-12);
}

#[test]
fn gradient_to_intermediate_node() {
    let g = Graph::new();
    let x = g.scalar(2.0_f64);
    let u = x.exp();
    let y = &u * 5.0;
    let du = y.partial_wrt(u.id()).unwrap();
    assert_eq!(du, Tensor::scalar(5.0));
}

// ── Failure modes ──

#[test]
fn unknown_identity_is_target_not_found() {
    let g = Graph::new();
    let x = g.scalar(1.0);
    let stranger = g.scalar(2.0);
    let y = x.sin();
    assert_eq!(
        y.partial_wrt(stranger.id()).unwrap_err(),
        Error::TargetNotFound(stranger.id())
    );
}

#[test]
fn identity_from_another_graph_is_target_not_found() {
    let g1 = Graph::new();
    let g2 = Graph::new();
    let x = g1.scalar(3.0);
    let sink = g2.scalar(5.0).sin();
    assert_eq!(
        gradient_of(&sink, x.id()).unwrap_err(),
        Error::TargetNotFound(x.id())
    );
    assert_eq!(
        gradients(&sink, &[x.id()]).unwrap_err(),
        Error::TargetNotFound(x.id())
    );
}

#[test]
fn descendant_is_not_an_ancestor() {
    let g = Graph::new();
    let x = g.scalar(1.0);
    let y = x.exp();
    assert_eq!(
        x.partial_wrt(y.id()).unwrap_err(),
        Error::TargetNotFound(y.id())
    );
}

#[test]
fn mixing_graphs_is_rejected() {
    let a = Graph::new().scalar(1.0);
    let b = Graph::new().scalar(2.0);
    assert_ne!(a.id(), b.id());
    assert_eq!(a.add(&b).unwrap_err(), Error::GraphMismatch { op: "add" });
    assert_eq!(a.mul(&b).unwrap_err(), Error::GraphMismatch { op: "mul" });
}

// ── Seeding ──

#[test]
fn leaf_wrt_itself_is_ones() {
    let g = Graph::new();
    for shape in [vec![1], vec![4], vec![2, 3], vec![2, 1, 3]] {
        let x = g.param(Tensor::full(&shape, 7.0));
        let dx = x.partial_wrt(x.id()).unwrap();
        assert_eq!(dx, Tensor::ones(&shape));
    }
}

#[test]
fn array_sink_seeds_with_ones() {
    let g = Graph::new();
    let x = g.param(Tensor::from_shape_vec(&[3], vec![0.0, 1.0, 2.0]).unwrap());
    let y = x.exp();
    let dx = y.partial_wrt(x.id()).unwrap();
    assert!(dx.approx_eq(&x.value().map(f64::exp), 1e-12));
}

// ── Matrix products ──

#[test]
fn matmul_gradient_shapes_match_operands() {
    let g = Graph::new();
    for (m, k, n) in [(2, 3, 4), (1, 5, 1), (3, 1, 2), (4, 4, 4)] {
        let a = g.param(Tensor::full(&[m, k], 0.5));
        let b = g.param(Tensor::full(&[k, n], 2.0));
        let y = a.mul(&b).unwrap();
        assert_eq!(y.shape(), &[m, n]);
        assert_eq!(y.op(), "matmul");

        let grads = gradients(&y, &[a.id(), b.id()]).unwrap();
        assert_eq!(grads.len(), 2);
        let da = grads.wrt(&a).unwrap();
        let db = grads.wrt(&b).unwrap();
        assert_eq!(da.shape(), &[m, k]);
        assert_eq!(db.shape(), &[k, n]);

        // ones · Bᵀ and Aᵀ · ones
        assert_eq!(da, &Tensor::full(&[m, k], 2.0 * n as f64));
        assert_eq!(db, &Tensor::full(&[k, n], 0.5 * m as f64));
    }
}

#[test]
fn mismatched_inner_dimension_fails_on_construction() {
    let g = Graph::new();
    let a = g.param(Tensor::<f64>::ones(&[2, 3]));
    let b = g.param(Tensor::ones(&[2, 3]));
    assert!(a.mul(&b).unwrap_err().is_shape_error());
}

#[test]
fn scalar_times_matrix_folds_back_into_scalar() {
    let g = Graph::new();
    let s = g.scalar(3.0);
    let m = g.param(Tensor::from_shape_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap());
    let y = s.mul(&m).unwrap();
    assert_eq!(y.shape(), &[2, 2]);
    assert_eq!(s.partial_wrt(s.id()).unwrap(), Tensor::scalar(1.0));
    assert_eq!(y.partial_wrt(s.id()).unwrap(), Tensor::scalar(10.0));
    assert_eq!(y.partial_wrt(m.id()).unwrap(), Tensor::full(&[2, 2], 3.0));
}

#[test]
fn vector_product_is_a_dot() {
    let g = Graph::new();
    let a = g.param(Tensor::from_shape_vec(&[3], vec![1.0, 2.0, 3.0]).unwrap());
    let b = g.param(Tensor::from_shape_vec(&[3], vec![4.0, 5.0, 6.0]).unwrap());
    let y = a.mul(&b).unwrap();
    assert_eq!(y.value(), &Tensor::scalar(32.0));
    assert_eq!(y.partial_wrt(a.id()).unwrap(), *b.value());
    assert_eq!(y.partial_wrt(b.id()).unwrap(), *a.value());
}

#[test]
fn dot_of_differently_shaped_operands() {
    let g = Graph::new();
    let a = g.param(Tensor::from_shape_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap());
    let b = g.param(Tensor::from_shape_vec(&[4], vec![1.0, 0.0, 2.0, 1.0]).unwrap());
    let y = a.dot(&b).unwrap();
    assert_eq!(y.value(), &Tensor::scalar(11.0));

    let da = y.partial_wrt(a.id()).unwrap();
    let db = y.partial_wrt(b.id()).unwrap();
    assert_eq!(da, Tensor::from_shape_vec(&[2, 2], vec![1.0, 0.0, 2.0, 1.0]).unwrap());
    assert_eq!(db, Tensor::from_shape_vec(&[4], vec![1.0, 2.0, 3.0, 4.0]).unwrap());
}

// ── Deep graphs ──

#[test]
fn long_chain_queries_and_drops() {
    let g = Graph::new();
    let x = g.scalar(0.0);
    let mut y = x.clone();
    for _ in 0..300_000 {
        y = &y + 1.0;
    }
    assert_eq!(y.value(), &Tensor::scalar(300_000.0));
    assert_eq!(y.partial_wrt(x.id()).unwrap(), Tensor::scalar(1.0));
    drop(x);
    drop(y);
}

// ── Transpose ──

#[test]
fn transpose_of_square_matrix_uses_recorded_partial() {
    // The recorded partial is X itself, composed elementwise.
    let g = Graph::new();
    let values = vec![1.0, 2.0, 3.0, 4.0];
    let x = g.param(Tensor::from_shape_vec(&[2, 2], values.clone()).unwrap());
    let y = x.t().unwrap();
    assert_eq!(y.value(), &Tensor::from_shape_vec(&[2, 2], vec![1.0, 3.0, 2.0, 4.0]).unwrap());
    assert_eq!(y.partial_wrt(x.id()).unwrap(), *x.value());
}

#[test]
fn transpose_of_non_square_matrix_cannot_propagate() {
    let g = Graph::new();
    let x = g.param(Tensor::<f64>::ones(&[2, 3]));
    let y = x.t().unwrap();
    assert_eq!(y.shape(), &[3, 2]);
    assert!(y.partial_wrt(x.id()).unwrap_err().is_shape_error());
}

// ── Softmax ──

#[test]
fn softmax_gradient_matches_jacobian() {
    let g = Graph::new();
    let x = g.param(Tensor::from_shape_vec(&[3], vec![0.1, -0.4, 0.9]).unwrap());
    let w = g.param(Tensor::from_shape_vec(&[3], vec![1.0, 2.0, -1.0]).unwrap());
    let y = x.softmax().unwrap().dot(&w).unwrap();

    let s = ndgrad::math::softmax(x.value()).unwrap();
    let jac = ndgrad::math::softmax_jacobian(x.value()).unwrap();
    let expected: Vec<f64> = (0..3)
        .map(|j| (0..3).map(|i| jac[&[i, j][..]] * w.value()[&[i][..]]).sum())
        .collect();

    assert_relative_eq!(s.sum(), 1.0, epsilon = 1e-12);
    let dx = y.partial_wrt(x.id()).unwrap();
    assert!(dx.approx_eq(&Tensor::from_shape_vec(&[3], expected).unwrap(), 1e-12));
}

// ── Identity and value snapshots ──

#[test]
fn set_value_keeps_identity_and_old_graphs() {
    let g = Graph::new();
    let mut w = g.scalar(2.0);
    let before = w.exp();
    let id = w.id();

    w.set_value(Tensor::scalar(0.0));
    assert_eq!(w.id(), id);
    assert_eq!(w.value(), &Tensor::scalar(0.0));

    // Graphs built earlier still see the old value.
    assert_relative_eq!(before.partial_wrt(id).unwrap().item().unwrap(), 2.0_f64.exp());
    let after = w.exp();
    assert_relative_eq!(after.partial_wrt(id).unwrap().item().unwrap(), 1.0);
}

#[test]
fn identities_are_fresh_per_node() {
    let g = Graph::new();
    let x = g.scalar(1.0_f64);
    let y = x.sin();
    let z = &y + 1.0;
    assert!(x.id() < y.id() && y.id() < z.id());
    assert_eq!(g.allocated(), 3);
    let parents: Vec<&Param<f64>> = z.parents().collect();
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].id(), y.id());
}
