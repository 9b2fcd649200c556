use cubature_core::assembly::MomentProblem;
use cubature_core::basis::BasisSet;
use cubature_core::solver::{polish, CancelToken};
use cubature_core::{find_rule, Domain, DomainError, DomainKind, SearchError, SearchSettings, TrialStatus};

fn settings(max_points: usize) -> SearchSettings {
    SearchSettings {
        max_points,
        ..SearchSettings::default()
    }
}

fn cube_monomial(powers: [u32; 3]) -> f64 {
    powers
        .iter()
        .map(|&n| if n % 2 == 0 { 2.0 / (n as f64 + 1.0) } else { 0.0 })
        .product()
}

fn rule_sum(points: &nalgebra::DMatrix<f64>, weights: &nalgebra::DVector<f64>, f: impl Fn(&[f64]) -> f64) -> f64 {
    (0..points.nrows())
        .map(|row| {
            let x: Vec<f64> = points.row(row).iter().cloned().collect();
            weights[row] * f(&x)
        })
        .sum()
}

#[test]
fn degree_one_hexahedron_is_the_centroid() {
    let domain = Domain::new(DomainKind::Hexahedron);
    let outcome = find_rule(&domain, 1, &settings(8)).expect("degree 1 rule should exist");
    let rule = outcome.rule;
    assert_eq!(rule.point_count(), 1);
    assert_eq!(rule.selection, vec![1, 0, 0, 0, 0, 0, 0]);
    assert!(rule.points.iter().all(|&v| v == 0.0));
    assert!((rule.weights[0] - 8.0).abs() < 1e-12);
}

#[test]
fn degree_three_hexahedron_uses_face_centres() {
    let domain = Domain::new(DomainKind::Hexahedron);
    let outcome = find_rule(&domain, 3, &settings(14)).expect("degree 3 rule should exist");
    let rule = &outcome.rule;
    assert_eq!(rule.point_count(), 6);
    assert_eq!(rule.selection, vec![0, 1, 0, 0, 0, 0, 0]);
    assert!((rule.orbit_args[0][0] - 1.0).abs() < 1e-8);
    assert!((rule.orbit_weights[0] - 4.0 / 3.0).abs() < 1e-10);

    for a in 0..=3u32 {
        for b in 0..=(3 - a) {
            for c in 0..=(3 - a - b) {
                let got = rule_sum(&rule.points, &rule.weights, |x| {
                    x[0].powi(a as i32) * x[1].powi(b as i32) * x[2].powi(c as i32)
                });
                assert!(
                    (got - cube_monomial([a, b, c])).abs() < 1e-10,
                    "x^{} y^{} z^{}: {}",
                    a,
                    b,
                    c,
                    got
                );
            }
        }
    }
}

#[test]
fn degree_two_triangle_has_three_points() {
    let domain = Domain::new(DomainKind::Triangle);
    let outcome = find_rule(&domain, 2, &settings(12)).expect("degree 2 rule should exist");
    let rule = &outcome.rule;
    assert_eq!(rule.point_count(), 3);
    assert!(rule.weights.iter().all(|&w| w > 0.0));

    // (power of x, power of y, integral over the triangle)
    let exact = [
        (0, 0, 2.0),
        (1, 0, -2.0 / 3.0),
        (0, 1, -2.0 / 3.0),
        (2, 0, 2.0 / 3.0),
        (0, 2, 2.0 / 3.0),
        (1, 1, 0.0),
    ];
    for (a, b, value) in exact {
        let got = rule_sum(&rule.points, &rule.weights, |x| x[0].powi(a) * x[1].powi(b));
        assert!((got - value).abs() < 1e-10, "x^{} y^{}: {} vs {}", a, b, got, value);
    }
}

#[test]
fn degree_two_tetrahedron_has_four_points() {
    let domain = Domain::new(DomainKind::Tetrahedron);
    let outcome = find_rule(&domain, 2, &settings(12)).expect("degree 2 rule should exist");
    assert_eq!(outcome.rule.point_count(), 4);
    assert!((outcome.rule.total_weight() - 4.0 / 3.0).abs() < 1e-10);
}

#[test]
fn degree_one_pyramid_sits_on_the_axis() {
    let domain = Domain::new(DomainKind::Pyramid);
    let outcome = find_rule(&domain, 1, &settings(4)).expect("degree 1 rule should exist");
    let rule = &outcome.rule;
    assert_eq!(rule.point_count(), 1);
    assert!(rule.points[(0, 0)].abs() < 1e-14 && rule.points[(0, 1)].abs() < 1e-14);
    assert!((rule.points[(0, 2)] + 0.5).abs() < 1e-10);
    assert!((rule.weights[0] - 8.0 / 3.0).abs() < 1e-10);
}

#[test]
fn converged_rules_integrate_their_basis() {
    for (kind, degree) in [
        (DomainKind::Quadrilateral, 3),
        (DomainKind::Triangle, 3),
        (DomainKind::Prism, 2),
        (DomainKind::Tetrahedron, 3),
        (DomainKind::Pyramid, 2),
    ] {
        let domain = Domain::new(kind);
        let outcome = find_rule(&domain, degree, &settings(24))
            .unwrap_or_else(|e| panic!("{:?} degree {} rule should exist: {}", kind, degree, e));
        assert_eq!(outcome.rule.domain, kind);
        assert_eq!(outcome.rule.degree, degree);
        let basis = BasisSet::new(&domain, degree);
        let err = outcome
            .rule
            .max_moment_error(&basis, domain.moment_scale())
            .expect("moments should evaluate");
        assert!(err < 1e-10, "{:?} degree {}: {}", kind, degree, err);
        assert!((outcome.rule.total_weight() - domain.volume()).abs() < 1e-10);
    }
}

#[test]
fn parallel_and_sequential_searches_agree() {
    let domain = Domain::new(DomainKind::Triangle);
    let parallel = SearchSettings {
        max_points: 12,
        trials_per_selection: 6,
        parallel: true,
        ..SearchSettings::default()
    };
    let sequential = SearchSettings {
        parallel: false,
        ..parallel.clone()
    };
    match (find_rule(&domain, 3, &parallel), find_rule(&domain, 3, &sequential)) {
        (Ok(a), Ok(b)) => {
            assert_eq!(a.selection_index, b.selection_index);
            assert_eq!(a.trial_index, b.trial_index);
            assert_eq!(a.rule.points, b.rule.points);
            assert_eq!(a.rule.weights, b.rule.weights);
        }
        (Err(a), Err(b)) => {
            assert!(a.is_exhausted() && b.is_exhausted());
        }
        (a, b) => panic!(
            "schedules disagree: {:?} vs {:?}",
            a.map(|o| o.selection_index),
            b.map(|o| o.selection_index)
        ),
    }
}

#[test]
fn raising_the_degree_under_a_fixed_budget_exhausts() {
    let domain = Domain::new(DomainKind::Hexahedron);
    assert!(find_rule(&domain, 3, &settings(6)).is_ok());
    let err = find_rule(&domain, 5, &settings(6)).expect_err("no degree 5 rule fits in 6 points");
    assert!(err.is_exhausted());
    assert!(!err.is_fatal());
}

#[test]
fn precondition_violations_are_fatal() {
    let domain = Domain::new(DomainKind::Hexahedron);
    let err: SearchError = domain
        .point_count(7)
        .expect_err("orbit 7 is out of range")
        .into();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        SearchError::Precondition(DomainError::OrbitOutOfRange { orbit: 7, .. })
    ));
}

#[test]
fn polishing_a_found_rule_keeps_it_converged() {
    let domain = Domain::new(DomainKind::Hexahedron);
    let search = settings(14);
    let outcome = find_rule(&domain, 3, &search).expect("degree 3 rule should exist");
    let basis = BasisSet::new(&domain, 3);
    let problem = MomentProblem::new(&domain, &basis, &outcome.rule.selection)
        .expect("selection should be accepted");
    let report = polish(&problem, &outcome.rule, &search.solver, &CancelToken::new())
        .expect("polish should run");
    assert_eq!(report.status, TrialStatus::Converged);
    assert!(report.residual_norm <= outcome.rule.residual_norm.max(search.solver.tolerance));
}
